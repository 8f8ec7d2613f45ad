//! CLI entry point for quill

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill::commands::new::NewPostOptions;
use quill::commands::theme::ThemeAction;
use quill::theme::ThemeMode;

#[derive(Parser)]
#[command(name = "quill")]
#[command(version)]
#[command(about = "A small personal blog engine with light and dark themes", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Mark the post as a draft
        #[arg(long)]
        draft: bool,

        /// Mark the post as featured
        #[arg(long)]
        featured: bool,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to server.ip)
        #[arg(short, long)]
        ip: Option<String>,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// Clean the public folder
    Clean,

    /// List site information
    List {
        /// Type of content to list (post, draft, featured, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Show or change the default theme mode
    Theme {
        #[command(subcommand)]
        action: Option<ThemeCommand>,
    },
}

#[derive(Subcommand)]
enum ThemeCommand {
    /// Print the current mode
    Show,
    /// Store a mode (light or dark)
    Set { mode: ThemeMode },
    /// Switch to the other mode
    Toggle,
    /// Forget the stored mode
    Reset,
}

impl From<ThemeCommand> for ThemeAction {
    fn from(command: ThemeCommand) -> Self {
        match command {
            ThemeCommand::Show => ThemeAction::Show,
            ThemeCommand::Set { mode } => ThemeAction::Set(mode),
            ThemeCommand::Toggle => ThemeAction::Toggle,
            ThemeCommand::Reset => ThemeAction::Reset,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug { "quill=debug,info" } else { "quill=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            quill::commands::init::init_site(&target_dir)?;
            println!("Initialized blog in {:?}", target_dir);
        }

        Commands::New {
            title,
            draft,
            featured,
        } => {
            let blog = quill::Blog::new(&base_dir)?;
            let path = quill::commands::new::create_post(
                &blog,
                &title,
                NewPostOptions { draft, featured },
            )?;
            println!("Created: {:?}", path);
        }

        Commands::Generate { watch } => {
            let blog = quill::Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");

            blog.generate()?;
            println!("Generated successfully!");

            if watch {
                quill::commands::generate::watch(&blog).await?;
            }
        }

        Commands::Server {
            port,
            ip,
            open,
            r#static,
        } => {
            let blog = quill::Blog::new(&base_dir)?;
            let ip = ip.unwrap_or_else(|| blog.config.server.ip.clone());
            let port = port.unwrap_or(blog.config.server.port);

            tracing::info!("Starting server at http://{}:{}", ip, port);
            quill::server::start(&blog, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let blog = quill::Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let blog = quill::Blog::new(&base_dir)?;
            quill::commands::list::run(&blog, &r#type)?;
        }

        Commands::Theme { action } => {
            let blog = quill::Blog::new(&base_dir)?;
            let action = action.map(ThemeAction::from).unwrap_or(ThemeAction::Show);
            println!("{}", quill::commands::theme::run(&blog, action)?);
        }
    }

    Ok(())
}
