//! Generate static files

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::generator::Generator;
use crate::site::Site;
use crate::Blog;

/// Load the content and write the static site
pub fn run(blog: &Blog) -> Result<()> {
    let start = Instant::now();

    let site = Site::load(blog.clone())?;
    Generator::new(&site).generate()?;

    tracing::info!("Generated in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Regenerate whenever the sources or `_config.yml` change
pub async fn watch(blog: &Blog) -> Result<()> {
    let blog = blog.clone();
    tokio::task::spawn_blocking(move || watch_blocking(&blog)).await?
}

fn watch_blocking(blog: &Blog) -> Result<()> {
    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    debouncer
        .watcher()
        .watch(&blog.source_dir, RecursiveMode::Recursive)?;
    let config_path = blog.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    for result in rx {
        match result {
            Ok(events) => {
                // Output lands outside the watched tree unless configured into it
                if events.iter().all(|e| e.path.starts_with(&blog.public_dir)) {
                    continue;
                }
                tracing::info!("File changed, regenerating...");
                if let Err(e) = Blog::new(&blog.base_dir).and_then(|b| run(&b)) {
                    tracing::error!("Generation failed: {:#}", e);
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_generates_site() {
        let dir = TempDir::new().unwrap();
        crate::commands::init::init_site(dir.path()).unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        run(&blog).unwrap();

        assert!(blog.public_dir.join("index.html").exists());
        assert!(blog.public_dir.join("blog/hello-world/index.html").exists());
        assert!(blog.public_dir.join("about/index.html").exists());
        let about = fs::read_to_string(blog.public_dir.join("about/index.html")).unwrap();
        assert!(about.contains("source/about.md"));
    }

    #[test]
    fn test_run_fails_on_slug_collision() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        fs::create_dir_all(blog.posts_dir()).unwrap();
        fs::write(blog.posts_dir().join("2024-01-01-same.md"), "---\ntitle: A\n---\n").unwrap();
        fs::write(blog.posts_dir().join("same.md"), "---\ntitle: B\n---\n").unwrap();

        assert!(run(&blog).is_err());
        assert!(!blog.public_dir.join("index.html").exists());
    }
}
