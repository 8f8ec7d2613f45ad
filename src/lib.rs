//! quill: a small personal blog engine
//!
//! Posts are Markdown files with front-matter. The same views are served
//! dynamically by `quill server` and written to disk by `quill generate`,
//! both rendered through Tera templates embedded in the binary, with a
//! light/dark theme that follows the visitor's system preference until they
//! pick one.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod router;
pub mod server;
pub mod site;
pub mod templates;
pub mod theme;

use anyhow::Result;
use std::path::{Path, PathBuf};

use theme::{FileThemeStore, FixedSystemTheme, ThemeContext, ThemeMode};

/// Directory under the site root holding local state
pub const STATE_DIR: &str = ".quill";

/// A blog rooted at a directory
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Open the blog in a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join("_config.yml")
    }

    /// Directory holding the post sources
    pub fn posts_dir(&self) -> PathBuf {
        self.source_dir.join(&self.config.posts_dir)
    }

    /// Store for the site-wide default theme (`.quill/preferences.toml`)
    pub fn theme_store(&self) -> FileThemeStore {
        FileThemeStore::new(self.base_dir.join(STATE_DIR).join("preferences.toml"))
    }

    /// The configured default, standing in for a system preference
    pub fn configured_theme(&self) -> FixedSystemTheme {
        FixedSystemTheme(self.config.theme.default)
    }

    /// Theme context over the preference file
    pub fn theme_context(&self) -> ThemeContext<FileThemeStore> {
        ThemeContext::init(self.theme_store(), &self.configured_theme())
    }

    /// Mode pages are rendered in before a visitor's own preference applies
    pub fn site_theme(&self) -> ThemeMode {
        self.theme_context().mode()
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_blog_defaults_without_config() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.source_dir, dir.path().join("source"));
        assert_eq!(blog.public_dir, dir.path().join("public"));
        assert_eq!(blog.posts_dir(), dir.path().join("source").join("_posts"));
        assert_eq!(blog.site_theme(), ThemeMode::Light);
    }

    #[test]
    fn test_site_theme_prefers_stored_over_configured() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Notes\ntheme:\n  default: dark\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Notes");
        assert_eq!(blog.site_theme(), ThemeMode::Dark);

        let mut ctx = blog.theme_context();
        ctx.set_mode(ThemeMode::Light);
        assert_eq!(blog.site_theme(), ThemeMode::Light);
        assert!(dir.path().join(".quill/preferences.toml").exists());
    }
}
