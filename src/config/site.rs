//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::theme::ThemeMode;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    pub posts_dir: String,

    // Writing
    pub new_post_name: String,

    // Views
    pub home: HomeConfig,
    pub blog: BlogConfig,
    pub about: AboutConfig,
    pub nav: NavConfig,

    // Appearance
    pub theme: ThemeConfig,
    pub highlight: HighlightConfig,

    pub server: ServerConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: String::new(),
            language: "en".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),
            posts_dir: "_posts".to_string(),

            new_post_name: ":year-:month-:day-:title.md".to_string(),

            home: HomeConfig::default(),
            blog: BlogConfig::default(),
            about: AboutConfig::default(),
            nav: NavConfig::default(),

            theme: ThemeConfig::default(),
            highlight: HighlightConfig::default(),

            server: ServerConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig =
            serde_yaml::from_str(&content).with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }
}

/// Home page: hero banner and welcome cards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub button_text: String,
    pub section_title: String,
    pub paragraphs: Vec<String>,
    /// How many featured posts the home page shows (0 hides the strip)
    pub featured_limit: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            hero_title: "Welcome to My Blog".to_string(),
            hero_subtitle: "Discover stories, thinking, and expertise from writers on any topic."
                .to_string(),
            button_text: "Start Reading".to_string(),
            section_title: "About This Blog".to_string(),
            paragraphs: vec![
                "Welcome to my corner of the internet! This blog is a space where I share my \
                 thoughts, experiences, and insights on various topics that fascinate me. From \
                 cutting-edge technology and innovative solutions to personal lifestyle tips and \
                 adventures around the world."
                    .to_string(),
                "Whether you're here to learn something new, find inspiration, or simply enjoy a \
                 good read, I hope you'll find content that resonates with you. I believe in the \
                 power of storytelling and the importance of sharing knowledge and experiences \
                 with others."
                    .to_string(),
                "Join me on this journey as we explore ideas, discover new perspectives, and build \
                 a community of curious minds. Feel free to browse through the different \
                 categories above to find topics that interest you most. Happy reading!"
                    .to_string(),
            ],
            featured_limit: 3,
        }
    }
}

/// Blog index and post pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub title: String,
    pub subtitle: String,
    pub empty_message: String,
    /// Tag chips shown per card before collapsing into `+N`
    pub max_tags: usize,
    /// Date format on index cards (Moment.js style)
    pub date_format: String,
    /// Date format on post pages
    pub post_date_format: String,
    /// Entries in atom.xml
    pub feed_limit: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            subtitle: "Thoughts on development, technology, and life".to_string(),
            empty_message: "No blog posts yet. Check back soon!".to_string(),
            max_tags: 3,
            date_format: "MMM D, YYYY".to_string(),
            post_date_format: "MMMM D, YYYY".to_string(),
            feed_limit: 20,
        }
    }
}

/// About page fallback when `source/about.md` is absent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutConfig {
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl Default for AboutConfig {
    fn default() -> Self {
        Self {
            title: "About".to_string(),
            paragraphs: vec!["Write something about yourself in source/about.md.".to_string()],
        }
    }
}

/// Navigation bar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Category buttons, each linking to the posts tagged with it
    pub categories: Vec<String>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            categories: ["Technology", "Lifestyle", "Travel", "Food"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Light/dark theming
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Mode assumed when neither a stored override nor a system preference
    /// is available; unset means light
    pub default: Option<ThemeMode>,
}

/// Code block highlighting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// syntect theme name
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: true,
        }
    }
}

/// `quill server` defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 4000,
        }
    }
}
