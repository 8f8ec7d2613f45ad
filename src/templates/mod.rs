//! Built-in templates using the Tera template engine
//!
//! All templates are embedded in the binary, so a site needs nothing but
//! its content and `_config.yml`.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::helpers::{display_date, strip_html, url_for};
use crate::router::{toggle_label, Route};
use crate::theme::{ThemeMode, STORAGE_KEY};

/// Where the theme toggle form posts to
pub const TOGGLE_PATH: &str = "/theme/toggle";

/// Template renderer with the embedded default theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Rendered bodies are already HTML; text fields use `| escape`
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("default/layout.html")),
            ("home.html", include_str!("default/home.html")),
            ("blog_index.html", include_str!("default/blog_index.html")),
            ("post.html", include_str!("default/post.html")),
            ("about.html", include_str!("default/about.html")),
            ("404.html", include_str!("default/404.html")),
            (
                "partials/card.html",
                include_str!("default/partials/card.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Tera filter: format a front-matter date with a Moment.js-style format
///
/// Dates that do not parse are shown as written.
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    Ok(tera::Value::String(display_date(&s, &format)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    /// Root-prefixed home link
    pub root: String,
    pub feed: String,
}

impl SiteData {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            root: url_for(config, "/"),
            feed: url_for(config, "/atom.xml"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeData {
    pub mode: ThemeMode,
    pub toggle_label: String,
    pub toggle_url: String,
    pub storage_key: &'static str,
}

impl ThemeData {
    pub fn new(config: &SiteConfig, mode: ThemeMode) -> Self {
        Self {
            mode,
            toggle_label: toggle_label(mode),
            toggle_url: url_for(config, TOGGLE_PATH),
            storage_key: STORAGE_KEY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagChip {
    pub name: String,
    pub url: String,
}

impl TagChip {
    pub fn new(config: &SiteConfig, tag: &str) -> Self {
        Self {
            name: tag.to_string(),
            url: url_for(config, &Route::BlogTag(tag.to_string()).path()),
        }
    }
}

/// A post as shown in a grid: at most `blog.max_tags` chips plus a count of the rest
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub title: String,
    pub url: String,
    pub date: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<TagChip>,
    pub more_tags: usize,
    pub featured: bool,
}

impl PostCard {
    pub fn new(config: &SiteConfig, post: &Post) -> Self {
        let max_tags = config.blog.max_tags;
        let tags = &post.meta.tags;

        Self {
            title: post.meta.title.clone(),
            url: url_for(config, &post.path()),
            date: post.meta.date.clone(),
            author: post.meta.author.clone(),
            description: post.meta.description.clone(),
            tags: tags
                .iter()
                .take(max_tags)
                .map(|t| TagChip::new(config, t))
                .collect(),
            more_tags: tags.len().saturating_sub(max_tags),
            featured: post.meta.featured,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub url: String,
}

impl NavPost {
    pub fn new(config: &SiteConfig, post: &Post) -> Self {
        Self {
            title: post.meta.title.clone(),
            url: url_for(config, &post.path()),
        }
    }
}

/// A full post page: every tag and the rendered body
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub date: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<TagChip>,
    pub content: String,
    /// Newer neighbour in the published listing
    pub prev: Option<NavPost>,
    /// Older neighbour in the published listing
    pub next: Option<NavPost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutData {
    pub title: String,
    /// Rendered `about.md`, when present
    pub content: Option<String>,
    /// Configured fallback paragraphs
    pub paragraphs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostMetadata;

    fn render_filter(
        filter: fn(&tera::Value, &HashMap<String, tera::Value>) -> tera::Result<tera::Value>,
        value: &str,
        args: &[(&str, tera::Value)],
    ) -> String {
        let args = args
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        filter(&tera::Value::String(value.to_string()), &args)
            .unwrap()
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_templates_load() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_date_format_filter() {
        let format = [("format", tera::Value::from("MMM D, YYYY"))];
        assert_eq!(
            render_filter(date_format_filter, "2025-10-03", &format),
            "Oct 3, 2025"
        );
        assert_eq!(
            render_filter(date_format_filter, "someday", &format),
            "someday"
        );
    }

    #[test]
    fn test_truncate_chars_filter() {
        let args = [("length", tera::Value::from(5))];
        assert_eq!(
            render_filter(truncate_chars_filter, "hello world", &args),
            "hello..."
        );
        assert_eq!(render_filter(truncate_chars_filter, "short", &args), "short");
    }

    #[test]
    fn test_strip_html_filter() {
        assert_eq!(
            render_filter(strip_html_filter, "<p>Hi <b>there</b></p>", &[]),
            "Hi there"
        );
    }

    #[test]
    fn test_post_card_limits_tags() {
        let config = SiteConfig::default();
        let mut meta = PostMetadata::new("Tagged", "2025-10-03");
        meta.tags = ["a", "b", "c", "d", "e"].map(String::from).to_vec();
        let card = PostCard::new(&config, &Post::new(meta, "tagged", "tagged.md"));

        assert_eq!(card.tags.len(), 3);
        assert_eq!(card.more_tags, 2);
        assert_eq!(card.url, "/blog/tagged/");
        assert_eq!(card.tags[0].url, "/blog/tag/a/");
    }

    #[test]
    fn test_post_card_few_tags() {
        let config = SiteConfig::default();
        let mut meta = PostMetadata::new("Tagged", "2025-10-03");
        meta.tags = vec!["Web Dev".to_string()];
        let card = PostCard::new(&config, &Post::new(meta, "tagged", "tagged.md"));

        assert_eq!(card.more_tags, 0);
        assert_eq!(card.tags[0].url, "/blog/tag/Web%20Dev/");
    }

    #[test]
    fn test_theme_data() {
        let data = ThemeData::new(&SiteConfig::default(), ThemeMode::Dark);
        assert_eq!(data.toggle_label, "Switch to light mode");
        assert_eq!(data.toggle_url, "/theme/toggle");
        assert_eq!(data.storage_key, "theme-mode");
    }
}
