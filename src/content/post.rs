//! Post models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::helpers::parse_date;

/// Metadata of one post, fixed once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub title: String,

    /// ISO date string as written in the front-matter
    pub date: String,

    pub description: Option<String>,

    /// Tags; order is kept for display only
    pub tags: Vec<String>,

    pub author: Option<String>,

    /// Explicit slug override
    pub slug: Option<String>,

    pub featured: bool,

    pub draft: bool,

    /// Custom front-matter fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl PostMetadata {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            description: None,
            tags: Vec::new(),
            author: None,
            slug: None,
            featured: false,
            draft: false,
            extra: HashMap::new(),
        }
    }

    /// The date parsed, `None` when malformed
    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        parse_date(&self.date)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A blog post: metadata plus the slug it is routed under
///
/// The rendered body lives in the [`PostCollection`](super::PostCollection)
/// lookup table, keyed by the same slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub meta: PostMetadata,

    /// Resolved slug, never empty
    pub slug: String,

    /// Source filename (relative to the posts directory)
    pub source: String,
}

impl Post {
    pub fn new(meta: PostMetadata, slug: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            meta,
            slug: slug.into(),
            source: source.into(),
        }
    }

    /// Site path of the post page
    pub fn path(&self) -> String {
        format!("/blog/{}/", self.slug)
    }

    /// Get the previous (newer) post in a list
    pub fn prev<'a>(&self, posts: &'a [Post]) -> Option<&'a Post> {
        let pos = posts.iter().position(|p| p.slug == self.slug)?;
        pos.checked_sub(1).map(|i| &posts[i])
    }

    /// Get the next (older) post in a list
    pub fn next<'a>(&self, posts: &'a [Post]) -> Option<&'a Post> {
        let pos = posts.iter().position(|p| p.slug == self.slug)?;
        posts.get(pos + 1)
    }
}

/// Renderable body of a post
#[derive(Debug, Clone, PartialEq)]
pub enum PostBody {
    /// Markdown source rendered to HTML
    Markdown {
        html: String,
        /// Rendered text before `<!-- more -->`
        excerpt: Option<String>,
    },
    /// HTML written by hand, used verbatim
    Html(String),
}

impl PostBody {
    pub fn html(&self) -> &str {
        match self {
            PostBody::Markdown { html, .. } => html,
            PostBody::Html(html) => html,
        }
    }

    /// Excerpt for feeds, falling back to the full body
    pub fn summary(&self) -> &str {
        match self {
            PostBody::Markdown {
                excerpt: Some(excerpt),
                ..
            } => excerpt.as_str(),
            other => other.html(),
        }
    }
}

/// A standalone page such as the about page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub title: String,

    /// Rendered HTML
    pub content: String,
}
