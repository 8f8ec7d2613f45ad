//! Post collection utilities
//!
//! Pure functions over a slice of posts: slug derivation, draft filtering,
//! recency ordering and tag/featured queries. All of them are total; an
//! empty input gives an empty output.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Reverse;
use std::collections::HashMap;
use thiserror::Error;

use super::{Post, PostBody};

lazy_static! {
    static ref CONTENT_EXTENSION: Regex =
        Regex::new(r"\.(mdx|md|markdown|html)$").expect("valid regex");
    static ref DATE_PREFIX: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}-").expect("valid regex");
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^a-z0-9]+").expect("valid regex");
}

/// Errors raised while assembling a collection
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("slug {slug:?} is used by both {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },

    #[error("{source_file} resolves to an empty slug; set `slug:` in its front-matter")]
    EmptySlug { source_file: String },
}

/// Resolve the slug of a post
///
/// A non-empty explicit slug wins. Otherwise the filename loses its content
/// extension and `YYYY-MM-DD-` prefix, is lower-cased, and every run of
/// characters outside `[a-z0-9]` becomes a single hyphen, with hyphens
/// trimmed from both ends. The result may be empty for filenames with no
/// usable characters.
pub fn generate_slug(filename: &str, explicit_slug: Option<&str>) -> String {
    if let Some(slug) = explicit_slug.filter(|s| !s.is_empty()) {
        return slug.to_string();
    }

    let stem = CONTENT_EXTENSION.replace(filename, "");
    let stem = DATE_PREFIX.replace(&stem, "");
    let lower = stem.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Newest first, by parsed date
///
/// The sort is stable, so posts sharing a date keep their relative order.
/// Dates that fail to parse are ordered after every parsable one.
pub fn sort_posts_by_date(posts: &[Post]) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    sorted.sort_by_key(|p| Reverse(p.meta.parsed_date()));
    sorted
}

/// Everything that is not a draft
pub fn filter_published_posts(posts: &[Post]) -> Vec<Post> {
    posts.iter().filter(|p| !p.meta.draft).cloned().collect()
}

/// Posts carrying exactly `tag` (case-sensitive)
pub fn get_posts_by_tag(posts: &[Post], tag: &str) -> Vec<Post> {
    posts.iter().filter(|p| p.meta.has_tag(tag)).cloned().collect()
}

/// Posts flagged as featured
pub fn get_featured_posts(posts: &[Post]) -> Vec<Post> {
    posts.iter().filter(|p| p.meta.featured).cloned().collect()
}

/// First post whose slug matches
pub fn find_post_by_slug<'a>(posts: &'a [Post], slug: &str) -> Option<&'a Post> {
    posts.iter().find(|p| p.slug == slug)
}

/// Tag usage counts, in order of first appearance
pub fn collect_tags(posts: &[Post]) -> IndexMap<String, usize> {
    let mut tags = IndexMap::new();
    for tag in posts.iter().flat_map(|p| &p.meta.tags) {
        *tags.entry(tag.clone()).or_insert(0) += 1;
    }
    tags
}

/// Loaded posts plus a slug-keyed table of their bodies
///
/// Slugs are unique within a collection; [`insert`](Self::insert) rejects a
/// second post with an existing slug.
#[derive(Debug, Clone, Default)]
pub struct PostCollection {
    posts: Vec<Post>,
    bodies: HashMap<String, PostBody>,
}

impl PostCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (post, body) pairs, stopping at the first bad entry
    pub fn from_entries<I>(entries: I) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = (Post, PostBody)>,
    {
        let mut collection = Self::new();
        for (post, body) in entries {
            collection.insert(post, body)?;
        }
        Ok(collection)
    }

    pub fn insert(&mut self, post: Post, body: PostBody) -> Result<(), ContentError> {
        if post.slug.is_empty() {
            return Err(ContentError::EmptySlug {
                source_file: post.source,
            });
        }
        if let Some(existing) = find_post_by_slug(&self.posts, &post.slug) {
            return Err(ContentError::DuplicateSlug {
                slug: post.slug.clone(),
                first: existing.source.clone(),
                second: post.source,
            });
        }
        self.bodies.insert(post.slug.clone(), body);
        self.posts.push(post);
        Ok(())
    }

    /// Every post, drafts included, in load order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Non-draft posts, newest first
    pub fn published(&self) -> Vec<Post> {
        sort_posts_by_date(&filter_published_posts(&self.posts))
    }

    /// Look a post up by slug; drafts are addressable too
    pub fn find(&self, slug: &str) -> Option<&Post> {
        find_post_by_slug(&self.posts, slug)
    }

    pub fn body(&self, slug: &str) -> Option<&PostBody> {
        self.bodies.get(slug)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
