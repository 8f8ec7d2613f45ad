//! Content module - posts, front-matter and the collection utilities

mod collection;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use collection::{
    collect_tags, filter_published_posts, find_post_by_slug, generate_slug, get_featured_posts,
    get_posts_by_tag, sort_posts_by_date, ContentError, PostCollection,
};
pub use frontmatter::FrontMatter;
pub use loader::ContentLoader;
pub use markdown::{MarkdownRenderer, MORE_MARKER};
pub use post::{Page, Post, PostBody, PostMetadata};
