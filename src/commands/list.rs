//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::content::{collect_tags, get_featured_posts, ContentLoader, Post};
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    print!("{}", render(blog, content_type)?);
    Ok(())
}

/// The listing as text
pub fn render(blog: &Blog, content_type: &str) -> Result<String> {
    let posts = ContentLoader::new(blog).load_posts()?;
    let published = posts.published();
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            writeln!(out, "Posts ({}):", published.len())?;
            for post in &published {
                write_post(&mut out, post)?;
            }
        }
        "draft" | "drafts" => {
            let drafts: Vec<&Post> = posts.posts().iter().filter(|p| p.meta.draft).collect();
            writeln!(out, "Drafts ({}):", drafts.len())?;
            for post in drafts {
                write_post(&mut out, post)?;
            }
        }
        "featured" => {
            let featured = get_featured_posts(&published);
            writeln!(out, "Featured ({}):", featured.len())?;
            for post in &featured {
                write_post(&mut out, post)?;
            }
        }
        "tag" | "tags" => {
            let mut tags: Vec<_> = collect_tags(&published).into_iter().collect();
            // Most used first; ties keep first-seen order
            tags.sort_by(|a, b| b.1.cmp(&a.1));
            writeln!(out, "Tags ({}):", tags.len())?;
            for (tag, count) in tags {
                writeln!(out, "  {} ({})", tag, count)?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, draft, featured, tag",
                content_type
            );
        }
    }

    Ok(out)
}

fn write_post(out: &mut String, post: &Post) -> std::fmt::Result {
    writeln!(
        out,
        "  {} - {} [{}] /blog/{}/",
        post.meta.date, post.meta.title, post.source, post.slug
    )
}
