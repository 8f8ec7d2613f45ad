//! Content loader - loads posts and pages from the source directory

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::{generate_slug, FrontMatter, MarkdownRenderer, Page, Post, PostBody, PostCollection};
use super::PostMetadata;
use crate::Blog;

/// File extensions treated as post sources
const POST_EXTENSIONS: [&str; 4] = ["md", "mdx", "markdown", "html"];

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    blog: &'a Blog,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(blog: &'a Blog) -> Self {
        let highlight = &blog.config.highlight;
        let renderer = MarkdownRenderer::with_options(&highlight.theme, highlight.line_number);
        Self { blog, renderer }
    }

    /// Load every post under `source/_posts`, drafts included
    ///
    /// Unreadable files are logged and skipped. Two posts resolving to the
    /// same slug, or a post whose slug resolves to nothing, abort the load.
    pub fn load_posts(&self) -> Result<PostCollection> {
        let posts_dir = self.blog.posts_dir();
        let mut collection = PostCollection::new();
        if !posts_dir.exists() {
            tracing::debug!("No posts directory at {:?}", posts_dir);
            return Ok(collection);
        }

        for entry in WalkDir::new(&posts_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_post_file(path) {
                continue;
            }

            match self.load_post(&posts_dir, path) {
                Ok((post, body)) => {
                    tracing::debug!("Loaded post {:?} as {}", path, post.slug);
                    collection.insert(post, body)?;
                }
                Err(e) => {
                    tracing::warn!("Failed to load post {:?}: {:#}", path, e);
                }
            }
        }

        Ok(collection)
    }

    /// Load a single post from a file
    fn load_post(&self, posts_dir: &Path, path: &Path) -> Result<(Post, PostBody)> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let (fm, body) = FrontMatter::parse(&content)?;

        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let source = path
            .strip_prefix(posts_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let title = fm.title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_string()
        });

        // Without a date in the front-matter, use the file's modification day
        let date = match fm.date {
            Some(date) => date,
            None => {
                let modified = fs::metadata(path)?.modified()?;
                DateTime::<Local>::from(modified)
                    .format("%Y-%m-%d")
                    .to_string()
            }
        };

        let slug = generate_slug(file_name, fm.slug.as_deref());

        let meta = PostMetadata {
            title,
            date,
            description: fm.description,
            tags: fm.tags,
            author: fm.author,
            slug: fm.slug,
            featured: fm.featured,
            draft: fm.draft,
            extra: fm.extra,
        };

        let body = if has_extension(path, "html") {
            PostBody::Html(body.to_string())
        } else {
            let (excerpt, full) = MarkdownRenderer::split_excerpt(body);
            let excerpt = excerpt.map(|e| self.renderer.render(&e)).transpose()?;
            PostBody::Markdown {
                html: self.renderer.render(&full)?,
                excerpt,
            }
        };

        Ok((Post::new(meta, slug, source), body))
    }

    /// Load `source/about.md` if it exists
    pub fn load_about(&self) -> Result<Option<Page>> {
        let path = self.blog.source_dir.join("about.md");
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let (fm, body) = FrontMatter::parse(&content)?;

        Ok(Some(Page {
            title: fm
                .title
                .unwrap_or_else(|| self.blog.config.about.title.clone()),
            content: self.renderer.render(body)?,
        }))
    }
}

/// Check if a file is a post source
fn is_post_file(path: &Path) -> bool {
    POST_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> (TempDir, Blog) {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        fs::create_dir_all(blog.posts_dir()).unwrap();
        (dir, blog)
    }

    fn write_post(blog: &Blog, name: &str, content: &str) {
        fs::write(blog.posts_dir().join(name), content).unwrap();
    }

    #[test]
    fn test_load_posts_resolves_slugs_and_bodies() {
        let (_dir, blog) = site();
        write_post(
            &blog,
            "2025-10-03-welcome-to-my-blog.mdx",
            "---\ntitle: Welcome\ndate: 2025-10-03\ntags: [tech]\n---\nIntro\n<!-- more -->\nRest\n",
        );
        write_post(
            &blog,
            "raw.html",
            "---\ntitle: Raw\ndate: 2024-01-01\nslug: handmade\n---\n<p>hi</p>",
        );
        write_post(&blog, "notes.txt", "ignored");

        let collection = ContentLoader::new(&blog).load_posts().unwrap();
        assert_eq!(collection.len(), 2);

        let welcome = collection.find("welcome-to-my-blog").unwrap();
        assert_eq!(welcome.meta.title, "Welcome");
        assert_eq!(welcome.meta.tags, vec!["tech"]);
        match collection.body("welcome-to-my-blog").unwrap() {
            PostBody::Markdown { html, excerpt } => {
                assert!(html.contains("Rest"));
                assert!(excerpt.as_deref().unwrap().contains("Intro"));
            }
            other => panic!("unexpected body {:?}", other),
        }

        assert_eq!(
            collection.body("handmade"),
            Some(&PostBody::Html("<p>hi</p>".to_string()))
        );
    }

    #[test]
    fn test_load_posts_defaults_title_and_date() {
        let (_dir, blog) = site();
        write_post(&blog, "untitled-thoughts.md", "Just text.");

        let collection = ContentLoader::new(&blog).load_posts().unwrap();
        let post = collection.find("untitled-thoughts").unwrap();
        assert_eq!(post.meta.title, "untitled-thoughts");
        assert!(post.meta.parsed_date().is_some());
    }

    #[test]
    fn test_load_posts_rejects_duplicate_slugs() {
        let (_dir, blog) = site();
        write_post(&blog, "2024-01-01-hello.md", "---\ntitle: A\ndate: 2024-01-01\n---\n");
        write_post(&blog, "2025-01-01-hello.md", "---\ntitle: B\ndate: 2025-01-01\n---\n");

        let err = ContentLoader::new(&blog).load_posts().unwrap_err();
        assert!(err.to_string().contains("hello"));
    }

    #[test]
    fn test_load_posts_rejects_empty_slug() {
        let (_dir, blog) = site();
        write_post(&blog, "2024-01-01-.md", "---\ntitle: Nothing\ndate: 2024-01-01\n---\n");
        assert!(ContentLoader::new(&blog).load_posts().is_err());
    }

    #[test]
    fn test_missing_posts_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert!(ContentLoader::new(&blog).load_posts().unwrap().is_empty());
    }

    #[test]
    fn test_load_about() {
        let (_dir, blog) = site();
        let loader = ContentLoader::new(&blog);
        assert!(loader.load_about().unwrap().is_none());

        fs::write(blog.source_dir.join("about.md"), "---\ntitle: Me\n---\nHello *there*").unwrap();
        let page = loader.load_about().unwrap().unwrap();
        assert_eq!(page.title, "Me");
        assert!(page.content.contains("<em>there</em>"));
    }
}
