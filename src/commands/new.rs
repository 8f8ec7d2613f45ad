//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Blog;

/// Front-matter flags for a new post
#[derive(Debug, Clone, Copy, Default)]
pub struct NewPostOptions {
    pub draft: bool,
    pub featured: bool,
}

/// Create a post in the posts directory and return its path
pub fn create_post(blog: &Blog, title: &str, options: NewPostOptions) -> Result<PathBuf> {
    let now = chrono::Local::now();
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Title {:?} has no characters usable in a file name", title);
    }

    let target_dir = blog.posts_dir();
    fs::create_dir_all(&target_dir)?;

    let filename = blog
        .config
        .new_post_name
        .replace(":title", &slug)
        .replace(":year", &now.format("%Y").to_string())
        .replace(":month", &now.format("%m").to_string())
        .replace(":day", &now.format("%d").to_string())
        .replace(":i_month", &now.format("%-m").to_string())
        .replace(":i_day", &now.format("%-d").to_string());
    let file_path = target_dir.join(filename);

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let mut content = String::from("---\n");
    content.push_str(&format!("title: {}\n", yaml_string(title)));
    content.push_str(&format!("date: {}\n", now.format("%Y-%m-%d")));
    content.push_str("description: ''\n");
    content.push_str("tags: []\n");
    if options.featured {
        content.push_str("featured: true\n");
    }
    if options.draft {
        content.push_str("draft: true\n");
    }
    content.push_str("---\n\n");

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Quote a scalar so titles with `:` or `#` stay strings
fn yaml_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentLoader;
    use tempfile::TempDir;

    #[test]
    fn test_create_post_round_trips_through_loader() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();

        let path = create_post(
            &blog,
            "Rust: It's Great #1",
            NewPostOptions {
                draft: true,
                featured: true,
            },
        )
        .unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("-rust-it-s-great-1.md"));

        let posts = ContentLoader::new(&blog).load_posts().unwrap();
        let post = posts.find("rust-it-s-great-1").unwrap();
        assert_eq!(post.meta.title, "Rust: It's Great #1");
        assert!(post.meta.draft);
        assert!(post.meta.featured);
        assert!(post.meta.parsed_date().is_some());
    }

    #[test]
    fn test_create_post_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        create_post(&blog, "Twice", NewPostOptions::default()).unwrap();
        assert!(create_post(&blog, "Twice", NewPostOptions::default()).is_err());
    }

    #[test]
    fn test_create_post_rejects_empty_slug() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert!(create_post(&blog, "!!!", NewPostOptions::default()).is_err());
    }
}
