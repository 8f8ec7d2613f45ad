//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# quill configuration

# Site
title: My Blog
subtitle: ''
description: ''
author: ''
language: en

# URL
url: http://localhost:4000
root: /

# Directory
source_dir: source
public_dir: public
posts_dir: _posts

# Writing
new_post_name: :year-:month-:day-:title.md

# Home page
home:
  hero_title: Welcome to My Blog
  button_text: Start Reading
  featured_limit: 3

# Blog index
blog:
  title: Blog
  subtitle: Thoughts on development, technology, and life
  max_tags: 3
  date_format: MMM D, YYYY
  post_date_format: MMMM D, YYYY
  feed_limit: 20

# Navigation categories link to /blog/tag/<category>/
nav:
  categories:
    - Technology
    - Lifestyle
    - Travel
    - Food

# Mode used before a visitor's own preference is known (light or dark)
theme:
  default: light

highlight:
  theme: base16-ocean.dark
  line_number: true

server:
  ip: localhost
  port: 4000
"#;

const ABOUT: &str = r#"---
title: About
---

This page is rendered from `source/about.md`. Tell your readers who you are.
"#;

const GITIGNORE: &str = "public/\n.quill/\n";

/// Initialize a new blog in the given directory
///
/// Existing files are left untouched, so running it twice is harmless.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("source/_posts"))?;

    let today = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
description: The first post on this blog.
tags: [Technology]
featured: true
---

Welcome! This is your very first post.

<!-- more -->

## Quick Start

### Create a new post

```bash
$ quill new "My New Post"
```

### Run server

```bash
$ quill server
```

### Generate static files

```bash
$ quill generate
```
"#,
        today.format("%Y-%m-%d")
    );

    write_if_missing(&target_dir.join("_config.yml"), CONFIG)?;
    write_if_missing(&target_dir.join(".gitignore"), GITIGNORE)?;
    write_if_missing(&target_dir.join("source/about.md"), ABOUT)?;
    write_if_missing(
        &target_dir
            .join("source/_posts")
            .join(format!("{}-hello-world.md", today.format("%Y-%m-%d"))),
        &sample_post,
    )?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentLoader;
    use crate::Blog;
    use crate::theme::ThemeMode;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_loadable_blog() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "My Blog");
        assert_eq!(blog.config.theme.default, Some(ThemeMode::Light));
        assert_eq!(blog.config.nav.categories.len(), 4);

        let posts = ContentLoader::new(&blog).load_posts().unwrap();
        let hello = posts.find("hello-world").unwrap();
        assert!(hello.meta.featured);
        assert!(ContentLoader::new(&blog).load_about().unwrap().is_some());
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Mine\n").unwrap();
        init_site(dir.path()).unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Mine");
    }
}
