//! Generator module - writes every route of the site to the public directory

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::content::collect_tags;
use crate::helpers::{
    absolutize_urls, date_xml, escape_xml, full_url_for, strip_invalid_xml_chars,
};
use crate::router::Route;
use crate::site::{Rendered, Site};
use crate::theme::ThemeMode;

/// Static site generator
pub struct Generator<'a> {
    site: &'a Site,
    theme: ThemeMode,
}

impl<'a> Generator<'a> {
    /// Create a generator rendering pages in the site's default theme
    pub fn new(site: &'a Site) -> Self {
        Self {
            site,
            theme: site.blog.site_theme(),
        }
    }

    /// Bake a specific mode into `data-theme` instead
    pub fn with_theme(mut self, theme: ThemeMode) -> Self {
        self.theme = theme;
        self
    }

    /// Generate the entire site
    pub fn generate(&self) -> Result<()> {
        let public_dir = &self.site.blog.public_dir;
        fs::create_dir_all(public_dir)?;

        self.copy_source_assets()?;

        let routes = self.routes();
        let mut written = 0;
        for route in &routes {
            if self.generate_route(route)? {
                written += 1;
            }
        }
        tracing::info!("Generated {} pages in {} mode", written, self.theme);

        self.generate_not_found()?;
        self.generate_atom_feed()?;

        Ok(())
    }

    /// Every route with a page of its own
    ///
    /// Drafts get a page too, so a direct link keeps working, but no
    /// listing points at them.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes = vec![Route::Home, Route::Blog, Route::About];

        routes.extend(
            self.site
                .posts
                .posts()
                .iter()
                .map(|p| Route::BlogPost(p.slug.clone())),
        );

        // Category buttons link to tag pages even before a post uses them
        let mut tags = collect_tags(&self.site.published());
        for category in &self.site.blog.config.nav.categories {
            tags.entry(category.clone()).or_insert(0);
        }
        routes.extend(tags.into_keys().map(Route::BlogTag));

        routes
    }

    /// Render one route to disk; `false` when it produced no page
    fn generate_route(&self, route: &Route) -> Result<bool> {
        let Some(output_path) = self.output_path(route) else {
            tracing::warn!("Skipping {:?}: not representable as a file path", route);
            return Ok(false);
        };

        let html = match self.site.render(route, self.theme)? {
            Rendered::Page(html) => html,
            Rendered::Redirect(_) | Rendered::NotFound => return Ok(false),
        };

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);

        Ok(true)
    }

    /// Where a route's `index.html` goes
    fn output_path(&self, route: &Route) -> Option<PathBuf> {
        let public_dir = &self.site.blog.public_dir;
        let dir = match route {
            Route::Home => public_dir.clone(),
            Route::Blog => public_dir.join("blog"),
            Route::BlogTag(tag) if is_plain_segment(tag) => public_dir.join("blog/tag").join(tag),
            Route::BlogPost(slug) if is_plain_segment(slug) => public_dir.join("blog").join(slug),
            Route::About => public_dir.join("about"),
            _ => return None,
        };
        Some(dir.join("index.html"))
    }

    /// Write `404.html`; unknown post slugs land here and move on to `/blog`
    fn generate_not_found(&self) -> Result<()> {
        let output_path = self.site.blog.public_dir.join("404.html");
        fs::write(&output_path, self.site.render_not_found(self.theme)?)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Write `atom.xml`
    fn generate_atom_feed(&self) -> Result<()> {
        let output_path = self.site.blog.public_dir.join("atom.xml");
        fs::write(&output_path, atom_feed(self.site))?;
        tracing::info!("Generated atom.xml");
        Ok(())
    }

    /// Copy source assets (images, etc.) to public directory
    fn copy_source_assets(&self) -> Result<()> {
        let blog = &self.site.blog;
        let posts_dir = blog.posts_dir();

        for entry in WalkDir::new(&blog.source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.starts_with(&posts_dir) {
                continue;
            }

            // Markdown sources are rendered, not copied
            let ext = path.extension().and_then(|e| e.to_str());
            if matches!(ext, Some("md" | "mdx" | "markdown")) {
                continue;
            }

            let relative = path.strip_prefix(&blog.source_dir)?;
            let dest = blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            tracing::debug!("Copied: {:?}", dest);
        }

        Ok(())
    }
}

/// A name usable as a single directory
fn is_plain_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Atom feed of the newest published posts
pub fn atom_feed(site: &Site) -> String {
    let config = &site.blog.config;
    let posts = site.published();
    let posts = &posts[..posts.len().min(config.blog.feed_limit)];

    let updated = posts
        .iter()
        .find_map(|p| p.meta.parsed_date())
        .map(|d| date_xml(&d))
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

    let mut feed = String::new();
    feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    feed.push('\n');
    feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
    feed.push('\n');
    feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
    if !config.subtitle.is_empty() {
        feed.push_str(&format!(
            "  <subtitle>{}</subtitle>\n",
            escape_xml(&config.subtitle)
        ));
    }
    feed.push_str(&format!(
        "  <link href=\"{}\" rel=\"self\"/>\n",
        full_url_for(config, "/atom.xml")
    ));
    feed.push_str(&format!("  <link href=\"{}\"/>\n", full_url_for(config, "/")));
    feed.push_str(&format!("  <updated>{}</updated>\n", updated));
    feed.push_str(&format!("  <id>{}</id>\n", full_url_for(config, "/")));
    feed.push_str(&format!(
        "  <author><name>{}</name></author>\n",
        escape_xml(&config.author)
    ));

    for post in posts {
        let link = full_url_for(config, &post.path());
        let date = post
            .meta
            .parsed_date()
            .map(|d| date_xml(&d))
            .unwrap_or_else(|| updated.clone());

        feed.push_str("  <entry>\n");
        feed.push_str(&format!(
            "    <title>{}</title>\n",
            escape_xml(&post.meta.title)
        ));
        feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
        feed.push_str(&format!("    <id>{}</id>\n", link));
        feed.push_str(&format!("    <published>{}</published>\n", date));
        feed.push_str(&format!("    <updated>{}</updated>\n", date));
        for tag in &post.meta.tags {
            feed.push_str(&format!("    <category term=\"{}\"/>\n", escape_xml(tag)));
        }
        if let Some(description) = &post.meta.description {
            feed.push_str(&format!(
                "    <summary>{}</summary>\n",
                escape_xml(description)
            ));
        }

        let content = site
            .posts
            .body(&post.slug)
            .map(|b| b.summary())
            .unwrap_or_default();
        let content = strip_invalid_xml_chars(&absolutize_urls(content, &config.url));
        feed.push_str(&format!(
            "    <content type=\"html\"><![CDATA[{}]]></content>\n",
            content.replace("]]>", "]]]]><![CDATA[>")
        ));
        feed.push_str("  </entry>\n");
    }

    feed.push_str("</feed>\n");
    feed
}
