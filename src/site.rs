//! Site - the loaded blog rendered through routing and templates
//!
//! Both the server and the static generator go through [`Site::render`],
//! so a route looks the same whichever way it is delivered.

use anyhow::Result;
use chrono::Datelike;
use tera::Context;

use crate::content::{
    get_featured_posts, get_posts_by_tag, ContentLoader, Page, Post, PostCollection,
};
use crate::helpers::url_for;
use crate::router::{nav_items, resolve, NavItem, Resolution, Route, View, BLOG_PATH};
use crate::templates::{
    AboutData, NavPost, PostCard, PostData, SiteData, TagChip, TemplateRenderer, ThemeData,
};
use crate::theme::ThemeMode;
use crate::Blog;

/// Result of rendering a route
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Page(String),
    /// Root-prefixed location to send the client to
    Redirect(String),
    NotFound,
}

/// A blog with its content loaded and ready to render
pub struct Site {
    pub blog: Blog,
    pub posts: PostCollection,
    pub about: Option<Page>,
    renderer: TemplateRenderer,
}

impl Site {
    /// Load all content of a blog
    pub fn load(blog: Blog) -> Result<Self> {
        let loader = ContentLoader::new(&blog);
        let posts = loader.load_posts()?;
        let about = loader.load_about()?;

        tracing::info!(
            "Loaded {} posts ({} published)",
            posts.len(),
            posts.published().len()
        );

        Self::from_parts(blog, posts, about)
    }

    /// Assemble a site from already loaded content
    pub fn from_parts(blog: Blog, posts: PostCollection, about: Option<Page>) -> Result<Self> {
        Ok(Self {
            blog,
            posts,
            about,
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Published posts, newest first
    pub fn published(&self) -> Vec<Post> {
        self.posts.published()
    }

    /// Render a route in the given theme
    pub fn render(&self, route: &Route, theme: ThemeMode) -> Result<Rendered> {
        match resolve(route, &self.posts) {
            Resolution::View(view) => Ok(Rendered::Page(self.render_view(route, &view, theme)?)),
            Resolution::Redirect(path) => {
                Ok(Rendered::Redirect(url_for(&self.blog.config, path)))
            }
            Resolution::NotFound => Ok(Rendered::NotFound),
        }
    }

    /// Render a resolved view
    pub fn render_view(&self, route: &Route, view: &View, theme: ThemeMode) -> Result<String> {
        let config = &self.blog.config;
        let published = self.published();

        match view {
            View::Home => {
                let featured: Vec<PostCard> = get_featured_posts(&published)
                    .iter()
                    .take(config.home.featured_limit)
                    .map(|p| PostCard::new(config, p))
                    .collect();

                let mut context = self.base_context(route, theme, None, None);
                context.insert("home", &config.home);
                context.insert("featured", &featured);
                context.insert("blog_url", &url_for(config, BLOG_PATH));
                self.renderer.render("home.html", &context)
            }

            View::BlogIndex { tag } => {
                let listed = match tag {
                    Some(tag) => get_posts_by_tag(&published, tag),
                    None => published,
                };
                let cards: Vec<PostCard> =
                    listed.iter().map(|p| PostCard::new(config, p)).collect();

                let title = tag.unwrap_or(&config.blog.title);
                let mut context = self.base_context(route, theme, Some(title), None);
                context.insert("blog", &config.blog);
                context.insert("tag", tag);
                context.insert("posts", &cards);
                self.renderer.render("blog_index.html", &context)
            }

            View::Post(post) => {
                let data = self.post_data(post, &published);
                let mut context = self.base_context(
                    route,
                    theme,
                    Some(&post.meta.title),
                    post.meta.description.as_deref(),
                );
                context.insert("post", &data);
                context.insert("post_date_format", &config.blog.post_date_format);
                self.renderer.render("post.html", &context)
            }

            View::About => {
                let data = AboutData {
                    title: self
                        .about
                        .as_ref()
                        .map(|p| p.title.clone())
                        .unwrap_or_else(|| config.about.title.clone()),
                    content: self.about.as_ref().map(|p| p.content.clone()),
                    paragraphs: config.about.paragraphs.clone(),
                };
                let mut context = self.base_context(route, theme, Some(&data.title), None);
                context.insert("about", &data);
                self.renderer.render("about.html", &context)
            }
        }
    }

    /// Fallback page for static hosts
    ///
    /// Paths under `/blog/` that reach it are unknown slugs, so its script
    /// sends them on to the blog index.
    pub fn render_not_found(&self, theme: ThemeMode) -> Result<String> {
        let config = &self.blog.config;
        let mut context = self.base_context(&Route::NotFound, theme, Some("Not found"), None);
        context.insert("blog_url", &url_for(config, BLOG_PATH));
        context.insert("blog_prefix", &url_for(config, "/blog/"));
        self.renderer.render("404.html", &context)
    }

    /// Variables every page needs
    fn base_context(
        &self,
        route: &Route,
        theme: ThemeMode,
        page_title: Option<&str>,
        page_description: Option<&str>,
    ) -> Context {
        let config = &self.blog.config;
        let nav: Vec<NavItem> = nav_items(config, route)
            .into_iter()
            .map(|item| NavItem {
                href: url_for(config, &item.href),
                ..item
            })
            .collect();

        let mut context = Context::new();
        context.insert("site", &SiteData::new(config));
        context.insert("theme", &ThemeData::new(config, theme));
        context.insert("nav", &nav);
        context.insert("current_path", &url_for(config, &route.path()));
        context.insert("page_title", &page_title);
        context.insert(
            "page_description",
            &page_description.unwrap_or(&config.description),
        );
        context.insert("card_date_format", &config.blog.date_format);
        context.insert("current_year", &chrono::Local::now().year());
        context
    }

    fn post_data(&self, post: &Post, published: &[Post]) -> PostData {
        let config = &self.blog.config;
        let content = self
            .posts
            .body(&post.slug)
            .map(|b| b.html().to_string())
            .unwrap_or_default();

        PostData {
            title: post.meta.title.clone(),
            date: post.meta.date.clone(),
            author: post.meta.author.clone(),
            description: post.meta.description.clone(),
            tags: post
                .meta
                .tags
                .iter()
                .map(|t| TagChip::new(config, t))
                .collect(),
            content,
            prev: post.prev(published).map(|p| NavPost::new(config, p)),
            next: post.next(published).map(|p| NavPost::new(config, p)),
        }
    }
}
