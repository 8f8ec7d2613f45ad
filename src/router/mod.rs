//! Routing - maps request paths to views and builds the navigation bar

use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::{Post, PostCollection};
use crate::helpers::{decode_segment, encode_segment};
use crate::theme::ThemeMode;

/// Where unknown post slugs are sent
pub const BLOG_PATH: &str = "/blog";

/// A parsed site path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Blog,
    BlogTag(String),
    BlogPost(String),
    About,
    NotFound,
}

impl Route {
    /// Parse a path relative to the site root
    ///
    /// A trailing slash or `index.html` is ignored, and segments are
    /// percent-decoded.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect();
        if segments.last().is_some_and(|s| s == "index.html") {
            segments.pop();
        }

        match segments.as_slice() {
            [] => Route::Home,
            [blog] if blog == "blog" => Route::Blog,
            [blog, tag, name] if blog == "blog" && tag == "tag" => Route::BlogTag(name.clone()),
            [blog, slug] if blog == "blog" => Route::BlogPost(slug.clone()),
            [about] if about == "about" => Route::About,
            _ => Route::NotFound,
        }
    }

    /// Canonical path of the route, always with a trailing slash
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Blog => "/blog/".to_string(),
            Route::BlogTag(tag) => format!("/blog/tag/{}/", encode_segment(tag)),
            Route::BlogPost(slug) => format!("/blog/{}/", encode_segment(slug)),
            Route::About => "/about/".to_string(),
            Route::NotFound => "/404.html".to_string(),
        }
    }

    /// Whether the route lives under `/blog`
    pub fn is_blog(&self) -> bool {
        matches!(self, Route::Blog | Route::BlogTag(_) | Route::BlogPost(_))
    }
}

/// The page a resolved route renders
#[derive(Debug, Clone, PartialEq)]
pub enum View<'a> {
    Home,
    /// The post index, optionally restricted to one tag
    BlogIndex { tag: Option<&'a str> },
    Post(&'a Post),
    About,
}

/// Outcome of resolving a route against the loaded posts
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    View(View<'a>),
    Redirect(&'static str),
    NotFound,
}

/// Resolve a route against the collection
///
/// Drafts are reachable by slug even though no listing shows them. A slug
/// that matches no post redirects to the blog index.
pub fn resolve<'a>(route: &'a Route, posts: &'a PostCollection) -> Resolution<'a> {
    match route {
        Route::Home => Resolution::View(View::Home),
        Route::Blog => Resolution::View(View::BlogIndex { tag: None }),
        Route::BlogTag(tag) => Resolution::View(View::BlogIndex { tag: Some(tag) }),
        Route::BlogPost(slug) => match posts.find(slug) {
            Some(post) => Resolution::View(View::Post(post)),
            None => {
                tracing::debug!("No post with slug {:?}, redirecting", slug);
                Resolution::Redirect(BLOG_PATH)
            }
        },
        Route::About => Resolution::View(View::About),
        Route::NotFound => Resolution::NotFound,
    }
}

/// One link in the navigation bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: String,
    pub href: String,
    pub active: bool,
}

/// Navigation links for the current route
///
/// "Blog" is active anywhere under `/blog`, a category only on its own tag
/// page, "About" only on `/about`. The site title link is rendered
/// separately and is never marked active.
pub fn nav_items(config: &SiteConfig, current: &Route) -> Vec<NavItem> {
    let mut items = Vec::with_capacity(config.nav.categories.len() + 2);

    items.push(NavItem {
        label: config.blog.title.clone(),
        href: Route::Blog.path(),
        active: current.is_blog(),
    });

    for category in &config.nav.categories {
        let route = Route::BlogTag(category.clone());
        items.push(NavItem {
            label: category.clone(),
            href: route.path(),
            active: *current == route,
        });
    }

    items.push(NavItem {
        label: config.about.title.clone(),
        href: Route::About.path(),
        active: *current == Route::About,
    });

    items
}

/// Label of the theme toggle for the active mode
pub fn toggle_label(mode: ThemeMode) -> String {
    format!("Switch to {} mode", mode.toggled())
}
