//! Development server with live reload
//!
//! Pages are rendered per request, so the theme comes from the visitor's
//! `theme-mode` cookie and color-scheme client hint rather than from a
//! generated file.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        Form, State, WebSocketUpgrade,
    },
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE, VARY},
        HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri,
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::generator::atom_feed;
use crate::router::Route;
use crate::site::{Rendered, Site};
use crate::templates::TOGGLE_PATH;
use crate::theme::{ClientHint, CookieThemeStore, ThemeContext, ThemeMode};
use crate::Blog;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server state
struct ServerState {
    site: RwLock<Site>,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

/// Start the development server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let site = Site::load(blog.clone())?;
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let state = Arc::new(ServerState {
        site: RwLock::new(site),
        reload_tx,
        live_reload: watch,
    });

    let app = router(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let blog = blog.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(blog, state) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/__livereload", get(livereload_handler))
        .route("/atom.xml", get(feed_handler))
        .route(TOGGLE_PATH, post(toggle_handler))
        .fallback(page_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch the sources and swap in a freshly loaded site on change
fn watch_and_reload(blog: Blog, state: Arc<ServerState>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid reloads
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if blog.source_dir.exists() {
        debouncer
            .watcher()
            .watch(&blog.source_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", blog.source_dir);
    }

    let config_path = blog.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events.iter().filter(|e| is_relevant(&e.path)).collect();
                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    println!("File changed: {}", event.path.display());
                }

                // Config edits can move directories, so reopen the blog too
                match Blog::new(&blog.base_dir).and_then(Site::load) {
                    Ok(site) => {
                        *state.site.blocking_write() = site;
                        println!("Reloaded successfully!");
                        let _ = state.reload_tx.send(());
                    }
                    Err(e) => {
                        println!("Reload failed, still serving the previous content: {:#}", e);
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Filter out editor and VCS noise
fn is_relevant(path: &std::path::Path) -> bool {
    let path_str = path.to_string_lossy();
    !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.ends_with('~')
        && !path_str.ends_with(".swp")
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Render a route, or fall back to a static asset from the source directory
async fn page_handler(State(state): State<Arc<ServerState>>, mut request: Request<Body>) -> Response {
    let site = state.site.read().await;

    let Some(relative) = strip_root(&site.blog.config.root, request.uri().path()) else {
        return not_found();
    };
    let route = Route::parse(&relative);

    let rendered = if route == Route::NotFound {
        Ok(Rendered::NotFound)
    } else {
        let theme = request_theme(request.headers(), site.blog.site_theme());
        site.render(&route, theme)
    };

    match rendered {
        Ok(Rendered::Page(html)) => page_response(html, state.live_reload),
        Ok(Rendered::Redirect(location)) => Redirect::to(&location).into_response(),
        Ok(Rendered::NotFound) => {
            let source_dir = site.blog.source_dir.clone();
            drop(site);

            if is_source_document(&relative) {
                return not_found();
            }
            match relative.parse::<Uri>() {
                Ok(uri) => *request.uri_mut() = uri,
                Err(_) => return not_found(),
            }
            let mut service = ServeDir::new(source_dir);
            match service.try_call(request).await {
                Ok(response) => response.into_response(),
                Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
            }
        }
        Err(e) => {
            tracing::error!("Failed to render {:?}: {:#}", route, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Serve the Atom feed
async fn feed_handler(State(state): State<Arc<ServerState>>) -> Response {
    let site = state.site.read().await;
    (
        [(CONTENT_TYPE, "application/atom+xml; charset=utf-8")],
        atom_feed(&site),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct ToggleForm {
    /// Page to return to
    back: Option<String>,
}

/// Flip the visitor's theme and send them back where they came from
///
/// Only reached without JavaScript; the inline theme script handles the
/// toggle in the browser otherwise.
async fn toggle_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Response {
    let default = state.site.read().await.blog.site_theme();
    toggle_response(&headers, default, form.back.as_deref())
}

/// Resolve the theme of one request: cookie override, else client hint,
/// else the site default
fn request_theme(headers: &HeaderMap, site_default: ThemeMode) -> ThemeMode {
    let system = ClientHint::from_headers(headers).or(Some(site_default));
    ThemeContext::init(cookie_store(headers), &system).mode()
}

fn cookie_store(headers: &HeaderMap) -> CookieThemeStore {
    CookieThemeStore::from_cookie_header(headers.get(COOKIE).and_then(|v| v.to_str().ok()))
}

fn toggle_response(headers: &HeaderMap, site_default: ThemeMode, back: Option<&str>) -> Response {
    let system = ClientHint::from_headers(headers).or(Some(site_default));
    let mut context = ThemeContext::init(cookie_store(headers), &system);
    let mode = context.toggle();
    let store = context.teardown();
    tracing::debug!(%mode, "Theme toggled");

    let target = back.filter(|b| is_local_path(b)).unwrap_or("/");
    let mut response = Redirect::to(target).into_response();
    if let Some(cookie) = store.set_cookie_header() {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

/// HTML response that varies with the theme inputs
fn page_response(html: String, live_reload: bool) -> Response {
    let html = if live_reload {
        inject_live_reload(&html)
    } else {
        html
    };

    let mut response = Html(html).into_response();
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("accept-ch"),
        HeaderValue::from_static("Sec-CH-Prefers-Color-Scheme"),
    );
    headers.insert(
        VARY,
        HeaderValue::from_static("Cookie, Sec-CH-Prefers-Color-Scheme"),
    );
    response
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

/// Path relative to the configured root, `None` when outside it
fn strip_root(root: &str, path: &str) -> Option<String> {
    let root = root.trim_end_matches('/');
    let rest = path.strip_prefix(root)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}

/// Redirect targets must stay on this site
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Raw sources are rendered, never served
fn is_source_document(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    [".md", ".mdx", ".markdown"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::CLIENT_HINT_HEADER;
    use axum::http::header::LOCATION;
    use std::fs;
    use tempfile::TempDir;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn state(dir: &TempDir) -> Arc<ServerState> {
        let blog = Blog::new(dir.path()).unwrap();
        fs::create_dir_all(blog.posts_dir()).unwrap();
        fs::write(
            blog.posts_dir().join("2025-10-03-hello.md"),
            "---\ntitle: Hello\ndate: 2025-10-03\n---\nHi there",
        )
        .unwrap();
        fs::write(blog.source_dir.join("robots.txt"), "User-agent: *").unwrap();

        let (reload_tx, _) = broadcast::channel(1);
        Arc::new(ServerState {
            site: RwLock::new(Site::load(blog).unwrap()),
            reload_tx,
            live_reload: false,
        })
    }

    async fn get(state: &Arc<ServerState>, path: &str, extra: &[(&'static str, &'static str)]) -> Response {
        let mut request = Request::builder().uri(path).body(Body::empty()).unwrap();
        *request.headers_mut() = headers(extra);
        page_handler(State(state.clone()), request).await
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_request_theme_precedence() {
        assert_eq!(request_theme(&headers(&[]), ThemeMode::Light), ThemeMode::Light);
        assert_eq!(request_theme(&headers(&[]), ThemeMode::Dark), ThemeMode::Dark);
        assert_eq!(
            request_theme(&headers(&[(CLIENT_HINT_HEADER, "dark")]), ThemeMode::Light),
            ThemeMode::Dark
        );
        assert_eq!(
            request_theme(
                &headers(&[(CLIENT_HINT_HEADER, "dark"), ("cookie", "theme-mode=light")]),
                ThemeMode::Dark
            ),
            ThemeMode::Light
        );
    }

    #[test]
    fn test_toggle_sets_cookie_and_redirects_back() {
        let response = toggle_response(
            &headers(&[(CLIENT_HINT_HEADER, "dark")]),
            ThemeMode::Light,
            Some("/blog/hello/"),
        );
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/blog/hello/");
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("theme-mode=light;"));
    }

    #[test]
    fn test_toggle_replaces_unrecognised_cookie() {
        let response = toggle_response(
            &headers(&[("cookie", "theme-mode=sepia")]),
            ThemeMode::Light,
            Some("/about/"),
        );
        assert_eq!(response.headers()[LOCATION], "/about/");
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("theme-mode=dark;"));
    }

    #[test]
    fn test_toggle_refuses_foreign_redirects() {
        let response = toggle_response(&headers(&[]), ThemeMode::Light, Some("//evil.example/"));
        assert_eq!(response.headers()[LOCATION], "/");
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("theme-mode=dark;"));
    }

    #[test]
    fn test_strip_root() {
        assert_eq!(strip_root("/", "/blog/"), Some("/blog/".to_string()));
        assert_eq!(strip_root("/notes/", "/notes"), Some("/".to_string()));
        assert_eq!(strip_root("/notes/", "/notes/about"), Some("/about".to_string()));
        assert_eq!(strip_root("/notes/", "/notesabout"), None);
        assert_eq!(strip_root("/notes/", "/blog"), None);
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body>x</body></html>");
        assert!(html.contains("__livereload"));
        assert!(html.ends_with("</body>\n</html>"));
    }

    #[tokio::test]
    async fn test_page_handler_renders_with_cookie_theme() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        let response = get(&state, "/blog/hello/", &[("cookie", "theme-mode=dark")]).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(VARY));
        let body = body_text(response).await;
        assert!(body.contains("Hi there"));
        assert!(body.contains(r#"data-theme="dark""#));
    }

    #[tokio::test]
    async fn test_page_handler_redirects_unknown_slug() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        let response = get(&state, "/blog/missing", &[]).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/blog");
    }

    #[tokio::test]
    async fn test_page_handler_serves_assets_but_not_sources() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);

        let response = get(&state, "/robots.txt", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "User-agent: *");

        let response = get(&state, "/_posts/2025-10-03-hello.md", &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_feed_handler() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let response = feed_handler(State(state)).await;
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/atom+xml; charset=utf-8"
        );
        assert!(body_text(response).await.contains("<title>Hello</title>"));
    }
}
