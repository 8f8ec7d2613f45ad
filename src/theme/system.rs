//! Sources of the system color-scheme preference

use axum::http::HeaderMap;

use super::ThemeMode;

/// Request header carrying the client's `prefers-color-scheme`
pub const CLIENT_HINT_HEADER: &str = "sec-ch-prefers-color-scheme";

/// Reports the OS-level preference, `None` when it cannot be determined
pub trait SystemTheme {
    fn current(&self) -> Option<ThemeMode>;
}

/// A preference known up front (site default, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSystemTheme(pub Option<ThemeMode>);

impl SystemTheme for FixedSystemTheme {
    fn current(&self) -> Option<ThemeMode> {
        self.0
    }
}

/// The `Sec-CH-Prefers-Color-Scheme` client hint of an HTTP request
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientHint(Option<ThemeMode>);

impl ClientHint {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mode = headers
            .get(CLIENT_HINT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().trim_matches('"').parse().ok());
        Self(mode)
    }

    /// Use `fallback` when the request carried no usable hint
    pub fn or(self, fallback: Option<ThemeMode>) -> Self {
        Self(self.0.or(fallback))
    }
}

impl SystemTheme for ClientHint {
    fn current(&self) -> Option<ThemeMode> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_hint_quoted_value() {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_HINT_HEADER, HeaderValue::from_static("\"dark\""));
        assert_eq!(ClientHint::from_headers(&headers).current(), Some(ThemeMode::Dark));
    }

    #[test]
    fn test_client_hint_missing_or_garbage() {
        let headers = HeaderMap::new();
        assert_eq!(ClientHint::from_headers(&headers).current(), None);

        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_HINT_HEADER, HeaderValue::from_static("no-preference"));
        assert_eq!(ClientHint::from_headers(&headers).current(), None);
    }

    #[test]
    fn test_client_hint_fallback() {
        let headers = HeaderMap::new();
        let hint = ClientHint::from_headers(&headers).or(Some(ThemeMode::Dark));
        assert_eq!(hint.current(), Some(ThemeMode::Dark));

        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_HINT_HEADER, HeaderValue::from_static("light"));
        let hint = ClientHint::from_headers(&headers).or(Some(ThemeMode::Dark));
        assert_eq!(hint.current(), Some(ThemeMode::Light));
    }
}
