//! Durable storage for the theme override

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{ThemeError, ThemeMode, STORAGE_KEY};

/// Somewhere a single theme override can be kept between sessions
pub trait ThemeStore {
    /// Read the stored override; `Ok(None)` when never set
    fn load(&self) -> Result<Option<ThemeMode>, ThemeError>;

    /// Persist an override
    fn save(&mut self, mode: ThemeMode) -> Result<(), ThemeError>;

    /// Forget the override
    fn clear(&mut self) -> Result<(), ThemeError>;
}

/// In-memory store, nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryThemeStore {
    mode: Option<ThemeMode>,
}

impl MemoryThemeStore {
    pub fn with_mode(mode: ThemeMode) -> Self {
        Self { mode: Some(mode) }
    }
}

impl ThemeStore for MemoryThemeStore {
    fn load(&self) -> Result<Option<ThemeMode>, ThemeError> {
        Ok(self.mode)
    }

    fn save(&mut self, mode: ThemeMode) -> Result<(), ThemeError> {
        self.mode = Some(mode);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ThemeError> {
        self.mode = None;
        Ok(())
    }
}

/// On-disk preference file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(rename = "theme-mode", skip_serializing_if = "Option::is_none")]
    theme_mode: Option<String>,
}

/// TOML preference file, e.g. `.quill/preferences.toml`:
///
/// ```toml
/// theme-mode = "dark"
/// ```
#[derive(Debug, Clone)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Preferences, ThemeError> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn write(&self, prefs: &Preferences) -> Result<(), ThemeError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string(prefs)?)?;
        tracing::debug!("Wrote theme preference to {:?}", self.path);
        Ok(())
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> Result<Option<ThemeMode>, ThemeError> {
        self.read()?
            .theme_mode
            .map(|s| s.parse())
            .transpose()
    }

    fn save(&mut self, mode: ThemeMode) -> Result<(), ThemeError> {
        let mut prefs = self.read().unwrap_or_default();
        prefs.theme_mode = Some(mode.to_string());
        self.write(&prefs)
    }

    fn clear(&mut self) -> Result<(), ThemeError> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut prefs = self.read().unwrap_or_default();
        prefs.theme_mode = None;
        self.write(&prefs)
    }
}

/// Cookie-backed store for a single HTTP request
///
/// Reads `theme-mode` from the request's `Cookie` header; writes are
/// collected and handed back as a `Set-Cookie` value.
#[derive(Debug, Clone, Default)]
pub struct CookieThemeStore {
    value: Option<String>,
    pending: Option<String>,
}

/// One year
const COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

impl CookieThemeStore {
    /// Build from the raw `Cookie` header, if the request carried one
    pub fn from_cookie_header(header: Option<&str>) -> Self {
        let value = header.and_then(|h| {
            h.split(';').find_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                (name.trim() == STORAGE_KEY).then(|| value.trim().trim_matches('"').to_string())
            })
        });
        Self {
            value,
            pending: None,
        }
    }

    /// `Set-Cookie` header value for any write made during the request
    pub fn set_cookie_header(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}

impl ThemeStore for CookieThemeStore {
    fn load(&self) -> Result<Option<ThemeMode>, ThemeError> {
        match self.value.as_deref() {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some),
        }
    }

    fn save(&mut self, mode: ThemeMode) -> Result<(), ThemeError> {
        self.value = Some(mode.to_string());
        self.pending = Some(format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            STORAGE_KEY, mode, COOKIE_MAX_AGE
        ));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ThemeError> {
        self.value = None;
        self.pending = Some(format!("{}=; Path=/; Max-Age=0; SameSite=Lax", STORAGE_KEY));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_file_is_unset() {
        let dir = TempDir::new().unwrap();
        let store = FileThemeStore::new(dir.path().join(".quill/preferences.toml"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".quill/preferences.toml");

        let mut store = FileThemeStore::new(&path);
        store.save(ThemeMode::Dark).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("theme-mode = \"dark\""));

        let reopened = FileThemeStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(ThemeMode::Dark));
    }

    #[test]
    fn test_file_store_clear() {
        let dir = TempDir::new().unwrap();
        let mut store = FileThemeStore::new(dir.path().join("prefs.toml"));
        store.save(ThemeMode::Light).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_unknown_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.toml");
        fs::write(&path, "theme-mode = \"sepia\"\n").unwrap();
        let store = FileThemeStore::new(&path);
        assert!(matches!(store.load(), Err(ThemeError::UnknownMode(_))));
    }

    #[test]
    fn test_cookie_store_reads_header() {
        let store = CookieThemeStore::from_cookie_header(Some("sid=abc; theme-mode=dark; x=1"));
        assert_eq!(store.load().unwrap(), Some(ThemeMode::Dark));
        assert_eq!(store.set_cookie_header(), None);

        let store = CookieThemeStore::from_cookie_header(Some("sid=abc"));
        assert_eq!(store.load().unwrap(), None);

        let store = CookieThemeStore::from_cookie_header(None);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_cookie_store_save_produces_set_cookie() {
        let mut store = CookieThemeStore::from_cookie_header(None);
        store.save(ThemeMode::Light).unwrap();
        let header = store.set_cookie_header().unwrap();
        assert!(header.starts_with("theme-mode=light;"));
        assert!(header.contains("Path=/"));
        assert_eq!(store.load().unwrap(), Some(ThemeMode::Light));
    }
}
