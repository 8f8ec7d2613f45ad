//! Theme module - light/dark mode resolution and persistence
//!
//! The active mode is the persisted override when one exists, otherwise the
//! system preference, otherwise light. See [`ThemeContext`] for the
//! lifecycle that ties the pieces together.

mod context;
mod store;
mod system;

pub use context::ThemeContext;
pub use store::{CookieThemeStore, FileThemeStore, MemoryThemeStore, ThemeStore};
pub use system::{ClientHint, FixedSystemTheme, SystemTheme, CLIENT_HINT_HEADER};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Well-known key the override is stored under (cookie name, preference key)
pub const STORAGE_KEY: &str = "theme-mode";

/// Display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(ThemeError::UnknownMode(other.to_string())),
        }
    }
}

/// Errors raised by theme stores
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("unknown theme mode: {0:?} (expected \"light\" or \"dark\")")]
    UnknownMode(String),

    #[error("theme storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed preference file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode preference file: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Read the OS-level preference, defaulting to light when unavailable
pub fn system_theme(source: &dyn SystemTheme) -> ThemeMode {
    source.current().unwrap_or_default()
}

/// Read the persisted override, if any
///
/// A store that cannot be read behaves as if nothing was ever stored.
pub fn stored_theme<S: ThemeStore + ?Sized>(store: &S) -> Option<ThemeMode> {
    match store.load() {
        Ok(mode) => mode,
        Err(e) => {
            tracing::warn!("Ignoring stored theme preference: {}", e);
            None
        }
    }
}

/// Persist an override; storage failures are logged, never returned
pub fn set_stored_theme<S: ThemeStore + ?Sized>(store: &mut S, mode: ThemeMode) -> bool {
    match store.save(mode) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Theme preference not persisted: {}", e);
            false
        }
    }
}
