//! Theme context - owns the active mode for one session

use tokio::sync::watch;

use super::{
    set_stored_theme, stored_theme, system_theme, SystemTheme, ThemeError, ThemeMode, ThemeStore,
};

/// The active theme of one session (a CLI run, an HTTP request, a test)
///
/// Created with [`ThemeContext::init`], which reads the store and the system
/// preference. While no override exists, system notifications delivered
/// through [`subscribe`](Self::subscribe) move the mode; a manual
/// [`toggle`](Self::toggle) or [`set_mode`](Self::set_mode) persists an
/// override after which notifications are ignored.
/// [`teardown`](Self::teardown) drops the subscription and hands the store
/// back.
pub struct ThemeContext<S: ThemeStore> {
    store: S,
    mode: ThemeMode,
    overridden: bool,
    /// Cleared after the first storage failure; the session continues in memory
    persistent: bool,
    subscription: Option<watch::Receiver<ThemeMode>>,
}

impl<S: ThemeStore> ThemeContext<S> {
    /// Resolve the initial mode: stored override, else system, else light
    pub fn init(store: S, system: &dyn SystemTheme) -> Self {
        let (mode, overridden, persistent) = match store.load() {
            Ok(Some(mode)) => (mode, true, true),
            Ok(None) => (system_theme(system), false, true),
            // Unrecognised contents count as never set; the next write replaces them
            Err(e @ (ThemeError::UnknownMode(_) | ThemeError::Parse(_))) => {
                tracing::warn!("Ignoring stored theme preference: {}", e);
                (system_theme(system), false, true)
            }
            Err(e) => {
                tracing::warn!("Theme storage unavailable, continuing in memory: {}", e);
                (system_theme(system), false, false)
            }
        };

        tracing::debug!(%mode, overridden, "Initialized theme context");

        Self {
            store,
            mode,
            overridden,
            persistent,
            subscription: None,
        }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Whether a user override is in effect
    pub fn has_override(&self) -> bool {
        self.overridden || (self.persistent && stored_theme(&self.store).is_some())
    }

    /// Whether writes still reach durable storage
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Flip the mode and persist it as the user's override
    pub fn toggle(&mut self) -> ThemeMode {
        self.set_mode(self.mode.toggled())
    }

    /// Set an explicit override
    pub fn set_mode(&mut self, mode: ThemeMode) -> ThemeMode {
        self.mode = mode;
        self.overridden = true;
        if self.persistent && !set_stored_theme(&mut self.store, mode) {
            self.persistent = false;
        }
        self.mode
    }

    /// Drop the override and fall back to the system preference
    pub fn reset(&mut self, system: &dyn SystemTheme) -> ThemeMode {
        if self.persistent {
            if let Err(e) = self.store.clear() {
                tracing::warn!("Failed to clear theme preference: {}", e);
                self.persistent = false;
            }
        }
        self.overridden = false;
        self.mode = system_theme(system);
        self.mode
    }

    /// Apply an OS preference change; returns whether the mode followed it
    pub fn on_system_change(&mut self, mode: ThemeMode) -> bool {
        if self.has_override() {
            tracing::debug!(%mode, "Ignoring system theme change, user override in effect");
            return false;
        }
        self.mode = mode;
        true
    }

    /// Listen for system preference notifications
    pub fn subscribe(&mut self, rx: watch::Receiver<ThemeMode>) {
        self.subscription = Some(rx);
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply the latest pending notification, if any, and return the mode
    pub fn pump(&mut self) -> ThemeMode {
        let Some(rx) = self.subscription.as_mut() else {
            return self.mode;
        };
        match rx.has_changed() {
            Ok(true) => {
                let latest = *rx.borrow_and_update();
                self.on_system_change(latest);
            }
            Ok(false) => {}
            Err(_) => {
                tracing::debug!("System theme source closed");
                self.subscription = None;
            }
        }
        self.mode
    }

    /// Wait for the next notification and apply it
    ///
    /// Returns `None` once there is no subscription or its source is gone.
    pub async fn next_change(&mut self) -> Option<ThemeMode> {
        let rx = self.subscription.as_mut()?;
        if rx.changed().await.is_err() {
            self.subscription = None;
            return None;
        }
        let latest = *rx.borrow_and_update();
        self.on_system_change(latest);
        Some(self.mode)
    }

    /// End the session: unsubscribe and return the store
    pub fn teardown(mut self) -> S {
        self.subscription.take();
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{CookieThemeStore, FixedSystemTheme, MemoryThemeStore};

    const DARK_OS: FixedSystemTheme = FixedSystemTheme(Some(ThemeMode::Dark));
    const NO_OS: FixedSystemTheme = FixedSystemTheme(None);

    /// A store whose backing storage is gone
    struct BrokenStore;

    impl ThemeStore for BrokenStore {
        fn load(&self) -> Result<Option<ThemeMode>, ThemeError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
        }
        fn save(&mut self, _mode: ThemeMode) -> Result<(), ThemeError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
        }
        fn clear(&mut self) -> Result<(), ThemeError> {
            Ok(())
        }
    }

    #[test]
    fn test_initial_mode_follows_system_without_override() {
        let ctx = ThemeContext::init(MemoryThemeStore::default(), &DARK_OS);
        assert_eq!(ctx.mode(), ThemeMode::Dark);
        assert!(!ctx.has_override());
    }

    #[test]
    fn test_initial_mode_prefers_stored_override() {
        let ctx = ThemeContext::init(MemoryThemeStore::with_mode(ThemeMode::Light), &DARK_OS);
        assert_eq!(ctx.mode(), ThemeMode::Light);
        assert!(ctx.has_override());
    }

    #[test]
    fn test_initial_mode_falls_back_to_light() {
        let ctx = ThemeContext::init(MemoryThemeStore::default(), &NO_OS);
        assert_eq!(ctx.mode(), ThemeMode::Light);
    }

    #[test]
    fn test_system_changes_tracked_until_toggle() {
        let mut ctx = ThemeContext::init(MemoryThemeStore::default(), &NO_OS);
        assert!(ctx.on_system_change(ThemeMode::Dark));
        assert_eq!(ctx.mode(), ThemeMode::Dark);

        assert_eq!(ctx.toggle(), ThemeMode::Light);
        assert_eq!(ctx.store().load().unwrap(), Some(ThemeMode::Light));

        assert!(!ctx.on_system_change(ThemeMode::Dark));
        assert_eq!(ctx.mode(), ThemeMode::Light);
    }

    #[test]
    fn test_external_store_write_stops_tracking() {
        // Override written by someone else after init, e.g. another window
        let ctx = ThemeContext::init(MemoryThemeStore::default(), &DARK_OS);
        let mut store = ctx.teardown();
        crate::theme::set_stored_theme(&mut store, ThemeMode::Light);

        let mut ctx = ThemeContext::init(store, &DARK_OS);
        assert_eq!(ctx.mode(), ThemeMode::Light);
        assert!(!ctx.on_system_change(ThemeMode::Dark));
    }

    #[test]
    fn test_subscription_pump_last_write_wins() {
        let (tx, rx) = watch::channel(ThemeMode::Light);
        let mut ctx = ThemeContext::init(MemoryThemeStore::default(), &NO_OS);
        ctx.subscribe(rx);

        assert_eq!(ctx.pump(), ThemeMode::Light);

        tx.send(ThemeMode::Dark).unwrap();
        tx.send(ThemeMode::Light).unwrap();
        tx.send(ThemeMode::Dark).unwrap();
        assert_eq!(ctx.pump(), ThemeMode::Dark);

        ctx.set_mode(ThemeMode::Light);
        tx.send(ThemeMode::Dark).unwrap();
        assert_eq!(ctx.pump(), ThemeMode::Light);
    }

    #[test]
    fn test_pump_drops_closed_subscription() {
        let (tx, rx) = watch::channel(ThemeMode::Light);
        let mut ctx = ThemeContext::init(MemoryThemeStore::default(), &NO_OS);
        ctx.subscribe(rx);
        drop(tx);
        ctx.pump();
        assert!(!ctx.is_subscribed());
    }

    #[test]
    fn test_teardown_unsubscribes() {
        let (tx, rx) = watch::channel(ThemeMode::Light);
        let mut ctx = ThemeContext::init(MemoryThemeStore::default(), &NO_OS);
        ctx.subscribe(rx);
        let _store = ctx.teardown();
        assert!(tx.is_closed());
    }

    #[test]
    fn test_broken_storage_degrades_to_memory() {
        let mut ctx = ThemeContext::init(BrokenStore, &DARK_OS);
        assert_eq!(ctx.mode(), ThemeMode::Dark);
        assert!(!ctx.is_persistent());

        assert_eq!(ctx.toggle(), ThemeMode::Light);
        assert!(!ctx.on_system_change(ThemeMode::Dark));
        assert_eq!(ctx.mode(), ThemeMode::Light);
    }

    #[test]
    fn test_unrecognised_stored_value_is_replaced() {
        let store = CookieThemeStore::from_cookie_header(Some("theme-mode=sepia"));
        let mut ctx = ThemeContext::init(store, &DARK_OS);
        assert_eq!(ctx.mode(), ThemeMode::Dark);
        assert!(ctx.is_persistent());
        assert!(!ctx.has_override());

        assert_eq!(ctx.toggle(), ThemeMode::Light);
        let store = ctx.teardown();
        assert_eq!(store.load().unwrap(), Some(ThemeMode::Light));
        assert!(store
            .set_cookie_header()
            .unwrap()
            .starts_with("theme-mode=light;"));
    }

    #[test]
    fn test_reset_returns_to_system() {
        let mut ctx = ThemeContext::init(MemoryThemeStore::with_mode(ThemeMode::Light), &DARK_OS);
        assert_eq!(ctx.reset(&DARK_OS), ThemeMode::Dark);
        assert!(!ctx.has_override());
        assert_eq!(ctx.store().load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_change_follows_notifications() {
        let (tx, rx) = watch::channel(ThemeMode::Light);
        let mut ctx = ThemeContext::init(MemoryThemeStore::default(), &NO_OS);
        ctx.subscribe(rx);

        tx.send(ThemeMode::Dark).unwrap();
        assert_eq!(ctx.next_change().await, Some(ThemeMode::Dark));

        drop(tx);
        assert_eq!(ctx.next_change().await, None);
        assert!(!ctx.is_subscribed());
    }
}
