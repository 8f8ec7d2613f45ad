//! Manage the site's default theme mode

use anyhow::Result;

use crate::theme::{stored_theme, ThemeMode};
use crate::Blog;

/// `quill theme` actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    Show,
    Set(ThemeMode),
    Toggle,
    Reset,
}

/// Apply an action and describe the outcome
pub fn run(blog: &Blog, action: ThemeAction) -> Result<String> {
    let system = blog.configured_theme();
    let mut context = blog.theme_context();

    let mode = match action {
        ThemeAction::Show => context.mode(),
        ThemeAction::Set(mode) => context.set_mode(mode),
        ThemeAction::Toggle => context.toggle(),
        ThemeAction::Reset => context.reset(&system),
    };

    let stored = context.is_persistent() && stored_theme(context.store()) == Some(mode);
    let source = if stored {
        format!("stored in {}", context.store().path().display())
    } else if context.has_override() {
        "not saved".to_string()
    } else if blog.config.theme.default.is_some() {
        "from _config.yml".to_string()
    } else {
        "default".to_string()
    };

    if action != ThemeAction::Show && !context.is_persistent() {
        tracing::warn!("Theme preference could not be saved; it applies to this run only");
    }
    context.teardown();

    Ok(format!("Theme: {} ({})", mode, source))
}
