//! The construction context passed to every widget constructor.

use std::{fmt, rc::Rc};

use mdkit_ui::{Clock, Window};

use crate::theme::ThemeManager;

/// Theme, clock and (optionally) window shared by a widget tree.
///
/// Widgets keep the pieces they need; the context itself is cheap to clone.
///
/// ```
/// use mdkit_components::context::BuildContext;
///
/// let ctx = BuildContext::new();
/// let other = ctx.clone();
/// assert!(std::rc::Rc::ptr_eq(&ctx.theme, &other.theme));
/// ```
#[derive(Clone)]
pub struct BuildContext {
    /// Theme the widgets bind to.
    pub theme: Rc<ThemeManager>,
    /// Clock driving animations and timers.
    pub clock: Clock,
    /// Window for overlays (snackbars, menus, dialogs, tooltips).
    pub window: Option<Window>,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("theme", &self.theme)
            .field("time", &self.clock.time())
            .field("has_window", &self.window.is_some())
            .finish()
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildContext {
    /// Context with a default theme, a fresh clock and no window.
    pub fn new() -> Self {
        Self {
            theme: ThemeManager::new(),
            clock: Clock::new(),
            window: None,
        }
    }

    /// Context around an existing theme.
    pub fn with_theme(theme: Rc<ThemeManager>) -> Self {
        Self {
            theme,
            clock: Clock::new(),
            window: None,
        }
    }

    /// Builder-style window assignment.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// Builder-style clock assignment.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}
