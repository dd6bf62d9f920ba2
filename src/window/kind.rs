//! Window kinds: the lifecycle and event hooks of a window type.
//!
//! A kind is shared between a window's thread and its callback subscribers,
//! so every hook takes `&self`; kinds that keep state use interior
//! mutability. All hooks default to no-ops.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error};
use parking_lot::RwLock;

use crate::callback::{
    CharEvent, CharModsEvent, CloseEvent, CursorEnterEvent, CursorPositionEvent, FocusEvent,
    FramebufferSizeEvent, IconifyEvent, KeyEvent, MaximizeEvent, MouseButtonEvent, PositionEvent,
    RefreshEvent, ScrollEvent, SizeEvent,
};

use super::Window;

/// Hooks of a window type.
pub trait WindowKind: Send + Sync {
    /// Type tag the kind is registered under.
    fn tag(&self) -> &str {
        StandardWindow::TAG
    }

    /// After the native window is built, before the first frame.
    fn initialize(&self, _window: &Window) {}

    /// Once per loop iteration, before rendering.
    fn update(&self, _window: &Window) {}

    /// After the loop exits, before native resources are released.
    fn destroy(&self, _window: &Window) {}

    fn on_size(&self, _window: &Window, _event: &SizeEvent) {}
    fn on_position(&self, _window: &Window, _event: &PositionEvent) {}
    fn on_close(&self, _window: &Window, _event: &CloseEvent) {}
    fn on_refresh(&self, _window: &Window, _event: &RefreshEvent) {}
    fn on_focus(&self, _window: &Window, _event: &FocusEvent) {}
    fn on_iconify(&self, _window: &Window, _event: &IconifyEvent) {}
    fn on_maximize(&self, _window: &Window, _event: &MaximizeEvent) {}
    fn on_framebuffer_size(&self, _window: &Window, _event: &FramebufferSizeEvent) {}
    fn on_key(&self, _window: &Window, _event: &KeyEvent) {}
    fn on_char(&self, _window: &Window, _event: &CharEvent) {}
    fn on_char_mods(&self, _window: &Window, _event: &CharModsEvent) {}
    fn on_mouse_button(&self, _window: &Window, _event: &MouseButtonEvent) {}
    fn on_cursor_position(&self, _window: &Window, _event: &CursorPositionEvent) {}
    fn on_cursor_enter(&self, _window: &Window, _event: &CursorEnterEvent) {}
    fn on_scroll(&self, _window: &Window, _event: &ScrollEvent) {}
}

/// The built-in window type. Does nothing beyond the window's own hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardWindow;

impl StandardWindow {
    pub const TAG: &'static str = "Window";
}

impl WindowKind for StandardWindow {}

// =============================================================================
// Window Types
// =============================================================================

/// Builds a fresh kind for each new window.
pub type WindowFactory = Arc<dyn Fn() -> Arc<dyn WindowKind> + Send + Sync>;

/// Window kind factories by type tag.
pub struct WindowTypes {
    factories: RwLock<HashMap<String, WindowFactory>>,
}

impl Default for WindowTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowTypes {
    /// Registry holding only [`StandardWindow`].
    pub fn new() -> Self {
        let types = Self {
            factories: RwLock::new(HashMap::new()),
        };
        types.register(StandardWindow::TAG, || Arc::new(StandardWindow));
        types
    }

    /// Register (or replace) the factory for `tag`.
    pub fn register<F>(&self, tag: &str, factory: F)
    where
        F: Fn() -> Arc<dyn WindowKind> + Send + Sync + 'static,
    {
        if self.factories.write().insert(tag.to_string(), Arc::new(factory)).is_some() {
            debug!("Replaced window type `{tag}`");
        } else {
            debug!("Registered window type `{tag}`");
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.read().contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.factories.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Build a kind for `tag`. Unknown tags fall back to [`StandardWindow`].
    pub fn build(&self, tag: &str) -> Arc<dyn WindowKind> {
        let factory = self.factories.read().get(tag).cloned();
        match factory {
            Some(factory) => factory(),
            None => {
                error!("There is no window type `{tag}`, using `{}`", StandardWindow::TAG);
                Arc::new(StandardWindow)
            }
        }
    }
}
