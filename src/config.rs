//! Toolkit options.
//!
//! One `Options` value is owned by a [`Toolkit`](crate::Toolkit) and cloned
//! into every window it creates, so changing options after a window exists
//! only affects windows created later.

/// Toolkit-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Maximum number of window threads alive at the same time.
    pub max_window_threads: usize,
    /// Keep running the renderer pipeline while a window is iconified.
    pub render_while_iconified: bool,
    /// Install the background renderer while building a window.
    pub default_renderers: bool,
    /// Initial vsync state of new windows.
    pub vsync: bool,
    /// Whether new windows are created resizable.
    pub resizable: bool,
    /// Requested graphics context version (major, minor).
    pub context_version: (u8, u8),
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_window_threads: 5,
            render_while_iconified: false,
            default_renderers: true,
            vsync: false,
            resizable: true,
            context_version: (4, 6),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_window_threads(mut self, max: usize) -> Self {
        self.max_window_threads = max;
        self
    }

    pub fn with_render_while_iconified(mut self, enabled: bool) -> Self {
        self.render_while_iconified = enabled;
        self
    }

    pub fn with_default_renderers(mut self, enabled: bool) -> Self {
        self.default_renderers = enabled;
        self
    }

    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.vsync = enabled;
        self
    }

    pub fn with_resizable(mut self, enabled: bool) -> Self {
        self.resizable = enabled;
        self
    }

    pub fn with_context_version(mut self, major: u8, minor: u8) -> Self {
        self.context_version = (major, minor);
        self
    }
}
