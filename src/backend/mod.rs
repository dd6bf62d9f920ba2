//! Native Backend - The windowing, input and drawing service a toolkit drives.
//!
//! The toolkit never talks to an OS window system directly. It is handed a
//! [`NativeBackend`] and calls into it from each window's own thread:
//!
//! ```text
//! window thread                      backend
//! ─────────────                      ───────
//! build    ── create_window ───────▶ NativeHandle
//!          ── install_callbacks ───▶ previous callbacks (forwarded first)
//!          ── create_surface ──────▶ Box<dyn Surface>
//! loop     ── poll_events ─────────▶ dispatches NativeEvents into callbacks
//!          ── Surface::*  ─────────▶ draw the frame
//!          ── swap_buffers ────────▶ present
//! destroy  ── destroy_window
//! ```
//!
//! Every window call except [`NativeBackend::set_should_close`] and the
//! attribute/size reads is made from the thread that created the window.
//! Implementations must still be `Send + Sync` because the reads and the
//! close flag are touched from arbitrary threads.

mod recording;
mod terminal;

pub use recording::{DrawCommand, RecordingBackend};
pub use terminal::TerminalBackend;

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use crate::callback::WindowCallbacks;
use crate::types::{Rect, Rgba};

// =============================================================================
// Handles and Hints
// =============================================================================

/// Opaque native window handle. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(NonZeroU64);

impl NativeHandle {
    /// Wrap a raw handle value. Zero is the null handle and yields `None`.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Creation parameters handed to [`NativeBackend::create_window`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHints {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub resizable: bool,
    pub visible: bool,
    pub context_version: (u8, u8),
}

/// Boolean window attributes a backend can query and change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowAttribute {
    Visible,
    Maximized,
    Iconified,
    Focused,
    AlwaysOnTop,
    Resizable,
}

/// Description of the graphics context behind a surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub renderer: String,
    pub vendor: String,
    pub version: String,
}

// =============================================================================
// Surface
// =============================================================================

/// Drawing surface bound to one native window.
///
/// Owned by the window thread. A frame is `begin_frame`, any number of
/// draw calls, then `end_frame`; the backend's `swap_buffers` presents it.
pub trait Surface: Send {
    fn info(&self) -> SurfaceInfo;

    /// Start a frame of the given size in window pixels.
    fn begin_frame(&mut self, width: i32, height: i32);

    /// Fill the whole frame with `color`.
    fn clear(&mut self, color: Rgba);

    /// Fill `rect` with `color`, rounding corners by `radius` pixels.
    fn fill_rect(&mut self, rect: Rect, color: Rgba, radius: f32);

    fn end_frame(&mut self);
}

// =============================================================================
// Backend
// =============================================================================

/// The native windowing service.
pub trait NativeBackend: Send + Sync {
    /// Short backend name, used in log lines.
    fn name(&self) -> &str;

    /// Create a native window. `None` is the null handle.
    fn create_window(&self, hints: &WindowHints) -> Option<NativeHandle>;

    fn destroy_window(&self, handle: NativeHandle);

    /// Bind the window's graphics context to the calling thread.
    fn make_context_current(&self, _handle: NativeHandle) {}

    /// Create the drawing surface of a window. `None` means no context.
    fn create_surface(&self, handle: NativeHandle) -> Option<Box<dyn Surface>>;

    /// Route the window's native events into `callbacks`.
    ///
    /// Returns the callbacks that were installed before, which the window
    /// forwards to ahead of its own subscribers.
    fn install_callbacks(
        &self,
        handle: NativeHandle,
        callbacks: Arc<WindowCallbacks>,
    ) -> Option<Arc<WindowCallbacks>>;

    /// Deliver pending events of `handle` into its installed callbacks.
    ///
    /// May block for a bounded time (vsync, input timeout); this is the
    /// only pacing of a window loop.
    fn poll_events(&self, handle: NativeHandle);

    fn swap_buffers(&self, handle: NativeHandle);

    fn set_swap_interval(&self, handle: NativeHandle, interval: i32);

    /// Read the native close flag. Callable from any thread.
    fn should_close(&self, handle: NativeHandle) -> bool;

    /// Set the native close flag. Callable from any thread.
    fn set_should_close(&self, handle: NativeHandle, value: bool);

    /// Read a boolean attribute. Callable from any thread.
    fn attribute(&self, handle: NativeHandle, attribute: WindowAttribute) -> bool;

    fn set_attribute(&self, handle: NativeHandle, attribute: WindowAttribute, value: bool);

    /// Leave the iconified or maximized state.
    fn restore(&self, handle: NativeHandle);

    fn set_title(&self, handle: NativeHandle, title: &str);

    fn set_size(&self, handle: NativeHandle, width: i32, height: i32);

    /// Framebuffer size in pixels. Callable from any thread.
    fn size(&self, handle: NativeHandle) -> (i32, i32);
}

impl fmt::Debug for dyn NativeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBackend").field("name", &self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_handle_is_never_null() {
        assert!(NativeHandle::new(0).is_none());
        let handle = NativeHandle::new(7).unwrap();
        assert_eq!(handle.get(), 7);
        assert_eq!(handle.to_string(), "#7");
    }
}
