//! Native event types and the per-window set of multiplexers.
//!
//! Every native event signature has one payload struct and one
//! [`Callback`] slot in [`WindowCallbacks`]. Backends turn their own events
//! into [`NativeEvent`]s and hand them to [`WindowCallbacks::dispatch`].

use std::sync::Arc;

use crate::backend::NativeHandle;
use crate::input::{Action, Modifiers};

use super::Callback;

// =============================================================================
// Event Payloads
// =============================================================================

/// Window content area resized (screen coordinates).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeEvent {
    pub window: NativeHandle,
    pub width: i32,
    pub height: i32,
}

/// Window moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionEvent {
    pub window: NativeHandle,
    pub x: i32,
    pub y: i32,
}

/// The user asked to close the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloseEvent {
    pub window: NativeHandle,
}

/// Window contents need redrawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshEvent {
    pub window: NativeHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusEvent {
    pub window: NativeHandle,
    pub focused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconifyEvent {
    pub window: NativeHandle,
    pub iconified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaximizeEvent {
    pub window: NativeHandle,
    pub maximized: bool,
}

/// Framebuffer resized (pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramebufferSizeEvent {
    pub window: NativeHandle,
    pub width: i32,
    pub height: i32,
}

/// Physical key pressed, repeated or released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEvent {
    pub window: NativeHandle,
    /// Key code, see [`crate::input::keys`].
    pub key: i32,
    /// Platform scancode, 0 when unknown.
    pub scancode: i32,
    pub action: Action,
    pub modifiers: Modifiers,
}

/// Unicode character typed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharEvent {
    pub window: NativeHandle,
    pub codepoint: char,
}

/// Unicode character typed, with the modifiers held at the time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharModsEvent {
    pub window: NativeHandle,
    pub codepoint: char,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseButtonEvent {
    pub window: NativeHandle,
    /// Button index, see [`crate::input::Mouse`].
    pub button: i32,
    pub action: Action,
    pub modifiers: Modifiers,
}

/// Cursor moved, relative to the top-left corner of the content area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPositionEvent {
    pub window: NativeHandle,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorEnterEvent {
    pub window: NativeHandle,
    pub entered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub window: NativeHandle,
    pub x_offset: f64,
    pub y_offset: f64,
}

// =============================================================================
// Window Callbacks
// =============================================================================

macro_rules! window_callbacks {
    ($($field:ident: $event:ident => $variant:ident,)*) => {
        /// Any native event, as produced by a backend.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum NativeEvent {
            $($variant($event),)*
        }

        impl NativeEvent {
            /// The window the event belongs to.
            pub fn window(&self) -> NativeHandle {
                match self {
                    $(NativeEvent::$variant(event) => event.window,)*
                }
            }
        }

        $(
            impl From<$event> for NativeEvent {
                fn from(event: $event) -> Self {
                    NativeEvent::$variant(event)
                }
            }
        )*

        /// One multiplexer per native event type of a window.
        #[derive(Debug)]
        pub struct WindowCallbacks {
            $(pub $field: Callback<$event>,)*
        }

        impl WindowCallbacks {
            pub fn new() -> Self {
                Self {
                    $($field: Callback::new(stringify!($field)),)*
                }
            }

            /// Invoke the multiplexer matching `event`.
            pub fn dispatch(&self, event: &NativeEvent) {
                match event {
                    $(NativeEvent::$variant(event) => {
                        self.$field.invoke(event);
                    })*
                }
            }

            /// Subscribe a forwarder into `target` on every slot.
            pub fn chain(&self, target: &Arc<WindowCallbacks>) {
                $(
                    let next = target.clone();
                    self.$field.add(move |event| {
                        next.$field.invoke(event);
                    });
                )*
            }

            /// Total number of subscribers across every slot.
            pub fn subscriber_count(&self) -> usize {
                0 $(+ self.$field.len())*
            }

            pub fn clear(&self) {
                $(self.$field.clear();)*
            }
        }
    };
}

window_callbacks! {
    size: SizeEvent => Size,
    position: PositionEvent => Position,
    close: CloseEvent => Close,
    refresh: RefreshEvent => Refresh,
    focus: FocusEvent => Focus,
    iconify: IconifyEvent => Iconify,
    maximize: MaximizeEvent => Maximize,
    framebuffer_size: FramebufferSizeEvent => FramebufferSize,
    key: KeyEvent => Key,
    char: CharEvent => Char,
    char_mods: CharModsEvent => CharMods,
    mouse_button: MouseButtonEvent => MouseButton,
    cursor_position: CursorPositionEvent => CursorPosition,
    cursor_enter: CursorEnterEvent => CursorEnter,
    scroll: ScrollEvent => Scroll,
}

impl Default for WindowCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn handle() -> NativeHandle {
        NativeHandle::new(1).unwrap()
    }

    #[test]
    fn test_dispatch_routes_by_event_type() {
        let callbacks = WindowCallbacks::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_size = seen.clone();
        callbacks.size.add(move |e| seen_size.lock().push(format!("size {}x{}", e.width, e.height)));
        let seen_close = seen.clone();
        callbacks.close.add(move |_| seen_close.lock().push("close".to_string()));

        callbacks.dispatch(&SizeEvent { window: handle(), width: 3, height: 4 }.into());
        callbacks.dispatch(&NativeEvent::Close(CloseEvent { window: handle() }));
        callbacks.dispatch(&NativeEvent::Refresh(RefreshEvent { window: handle() }));

        assert_eq!(*seen.lock(), vec!["size 3x4", "close"]);
    }

    #[test]
    fn test_chain_forwards_first() {
        let native = Arc::new(WindowCallbacks::new());
        let window = WindowCallbacks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_native = order.clone();
        native.scroll.add(move |_| order_native.lock().push("native"));
        window.chain(&native);
        let order_window = order.clone();
        window.scroll.add(move |_| order_window.lock().push("window"));

        window.dispatch(&NativeEvent::Scroll(ScrollEvent {
            window: handle(),
            x_offset: 0.0,
            y_offset: 1.0,
        }));

        assert_eq!(*order.lock(), vec!["native", "window"]);
        assert_eq!(window.subscriber_count(), 15 + 1);
    }

    #[test]
    fn test_event_window_accessor() {
        let event: NativeEvent = CursorEnterEvent { window: handle(), entered: true }.into();
        assert_eq!(event.window(), handle());
    }
}
