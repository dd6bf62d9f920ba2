//! Mouse Module - Cursor, button and scroll state tracker.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::backend::NativeHandle;
use crate::callback::{CursorEnterEvent, CursorPositionEvent, MouseButtonEvent, ScrollEvent};

#[derive(Default)]
struct MouseState {
    position: (f64, f64),
    buttons: HashSet<i32>,
    inside: bool,
    scroll: (f64, f64),
    window: Option<NativeHandle>,
}

/// Process-wide mouse state, updated from window callbacks.
#[derive(Default)]
pub struct Mouse {
    state: RwLock<MouseState>,
}

impl Mouse {
    pub const LEFT: i32 = 0;
    pub const RIGHT: i32 = 1;
    pub const MIDDLE: i32 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_button(&self, event: &MouseButtonEvent) {
        let mut state = self.state.write();
        if event.action.is_down() {
            state.buttons.insert(event.button);
        } else {
            state.buttons.remove(&event.button);
        }
        state.window = Some(event.window);
    }

    pub fn handle_cursor(&self, event: &CursorPositionEvent) {
        let mut state = self.state.write();
        state.position = (event.x, event.y);
        state.window = Some(event.window);
    }

    pub fn handle_enter(&self, event: &CursorEnterEvent) {
        let mut state = self.state.write();
        state.inside = event.entered;
        state.window = Some(event.window);
    }

    pub fn handle_scroll(&self, event: &ScrollEvent) {
        let mut state = self.state.write();
        state.scroll.0 += event.x_offset;
        state.scroll.1 += event.y_offset;
        state.window = Some(event.window);
    }

    /// Last cursor position in window coordinates.
    pub fn position(&self) -> (f64, f64) {
        self.state.read().position
    }

    pub fn is_pressed(&self, button: i32) -> bool {
        self.state.read().buttons.contains(&button)
    }

    /// Whether the cursor is inside the window it last entered.
    pub fn is_inside(&self) -> bool {
        self.state.read().inside
    }

    /// Window of the last mouse event.
    pub fn window(&self) -> Option<NativeHandle> {
        self.state.read().window
    }

    /// Take the scroll offsets accumulated since the last call.
    pub fn take_scroll(&self) -> (f64, f64) {
        std::mem::take(&mut self.state.write().scroll)
    }

    pub fn reset(&self) {
        *self.state.write() = MouseState::default();
    }
}
