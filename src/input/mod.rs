//! Input state shared by every window of a toolkit.
//!
//! - [`Keyboard`]: held keys, modifiers, typed text
//! - [`Mouse`]: cursor position, held buttons, scroll
//!
//! Each window subscribes the trackers to its callbacks during build, after
//! the native forwarder and the window's own hooks.

mod keyboard;
mod mouse;

pub use keyboard::{Action, Keyboard, Modifiers, keys};
pub use mouse::Mouse;

use std::sync::Arc;

use crate::callback::WindowCallbacks;

/// Keyboard and mouse trackers.
#[derive(Default)]
pub struct InputState {
    pub keyboard: Keyboard,
    pub mouse: Mouse,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe both trackers to the input slots of `callbacks`.
    pub fn attach(self: &Arc<Self>, callbacks: &WindowCallbacks) {
        let input = self.clone();
        callbacks.key.add(move |event| input.keyboard.handle_key(event));
        let input = self.clone();
        callbacks.char.add(move |event| input.keyboard.handle_char(event));
        let input = self.clone();
        callbacks.char_mods.add(move |event| input.keyboard.handle_char_mods(event));
        let input = self.clone();
        callbacks.mouse_button.add(move |event| input.mouse.handle_button(event));
        let input = self.clone();
        callbacks.cursor_position.add(move |event| input.mouse.handle_cursor(event));
        let input = self.clone();
        callbacks.cursor_enter.add(move |event| input.mouse.handle_enter(event));
        let input = self.clone();
        callbacks.scroll.add(move |event| input.mouse.handle_scroll(event));
    }

    pub fn reset(&self) {
        self.keyboard.reset();
        self.mouse.reset();
    }
}
