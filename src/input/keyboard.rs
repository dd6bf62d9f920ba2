//! Keyboard Module - Key codes, modifiers and the keyboard state tracker.
//!
//! The tracker is fed by every window's key and char callbacks and answers
//! "is this key down right now" style questions from any thread.
//!
//! # API
//!
//! - `is_pressed(key)` - Whether a key is currently held
//! - `modifiers()` - Modifiers of the last key event
//! - `last_event()` - Last key event seen
//! - `take_text()` - Drain characters typed since the last call

use std::collections::HashSet;

use bitflags::bitflags;
use parking_lot::RwLock;

use crate::callback::{CharEvent, CharModsEvent, KeyEvent};

// =============================================================================
// TYPES
// =============================================================================

bitflags! {
    /// Modifier keys held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0x01;
        const CONTROL = 0x02;
        const ALT = 0x04;
        const SUPER = 0x08;
        const CAPS_LOCK = 0x10;
        const NUM_LOCK = 0x20;
    }
}

/// Key and button transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    Release,
    #[default]
    Press,
    Repeat,
}

impl Action {
    /// Whether the key or button is held after this transition.
    pub fn is_down(self) -> bool {
        !matches!(self, Action::Release)
    }
}

/// Key codes delivered in [`KeyEvent::key`]. Printable keys use their
/// uppercase ASCII value.
pub mod keys {
    pub const UNKNOWN: i32 = -1;
    pub const SPACE: i32 = 32;
    pub const APOSTROPHE: i32 = 39;
    pub const COMMA: i32 = 44;
    pub const MINUS: i32 = 45;
    pub const PERIOD: i32 = 46;
    pub const SLASH: i32 = 47;
    pub const NUM_0: i32 = 48;
    pub const NUM_9: i32 = 57;
    pub const SEMICOLON: i32 = 59;
    pub const EQUAL: i32 = 61;
    pub const A: i32 = 65;
    pub const C: i32 = 67;
    pub const Q: i32 = 81;
    pub const Z: i32 = 90;
    pub const ESCAPE: i32 = 256;
    pub const ENTER: i32 = 257;
    pub const TAB: i32 = 258;
    pub const BACKSPACE: i32 = 259;
    pub const INSERT: i32 = 260;
    pub const DELETE: i32 = 261;
    pub const RIGHT: i32 = 262;
    pub const LEFT: i32 = 263;
    pub const DOWN: i32 = 264;
    pub const UP: i32 = 265;
    pub const PAGE_UP: i32 = 266;
    pub const PAGE_DOWN: i32 = 267;
    pub const HOME: i32 = 268;
    pub const END: i32 = 269;
    pub const CAPS_LOCK: i32 = 280;
    pub const SCROLL_LOCK: i32 = 281;
    pub const NUM_LOCK: i32 = 282;
    pub const PRINT_SCREEN: i32 = 283;
    pub const PAUSE: i32 = 284;
    /// F1; F2..F25 follow consecutively.
    pub const F1: i32 = 290;
    pub const F25: i32 = 314;
    pub const MENU: i32 = 348;

    /// Key code of a printable character, or [`UNKNOWN`].
    pub fn from_char(c: char) -> i32 {
        match c {
            ' ' => SPACE,
            c if c.is_ascii_alphabetic() => c.to_ascii_uppercase() as i32,
            c if c.is_ascii_digit() => c as i32,
            '\'' | ',' | '-' | '.' | '/' | ';' | '=' | '[' | '\\' | ']' | '`' => c as i32,
            _ => UNKNOWN,
        }
    }

    /// Key code of function key `n` (1-based), or [`UNKNOWN`].
    pub fn function(n: u8) -> i32 {
        match n {
            1..=25 => F1 + i32::from(n) - 1,
            _ => UNKNOWN,
        }
    }
}

// =============================================================================
// KEYBOARD TRACKER
// =============================================================================

#[derive(Default)]
struct KeyboardState {
    pressed: HashSet<i32>,
    modifiers: Modifiers,
    last_event: Option<KeyEvent>,
    text: String,
}

/// Process-wide keyboard state, updated from window callbacks.
#[derive(Default)]
pub struct Keyboard {
    state: RwLock<KeyboardState>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition.
    pub fn handle_key(&self, event: &KeyEvent) {
        let mut state = self.state.write();
        if event.key != keys::UNKNOWN {
            if event.action.is_down() {
                state.pressed.insert(event.key);
            } else {
                state.pressed.remove(&event.key);
            }
        }
        state.modifiers = event.modifiers;
        state.last_event = Some(*event);
    }

    /// Append a typed character to the text buffer.
    pub fn handle_char(&self, event: &CharEvent) {
        self.state.write().text.push(event.codepoint);
    }

    /// Track modifiers of a typed character. The character itself arrives
    /// through the plain char callback as well.
    pub fn handle_char_mods(&self, event: &CharModsEvent) {
        self.state.write().modifiers = event.modifiers;
    }

    pub fn is_pressed(&self, key: i32) -> bool {
        self.state.read().pressed.contains(&key)
    }

    /// Currently held keys, sorted.
    pub fn pressed_keys(&self) -> Vec<i32> {
        let mut keys: Vec<i32> = self.state.read().pressed.iter().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn modifiers(&self) -> Modifiers {
        self.state.read().modifiers
    }

    pub fn last_event(&self) -> Option<KeyEvent> {
        self.state.read().last_event
    }

    /// Last key code seen, if any.
    pub fn last_key(&self) -> Option<i32> {
        self.state.read().last_event.map(|event| event.key)
    }

    /// Take the characters typed since the last call.
    pub fn take_text(&self) -> String {
        std::mem::take(&mut self.state.write().text)
    }

    /// Forget everything. Used when a window loses focus.
    pub fn reset(&self) {
        *self.state.write() = KeyboardState::default();
    }
}

// =============================================================================
// TESTS
// =============================================================================
