//! Component style values.

use crate::types::{Insets, Rgba};

/// How a component takes part in its parent's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PositionMode {
    #[default]
    Relative,
    Absolute,
    Fixed,
    Static,
}

impl PositionMode {
    /// Absolute and fixed nodes are never moved by a layout.
    pub fn is_out_of_flow(self) -> bool {
        matches!(self, PositionMode::Absolute | PositionMode::Fixed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background {
    pub color: Rgba,
    /// Corner radius in pixels.
    pub radius: f32,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: Rgba::AQUA,
            radius: 0.0,
        }
    }
}

/// Visual properties of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub z_index: i32,
    pub background: Background,
    pub foreground: Rgba,
    pub padding: Insets,
    pub margin: Insets,
    pub position: PositionMode,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            z_index: 0,
            background: Background::default(),
            foreground: Rgba::BLACK,
            padding: Insets::ZERO,
            margin: Insets::ZERO,
            position: PositionMode::Relative,
        }
    }
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_background(mut self, color: Rgba) -> Self {
        self.background.color = color;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.background.radius = radius.max(0.0);
        self
    }

    pub fn with_foreground(mut self, color: Rgba) -> Self {
        self.foreground = color;
        self
    }

    pub fn with_padding(mut self, padding: Insets) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_margin(mut self, margin: Insets) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_position(mut self, position: PositionMode) -> Self {
        self.position = position;
        self
    }
}
