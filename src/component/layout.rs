//! Layout behaviors.
//!
//! Layout nodes are ordinary components carrying a [`Layout`]. The render
//! pipeline calls [`Component::update`] on every queued layout each frame.
//! Layouts only move their direct, in-flow children; they never resize
//! themselves or their children.

use super::{Component, ComponentProps, ComponentRef, ComponentRegistry};

/// Positioning logic of a layout node.
pub trait Layout: Send + Sync {
    /// Whether the bounds clamp runs before [`logic`](Self::logic).
    fn use_default_logic(&self) -> bool {
        true
    }

    /// Layout-specific positioning of `node`'s children.
    fn logic(&self, _node: &Component) {}
}

/// Keep in-flow children inside the node's bounds.
///
/// A child whose right edge passes the node's width is moved left so that
/// `x + width == node width` (never past 0); the same for y and height.
pub fn clamp_children(node: &Component) {
    let (width, height) = (node.width(), node.height());
    for child in node.children() {
        if child.style().position.is_out_of_flow() {
            continue;
        }
        let bounds = child.bounds();
        let mut x = bounds.x;
        let mut y = bounds.y;
        if x + bounds.width > width {
            x = (width - bounds.width).max(0);
        }
        if y + bounds.height > height {
            y = (height - bounds.height).max(0);
        }
        if (x, y) != (bounds.x, bounds.y) {
            child.set_position(x, y);
        }
    }
}

// =============================================================================
// Pane
// =============================================================================

/// Plain container: bounds clamping only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pane;

impl Layout for Pane {}

/// Create a 200x200 pane.
pub fn pane(registry: &ComponentRegistry, id: Option<&str>) -> ComponentRef {
    let mut props = ComponentProps::new("Pane").size(200, 200).layout(Pane);
    props.id = id.map(str::to_string);
    Component::create(registry, props)
}

// =============================================================================
// Flow Pane
// =============================================================================

/// Places in-flow children left to right, wrapping into rows.
///
/// Respects the node's padding and each child's margin. `gap` separates
/// children on a row and rows from each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowPane {
    pub gap: i32,
}

impl Layout for FlowPane {
    fn use_default_logic(&self) -> bool {
        false
    }

    fn logic(&self, node: &Component) {
        let padding = node.style().padding;
        let start_x = padding.left;
        let limit_x = node.width() - padding.right;

        let mut cursor_x = start_x;
        let mut cursor_y = padding.top;
        let mut row_height = 0;

        for child in node.children() {
            let style = child.style();
            if style.position.is_out_of_flow() {
                continue;
            }
            let margin = style.margin;
            let outer_width = margin.horizontal() + child.width();
            let outer_height = margin.vertical() + child.height();

            if cursor_x > start_x && cursor_x + outer_width > limit_x {
                cursor_x = start_x;
                cursor_y += row_height + self.gap;
                row_height = 0;
            }

            child.set_position(cursor_x + margin.left, cursor_y + margin.top);
            cursor_x += outer_width + self.gap;
            row_height = row_height.max(outer_height);
        }

        clamp_children(node);
    }
}

/// Create a 200x200 flow pane.
pub fn flow_pane(registry: &ComponentRegistry, id: Option<&str>, gap: i32) -> ComponentRef {
    let mut props = ComponentProps::new("FlowPane")
        .size(200, 200)
        .layout(FlowPane { gap: gap.max(0) });
    props.id = id.map(str::to_string);
    Component::create(registry, props)
}

// =============================================================================
// Tests
// =============================================================================
