//! Background renderer: fills each queued component's background.

use crate::toolkit::Toolkit;

use super::{Frame, Renderer, RendererState};

/// Draws component backgrounds at their absolute bounds, lowest z-index
/// first. Ties keep queue order. Empty and transparent nodes are skipped.
#[derive(Debug)]
pub struct BackgroundRenderer {
    state: RendererState,
}

impl BackgroundRenderer {
    pub const DEFAULT_NAME: &'static str = "BackgroundRenderer";

    pub fn new(toolkit: &Toolkit) -> Self {
        Self::from_state(RendererState::new(toolkit, Self::DEFAULT_NAME))
    }

    pub fn from_state(state: RendererState) -> Self {
        Self { state }
    }
}

impl Renderer for BackgroundRenderer {
    fn state(&self) -> &RendererState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RendererState {
        &mut self.state
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let mut layers: Vec<_> = frame
            .queue()
            .iter()
            .map(|node| (node.style(), node.absolute_bounds()))
            .filter(|(style, bounds)| !bounds.is_empty() && !style.background.color.is_transparent())
            .collect();
        layers.sort_by_key(|(style, _)| style.z_index);

        let surface = frame.surface();
        for (style, bounds) in layers {
            surface.fill_rect(bounds, style.background.color, style.background.radius);
        }
    }
}
