//! Ordered renderer list of a window and the per-frame driver.

use log::{debug, warn};

use crate::backend::Surface;
use crate::window::Window;

use super::{Frame, RenderQueue, Renderer};

/// What happened during one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Number of queued components.
    pub queued: usize,
    /// Renderers initialized during this frame, in dispatch order.
    pub initialized: Vec<String>,
    /// Number of renderers that rendered.
    pub rendered: usize,
}

/// Renderers of one window, in registration order.
#[derive(Default)]
pub struct RenderPipeline {
    renderers: Vec<Box<dyn Renderer>>,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a renderer. Refused if one with the same name is present.
    pub fn add(&mut self, renderer: Box<dyn Renderer>) -> bool {
        if self.contains(renderer.name()) {
            warn!("There is already a renderer named `{}`", renderer.name());
            return false;
        }
        debug!("Added renderer `{}`", renderer.name());
        self.renderers.push(renderer);
        true
    }

    /// Dispose and remove the renderer named `name`. Warns if there is none.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(position) = self.renderers.iter().position(|r| r.name() == name) else {
            warn!("There is no renderer named `{}`", name);
            return false;
        };
        self.renderers[position].dispose();
        self.renderers.remove(position);
        debug!("Removed renderer `{}`", name);
        true
    }

    /// Dispose and remove every renderer, in registration order.
    pub fn remove_all(&mut self) {
        for mut renderer in self.renderers.drain(..) {
            renderer.dispose();
            debug!("Removed renderer `{}`", renderer.name());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.iter().any(|r| r.name() == name)
    }

    /// Renderer names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.renderers.iter().map(|r| r.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Hand an already built `queue` to every renderer, in registration
    /// order, drawing onto `surface`.
    pub fn run_frame(
        &mut self,
        window: &Window,
        queue: &RenderQueue,
        surface: &mut dyn Surface,
        number: u64,
    ) -> FrameReport {
        let mut report = FrameReport {
            queued: queue.len(),
            ..FrameReport::default()
        };

        let queue = queue.as_slice();
        for renderer in &mut self.renderers {
            if !renderer.state().is_initialized() {
                renderer.initialize();
                renderer.state_mut().mark_initialized();
                report.initialized.push(renderer.name().to_string());
            }
            if renderer.state_mut().bind(window) {
                renderer.load(window);
            }

            let mut frame = Frame::new(window, queue, &mut *surface, number);
            renderer.render(&mut frame);
            report.rendered += 1;
        }
        report
    }
}
