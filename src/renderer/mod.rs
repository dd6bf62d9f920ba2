//! Renderer Pipeline - Per-window renderers fed by a flattened component queue.
//!
//! Each frame the window thread:
//!
//! 1. Rebuilds its [`RenderQueue`]: walk the window's root components
//!    depth-first, first occurrence of a name wins, attaching the window to
//!    every queued node.
//! 2. Runs `update()` on every queued layout node.
//! 3. Locks its [`RenderPipeline`] and hands the queue to every renderer in
//!    registration order, initializing (and binding) a renderer the first
//!    time it is used.
//!
//! Steps 1 and 2 run without the renderer list locked, so attach listeners
//! and layouts may use any method of their window.
//!
//! Renderers implement [`Renderer`] and keep their bookkeeping in a
//! [`RendererState`].

mod background;
mod pipeline;
mod queue;

pub use background::BackgroundRenderer;
pub use pipeline::{FrameReport, RenderPipeline};
pub use queue::RenderQueue;

use std::fmt;
use std::sync::Arc;

use crate::backend::Surface;
use crate::component::ComponentRef;
use crate::engine::NameRegistry;
use crate::toolkit::Toolkit;
use crate::window::{WeakWindow, Window};

// =============================================================================
// Priority
// =============================================================================

/// Renderer priority. Informational; dispatch follows registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RenderPriority {
    Lowest,
    Low,
    Medium,
    #[default]
    Moderate,
    High,
    Highest,
}

impl RenderPriority {
    pub const fn rate(self) -> u8 {
        match self {
            RenderPriority::Lowest => 0,
            RenderPriority::Low => 1,
            RenderPriority::Medium => 2,
            RenderPriority::Moderate => 3,
            RenderPriority::High => 4,
            RenderPriority::Highest => 5,
        }
    }
}

// =============================================================================
// Renderer State
// =============================================================================

/// Shared bookkeeping of a renderer.
///
/// Claims a unique name on creation and releases it on drop.
pub struct RendererState {
    name: String,
    priority: RenderPriority,
    initialized: bool,
    needs_patch: bool,
    window: Option<WeakWindow>,
    names: Option<Arc<NameRegistry>>,
}

impl RendererState {
    /// Claim a name for `requested` in the toolkit's renderer names.
    pub fn new(toolkit: &Toolkit, requested: &str) -> Self {
        Self::with_registry(toolkit.renderer_names(), requested)
    }

    /// Claim a name for `requested` in `names`.
    pub fn with_registry(names: &Arc<NameRegistry>, requested: &str) -> Self {
        Self {
            name: names.claim(requested),
            priority: RenderPriority::default(),
            initialized: false,
            needs_patch: false,
            window: None,
            names: Some(names.clone()),
        }
    }

    /// A state whose name is not checked against any registry.
    pub fn unregistered(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: RenderPriority::default(),
            initialized: false,
            needs_patch: false,
            window: None,
            names: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> RenderPriority {
        self.priority
    }

    /// Change the priority. Marks the renderer as needing a patch.
    pub fn set_priority(&mut self, priority: RenderPriority) {
        if self.priority != priority {
            self.priority = priority;
            self.needs_patch = true;
        }
    }

    pub fn needs_patch(&self) -> bool {
        self.needs_patch
    }

    pub fn clear_patch(&mut self) {
        self.needs_patch = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// The window this renderer is bound to, if bound and alive.
    pub fn window(&self) -> Option<Window> {
        self.window.as_ref().and_then(WeakWindow::upgrade)
    }

    pub fn is_bound(&self) -> bool {
        self.window.is_some()
    }

    /// Bind the owning window. Only the first call has an effect.
    pub(crate) fn bind(&mut self, window: &Window) -> bool {
        if self.window.is_some() {
            return false;
        }
        self.window = Some(window.downgrade());
        true
    }
}

impl Drop for RendererState {
    fn drop(&mut self) {
        if let Some(names) = &self.names {
            names.release(&self.name);
        }
    }
}

impl fmt::Debug for RendererState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererState")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("initialized", &self.initialized)
            .field("needs_patch", &self.needs_patch)
            .field("bound", &self.window.is_some())
            .finish()
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Everything a renderer gets for one frame.
pub struct Frame<'a> {
    window: &'a Window,
    queue: &'a [ComponentRef],
    surface: &'a mut dyn Surface,
    number: u64,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(
        window: &'a Window,
        queue: &'a [ComponentRef],
        surface: &'a mut dyn Surface,
        number: u64,
    ) -> Self {
        Self { window, queue, surface, number }
    }

    pub fn window(&self) -> &Window {
        self.window
    }

    /// Deduplicated, depth-first component queue.
    pub fn queue(&self) -> &[ComponentRef] {
        self.queue
    }

    pub fn surface(&mut self) -> &mut (dyn Surface + 'a) {
        &mut *self.surface
    }

    /// Frame counter of the window, starting at 0.
    pub fn number(&self) -> u64 {
        self.number
    }
}

/// A per-frame consumer of the render queue.
///
/// `initialize`, `load` and `render` run on the window thread while the
/// window's renderer list is locked; they must not call the renderer
/// methods of their own window.
pub trait Renderer: Send {
    fn state(&self) -> &RendererState;

    fn state_mut(&mut self) -> &mut RendererState;

    fn name(&self) -> &str {
        self.state().name()
    }

    /// Called once, on the window thread, before the first `load`.
    fn initialize(&mut self) {}

    /// Called once, when the renderer is bound to its window.
    fn load(&mut self, _window: &Window) {}

    /// Draw one frame.
    fn render(&mut self, frame: &mut Frame<'_>);

    /// Release resources. Called when the renderer is removed.
    fn dispose(&mut self) {}
}
