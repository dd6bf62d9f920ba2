//! Window Actor - One thread, one native window, one component tree.
//!
//! A [`Window`] is a cheap, cloneable handle to state shared between the
//! window's own thread and any other thread:
//!
//! ```text
//! any thread                         window thread
//! ──────────                         ─────────────
//! Toolkit::create_window ──spawn──▶  build (native window, callbacks, surface)
//! window.size()  ◀──blocks on gate── gate.resolve(handle)
//!                                    kind.initialize
//! window.set_title(..) ──command──▶  loop { poll, apply commands, update,
//! window.add_component(..)                  render pipeline, swap }
//! window.close() ──close flag────▶   kind.destroy, dispose renderers,
//!                                    destroy native window
//! ```
//!
//! Single writer, many readers: only the window thread touches the native
//! window. Other threads read cached or backend state once the readiness
//! gate has resolved, and queue their changes to the window thread.

mod gate;
mod kind;
mod lifecycle;

pub use gate::{Readiness, ReadinessGate};
pub use kind::{StandardWindow, WindowFactory, WindowKind, WindowTypes};
pub use lifecycle::Lifecycle;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error, warn};
use parking_lot::{Mutex, RwLock};

use crate::backend::{NativeHandle, WindowAttribute};
use crate::callback::WindowCallbacks;
use crate::component::ComponentRef;
use crate::engine::Named;
use crate::error::{ErrorKind, Result, UiError};
use crate::renderer::{RenderPipeline, Renderer};
use crate::toolkit::{LifecycleEvent, Toolkit, WindowContext, WindowRequest};
use crate::types::Rgba;

// =============================================================================
// Commands
// =============================================================================

/// Native mutation queued to the window thread.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Title(String),
    Size(i32, i32),
    SwapInterval(i32),
    Attribute(WindowAttribute, bool),
    Restore,
}

// =============================================================================
// Shared State
// =============================================================================

pub(crate) struct WindowShared {
    name: String,
    kind: Arc<dyn WindowKind>,
    context: WindowContext,
    title: RwLock<String>,
    size: RwLock<(i32, i32)>,
    vsync: AtomicBool,
    background: RwLock<Rgba>,
    components: RwLock<Vec<ComponentRef>>,
    pipeline: Mutex<RenderPipeline>,
    queued: RwLock<Vec<String>>,
    callbacks: Arc<WindowCallbacks>,
    gate: ReadinessGate,
    /// True while the native window exists. The destroy phase clears it
    /// under the write lock before releasing the handle.
    native_alive: RwLock<bool>,
    lifecycle: RwLock<Lifecycle>,
    close_requested: AtomicBool,
    frames: AtomicU64,
    commands: Sender<Command>,
    pending: Receiver<Command>,
    thread: Mutex<Option<JoinHandle<()>>>,
    thread_id: OnceLock<ThreadId>,
}

/// Handle to a window.
#[derive(Clone)]
pub struct Window {
    shared: Arc<WindowShared>,
}

/// Non-owning handle to a window.
#[derive(Clone, Default)]
pub struct WeakWindow {
    shared: Weak<WindowShared>,
}

impl WeakWindow {
    pub fn upgrade(&self) -> Option<Window> {
        self.shared.upgrade().map(|shared| Window { shared })
    }

    /// Whether both point to the same window (or both to none).
    pub fn ptr_eq(&self, other: &WeakWindow) -> bool {
        Weak::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for WeakWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(window) => write!(f, "WeakWindow({})", window.name()),
            None => write!(f, "WeakWindow(<none>)"),
        }
    }
}

impl Named for Window {
    fn name(&self) -> &str {
        &self.shared.name
    }
}

// =============================================================================
// Construction
// =============================================================================

impl Window {
    pub(crate) fn new(
        name: String,
        request: &WindowRequest,
        kind: Arc<dyn WindowKind>,
        context: WindowContext,
    ) -> Self {
        let (commands, pending) = channel::unbounded();
        let title = request.title.clone().unwrap_or_else(|| name.clone());
        let vsync = context.options.vsync;

        Self {
            shared: Arc::new(WindowShared {
                name,
                kind,
                context,
                title: RwLock::new(title),
                size: RwLock::new((request.width.max(0), request.height.max(0))),
                vsync: AtomicBool::new(vsync),
                background: RwLock::new(Rgba::WHITE),
                components: RwLock::new(Vec::new()),
                pipeline: Mutex::new(RenderPipeline::new()),
                queued: RwLock::new(Vec::new()),
                callbacks: Arc::new(WindowCallbacks::new()),
                gate: ReadinessGate::new(),
                native_alive: RwLock::new(false),
                lifecycle: RwLock::new(Lifecycle::Constructed),
                close_requested: AtomicBool::new(false),
                frames: AtomicU64::new(0),
                commands,
                pending,
                thread: Mutex::new(None),
                thread_id: OnceLock::new(),
            }),
        }
    }

    /// Start the window thread, subject to the thread limit.
    pub(crate) fn start(&self) {
        lifecycle::start(self);
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Type tag of the window's kind.
    pub fn tag(&self) -> &str {
        self.shared.kind.tag()
    }

    pub fn kind(&self) -> Arc<dyn WindowKind> {
        self.shared.kind.clone()
    }

    pub fn downgrade(&self) -> WeakWindow {
        WeakWindow {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn ptr_eq(&self, other: &Window) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// The toolkit that created this window, if it is still alive.
    pub fn toolkit(&self) -> Option<Toolkit> {
        self.shared.context.toolkit()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.shared.lifecycle.read()
    }

    fn set_lifecycle(&self, lifecycle: Lifecycle) {
        *self.shared.lifecycle.write() = lifecycle;
    }

    /// Whether the calling thread is this window's thread.
    pub fn is_window_thread(&self) -> bool {
        self.shared.thread_id.get() == Some(&thread::current().id())
    }

    // -------------------------------------------------------------------------
    // Readiness
    // -------------------------------------------------------------------------

    /// Whether the build phase has finished, successfully or not.
    pub fn is_built(&self) -> bool {
        matches!(self.shared.gate.peek(), Readiness::Ready(_))
    }

    pub fn readiness(&self) -> Readiness {
        self.shared.gate.peek()
    }

    /// Block until the window is built.
    pub fn wait_until_built(&self) -> Result<()> {
        self.native_handle().map(|_| ())
    }

    /// Block until the window is built, at most `timeout`.
    pub fn wait_until_built_timeout(&self, timeout: Duration) -> Result<()> {
        match self.shared.gate.wait_timeout(timeout) {
            None => Err(UiError::Timeout(self.shared.name.clone())),
            Some(Err(kind)) => Err(self.gate_error(kind)),
            Some(Ok(_)) => self.ensure_alive(),
        }
    }

    /// The native handle. Blocks until the window is built.
    pub fn native_handle(&self) -> Result<NativeHandle> {
        let handle = self.shared.gate.wait().map_err(|kind| self.gate_error(kind))?;
        self.ensure_alive()?;
        Ok(handle)
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.lifecycle() == Lifecycle::Destroyed {
            return Err(UiError::Destroyed(self.shared.name.clone()));
        }
        Ok(())
    }

    fn gate_error(&self, kind: ErrorKind) -> UiError {
        match kind {
            ErrorKind::ThreadLimitReached => UiError::NotStarted(self.shared.name.clone()),
            kind => UiError::BuildFailed {
                window: self.shared.name.clone(),
                kind,
            },
        }
    }

    /// The window's callback multiplexers. Blocks until the window is built,
    /// so the native forwarder and internal subscribers come first.
    pub fn callbacks(&self) -> Result<Arc<WindowCallbacks>> {
        self.shared.gate.wait().map_err(|kind| self.gate_error(kind))?;
        Ok(self.shared.callbacks.clone())
    }

    // -------------------------------------------------------------------------
    // Native State
    // -------------------------------------------------------------------------

    pub fn title(&self) -> Result<String> {
        self.native_handle()?;
        Ok(self.shared.title.read().clone())
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        self.native_handle()?;
        *self.shared.title.write() = title.clone();
        self.submit(Command::Title(title))
    }

    /// Framebuffer size.
    pub fn size(&self) -> Result<(i32, i32)> {
        self.native_handle()?;
        Ok(*self.shared.size.read())
    }

    pub fn width(&self) -> Result<i32> {
        self.size().map(|(width, _)| width)
    }

    pub fn height(&self) -> Result<i32> {
        self.size().map(|(_, height)| height)
    }

    /// Resize the window. Negative values become 0.
    pub fn set_size(&self, width: i32, height: i32) -> Result<()> {
        let size = (width.max(0), height.max(0));
        self.native_handle()?;
        *self.shared.size.write() = size;
        self.submit(Command::Size(size.0, size.1))
    }

    pub fn set_width(&self, width: i32) -> Result<()> {
        let height = self.height()?;
        self.set_size(width, height)
    }

    pub fn set_height(&self, height: i32) -> Result<()> {
        let width = self.width()?;
        self.set_size(width, height)
    }

    pub fn vsync(&self) -> Result<bool> {
        self.native_handle()?;
        Ok(self.shared.vsync.load(Ordering::Acquire))
    }

    pub fn set_vsync(&self, enabled: bool) -> Result<()> {
        self.native_handle()?;
        self.shared.vsync.store(enabled, Ordering::Release);
        self.submit(Command::SwapInterval(i32::from(enabled)))
    }

    pub fn show(&self) -> Result<()> {
        self.submit(Command::Attribute(WindowAttribute::Visible, true))
    }

    pub fn hide(&self) -> Result<()> {
        self.submit(Command::Attribute(WindowAttribute::Visible, false))
    }

    pub fn maximize(&self) -> Result<()> {
        self.submit(Command::Attribute(WindowAttribute::Maximized, true))
    }

    pub fn iconify(&self) -> Result<()> {
        self.submit(Command::Attribute(WindowAttribute::Iconified, true))
    }

    /// Leave the iconified or maximized state.
    pub fn restore(&self) -> Result<()> {
        self.submit(Command::Restore)
    }

    pub fn focus(&self) -> Result<()> {
        self.submit(Command::Attribute(WindowAttribute::Focused, true))
    }

    pub fn set_always_on_top(&self, enabled: bool) -> Result<()> {
        self.submit(Command::Attribute(WindowAttribute::AlwaysOnTop, enabled))
    }

    pub fn set_resizable(&self, enabled: bool) -> Result<()> {
        self.submit(Command::Attribute(WindowAttribute::Resizable, enabled))
    }

    pub fn is_visible(&self) -> Result<bool> {
        self.attribute(WindowAttribute::Visible)
    }

    pub fn is_maximized(&self) -> Result<bool> {
        self.attribute(WindowAttribute::Maximized)
    }

    pub fn is_iconified(&self) -> Result<bool> {
        self.attribute(WindowAttribute::Iconified)
    }

    pub fn is_focused(&self) -> Result<bool> {
        self.attribute(WindowAttribute::Focused)
    }

    pub fn is_always_on_top(&self) -> Result<bool> {
        self.attribute(WindowAttribute::AlwaysOnTop)
    }

    pub fn is_resizable(&self) -> Result<bool> {
        self.attribute(WindowAttribute::Resizable)
    }

    /// False once the native window is gone.
    fn attribute(&self, attribute: WindowAttribute) -> Result<bool> {
        let handle = self.native_handle()?;
        let alive = self.shared.native_alive.read();
        Ok(*alive && self.shared.context.backend.attribute(handle, attribute))
    }

    /// Apply `command` now on the window thread, or queue it for the next
    /// loop iteration from any other thread.
    fn submit(&self, command: Command) -> Result<()> {
        let handle = self.native_handle()?;
        if self.is_window_thread() {
            self.apply(handle, command);
        } else if self.shared.commands.send(command).is_err() {
            warn!("Window `{}` no longer accepts commands", self.shared.name);
        }
        Ok(())
    }

    fn apply(&self, handle: NativeHandle, command: Command) {
        let backend = &self.shared.context.backend;
        debug!("Window `{}`: {:?}", self.shared.name, command);
        match command {
            Command::Title(title) => backend.set_title(handle, &title),
            Command::Size(width, height) => backend.set_size(handle, width, height),
            Command::SwapInterval(interval) => backend.set_swap_interval(handle, interval),
            Command::Attribute(attribute, value) => backend.set_attribute(handle, attribute, value),
            Command::Restore => backend.restore(handle),
        }
    }

    fn apply_pending(&self, handle: NativeHandle) {
        while let Ok(command) = self.shared.pending.try_recv() {
            self.apply(handle, command);
        }
    }

    // -------------------------------------------------------------------------
    // Appearance
    // -------------------------------------------------------------------------

    /// Color the frame is cleared with.
    pub fn background(&self) -> Rgba {
        *self.shared.background.read()
    }

    pub fn set_background(&self, color: Rgba) {
        *self.shared.background.write() = color;
    }

    /// Frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.shared.frames.load(Ordering::Acquire)
    }

    // -------------------------------------------------------------------------
    // Close
    // -------------------------------------------------------------------------

    /// Ask the window to close.
    ///
    /// Sets the close flag only; the window thread finishes its current
    /// frame, then runs its destroy phase.
    pub fn close(&self) {
        if self.shared.close_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Readiness::Ready(handle) = self.shared.gate.peek() {
            let alive = self.shared.native_alive.read();
            if *alive {
                self.shared.context.backend.set_should_close(handle, true);
            }
        }
        debug!("Close requested for window `{}`", self.shared.name);
        self.shared.context.emit(LifecycleEvent::CloseRequested {
            window: self.shared.name.clone(),
        });
    }

    pub fn is_close_requested(&self) -> bool {
        self.shared.close_requested.load(Ordering::Acquire)
    }

    /// Wait for the window thread to exit. No-op for windows that never
    /// started, and refused on the window thread itself.
    pub fn join(&self) {
        if self.is_window_thread() {
            warn!("Window `{}` cannot join its own thread", self.shared.name);
            return;
        }
        let handle = self.shared.thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Window thread of `{}` panicked", self.shared.name);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Add a root component. Refused if one with the same name is present.
    pub fn add_component(&self, component: &ComponentRef) -> bool {
        let mut components = self.shared.components.write();
        if components.iter().any(|c| c.name() == component.name()) {
            warn!(
                "Window `{}` already has a component named `{}`",
                self.shared.name,
                component.name()
            );
            return false;
        }
        components.push(component.clone());
        debug!("Added component `{}` to window `{}`", component.name(), self.shared.name);
        true
    }

    /// Remove a root component by name. Warns if there is none.
    pub fn remove_component(&self, name: &str) -> Option<ComponentRef> {
        let mut components = self.shared.components.write();
        let Some(position) = components.iter().position(|c| c.name() == name) else {
            warn!("Window `{}` has no component named `{}`", self.shared.name, name);
            return None;
        };
        debug!("Removed component `{}` from window `{}`", name, self.shared.name);
        Some(components.remove(position))
    }

    pub fn remove_all_components(&self) -> Vec<ComponentRef> {
        std::mem::take(&mut *self.shared.components.write())
    }

    /// Root components in insertion order.
    pub fn components(&self) -> Vec<ComponentRef> {
        self.shared.components.read().clone()
    }

    pub fn component(&self, name: &str) -> Option<ComponentRef> {
        self.shared.components.read().iter().find(|c| c.name() == name).cloned()
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.shared.components.read().iter().any(|c| c.name() == name)
    }

    /// Names of the components queued by the last frame.
    pub fn queued_components(&self) -> Vec<String> {
        self.shared.queued.read().clone()
    }

    // -------------------------------------------------------------------------
    // Renderers
    // -------------------------------------------------------------------------

    pub fn add_renderer(&self, renderer: impl Renderer + 'static) -> bool {
        self.add_boxed_renderer(Box::new(renderer))
    }

    /// Append a renderer. Refused if one with the same name is present.
    pub fn add_boxed_renderer(&self, renderer: Box<dyn Renderer>) -> bool {
        self.shared.pipeline.lock().add(renderer)
    }

    /// Dispose and remove a renderer. Warns if there is none.
    pub fn remove_renderer(&self, name: &str) -> bool {
        self.shared.pipeline.lock().remove(name)
    }

    /// Dispose and remove every renderer, in registration order.
    pub fn remove_all_renderers(&self) {
        self.shared.pipeline.lock().remove_all();
    }

    /// Renderer names in registration order.
    pub fn renderer_names(&self) -> Vec<String> {
        self.shared.pipeline.lock().names()
    }

    pub fn has_renderer(&self, name: &str) -> bool {
        self.shared.pipeline.lock().contains(name)
    }

    pub fn renderer_count(&self) -> usize {
        self.shared.pipeline.lock().len()
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("name", &self.shared.name)
            .field("tag", &self.tag())
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
