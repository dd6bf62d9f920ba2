//! Toolkit - The top-level context of an application.
//!
//! A [`Toolkit`] owns everything that would otherwise be process-wide: the
//! native backend, options, error handler, the window, component and
//! renderer-name registries, the shared input trackers and the window-type
//! factories. Several toolkits can live in one process without seeing each
//! other.
//!
//! # Example
//!
//! ```ignore
//! use spark_gui::{RecordingBackend, Toolkit, WindowRequest};
//!
//! let toolkit = Toolkit::builder(RecordingBackend::new()).build();
//! let window = toolkit.create_window(WindowRequest::new().id("main").title("Hello"));
//! window.wait_until_built()?;
//! window.close();
//! toolkit.join_all();
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, info};

use crate::backend::{NativeBackend, NativeHandle};
use crate::callback::Callback;
use crate::component::{Component, ComponentProps, ComponentRef, ComponentRegistry};
use crate::config::Options;
use crate::engine::{NameRegistry, Registry};
use crate::error::{ErrorHandler, ErrorKind};
use crate::input::InputState;
use crate::window::{Window, WindowKind, WindowTypes};

// =============================================================================
// Requests and Events
// =============================================================================

/// Parameters of a new window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    /// Requested name. Defaults to the kind's tag.
    pub id: Option<String>,
    /// Title. Defaults to the window name.
    pub title: Option<String>,
    pub width: i32,
    pub height: i32,
    /// Window type tag, resolved through the toolkit's window types.
    pub tag: String,
}

impl Default for WindowRequest {
    fn default() -> Self {
        Self {
            id: None,
            title: None,
            width: 800,
            height: 600,
            tag: "Window".to_string(),
        }
    }
}

impl WindowRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

/// Window lifecycle notifications, delivered on the thread they happen on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    WindowCreated { window: String },
    WindowBuilt { window: String, handle: NativeHandle },
    BuildFailed { window: String, kind: ErrorKind },
    CloseRequested { window: String },
    WindowDestroyed { window: String },
    RendererInitialized { window: String, renderer: String },
}

impl LifecycleEvent {
    /// Name of the window the event is about.
    pub fn window(&self) -> &str {
        match self {
            LifecycleEvent::WindowCreated { window }
            | LifecycleEvent::WindowBuilt { window, .. }
            | LifecycleEvent::BuildFailed { window, .. }
            | LifecycleEvent::CloseRequested { window }
            | LifecycleEvent::WindowDestroyed { window }
            | LifecycleEvent::RendererInitialized { window, .. } => window,
        }
    }
}

// =============================================================================
// Shared State
// =============================================================================

pub(crate) struct ToolkitShared {
    backend: Arc<dyn NativeBackend>,
    options: Options,
    errors: ErrorHandler,
    pub(crate) windows: Registry<Window>,
    components: ComponentRegistry,
    renderer_names: Arc<NameRegistry>,
    input: Arc<InputState>,
    window_types: WindowTypes,
    threads: Arc<AtomicUsize>,
    events: Arc<Callback<LifecycleEvent>>,
}

/// What a window needs from its toolkit, without keeping it alive.
#[derive(Clone)]
pub(crate) struct WindowContext {
    pub(crate) backend: Arc<dyn NativeBackend>,
    pub(crate) options: Options,
    pub(crate) errors: ErrorHandler,
    pub(crate) input: Arc<InputState>,
    pub(crate) renderer_names: Arc<NameRegistry>,
    pub(crate) threads: Arc<AtomicUsize>,
    events: Arc<Callback<LifecycleEvent>>,
    toolkit: Weak<ToolkitShared>,
}

impl WindowContext {
    pub(crate) fn toolkit(&self) -> Option<Toolkit> {
        self.toolkit.upgrade().map(|shared| Toolkit { shared })
    }

    pub(crate) fn emit(&self, event: LifecycleEvent) {
        self.events.invoke(&event);
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Toolkit`].
pub struct ToolkitBuilder {
    backend: Arc<dyn NativeBackend>,
    options: Options,
    errors: ErrorHandler,
}

impl ToolkitBuilder {
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn error_handler(mut self, errors: ErrorHandler) -> Self {
        self.errors = errors;
        self
    }

    pub fn build(self) -> Toolkit {
        info!("Toolkit started on the `{}` backend", self.backend.name());
        Toolkit {
            shared: Arc::new(ToolkitShared {
                backend: self.backend,
                options: self.options,
                errors: self.errors,
                windows: Registry::new("window"),
                components: Registry::new("component"),
                renderer_names: Arc::new(Registry::new("renderer")),
                input: Arc::new(InputState::new()),
                window_types: WindowTypes::new(),
                threads: Arc::new(AtomicUsize::new(0)),
                events: Arc::new(Callback::new("lifecycle")),
            }),
        }
    }
}

// =============================================================================
// Toolkit
// =============================================================================

/// Cheap, cloneable handle to a toolkit context.
#[derive(Clone)]
pub struct Toolkit {
    pub(crate) shared: Arc<ToolkitShared>,
}

impl Toolkit {
    pub fn builder(backend: impl NativeBackend + 'static) -> ToolkitBuilder {
        Self::builder_shared(Arc::new(backend))
    }

    pub fn builder_shared(backend: Arc<dyn NativeBackend>) -> ToolkitBuilder {
        ToolkitBuilder {
            backend,
            options: Options::default(),
            errors: ErrorHandler::default(),
        }
    }

    /// Toolkit with default options and error handler.
    pub fn new(backend: impl NativeBackend + 'static) -> Self {
        Self::builder(backend).build()
    }

    pub fn backend(&self) -> &Arc<dyn NativeBackend> {
        &self.shared.backend
    }

    pub fn options(&self) -> &Options {
        &self.shared.options
    }

    pub fn error_handler(&self) -> &ErrorHandler {
        &self.shared.errors
    }

    pub fn input(&self) -> &Arc<InputState> {
        &self.shared.input
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.shared.components
    }

    pub fn renderer_names(&self) -> &Arc<NameRegistry> {
        &self.shared.renderer_names
    }

    pub fn window_types(&self) -> &WindowTypes {
        &self.shared.window_types
    }

    /// Lifecycle notifications of every window of this toolkit.
    pub fn lifecycle_events(&self) -> &Callback<LifecycleEvent> {
        &self.shared.events
    }

    /// Number of window threads currently running.
    pub fn active_threads(&self) -> usize {
        self.shared.threads.load(Ordering::Acquire)
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Create and register a component.
    pub fn create_component(&self, props: ComponentProps) -> ComponentRef {
        Component::create(&self.shared.components, props)
    }

    pub fn component(&self, name: &str) -> Option<ComponentRef> {
        self.shared.components.get(name)
    }

    // -------------------------------------------------------------------------
    // Windows
    // -------------------------------------------------------------------------

    /// Register a window type under `tag`.
    pub fn register_window_type<F>(&self, tag: &str, factory: F)
    where
        F: Fn() -> Arc<dyn WindowKind> + Send + Sync + 'static,
    {
        self.shared.window_types.register(tag, factory);
    }

    /// Create a window and start its thread.
    ///
    /// The request's tag selects the window type; unknown tags fall back to
    /// the standard window.
    pub fn create_window(&self, request: WindowRequest) -> Window {
        let kind = self.shared.window_types.build(&request.tag);
        self.create_window_with_kind(request, kind)
    }

    /// Create a window of an explicit kind and start its thread.
    pub fn create_window_with_kind(&self, request: WindowRequest, kind: Arc<dyn WindowKind>) -> Window {
        let requested = request.id.clone().unwrap_or_else(|| kind.tag().to_string());
        let context = self.window_context();

        let window = self
            .shared
            .windows
            .register_with(&requested, |name| Window::new(name, &request, kind, context));

        self.shared.events.invoke(&LifecycleEvent::WindowCreated {
            window: window.name().to_string(),
        });
        window.start();
        window
    }

    fn window_context(&self) -> WindowContext {
        WindowContext {
            backend: self.shared.backend.clone(),
            options: self.shared.options.clone(),
            errors: self.shared.errors.clone(),
            input: self.shared.input.clone(),
            renderer_names: self.shared.renderer_names.clone(),
            threads: self.shared.threads.clone(),
            events: self.shared.events.clone(),
            toolkit: Arc::downgrade(&self.shared),
        }
    }

    pub fn window(&self, name: &str) -> Option<Window> {
        self.shared.windows.get(name)
    }

    /// Every registered window, in creation order.
    pub fn windows(&self) -> Vec<Window> {
        self.shared.windows.entries()
    }

    pub fn window_names(&self) -> Vec<String> {
        self.shared.windows.names()
    }

    pub fn contains_window(&self, name: &str) -> bool {
        self.shared.windows.contains(name)
    }

    /// Remove a window from the registry. Warns if there is none.
    ///
    /// The window itself keeps running until closed.
    pub fn unregister_window(&self, name: &str) -> Option<Window> {
        self.shared.windows.unregister(name)
    }

    /// Ask every window to close.
    pub fn close_all(&self) {
        for window in self.windows() {
            window.close();
        }
    }

    /// Wait for every window thread to exit.
    pub fn join_all(&self) {
        for window in self.windows() {
            window.join();
        }
    }

    /// Close every window and wait for their threads.
    pub fn shutdown(&self) {
        let windows = self.windows();
        debug!("Shutting down {} windows", windows.len());
        for window in &windows {
            window.close();
        }
        for window in &windows {
            window.join();
        }
    }
}

impl fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolkit")
            .field("backend", &self.shared.backend.name())
            .field("windows", &self.shared.windows.names())
            .field("components", &self.shared.components.len())
            .finish()
    }
}
