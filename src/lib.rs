//! # spark-gui
//!
//! Thread-per-window UI toolkit for Rust.
//!
//! ## Architecture
//!
//! Every window owns one thread, one native window and one component tree.
//! Other threads talk to a window through a cloneable [`Window`] handle:
//! reads block on a readiness gate until the native window exists, writes
//! are queued and applied by the window thread.
//!
//! ```text
//! Toolkit ─create_window─▶ Window thread
//!                           build → initialize → loop { poll, update, render } → destroy
//!                                                           │
//!                          components ─▶ RenderQueue ─▶ Renderer pipeline ─▶ Surface
//! ```
//!
//! Native windowing is abstracted behind [`NativeBackend`]. The crate ships a
//! [`TerminalBackend`] (crossterm) and an in-memory [`RecordingBackend`]
//! for tests and headless use.
//!
//! ## Modules
//!
//! - [`types`] - Colors and geometry
//! - [`error`] - Error kinds, caller errors and the error handler
//! - [`config`] - Toolkit options
//! - [`engine`] - Name registries
//! - [`callback`] - Callback lists and native events
//! - [`input`] - Keyboard and mouse trackers
//! - [`component`] - Component tree, styles and layouts
//! - [`backend`] - Native backend abstraction
//! - [`renderer`] - Render queue and renderer pipeline
//! - [`window`] - The window actor
//! - [`toolkit`] - Toolkit context

pub mod backend;
pub mod callback;
pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod renderer;
pub mod toolkit;
pub mod types;
pub mod window;

// Re-export commonly used items
pub use types::*;

pub use error::{ErrorHandler, ErrorKind, Result, UiError};

pub use config::Options;

pub use engine::{NameRegistry, Named, Registry, serial_name};

pub use callback::{Callback, NativeEvent, SubscriberId, WindowCallbacks};

pub use input::{Action, InputState, Keyboard, Modifiers, Mouse, keys};

pub use component::{
    AcceptsWindow, Background, Component, ComponentProps, ComponentRef, ComponentRegistry,
    FlowPane, Layout, Pane, PositionMode, Style, flow_pane, pane, rectangle,
};

pub use backend::{
    DrawCommand, NativeBackend, NativeHandle, RecordingBackend, Surface, SurfaceInfo,
    TerminalBackend, WindowAttribute, WindowHints,
};

pub use renderer::{
    BackgroundRenderer, Frame, FrameReport, RenderPipeline, RenderPriority, RenderQueue, Renderer,
    RendererState,
};

pub use window::{Lifecycle, Readiness, StandardWindow, WeakWindow, Window, WindowKind, WindowTypes};

pub use toolkit::{LifecycleEvent, Toolkit, ToolkitBuilder, WindowRequest};
