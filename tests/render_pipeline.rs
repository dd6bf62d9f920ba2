//! Render pipeline tests: queue building, layouts, the background renderer
//! and renderer bookkeeping, driven through real window threads.
//!
//! Run with: cargo test --test render_pipeline

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use spark_gui::{
    Component, ComponentProps, ComponentRef, DrawCommand, ErrorHandler, Frame, Lifecycle,
    LifecycleEvent, NativeHandle, Options, Rect, RecordingBackend, Renderer, RendererState, Rgba,
    Style, Toolkit, Window, WindowRequest, flow_pane, pane, rectangle,
};

// =============================================================================
// Helpers
// =============================================================================

fn setup(default_renderers: bool) -> (RecordingBackend, Toolkit) {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = RecordingBackend::new();
    let toolkit = Toolkit::builder(backend.clone())
        .options(Options::default().with_default_renderers(default_renderers))
        .error_handler(ErrorHandler::logging_only())
        .build();
    (backend, toolkit)
}

fn open(toolkit: &Toolkit, id: &str) -> (Window, NativeHandle) {
    let window = toolkit.create_window(WindowRequest::new().id(id).size(400, 300));
    let handle = window.native_handle().unwrap();
    (window, handle)
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn fills(backend: &RecordingBackend, handle: NativeHandle) -> Vec<(Rect, Rgba)> {
    backend
        .last_frame(handle)
        .into_iter()
        .filter_map(|command| match command {
            DrawCommand::FillRect { rect, color, .. } => Some((rect, color)),
            DrawCommand::Clear(_) => None,
        })
        .collect()
}

/// Node logging `(node, window)` every time a window is attached to it.
fn watcher(toolkit: &Toolkit, log: &Arc<Mutex<Vec<(String, String)>>>) -> ComponentRef {
    let sink = log.clone();
    toolkit.components().create(
        ComponentProps::new("Watcher")
            .id("watcher")
            .size(10, 10)
            .on_window(move |node: &Component, window: &Window| {
                sink.lock().push((node.name().to_string(), window.name().to_string()));
            }),
    )
}

#[derive(Default)]
struct Counters {
    initialized: AtomicUsize,
    loaded: AtomicUsize,
    rendered: AtomicUsize,
    disposed: AtomicUsize,
}

struct Counting {
    state: RendererState,
    counters: Arc<Counters>,
}

impl Renderer for Counting {
    fn state(&self) -> &RendererState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RendererState {
        &mut self.state
    }

    fn initialize(&mut self) {
        self.counters.initialized.fetch_add(1, Ordering::SeqCst);
    }

    fn load(&mut self, _window: &Window) {
        self.counters.loaded.fetch_add(1, Ordering::SeqCst);
    }

    fn render(&mut self, _frame: &mut Frame<'_>) {
        self.counters.rendered.fetch_add(1, Ordering::SeqCst);
    }

    fn dispose(&mut self) {
        self.counters.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Background Renderer
// =============================================================================

#[test]
fn test_default_renderer_is_installed() {
    let (_backend, toolkit) = setup(true);
    let (window, _) = open(&toolkit, "main");
    assert_eq!(window.renderer_names(), vec!["BackgroundRenderer".to_string()]);
    toolkit.shutdown();
}

#[test]
fn test_background_renderer_fills_at_absolute_bounds() {
    let (backend, toolkit) = setup(true);
    let (window, handle) = open(&toolkit, "main");
    window.set_background(Rgba::GRAY);

    let root = pane(toolkit.components(), Some("root"));
    root.set_position(10, 10);
    let child = rectangle(toolkit.components(), Some("child"));
    child.set_position(5, 5);
    child.set_size(20, 20);
    child.set_style(Style::new().with_background(Rgba::RED).with_radius(4.0));
    root.add_child(&child);
    window.add_component(&root);

    assert!(wait_for(|| fills(&backend, handle).len() == 2));
    let frame = backend.last_frame(handle);
    assert_eq!(frame.first(), Some(&DrawCommand::Clear(Rgba::GRAY)));
    assert_eq!(
        fills(&backend, handle),
        vec![
            (Rect::new(10, 10, 200, 200), Rgba::AQUA),
            (Rect::new(15, 15, 20, 20), Rgba::RED),
        ]
    );
    assert!(frame.contains(&DrawCommand::FillRect {
        rect: Rect::new(15, 15, 20, 20),
        color: Rgba::RED,
        radius: 4.0,
    }));

    assert_eq!(window.queued_components(), vec!["root", "child"]);
    assert!(child.window().is_some_and(|w| w.ptr_eq(&window)));
    toolkit.shutdown();
}

#[test]
fn test_background_renderer_orders_by_z_index() {
    let (backend, toolkit) = setup(true);
    let (window, handle) = open(&toolkit, "main");

    let top = rectangle(toolkit.components(), Some("top"));
    top.set_style(Style::new().with_background(Rgba::BLUE).with_z_index(5));
    let bottom = rectangle(toolkit.components(), Some("bottom"));
    bottom.set_style(Style::new().with_background(Rgba::GREEN));
    let hidden = rectangle(toolkit.components(), Some("hidden"));
    hidden.set_style(Style::new().with_background(Rgba::TRANSPARENT));

    window.add_component(&top);
    window.add_component(&bottom);
    window.add_component(&hidden);

    assert!(wait_for(|| window.queued_components().len() == 3 && fills(&backend, handle).len() == 2));
    let colors: Vec<Rgba> = fills(&backend, handle).into_iter().map(|(_, color)| color).collect();
    assert_eq!(colors, vec![Rgba::GREEN, Rgba::BLUE]);
    toolkit.shutdown();
}

#[test]
fn test_removed_components_stop_rendering() {
    let (backend, toolkit) = setup(true);
    let (window, handle) = open(&toolkit, "main");

    let node = rectangle(toolkit.components(), Some("node"));
    window.add_component(&node);
    assert!(wait_for(|| fills(&backend, handle).len() == 1));

    assert!(window.remove_component("node").is_some());
    assert!(window.remove_component("node").is_none());
    assert!(wait_for(|| fills(&backend, handle).is_empty()));
    assert!(window.queued_components().is_empty());
    toolkit.shutdown();
}

// =============================================================================
// Window Attachment
// =============================================================================

#[test]
fn test_attach_listener_fires_once_per_window() {
    let (_backend, toolkit) = setup(false);
    let (first, _) = open(&toolkit, "first");
    let (second, _) = open(&toolkit, "second");
    let attached = Arc::new(Mutex::new(Vec::new()));
    let node = watcher(&toolkit, &attached);

    first.add_component(&node);
    assert!(wait_for(|| attached.lock().len() == 1));
    let frames = first.frames_rendered();
    assert!(wait_for(|| first.frames_rendered() >= frames + 5));
    assert_eq!(*attached.lock(), vec![("watcher".to_string(), "first".to_string())]);

    // Once a frame without the node is published, `first` never queues it again.
    assert!(first.remove_component("watcher").is_some());
    assert!(wait_for(|| !first.queued_components().contains(&"watcher".to_string())));

    second.add_component(&node);
    assert!(wait_for(|| attached.lock().len() == 2));
    let frames = second.frames_rendered();
    assert!(wait_for(|| second.frames_rendered() >= frames + 5));
    assert_eq!(
        *attached.lock(),
        vec![
            ("watcher".to_string(), "first".to_string()),
            ("watcher".to_string(), "second".to_string()),
        ]
    );
    assert!(node.window().is_some_and(|w| w.ptr_eq(&second)));
    toolkit.shutdown();
}

#[test]
fn test_attach_listener_may_use_its_window() {
    let (_backend, toolkit) = setup(true);
    let (window, _) = open(&toolkit, "main");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let node = toolkit.components().create(ComponentProps::new("Watcher").on_window(
        move |_: &Component, window: &Window| {
            let names = window.renderer_names();
            let count = window.renderer_count();
            let queued = window.queued_components();
            sink.lock().push((names, count, window.has_renderer("BackgroundRenderer"), queued));
        },
    ));

    window.add_component(&node);
    assert!(wait_for(|| !seen.lock().is_empty()));
    let frames = window.frames_rendered();
    assert!(wait_for(|| window.frames_rendered() >= frames + 3));
    assert!(wait_for(|| window.queued_components() == vec!["Watcher".to_string()]));

    let (names, count, has_background, _) = seen.lock()[0].clone();
    assert_eq!(names, vec!["BackgroundRenderer".to_string()]);
    assert_eq!(count, 1);
    assert!(has_background);

    window.close();
    window.join();
    assert_eq!(window.lifecycle(), Lifecycle::Destroyed);
}

// =============================================================================
// Layouts
// =============================================================================

#[test]
fn test_flow_pane_lays_out_during_frames() {
    let (_backend, toolkit) = setup(false);
    let (window, _) = open(&toolkit, "main");

    let flow = flow_pane(toolkit.components(), Some("flow"), 10);
    let items: Vec<_> = (0..3)
        .map(|i| {
            let item = rectangle(toolkit.components(), Some(&format!("item{i}")));
            item.set_size(80, 50);
            flow.add_child(&item);
            item
        })
        .collect();
    window.add_component(&flow);

    assert!(wait_for(|| items[2].bounds() == Rect::new(0, 60, 80, 50)));
    assert_eq!((items[0].x(), items[0].y()), (0, 0));
    assert_eq!((items[1].x(), items[1].y()), (90, 0));
    toolkit.shutdown();
}

// =============================================================================
// Renderer Bookkeeping
// =============================================================================

#[test]
fn test_renderer_names_are_unique_per_toolkit() {
    let (_backend, toolkit) = setup(false);
    let first = RendererState::new(&toolkit, "bg");
    let second = RendererState::new(&toolkit, "bg");
    assert_eq!(first.name(), "bg");
    assert_eq!(second.name(), "bg-1");

    drop(first);
    assert!(!toolkit.renderer_names().contains("bg"));
    assert!(toolkit.renderer_names().contains("bg-1"));
}

#[test]
fn test_renderer_lifecycle_and_double_removal() {
    let (_backend, toolkit) = setup(false);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    toolkit.lifecycle_events().add(move |event: &LifecycleEvent| {
        if let LifecycleEvent::RendererInitialized { renderer, .. } = event {
            sink.lock().push(renderer.clone());
        }
    });

    let (window, _) = open(&toolkit, "main");
    let counters = Arc::new(Counters::default());
    assert!(window.add_renderer(Counting {
        state: RendererState::new(&toolkit, "bg"),
        counters: counters.clone(),
    }));

    assert!(wait_for(|| counters.rendered.load(Ordering::SeqCst) >= 3));
    assert_eq!(counters.initialized.load(Ordering::SeqCst), 1);
    assert_eq!(counters.loaded.load(Ordering::SeqCst), 1);
    assert_eq!(*events.lock(), vec!["bg".to_string()]);

    assert!(window.remove_renderer("bg"));
    assert!(!window.remove_renderer("bg"));
    assert_eq!(window.renderer_count(), 0);
    assert_eq!(counters.disposed.load(Ordering::SeqCst), 1);
    assert!(!toolkit.renderer_names().contains("bg"));
    toolkit.shutdown();
}

#[test]
fn test_renderers_are_disposed_on_destroy() {
    let (_backend, toolkit) = setup(false);
    let (window, _) = open(&toolkit, "main");
    let counters = Arc::new(Counters::default());
    window.add_renderer(Counting {
        state: RendererState::new(&toolkit, "overlay"),
        counters: counters.clone(),
    });
    assert!(wait_for(|| counters.rendered.load(Ordering::SeqCst) > 0));

    window.close();
    window.join();
    assert_eq!(counters.disposed.load(Ordering::SeqCst), 1);
    assert_eq!(window.renderer_count(), 0);
}

#[test]
fn test_duplicate_renderer_is_refused() {
    let (_backend, toolkit) = setup(false);
    let (window, _) = open(&toolkit, "main");
    let counters = Arc::new(Counters::default());

    assert!(window.add_renderer(Counting {
        state: RendererState::unregistered("same"),
        counters: counters.clone(),
    }));
    assert!(!window.add_renderer(Counting {
        state: RendererState::unregistered("same"),
        counters: counters.clone(),
    }));
    assert_eq!(window.renderer_count(), 1);
    toolkit.shutdown();
}
