//! Window lifecycle tests against the recording backend.
//!
//! Covers naming, the readiness gate, the thread limit, build failures,
//! queued native commands, native close requests and callback order.
//!
//! Run with: cargo test --test window_lifecycle

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use spark_gui::callback::{FramebufferSizeEvent, KeyEvent};
use spark_gui::{
    Action, ErrorHandler, ErrorKind, Lifecycle, LifecycleEvent, Modifiers, Options, Readiness,
    RecordingBackend, Toolkit, UiError, Window, WindowCallbacks, WindowKind, WindowRequest, keys,
};

// =============================================================================
// Helpers
// =============================================================================

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup() -> (RecordingBackend, Toolkit) {
    setup_with(Options::default().with_default_renderers(false))
}

fn setup_with(options: Options) -> (RecordingBackend, Toolkit) {
    init_logging();
    let backend = RecordingBackend::new();
    let toolkit = Toolkit::builder(backend.clone())
        .options(options)
        .error_handler(ErrorHandler::logging_only())
        .build();
    (backend, toolkit)
}

/// Poll `condition` until it holds or two seconds pass.
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

fn record_events(toolkit: &Toolkit) -> Arc<Mutex<Vec<LifecycleEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    toolkit.lifecycle_events().add(move |event: &LifecycleEvent| sink.lock().push(event.clone()));
    events
}

/// Window kind writing every phase and key event to a shared log.
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl WindowKind for Recorder {
    fn tag(&self) -> &str {
        "Recorder"
    }

    fn initialize(&self, _window: &Window) {
        self.log.lock().push("initialize".into());
    }

    fn update(&self, _window: &Window) {
        let mut log = self.log.lock();
        if log.last().map(String::as_str) != Some("update") {
            log.push("update".into());
        }
    }

    fn destroy(&self, _window: &Window) {
        self.log.lock().push("destroy".into());
    }

    fn on_key(&self, _window: &Window, _event: &KeyEvent) {
        self.log.lock().push("kind".into());
    }
}

// =============================================================================
// Naming
// =============================================================================

#[test]
fn test_duplicate_window_names_get_a_suffix() {
    let (_backend, toolkit) = setup();

    let first = toolkit.create_window(WindowRequest::new().id("main"));
    let second = toolkit.create_window(WindowRequest::new().id("main"));

    assert_eq!(first.name(), "main");
    assert_eq!(second.name(), "main-1");
    assert!(toolkit.contains_window("main"));
    assert!(toolkit.contains_window("main-1"));

    first.wait_until_built().unwrap();
    second.wait_until_built().unwrap();
    toolkit.shutdown();
}

#[test]
fn test_unnamed_window_uses_its_tag() {
    let (_backend, toolkit) = setup();
    let window = toolkit.create_window(WindowRequest::new());
    assert_eq!(window.name(), "Window");
    assert_eq!(window.tag(), "Window");
    toolkit.shutdown();
}

// =============================================================================
// Build and Destroy
// =============================================================================

#[test]
fn test_window_builds_and_closes() {
    let (backend, toolkit) = setup();
    let events = record_events(&toolkit);

    let window = toolkit.create_window(WindowRequest::new().id("main").title("Hello").size(320, 200));
    window.wait_until_built().unwrap();

    let handle = window.native_handle().unwrap();
    assert_eq!(window.lifecycle(), Lifecycle::Running);
    assert_eq!(window.readiness(), Readiness::Ready(handle));
    assert_eq!(window.title().unwrap(), "Hello");
    assert_eq!(window.size().unwrap(), (320, 200));
    let hints = backend.hints(handle).unwrap();
    assert_eq!(hints.title, "Hello");
    assert_eq!((hints.width, hints.height), (320, 200));

    assert!(wait_for(|| window.frames_rendered() > 2));

    window.close();
    window.join();

    assert_eq!(window.lifecycle(), Lifecycle::Destroyed);
    assert!(backend.is_destroyed(handle));
    assert!(!toolkit.contains_window("main"));
    assert_eq!(toolkit.active_threads(), 0);
    assert_eq!(window.title(), Err(UiError::Destroyed("main".into())));

    let events = events.lock();
    assert_eq!(events.first(), Some(&LifecycleEvent::WindowCreated { window: "main".into() }));
    assert!(events.contains(&LifecycleEvent::WindowBuilt {
        window: "main".into(),
        handle
    }));
    assert!(events.contains(&LifecycleEvent::CloseRequested { window: "main".into() }));
    assert_eq!(events.last(), Some(&LifecycleEvent::WindowDestroyed { window: "main".into() }));
}

#[test]
fn test_kind_phases_run_in_order() {
    let (_backend, toolkit) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));

    let window = toolkit.create_window_with_kind(
        WindowRequest::new().id("phases"),
        Arc::new(Recorder { log: log.clone() }),
    );
    assert_eq!(window.tag(), "Recorder");
    window.wait_until_built().unwrap();
    assert!(wait_for(|| log.lock().iter().any(|entry| entry == "update")));

    window.close();
    window.join();

    let log = log.lock();
    assert_eq!(log.first().map(String::as_str), Some("initialize"));
    assert_eq!(log.last().map(String::as_str), Some("destroy"));
}

#[test]
fn test_native_close_request_ends_the_loop() {
    let (backend, toolkit) = setup();
    let events = record_events(&toolkit);

    let window = toolkit.create_window(WindowRequest::new().id("main"));
    let handle = window.native_handle().unwrap();

    assert!(backend.request_close(handle));
    assert!(wait_for(|| window.lifecycle() == Lifecycle::Destroyed));
    window.join();

    assert!(backend.is_destroyed(handle));
    assert!(events.lock().contains(&LifecycleEvent::CloseRequested { window: "main".into() }));
}

#[test]
fn test_destroyed_window_is_not_touched_again() {
    let (backend, toolkit) = setup();
    let window = toolkit.create_window(WindowRequest::new().id("main"));
    let handle = window.native_handle().unwrap();

    // Keep reading attributes while the window tears down.
    let reader = {
        let window = window.clone();
        thread::spawn(move || {
            while window.is_visible().is_ok() {
                thread::yield_now();
            }
        })
    };
    thread::sleep(Duration::from_millis(10));
    window.close();
    window.join();
    reader.join().unwrap();

    assert_eq!(window.lifecycle(), Lifecycle::Destroyed);
    assert!(backend.is_destroyed(handle));
    assert_eq!(window.is_visible(), Err(UiError::Destroyed("main".into())));
    window.close();
    assert_eq!(backend.stale_calls(), 0);
}

// =============================================================================
// Thread Limit
// =============================================================================

#[test]
fn test_thread_limit_refuses_extra_windows() {
    let (_backend, toolkit) = setup_with(
        Options::default()
            .with_default_renderers(false)
            .with_max_window_threads(1),
    );

    let first = toolkit.create_window(WindowRequest::new().id("first"));
    first.wait_until_built().unwrap();

    let second = toolkit.create_window(WindowRequest::new().id("second"));
    assert_eq!(second.readiness(), Readiness::Failed(ErrorKind::ThreadLimitReached));
    assert_eq!(second.wait_until_built(), Err(UiError::NotStarted("second".into())));
    assert_eq!(second.lifecycle(), Lifecycle::Constructed);
    assert_eq!(toolkit.active_threads(), 1);

    // Joining a window that never started returns at once.
    second.join();
    toolkit.unregister_window("second");

    first.close();
    first.join();
    assert_eq!(toolkit.active_threads(), 0);
}

// =============================================================================
// Build Failures
// =============================================================================

#[test]
fn test_window_creation_failure() {
    let (backend, toolkit) = setup();
    let events = record_events(&toolkit);
    backend.fail_window_creation(true);

    let window = toolkit.create_window(WindowRequest::new().id("broken"));
    assert_eq!(
        window.wait_until_built(),
        Err(UiError::BuildFailed {
            window: "broken".into(),
            kind: ErrorKind::WindowGenerationFailed,
        })
    );
    window.join();

    assert_eq!(window.lifecycle(), Lifecycle::Failed);
    assert!(!toolkit.contains_window("broken"));
    assert!(events.lock().contains(&LifecycleEvent::BuildFailed {
        window: "broken".into(),
        kind: ErrorKind::WindowGenerationFailed,
    }));
    assert!(!events.lock().iter().any(|e| matches!(e, LifecycleEvent::WindowDestroyed { .. })));
}

#[test]
fn test_surface_failure_releases_the_native_window() {
    let (backend, toolkit) = setup();
    backend.fail_surface_creation(true);

    let window = toolkit.create_window(WindowRequest::new().id("surfaceless"));
    match window.wait_until_built() {
        Err(UiError::BuildFailed { kind, .. }) => assert_eq!(kind, ErrorKind::ContextMissing),
        other => panic!("unexpected {other:?}"),
    }
    window.join();
    assert_eq!(backend.live_windows(), 0);
}

#[test]
fn test_terminating_error_reaches_the_exit_hook() {
    init_logging();
    let backend = RecordingBackend::new();
    backend.fail_window_creation(true);

    let code = Arc::new(AtomicI32::new(0));
    let seen = code.clone();
    let toolkit = Toolkit::builder(backend)
        .options(Options::default().with_default_renderers(false))
        .error_handler(ErrorHandler::with_exit_hook(move |c| seen.store(c, Ordering::SeqCst)))
        .build();

    let window = toolkit.create_window(WindowRequest::new());
    assert!(window.wait_until_built().is_err());
    window.join();
    assert_eq!(code.load(Ordering::SeqCst), ErrorKind::WindowGenerationFailed.code());
}

#[test]
fn test_bounded_wait_times_out_without_a_thread_slot() {
    let (_backend, toolkit) = setup_with(
        Options::default()
            .with_default_renderers(false)
            .with_max_window_threads(0),
    );
    let window = toolkit.create_window(WindowRequest::new().id("idle"));
    // The gate is already resolved, so the bounded wait returns the refusal.
    assert_eq!(
        window.wait_until_built_timeout(Duration::from_millis(10)),
        Err(UiError::NotStarted("idle".into()))
    );
}

// =============================================================================
// Native Commands
// =============================================================================

#[test]
fn test_commands_are_applied_on_the_window_thread() {
    let (backend, toolkit) = setup();
    let window = toolkit.create_window(WindowRequest::new().id("main"));
    let handle = window.native_handle().unwrap();

    assert_eq!(backend.swap_interval(handle), Some(0));
    window.set_vsync(true).unwrap();
    window.set_title("Renamed").unwrap();

    assert!(window.vsync().unwrap());
    assert_eq!(window.title().unwrap(), "Renamed");
    assert!(wait_for(|| backend.title(handle).as_deref() == Some("Renamed")));
    assert!(wait_for(|| backend.swap_interval(handle) == Some(1)));

    window.maximize().unwrap();
    assert!(wait_for(|| window.is_maximized().unwrap()));
    window.restore().unwrap();
    assert!(wait_for(|| !window.is_maximized().unwrap()));

    toolkit.shutdown();
}

#[test]
fn test_framebuffer_events_update_the_cached_size() {
    let (backend, toolkit) = setup();
    let window = toolkit.create_window(WindowRequest::new().id("main"));
    let handle = window.native_handle().unwrap();

    backend.push_event(FramebufferSizeEvent {
        window: handle,
        width: 640,
        height: 480,
    });
    assert!(wait_for(|| window.size().unwrap() == (640, 480)));

    window.set_size(-5, 100).unwrap();
    assert_eq!(window.size().unwrap(), (0, 100));
    toolkit.shutdown();
}

#[test]
fn test_iconified_windows_skip_rendering() {
    let (_backend, toolkit) = setup();
    let window = toolkit.create_window(WindowRequest::new().id("main"));
    window.wait_until_built().unwrap();

    window.iconify().unwrap();
    assert!(wait_for(|| window.is_iconified().unwrap()));
    let frames = window.frames_rendered();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(window.frames_rendered(), frames);

    window.restore().unwrap();
    assert!(wait_for(|| window.frames_rendered() > frames));
    toolkit.shutdown();
}

#[test]
fn test_iconified_windows_render_when_configured() {
    let (_backend, toolkit) = setup_with(
        Options::default()
            .with_default_renderers(false)
            .with_render_while_iconified(true),
    );
    let window = toolkit.create_window(WindowRequest::new().id("main"));
    window.wait_until_built().unwrap();

    window.iconify().unwrap();
    assert!(wait_for(|| window.is_iconified().unwrap()));
    let frames = window.frames_rendered();
    assert!(wait_for(|| window.frames_rendered() >= frames + 5));
    assert!(window.is_iconified().unwrap());
    toolkit.shutdown();
}

// =============================================================================
// Callbacks
// =============================================================================

#[test]
fn test_callback_order_native_then_hooks_then_input() {
    let (backend, toolkit) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));

    let native = Arc::new(WindowCallbacks::new());
    let sink = log.clone();
    native.key.add(move |_: &KeyEvent| sink.lock().push("native".to_string()));
    backend.set_native_callbacks(native);

    let window = toolkit.create_window_with_kind(
        WindowRequest::new().id("keys"),
        Arc::new(Recorder { log: log.clone() }),
    );
    let handle = window.native_handle().unwrap();

    let input = toolkit.input().clone();
    let probe = log.clone();
    window
        .callbacks()
        .unwrap()
        .key
        .add(move |event: &KeyEvent| {
            // Subscribed after the input trackers, so they have seen the key.
            let tracked = input.keyboard.is_pressed(event.key);
            probe.lock().push(format!("user:{tracked}"));
        });

    backend.push_event(KeyEvent {
        window: handle,
        key: keys::A,
        scancode: 0,
        action: Action::Press,
        modifiers: Modifiers::SHIFT,
    });
    assert!(wait_for(|| log.lock().iter().any(|entry| entry.starts_with("user"))));

    let keyed: Vec<String> = log
        .lock()
        .iter()
        .filter(|entry| !matches!(entry.as_str(), "initialize" | "update"))
        .cloned()
        .collect();
    assert_eq!(keyed, vec!["native", "kind", "user:true"]);
    assert_eq!(toolkit.input().keyboard.modifiers(), Modifiers::SHIFT);

    toolkit.shutdown();
}

#[test]
fn test_callbacks_of_a_failed_window_report_the_failure() {
    let (backend, toolkit) = setup();
    backend.fail_window_creation(true);
    let window = toolkit.create_window(WindowRequest::new().id("broken"));
    assert!(window.callbacks().is_err());
    window.join();
}
