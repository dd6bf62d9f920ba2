//! Window thread: build → initialize → loop → destroy.

use std::sync::atomic::Ordering;
use std::thread;

use log::{debug, error, info, warn};

use crate::backend::{NativeHandle, Surface, WindowAttribute, WindowHints};
use crate::error::ErrorKind;
use crate::renderer::{BackgroundRenderer, RenderQueue, RendererState};
use crate::toolkit::LifecycleEvent;

use super::Window;

/// Where a window is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Created; the thread has not started (or was refused).
    Constructed,
    /// The thread is building the native window.
    Building,
    /// Built; the loop is running.
    Running,
    /// The destroy phase has completed.
    Destroyed,
    /// The build phase failed.
    Failed,
}

/// Native resources owned by the window thread.
struct NativeWindow {
    handle: NativeHandle,
    surface: Box<dyn Surface>,
    queue: RenderQueue,
}

// =============================================================================
// Start
// =============================================================================

pub(super) fn start(window: &Window) {
    let context = &window.shared.context;
    let max = context.options.max_window_threads;

    let admitted = context
        .threads
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |running| {
            (running < max).then_some(running + 1)
        })
        .is_ok();
    if !admitted {
        warn!(
            "Window `{}` is not started: {} window threads are already running",
            window.name(),
            max
        );
        context.errors.handle(ErrorKind::ThreadLimitReached);
        window.shared.gate.resolve(Err(ErrorKind::ThreadLimitReached));
        return;
    }

    let thread_window = window.clone();
    let spawned = thread::Builder::new()
        .name(format!("window-{}", window.name()))
        .spawn(move || run(thread_window));

    match spawned {
        Ok(handle) => *window.shared.thread.lock() = Some(handle),
        Err(err) => {
            context.threads.fetch_sub(1, Ordering::AcqRel);
            error!("Could not spawn the thread of window `{}`: {}", window.name(), err);
            window.shared.gate.resolve(Err(ErrorKind::Unknown));
        }
    }
}

// =============================================================================
// Thread Body
// =============================================================================

/// Releases the thread slot and the registry entry however the thread ends.
struct ThreadGuard {
    window: Window,
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        let window = &self.window;
        let context = &window.shared.context;

        if window.shared.gate.resolve(Err(ErrorKind::Unknown)) {
            error!("Window `{}` stopped before it was built", window.name());
        }
        if thread::panicking() {
            error!("Window thread of `{}` panicked", window.name());
            if window.lifecycle() != Lifecycle::Destroyed {
                window.set_lifecycle(Lifecycle::Failed);
            }
        }

        context.threads.fetch_sub(1, Ordering::AcqRel);
        if let Some(toolkit) = context.toolkit() {
            toolkit.shared.windows.retain(|entry| !entry.ptr_eq(window));
        }

        if window.lifecycle() == Lifecycle::Destroyed {
            context.emit(LifecycleEvent::WindowDestroyed {
                window: window.name().to_string(),
            });
        }
    }
}

fn run(window: Window) {
    let _guard = ThreadGuard {
        window: window.clone(),
    };
    let _ = window.shared.thread_id.set(thread::current().id());
    let context = &window.shared.context;

    window.set_lifecycle(Lifecycle::Building);
    let mut native = match build(&window) {
        Ok(native) => native,
        Err(kind) => {
            error!("Window `{}` failed to build: {}", window.name(), kind);
            window.set_lifecycle(Lifecycle::Failed);
            window.shared.gate.resolve(Err(kind));
            context.emit(LifecycleEvent::BuildFailed {
                window: window.name().to_string(),
                kind,
            });
            context.errors.handle(kind);
            return;
        }
    };

    window.set_lifecycle(Lifecycle::Running);
    *window.shared.native_alive.write() = true;
    window.shared.gate.resolve(Ok(native.handle));
    info!("Window `{}` built ({})", window.name(), native.handle);
    context.emit(LifecycleEvent::WindowBuilt {
        window: window.name().to_string(),
        handle: native.handle,
    });

    window.shared.kind.initialize(&window);
    run_loop(&window, &mut native);
    destroy(&window, native);
}

// =============================================================================
// Build
// =============================================================================

fn build(window: &Window) -> std::result::Result<NativeWindow, ErrorKind> {
    let shared = &window.shared;
    let context = &shared.context;
    let backend = &context.backend;

    let (width, height) = *shared.size.read();
    let hints = WindowHints {
        title: shared.title.read().clone(),
        width,
        height,
        resizable: context.options.resizable,
        visible: true,
        context_version: context.options.context_version,
    };

    let handle = backend
        .create_window(&hints)
        .ok_or(ErrorKind::WindowGenerationFailed)?;
    backend.make_context_current(handle);
    install_callbacks(window, handle);

    let Some(surface) = backend.create_surface(handle) else {
        backend.destroy_window(handle);
        return Err(ErrorKind::ContextMissing);
    };

    let info = surface.info();
    info!("Renderer: {}", info.renderer);
    info!("Vendor: {}", info.vendor);
    info!("Version: {}", info.version);

    backend.set_swap_interval(handle, i32::from(shared.vsync.load(Ordering::Acquire)));
    *shared.size.write() = backend.size(handle);

    if context.options.default_renderers {
        let state = RendererState::with_registry(&context.renderer_names, BackgroundRenderer::DEFAULT_NAME);
        window.add_renderer(BackgroundRenderer::from_state(state));
    }

    Ok(NativeWindow {
        handle,
        surface,
        queue: RenderQueue::new(),
    })
}

/// Subscribe, in order: the previously installed native callbacks, the
/// window's own hooks, the shared input trackers.
fn install_callbacks(window: &Window, handle: NativeHandle) {
    let shared = &window.shared;
    let callbacks = &shared.callbacks;

    if let Some(previous) = shared.context.backend.install_callbacks(handle, callbacks.clone()) {
        callbacks.chain(&previous);
    }
    install_hooks(window);
    shared.context.input.attach(callbacks);
    debug!(
        "Window `{}` has {} callback subscribers",
        window.name(),
        callbacks.subscriber_count()
    );
}

macro_rules! forward_hook {
    ($window:expr, $slot:ident => $hook:ident) => {{
        let weak = $window.downgrade();
        $window.shared.callbacks.$slot.add(move |event| {
            if let Some(window) = weak.upgrade() {
                window.shared.kind.$hook(&window, event);
            }
        });
    }};
}

fn install_hooks(window: &Window) {
    let callbacks = &window.shared.callbacks;

    let weak = window.downgrade();
    callbacks.framebuffer_size.add(move |event| {
        if let Some(window) = weak.upgrade() {
            *window.shared.size.write() = (event.width.max(0), event.height.max(0));
            window.shared.kind.on_framebuffer_size(&window, event);
        }
    });

    let weak = window.downgrade();
    callbacks.close.add(move |event| {
        if let Some(window) = weak.upgrade() {
            window.shared.context.emit(LifecycleEvent::CloseRequested {
                window: window.name().to_string(),
            });
            window.shared.kind.on_close(&window, event);
        }
    });

    forward_hook!(window, size => on_size);
    forward_hook!(window, position => on_position);
    forward_hook!(window, refresh => on_refresh);
    forward_hook!(window, focus => on_focus);
    forward_hook!(window, iconify => on_iconify);
    forward_hook!(window, maximize => on_maximize);
    forward_hook!(window, key => on_key);
    forward_hook!(window, char => on_char);
    forward_hook!(window, char_mods => on_char_mods);
    forward_hook!(window, mouse_button => on_mouse_button);
    forward_hook!(window, cursor_position => on_cursor_position);
    forward_hook!(window, cursor_enter => on_cursor_enter);
    forward_hook!(window, scroll => on_scroll);
}

// =============================================================================
// Loop
// =============================================================================

fn should_exit(window: &Window, handle: NativeHandle) -> bool {
    window.shared.close_requested.load(Ordering::Acquire)
        || window.shared.context.backend.should_close(handle)
}

fn run_loop(window: &Window, native: &mut NativeWindow) {
    let shared = &window.shared;
    let context = &shared.context;
    let backend = &context.backend;
    let handle = native.handle;

    loop {
        backend.poll_events(handle);
        window.apply_pending(handle);
        if should_exit(window, handle) {
            break;
        }

        shared.kind.update(window);

        let iconified = backend.attribute(handle, WindowAttribute::Iconified);
        if !iconified || context.options.render_while_iconified {
            // Built outside the renderer lock: attach listeners may call back into the window.
            native.queue.rebuild(&window.components(), &window.downgrade());
            native.queue.update_layouts();
            *shared.queued.write() = native.queue.names();

            let (width, height) = *shared.size.read();
            let number = shared.frames.load(Ordering::Acquire);
            let surface = native.surface.as_mut();

            surface.begin_frame(width, height);
            surface.clear(window.background());
            let report = shared.pipeline.lock().run_frame(window, &native.queue, surface, number);
            surface.end_frame();

            for renderer in report.initialized {
                context.emit(LifecycleEvent::RendererInitialized {
                    window: window.name().to_string(),
                    renderer,
                });
            }
            shared.frames.fetch_add(1, Ordering::AcqRel);
        }

        backend.swap_buffers(handle);
    }
    debug!("Window `{}` left its loop", window.name());
}

// =============================================================================
// Destroy
// =============================================================================

fn destroy(window: &Window, native: NativeWindow) {
    let backend = &window.shared.context.backend;

    window.shared.kind.destroy(window);
    window.remove_all_renderers();

    let NativeWindow { handle, surface, .. } = native;
    drop(surface);
    {
        let mut alive = window.shared.native_alive.write();
        *alive = false;
        backend.destroy_window(handle);
    }

    window.set_lifecycle(Lifecycle::Destroyed);
    info!("Window `{}` destroyed", window.name());
}

