//! In-memory backend that records what the toolkit asks of it.
//!
//! Used by tests and tooling. Events are injected with [`push_event`] from
//! any thread and delivered by the next `poll_events` of the window they
//! belong to, on that window's thread, exactly like a real event pump.
//!
//! [`push_event`]: RecordingBackend::push_event

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::callback::{
    CloseEvent, FocusEvent, FramebufferSizeEvent, IconifyEvent, MaximizeEvent, NativeEvent,
    SizeEvent, WindowCallbacks,
};
use crate::types::{Rect, Rgba};

use super::{NativeBackend, NativeHandle, Surface, SurfaceInfo, WindowAttribute, WindowHints};

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    FillRect { rect: Rect, color: Rgba, radius: f32 },
}

#[derive(Default)]
struct RecordedWindow {
    hints: Option<WindowHints>,
    title: String,
    size: (i32, i32),
    swap_interval: i32,
    attributes: HashMap<WindowAttribute, bool>,
    should_close: bool,
    callbacks: Option<Arc<WindowCallbacks>>,
    pending: VecDeque<NativeEvent>,
    frames: u64,
    swaps: u64,
    last_frame: Vec<DrawCommand>,
    destroyed: bool,
}

impl RecordedWindow {
    fn set_attribute(&mut self, handle: NativeHandle, attribute: WindowAttribute, value: bool) {
        let previous = self.attributes.insert(attribute, value).unwrap_or(false);
        if previous == value {
            return;
        }
        let event = match attribute {
            WindowAttribute::Iconified => Some(NativeEvent::Iconify(IconifyEvent {
                window: handle,
                iconified: value,
            })),
            WindowAttribute::Maximized => Some(NativeEvent::Maximize(MaximizeEvent {
                window: handle,
                maximized: value,
            })),
            WindowAttribute::Focused => Some(NativeEvent::Focus(FocusEvent {
                window: handle,
                focused: value,
            })),
            _ => None,
        };
        self.pending.extend(event);
    }
}

struct RecordingInner {
    next_handle: AtomicU64,
    windows: Mutex<HashMap<NativeHandle, RecordedWindow>>,
    frame_delay: Duration,
    fail_windows: AtomicBool,
    fail_surfaces: AtomicBool,
    native_callbacks: Mutex<Option<Arc<WindowCallbacks>>>,
    stale_calls: AtomicU64,
}

impl RecordingInner {
    fn check_alive(&self, window: &RecordedWindow, handle: NativeHandle) {
        if window.destroyed {
            self.stale_calls.fetch_add(1, Ordering::AcqRel);
            warn!("Recording window {} used after it was destroyed", handle);
        }
    }
}

/// Recording backend. Clones share the same recorded state.
#[derive(Clone)]
pub struct RecordingBackend {
    inner: Arc<RecordingInner>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Backend pacing each loop iteration at about 1ms.
    pub fn new() -> Self {
        Self::with_frame_delay(Duration::from_millis(1))
    }

    /// Backend sleeping `frame_delay` in every `poll_events`.
    pub fn with_frame_delay(frame_delay: Duration) -> Self {
        Self {
            inner: Arc::new(RecordingInner {
                next_handle: AtomicU64::new(1),
                windows: Mutex::new(HashMap::new()),
                frame_delay,
                fail_windows: AtomicBool::new(false),
                fail_surfaces: AtomicBool::new(false),
                native_callbacks: Mutex::new(None),
                stale_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Make `create_window` return the null handle.
    pub fn fail_window_creation(&self, fail: bool) {
        self.inner.fail_windows.store(fail, Ordering::Release);
    }

    /// Make `create_surface` return no surface.
    pub fn fail_surface_creation(&self, fail: bool) {
        self.inner.fail_surfaces.store(fail, Ordering::Release);
    }

    /// Callbacks every new window starts with. Returned as the previous
    /// callbacks when the toolkit installs its own.
    pub fn set_native_callbacks(&self, callbacks: Arc<WindowCallbacks>) {
        *self.inner.native_callbacks.lock() = Some(callbacks);
    }

    /// Queue an event for the window it names. False if there is no such
    /// live window.
    pub fn push_event(&self, event: impl Into<NativeEvent>) -> bool {
        let event = event.into();
        let mut windows = self.inner.windows.lock();
        match windows.get_mut(&event.window()) {
            Some(window) if !window.destroyed => {
                window.pending.push_back(event);
                true
            }
            _ => false,
        }
    }

    /// Act like the user clicking the close button: set the close flag and
    /// queue a close event.
    pub fn request_close(&self, handle: NativeHandle) -> bool {
        let mut windows = self.inner.windows.lock();
        match windows.get_mut(&handle) {
            Some(window) if !window.destroyed => {
                window.should_close = true;
                window.pending.push_back(NativeEvent::Close(CloseEvent { window: handle }));
                true
            }
            _ => false,
        }
    }

    fn read<T>(&self, handle: NativeHandle, read: impl FnOnce(&RecordedWindow) -> T) -> Option<T> {
        self.inner.windows.lock().get(&handle).map(read)
    }

    /// Handles of every window ever created, sorted.
    pub fn handles(&self) -> Vec<NativeHandle> {
        let mut handles: Vec<_> = self.inner.windows.lock().keys().copied().collect();
        handles.sort();
        handles
    }

    /// Number of windows created and not destroyed.
    pub fn live_windows(&self) -> usize {
        self.inner.windows.lock().values().filter(|w| !w.destroyed).count()
    }

    pub fn is_destroyed(&self, handle: NativeHandle) -> bool {
        self.read(handle, |w| w.destroyed).unwrap_or(false)
    }

    pub fn hints(&self, handle: NativeHandle) -> Option<WindowHints> {
        self.read(handle, |w| w.hints.clone()).flatten()
    }

    pub fn title(&self, handle: NativeHandle) -> Option<String> {
        self.read(handle, |w| w.title.clone())
    }

    pub fn swap_interval(&self, handle: NativeHandle) -> Option<i32> {
        self.read(handle, |w| w.swap_interval)
    }

    /// Frames ended on the window's surface.
    pub fn frames(&self, handle: NativeHandle) -> u64 {
        self.read(handle, |w| w.frames).unwrap_or(0)
    }

    /// Buffer swaps of the window.
    pub fn swaps(&self, handle: NativeHandle) -> u64 {
        self.read(handle, |w| w.swaps).unwrap_or(0)
    }

    /// Draw commands of the last ended frame.
    pub fn last_frame(&self, handle: NativeHandle) -> Vec<DrawCommand> {
        self.read(handle, |w| w.last_frame.clone()).unwrap_or_default()
    }

    /// Attribute reads and close flags sent to already destroyed windows.
    pub fn stale_calls(&self) -> u64 {
        self.inner.stale_calls.load(Ordering::Acquire)
    }
}

// =============================================================================
// Surface
// =============================================================================

struct RecordingSurface {
    handle: NativeHandle,
    inner: Arc<RecordingInner>,
    commands: Vec<DrawCommand>,
}

impl Surface for RecordingSurface {
    fn info(&self) -> SurfaceInfo {
        SurfaceInfo {
            renderer: "recording".to_string(),
            vendor: "spark-gui".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn begin_frame(&mut self, _width: i32, _height: i32) {
        self.commands.clear();
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba, radius: f32) {
        self.commands.push(DrawCommand::FillRect { rect, color, radius });
    }

    fn end_frame(&mut self) {
        let mut windows = self.inner.windows.lock();
        if let Some(window) = windows.get_mut(&self.handle) {
            window.frames += 1;
            window.last_frame = std::mem::take(&mut self.commands);
        }
    }
}

// =============================================================================
// Backend
// =============================================================================

impl NativeBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_window(&self, hints: &WindowHints) -> Option<NativeHandle> {
        if self.inner.fail_windows.load(Ordering::Acquire) {
            return None;
        }
        let handle = NativeHandle::new(self.inner.next_handle.fetch_add(1, Ordering::AcqRel))?;

        let mut attributes = HashMap::new();
        attributes.insert(WindowAttribute::Visible, hints.visible);
        attributes.insert(WindowAttribute::Resizable, hints.resizable);

        let window = RecordedWindow {
            hints: Some(hints.clone()),
            title: hints.title.clone(),
            size: (hints.width, hints.height),
            attributes,
            callbacks: self.inner.native_callbacks.lock().clone(),
            ..RecordedWindow::default()
        };
        self.inner.windows.lock().insert(handle, window);
        debug!("Recording window {} created", handle);
        Some(handle)
    }

    fn destroy_window(&self, handle: NativeHandle) {
        if let Some(window) = self.inner.windows.lock().get_mut(&handle) {
            window.destroyed = true;
            window.callbacks = None;
            window.pending.clear();
        }
    }

    fn create_surface(&self, handle: NativeHandle) -> Option<Box<dyn Surface>> {
        if self.inner.fail_surfaces.load(Ordering::Acquire) {
            return None;
        }
        Some(Box::new(RecordingSurface {
            handle,
            inner: self.inner.clone(),
            commands: Vec::new(),
        }))
    }

    fn install_callbacks(
        &self,
        handle: NativeHandle,
        callbacks: Arc<WindowCallbacks>,
    ) -> Option<Arc<WindowCallbacks>> {
        let mut windows = self.inner.windows.lock();
        let window = windows.get_mut(&handle)?;
        window.callbacks.replace(callbacks)
    }

    fn poll_events(&self, handle: NativeHandle) {
        if !self.inner.frame_delay.is_zero() {
            thread::sleep(self.inner.frame_delay);
        }

        let (events, callbacks) = {
            let mut windows = self.inner.windows.lock();
            match windows.get_mut(&handle) {
                Some(window) => (std::mem::take(&mut window.pending), window.callbacks.clone()),
                None => return,
            }
        };

        if let Some(callbacks) = callbacks {
            for event in &events {
                callbacks.dispatch(event);
            }
        }
    }

    fn swap_buffers(&self, handle: NativeHandle) {
        if let Some(window) = self.inner.windows.lock().get_mut(&handle) {
            window.swaps += 1;
        }
    }

    fn set_swap_interval(&self, handle: NativeHandle, interval: i32) {
        if let Some(window) = self.inner.windows.lock().get_mut(&handle) {
            window.swap_interval = interval;
        }
    }

    fn should_close(&self, handle: NativeHandle) -> bool {
        self.read(handle, |w| w.should_close).unwrap_or(true)
    }

    fn set_should_close(&self, handle: NativeHandle, value: bool) {
        if let Some(window) = self.inner.windows.lock().get_mut(&handle) {
            self.inner.check_alive(window, handle);
            window.should_close = value;
        }
    }

    fn attribute(&self, handle: NativeHandle, attribute: WindowAttribute) -> bool {
        self.read(handle, |w| {
            self.inner.check_alive(w, handle);
            w.attributes.get(&attribute).copied().unwrap_or(false)
        })
        .unwrap_or(false)
    }

    fn set_attribute(&self, handle: NativeHandle, attribute: WindowAttribute, value: bool) {
        if let Some(window) = self.inner.windows.lock().get_mut(&handle) {
            window.set_attribute(handle, attribute, value);
        }
    }

    fn restore(&self, handle: NativeHandle) {
        if let Some(window) = self.inner.windows.lock().get_mut(&handle) {
            window.set_attribute(handle, WindowAttribute::Iconified, false);
            window.set_attribute(handle, WindowAttribute::Maximized, false);
        }
    }

    fn set_title(&self, handle: NativeHandle, title: &str) {
        if let Some(window) = self.inner.windows.lock().get_mut(&handle) {
            window.title = title.to_string();
        }
    }

    fn set_size(&self, handle: NativeHandle, width: i32, height: i32) {
        if let Some(window) = self.inner.windows.lock().get_mut(&handle) {
            window.size = (width, height);
            window.pending.push_back(NativeEvent::Size(SizeEvent {
                window: handle,
                width,
                height,
            }));
            window.pending.push_back(NativeEvent::FramebufferSize(FramebufferSizeEvent {
                window: handle,
                width,
                height,
            }));
        }
    }

    fn size(&self, handle: NativeHandle) -> (i32, i32) {
        self.read(handle, |w| w.size).unwrap_or((0, 0))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (RecordingBackend, NativeHandle) {
        let backend = RecordingBackend::with_frame_delay(Duration::ZERO);
        let hints = WindowHints {
            title: "test".to_string(),
            width: 640,
            height: 480,
            resizable: true,
            visible: true,
            context_version: (4, 6),
        };
        let handle = backend.create_window(&hints).unwrap();
        (backend, handle)
    }

    #[test]
    fn test_install_returns_previous_callbacks() {
        let backend = RecordingBackend::with_frame_delay(Duration::ZERO);
        let native = Arc::new(WindowCallbacks::new());
        backend.set_native_callbacks(native.clone());
        let handle = backend.create_window(&WindowHints {
            title: String::new(),
            width: 1,
            height: 1,
            resizable: false,
            visible: false,
            context_version: (3, 3),
        });
        let handle = handle.unwrap();

        let previous = backend.install_callbacks(handle, Arc::new(WindowCallbacks::new()));
        assert!(Arc::ptr_eq(&previous.unwrap(), &native));
        assert!(!backend.attribute(handle, WindowAttribute::Visible));
    }

    #[test]
    fn test_events_are_delivered_on_poll() {
        let (backend, handle) = setup();
        let callbacks = Arc::new(WindowCallbacks::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        callbacks.size.add(move |e| seen_clone.lock().push((e.width, e.height)));
        backend.install_callbacks(handle, callbacks);

        backend.set_size(handle, 100, 50);
        assert!(seen.lock().is_empty());

        backend.poll_events(handle);
        assert_eq!(*seen.lock(), vec![(100, 50)]);
        assert_eq!(backend.size(handle), (100, 50));
    }

    #[test]
    fn test_attribute_changes_queue_events() {
        let (backend, handle) = setup();
        let callbacks = Arc::new(WindowCallbacks::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        callbacks.iconify.add(move |e| seen_clone.lock().push(e.iconified));
        backend.install_callbacks(handle, callbacks);

        backend.set_attribute(handle, WindowAttribute::Iconified, true);
        backend.set_attribute(handle, WindowAttribute::Iconified, true);
        backend.restore(handle);
        backend.poll_events(handle);

        assert_eq!(*seen.lock(), vec![true, false]);
        assert!(!backend.attribute(handle, WindowAttribute::Iconified));
    }

    #[test]
    fn test_surface_records_last_frame() {
        let (backend, handle) = setup();
        let mut surface = backend.create_surface(handle).unwrap();

        surface.begin_frame(640, 480);
        surface.clear(Rgba::WHITE);
        surface.fill_rect(Rect::new(1, 2, 3, 4), Rgba::RED, 0.0);
        surface.end_frame();

        assert_eq!(backend.frames(handle), 1);
        assert_eq!(
            backend.last_frame(handle),
            vec![
                DrawCommand::Clear(Rgba::WHITE),
                DrawCommand::FillRect { rect: Rect::new(1, 2, 3, 4), color: Rgba::RED, radius: 0.0 },
            ]
        );
    }

    #[test]
    fn test_failures_and_close() {
        let (backend, handle) = setup();
        backend.fail_surface_creation(true);
        assert!(backend.create_surface(handle).is_none());

        assert!(!backend.should_close(handle));
        assert!(backend.request_close(handle));
        assert!(backend.should_close(handle));

        backend.destroy_window(handle);
        assert!(backend.is_destroyed(handle));
        assert!(!backend.push_event(CloseEvent { window: handle }));

        backend.fail_window_creation(true);
        assert!(backend.create_window(&WindowHints {
            title: String::new(),
            width: 1,
            height: 1,
            resizable: true,
            visible: true,
            context_version: (4, 6),
        })
        .is_none());
    }
}
