//! Terminal backend: one window drawn on the terminal's alternate screen.
//!
//! Each terminal cell stands for `cell_size` window pixels. Frames are
//! presented by diffing against the previous frame and only repainting the
//! cells that changed, written to stdout in a single flush.
//!
//! Input comes from crossterm and is translated into native events:
//! keys (with char events for printable input), mouse buttons, motion and
//! wheel, resize and focus. Ctrl+C requests close.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
    Event as TermEvent, KeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers,
    MouseButton as TermMouseButton, MouseEvent as TermMouseEvent, MouseEventKind,
};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetSize, SetTitle};
use crossterm::{execute, queue};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::callback::{
    CharEvent, CharModsEvent, CloseEvent, CursorPositionEvent, FocusEvent, FramebufferSizeEvent,
    KeyEvent, MouseButtonEvent, NativeEvent, RefreshEvent, ScrollEvent, SizeEvent, WindowCallbacks,
};
use crate::input::{Action, Modifiers, Mouse, keys};
use crate::types::{Rect, Rgba};

use super::{NativeBackend, NativeHandle, Surface, SurfaceInfo, WindowAttribute, WindowHints};

// =============================================================================
// Terminal Window
// =============================================================================

struct TerminalWindow {
    handle: NativeHandle,
    should_close: bool,
    swap_interval: i32,
    size: (i32, i32),
    attributes: HashMap<WindowAttribute, bool>,
    callbacks: Option<Arc<WindowCallbacks>>,
}

/// Backend driving the current terminal.
pub struct TerminalBackend {
    cell_size: (i32, i32),
    poll_timeout: Duration,
    next_handle: AtomicU64,
    window: Mutex<Option<TerminalWindow>>,
}

impl Default for TerminalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend {
    /// 8x16 pixel cells, 16ms input timeout.
    pub fn new() -> Self {
        Self::with_cell_size(8, 16)
    }

    pub fn with_cell_size(width: i32, height: i32) -> Self {
        Self {
            cell_size: (width.max(1), height.max(1)),
            poll_timeout: Duration::from_millis(16),
            next_handle: AtomicU64::new(1),
            window: Mutex::new(None),
        }
    }

    /// How long `poll_events` waits for the first event.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn cell_size(&self) -> (i32, i32) {
        self.cell_size
    }

    fn pixels(&self, columns: u16, rows: u16) -> (i32, i32) {
        (i32::from(columns) * self.cell_size.0, i32::from(rows) * self.cell_size.1)
    }

    fn with_window<T>(&self, handle: NativeHandle, f: impl FnOnce(&mut TerminalWindow) -> T) -> Option<T> {
        let mut slot = self.window.lock();
        match slot.as_mut() {
            Some(window) if window.handle == handle => Some(f(window)),
            _ => None,
        }
    }

    /// Translate one crossterm event, updating window state on the way.
    fn translate(&self, handle: NativeHandle, event: TermEvent) -> Vec<NativeEvent> {
        match event {
            TermEvent::Key(key) => {
                let events = translate_key(handle, key);
                if is_interrupt(&key) {
                    self.with_window(handle, |window| window.should_close = true);
                }
                events
            }
            TermEvent::Mouse(mouse) => translate_mouse(handle, mouse, self.cell_size),
            TermEvent::Resize(columns, rows) => {
                let (width, height) = self.pixels(columns, rows);
                self.with_window(handle, |window| window.size = (width, height));
                vec![
                    NativeEvent::Size(SizeEvent { window: handle, width, height }),
                    NativeEvent::FramebufferSize(FramebufferSizeEvent { window: handle, width, height }),
                    NativeEvent::Refresh(RefreshEvent { window: handle }),
                ]
            }
            TermEvent::FocusGained | TermEvent::FocusLost => {
                let focused = matches!(event, TermEvent::FocusGained);
                self.with_window(handle, |window| {
                    window.attributes.insert(WindowAttribute::Focused, focused);
                });
                vec![NativeEvent::Focus(FocusEvent { window: handle, focused })]
            }
            _ => Vec::new(),
        }
    }
}

impl Drop for TerminalBackend {
    fn drop(&mut self) {
        if self.window.get_mut().take().is_some() {
            if let Err(err) = leave_terminal() {
                warn!("Could not restore the terminal: {err}");
            }
        }
    }
}

fn enter_terminal(title: &str) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(
        io::stdout(),
        EnterAlternateScreen,
        Hide,
        EnableMouseCapture,
        EnableFocusChange,
        SetTitle(title)
    )
}

fn leave_terminal() -> io::Result<()> {
    execute!(
        io::stdout(),
        DisableFocusChange,
        DisableMouseCapture,
        ResetColor,
        Show,
        LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()
}

// =============================================================================
// Event Conversion
// =============================================================================

fn is_interrupt(key: &TermKeyEvent) -> bool {
    key.code == KeyCode::Char('c')
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && key.kind != KeyEventKind::Release
}

fn convert_modifiers(modifiers: KeyModifiers) -> Modifiers {
    let mut out = Modifiers::empty();
    if modifiers.contains(KeyModifiers::SHIFT) {
        out |= Modifiers::SHIFT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        out |= Modifiers::CONTROL;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        out |= Modifiers::ALT;
    }
    if modifiers.contains(KeyModifiers::SUPER) {
        out |= Modifiers::SUPER;
    }
    out
}

fn convert_action(kind: KeyEventKind) -> Action {
    match kind {
        KeyEventKind::Press => Action::Press,
        KeyEventKind::Repeat => Action::Repeat,
        KeyEventKind::Release => Action::Release,
    }
}

fn convert_key_code(code: KeyCode) -> i32 {
    match code {
        KeyCode::Char(c) => keys::from_char(c),
        KeyCode::Enter => keys::ENTER,
        KeyCode::Tab | KeyCode::BackTab => keys::TAB,
        KeyCode::Backspace => keys::BACKSPACE,
        KeyCode::Delete => keys::DELETE,
        KeyCode::Insert => keys::INSERT,
        KeyCode::Esc => keys::ESCAPE,
        KeyCode::Left => keys::LEFT,
        KeyCode::Right => keys::RIGHT,
        KeyCode::Up => keys::UP,
        KeyCode::Down => keys::DOWN,
        KeyCode::Home => keys::HOME,
        KeyCode::End => keys::END,
        KeyCode::PageUp => keys::PAGE_UP,
        KeyCode::PageDown => keys::PAGE_DOWN,
        KeyCode::F(n) => keys::function(n),
        KeyCode::CapsLock => keys::CAPS_LOCK,
        KeyCode::ScrollLock => keys::SCROLL_LOCK,
        KeyCode::NumLock => keys::NUM_LOCK,
        KeyCode::PrintScreen => keys::PRINT_SCREEN,
        KeyCode::Pause => keys::PAUSE,
        KeyCode::Menu => keys::MENU,
        _ => keys::UNKNOWN,
    }
}

fn translate_key(handle: NativeHandle, key: TermKeyEvent) -> Vec<NativeEvent> {
    let modifiers = convert_modifiers(key.modifiers);
    let action = convert_action(key.kind);
    let mut events = vec![NativeEvent::Key(KeyEvent {
        window: handle,
        key: convert_key_code(key.code),
        scancode: 0,
        action,
        modifiers,
    })];

    let typed = action.is_down() && !modifiers.intersects(Modifiers::CONTROL | Modifiers::ALT);
    if let (KeyCode::Char(codepoint), true) = (key.code, typed) {
        events.push(NativeEvent::Char(CharEvent { window: handle, codepoint }));
        events.push(NativeEvent::CharMods(CharModsEvent {
            window: handle,
            codepoint,
            modifiers,
        }));
    }
    if is_interrupt(&key) {
        events.push(NativeEvent::Close(CloseEvent { window: handle }));
    }
    events
}

fn convert_button(button: TermMouseButton) -> i32 {
    match button {
        TermMouseButton::Left => Mouse::LEFT,
        TermMouseButton::Right => Mouse::RIGHT,
        TermMouseButton::Middle => Mouse::MIDDLE,
    }
}

fn translate_mouse(handle: NativeHandle, mouse: TermMouseEvent, cell_size: (i32, i32)) -> Vec<NativeEvent> {
    let cursor = NativeEvent::CursorPosition(CursorPositionEvent {
        window: handle,
        x: f64::from(i32::from(mouse.column) * cell_size.0),
        y: f64::from(i32::from(mouse.row) * cell_size.1),
    });
    let modifiers = convert_modifiers(mouse.modifiers);
    let button = |button, action| {
        NativeEvent::MouseButton(MouseButtonEvent {
            window: handle,
            button: convert_button(button),
            action,
            modifiers,
        })
    };
    let scroll = |x_offset, y_offset| NativeEvent::Scroll(ScrollEvent { window: handle, x_offset, y_offset });

    match mouse.kind {
        MouseEventKind::Down(pressed) => vec![cursor, button(pressed, Action::Press)],
        MouseEventKind::Up(released) => vec![cursor, button(released, Action::Release)],
        MouseEventKind::Drag(_) | MouseEventKind::Moved => vec![cursor],
        MouseEventKind::ScrollUp => vec![scroll(0.0, 1.0)],
        MouseEventKind::ScrollDown => vec![scroll(0.0, -1.0)],
        MouseEventKind::ScrollLeft => vec![scroll(-1.0, 0.0)],
        MouseEventKind::ScrollRight => vec![scroll(1.0, 0.0)],
    }
}

// =============================================================================
// Surface
// =============================================================================

/// Cells covered by `rect`: (first column, first row, end column, end row),
/// clipped to the grid. Partially covered cells count.
fn cell_span(rect: Rect, cell_size: (i32, i32), columns: i32, rows: i32) -> (i32, i32, i32, i32) {
    let (cw, ch) = cell_size;
    let x0 = rect.x.div_euclid(cw).clamp(0, columns);
    let y0 = rect.y.div_euclid(ch).clamp(0, rows);
    let x1 = (rect.right() + cw - 1).div_euclid(cw).clamp(0, columns);
    let y1 = (rect.bottom() + ch - 1).div_euclid(ch).clamp(0, rows);
    (x0, y0, x1, y1)
}

struct TerminalSurface {
    cell_size: (i32, i32),
    columns: i32,
    rows: i32,
    back: Vec<Rgba>,
    front: Option<Vec<Rgba>>,
    output: Vec<u8>,
}

impl TerminalSurface {
    fn present(&mut self) -> io::Result<()> {
        self.output.clear();
        for row in 0..self.rows {
            for column in 0..self.columns {
                let index = (row * self.columns + column) as usize;
                let color = self.back[index];
                let changed = match &self.front {
                    Some(front) => front[index] != color,
                    None => true,
                };
                if !changed {
                    continue;
                }
                queue!(
                    self.output,
                    MoveTo(column as u16, row as u16),
                    SetBackgroundColor(Color::Rgb { r: color.r, g: color.g, b: color.b }),
                    Print(' ')
                )?;
            }
        }

        if !self.output.is_empty() {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&self.output)?;
            stdout.flush()?;
        }
        self.front = Some(self.back.clone());
        Ok(())
    }
}

impl Surface for TerminalSurface {
    fn info(&self) -> SurfaceInfo {
        SurfaceInfo {
            renderer: "terminal cells".to_string(),
            vendor: "crossterm".to_string(),
            version: format!("{}x{} px per cell", self.cell_size.0, self.cell_size.1),
        }
    }

    fn begin_frame(&mut self, width: i32, height: i32) {
        let columns = (width / self.cell_size.0).max(0);
        let rows = (height / self.cell_size.1).max(0);
        if (columns, rows) != (self.columns, self.rows) {
            self.columns = columns;
            self.rows = rows;
            self.front = None;
        }
        self.back = vec![Rgba::BLACK; (columns * rows) as usize];
    }

    fn clear(&mut self, color: Rgba) {
        self.back.fill(color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba, radius: f32) {
        let (x0, y0, x1, y1) = cell_span(rect, self.cell_size, self.columns, self.rows);
        let round = radius >= self.cell_size.0.min(self.cell_size.1) as f32 && x1 - x0 >= 2 && y1 - y0 >= 2;

        for row in y0..y1 {
            for column in x0..x1 {
                let corner = (column == x0 || column == x1 - 1) && (row == y0 || row == y1 - 1);
                if round && corner {
                    continue;
                }
                let index = (row * self.columns + column) as usize;
                self.back[index] = Rgba::blend(color, self.back[index]);
            }
        }
    }

    fn end_frame(&mut self) {
        if let Err(err) = self.present() {
            warn!("Could not present a terminal frame: {err}");
            self.front = None;
        }
    }
}

// =============================================================================
// Backend
// =============================================================================

impl NativeBackend for TerminalBackend {
    fn name(&self) -> &str {
        "terminal"
    }

    fn create_window(&self, hints: &WindowHints) -> Option<NativeHandle> {
        let mut slot = self.window.lock();
        if slot.is_some() {
            warn!("The terminal already hosts a window");
            return None;
        }

        if let Err(err) = enter_terminal(&hints.title) {
            warn!("Could not set up the terminal: {err}");
            let _ = leave_terminal();
            return None;
        }
        let (columns, rows) = match terminal::size() {
            Ok(size) => size,
            Err(err) => {
                warn!("Could not read the terminal size: {err}");
                let _ = leave_terminal();
                return None;
            }
        };

        let handle = NativeHandle::new(self.next_handle.fetch_add(1, Ordering::AcqRel))?;
        let mut attributes = HashMap::new();
        attributes.insert(WindowAttribute::Visible, true);
        attributes.insert(WindowAttribute::Focused, true);
        attributes.insert(WindowAttribute::Resizable, hints.resizable);

        *slot = Some(TerminalWindow {
            handle,
            should_close: false,
            swap_interval: 0,
            size: self.pixels(columns, rows),
            attributes,
            callbacks: None,
        });
        debug!("Terminal window {} is {}x{} cells", handle, columns, rows);
        Some(handle)
    }

    fn destroy_window(&self, handle: NativeHandle) {
        let mut slot = self.window.lock();
        if slot.as_ref().is_some_and(|window| window.handle == handle) {
            *slot = None;
            if let Err(err) = leave_terminal() {
                warn!("Could not restore the terminal: {err}");
            }
        }
    }

    fn create_surface(&self, handle: NativeHandle) -> Option<Box<dyn Surface>> {
        self.with_window(handle, |_| ())?;
        Some(Box::new(TerminalSurface {
            cell_size: self.cell_size,
            columns: 0,
            rows: 0,
            back: Vec::new(),
            front: None,
            output: Vec::new(),
        }))
    }

    fn install_callbacks(
        &self,
        handle: NativeHandle,
        callbacks: Arc<WindowCallbacks>,
    ) -> Option<Arc<WindowCallbacks>> {
        self.with_window(handle, |window| window.callbacks.replace(callbacks))
            .flatten()
    }

    fn poll_events(&self, handle: NativeHandle) {
        let Some(callbacks) = self.with_window(handle, |window| window.callbacks.clone()).flatten() else {
            return;
        };

        let mut timeout = self.poll_timeout;
        loop {
            match event::poll(timeout) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    warn!("Terminal event poll failed: {err}");
                    break;
                }
            }
            timeout = Duration::ZERO;

            let event = match event::read() {
                Ok(event) => event,
                Err(err) => {
                    warn!("Terminal event read failed: {err}");
                    break;
                }
            };
            for native in self.translate(handle, event) {
                callbacks.dispatch(&native);
            }
        }
    }

    fn swap_buffers(&self, _handle: NativeHandle) {}

    fn set_swap_interval(&self, handle: NativeHandle, interval: i32) {
        self.with_window(handle, |window| window.swap_interval = interval);
    }

    fn should_close(&self, handle: NativeHandle) -> bool {
        self.with_window(handle, |window| window.should_close).unwrap_or(true)
    }

    fn set_should_close(&self, handle: NativeHandle, value: bool) {
        self.with_window(handle, |window| window.should_close = value);
    }

    fn attribute(&self, handle: NativeHandle, attribute: WindowAttribute) -> bool {
        self.with_window(handle, |window| window.attributes.get(&attribute).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    fn set_attribute(&self, handle: NativeHandle, attribute: WindowAttribute, value: bool) {
        self.with_window(handle, |window| {
            window.attributes.insert(attribute, value);
        });
    }

    fn restore(&self, handle: NativeHandle) {
        self.with_window(handle, |window| {
            window.attributes.insert(WindowAttribute::Iconified, false);
            window.attributes.insert(WindowAttribute::Maximized, false);
        });
    }

    fn set_title(&self, handle: NativeHandle, title: &str) {
        if self.with_window(handle, |_| ()).is_some() {
            if let Err(err) = execute!(io::stdout(), SetTitle(title)) {
                warn!("Could not set the terminal title: {err}");
            }
        }
    }

    fn set_size(&self, handle: NativeHandle, width: i32, height: i32) {
        let columns = (width / self.cell_size.0).clamp(1, i32::from(u16::MAX)) as u16;
        let rows = (height / self.cell_size.1).clamp(1, i32::from(u16::MAX)) as u16;
        if self.with_window(handle, |_| ()).is_some() {
            if let Err(err) = execute!(io::stdout(), SetSize(columns, rows)) {
                warn!("Could not resize the terminal: {err}");
            }
        }
    }

    fn size(&self, handle: NativeHandle) -> (i32, i32) {
        self.with_window(handle, |window| window.size).unwrap_or((0, 0))
    }
}

// =============================================================================
// Tests
// =============================================================================
