//! Terminal Example - A window on the terminal's alternate screen
//!
//! Demonstrates:
//! - Creating a toolkit on the crossterm backend
//! - A custom window kind reacting to keys and scrolling
//! - A flow pane laying out colored rectangles
//!
//! Keys: Escape or q quits, Ctrl+C quits, space adds a tile, backspace
//! removes one, the mouse wheel shifts the background.
//!
//! Run with: cargo run --example terminal

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use spark_gui::callback::{KeyEvent, ScrollEvent};
use spark_gui::{
    Action, ComponentRef, Insets, Options, Rgba, Style, TerminalBackend, Toolkit, Window,
    WindowKind, WindowRequest, flow_pane, keys, rectangle,
};

const PALETTE: [Rgba; 6] = [
    Rgba::CORAL,
    Rgba::YELLOW,
    Rgba::GREEN,
    Rgba::CYAN,
    Rgba::BLUE,
    Rgba::MAGENTA,
];

struct Gallery {
    flow: ComponentRef,
    tiles: AtomicUsize,
    shade: AtomicUsize,
}

impl Gallery {
    fn add_tile(&self, toolkit: &Toolkit) {
        let index = self.tiles.fetch_add(1, Ordering::AcqRel);
        let tile = rectangle(toolkit.components(), Some("tile"));
        tile.set_size(64, 48);
        tile.set_style(
            Style::new()
                .with_background(PALETTE[index % PALETTE.len()])
                .with_margin(Insets::uniform(8)),
        );
        self.flow.add_child(&tile);
    }

    fn remove_tile(&self, toolkit: &Toolkit) {
        if let Some(tile) = self.flow.children().pop() {
            toolkit.components().remove_tree(&tile);
            self.tiles.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl WindowKind for Gallery {
    fn tag(&self) -> &str {
        "Gallery"
    }

    fn initialize(&self, window: &Window) {
        window.set_background(Rgba::rgb(24, 24, 32));
        window.add_component(&self.flow);
        if let Some(toolkit) = window.toolkit() {
            for _ in 0..4 {
                self.add_tile(&toolkit);
            }
        }
    }

    fn update(&self, window: &Window) {
        // The flow pane follows the window size.
        if let Ok((width, height)) = window.size() {
            self.flow.set_size(width, height);
        }
    }

    fn on_key(&self, window: &Window, event: &KeyEvent) {
        if event.action == Action::Release {
            return;
        }
        let Some(toolkit) = window.toolkit() else {
            return;
        };
        match event.key {
            keys::ESCAPE | keys::Q => window.close(),
            keys::SPACE => self.add_tile(&toolkit),
            keys::BACKSPACE => self.remove_tile(&toolkit),
            _ => {}
        }
    }

    fn on_scroll(&self, window: &Window, event: &ScrollEvent) {
        let step = if event.y_offset > 0.0 { 1 } else { PALETTE.len() - 1 };
        let shade = (self.shade.fetch_add(step, Ordering::AcqRel) + step) % PALETTE.len();
        let base = PALETTE[shade];
        window.set_background(Rgba::rgb(base.r / 6, base.g / 6, base.b / 6));
    }
}

fn main() {
    let toolkit = Toolkit::builder(TerminalBackend::new())
        .options(Options::default().with_max_window_threads(1))
        .build();

    let flow = flow_pane(toolkit.components(), Some("gallery"), 0);
    flow.update_style(|style| style.padding = Insets::uniform(16));

    let gallery = Arc::new(Gallery {
        flow,
        tiles: AtomicUsize::new(0),
        shade: AtomicUsize::new(0),
    });

    let window = toolkit.create_window_with_kind(
        WindowRequest::new().id("main").title("spark-gui terminal demo"),
        gallery,
    );

    if let Err(err) = window.wait_until_built() {
        eprintln!("Could not open the terminal window: {err}");
        return;
    }
    window.join();

    println!("Rendered {} frames", window.frames_rendered());
}
