//! Render queue: the flattened component tree of one frame.

use std::collections::HashSet;

use crate::component::ComponentRef;
use crate::window::WeakWindow;

/// Deduplicated, depth-first list of components.
#[derive(Debug, Default)]
pub struct RenderQueue {
    entries: Vec<ComponentRef>,
    seen: HashSet<String>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every queued component.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }

    /// Clear, then collect `roots`.
    pub fn rebuild(&mut self, roots: &[ComponentRef], window: &WeakWindow) {
        self.clear();
        self.collect(roots, window);
    }

    /// Append every component reachable from `roots` that is not queued yet.
    ///
    /// Depth-first in sibling order; the first node seen under a name wins.
    /// Each newly queued node gets `window` attached. Running this twice on
    /// an unchanged tree leaves the queue unchanged.
    pub fn collect(&mut self, roots: &[ComponentRef], window: &WeakWindow) {
        for root in roots {
            self.visit(root, window);
        }
    }

    fn visit(&mut self, node: &ComponentRef, window: &WeakWindow) {
        if !self.seen.insert(node.name().to_string()) {
            return;
        }
        node.attach_window(window);
        self.entries.push(node.clone());
        for child in node.children() {
            self.visit(&child, window);
        }
    }

    /// Run `update()` on every queued layout node, in queue order.
    pub fn update_layouts(&self) {
        for node in self.entries.iter().filter(|node| node.is_layout()) {
            node.update();
        }
    }

    pub fn as_slice(&self) -> &[ComponentRef] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentRef> {
        self.entries.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|node| node.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
