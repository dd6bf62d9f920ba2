//! Component Tree - Named visual nodes with geometry, style and children.
//!
//! Components are shared, thread-safe nodes (`Arc<Component>`):
//!
//! ```text
//! Window
//!   └── roots: [pane]
//!                ├── rectangle-1   (parent: Weak → pane)
//!                └── flow
//!                      └── rectangle-2
//! ```
//!
//! - Names are unique per [`ComponentRegistry`] and never change.
//! - A parent owns its children (`Arc`); a child only points back (`Weak`).
//! - The owning window is attached by the render pipeline when the node is
//!   first queued; application code cannot set it.
//! - Removing a node from its parent does not unregister it. Use
//!   [`ComponentRegistry::remove_tree`] for explicit cascading removal.

mod layout;
mod shapes;
mod style;

pub use layout::{FlowPane, Layout, Pane, clamp_children, flow_pane, pane};
pub use shapes::rectangle;
pub use style::{Background, PositionMode, Style};

use std::fmt;
use std::sync::{Arc, Weak};

use log::{debug, error, warn};
use parking_lot::RwLock;

use crate::engine::{Named, Registry};
use crate::types::Rect;
use crate::window::{WeakWindow, Window};

/// Shared handle to a component.
pub type ComponentRef = Arc<Component>;

/// Registry of every component of a toolkit, by name.
pub type ComponentRegistry = Registry<ComponentRef>;

// =============================================================================
// Window Attachment
// =============================================================================

/// Capability of nodes that need their owning window.
///
/// Called by the render pipeline when a component is queued by a window it
/// was not attached to yet. Runs on the window thread, outside the renderer
/// lock.
pub trait AcceptsWindow: Send + Sync {
    fn window_attached(&self, component: &Component, window: &Window);
}

impl<F> AcceptsWindow for F
where
    F: Fn(&Component, &Window) + Send + Sync,
{
    fn window_attached(&self, component: &Component, window: &Window) {
        self(component, window)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Construction parameters of a component.
pub struct ComponentProps {
    /// Requested name. Defaults to the type name.
    pub id: Option<String>,
    pub type_name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub style: Style,
    /// Layout behavior; makes the node a layout.
    pub layout: Option<Box<dyn Layout>>,
    pub on_window: Option<Box<dyn AcceptsWindow>>,
}

impl Default for ComponentProps {
    fn default() -> Self {
        Self {
            id: None,
            type_name: "Component".to_string(),
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            style: Style::default(),
            layout: None,
            on_window: None,
        }
    }
}

impl ComponentProps {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn layout(mut self, layout: impl Layout + 'static) -> Self {
        self.layout = Some(Box::new(layout));
        self
    }

    pub fn on_window(mut self, listener: impl AcceptsWindow + 'static) -> Self {
        self.on_window = Some(Box::new(listener));
        self
    }
}

// =============================================================================
// Component
// =============================================================================

/// A node of the visual tree.
pub struct Component {
    name: String,
    type_name: String,
    this: Weak<Component>,
    bounds: RwLock<Rect>,
    style: RwLock<Style>,
    children: RwLock<Vec<ComponentRef>>,
    parent: RwLock<Weak<Component>>,
    window: RwLock<WeakWindow>,
    layout: Option<Box<dyn Layout>>,
    on_window: Option<Box<dyn AcceptsWindow>>,
}

impl Named for Component {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Component {
    /// Create and register a component.
    ///
    /// The requested id (or the type name) gets a serial suffix when it is
    /// already taken in `registry`.
    pub fn create(registry: &ComponentRegistry, props: ComponentProps) -> ComponentRef {
        let ComponentProps {
            id,
            type_name,
            x,
            y,
            width,
            height,
            style,
            layout,
            on_window,
        } = props;
        let requested = id.unwrap_or_else(|| type_name.clone());

        registry.register_with(&requested, move |name| {
            Arc::new_cyclic(|this| Component {
                name,
                type_name,
                this: this.clone(),
                bounds: RwLock::new(Rect::new(x, y, width.max(0), height.max(0))),
                style: RwLock::new(style),
                children: RwLock::new(Vec::new()),
                parent: RwLock::new(Weak::new()),
                window: RwLock::new(WeakWindow::default()),
                layout,
                on_window,
            })
        })
    }

    /// Create a plain component named after its type.
    pub fn new(registry: &ComponentRegistry) -> ComponentRef {
        Self::create(registry, ComponentProps::default())
    }

    /// Create a plain component with a requested name.
    pub fn with_id(registry: &ComponentRegistry, id: &str) -> ComponentRef {
        Self::create(registry, ComponentProps::default().id(id))
    }

    /// A component that belongs to no registry.
    pub(crate) fn detached(name: &str) -> ComponentRef {
        Arc::new_cyclic(|this| Component {
            name: name.to_string(),
            type_name: "Empty".to_string(),
            this: this.clone(),
            bounds: RwLock::new(Rect::default()),
            style: RwLock::new(Style::default()),
            children: RwLock::new(Vec::new()),
            parent: RwLock::new(Weak::new()),
            window: RwLock::new(WeakWindow::default()),
            layout: None,
            on_window: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    /// Bounds relative to the parent.
    pub fn bounds(&self) -> Rect {
        *self.bounds.read()
    }

    pub fn x(&self) -> i32 {
        self.bounds.read().x
    }

    pub fn y(&self) -> i32 {
        self.bounds.read().y
    }

    pub fn width(&self) -> i32 {
        self.bounds.read().width
    }

    pub fn height(&self) -> i32 {
        self.bounds.read().height
    }

    /// Set the width. Negative values become 0.
    pub fn set_width(&self, width: i32) {
        self.bounds.write().width = width.max(0);
    }

    /// Set the height. Negative values become 0.
    pub fn set_height(&self, height: i32) {
        self.bounds.write().height = height.max(0);
    }

    pub fn set_size(&self, width: i32, height: i32) {
        let mut bounds = self.bounds.write();
        bounds.width = width.max(0);
        bounds.height = height.max(0);
    }

    pub fn set_x(&self, x: i32) {
        self.bounds.write().x = x;
    }

    pub fn set_y(&self, y: i32) {
        self.bounds.write().y = y;
    }

    pub fn set_position(&self, x: i32, y: i32) {
        let mut bounds = self.bounds.write();
        bounds.x = x;
        bounds.y = y;
    }

    /// Position in window coordinates (sum of the positions up the parent chain).
    pub fn absolute_position(&self) -> (i32, i32) {
        let (mut x, mut y) = (self.x(), self.y());
        let mut current = self.parent();
        while let Some(parent) = current {
            x += parent.x();
            y += parent.y();
            current = parent.parent();
        }
        (x, y)
    }

    /// Bounds in window coordinates.
    pub fn absolute_bounds(&self) -> Rect {
        let (x, y) = self.absolute_position();
        let bounds = self.bounds();
        Rect::new(x, y, bounds.width, bounds.height)
    }

    // -------------------------------------------------------------------------
    // Style
    // -------------------------------------------------------------------------

    pub fn style(&self) -> Style {
        self.style.read().clone()
    }

    pub fn set_style(&self, style: Style) {
        *self.style.write() = style;
    }

    /// Modify the style in place.
    pub fn update_style(&self, update: impl FnOnce(&mut Style)) {
        update(&mut *self.style.write());
    }

    // -------------------------------------------------------------------------
    // Tree
    // -------------------------------------------------------------------------

    /// Append `child`, moving it out of its previous parent.
    ///
    /// Refused (with a warning) if `child` is already a child of this node,
    /// or if it is this node or one of its ancestors.
    pub fn add_child(&self, child: &ComponentRef) -> bool {
        if std::ptr::eq(self, child.as_ref()) || child.is_ancestor_of(self) {
            warn!(
                "Cannot add `{}` to `{}`: it would become its own descendant",
                child.name, self.name
            );
            return false;
        }
        if self.has_child(&child.name) {
            warn!("`{}` is already a child of `{}`", child.name, self.name);
            return false;
        }

        if let Some(previous) = child.parent() {
            previous.detach(child);
        }
        *child.parent.write() = self.this.clone();
        self.children.write().push(child.clone());
        debug!("Added `{}` to `{}`", child.name, self.name);
        true
    }

    /// Remove the child named `name`. Warns if there is none.
    pub fn remove_child(&self, name: &str) -> Option<ComponentRef> {
        let removed = {
            let mut children = self.children.write();
            children
                .iter()
                .position(|child| child.name == name)
                .map(|position| children.remove(position))
        };

        match removed {
            Some(child) => {
                child.clear_parent_if(self);
                debug!("Removed `{}` from `{}`", name, self.name);
                Some(child)
            }
            None => {
                warn!("`{}` has no child named `{}`", self.name, name);
                None
            }
        }
    }

    /// Remove every child.
    pub fn remove_all_children(&self) -> Vec<ComponentRef> {
        let children = std::mem::take(&mut *self.children.write());
        for child in &children {
            child.clear_parent_if(self);
        }
        children
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.read().iter().any(|child| child.name == name)
    }

    pub fn child(&self, name: &str) -> Option<ComponentRef> {
        self.children.read().iter().find(|child| child.name == name).cloned()
    }

    /// Children in sibling order.
    pub fn children(&self) -> Vec<ComponentRef> {
        self.children.read().clone()
    }

    pub fn child_count(&self) -> usize {
        self.children.read().len()
    }

    /// Whether this node has children.
    pub fn is_parent(&self) -> bool {
        !self.children.read().is_empty()
    }

    pub fn parent(&self) -> Option<ComponentRef> {
        self.parent.read().upgrade()
    }

    /// Whether `self` is a (transitive) parent of `other`.
    pub fn is_ancestor_of(&self, other: &Component) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if std::ptr::eq(node.as_ref(), self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Every node below this one, depth-first in sibling order.
    pub fn descendants(&self) -> Vec<ComponentRef> {
        let mut out = Vec::new();
        let mut stack: Vec<ComponentRef> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    fn detach(&self, child: &Component) {
        self.children
            .write()
            .retain(|existing| !std::ptr::eq(existing.as_ref(), child));
    }

    fn clear_parent_if(&self, parent: &Component) {
        let mut slot = self.parent.write();
        if slot.upgrade().is_some_and(|current| std::ptr::eq(current.as_ref(), parent)) {
            *slot = Weak::new();
        }
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    /// Whether this node positions its children.
    pub fn is_layout(&self) -> bool {
        self.layout.is_some()
    }

    /// Run the layout behavior: bounds clamping first (unless the layout
    /// opts out), then the layout's own logic. No-op for plain nodes.
    pub fn update(&self) {
        if let Some(layout) = &self.layout {
            if layout.use_default_logic() {
                clamp_children(self);
            }
            layout.logic(self);
        }
    }

    // -------------------------------------------------------------------------
    // Window
    // -------------------------------------------------------------------------

    /// The window that last queued this node, if it is still alive.
    pub fn window(&self) -> Option<Window> {
        self.window.read().upgrade()
    }

    /// Bind the owning window. Idempotent for the same window.
    pub(crate) fn attach_window(&self, window: &WeakWindow) {
        {
            let mut slot = self.window.write();
            if slot.ptr_eq(window) {
                return;
            }
            *slot = window.clone();
        }

        if let (Some(listener), Some(window)) = (&self.on_window, window.upgrade()) {
            listener.window_attached(self, &window);
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("bounds", &self.bounds())
            .field("children", &self.child_count())
            .finish()
    }
}

// =============================================================================
// Registry Operations
// =============================================================================

impl ComponentRegistry {
    /// Create and register a component. Same as [`Component::create`].
    pub fn create(&self, props: ComponentProps) -> ComponentRef {
        Component::create(self, props)
    }

    /// Detach `component` from its parent and unregister it with its
    /// whole subtree. Returns the number of unregistered nodes.
    pub fn remove_tree(&self, component: &ComponentRef) -> usize {
        if let Some(parent) = component.parent() {
            parent.remove_child(&component.name);
        }

        let mut removed = 0;
        for node in std::iter::once(component.clone()).chain(component.descendants()) {
            if self.release(&node.name).is_some() {
                removed += 1;
            }
        }
        debug!("Removed tree `{}` ({} nodes)", component.name, removed);
        removed
    }

    /// Look up a component, falling back to a detached empty placeholder
    /// when the name is unknown.
    pub fn resolve(&self, name: &str) -> ComponentRef {
        self.get(name).unwrap_or_else(|| {
            error!("There is no component named `{name}`, using an empty one");
            Component::detached(name)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
