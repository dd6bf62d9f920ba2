//! Named Registry - Thread-safe name → entry lists.
//!
//! Backs the window registry, the component registry and the renderer name
//! registry of a toolkit:
//! - Serial-name generation (`main`, `main-1`, `main-2`, ...)
//! - Atomic "pick a free name and insert" so two threads never get the same name
//! - Linear lookups (UI trees are small; insertion order is kept)
//!
//! Registries are plain values owned by a [`Toolkit`](crate::Toolkit); there
//! is no process-wide state, so independent toolkits never see each other.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

// =============================================================================
// Named Entries
// =============================================================================

/// Anything stored in a [`Registry`] is identified by its name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

impl<T: Named + ?Sized> Named for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

// =============================================================================
// Serial Names
// =============================================================================

/// Pick a name for `requested` that is not in `existing`.
///
/// A free name is returned unchanged. Otherwise the suffix starts at the
/// number of existing entries equal to `requested` or prefixed by
/// `requested-`, and is bumped until the candidate is free.
pub fn serial_name<S: AsRef<str>>(requested: &str, existing: &[S]) -> String {
    let taken = |name: &str| existing.iter().any(|entry| entry.as_ref() == name);
    if !taken(requested) {
        return requested.to_string();
    }

    let prefix = format!("{requested}-");
    let mut index = existing
        .iter()
        .map(AsRef::as_ref)
        .filter(|entry| *entry == requested || entry.starts_with(&prefix))
        .count();

    loop {
        let candidate = format!("{requested}-{index}");
        if !taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Mutex-guarded, insertion-ordered list of named entries.
pub struct Registry<T> {
    label: &'static str,
    entries: Mutex<Vec<T>>,
}

impl<T: Named + Clone> Registry<T> {
    /// Create an empty registry. `label` names the entry kind in log lines.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Pick a serial name for `requested`, build the entry and insert it,
    /// all under one lock.
    ///
    /// `build` runs while the registry is locked and must not touch it.
    pub fn register_with<F>(&self, requested: &str, build: F) -> T
    where
        F: FnOnce(String) -> T,
    {
        let mut entries = self.entries.lock();
        let existing: Vec<&str> = entries.iter().map(Named::name).collect();
        let name = serial_name(requested, &existing);
        if name != requested {
            warn!(
                "{} `{}` already exists, using `{}` instead",
                self.label, requested, name
            );
        }

        let entry = build(name);
        entries.push(entry.clone());
        debug!("Registered {} `{}`", self.label, entry.name());
        entry
    }

    /// Insert an entry under its own name. Duplicates are refused.
    pub fn register(&self, entry: T) -> bool {
        let mut entries = self.entries.lock();
        if entries.iter().any(|e| e.name() == entry.name()) {
            warn!("There is already a {} named `{}`", self.label, entry.name());
            return false;
        }
        debug!("Registered {} `{}`", self.label, entry.name());
        entries.push(entry);
        true
    }

    /// Remove an entry by name.
    pub fn unregister(&self, name: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        let Some(position) = entries.iter().position(|e| e.name() == name) else {
            warn!("There is no {} named `{}`", self.label, name);
            return None;
        };
        debug!("Unregistered {} `{}`", self.label, name);
        Some(entries.remove(position))
    }

    /// Remove an entry by name without warning when it is absent.
    pub fn release(&self, name: &str) -> Option<T> {
        let mut entries = self.entries.lock();
        let position = entries.iter().position(|e| e.name() == name)?;
        Some(entries.remove(position))
    }

    pub fn get(&self, name: &str) -> Option<T> {
        self.entries.lock().iter().find(|e| e.name() == name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().iter().any(|e| e.name() == name)
    }

    /// Names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.name().to_string()).collect()
    }

    /// Snapshot of every entry in insertion order.
    pub fn entries(&self) -> Vec<T> {
        self.entries.lock().clone()
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&self, mut keep: impl FnMut(&T) -> bool) {
        self.entries.lock().retain(|e| keep(e));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("label", &self.label)
            .field("len", &self.entries.lock().len())
            .finish()
    }
}

/// Registry of claimed renderer names.
pub type NameRegistry = Registry<String>;

impl NameRegistry {
    /// Claim a serial name for `requested` and return it.
    pub fn claim(&self, requested: &str) -> String {
        self.register_with(requested, |name| name)
    }
}

// =============================================================================
// Tests
// =============================================================================
