//! Engine - Shared registries of a toolkit.
//!
//! The engine holds the name-keyed bookkeeping every other area relies on:
//! - `Registry<T>`: mutex-guarded, insertion-ordered name → entry list
//! - `serial_name`: the `id`, `id-1`, `id-2` collision rule
//!
//! # Architecture
//!
//! ```text
//! Toolkit
//!   ├── windows:    Registry<Window>        (lookup, unique window ids)
//!   ├── components: Registry<ComponentRef>  (lookup, unique component ids)
//!   └── renderers:  Registry<String>        (claimed renderer names)
//! ```
//!
//! Each toolkit owns its own registries, so tests can run isolated instances
//! side by side.

mod registry;

pub use registry::*;
