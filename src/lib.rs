//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-sync`, `core-runtime`, `core-render`). Host applications can
//! depend on `keep-mirror-workspace` and enable the documented features
//! without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_runtime;
#[cfg(feature = "desktop-shims")]
pub use core_sync;

#[cfg(feature = "markdown")]
pub use core_render;
