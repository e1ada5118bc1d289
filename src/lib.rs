//! Workspace placeholder crate.
//!
//! This crate exposes shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-metadata`). Host applications can
//! depend on `album-sync-workspace` and enable the documented features
//! without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_metadata;
#[cfg(feature = "desktop-shims")]
pub use core_service;
