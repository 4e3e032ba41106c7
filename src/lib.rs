//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-catalog`, `core-playback`). Host applications
//! can depend on `setstream-workspace` and enable the documented features
//! without needing to wire each crate individually.

#[cfg(feature = "catalog")]
pub use core_catalog as catalog;

#[cfg(feature = "playback")]
pub use core_playback as playback;
