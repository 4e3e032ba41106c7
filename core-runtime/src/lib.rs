//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the set streaming player:
//! - Logging and tracing infrastructure
//! - Server configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the catalog, playback, and
//! relay-server crates depend on. It establishes the logging conventions and
//! event broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
