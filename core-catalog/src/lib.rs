//! # Catalog Module
//!
//! Provides the DJ set catalog: domain models for set records, duration and
//! date helpers, and a feed client that fetches the upstream catalog with a
//! short revalidation window.
//!
//! ## Overview
//!
//! The catalog is read-only once loaded. The upstream feed carries raw
//! records (`duration` as an `"HH:MM:SS"` string, `genre`/`cover`/`audio`
//! field names); this crate transforms them into [`DjSet`] records with the
//! duration parsed to seconds. Feed order is display order.

pub mod error;
pub mod feed;
pub mod models;

pub use error::{CatalogError, Result};
pub use feed::FeedClient;
pub use models::{format_date, format_duration, parse_duration, DjSet, RawFeed, RawSet};
