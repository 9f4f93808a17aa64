//! SensorGrid - sensor registry with geospatial proximity queries
//!
//! This library stores named point-location records ("sensors": a name,
//! latitude/longitude, and a set of free-text tags) and answers proximity
//! queries: which sensors lie within a radius of a point, nearest first.
//!
//! # High-Level API
//!
//! The [`store`] module defines the [`store::SensorStore`] contract with two
//! interchangeable backends, selected once at process start:
//!
//! ```ignore
//! use sensorgrid::store::{PostgisStore, SensorStore};
//!
//! let store = PostgisStore::connect(&database_url).await?;
//! store.ensure_schema().await?;
//!
//! let nearby = store.find_closest(44.91, -93.22, 100_000.0).await?;
//! ```
//!
//! The [`query`] module turns user-supplied `radius`/`location` strings into
//! validated numeric queries, and [`geo`] resolves free-text place names via
//! an external geocoding service when the strict coordinate grammar fails.

pub mod config;
pub mod geo;
pub mod logging;
pub mod query;
pub mod store;

/// Version of the SensorGrid library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
