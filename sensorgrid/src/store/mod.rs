//! Sensor persistence
//!
//! This module provides the storage contract for sensor records and its two
//! implementations: an in-memory map used for tests and as a fallback
//! backend, and a PostGIS-backed store that answers proximity queries
//! through a geospatial index.
//!
//! Backends are interchangeable behind the [`SensorStore`] trait and are
//! selected once at process start:
//!
//! ```ignore
//! use sensorgrid::store::{MemorySensorStore, SensorStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn SensorStore> = Arc::new(MemorySensorStore::new());
//! ```

mod memory;
mod postgis;
mod types;

pub use memory::MemorySensorStore;
pub use postgis::PostgisStore;
pub use types::{Sensor, SensorStore, StoreError};
