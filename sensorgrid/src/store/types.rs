//! Sensor model, store contract, and store error taxonomy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named point-location record.
///
/// Identity is `name`: unique within a store at any instant, caller-supplied,
/// and mutable (renaming is a supported update). The store layer does not
/// validate coordinate ranges; out-of-range values are persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sensor {
    /// Store-assigned surrogate key. Zero until a backend assigns one;
    /// the in-memory store never does.
    #[serde(default)]
    pub id: i64,
    /// Unique sensor name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Free-text tags. Never absent in a returned record - an empty
    /// collection, not an option.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Errors produced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named resource does not exist. The one typed error every backend
    /// must produce identically, so callers can branch on it.
    #[error("no {resource_type} resource exists: {id}")]
    MissingResource {
        resource_type: &'static str,
        id: String,
    },

    /// A sensor with this name already exists.
    #[error("a sensor already exists with name \"{0}\"")]
    DuplicateName(String),

    /// Opaque backend failure (connection, constraint, query error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Construct the typed not-found error for a sensor name.
    pub fn missing_sensor(name: impl Into<String>) -> Self {
        StoreError::MissingResource {
            resource_type: "sensor",
            id: name.into(),
        }
    }
}

/// Storage contract for sensor records.
///
/// All implementations honor the same semantics:
///
/// - `create` persists a new record and returns it with any backend-assigned
///   id. Duplicate names are rejected with [`StoreError::DuplicateName`].
/// - `get_by_name` returns `Ok(None)` when no record matches - absence is
///   not an error, and callers can distinguish it from a failed lookup.
/// - `update_by_name` replaces the record stored under `name` wholesale
///   (including a possible rename) and fails with
///   [`StoreError::MissingResource`] when `name` is absent.
/// - `find_closest` returns every sensor within `radius_meters` of the query
///   point, ordered by ascending geodesic distance with deterministic
///   tie-breaking, and an empty (non-error) list when nothing matches.
///
/// There is no delete operation.
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Persist a new sensor, returning the stored record.
    async fn create(&self, sensor: Sensor) -> Result<Sensor, StoreError>;

    /// Look up a sensor by name. `Ok(None)` when absent.
    async fn get_by_name(&self, name: &str) -> Result<Option<Sensor>, StoreError>;

    /// Replace the sensor stored under `name` with `sensor`.
    async fn update_by_name(&self, name: &str, sensor: Sensor) -> Result<Sensor, StoreError>;

    /// Find all sensors within `radius_meters` of `(lat, lon)`, nearest
    /// first.
    async fn find_closest(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    ) -> Result<Vec<Sensor>, StoreError>;
}
