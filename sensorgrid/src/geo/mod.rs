//! Place-name geocoding.
//!
//! Resolves free-text place names ("St Paul, MN") to `(lat, lon)` decimal
//! degrees through an external geocoding service. This is the fallback for
//! proximity queries whose `location` parameter is not a coordinate pair;
//! strict coordinate parsing lives in [`crate::query`] and never touches the
//! network.

mod http;
mod mapbox;

pub use http::{HttpClient, ReqwestClient};
pub use mapbox::MapboxGeocoder;

use async_trait::async_trait;
use thiserror::Error;

/// Error resolving a place name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    /// The service returned no match for the place name.
    #[error("no location found at {0}")]
    NotFound(String),

    /// The HTTP request failed or returned a non-success status.
    #[error("geocoding request failed: {0}")]
    Http(String),

    /// The response body was not in the expected shape.
    #[error("unable to decode geocoding response: {0}")]
    Decode(String),
}

/// A service that resolves free-text place names to coordinates.
///
/// Object-safe so callers can hold an optional `Arc<dyn Geocoder>` and run
/// without one configured.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `place` to `(lat, lon)` decimal degrees.
    ///
    /// # Errors
    ///
    /// [`GeoError::NotFound`] when the service has no match; other variants
    /// for transport and decoding failures.
    async fn forward_geocode(&self, place: &str) -> Result<(f64, f64), GeoError>;
}
