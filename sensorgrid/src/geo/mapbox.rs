//! Mapbox forward-geocoding service.
//!
//! Resolves a place name to coordinates via the Mapbox Geocoding API.
//! Requires a Mapbox access token (free tier available with usage limits).
//!
//! # URL Pattern
//!
//! `https://api.mapbox.com/geocoding/v5/mapbox.places/{place}.json?access_token={token}`
//!
//! The response carries a `features` array ordered by relevance; the first
//! feature's `center` is `[lon, lat]` and the returned pair is flipped to
//! `(lat, lon)`.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use tracing::debug;

use super::http::HttpClient;
use super::{GeoError, Geocoder};

/// Base URL for the Mapbox places geocoding endpoint.
const MAPBOX_GEOCODE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Encode set for the place path segment: everything but RFC 3986 unreserved
/// characters. Reserved characters like `#`, `?`, and `/` would otherwise
/// terminate or split the path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Mapbox forward geocoder.
///
/// # Example
///
/// ```ignore
/// use sensorgrid::geo::{Geocoder, MapboxGeocoder, ReqwestClient};
///
/// let client = ReqwestClient::new()?;
/// let geocoder = MapboxGeocoder::new(client, access_token);
/// let (lat, lon) = geocoder.forward_geocode("St Paul, MN").await?;
/// ```
pub struct MapboxGeocoder<C: HttpClient> {
    http_client: C,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    #[serde(default)]
    center: Vec<f64>,
}

impl<C: HttpClient> MapboxGeocoder<C> {
    /// Creates a new Mapbox geocoder with the given access token.
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `access_token` - Mapbox access token
    pub fn new(http_client: C, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
        }
    }

    /// Builds the geocoding URL for a place name.
    ///
    /// The place is percent-encoded into the path; the access token travels
    /// as a query parameter, which the HTTP client encodes.
    fn build_url(place: &str) -> String {
        format!(
            "{}/{}.json",
            MAPBOX_GEOCODE_URL,
            utf8_percent_encode(place, PATH_SEGMENT)
        )
    }
}

#[async_trait]
impl<C: HttpClient> Geocoder for MapboxGeocoder<C> {
    async fn forward_geocode(&self, place: &str) -> Result<(f64, f64), GeoError> {
        let url = Self::build_url(place);
        let body = self
            .http_client
            .get(
                &url,
                &[("access_token", self.access_token.as_str()), ("limit", "1")],
            )
            .await?;

        let response: GeocodeResponse = serde_json::from_slice(&body)
            .map_err(|e| GeoError::Decode(format!("invalid geocode response body: {}", e)))?;

        let feature = response
            .features
            .first()
            .ok_or_else(|| GeoError::NotFound(place.to_string()))?;

        // Mapbox centers are [lon, lat].
        match feature.center.as_slice() {
            [lon, lat] => {
                debug!(place, lat, lon, "place geocoded");
                Ok((*lat, *lon))
            }
            _ => Err(GeoError::Decode(
                "geocode feature has invalid center".to_string(),
            )),
        }
    }
}
