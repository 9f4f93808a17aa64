//! HTTP API surface.
//!
//! Routes:
//! - `GET /health` - liveness check
//! - `POST /sensors` - create a sensor
//! - `GET /sensors/{name}` - fetch a sensor by name
//! - `PUT /sensors/{name}` - replace a sensor by name
//! - `GET /sensors/closest?location=&radius=` - proximity query
//!
//! Every response body is JSON: successes are wrapped as `{"data": ...}`
//! (health excepted) and failures as `{"error": "message"}`. Internal
//! failures are logged with detail but reported opaquely.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use sensorgrid::geo::{GeoError, Geocoder};
use sensorgrid::query::{self, QueryError};
use sensorgrid::store::{Sensor, SensorStore, StoreError};

/// Shared handler state: the storage backend and the optional place-name
/// geocoding fallback.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn SensorStore>,
    pub geocoder: Option<Arc<dyn Geocoder>>,
}

/// Builds the application router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sensors", post(create_sensor))
        .route("/sensors/closest", get(find_closest))
        .route("/sensors/{name}", get(get_sensor).put(update_sensor))
        .with_state(state)
}

/// Error response carrying the status code and the client-visible message.
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingResource { .. } => ApiError::NotFound(err.to_string()),
            StoreError::DuplicateName(_) => ApiError::Conflict(err.to_string()),
            other => {
                error!(error = %other, "store operation failed");
                ApiError::Internal
            }
        }
    }
}

fn map_query_error(err: QueryError) -> ApiError {
    match err {
        QueryError::Internal(detail) => {
            error!(detail, "query parse invariant violated");
            ApiError::Internal
        }
        other => ApiError::BadRequest(other.to_string()),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn create_sensor(
    State(state): State<ApiState>,
    body: Result<Json<Sensor>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(sensor) =
        body.map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e)))?;

    let created = state.store.create(sensor).await?;

    info!(name = %created.name, "sensor created");
    Ok((StatusCode::CREATED, Json(json!({ "data": created }))))
}

async fn get_sensor(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sensor = state
        .store
        .get_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound(StoreError::missing_sensor(&name).to_string()))?;

    Ok(Json(json!({ "data": sensor })))
}

async fn update_sensor(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Result<Json<Sensor>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(sensor) =
        body.map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e)))?;

    let updated = state.store.update_by_name(&name, sensor).await?;

    info!(name = %updated.name, "sensor updated");
    Ok(Json(json!({ "data": updated })))
}

#[derive(Deserialize)]
struct ClosestParams {
    location: Option<String>,
    radius: Option<String>,
}

async fn find_closest(
    State(state): State<ApiState>,
    Query(params): Query<ClosestParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let location = params
        .location
        .ok_or_else(|| ApiError::BadRequest("missing required \"location\" param".to_string()))?;
    let radius = params
        .radius
        .ok_or_else(|| ApiError::BadRequest("missing required \"radius\" param".to_string()))?;

    let radius_meters = query::parse_radius(&radius).map_err(map_query_error)?;
    let (lat, lon) = resolve_location(&state, &location).await?;

    let sensors = state.store.find_closest(lat, lon, radius_meters).await?;

    Ok(Json(json!({ "data": sensors })))
}

/// Resolves the `location` parameter to coordinates.
///
/// Tries the strict coordinate grammar first; when that fails and a geocoder
/// is configured, treats the value as a place name. Without a geocoder the
/// grammar error stands.
async fn resolve_location(state: &ApiState, raw: &str) -> Result<(f64, f64), ApiError> {
    match query::parse_location(raw) {
        Ok(pair) => Ok(pair),
        Err(QueryError::InvalidLocation(_)) => {
            let Some(geocoder) = &state.geocoder else {
                return Err(map_query_error(QueryError::InvalidLocation(
                    raw.to_string(),
                )));
            };

            match geocoder.forward_geocode(raw).await {
                Ok((lat, lon)) => {
                    info!(place = raw, lat, lon, "location geocoded");
                    Ok((lat, lon))
                }
                Err(err @ GeoError::NotFound(_)) => Err(ApiError::BadRequest(err.to_string())),
                Err(other) => {
                    error!(place = raw, error = %other, "geocoding failed");
                    Err(ApiError::Internal)
                }
            }
        }
        Err(other) => Err(map_query_error(other)),
    }
}
