//! Environment-driven runtime settings.
//!
//! All configuration comes from the process environment:
//!
//! | Variable              | Meaning                               | Default   |
//! |-----------------------|---------------------------------------|-----------|
//! | `PORT`                | HTTP listen port                      | `8000`    |
//! | `SENSOR_STORE`        | Storage backend: `postgis`, `memory`  | `postgis` |
//! | `DATABASE_URL`        | PostgreSQL connection URL             | required for `postgis` |
//! | `MAPBOX_ACCESS_TOKEN` | Token for place-name geocoding        | optional  |
//!
//! Without a Mapbox token the service still runs; proximity queries simply
//! lose the place-name fallback and accept coordinate pairs only.

use std::str::FromStr;

use thiserror::Error;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Errors validating runtime settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PORT` is set but not a valid port number.
    #[error("invalid value for PORT: \"{0}\"")]
    InvalidPort(String),

    /// `SENSOR_STORE` names an unknown backend.
    #[error("invalid value for SENSOR_STORE: \"{0}\" (expected \"postgis\" or \"memory\")")]
    InvalidBackend(String),

    /// The selected backend needs a database URL and none was provided.
    #[error("must set DATABASE_URL")]
    MissingDatabaseUrl,
}

/// Which storage backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// PostGIS-backed persistent store.
    #[default]
    Postgis,
    /// In-memory store; state is lost on exit.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgis" => Ok(StoreBackend::Postgis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::InvalidBackend(other.to_string())),
        }
    }
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP listen port.
    pub port: u16,
    /// Storage backend selection.
    pub backend: StoreBackend,
    /// PostgreSQL connection URL. Always `Some` when `backend` is `Postgis`.
    pub database_url: Option<String>,
    /// Mapbox access token for the place-name geocoding fallback.
    pub mapbox_access_token: Option<String>,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when `PORT` or `SENSOR_STORE` is malformed, or when the PostGIS
    /// backend is selected without `DATABASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through a lookup function. Unset and empty values are
    /// treated the same.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let backend = match get("SENSOR_STORE") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::default(),
        };

        let database_url = get("DATABASE_URL");
        if backend == StoreBackend::Postgis && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(Settings {
            port,
            backend,
            database_url,
            mapbox_access_token: get("MAPBOX_ACCESS_TOKEN"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings =
            Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/sensors")]))
                .unwrap();

        assert_eq!(settings.port, 8000);
        assert_eq!(settings.backend, StoreBackend::Postgis);
        assert_eq!(settings.mapbox_access_token, None);
    }

    #[test]
    fn test_port_override() {
        let settings = Settings::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("DATABASE_URL", "postgres://localhost/sensors"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 9090);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = Settings::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("DATABASE_URL", "postgres://localhost/sensors"),
        ]));

        assert!(matches!(result, Err(ConfigError::InvalidPort(raw)) if raw == "not-a-port"));
    }

    #[test]
    fn test_postgis_requires_database_url() {
        let result = Settings::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::MissingDatabaseUrl)));

        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "must set DATABASE_URL");
    }

    #[test]
    fn test_empty_database_url_is_missing() {
        let result = Settings::from_lookup(lookup(&[("DATABASE_URL", "")]));
        assert!(matches!(result, Err(ConfigError::MissingDatabaseUrl)));
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let settings = Settings::from_lookup(lookup(&[("SENSOR_STORE", "memory")])).unwrap();

        assert_eq!(settings.backend, StoreBackend::Memory);
        assert_eq!(settings.database_url, None);
    }

    #[test]
    fn test_backend_parse_is_case_insensitive() {
        assert_eq!(
            "PostGIS".parse::<StoreBackend>().unwrap(),
            StoreBackend::Postgis
        );
        assert_eq!(
            "MEMORY".parse::<StoreBackend>().unwrap(),
            StoreBackend::Memory
        );
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = "redis".parse::<StoreBackend>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackend(name) if name == "redis"));
    }
}
