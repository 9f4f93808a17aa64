//! In-memory reference store.
//!
//! A mutex-guarded map from sensor name to record. Useful for tests and as a
//! fallback backend when no database is configured; state is lost when the
//! process exits. The mutex serializes every operation, which is the
//! explicit mutual-exclusion wrapper the unguarded reference behavior needs
//! under concurrent load.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{Sensor, SensorStore, StoreError};

/// Mean Earth radius in meters, for great-circle distances.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// In-memory sensor store keyed by name.
#[derive(Debug, Default)]
pub struct MemorySensorStore {
    by_name: Mutex<HashMap<String, Sensor>>,
}

impl MemorySensorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SensorStore for MemorySensorStore {
    async fn create(&self, sensor: Sensor) -> Result<Sensor, StoreError> {
        let mut by_name = self.by_name.lock().expect("sensor map lock poisoned");

        if by_name.contains_key(&sensor.name) {
            return Err(StoreError::DuplicateName(sensor.name));
        }

        by_name.insert(sensor.name.clone(), sensor.clone());
        Ok(sensor)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Sensor>, StoreError> {
        let by_name = self.by_name.lock().expect("sensor map lock poisoned");
        Ok(by_name.get(name).cloned())
    }

    async fn update_by_name(&self, name: &str, sensor: Sensor) -> Result<Sensor, StoreError> {
        let mut by_name = self.by_name.lock().expect("sensor map lock poisoned");

        if !by_name.contains_key(name) {
            return Err(StoreError::missing_sensor(name));
        }

        // A rename must not clobber another sensor's record.
        if sensor.name != name && by_name.contains_key(&sensor.name) {
            return Err(StoreError::DuplicateName(sensor.name));
        }

        // Full replace, including a possible rename.
        by_name.remove(name);
        by_name.insert(sensor.name.clone(), sensor.clone());
        Ok(sensor)
    }

    async fn find_closest(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    ) -> Result<Vec<Sensor>, StoreError> {
        let by_name = self.by_name.lock().expect("sensor map lock poisoned");

        let mut matches: Vec<(f64, Sensor)> = by_name
            .values()
            .map(|s| (haversine_meters(lat, lon, s.lat, s.lon), s.clone()))
            .filter(|(distance, _)| *distance <= radius_meters)
            .collect();

        // Ascending distance; name breaks ties so ordering is deterministic.
        matches.sort_by(|(da, sa), (db, sb)| {
            da.total_cmp(db).then_with(|| sa.name.cmp(&sb.name))
        });

        Ok(matches.into_iter().map(|(_, sensor)| sensor).collect())
    }
}

/// Great-circle distance between two lat/lon points, in meters.
fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    2.0 * a.sqrt().asin() * EARTH_RADIUS_METERS
}
