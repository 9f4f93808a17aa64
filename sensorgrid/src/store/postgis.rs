//! PostGIS-backed persistent store.
//!
//! Maps sensors onto two tables: one row per sensor (surrogate id, unique
//! name, a `geography(Point, 4326)` location), and one row per (sensor, tag)
//! pair. Proximity queries run against a GiST index using geodesic distance.
//!
//! Point construction always supplies `(x = longitude, y = latitude)`;
//! swapping them produces valid-looking but wrong results, so every query in
//! this module goes through the same `ST_SetSRID(ST_MakePoint($lon, $lat),
//! 4326)` expression.
//!
//! Multi-statement writes (`create`, `update_by_name`) execute inside a
//! single transaction, so a sensor row without its tags is never observable.
//! All other concurrency control is delegated to PostgreSQL.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

use super::types::{Sensor, SensorStore, StoreError};

/// Sensor store backed by PostgreSQL with the PostGIS extension.
#[derive(Debug, Clone)]
pub struct PostgisStore {
    pool: PgPool,
}

impl PostgisStore {
    /// Connects to the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Wraps an existing connection pool.
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist.
    ///
    /// Idempotent: safe to run on every startup. Requires a role that may
    /// create extensions on first run.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS postgis")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sensors (
                id       BIGSERIAL PRIMARY KEY,
                name     TEXT NOT NULL UNIQUE,
                location geography(Point, 4326) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tags (
                sensor_id BIGINT NOT NULL REFERENCES sensors (id) ON DELETE CASCADE,
                value     TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS sensors_location_idx ON sensors USING GIST (location)")
            .execute(&self.pool)
            .await?;

        debug!("sensor schema verified");
        Ok(())
    }

    /// Empties both tables. Intended for integration tests that need a
    /// known-clean database between cases.
    pub async fn reset(&self) -> Result<(), StoreError> {
        sqlx::query("TRUNCATE sensors CASCADE")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Inserts one tag row per tag for `sensor_id` within `tx`.
    ///
    /// No query is issued when the tag set is empty.
    async fn insert_tags(
        tx: &mut Transaction<'_, Postgres>,
        sensor_id: i64,
        tags: &[String],
    ) -> Result<(), StoreError> {
        if tags.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO tags (sensor_id, value)
            SELECT $1, unnest($2::text[])
            "#,
        )
        .bind(sensor_id)
        .bind(tags)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SensorStore for PostgisStore {
    async fn create(&self, sensor: Sensor) -> Result<Sensor, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO sensors (name, location)
            VALUES ($1, ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography)
            RETURNING id
            "#,
        )
        .bind(&sensor.name)
        .bind(sensor.lon)
        .bind(sensor.lat)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, &sensor.name))?;

        let id: i64 = row.get("id");

        Self::insert_tags(&mut tx, id, &sensor.tags).await?;
        tx.commit().await?;

        debug!(name = %sensor.name, id, "sensor created");
        Ok(Sensor { id, ..sensor })
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Sensor>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                sensors.id,
                ST_Y(sensors.location::geometry) AS lat,
                ST_X(sensors.location::geometry) AS lon,
                array_remove(array_agg(tags.value ORDER BY tags.value), NULL) AS tags
            FROM sensors
            LEFT JOIN tags ON sensors.id = tags.sensor_id
            WHERE sensors.name = $1
            GROUP BY sensors.id
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Sensor {
            id: row.get("id"),
            name: name.to_string(),
            lat: row.get("lat"),
            lon: row.get("lon"),
            tags: row.get("tags"),
        }))
    }

    async fn update_by_name(&self, name: &str, sensor: Sensor) -> Result<Sensor, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE sensors
            SET name = $2, location = ST_SetSRID(ST_MakePoint($3, $4), 4326)::geography
            WHERE name = $1
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(&sensor.name)
        .bind(sensor.lon)
        .bind(sensor.lat)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, &sensor.name))?;

        let id: i64 = match row {
            Some(row) => row.get("id"),
            None => return Err(StoreError::missing_sensor(name)),
        };

        // Full replace of the tag set, not a diff.
        sqlx::query("DELETE FROM tags WHERE sensor_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_tags(&mut tx, id, &sensor.tags).await?;

        tx.commit().await?;

        debug!(old_name = name, new_name = %sensor.name, id, "sensor updated");
        Ok(Sensor { id, ..sensor })
    }

    async fn find_closest(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    ) -> Result<Vec<Sensor>, StoreError> {
        // Containment and ordering use the same distance function, so the
        // ordering stays consistent with the radius boundary.
        let rows = sqlx::query(
            r#"
            SELECT
                sensors.id,
                sensors.name,
                ST_Y(sensors.location::geometry) AS lat,
                ST_X(sensors.location::geometry) AS lon,
                array_remove(array_agg(tags.value ORDER BY tags.value), NULL) AS tags,
                ST_Distance(sensors.location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance
            FROM sensors
            LEFT JOIN tags ON sensors.id = tags.sensor_id
            WHERE ST_DWithin(sensors.location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)
            GROUP BY sensors.id
            ORDER BY distance ASC, sensors.id ASC
            "#,
        )
        .bind(lon)
        .bind(lat)
        .bind(radius_meters)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Sensor {
                id: row.get("id"),
                name: row.get("name"),
                lat: row.get("lat"),
                lon: row.get("lon"),
                tags: row.get("tags"),
            })
            .collect())
    }
}

/// Maps a Postgres unique-violation on the sensor name onto the typed
/// duplicate error; everything else stays an opaque database failure.
fn map_unique_violation(err: sqlx::Error, name: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateName(name.to_string())
        }
        _ => StoreError::Database(err),
    }
}
