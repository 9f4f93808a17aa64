//! SensorGrid server - HTTP API over the sensor store
//!
//! Wires configuration, logging, the storage backend, and the optional
//! place-name geocoder into an HTTP server. Service configuration comes from
//! the environment (see [`sensorgrid::config`]); command-line flags cover
//! local concerns like log placement.

mod api;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use sensorgrid::config::{Settings, StoreBackend};
use sensorgrid::geo::{Geocoder, MapboxGeocoder, ReqwestClient};
use sensorgrid::logging;
use sensorgrid::store::{MemorySensorStore, PostgisStore, SensorStore};

use api::ApiState;
use error::CliError;

#[derive(Parser)]
#[command(name = "sensorgrid")]
#[command(version = sensorgrid::VERSION)]
#[command(about = "Sensor registry with geospatial proximity queries", long_about = None)]
struct Args {
    /// Directory for log files
    #[arg(long, default_value_t = logging::default_log_dir().to_string())]
    log_dir: String,

    /// Log file name
    #[arg(long, default_value_t = logging::default_log_file().to_string())]
    log_file: String,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        e.exit();
    }
}

async fn run() -> Result<(), CliError> {
    let args = Args::parse();

    let _logging_guard = logging::init_logging(&args.log_dir, &args.log_file)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let settings = Settings::from_env()?;

    let store = build_store(&settings).await?;
    let geocoder = build_geocoder(&settings)?;

    let app = api::router(ApiState { store, geocoder });

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(CliError::Bind)?;

    info!(%addr, version = sensorgrid::VERSION, "sensorgrid listening");
    axum::serve(listener, app).await.map_err(CliError::Serve)?;

    Ok(())
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn SensorStore>, CliError> {
    match settings.backend {
        StoreBackend::Postgis => {
            // Settings validation guarantees the URL is present for this
            // backend.
            let url = settings
                .database_url
                .as_deref()
                .ok_or(CliError::Config(
                    sensorgrid::config::ConfigError::MissingDatabaseUrl,
                ))?;

            let store = PostgisStore::connect(url)
                .await
                .map_err(CliError::StoreInit)?;
            store.ensure_schema().await.map_err(CliError::StoreInit)?;

            info!("using PostGIS sensor store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("using in-memory sensor store; state is lost on exit");
            Ok(Arc::new(MemorySensorStore::new()))
        }
    }
}

fn build_geocoder(settings: &Settings) -> Result<Option<Arc<dyn Geocoder>>, CliError> {
    match &settings.mapbox_access_token {
        Some(token) => {
            let client = ReqwestClient::new().map_err(CliError::GeocoderInit)?;
            info!("place-name geocoding enabled");
            Ok(Some(Arc::new(MapboxGeocoder::new(client, token.clone()))))
        }
        None => {
            info!("MAPBOX_ACCESS_TOKEN not set; place-name geocoding disabled");
            Ok(None)
        }
    }
}
