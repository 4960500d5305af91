use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use carematch::config::{Settings, StorageBackend};
use carematch::routes::{self, AppState, AuthConfig};
use carematch::services::{CareService, CareStore, MemoryStore, PostgresStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

async fn open_store(settings: &Settings) -> std::io::Result<Arc<dyn CareStore>> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let url = settings.database.url.as_deref().ok_or_else(|| {
                error!("storage.backend is postgres but no database URL is configured");
                std::io::Error::new(std::io::ErrorKind::Other, "DATABASE_URL required")
            })?;

            let store = PostgresStore::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                settings.database.max_connections.unwrap_or(10)
            );
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting CareMatch engine...");

    if settings.auth.jwt_secret.is_none() {
        warn!("No JWT secret configured; every authenticated request will be rejected");
    }

    let flat = settings.flat_default_rate();
    if settings.rates.diverges_from(flat) {
        warn!(
            "Booking fallback rate ({} cents) differs from category display rates {:?}; \
             caregivers without a rate are shown one price and booked at another",
            flat.0,
            settings.rates
        );
    }

    let store = open_store(&settings).await?;
    let service = CareService::new(store, settings.matcher(), settings.pricing_calculator());

    info!("Matcher initialized (result cap: {})", settings.matching.result_cap);

    let app_state = AppState { service };
    let auth = AuthConfig::new(settings.auth.jwt_secret.clone());

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(auth.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(routes::handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
