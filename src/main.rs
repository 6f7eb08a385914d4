use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eventcache::application::use_cases::upload::UploadPipeline;
use eventcache::infrastructure::config::AppConfig;
use eventcache::infrastructure::security::AccessGate;
use eventcache::infrastructure::storage::EventStorage;
use eventcache::interfaces::http::{start_server, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().map_err(|e| std::io::Error::other(e.to_string()))?;

    let storage = Arc::new(EventStorage::new(&config.data_dir));
    storage
        .ensure()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    // The bypass flag only takes effect in development environments.
    let bypass = config.pin_bypass && config.is_development();
    let gate = Arc::new(AccessGate::new(config.pin.as_deref(), bypass));
    match gate.fingerprint() {
        Some(fp) => info!(pin_digest = %fp, "upload pin configured"),
        None if bypass => warn!("no upload pin configured, bypass active"),
        None => warn!("no upload pin configured, uploads will be rejected"),
    }

    let state = AppState {
        pipeline: Arc::new(UploadPipeline::new(Arc::clone(&storage))),
        gate,
        storage,
    };

    info!(data_dir = %config.data_dir.display(), environment = %config.environment, "starting");
    start_server(&config, state)?.await
}
