use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use turnover_api::errors::StartupError;
use turnover_api::{create_router, AppConfig, AppState};
use turnover_core::{PredictionService, TurnoverModel};
use turnover_persistence::{build_pool_with, DbConfig, PgFeatureStore, PgPredictionLog, PoolProvider};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env()
                                                  .unwrap_or_else(|_| "turnover_api=info,tower_http=info".into()))
                             .init();

    let started_at = chrono::Utc::now();
    let config = AppConfig::from_env()?;
    let db = DbConfig::from_env()?;

    // Pool + migraciones: bloqueante, fuera del runtime.
    let pool = tokio::task::spawn_blocking(move || build_pool_with(&db))
        .await
        .map_err(|e| StartupError::Config(format!("pool task: {e}")))??;
    let provider = PoolProvider { pool };

    let model = match TurnoverModel::load(&config.artifact_paths(), config.model_version.as_deref()) {
        Ok(m) => {
            info!(model_version = %m.version(), threshold = m.threshold().value(), "Model loaded");
            Some(Arc::new(m))
        }
        Err(e) => {
            warn!(error = %e, "Model could not be loaded; starting degraded (/ready will report 503)");
            None
        }
    };
    if config.api_key.is_none() {
        warn!("API_KEY not set: every request will be answered with 500");
    }

    let service = PredictionService::new(Arc::new(PgFeatureStore::new(provider.clone())),
                                         Arc::new(PgPredictionLog::new(provider)),
                                         model);
    let state = Arc::new(AppState::new(service, config.api_key.clone()));
    let app = create_router(state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Turnover API listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(started_at)).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(started_at: chrono::DateTime<chrono::Utc>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    let uptime = chrono::Utc::now().signed_duration_since(started_at);
    info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
}
