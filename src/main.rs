//! Behavior Compass — Binary Entrypoint
//! Boots the Axum HTTP server: one shared engine, optional debug routes, `/metrics`.

use behavior_compass::api::{self, AppState};
use behavior_compass::{logging, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing::info;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // Enables COMPASS_CONFIG_PATH / COMPASS_TOP_N / COMPASS_DEV_LOG from .env
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    logging::init_dev_tracing();

    // Configuration is validated once, here; analysis calls never fail on it.
    let state = AppState::from_env()?;
    info!(
        labels = state.engine.taxonomy().label_count(),
        rules = state.engine.rules().len(),
        external = state.external.provider_name(),
        "behavior compass starting"
    );

    let metrics = Metrics::init(state.engine.rules().len())?;
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
