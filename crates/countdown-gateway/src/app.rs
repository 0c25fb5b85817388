use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use countdown_core::config::CountdownConfig;
use countdown_timers::{SqliteTimerStore, TimerService};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

pub type Timers = TimerService<Arc<SqliteTimerStore>>;

/// Central shared state, passed as `Arc<AppState>` to all Axum handlers.
pub struct AppState {
    pub config: CountdownConfig,
    pub timers: Timers,
}

impl AppState {
    pub fn new(config: CountdownConfig, store: Arc<SqliteTimerStore>) -> Self {
        let timers = TimerService::from_config(store, &config.timers);
        Self { config, timers }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors.origins);
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/api/v1/timers",
            get(crate::http::timers::list_timers).post(crate::http::timers::create_timer),
        )
        .route(
            "/api/v1/timers/{id}",
            get(crate::http::timers::get_timer).post(crate::http::timers::update_duration),
        )
        .route(
            "/api/v1/timers/{id}/start",
            post(crate::http::timers::start_timer),
        )
        .route("/api/v1/timers/{id}/stop", post(crate::http::timers::stop_timer))
        .route(
            "/api/v1/timers/{id}/reset",
            post(crate::http::timers::reset_timer),
        )
        .route("/api/v1/timers/{id}/tick", post(crate::http::timers::tick_timer))
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Allow the configured browser origins; malformed entries are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
