//! obd-api - HTTP and WebSocket API layer for the OBD telemetry bridge
//!
//! This crate provides the client-facing surface: a health probe, the
//! adapter info endpoint, and the `/ws` telemetry stream. Handlers are
//! link-agnostic over [`obd_elm::ObdLink`], so the same router serves a
//! real adapter or the mock link.
//!
//! # Usage
//!
//! ```ignore
//! use obd_api::{create_router, AppState, TelemetryConfig};
//!
//! let link = obd_elm::create_link(&config.device);
//! let state = AppState::new(link, config.telemetry);
//! let router = create_router(state);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use handlers::telemetry::TOGGLE_SPEED_UNIT;
pub use state::{AppState, TelemetryConfig};

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the bridge API router with the given application state.
///
/// CORS is open to any origin, a permissive default for development
/// deployments; production dashboards should narrow it.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Adapter identification
        .route("/api/device", get(handlers::device::device_info))
        // Telemetry stream
        .route("/ws", get(handlers::telemetry::telemetry_ws))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
