//! HTTP route modules for the RoamHQ console API.
//!
//! Each submodule exposes a `router()` that is nested under `/api` by
//! [`build_router`].

pub mod admin;
pub mod ecs;
pub mod token;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router with middleware layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Launches fan out to the ECS API; keep concurrent batches bounded.
    let ecs_routes = ecs::router().layer(tower::limit::ConcurrencyLimitLayer::new(8));

    // The console is served from another origin and sends no cookies.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api/token", token::router())
        .nest("/api/ecs", ecs_routes)
        .nest("/api/admin", admin::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
