//! Clothes catalog server library.
//!
//! This crate provides the catalog HTTP service as a library, allowing it to
//! be tested against an in-memory store and reused by the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod monitor;
pub mod routes;
pub mod state;

use axum::{Router, middleware::from_fn};

use crate::state::AppState;

/// Build the full application router with its middleware stack.
pub fn build_router(state: AppState, cors_allowed_origin: &str) -> Router {
    Router::new()
        .nest("/health", routes::health_routes())
        .nest("/api/v1", routes::api_routes())
        .with_state(state)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(middleware::trace_layer())
        .layer(middleware::cors_layer(cors_allowed_origin))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
