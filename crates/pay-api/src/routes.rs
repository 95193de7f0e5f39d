//! # Routes
//!
//! Axum router configuration for the checkout relay.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /                  - Status probe
/// - GET  /health            - Status probe
/// - POST /pay               - Start a payment
/// - GET  /status/{order_id} - Relay order status
/// - GET  /payment-success   - Result page with deep link back to the app
pub fn create_router(state: AppState) -> Router {
    // The mobile webview and browser callers come from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::home))
        .route("/pay", post(handlers::create_payment))
        .route("/status/{order_id}", get(handlers::check_status))
        .route("/payment-success", get(handlers::payment_success))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
