//! # pay-api
//!
//! HTTP API layer for checkout-relay-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Payment start and status relay endpoints
//! - The post-payment result page that hands control back to the mobile app
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Status probe |
//! | POST | `/pay` | Start a payment, returns the gateway redirect URL |
//! | GET | `/status/{order_id}` | Order status from the gateway |
//! | GET | `/payment-success` | Result page with deep link back to the app |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
