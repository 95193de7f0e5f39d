//! # pay-phonepe
//!
//! PhonePe payment gateway for checkout-relay-rs.
//!
//! `PhonePeCheckoutGateway` implements `pay_core::PaymentGateway` over the
//! Standard Checkout v2 REST API:
//! - OAuth client-credentials token, cached per gateway instance
//! - `POST /checkout/v2/pay` to start a hosted checkout
//! - `GET /checkout/v2/order/{id}/status` to look up an order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_phonepe::PhonePeCheckoutGateway;
//! use pay_core::{GatewayMediator, IntentBuilder};
//! use std::sync::Arc;
//!
//! // Reads CLIENT_ID, CLIENT_SECRET, CLIENT_VERSION, PHONEPE_ENV
//! let gateway = PhonePeCheckoutGateway::from_env()?;
//! let mediator = GatewayMediator::new(Arc::new(gateway));
//!
//! let intent = IntentBuilder::new("https://relay.example.com").build(Some(10_000), None);
//! let response = mediator.initiate(&intent).await;
//! ```

pub mod checkout;
pub mod config;

// Re-exports
pub use checkout::PhonePeCheckoutGateway;
pub use config::{PhonePeConfig, PhonePeEnv};
