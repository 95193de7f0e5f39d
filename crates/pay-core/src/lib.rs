//! # pay-core
//!
//! Core types and traits for the checkout relay.
//!
//! This crate provides:
//! - `MerchantOrderId` and `IntentBuilder` for minting payment intents
//! - `PaymentGateway` trait for implementing payment providers
//! - `GatewayMediator` for flattening provider replies into relay responses
//! - `ResultPageRenderer` for the post-payment page that returns to the app
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{GatewayMediator, IntentBuilder};
//!
//! let builder = IntentBuilder::new("https://relay.example.com");
//! let intent = builder.build(Some(10_000), Some("user-42".into()));
//!
//! let mediator = GatewayMediator::new(gateway);
//! let response = mediator.initiate(&intent).await;
//!
//! // Send the caller to response.redirect_url()
//! ```

pub mod error;
pub mod gateway;
pub mod intent;
pub mod result_page;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult};
pub use gateway::{
    BoxedPaymentGateway, CheckoutReply, GatewayMediator, GatewayResponse, OrderStatus,
    PaymentGateway, StatusQueryResult,
};
pub use intent::{IntentBuilder, MerchantOrderId, PaymentIntent};
pub use result_page::{PaymentOutcome, ResultPageRenderer};
