//! # Payment Gateway
//!
//! The `PaymentGateway` trait is the seam to the external payment provider.
//! `GatewayMediator` drives it and flattens every outcome into the relay's
//! own response shapes.
//!
//! ```text
//! ┌──────────────┐  initiate()      ┌──────────────────────┐  pay()        ┌──────────┐
//! │  HTTP layer  │ ───────────────▶ │    GatewayMediator   │ ────────────▶ │ provider │
//! │              │ ◀─────────────── │ (flattens responses) │ ◀──────────── │          │
//! └──────────────┘  GatewayResponse └──────────────────────┘  CheckoutReply└──────────┘
//! ```

use crate::error::PaymentResult;
use crate::intent::{MerchantOrderId, PaymentIntent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Message returned when the provider accepts a payment but gives no redirect
pub const NO_REDIRECT_MESSAGE: &str = "no redirect from provider";

/// State reported when the provider omits one
pub const UNKNOWN_STATE: &str = "UNKNOWN";

/// Provider reply to a checkout request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutReply {
    /// Provider's own order id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_order_id: Option<String>,

    /// Order state as reported by the provider (e.g. "PENDING")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Hosted checkout URL for the customer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    /// When the checkout link stops working
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Provider reply to a status query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Amount in minor units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

/// Core trait for payment provider implementations.
///
/// The HTTP layer holds one long-lived instance behind an `Arc`; tests swap
/// in a stub.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a hosted checkout for the given intent.
    async fn pay(&self, intent: &PaymentIntent) -> PaymentResult<CheckoutReply>;

    /// Look up the state of a previously started order.
    async fn order_status(&self, merchant_order_id: &str) -> PaymentResult<OrderStatus>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;

    /// Whether this gateway talks to a production environment.
    fn is_production(&self) -> bool {
        false
    }
}

/// Type alias for a shared payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

/// Outcome of starting a payment, as seen by the relay's callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse {
    /// Provider accepted the intent; send the customer here
    Redirect { redirect_url: String },
    /// Provider answered without a redirect URL (client-error class)
    Rejected { message: String },
    /// Provider call failed for any reason (server-error class)
    Failed { message: String },
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, GatewayResponse::Redirect { .. })
    }

    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            GatewayResponse::Redirect { redirect_url } => Some(redirect_url),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            GatewayResponse::Redirect { .. } => None,
            GatewayResponse::Rejected { message } | GatewayResponse::Failed { message } => {
                Some(message)
            }
        }
    }
}

/// Normalized answer to a status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusQueryResult {
    pub order_id: String,
    pub state: String,
    pub transaction_id: Option<String>,
    pub amount: Option<i64>,
}

impl StatusQueryResult {
    fn from_reply(order_id: &str, reply: OrderStatus) -> Self {
        Self {
            order_id: order_id.to_string(),
            state: reply
                .state
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_STATE.to_string()),
            transaction_id: reply.transaction_id,
            amount: reply.amount,
        }
    }
}

/// Forwards intents and status queries to the injected gateway
#[derive(Clone)]
pub struct GatewayMediator {
    gateway: BoxedPaymentGateway,
}

impl GatewayMediator {
    pub fn new(gateway: BoxedPaymentGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &BoxedPaymentGateway {
        &self.gateway
    }

    /// Forward an intent to the provider and flatten the reply.
    #[instrument(skip(self, intent), fields(order_id = %intent.order_id(), provider = self.gateway.provider_name()))]
    pub async fn initiate(&self, intent: &PaymentIntent) -> GatewayResponse {
        info!(
            created_at = %intent.created_at(),
            "Creating payment → {} | {}",
            intent.order_id(),
            intent.display_amount()
        );

        match self.gateway.pay(intent).await {
            Ok(reply) => match reply.redirect_url.filter(|url| !url.is_empty()) {
                Some(redirect_url) => {
                    info!(state = ?reply.state, "Provider returned redirect");
                    GatewayResponse::Redirect { redirect_url }
                }
                None => {
                    warn!(state = ?reply.state, "Provider accepted payment without a redirect URL");
                    GatewayResponse::Rejected {
                        message: NO_REDIRECT_MESSAGE.to_string(),
                    }
                }
            },
            Err(e) => {
                error!(retryable = e.is_retryable(), "Payment error: {}", e);
                GatewayResponse::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Relay a status lookup for the given order id.
    ///
    /// Ids this relay did not mint are still forwarded; the provider decides
    /// whether the order exists.
    #[instrument(skip(self), fields(provider = self.gateway.provider_name()))]
    pub async fn query_status(&self, order_id: &str) -> PaymentResult<StatusQueryResult> {
        if !MerchantOrderId::is_well_formed(order_id) {
            warn!("Status lookup for an order id not issued by this relay");
        }

        let reply = self.gateway.order_status(order_id).await.map_err(|e| {
            error!(retryable = e.is_retryable(), "Status lookup failed: {}", e);
            e
        })?;

        let result = StatusQueryResult::from_reply(order_id, reply);
        info!(state = %result.state, "Status lookup complete");
        Ok(result)
    }
}
