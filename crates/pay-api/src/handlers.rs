//! # Request Handlers
//!
//! Axum request handlers for the checkout relay.
//! Starts payments, relays status lookups and serves the post-payment page.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use pay_core::{GatewayResponse, PaymentOutcome};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Start-payment request.
///
/// Fields are kept as raw JSON so bad values fall back to defaults instead of
/// failing the request.
#[derive(Debug, Default)]
pub struct PayRequest {
    /// Amount in paise
    pub amount: Option<Value>,
    /// Caller's user id
    pub user_id: Option<Value>,
}

impl PayRequest {
    /// Parse a request body, treating anything but a JSON object as `{}`.
    ///
    /// Each field is read on its own, so one bad or repeated key never
    /// discards the others. A repeated key keeps its last value.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }

        let mut fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                warn!("Ignoring non-object /pay body: {}", json_kind(&other));
                return Self::default();
            }
            Err(e) => {
                warn!("Ignoring unreadable /pay body: {}", e);
                return Self::default();
            }
        };

        Self {
            amount: fields.remove("amount"),
            user_id: fields.remove("userId"),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Successful start-payment response
#[derive(Debug, Serialize)]
pub struct PayResponse {
    pub status: &'static str,
    #[serde(rename = "merchantOrderId")]
    pub merchant_order_id: String,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
}

/// Status lookup response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub payment_state: String,
    pub transaction_id: Option<String>,
    pub amount: Option<i64>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// "failed" (400) or "error" (500)
    pub status: &'static str,
    pub message: String,
}

impl ErrorResponse {
    /// 400 "failed" response
    pub fn failed(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                status: "failed",
                message: message.into(),
            }),
        )
    }

    /// 500 "error" response
    pub fn error(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self {
                status: "error",
                message: message.into(),
            }),
        )
    }
}

fn gateway_response_to_result(
    order_id: String,
    response: GatewayResponse,
) -> Result<Json<PayResponse>, (StatusCode, Json<ErrorResponse>)> {
    match response {
        GatewayResponse::Redirect { redirect_url } => Ok(Json(PayResponse {
            status: "success",
            merchant_order_id: order_id,
            redirect_url,
        })),
        GatewayResponse::Rejected { message } => Err(ErrorResponse::failed(message)),
        GatewayResponse::Failed { message } => Err(ErrorResponse::error(message)),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Status probe
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "Checkout Relay Running",
        "redirect_url": state.intents.redirect_url(),
        "environment": state.gateway_environment(),
        "tip": "POST /pay with amount in paise"
    }))
}

/// Start a payment and return the gateway's redirect URL
#[instrument(skip(state, body))]
pub async fn create_payment(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PayResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = PayRequest::from_body(&body);
    let intent = state
        .intents
        .build_from_json(request.amount.as_ref(), request.user_id.as_ref());

    let response = state.mediator.initiate(&intent).await;
    if response.is_success() {
        info!("Payment started: {}", intent.order_id());
    }

    gateway_response_to_result(intent.order_id().to_string(), response)
}

/// Relay an order status lookup
#[instrument(skip(state))]
pub async fn check_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let result = state
        .mediator
        .query_status(&order_id)
        .await
        .map_err(|e| ErrorResponse::error(e.to_string()))?;

    Ok(Json(StatusResponse {
        status: "success",
        payment_state: result.state,
        transaction_id: result.transaction_id,
        amount: result.amount,
    }))
}

/// Page the gateway redirects the customer to after payment
pub async fn payment_success(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let outcome = PaymentOutcome::from_query(&params);
    log_outcome(&outcome);
    Html(state.renderer.render(&outcome))
}

/// Query values are caller-controlled, so they go in as debug-formatted fields
/// where control characters come out escaped.
fn log_outcome(outcome: &PaymentOutcome) {
    info!(
        order_id = ?outcome.order_id,
        status = ?outcome.status,
        success = outcome.is_success(),
        "Result page"
    );
}
