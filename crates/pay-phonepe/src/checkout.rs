//! # PhonePe Standard Checkout
//!
//! `PaymentGateway` implementation over the PhonePe Standard Checkout v2 API.
//! Every call carries an OAuth access token, fetched with the client
//! credentials and cached until shortly before it expires.

use crate::config::PhonePeConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pay_core::{
    CheckoutReply, OrderStatus, PaymentError, PaymentGateway, PaymentIntent, PaymentResult,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "phonepe";

/// Refresh the token this many seconds before PhonePe says it expires
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Cached OAuth token
#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    token_type: String,
    expires_at: i64,
}

impl AccessToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - TOKEN_REFRESH_MARGIN_SECS > now
    }

    fn header(&self) -> String {
        format!("{} {}", self.token_type, self.value)
    }
}

/// PhonePe Standard Checkout gateway
///
/// Sends the customer to PhonePe's hosted payment page and relays order
/// status lookups.
pub struct PhonePeCheckoutGateway {
    config: PhonePeConfig,
    client: Client,
    token: RwLock<Option<AccessToken>>,
}

impl PhonePeCheckoutGateway {
    /// Create a new PhonePe gateway
    pub fn new(config: PhonePeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            token: RwLock::new(None),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = PhonePeConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &PhonePeConfig {
        &self.config
    }

    /// Authorization header value, fetching a new token when needed
    async fn authorization(&self) -> PaymentResult<String> {
        let now = Utc::now().timestamp();

        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.header());
            }
        }

        let mut guard = self.token.write().await;
        // another request may have refreshed it while we waited
        if let Some(token) = guard.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.header());
            }
        }

        let token = self.fetch_token().await?;
        let header = token.header();
        *guard = Some(token);
        Ok(header)
    }

    #[instrument(skip(self))]
    async fn fetch_token(&self) -> PaymentResult<AccessToken> {
        let url = format!("{}/v1/oauth/token", self.config.auth_base_url);
        let client_version = self.config.client_version.to_string();

        let form_params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_version", client_version.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("PhonePe token error: status={}, body={}", status, body);
            return Err(PaymentError::Authentication(provider_message(status, &body)));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse PhonePe token: {}", e))
        })?;

        debug!("Fetched PhonePe access token, expires_at={}", token.expires_at);

        Ok(AccessToken {
            value: token.access_token,
            token_type: token.token_type.unwrap_or_else(|| "O-Bearer".to_string()),
            expires_at: token.expires_at,
        })
    }

    /// Send an authorized request and return the body of a 2xx reply
    async fn send(&self, request: reqwest::RequestBuilder) -> PaymentResult<String> {
        let authorization = self.authorization().await?;

        let response = request
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("PhonePe API error: status={}, body={}", status, body);
            return Err(PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: provider_message(status, &body),
            });
        }

        Ok(body)
    }

    fn pay_request(intent: &PaymentIntent) -> PayRequest<'_> {
        PayRequest {
            merchant_order_id: intent.order_id().as_str(),
            amount: intent.amount(),
            meta_info: intent.metadata(),
            payment_flow: PaymentFlow {
                flow_type: "PG_CHECKOUT",
                merchant_urls: MerchantUrls {
                    redirect_url: intent.redirect_url(),
                },
            },
        }
    }
}

#[async_trait]
impl PaymentGateway for PhonePeCheckoutGateway {
    #[instrument(skip(self, intent), fields(order_id = %intent.order_id()))]
    async fn pay(&self, intent: &PaymentIntent) -> PaymentResult<CheckoutReply> {
        let url = format!("{}/checkout/v2/pay", self.config.api_base_url);
        let request = self.client.post(&url).json(&Self::pay_request(intent));

        let body = self.send(request).await?;

        let reply: PayResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse PhonePe response: {}", e))
        })?;

        info!(
            "Created PhonePe checkout: order={:?}, state={:?}",
            reply.order_id, reply.state
        );

        Ok(CheckoutReply {
            provider_order_id: reply.order_id,
            state: reply.state,
            redirect_url: reply.redirect_url,
            expires_at: reply.expire_at.and_then(DateTime::<Utc>::from_timestamp_millis),
        })
    }

    #[instrument(skip(self))]
    async fn order_status(&self, merchant_order_id: &str) -> PaymentResult<OrderStatus> {
        let invalid_base =
            || PaymentError::Configuration(format!("Invalid PhonePe base URL: {}", self.config.api_base_url));

        // the id comes straight from the request path, so push it as one encoded segment
        let mut url = reqwest::Url::parse(&format!("{}/checkout/v2/order", self.config.api_base_url))
            .map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .push(merchant_order_id)
            .push("status");

        let request = self.client.get(url).query(&[("details", "false")]);

        let body = self.send(request).await?;

        let reply: StatusResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse PhonePe status: {}", e))
        })?;

        let transaction_id = reply
            .payment_details
            .iter()
            .rev()
            .find_map(|attempt| attempt.transaction_id.clone());

        Ok(OrderStatus {
            state: reply.state,
            transaction_id,
            amount: reply.amount,
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn is_production(&self) -> bool {
        self.config.is_production()
    }
}

/// Best human-readable message from an error reply
fn provider_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.message.or(e.code))
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body))
}

// =============================================================================
// PhonePe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_at: i64,
    #[serde(default)]
    token_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PayRequest<'a> {
    merchant_order_id: &'a str,
    amount: i64,
    meta_info: &'a BTreeMap<String, String>,
    payment_flow: PaymentFlow<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentFlow<'a> {
    #[serde(rename = "type")]
    flow_type: &'static str,
    merchant_urls: MerchantUrls<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MerchantUrls<'a> {
    redirect_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayResponse {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    expire_at: Option<i64>,
    #[serde(default)]
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    payment_details: Vec<PaymentAttempt>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentAttempt {
    #[serde(default)]
    transaction_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhonePeEnv;
    use pay_core::IntentBuilder;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_token(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok_123",
                "expires_at": Utc::now().timestamp() + 3600,
                "token_type": "O-Bearer"
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn gateway(server: &MockServer) -> PhonePeCheckoutGateway {
        let config = PhonePeConfig::new("client", "secret", 1, PhonePeEnv::Sandbox)
            .with_base_url(server.uri());
        PhonePeCheckoutGateway::new(config).unwrap()
    }

    #[test]
    fn test_pay_request_shape() {
        let intent = IntentBuilder::new("https://relay.example.com").build(Some(500), Some("u1".into()));
        let value = serde_json::to_value(PhonePeCheckoutGateway::pay_request(&intent)).unwrap();

        assert_eq!(value["merchantOrderId"], intent.order_id().as_str());
        assert_eq!(value["amount"], 500);
        assert_eq!(value["metaInfo"]["udf1"], "u1");
        assert_eq!(value["metaInfo"]["udf2"], "flutter");
        assert_eq!(value["paymentFlow"]["type"], "PG_CHECKOUT");
        assert_eq!(
            value["paymentFlow"]["merchantUrls"]["redirectUrl"],
            "https://relay.example.com/payment-success"
        );
    }

    #[test]
    fn test_token_freshness() {
        let token = AccessToken {
            value: "t".into(),
            token_type: "O-Bearer".into(),
            expires_at: 1_000,
        };
        assert!(token.is_fresh(900));
        assert!(!token.is_fresh(950));
        assert_eq!(token.header(), "O-Bearer t");
    }

    #[test]
    fn test_provider_message() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            provider_message(status, r#"{"code":"BAD_REQUEST","message":"Invalid amount"}"#),
            "Invalid amount"
        );
        assert_eq!(provider_message(status, r#"{"code":"BAD_REQUEST"}"#), "BAD_REQUEST");
        assert_eq!(provider_message(status, "oops"), "HTTP 400 Bad Request: oops");
    }

    #[tokio::test]
    async fn test_pay_returns_redirect() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("POST"))
            .and(path("/checkout/v2/pay"))
            .and(header("Authorization", "O-Bearer tok_123"))
            .and(body_partial_json(json!({ "amount": 2500 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orderId": "OMO123",
                "state": "PENDING",
                "expireAt": 1_735_689_600_000_i64,
                "redirectUrl": "https://mercury-uat.phonepe.com/transact/abc"
            })))
            .mount(&server)
            .await;

        let intent = IntentBuilder::new("http://localhost:5000").build(Some(2500), None);
        let reply = gateway(&server).pay(&intent).await.unwrap();

        assert_eq!(reply.provider_order_id.as_deref(), Some("OMO123"));
        assert_eq!(reply.state.as_deref(), Some("PENDING"));
        assert_eq!(
            reply.redirect_url.as_deref(),
            Some("https://mercury-uat.phonepe.com/transact/abc")
        );
        assert!(reply.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_pay_surfaces_provider_error() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("POST"))
            .and(path("/checkout/v2/pay"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "BAD_REQUEST",
                "message": "Amount should be greater than 100"
            })))
            .mount(&server)
            .await;

        let intent = IntentBuilder::new("http://localhost:5000").build(Some(1), None);
        let err = gateway(&server).pay(&intent).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Provider error [phonepe]: Amount should be greater than 100"
        );
    }

    #[tokio::test]
    async fn test_token_failure_is_authentication_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "401",
                "message": "Client Not Found"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).order_status("ORDER_x").await.unwrap_err();
        assert!(matches!(err, PaymentError::Authentication(ref m) if m == "Client Not Found"));
    }

    #[tokio::test]
    async fn test_order_status_and_token_reuse() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/checkout/v2/order/ORDER_abc/status"))
            .and(header("Authorization", "O-Bearer tok_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orderId": "OMO123",
                "state": "COMPLETED",
                "amount": 500,
                "paymentDetails": [
                    { "transactionId": "OM_first", "state": "FAILED" },
                    { "transactionId": "OM_second", "state": "COMPLETED" }
                ]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let gateway = gateway(&server);
        for _ in 0..2 {
            let status = gateway.order_status("ORDER_abc").await.unwrap();
            assert_eq!(status.state.as_deref(), Some("COMPLETED"));
            assert_eq!(status.transaction_id.as_deref(), Some("OM_second"));
            assert_eq!(status.amount, Some(500));
        }
    }

    #[tokio::test]
    async fn test_order_status_with_sparse_reply() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/checkout/v2/order/ORDER_new/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "PENDING" })))
            .mount(&server)
            .await;

        let status = gateway(&server).order_status("ORDER_new").await.unwrap();
        assert_eq!(status.state.as_deref(), Some("PENDING"));
        assert!(status.transaction_id.is_none());
        assert!(status.amount.is_none());
    }
}
