//! # Payment Intents
//!
//! Merchant order ids and the normalized payment intent handed to a gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Literal tag every merchant order id starts with
pub const ORDER_ID_PREFIX: &str = "ORDER_";

/// Number of random hex characters after the prefix
const ORDER_ID_RANDOM_LEN: usize = 20;

/// Amount charged when the caller sends none (in minor units, e.g. paise)
pub const DEFAULT_AMOUNT: i64 = 10_000;

/// User id recorded when the caller sends none
pub const DEFAULT_USER_ID: &str = "guest";

/// Platform tag recorded in intent metadata when none is configured
pub const DEFAULT_PLATFORM: &str = "flutter";

/// Path appended to the redirect base for the result page
pub const RESULT_PAGE_PATH: &str = "/payment-success";

/// Metadata slot carrying the caller's user id
pub const META_USER_ID: &str = "udf1";

/// Metadata slot carrying the client platform tag
pub const META_PLATFORM: &str = "udf2";

/// A merchant order reference minted by this service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantOrderId(String);

impl MerchantOrderId {
    /// Mint a fresh order id: `ORDER_` + 20 hex chars from a v4 UUID.
    ///
    /// Only `[0-9a-z_]` appear, so the id embeds in a query string as-is.
    pub fn generate() -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", ORDER_ID_PREFIX, &random[..ORDER_ID_RANDOM_LEN]))
    }

    /// Check whether a string has the shape of a generated id
    pub fn is_well_formed(candidate: &str) -> bool {
        candidate
            .strip_prefix(ORDER_ID_PREFIX)
            .map(|rest| {
                rest.len() == ORDER_ID_RANDOM_LEN
                    && rest.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
            })
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MerchantOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MerchantOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What is being charged, to whom it redirects, and under which order id.
///
/// Built once per "start payment" request and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    order_id: MerchantOrderId,
    amount: i64,
    user_id: String,
    redirect_url: String,
    metadata: BTreeMap<String, String>,
    created_at: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn order_id(&self) -> &MerchantOrderId {
        &self.order_id
    }

    /// Amount in minor currency units (always > 0)
    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Where the gateway sends the customer's browser afterwards
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Amount in major units, for display in logs
    pub fn display_amount(&self) -> String {
        format!("₹{:.2}", self.amount as f64 / 100.0)
    }
}

/// Builds payment intents against a fixed redirect base.
///
/// Callers choose amount and user id; the redirect target and platform tag
/// come from configuration and cannot be overridden per request.
#[derive(Debug, Clone)]
pub struct IntentBuilder {
    redirect_base: String,
    platform: String,
}

impl IntentBuilder {
    pub fn new(redirect_base: impl Into<String>) -> Self {
        let redirect_base: String = redirect_base.into();
        Self {
            redirect_base: redirect_base.trim_end_matches('/').to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }

    /// Builder: set the client platform tag
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Full URL of the result page the gateway redirects to
    pub fn redirect_url(&self) -> String {
        format!("{}{}", self.redirect_base, RESULT_PAGE_PATH)
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Build an intent from already-typed values
    pub fn build(&self, amount: Option<i64>, user_id: Option<String>) -> PaymentIntent {
        let amount = amount.filter(|a| *a > 0).unwrap_or(DEFAULT_AMOUNT);
        let user_id = user_id.unwrap_or_else(|| DEFAULT_USER_ID.to_string());

        let mut metadata = BTreeMap::new();
        metadata.insert(META_USER_ID.to_string(), user_id.clone());
        metadata.insert(META_PLATFORM.to_string(), self.platform.clone());

        PaymentIntent {
            order_id: MerchantOrderId::generate(),
            amount,
            user_id,
            redirect_url: self.redirect_url(),
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Build an intent from raw JSON fields, coercing instead of rejecting
    pub fn build_from_json(&self, amount: Option<&Value>, user_id: Option<&Value>) -> PaymentIntent {
        self.build(
            amount.and_then(coerce_amount),
            user_id.and_then(coerce_user_id),
        )
    }
}

/// Interpret a JSON value as an amount in minor units.
///
/// Integers pass through, floats truncate toward zero, numeric strings are
/// parsed. Returns `None` for anything else or for non-positive results.
pub fn coerce_amount(value: &Value) -> Option<i64> {
    let amount = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }?;
    (amount > 0).then_some(amount)
}

/// Interpret a JSON value as a user id
pub fn coerce_user_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
