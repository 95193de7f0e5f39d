//! # Result Page
//!
//! The page the gateway redirects the customer's browser to once a payment
//! finishes. It shows the outcome and hands control back to the mobile app,
//! first through an in-app webview bridge and then through a custom-scheme
//! deep link.
//!
//! Every value comes from the query string, so it is escaped for the context
//! it lands in: HTML text, a JavaScript string literal, or a URL query.

use std::collections::HashMap;
use url::form_urlencoded;

/// Shown when neither `merchantOrderId` nor `orderId` is present
pub const MISSING_ORDER_ID: &str = "N/A";

/// Status assumed when the redirect carries none
pub const DEFAULT_STATUS: &str = "PENDING";

/// The only status rendered as a success
pub const COMPLETED_STATUS: &str = "COMPLETED";

/// Default deep link back into the app
pub const DEFAULT_DEEP_LINK: &str = "stylehub://payment-success";

/// Handler name registered by the in-app webview
pub const DEFAULT_BRIDGE_HANDLER: &str = "paymentResult";

/// Delay before the deep link navigation fires
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 1500;

/// Order id and status extracted from the redirect query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub order_id: String,
    pub status: String,
}

impl PaymentOutcome {
    pub fn new(order_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            status: status.into(),
        }
    }

    /// Read the outcome from query parameters.
    ///
    /// `merchantOrderId` wins over `orderId`; empty values count as absent.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let non_empty = |key: &str| params.get(key).filter(|v| !v.is_empty());

        let order_id = non_empty("merchantOrderId")
            .or_else(|| non_empty("orderId"))
            .map(String::as_str)
            .unwrap_or(MISSING_ORDER_ID);
        let status = non_empty("status")
            .map(String::as_str)
            .unwrap_or(DEFAULT_STATUS);

        Self::new(order_id, status)
    }

    /// Binary classification: only `COMPLETED` (any case) is a success.
    /// `PENDING` renders as a failure.
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case(COMPLETED_STATUS)
    }
}

/// Renders the result page
#[derive(Debug, Clone)]
pub struct ResultPageRenderer {
    deep_link: String,
    bridge_handler: String,
    redirect_delay_ms: u64,
}

impl Default for ResultPageRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_DEEP_LINK)
    }
}

impl ResultPageRenderer {
    pub fn new(deep_link: impl Into<String>) -> Self {
        Self {
            deep_link: deep_link.into(),
            bridge_handler: DEFAULT_BRIDGE_HANDLER.to_string(),
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
        }
    }

    /// Builder: set the webview bridge handler name
    pub fn with_bridge_handler(mut self, handler: impl Into<String>) -> Self {
        self.bridge_handler = handler.into();
        self
    }

    /// Builder: set the delay before navigating to the deep link
    pub fn with_redirect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.redirect_delay_ms = delay_ms;
        self
    }

    /// Deep link carrying the outcome as percent-encoded query params
    pub fn deep_link(&self, outcome: &PaymentOutcome) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("orderId", &outcome.order_id)
            .append_pair("status", &outcome.status)
            .finish();
        let separator = if self.deep_link.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.deep_link, separator, query)
    }

    /// Render the full HTML document
    pub fn render(&self, outcome: &PaymentOutcome) -> String {
        let (class, headline) = if outcome.is_success() {
            ("success", "Payment Successful!")
        } else {
            ("failed", "Payment Failed")
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Payment Complete</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body {{font-family: system-ui; text-align: center; padding: 60px; background: #f8f9fa;}}
        .box {{background: white; padding: 40px; border-radius: 20px; box-shadow: 0 10px 30px rgba(0,0,0,0.1); max-width: 400px; margin: auto;}}
        .success {{color: #28a745;}} .failed {{color: #dc3545;}}
    </style>
</head>
<body>
    <div class="box">
        <h1 class="{class}">{headline}</h1>
        <p><strong>Order ID:</strong> {order_id}</p>
        <p><strong>Status:</strong> {status}</p>
        <p>Returning to app...</p>
    </div>
    <script>
        if (window.flutter_inappwebview) {{
            window.flutter_inappwebview.callHandler({handler}, {{
                orderId: {order_id_js},
                status: {status_js}
            }});
        }}
        setTimeout(function () {{
            window.location.href = {deep_link_js};
        }}, {delay});
    </script>
</body>
</html>
"#,
            class = class,
            headline = headline,
            order_id = escape_html(&outcome.order_id),
            status = escape_html(&outcome.status),
            handler = js_string(&self.bridge_handler),
            order_id_js = js_string(&outcome.order_id),
            status_js = js_string(&outcome.status),
            deep_link_js = js_string(&self.deep_link(outcome)),
            delay = self.redirect_delay_ms,
        )
    }
}

/// Escape text for an HTML element body or attribute
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a value as a JavaScript string literal safe inside `<script>`
fn js_string(raw: &str) -> String {
    // serde_json leaves `<` alone, which would let `</script>` close the block
    serde_json::Value::String(raw.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_outcome_defaults() {
        let outcome = PaymentOutcome::from_query(&HashMap::new());
        assert_eq!(outcome.order_id, MISSING_ORDER_ID);
        assert_eq!(outcome.status, DEFAULT_STATUS);
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_outcome_prefers_merchant_order_id() {
        let outcome = PaymentOutcome::from_query(&query(&[
            ("orderId", "B"),
            ("merchantOrderId", "A"),
            ("status", "COMPLETED"),
        ]));
        assert_eq!(outcome.order_id, "A");

        let outcome = PaymentOutcome::from_query(&query(&[("merchantOrderId", ""), ("orderId", "B")]));
        assert_eq!(outcome.order_id, "B");
    }

    #[test]
    fn test_classification_is_case_insensitive_and_binary() {
        assert!(PaymentOutcome::new("X", "COMPLETED").is_success());
        assert!(PaymentOutcome::new("X", "completed").is_success());
        assert!(!PaymentOutcome::new("X", "FAILED").is_success());
        assert!(!PaymentOutcome::new("X", "PENDING").is_success());
        assert!(!PaymentOutcome::new("X", "COMPLETED_LATER").is_success());
    }

    #[test]
    fn test_render_success_and_failure() {
        let renderer = ResultPageRenderer::default();

        let html = renderer.render(&PaymentOutcome::new("ORDER_abc", "COMPLETED"));
        assert!(html.contains("Payment Successful!"));
        assert!(html.contains("ORDER_abc"));

        let html = renderer.render(&PaymentOutcome::new("ORDER_abc", "FAILED"));
        assert!(html.contains("Payment Failed"));
        assert!(!html.contains("Payment Successful!"));
    }

    #[test]
    fn test_render_includes_bridge_and_deep_link() {
        let html = ResultPageRenderer::default().render(&PaymentOutcome::new("ORDER_abc", "COMPLETED"));
        assert!(html.contains("window.flutter_inappwebview.callHandler(\"paymentResult\""));
        assert!(html.contains("\"stylehub://payment-success?orderId=ORDER_abc&status=COMPLETED\""));
        assert!(html.contains("}, 1500);"));
    }

    #[test]
    fn test_deep_link_percent_encodes() {
        let renderer = ResultPageRenderer::new("myapp://done");
        let link = renderer.deep_link(&PaymentOutcome::new("a b&c=d", "OK"));
        assert_eq!(link, "myapp://done?orderId=a+b%26c%3Dd&status=OK");

        let renderer = ResultPageRenderer::new("myapp://done?src=web");
        let link = renderer.deep_link(&PaymentOutcome::new("X", "OK"));
        assert_eq!(link, "myapp://done?src=web&orderId=X&status=OK");
    }

    #[test]
    fn test_render_escapes_untrusted_values() {
        let payload = "<script>alert('x')</script>";
        let html = ResultPageRenderer::default().render(&PaymentOutcome::new(payload, payload));

        assert!(!html.contains(payload));
        assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
        assert!(html.contains("\\u003cscript\\u003e"));
    }

    #[test]
    fn test_custom_renderer_settings() {
        let html = ResultPageRenderer::new("shop://paid")
            .with_bridge_handler("onPaid")
            .with_redirect_delay_ms(250)
            .render(&PaymentOutcome::new("X", "COMPLETED"));

        assert!(html.contains("callHandler(\"onPaid\""));
        assert!(html.contains("}, 250);"));
        assert!(html.contains("shop://paid?orderId=X&status=COMPLETED"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(escape_html("a&b\"c"), "a&amp;b&quot;c");
    }
}
