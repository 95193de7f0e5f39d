//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the intent builder, the gateway mediator and the result page renderer.

use pay_core::{BoxedPaymentGateway, GatewayMediator, IntentBuilder, ResultPageRenderer};
use pay_core::intent::DEFAULT_PLATFORM;
use pay_core::result_page::{DEFAULT_BRIDGE_HANDLER, DEFAULT_DEEP_LINK, DEFAULT_REDIRECT_DELAY_MS};
use pay_phonepe::PhonePeCheckoutGateway;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL the gateway redirects back to
    pub redirect_base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Deep link the result page hands control back to
    pub deep_link: String,
    /// Platform tag recorded in every intent
    pub client_platform: String,
    /// Webview bridge the result page posts the outcome to
    pub bridge_handler: String,
    /// Delay before the result page follows the deep link
    pub redirect_delay_ms: u64,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            redirect_base_url: lookup("REDIRECT_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            deep_link: lookup("APP_DEEP_LINK").unwrap_or_else(|| DEFAULT_DEEP_LINK.to_string()),
            client_platform: lookup("CLIENT_PLATFORM")
                .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
            bridge_handler: lookup("APP_BRIDGE_HANDLER")
                .unwrap_or_else(|| DEFAULT_BRIDGE_HANDLER.to_string()),
            redirect_delay_ms: lookup("APP_REDIRECT_DELAY_MS")
                .and_then(|d| d.parse().ok())
                .unwrap_or(DEFAULT_REDIRECT_DELAY_MS),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Builds payment intents against the configured redirect base
    pub intents: IntentBuilder,
    /// Talks to the payment gateway
    pub mediator: GatewayMediator,
    /// Renders the post-payment page
    pub renderer: Arc<ResultPageRenderer>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by the PhonePe gateway
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let gateway = PhonePeCheckoutGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize PhonePe: {}", e))?;

        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// Create an AppState around any gateway
    pub fn with_gateway(config: AppConfig, gateway: BoxedPaymentGateway) -> Self {
        let intents = IntentBuilder::new(&config.redirect_base_url)
            .with_platform(&config.client_platform);
        let renderer = ResultPageRenderer::new(&config.deep_link)
            .with_bridge_handler(&config.bridge_handler)
            .with_redirect_delay_ms(config.redirect_delay_ms);

        Self {
            intents,
            mediator: GatewayMediator::new(gateway),
            renderer: Arc::new(renderer),
            config,
        }
    }

    /// Label for the gateway environment
    pub fn gateway_environment(&self) -> &'static str {
        if self.mediator.gateway().is_production() {
            "PRODUCTION"
        } else {
            "SANDBOX"
        }
    }
}
