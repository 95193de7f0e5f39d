//! # Checkout Relay RS
//!
//! Starts PhonePe checkouts for the mobile app and brings the customer back.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export CLIENT_ID=...
//! export CLIENT_SECRET=...
//! export REDIRECT_BASE_URL=https://relay.example.com
//!
//! # Run the server
//! checkout-relay
//! ```

use pay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Gateway: {} ({})", state.mediator.gateway().provider_name(), state.gateway_environment());
    info!("Redirect URL: {}", state.intents.redirect_url());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Checkout relay starting on http://{}", addr);

    if !is_prod {
        info!("Probe: GET http://{}/", addr);
        info!("Pay: POST http://{}/pay", addr);
        info!("Status: GET http://{}/status/{{order_id}}", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
