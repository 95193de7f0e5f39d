//! # PhonePe Configuration
//!
//! Configuration management for the PhonePe integration.
//! Credentials are loaded from environment variables.

use pay_core::PaymentError;
use std::env;
use std::str::FromStr;

const SANDBOX_BASE_URL: &str = "https://api-preprod.phonepe.com/apis/pg-sandbox";
const PRODUCTION_AUTH_BASE_URL: &str = "https://api.phonepe.com/apis/identity-manager";
const PRODUCTION_API_BASE_URL: &str = "https://api.phonepe.com/apis/pg";

/// Which PhonePe environment to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhonePeEnv {
    #[default]
    Sandbox,
    Production,
}

impl PhonePeEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhonePeEnv::Sandbox => "SANDBOX",
            PhonePeEnv::Production => "PRODUCTION",
        }
    }

    fn auth_base_url(&self) -> &'static str {
        match self {
            PhonePeEnv::Sandbox => SANDBOX_BASE_URL,
            PhonePeEnv::Production => PRODUCTION_AUTH_BASE_URL,
        }
    }

    fn api_base_url(&self) -> &'static str {
        match self {
            PhonePeEnv::Sandbox => SANDBOX_BASE_URL,
            PhonePeEnv::Production => PRODUCTION_API_BASE_URL,
        }
    }
}

impl FromStr for PhonePeEnv {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "uat" | "preprod" => Ok(PhonePeEnv::Sandbox),
            "production" | "prod" | "live" => Ok(PhonePeEnv::Production),
            other => Err(PaymentError::Configuration(format!(
                "PHONEPE_ENV must be sandbox or production, got {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PhonePeEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PhonePe API configuration
#[derive(Debug, Clone)]
pub struct PhonePeConfig {
    /// OAuth client id issued by PhonePe
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Client version issued alongside the credentials
    pub client_version: u32,

    /// Sandbox or production
    pub env: PhonePeEnv,

    /// Base URL of the OAuth token endpoint (for testing/mocking)
    pub auth_base_url: String,

    /// Base URL of the checkout API (for testing/mocking)
    pub api_base_url: String,
}

impl PhonePeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `CLIENT_ID`
    /// - `CLIENT_SECRET`
    ///
    /// Optional: `CLIENT_VERSION` (default 1), `PHONEPE_ENV` (default sandbox).
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source, with the same rules as
    /// [`PhonePeConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PaymentError> {
        let client_id = lookup("CLIENT_ID")
            .ok_or_else(|| PaymentError::Configuration("CLIENT_ID not set".to_string()))?;

        let client_secret = lookup("CLIENT_SECRET")
            .ok_or_else(|| PaymentError::Configuration("CLIENT_SECRET not set".to_string()))?;

        let client_version = match lookup("CLIENT_VERSION") {
            Some(v) => v.trim().parse().map_err(|_| {
                PaymentError::Configuration(format!("CLIENT_VERSION must be a number, got {}", v))
            })?,
            None => 1,
        };

        let env = match lookup("PHONEPE_ENV") {
            Some(v) => v.parse()?,
            None => PhonePeEnv::Sandbox,
        };

        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(PaymentError::Configuration(
                "CLIENT_ID and CLIENT_SECRET must not be empty".to_string(),
            ));
        }

        Ok(Self::new(client_id, client_secret, client_version, env))
    }

    /// Create config with explicit values
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        client_version: u32,
        env: PhonePeEnv,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client_version,
            env,
            auth_base_url: env.auth_base_url().to_string(),
            api_base_url: env.api_base_url().to_string(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == PhonePeEnv::Production
    }

    /// Builder: point both endpoints at one base URL (for testing)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.auth_base_url = url.clone();
        self.api_base_url = url;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_parsing() {
        assert_eq!("sandbox".parse::<PhonePeEnv>().unwrap(), PhonePeEnv::Sandbox);
        assert_eq!("PRODUCTION".parse::<PhonePeEnv>().unwrap(), PhonePeEnv::Production);
        assert!("staging".parse::<PhonePeEnv>().is_err());
    }

    #[test]
    fn test_base_urls_follow_env() {
        let sandbox = PhonePeConfig::new("id", "secret", 1, PhonePeEnv::Sandbox);
        assert_eq!(sandbox.auth_base_url, SANDBOX_BASE_URL);
        assert_eq!(sandbox.api_base_url, SANDBOX_BASE_URL);
        assert!(!sandbox.is_production());

        let prod = PhonePeConfig::new("id", "secret", 1, PhonePeEnv::Production);
        assert_eq!(prod.auth_base_url, PRODUCTION_AUTH_BASE_URL);
        assert_eq!(prod.api_base_url, PRODUCTION_API_BASE_URL);
        assert!(prod.is_production());
    }

    #[test]
    fn test_with_base_url() {
        let config = PhonePeConfig::new("id", "secret", 1, PhonePeEnv::Sandbox)
            .with_base_url("http://127.0.0.1:9999");
        assert_eq!(config.auth_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
    }

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<PhonePeConfig, PaymentError> {
        let vars = vars(pairs);
        PhonePeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = load(&[("CLIENT_ID", "id"), ("CLIENT_SECRET", "secret")]).unwrap();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_version, 1);
        assert_eq!(config.env, PhonePeEnv::Sandbox);
        assert_eq!(config.api_base_url, SANDBOX_BASE_URL);
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let config = load(&[
            ("CLIENT_ID", "id"),
            ("CLIENT_SECRET", "secret"),
            ("CLIENT_VERSION", " 3 "),
            ("PHONEPE_ENV", "prod"),
        ])
        .unwrap();
        assert_eq!(config.client_version, 3);
        assert!(config.is_production());
        assert_eq!(config.api_base_url, PRODUCTION_API_BASE_URL);
    }

    #[test]
    fn test_from_lookup_missing_credentials() {
        let err = load(&[("CLIENT_SECRET", "secret")]).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: CLIENT_ID not set");

        let err = load(&[("CLIENT_ID", "id")]).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: CLIENT_SECRET not set");

        assert!(load(&[("CLIENT_ID", " "), ("CLIENT_SECRET", "secret")]).is_err());
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let base = [("CLIENT_ID", "id"), ("CLIENT_SECRET", "secret")];

        let err = load(&[base[0], base[1], ("CLIENT_VERSION", "v2")]).unwrap_err();
        assert!(err.to_string().contains("CLIENT_VERSION"));

        let err = load(&[base[0], base[1], ("PHONEPE_ENV", "staging")]).unwrap_err();
        assert!(err.to_string().contains("PHONEPE_ENV"));
    }
}
