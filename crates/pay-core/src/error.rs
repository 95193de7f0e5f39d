//! # Payment Error Types
//!
//! Typed error handling for the checkout relay.
//! All gateway operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing credentials, invalid environment)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Payment provider rejected the call
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Could not obtain or refresh provider credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns true if this error is retryable.
    ///
    /// Only logged; the HTTP surface keeps a flat error shape.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::NetworkError(_)
                | PaymentError::ProviderError { .. }
                | PaymentError::Authentication(_)
        )
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PaymentError::NetworkError("timeout".into()).is_retryable());
        assert!(PaymentError::ProviderError {
            provider: "phonepe".into(),
            message: "busy".into()
        }
        .is_retryable());
        assert!(!PaymentError::Serialization("unexpected token".into()).is_retryable());
        assert!(!PaymentError::Configuration("CLIENT_ID not set".into()).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = PaymentError::ProviderError {
            provider: "phonepe".into(),
            message: "Invalid amount".into(),
        };
        assert_eq!(err.to_string(), "Provider error [phonepe]: Invalid amount");
        assert_eq!(
            PaymentError::NetworkError("connection reset".into()).to_string(),
            "Network error: connection reset"
        );
    }
}
