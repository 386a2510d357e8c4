//! Checkout Error Types

use thiserror::Error;

use crate::session::ProviderReference;

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// How loudly an error should be surfaced to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational notice (e.g. the user closed the popup)
    Info,
    Warning,
    Error,
    /// Money may have moved without local confirmation
    Critical,
}

/// Checkout-related errors
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Missing or invalid deployment configuration (public key, URLs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider's checkout script failed to load
    #[error("Checkout script failed to load: {0}")]
    ScriptLoad(String),

    /// The provider's checkout script has not finished loading yet
    #[error("Checkout script is still loading")]
    ScriptLoading,

    /// The backend rejected or failed to open the billable transaction
    #[error("Session initiation failed: {0}")]
    SessionInitiation(String),

    /// The user dismissed the popup without paying
    #[error("Payment cancelled by user")]
    Cancelled,

    /// Payment may have succeeded at the provider but could not be confirmed
    #[error("Payment verification failed for {reference}: {reason}")]
    Verification {
        reference: ProviderReference,
        reason: String,
    },

    /// Paid flows require a positive amount
    #[error("Invalid amount: {0} minor units")]
    InvalidAmount(u64),

    /// Another payment is already in flight for this control or page
    #[error("A payment is already in progress")]
    PaymentInProgress,

    /// Backend returned an error envelope
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport failure talking to the backend
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl CheckoutError {
    /// Nothing in the checkout flow is retried automatically; every retry
    /// is a fresh user action.
    pub const fn is_retryable(&self) -> bool {
        false
    }

    pub const fn severity(&self) -> Severity {
        match self {
            Self::Cancelled => Severity::Info,
            Self::ScriptLoading | Self::PaymentInProgress | Self::InvalidAmount(_) => {
                Severity::Warning
            }
            Self::Verification { .. } => Severity::Critical,
            _ => Severity::Error,
        }
    }

    /// Backend-supplied message, if this error carries one
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => {
                "Payments are not configured for this deployment. Please contact support.".into()
            }
            Self::ScriptLoad(_) => {
                "The payment system is unavailable. Please refresh the page and try again.".into()
            }
            Self::ScriptLoading => {
                "The payment system is still loading. Please try again in a moment.".into()
            }
            Self::SessionInitiation(reason) => reason.clone(),
            Self::Cancelled => "Payment was cancelled.".into(),
            Self::Verification { reference, reason } => {
                if reason.contains(reference.as_str()) {
                    reason.clone()
                } else {
                    format!("{reason} (reference: {reference})")
                }
            }
            Self::InvalidAmount(_) => "This plan cannot be purchased with a card payment.".into(),
            Self::PaymentInProgress => "A payment is already in progress.".into(),
            Self::Api { message, .. } => message.clone(),
            Self::Network(_) => "Could not reach the server. Check your connection.".into(),
            Self::Decode(_) => "An error occurred processing your request.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_message_embeds_reference() {
        let err = CheckoutError::Verification {
            reference: ProviderReference::new("PRV_1"),
            reason: "Transaction not found".into(),
        };
        assert_eq!(err.user_message(), "Transaction not found (reference: PRV_1)");
        assert_eq!(err.severity(), Severity::Critical);
    }

    #[test]
    fn test_verification_message_not_duplicated() {
        let err = CheckoutError::Verification {
            reference: ProviderReference::new("PRV_1"),
            reason: "contact support with reference: PRV_1".into(),
        };
        assert_eq!(err.user_message(), "contact support with reference: PRV_1");
    }

    #[test]
    fn test_nothing_is_retryable() {
        assert!(!CheckoutError::ScriptLoading.is_retryable());
        assert!(!CheckoutError::SessionInitiation("x".into()).is_retryable());
        assert_eq!(CheckoutError::Cancelled.severity(), Severity::Info);
    }

    #[test]
    fn test_blank_backend_message_is_ignored() {
        let err = CheckoutError::Api { status: 500, message: "  ".into() };
        assert!(err.backend_message().is_none());
    }
}
