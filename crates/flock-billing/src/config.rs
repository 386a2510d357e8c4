//! Checkout Configuration
//!
//! Deployment settings for the inline checkout. The public key is the only
//! hard requirement; everything else has a default.

use crate::error::{CheckoutError, Result};
use crate::money::Currency;

/// Default location of the provider's inline checkout script
pub const DEFAULT_SCRIPT_URL: &str = "https://js.paystack.co/v1/inline.js";

/// Default backend base URL (same origin)
pub const DEFAULT_API_BASE_URL: &str = "/api";

#[derive(Clone, Debug)]
pub struct CheckoutConfig {
    /// Provider public key (never the secret key)
    pub public_key: String,

    /// Deployment's pricing currency. The popup charges in the session's
    /// own currency; a mismatch is logged.
    pub currency: Currency,

    /// Checkout script injected once per page
    pub script_url: String,

    /// REST backend base URL
    pub api_base_url: String,
}

impl CheckoutConfig {
    /// Create a configuration, rejecting an empty public key
    pub fn new(public_key: impl Into<String>) -> Result<Self> {
        let public_key = public_key.into();
        if public_key.trim().is_empty() {
            return Err(CheckoutError::Config("payment public key is not set".into()));
        }

        Ok(Self {
            public_key,
            currency: Currency::default(),
            script_url: DEFAULT_SCRIPT_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let public_key = std::env::var("PAYSTACK_PUBLIC_KEY")
            .map_err(|_| CheckoutError::Config("PAYSTACK_PUBLIC_KEY not set".into()))?;

        let mut config = Self::new(public_key)?;

        if let Ok(url) = std::env::var("FLOCK_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(url) = std::env::var("PAYSTACK_SCRIPT_URL") {
            config.script_url = url;
        }
        if let Ok(code) = std::env::var("FLOCK_CURRENCY") {
            config.currency = code.parse()?;
        }

        Ok(config)
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_script_url(mut self, url: impl Into<String>) -> Self {
        self.script_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(CheckoutConfig::new(""), Err(CheckoutError::Config(_))));
        assert!(matches!(CheckoutConfig::new("   "), Err(CheckoutError::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let config = CheckoutConfig::new("pk_test_123").unwrap();
        assert_eq!(config.currency, Currency::Ghs);
        assert_eq!(config.script_url, DEFAULT_SCRIPT_URL);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }
}
