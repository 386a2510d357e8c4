//! Payment Sessions
//!
//! Two distinct references travel through a purchase: the backend issues a
//! [`SessionReference`] when it opens the transaction, the provider issues a
//! [`ProviderReference`] when the payer completes the popup.

use serde::{Deserialize, Serialize};

use crate::money::Amount;

/// Backend-issued reference for an opened transaction
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionReference(String);

impl SessionReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Provider-issued reference returned when the payer completes checkout
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderReference(String);

impl ProviderReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProviderReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters a leaf caller supplies to start a paid purchase
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    pub plan_slug: String,
    pub amount: Amount,
    pub payer_email: String,
    pub discount_code: Option<String>,
}

impl PaymentRequest {
    pub fn new(plan_slug: impl Into<String>, amount: Amount, payer_email: impl Into<String>) -> Self {
        Self {
            plan_slug: plan_slug.into(),
            amount,
            payer_email: payer_email.into(),
            discount_code: None,
        }
    }

    /// Attach a discount code; blank codes are dropped
    pub fn with_discount(mut self, code: Option<impl Into<String>>) -> Self {
        self.discount_code = code
            .map(Into::into)
            .map(|c: String| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self
    }
}

/// An opened, billable transaction awaiting the popup.
///
/// Lives only for the duration of one purchase flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentSession {
    pub reference: SessionReference,
    pub plan_slug: String,
    pub amount: Amount,
    pub discount_code: Option<String>,
    pub payer_email: String,
}

impl PaymentSession {
    pub fn open(reference: SessionReference, request: PaymentRequest) -> Self {
        Self {
            reference,
            plan_slug: request.plan_slug,
            amount: request.amount,
            discount_code: request.discount_code,
            payer_email: request.payer_email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_blank_discount_dropped() {
        let amount = Amount::from_minor(5000, Currency::Ghs);
        let request = PaymentRequest::new("growth", amount, "pastor@example.org")
            .with_discount(Some("   "));
        assert_eq!(request.discount_code, None);

        let request = request.with_discount(Some(" EASTER "));
        assert_eq!(request.discount_code.as_deref(), Some("EASTER"));
    }

    #[test]
    fn test_reference_serializes_transparently() {
        let json = serde_json::to_string(&ProviderReference::new("PRV_123")).unwrap();
        assert_eq!(json, "\"PRV_123\"");
    }
}
