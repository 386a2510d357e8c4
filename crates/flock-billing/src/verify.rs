//! Verification Reconciler
//!
//! The backend is the only authority on whether a payment went through. A
//! completion reported by the popup is never trusted on its own, and a failed
//! verification is never retried: money may have moved, so the payer gets a
//! reference to hand to support instead.

use std::rc::Rc;

use crate::api::BillingApi;
use crate::session::ProviderReference;
use crate::state::VerificationResult;

/// Fallback reason when the backend gave no message of its own
pub fn support_message(reference: &ProviderReference) -> String {
    format!("Payment verification failed. Please contact support with reference: {reference}")
}

pub struct VerificationReconciler {
    api: Rc<dyn BillingApi>,
}

impl VerificationReconciler {
    pub fn new(api: Rc<dyn BillingApi>) -> Self {
        Self { api }
    }

    pub async fn verify(&self, reference: &ProviderReference) -> VerificationResult {
        tracing::info!(reference = %reference, "Verifying payment");

        match self.api.verify_payment(reference).await {
            Ok(response) if response.verified => {
                tracing::info!(reference = %reference, "Payment verified");
                VerificationResult::Verified
            }
            Ok(response) => {
                let reason = response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| support_message(reference));
                tracing::error!(reference = %reference, reason = %reason, "Payment not verified");
                VerificationResult::VerificationFailed { reason }
            }
            Err(e) => {
                let reason = e
                    .backend_message()
                    .map_or_else(|| support_message(reference), str::to_string);
                tracing::error!(reference = %reference, error = %e, "Payment verification errored");
                VerificationResult::VerificationFailed { reason }
            }
        }
    }
}
