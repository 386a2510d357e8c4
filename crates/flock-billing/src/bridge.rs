//! Checkout Bridge
//!
//! Turns the provider's synchronous callbacks into one awaited
//! [`CheckoutOutcome`]. Inside a callback we only capture what the provider
//! handed us and push it into a oneshot channel; the awaiting flow resumes on
//! the executor after the provider's own call stack has unwound.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::oneshot;

use crate::config::CheckoutConfig;
use crate::provider::{CheckoutProvider, PopupCallbacks, PopupOptions, ProviderResponse};
use crate::session::{PaymentSession, ProviderReference};
use crate::state::CheckoutOutcome;

type OutcomeSlot = Rc<RefCell<Option<oneshot::Sender<CheckoutOutcome>>>>;

/// Deliver an outcome if no other callback got there first
fn settle(slot: &OutcomeSlot, outcome: CheckoutOutcome) {
    match slot.borrow_mut().take() {
        Some(tx) => {
            // The receiver only disappears if the flow itself was dropped.
            let _ = tx.send(outcome);
        }
        None => {
            tracing::warn!(?outcome, "Ignoring second popup callback");
        }
    }
}

pub struct CheckoutBridge {
    provider: Rc<dyn CheckoutProvider>,
    config: Rc<CheckoutConfig>,
}

impl CheckoutBridge {
    pub fn new(provider: Rc<dyn CheckoutProvider>, config: Rc<CheckoutConfig>) -> Self {
        Self { provider, config }
    }

    fn options(&self, session: &PaymentSession) -> PopupOptions {
        if session.amount.currency() != self.config.currency {
            tracing::warn!(
                reference = %session.reference,
                session_currency = %session.amount.currency(),
                configured_currency = %self.config.currency,
                "Session currency differs from the configured currency"
            );
        }
        PopupOptions {
            key: self.config.public_key.clone(),
            email: session.payer_email.clone(),
            amount: session.amount.minor_units(),
            reference: session.reference.as_str().to_string(),
            currency: session.amount.currency(),
        }
    }

    /// Show the popup for `session` and wait for the payer.
    ///
    /// No timeout: the payer closes the popup to cancel.
    pub async fn open(&self, session: &PaymentSession) -> CheckoutOutcome {
        let (tx, rx) = oneshot::channel();
        let slot: OutcomeSlot = Rc::new(RefCell::new(Some(tx)));

        let success_slot = Rc::clone(&slot);
        let close_slot = slot;
        let callbacks = PopupCallbacks {
            on_success: Box::new(move |response: ProviderResponse| {
                tracing::debug!(
                    reference = %response.reference,
                    status = %response.status,
                    "Popup reported completion"
                );
                settle(
                    &success_slot,
                    CheckoutOutcome::Completed {
                        provider_reference: ProviderReference::new(response.reference),
                    },
                );
            }),
            on_close: Box::new(move || {
                tracing::debug!("Popup closed by payer");
                settle(&close_slot, CheckoutOutcome::Cancelled);
            }),
        };

        let handle = match self.provider.setup(self.options(session), callbacks) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(provider = self.provider.name(), error = %e, "Popup setup failed");
                return CheckoutOutcome::InitiationFailed { reason: e.user_message() };
            }
        };

        if let Err(e) = handle.open_iframe() {
            tracing::error!(provider = self.provider.name(), error = %e, "Popup failed to open");
            return CheckoutOutcome::InitiationFailed { reason: e.user_message() };
        }

        tracing::info!(
            provider = self.provider.name(),
            reference = %session.reference,
            amount = %session.amount,
            "Checkout popup opened"
        );

        // Keep the handle alive until the payer acts.
        let outcome = rx.await.unwrap_or_else(|_| {
            tracing::warn!(reference = %session.reference, "Popup went away without a callback");
            CheckoutOutcome::Cancelled
        });
        drop(handle);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCheckoutProvider, PopupScript};
    use crate::money::{Amount, Currency};
    use crate::session::SessionReference;

    fn session() -> PaymentSession {
        PaymentSession {
            reference: SessionReference::new("PSK_abc"),
            plan_slug: "growth".into(),
            amount: Amount::from_minor(5000, Currency::Ghs),
            discount_code: None,
            payer_email: "treasurer@example.org".into(),
        }
    }

    fn bridge(script: PopupScript) -> (CheckoutBridge, Rc<MockCheckoutProvider>) {
        let provider = Rc::new(MockCheckoutProvider::new(script));
        let config = Rc::new(CheckoutConfig::new("pk_test_1").unwrap());
        (CheckoutBridge::new(provider.clone(), config), provider)
    }

    #[tokio::test]
    async fn test_completion_carries_provider_reference() {
        let (bridge, provider) = bridge(PopupScript::Complete("PRV_123".into()));
        let outcome = bridge.open(&session()).await;

        assert_eq!(
            outcome,
            CheckoutOutcome::Completed { provider_reference: ProviderReference::new("PRV_123") }
        );

        let opened = provider.opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].reference, "PSK_abc");
        assert_eq!(opened[0].amount, 5000);
        assert_eq!(opened[0].key, "pk_test_1");
    }

    #[tokio::test]
    async fn test_popup_currency_follows_session_amount() {
        let provider = Rc::new(MockCheckoutProvider::new(PopupScript::Close));
        let config = CheckoutConfig::new("pk_test_1").unwrap().with_currency(Currency::Ngn);
        let bridge = CheckoutBridge::new(provider.clone(), Rc::new(config));

        bridge.open(&session()).await;

        let opened = provider.opened();
        assert_eq!(opened[0].currency, Currency::Ghs);
        assert_eq!(opened[0].amount, 5000);
    }

    #[tokio::test]
    async fn test_close_is_cancel() {
        let (bridge, _) = bridge(PopupScript::Close);
        assert_eq!(bridge.open(&session()).await, CheckoutOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_only_first_callback_counts() {
        let (bridge, _) = bridge(PopupScript::CompleteThenClose("PRV_1".into()));
        assert!(matches!(bridge.open(&session()).await, CheckoutOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_dropped_popup_is_cancel() {
        let (bridge, _) = bridge(PopupScript::Vanish);
        assert_eq!(bridge.open(&session()).await, CheckoutOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_setup_failure_is_initiation_failure() {
        let (bridge, _) = bridge(PopupScript::SetupFails("invalid key".into()));
        assert!(matches!(
            bridge.open(&session()).await,
            CheckoutOutcome::InitiationFailed { .. }
        ));
    }
}
