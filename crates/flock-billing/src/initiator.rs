//! Payment Session Initiator
//!
//! Opens the billable transaction on the backend before any popup is shown.

use std::rc::Rc;

use crate::api::{BillingApi, ChangePlanRequest, ChangePlanResponse, PaymentMethod};
use crate::error::{CheckoutError, Result};
use crate::script::ScriptLoader;
use crate::session::{PaymentRequest, PaymentSession};

const GENERIC_INITIATION_FAILURE: &str = "Could not start the payment. Please try again.";

pub struct SessionInitiator {
    api: Rc<dyn BillingApi>,
    loader: Rc<ScriptLoader>,
}

impl SessionInitiator {
    pub fn new(api: Rc<dyn BillingApi>, loader: Rc<ScriptLoader>) -> Self {
        Self { api, loader }
    }

    /// Open a transaction for a paid plan change.
    ///
    /// Fails fast, without contacting the backend, when the amount is zero or
    /// the checkout script is not ready yet.
    pub async fn initiate(&self, request: PaymentRequest) -> Result<PaymentSession> {
        if request.amount.is_zero() {
            return Err(CheckoutError::InvalidAmount(request.amount.minor_units()));
        }
        self.loader.require_ready()?;

        let body = ChangePlanRequest {
            plan_slug: request.plan_slug.clone(),
            discount_code: request.discount_code.clone(),
            payment_method: Some(PaymentMethod::Card),
        };

        tracing::info!(
            plan = %request.plan_slug,
            amount = %request.amount,
            discount = ?request.discount_code,
            "Initiating payment session"
        );

        match self.api.change_plan(&body).await {
            Ok(ChangePlanResponse::PaymentRequired { reference }) => {
                tracing::debug!(reference = %reference, "Payment session opened");
                Ok(PaymentSession::open(reference, request))
            }
            Ok(ChangePlanResponse::Applied { message }) => {
                tracing::warn!(plan = %request.plan_slug, ?message, "Backend applied a paid plan without a transaction");
                Err(CheckoutError::SessionInitiation(
                    message.unwrap_or_else(|| GENERIC_INITIATION_FAILURE.into()),
                ))
            }
            Err(e) => {
                tracing::error!(plan = %request.plan_slug, error = %e, "Payment session initiation failed");
                let reason = e
                    .backend_message()
                    .map_or_else(|| GENERIC_INITIATION_FAILURE.to_string(), str::to_string);
                Err(CheckoutError::SessionInitiation(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBillingApi, MockScriptInjector, PlanChangeScript};
    use crate::money::{Amount, Currency};
    use crate::session::SessionReference;

    async fn ready_loader() -> Rc<ScriptLoader> {
        let loader = Rc::new(ScriptLoader::new(Rc::new(MockScriptInjector::new()), "inline.js"));
        loader.ensure_loaded().await.unwrap();
        loader
    }

    fn request(minor: u64) -> PaymentRequest {
        PaymentRequest::new("growth", Amount::from_minor(minor, Currency::Ghs), "a@b.org")
            .with_discount(Some("EASTER"))
    }

    #[tokio::test]
    async fn test_initiate_opens_session() {
        let api = Rc::new(MockBillingApi::new().with_plan_change(PlanChangeScript::Reference("PSK_abc".into())));
        let initiator = SessionInitiator::new(api.clone(), ready_loader().await);

        let session = initiator.initiate(request(5000)).await.unwrap();
        assert_eq!(session.reference, SessionReference::new("PSK_abc"));
        assert_eq!(session.amount.minor_units(), 5000);

        let calls = api.change_plan_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].discount_code.as_deref(), Some("EASTER"));
        assert_eq!(calls[0].payment_method, Some(PaymentMethod::Card));
    }

    #[tokio::test]
    async fn test_zero_amount_never_reaches_backend() {
        let api = Rc::new(MockBillingApi::new());
        let initiator = SessionInitiator::new(api.clone(), ready_loader().await);

        let err = initiator.initiate(request(0)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidAmount(0)));
        assert!(api.change_plan_calls().is_empty());
    }

    #[tokio::test]
    async fn test_script_not_ready_short_circuits() {
        let api = Rc::new(MockBillingApi::new());
        let loader = Rc::new(ScriptLoader::new(Rc::new(MockScriptInjector::new()), "inline.js"));
        let initiator = SessionInitiator::new(api.clone(), loader);

        let err = initiator.initiate(request(5000)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ScriptLoading));
        assert!(api.change_plan_calls().is_empty());
    }

    #[tokio::test]
    async fn test_backend_reason_surfaced_verbatim() {
        let api = Rc::new(MockBillingApi::new().with_plan_change(PlanChangeScript::Reject {
            status: 422,
            message: "Discount code has expired".into(),
        }));
        let initiator = SessionInitiator::new(api, ready_loader().await);

        let err = initiator.initiate(request(5000)).await.unwrap_err();
        assert_eq!(err.user_message(), "Discount code has expired");
    }

    #[tokio::test]
    async fn test_network_failure_gets_generic_reason() {
        let api = Rc::new(MockBillingApi::new().with_plan_change(PlanChangeScript::Unreachable));
        let initiator = SessionInitiator::new(api, ready_loader().await);

        let err = initiator.initiate(request(5000)).await.unwrap_err();
        assert_eq!(err.user_message(), GENERIC_INITIATION_FAILURE);
    }
}
