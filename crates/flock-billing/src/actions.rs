//! Billing Actions
//!
//! The leaf consumers of the checkout flow: the plan-selection step, the
//! upgrade modal in billing settings and the renewal button. They pick the
//! payment path and report the result; none of them touch the popup or the
//! verification call directly.

use std::rc::Rc;

use crate::api::{BillingApi, ChangePlanRequest, ChangePlanResponse, PaymentMethod};
use crate::error::CheckoutError;
use crate::flow::{CheckoutFlow, PaymentOutcome};
use crate::notify::{Notice, Notifier};
use crate::plan::{Plan, PlanCharge};
use crate::session::PaymentRequest;

pub const PLAN_SELECTED: &str = "Plan activated successfully!";
pub const PLAN_UPGRADED: &str = "Plan upgraded successfully!";
pub const SUBSCRIPTION_RENEWED: &str = "Subscription renewed successfully!";
pub const MISSING_EMAIL: &str = "Enter a billing email address to continue.";

/// The purchase controls that each own a checkout flow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PurchaseKind {
    PlanSelection,
    Upgrade,
    Renewal,
}

impl PurchaseKind {
    const fn success_message(self) -> &'static str {
        match self {
            Self::PlanSelection => PLAN_SELECTED,
            Self::Upgrade => PLAN_UPGRADED,
            Self::Renewal => SUBSCRIPTION_RENEWED,
        }
    }
}

fn direct_change(
    plan: &Plan,
    discount_code: Option<String>,
    payment_method: Option<PaymentMethod>,
) -> ChangePlanRequest {
    ChangePlanRequest { plan_slug: plan.slug.clone(), discount_code, payment_method }
}

pub struct BillingActions {
    api: Rc<dyn BillingApi>,
    notifier: Rc<dyn Notifier>,
}

impl BillingActions {
    pub fn new(api: Rc<dyn BillingApi>, notifier: Rc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Plan-selection step of onboarding
    pub async fn select_plan(
        &self,
        flow: &CheckoutFlow,
        plan: &Plan,
        payer_email: &str,
        discount_code: Option<String>,
    ) -> PaymentOutcome {
        self.checkout(flow, plan, payer_email, discount_code, PLAN_SELECTED).await
    }

    /// Upgrade modal in billing settings
    pub async fn upgrade_plan(
        &self,
        flow: &CheckoutFlow,
        plan: &Plan,
        payer_email: &str,
        discount_code: Option<String>,
    ) -> PaymentOutcome {
        self.checkout(flow, plan, payer_email, discount_code, PLAN_UPGRADED).await
    }

    /// Renew the current plan for another period
    pub async fn renew_subscription(
        &self,
        flow: &CheckoutFlow,
        plan: &Plan,
        payer_email: &str,
    ) -> PaymentOutcome {
        self.checkout(flow, plan, payer_email, None, SUBSCRIPTION_RENEWED).await
    }

    /// Pay for a plan from the tenant's wallet; no popup involved
    pub async fn pay_from_wallet(&self, plan: &Plan, discount_code: Option<String>) -> PaymentOutcome {
        let request = direct_change(plan, discount_code, Some(PaymentMethod::Wallet));
        self.settle(request, PLAN_UPGRADED).await
    }

    /// Apply a free plan directly, skipping payment entirely
    pub async fn apply_plan(&self, plan: &Plan, discount_code: Option<String>) -> PaymentOutcome {
        self.settle(direct_change(plan, discount_code, None), PLAN_UPGRADED).await
    }

    /// Route a purchase from one of the page's controls.
    ///
    /// `flow` is `Err` with the configuration problem when paid checkout is
    /// unavailable. Free plans are still applied in that case; paid plans
    /// fail with the configuration notice. A paid plan with no payer email
    /// fails before anything reaches the backend.
    pub async fn purchase(
        &self,
        kind: PurchaseKind,
        flow: std::result::Result<&CheckoutFlow, &str>,
        plan: &Plan,
        payer_email: &str,
        discount_code: Option<String>,
    ) -> PaymentOutcome {
        let free = match plan.charge() {
            Ok(charge) => matches!(charge, PlanCharge::Free),
            Err(e) => return self.fail(e),
        };
        let discount_code = if kind == PurchaseKind::Renewal { None } else { discount_code };

        let flow = match flow {
            Ok(flow) => flow,
            Err(_) if free => {
                tracing::info!(plan = %plan.slug, "Checkout unavailable, applying free plan directly");
                let request = direct_change(plan, discount_code, None);
                return self.settle(request, kind.success_message()).await;
            }
            Err(reason) => {
                tracing::warn!(plan = %plan.slug, reason, "Paid plan requested without checkout configured");
                return self.fail(CheckoutError::Config(reason.to_string()));
            }
        };

        if !free && payer_email.trim().is_empty() {
            return self.fail(CheckoutError::SessionInitiation(MISSING_EMAIL.into()));
        }

        self.checkout(flow, plan, payer_email, discount_code, kind.success_message()).await
    }

    async fn checkout(
        &self,
        flow: &CheckoutFlow,
        plan: &Plan,
        payer_email: &str,
        discount_code: Option<String>,
        success_message: &str,
    ) -> PaymentOutcome {
        let amount = match plan.charge() {
            Ok(PlanCharge::Free) => {
                tracing::info!(plan = %plan.slug, "Free plan selected, skipping checkout");
                let request = direct_change(plan, discount_code, None);
                return self.settle(request, success_message).await;
            }
            Ok(PlanCharge::Paid(amount)) => amount,
            Err(e) => return self.fail(e),
        };

        let request = PaymentRequest::new(&plan.slug, amount, payer_email).with_discount(discount_code);
        flow.pay_with(
            request,
            self.notifier.as_ref(),
            |reference| {
                tracing::info!(plan = %plan.slug, reference = %reference, "Plan purchase verified");
                self.notifier.notify(Notice::success(success_message));
            },
            || tracing::info!(plan = %plan.slug, "Plan purchase cancelled"),
        )
        .await
    }

    /// Plan changes that the backend completes on its own
    async fn settle(&self, request: ChangePlanRequest, success_message: &str) -> PaymentOutcome {
        match self.api.change_plan(&request).await {
            Ok(ChangePlanResponse::Applied { message }) => {
                tracing::info!(plan = %request.plan_slug, method = ?request.payment_method, "Plan applied");
                self.notifier.notify(Notice::success(success_message));
                PaymentOutcome::Settled { message }
            }
            Ok(ChangePlanResponse::PaymentRequired { reference }) => {
                tracing::error!(plan = %request.plan_slug, reference = %reference, "Backend asked for payment on a direct plan change");
                self.fail(CheckoutError::SessionInitiation(
                    "This plan requires payment. Please choose a payment method.".into(),
                ))
            }
            Err(e) => {
                let e = match e.backend_message() {
                    Some(message) => CheckoutError::SessionInitiation(message.to_string()),
                    None => e,
                };
                self.fail(e)
            }
        }
    }

    fn fail(&self, error: CheckoutError) -> PaymentOutcome {
        self.notifier.notify(Notice::from_error(&error));
        PaymentOutcome::Failed(error)
    }
}
