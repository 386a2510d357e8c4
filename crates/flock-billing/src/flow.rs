//! Checkout Flow
//!
//! Composes the initiator, bridge and reconciler into one purchase:
//!
//! ```text
//! initiate ──▶ open popup ──▶ (Completed) verify ──▶ Verified
//!     │              │                     └────────▶ VerificationFailed
//!     │              └──▶ Cancelled
//!     └──▶ InitiationFailed
//! ```
//!
//! One flow per purchase control. The control's [`BusyFlag`] is held for the
//! whole purchase, verification included, and released on every terminal
//! state by dropping its guard.

use std::cell::Cell;
use std::rc::Rc;

use crate::api::BillingApi;
use crate::bridge::CheckoutBridge;
use crate::busy::{BusyFlag, PaymentLock};
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::initiator::SessionInitiator;
use crate::notify::{Notice, Notifier};
use crate::provider::CheckoutProvider;
use crate::script::ScriptLoader;
use crate::session::{PaymentRequest, ProviderReference};
use crate::state::{CheckoutOutcome, FlowState, VerificationResult};
use crate::verify::VerificationReconciler;

/// Terminal result of a purchase action
#[derive(Debug)]
pub enum PaymentOutcome {
    /// Provider payment confirmed by the backend
    Verified { reference: ProviderReference },
    /// Applied by the backend with no popup (free plan, wallet)
    Settled { message: Option<String> },
    Cancelled,
    Failed(CheckoutError),
}

impl PaymentOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Verified { .. } | Self::Settled { .. })
    }
}

pub struct CheckoutFlow {
    initiator: SessionInitiator,
    bridge: CheckoutBridge,
    reconciler: VerificationReconciler,
    busy: BusyFlag,
    page_lock: Option<PaymentLock>,
    state: Cell<FlowState>,
}

impl CheckoutFlow {
    pub fn new(
        config: Rc<CheckoutConfig>,
        api: Rc<dyn BillingApi>,
        provider: Rc<dyn CheckoutProvider>,
        loader: Rc<ScriptLoader>,
    ) -> Self {
        Self {
            initiator: SessionInitiator::new(Rc::clone(&api), loader),
            bridge: CheckoutBridge::new(provider, config),
            reconciler: VerificationReconciler::new(api),
            busy: BusyFlag::new(),
            page_lock: None,
            state: Cell::new(FlowState::Idle),
        }
    }

    /// Share a page-wide lock so other controls cannot open a second popup
    pub fn with_page_lock(mut self, lock: PaymentLock) -> Self {
        self.page_lock = Some(lock);
        self
    }

    /// Flag the owning control should use to disable itself
    pub fn busy(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn state(&self) -> FlowState {
        self.state.get()
    }

    fn transition(&self, next: FlowState) {
        let current = self.state.get();
        if current.can_transition_to(next) {
            tracing::debug!(from = %current, to = %next, "Checkout state");
        } else {
            tracing::error!(from = %current, to = %next, "Unexpected checkout transition");
        }
        self.state.set(next);
    }

    /// Run one purchase to a terminal state.
    ///
    /// Returns `Failed(PaymentInProgress)` without touching the running
    /// purchase if this control (or, with a page lock, any control) is busy.
    pub async fn pay(&self, request: PaymentRequest) -> PaymentOutcome {
        let Some(_busy) = self.busy.acquire() else {
            tracing::warn!(plan = %request.plan_slug, "Purchase already running on this control");
            return PaymentOutcome::Failed(CheckoutError::PaymentInProgress);
        };
        let _page = match &self.page_lock {
            Some(lock) => match lock.try_lock() {
                Some(guard) => Some(guard),
                None => {
                    tracing::warn!(plan = %request.plan_slug, "Another payment is in flight on this page");
                    return PaymentOutcome::Failed(CheckoutError::PaymentInProgress);
                }
            },
            None => None,
        };

        if self.state.get().is_terminal() {
            self.transition(FlowState::Idle);
        }
        self.transition(FlowState::Initiating);

        let session = match self.initiator.initiate(request).await {
            Ok(session) => session,
            Err(e) => {
                self.transition(FlowState::InitiationFailed);
                return PaymentOutcome::Failed(e);
            }
        };

        self.transition(FlowState::AwaitingPopup);
        let outcome = self.bridge.open(&session).await;
        drop(session);

        match outcome {
            CheckoutOutcome::Completed { provider_reference } => {
                self.transition(FlowState::Completed);
                self.transition(FlowState::Verifying);
                match self.reconciler.verify(&provider_reference).await {
                    VerificationResult::Verified => {
                        self.transition(FlowState::Verified);
                        PaymentOutcome::Verified { reference: provider_reference }
                    }
                    VerificationResult::VerificationFailed { reason } => {
                        self.transition(FlowState::VerificationFailed);
                        PaymentOutcome::Failed(CheckoutError::Verification {
                            reference: provider_reference,
                            reason,
                        })
                    }
                }
            }
            CheckoutOutcome::Cancelled => {
                self.transition(FlowState::Cancelled);
                PaymentOutcome::Cancelled
            }
            CheckoutOutcome::InitiationFailed { reason } => {
                self.transition(FlowState::InitiationFailed);
                PaymentOutcome::Failed(CheckoutError::SessionInitiation(reason))
            }
        }
    }

    /// Callback-style entry point for leaf consumers.
    ///
    /// `on_success` fires only after backend verification, `on_close` only
    /// when the payer dismissed the popup. Failures go to `notifier`.
    pub async fn pay_with<S, C>(
        &self,
        request: PaymentRequest,
        notifier: &dyn Notifier,
        on_success: S,
        on_close: C,
    ) -> PaymentOutcome
    where
        S: FnOnce(&ProviderReference),
        C: FnOnce(),
    {
        let outcome = self.pay(request).await;
        match &outcome {
            PaymentOutcome::Verified { reference } => on_success(reference),
            PaymentOutcome::Settled { .. } => {}
            PaymentOutcome::Cancelled => {
                notifier.notify(Notice::from_error(&CheckoutError::Cancelled));
                on_close();
            }
            PaymentOutcome::Failed(e) => notifier.notify(Notice::from_error(e)),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::mock::{
        MockBillingApi, MockCheckoutProvider, MockScriptInjector, PlanChangeScript, PopupScript,
        VerifyScript,
    };
    use crate::money::{Amount, Currency};
    use crate::notify::{MemoryNotifier, NoticeLevel};
    use crate::provider::{PopupCallbacks, PopupHandle, PopupOptions, ProviderResponse};

    struct Harness {
        api: Rc<MockBillingApi>,
        provider: Rc<MockCheckoutProvider>,
        flow: CheckoutFlow,
    }

    async fn harness(api: MockBillingApi, script: PopupScript) -> Harness {
        let api = Rc::new(api);
        let provider = Rc::new(MockCheckoutProvider::new(script));
        let loader = Rc::new(ScriptLoader::new(Rc::new(MockScriptInjector::new()), "inline.js"));
        loader.ensure_loaded().await.unwrap();
        let config = Rc::new(CheckoutConfig::new("pk_test_1").unwrap());
        let flow = CheckoutFlow::new(config, api.clone(), provider.clone(), loader);
        Harness { api, provider, flow }
    }

    fn ghs50() -> PaymentRequest {
        PaymentRequest::new("growth", Amount::from_minor(5000, Currency::Ghs), "treasurer@example.org")
    }

    #[tokio::test]
    async fn test_happy_path() {
        let h = harness(
            MockBillingApi::new().with_plan_change(PlanChangeScript::Reference("PSK_abc".into())),
            PopupScript::Complete("PRV_123".into()),
        )
        .await;

        let outcome = h.flow.pay(ghs50()).await;

        assert!(matches!(
            outcome,
            PaymentOutcome::Verified { ref reference } if reference.as_str() == "PRV_123"
        ));
        assert_eq!(h.provider.opened()[0].reference, "PSK_abc");
        assert_eq!(h.api.verify_calls(), vec![ProviderReference::new("PRV_123")]);
        assert_eq!(h.flow.state(), FlowState::Verified);
        assert!(!h.flow.busy().is_busy());
    }

    #[tokio::test]
    async fn test_cancel_never_verifies() {
        let h = harness(MockBillingApi::new(), PopupScript::Close).await;
        let notifier = MemoryNotifier::new();
        let closed = Cell::new(false);

        let outcome = h
            .flow
            .pay_with(ghs50(), &notifier, |_| panic!("must not succeed"), || closed.set(true))
            .await;

        assert!(matches!(outcome, PaymentOutcome::Cancelled));
        assert!(closed.get());
        assert!(h.api.verify_calls().is_empty());
        assert_eq!(notifier.last().unwrap().level, NoticeLevel::Info);
        assert_eq!(h.flow.state(), FlowState::Cancelled);
        assert!(!h.flow.busy().is_busy());
    }

    #[tokio::test]
    async fn test_verification_failure_names_reference() {
        let h = harness(
            MockBillingApi::new().with_verification(VerifyScript::Unreachable),
            PopupScript::Complete("PRV_999".into()),
        )
        .await;
        let notifier = MemoryNotifier::new();

        let outcome = h.flow.pay_with(ghs50(), &notifier, |_| panic!("unverified"), || {}).await;

        assert!(matches!(outcome, PaymentOutcome::Failed(CheckoutError::Verification { .. })));
        let notice = notifier.last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Critical);
        assert!(notice.message.ends_with("contact support with reference: PRV_999"));
        assert_eq!(h.flow.state(), FlowState::VerificationFailed);
        assert!(!h.flow.busy().is_busy());
    }

    #[tokio::test]
    async fn test_initiation_failure_never_opens_popup() {
        let h = harness(
            MockBillingApi::new().with_plan_change(PlanChangeScript::Reject {
                status: 422,
                message: "Plan is not available".into(),
            }),
            PopupScript::Complete("PRV_1".into()),
        )
        .await;

        let outcome = h.flow.pay(ghs50()).await;

        assert!(matches!(outcome, PaymentOutcome::Failed(CheckoutError::SessionInitiation(_))));
        assert!(h.provider.opened().is_empty());
        assert!(h.api.verify_calls().is_empty());
        assert_eq!(h.flow.state(), FlowState::InitiationFailed);
        assert!(!h.flow.busy().is_busy());
    }

    #[tokio::test]
    async fn test_script_still_loading() {
        let api = Rc::new(MockBillingApi::new());
        let loader = Rc::new(ScriptLoader::new(Rc::new(MockScriptInjector::new()), "inline.js"));
        let flow = CheckoutFlow::new(
            Rc::new(CheckoutConfig::new("pk_test_1").unwrap()),
            api.clone(),
            Rc::new(MockCheckoutProvider::new(PopupScript::Close)),
            loader,
        );

        let outcome = flow.pay(ghs50()).await;

        let PaymentOutcome::Failed(err) = outcome else { panic!("expected failure") };
        assert!(err.user_message().contains("still loading"));
        assert!(api.change_plan_calls().is_empty());
        assert!(!flow.busy().is_busy());
    }

    #[tokio::test]
    async fn test_busy_for_whole_purchase_and_reentry_rejected() {
        let h = harness(MockBillingApi::new(), PopupScript::Manual).await;

        let (first, ()) = futures::join!(h.flow.pay(ghs50()), async {
            assert!(h.flow.busy().is_busy());
            assert_eq!(h.flow.state(), FlowState::AwaitingPopup);

            let second = h.flow.pay(ghs50()).await;
            assert!(matches!(second, PaymentOutcome::Failed(CheckoutError::PaymentInProgress)));
            assert!(h.flow.busy().is_busy());

            assert!(h.provider.complete("PRV_1"));
        });

        assert!(first.is_success());
        assert_eq!(h.api.change_plan_calls().len(), 1);
        assert!(!h.flow.busy().is_busy());
    }

    #[tokio::test]
    async fn test_page_lock_blocks_other_controls() {
        let lock = PaymentLock::new();
        let upgrade = harness(MockBillingApi::new(), PopupScript::Manual).await;
        let renew = harness(MockBillingApi::new(), PopupScript::Complete("PRV_2".into())).await;
        let upgrade_flow = upgrade.flow.with_page_lock(lock.clone());
        let renew_flow = renew.flow.with_page_lock(lock.clone());

        let (first, ()) = futures::join!(upgrade_flow.pay(ghs50()), async {
            let blocked = renew_flow.pay(ghs50()).await;
            assert!(matches!(blocked, PaymentOutcome::Failed(CheckoutError::PaymentInProgress)));
            assert!(upgrade.provider.close());
        });

        assert!(matches!(first, PaymentOutcome::Cancelled));
        assert!(renew.api.change_plan_calls().is_empty());
        assert!(!lock.is_held());

        assert!(renew_flow.pay(ghs50()).await.is_success());
    }

    #[tokio::test]
    async fn test_popup_setup_failure_releases_locks() {
        let lock = PaymentLock::new();
        let h = harness(MockBillingApi::new(), PopupScript::SetupFails("Paystack is not defined".into())).await;
        let flow = h.flow.with_page_lock(lock.clone());

        let outcome = flow.pay(ghs50()).await;

        assert!(matches!(outcome, PaymentOutcome::Failed(CheckoutError::SessionInitiation(_))));
        assert_eq!(flow.state(), FlowState::InitiationFailed);
        assert!(!flow.busy().is_busy());
        assert!(!lock.is_held());
        assert_eq!(h.api.change_plan_calls().len(), 1);
        assert!(h.api.verify_calls().is_empty());
        assert!(h.provider.opened().is_empty());
    }

    #[tokio::test]
    async fn test_flow_restarts_after_terminal_state() {
        let h = harness(MockBillingApi::new(), PopupScript::Close).await;
        assert!(matches!(h.flow.pay(ghs50()).await, PaymentOutcome::Cancelled));
        assert!(matches!(h.flow.pay(ghs50()).await, PaymentOutcome::Cancelled));
        assert_eq!(h.api.change_plan_calls().len(), 2);
    }

    /// Provider that checks nothing was verified while its callback ran
    struct OrderCheckingProvider {
        api: Rc<MockBillingApi>,
        calls_during_callback: Rc<RefCell<Option<usize>>>,
    }

    struct OrderCheckingPopup {
        api: Rc<MockBillingApi>,
        callbacks: RefCell<Option<PopupCallbacks>>,
        calls_during_callback: Rc<RefCell<Option<usize>>>,
    }

    impl PopupHandle for OrderCheckingPopup {
        fn open_iframe(&self) -> crate::error::Result<()> {
            if let Some(cb) = self.callbacks.borrow_mut().take() {
                (cb.on_success)(ProviderResponse {
                    reference: "PRV_sync".into(),
                    status: "success".into(),
                    ..Default::default()
                });
                *self.calls_during_callback.borrow_mut() = Some(self.api.verify_calls().len());
            }
            Ok(())
        }
    }

    impl CheckoutProvider for OrderCheckingProvider {
        fn name(&self) -> &str {
            "order-checking"
        }

        fn setup(
            &self,
            _options: PopupOptions,
            callbacks: PopupCallbacks,
        ) -> crate::error::Result<Box<dyn PopupHandle>> {
            Ok(Box::new(OrderCheckingPopup {
                api: self.api.clone(),
                callbacks: RefCell::new(Some(callbacks)),
                calls_during_callback: self.calls_during_callback.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn test_verification_runs_after_provider_callback_returns() {
        let api = Rc::new(MockBillingApi::new());
        let seen = Rc::new(RefCell::new(None));
        let provider = Rc::new(OrderCheckingProvider { api: api.clone(), calls_during_callback: seen.clone() });
        let loader = Rc::new(ScriptLoader::new(Rc::new(MockScriptInjector::new()), "inline.js"));
        loader.ensure_loaded().await.unwrap();
        let flow = CheckoutFlow::new(
            Rc::new(CheckoutConfig::new("pk_test_1").unwrap()),
            api.clone(),
            provider,
            loader,
        );

        assert!(flow.pay(ghs50()).await.is_success());

        assert_eq!(*seen.borrow(), Some(0));
        assert_eq!(api.verify_calls(), vec![ProviderReference::new("PRV_sync")]);
    }
}
