//! Mock Collaborators
//!
//! Scriptable stand-ins for the backend, the provider popup and the DOM
//! script injector. For tests and demo pages.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::oneshot;

use crate::api::{
    BillingApi, BillingHistoryEntry, ChangePlanRequest, ChangePlanResponse, Subscription,
    SubscriptionStatus, VerifyResponse, WalletBalance,
};
use crate::error::{CheckoutError, Result};
use crate::money::Currency;
use crate::provider::{
    CheckoutProvider, PopupCallbacks, PopupHandle, PopupOptions, ProviderResponse,
};
use crate::script::ScriptInjector;
use crate::session::{ProviderReference, SessionReference};

/// The backend could not be reached: no status, no message
fn unreachable_backend() -> CheckoutError {
    CheckoutError::Api { status: 0, message: String::new() }
}

// ============================================================================
// Backend
// ============================================================================

/// How the mock answers `change_plan`
#[derive(Clone, Debug)]
pub enum PlanChangeScript {
    Reference(String),
    Applied(Option<String>),
    Reject { status: u16, message: String },
    Unreachable,
}

/// How the mock answers `verify_payment`
#[derive(Clone, Debug)]
pub enum VerifyScript {
    Verified,
    Unverified(Option<String>),
    Reject { status: u16, message: String },
    Unreachable,
}

pub struct MockBillingApi {
    plan_change: PlanChangeScript,
    verification: VerifyScript,
    subscription: Subscription,
    wallet: WalletBalance,
    history: Vec<BillingHistoryEntry>,
    change_plan_calls: RefCell<Vec<ChangePlanRequest>>,
    verify_calls: RefCell<Vec<ProviderReference>>,
}

impl Default for MockBillingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBillingApi {
    pub fn new() -> Self {
        Self {
            plan_change: PlanChangeScript::Reference("PSK_mock".into()),
            verification: VerifyScript::Verified,
            subscription: Subscription {
                plan_slug: "starter".into(),
                plan_name: Some("Starter".into()),
                status: SubscriptionStatus::Active,
                current_period_end: None,
                auto_renew: false,
                billing_email: Some("admin@example.org".into()),
            },
            wallet: WalletBalance { balance: Decimal::ZERO, currency: Currency::default() },
            history: Vec::new(),
            change_plan_calls: RefCell::new(Vec::new()),
            verify_calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_plan_change(mut self, script: PlanChangeScript) -> Self {
        self.plan_change = script;
        self
    }

    pub fn with_verification(mut self, script: VerifyScript) -> Self {
        self.verification = script;
        self
    }

    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = subscription;
        self
    }

    pub fn with_wallet_balance(mut self, balance: Decimal) -> Self {
        self.wallet.balance = balance;
        self
    }

    pub fn change_plan_calls(&self) -> Vec<ChangePlanRequest> {
        self.change_plan_calls.borrow().clone()
    }

    pub fn verify_calls(&self) -> Vec<ProviderReference> {
        self.verify_calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl BillingApi for MockBillingApi {
    async fn change_plan(&self, request: &ChangePlanRequest) -> Result<ChangePlanResponse> {
        self.change_plan_calls.borrow_mut().push(request.clone());
        match &self.plan_change {
            PlanChangeScript::Reference(reference) => Ok(ChangePlanResponse::PaymentRequired {
                reference: SessionReference::new(reference.clone()),
            }),
            PlanChangeScript::Applied(message) => {
                Ok(ChangePlanResponse::Applied { message: message.clone() })
            }
            PlanChangeScript::Reject { status, message } => {
                Err(CheckoutError::Api { status: *status, message: message.clone() })
            }
            PlanChangeScript::Unreachable => Err(unreachable_backend()),
        }
    }

    async fn verify_payment(&self, reference: &ProviderReference) -> Result<VerifyResponse> {
        self.verify_calls.borrow_mut().push(reference.clone());
        match &self.verification {
            VerifyScript::Verified => Ok(VerifyResponse {
                verified: true,
                message: Some("Verification successful".into()),
            }),
            VerifyScript::Unverified(message) => Ok(VerifyResponse {
                verified: false,
                message: message.clone(),
            }),
            VerifyScript::Reject { status, message } => {
                Err(CheckoutError::Api { status: *status, message: message.clone() })
            }
            VerifyScript::Unreachable => Err(unreachable_backend()),
        }
    }

    async fn subscription(&self) -> Result<Subscription> {
        Ok(self.subscription.clone())
    }

    async fn wallet_balance(&self) -> Result<WalletBalance> {
        Ok(self.wallet.clone())
    }

    async fn billing_history(&self) -> Result<Vec<BillingHistoryEntry>> {
        Ok(self.history.clone())
    }
}

// ============================================================================
// Provider popup
// ============================================================================

/// What the mock popup does once opened
#[derive(Clone, Debug)]
pub enum PopupScript {
    /// Fire the completion callback with this provider reference
    Complete(String),
    /// Fire the close callback
    Close,
    /// Misbehaving provider: completion followed by close
    CompleteThenClose(String),
    /// Drop both callbacks without firing either
    Vanish,
    /// `setup` itself fails
    SetupFails(String),
    /// Hold the callbacks until the test calls `complete` or `close`
    Manual,
}

type PendingCallbacks = Rc<RefCell<Option<PopupCallbacks>>>;

pub struct MockCheckoutProvider {
    script: PopupScript,
    opened: RefCell<Vec<PopupOptions>>,
    pending: PendingCallbacks,
}

impl MockCheckoutProvider {
    pub fn new(script: PopupScript) -> Self {
        Self {
            script,
            opened: RefCell::new(Vec::new()),
            pending: Rc::new(RefCell::new(None)),
        }
    }

    /// Options of every popup set up so far
    pub fn opened(&self) -> Vec<PopupOptions> {
        self.opened.borrow().clone()
    }

    /// Complete a [`PopupScript::Manual`] popup. Returns `false` if none is open.
    pub fn complete(&self, reference: &str) -> bool {
        let callbacks = self.pending.borrow_mut().take();
        callbacks.is_some_and(|cb| {
            (cb.on_success)(ProviderResponse {
                reference: reference.to_string(),
                status: "success".into(),
                ..Default::default()
            });
            true
        })
    }

    /// Close a [`PopupScript::Manual`] popup. Returns `false` if none is open.
    pub fn close(&self) -> bool {
        let callbacks = self.pending.borrow_mut().take();
        callbacks.is_some_and(|cb| {
            (cb.on_close)();
            true
        })
    }
}

struct MockPopup {
    script: PopupScript,
    callbacks: RefCell<Option<PopupCallbacks>>,
    pending: PendingCallbacks,
}

impl PopupHandle for MockPopup {
    fn open_iframe(&self) -> Result<()> {
        let Some(callbacks) = self.callbacks.borrow_mut().take() else {
            return Err(CheckoutError::SessionInitiation("popup already opened".into()));
        };

        let success = |reference: &str| ProviderResponse {
            reference: reference.to_string(),
            status: "success".into(),
            ..Default::default()
        };

        match &self.script {
            PopupScript::Complete(reference) => (callbacks.on_success)(success(reference)),
            PopupScript::Close => (callbacks.on_close)(),
            PopupScript::CompleteThenClose(reference) => {
                (callbacks.on_success)(success(reference));
                (callbacks.on_close)();
            }
            PopupScript::Vanish | PopupScript::SetupFails(_) => drop(callbacks),
            PopupScript::Manual => *self.pending.borrow_mut() = Some(callbacks),
        }
        Ok(())
    }
}

impl CheckoutProvider for MockCheckoutProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn setup(&self, options: PopupOptions, callbacks: PopupCallbacks) -> Result<Box<dyn PopupHandle>> {
        if let PopupScript::SetupFails(reason) = &self.script {
            return Err(CheckoutError::ScriptLoad(reason.clone()));
        }

        self.opened.borrow_mut().push(options);
        Ok(Box::new(MockPopup {
            script: self.script.clone(),
            callbacks: RefCell::new(Some(callbacks)),
            pending: Rc::clone(&self.pending),
        }))
    }
}

// ============================================================================
// Script injection
// ============================================================================

pub struct MockScriptInjector {
    fail: bool,
    injections: Cell<usize>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl Default for MockScriptInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScriptInjector {
    /// Loads immediately
    pub fn new() -> Self {
        Self { fail: false, injections: Cell::new(0), gate: RefCell::new(None) }
    }

    /// Fails immediately, as if blocked by an ad-blocker
    pub fn failing() -> Self {
        Self { fail: true, ..Self::new() }
    }

    /// Stays in flight until the returned sender fires
    pub fn gated() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let injector = Self { gate: RefCell::new(Some(rx)), ..Self::new() };
        (injector, tx)
    }

    pub fn injections(&self) -> usize {
        self.injections.get()
    }
}

#[async_trait(?Send)]
impl ScriptInjector for MockScriptInjector {
    async fn inject(&self, src: &str) -> Result<()> {
        self.injections.set(self.injections.get() + 1);

        let gate = self.gate.borrow_mut().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }

        if self.fail {
            Err(CheckoutError::ScriptLoad(format!("blocked: {src}")))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_backend_carries_no_message() {
        let api = MockBillingApi::new()
            .with_plan_change(PlanChangeScript::Unreachable)
            .with_verification(VerifyScript::Unreachable);
        let request = ChangePlanRequest { plan_slug: "growth".into(), discount_code: None, payment_method: None };

        let change = api.change_plan(&request).await.unwrap_err();
        let verify = api.verify_payment(&ProviderReference::new("PRV_1")).await.unwrap_err();

        for error in [change, verify] {
            assert!(matches!(error, CheckoutError::Api { status: 0, .. }));
            assert_eq!(error.backend_message(), None);
        }
    }
}
