//! # flock-billing
//!
//! Subscription checkout for the flock church-management frontend.
//!
//! ## Inline Checkout Handshake
//!
//! **Flow:** open a transaction on the backend → show the provider popup →
//! verify the provider's reference on the backend → tell the user.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │  Initiator   │───▶│   Checkout   │───▶│ Verification │───▶│   Outcome    │
//! │ (/settings/  │    │    Bridge    │    │  Reconciler  │    │  callbacks   │
//! │    plan)     │    │   (popup)    │    │ (/verify)    │    │  + notices   │
//! └──────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! - The provider script is injected once per page ([`ScriptLoader`]).
//! - The popup's callbacks are synchronous; the bridge only records what they
//!   report and the flow continues on the executor afterwards.
//! - A completion reported by the popup is never shown as success until the
//!   backend confirms it. A failed confirmation tells the user the provider
//!   reference so support can reconcile it by hand.
//! - Free plans never reach the popup; they are applied directly.
//!
//! Everything here runs on the browser's single event-loop thread, so shared
//! state uses `Rc`/`Cell` and the async traits are `?Send`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flock_billing::{BillingActions, CheckoutConfig, CheckoutFlow, HttpBillingApi, ScriptLoader};
//!
//! let config = Rc::new(CheckoutConfig::new("pk_live_xxx")?);
//! let api = Rc::new(HttpBillingApi::new(&config.api_base_url));
//! let loader = Rc::new(ScriptLoader::new(injector, &config.script_url));
//! loader.ensure_loaded().await?;
//!
//! let flow = CheckoutFlow::new(config, api.clone(), provider, loader);
//! let actions = BillingActions::new(api, notifier);
//!
//! actions.upgrade_plan(&flow, &plan, "treasurer@example.org", None).await;
//! ```

mod actions;
mod api;
mod bridge;
mod busy;
mod config;
mod error;
mod flow;
mod http;
mod initiator;
mod money;
mod notify;
mod plan;
mod provider;
mod script;
mod session;
mod state;
mod verify;

pub mod mock;

pub use actions::{
    BillingActions, MISSING_EMAIL, PLAN_SELECTED, PLAN_UPGRADED, PurchaseKind, SUBSCRIPTION_RENEWED,
};
pub use api::{
    BillingApi, BillingHistoryEntry, ChangePlanRequest, ChangePlanResponse, PaymentMethod,
    Subscription, SubscriptionStatus, VerifyResponse, WalletBalance,
};
pub use bridge::CheckoutBridge;
pub use busy::{BusyFlag, BusyGuard, PaymentLock};
pub use config::{CheckoutConfig, DEFAULT_API_BASE_URL, DEFAULT_SCRIPT_URL};
pub use error::{CheckoutError, Result, Severity};
pub use flow::{CheckoutFlow, PaymentOutcome};
pub use http::HttpBillingApi;
pub use initiator::SessionInitiator;
pub use money::{Amount, Currency};
pub use notify::{MemoryNotifier, Notice, NoticeLevel, Notifier};
pub use plan::{BillingInterval, Plan, PlanCharge};
pub use provider::{
    CheckoutProvider, CloseCallback, PopupCallbacks, PopupHandle, PopupOptions, ProviderResponse,
    SuccessCallback,
};
pub use script::{ScriptInjector, ScriptLoader};
pub use session::{PaymentRequest, PaymentSession, ProviderReference, SessionReference};
pub use state::{CheckoutOutcome, FlowState, ScriptLoadState, VerificationResult};
pub use verify::{VerificationReconciler, support_message};
