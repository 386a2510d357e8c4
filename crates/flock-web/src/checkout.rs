//! Page Checkout Context
//!
//! Page-wide singletons shared by every purchase control: the backend
//! client, one script loader, one payment lock and one flow per control.
//! Configuration is baked in at build time:
//!
//! - `PAYSTACK_PUBLIC_KEY` (required for paid plans)
//! - `FLOCK_API_URL` (default `/api`, resolved against the page origin)
//! - `FLOCK_CURRENCY` (default `GHS`)

use std::cell::OnceCell;
use std::rc::Rc;

use flock_billing::{
    BillingActions, BillingApi, CheckoutConfig, CheckoutError, CheckoutFlow, HttpBillingApi,
    Notice, Notifier, PaymentLock, PaymentOutcome, Plan, PurchaseKind, Result, ScriptLoader,
    DEFAULT_API_BASE_URL,
};

use crate::dom::DomScriptInjector;
use crate::paystack::PaystackProvider;

thread_local! {
    static CONTEXT: OnceCell<Rc<BillingContext>> = const { OnceCell::new() };
}

struct PageCheckout {
    loader: Rc<ScriptLoader>,
    plan_selection: CheckoutFlow,
    upgrade: CheckoutFlow,
    renewal: CheckoutFlow,
}

impl PageCheckout {
    fn new(config: CheckoutConfig, api: &Rc<dyn BillingApi>) -> Self {
        let config = Rc::new(config);
        let provider = Rc::new(PaystackProvider::new());
        let loader = Rc::new(ScriptLoader::new(Rc::new(DomScriptInjector::new()), &config.script_url));
        let lock = PaymentLock::new();

        let flow = || {
            CheckoutFlow::new(Rc::clone(&config), Rc::clone(api), provider.clone(), Rc::clone(&loader))
                .with_page_lock(lock.clone())
        };

        Self { plan_selection: flow(), upgrade: flow(), renewal: flow(), loader }
    }

    const fn flow(&self, kind: PurchaseKind) -> &CheckoutFlow {
        match kind {
            PurchaseKind::PlanSelection => &self.plan_selection,
            PurchaseKind::Upgrade => &self.upgrade,
            PurchaseKind::Renewal => &self.renewal,
        }
    }
}

pub struct BillingContext {
    api: Rc<HttpBillingApi>,
    actions: BillingActions,
    notifier: Rc<dyn Notifier>,
    /// `Err` holds the configuration problem when paid checkout is unavailable
    checkout: std::result::Result<PageCheckout, String>,
}

/// Resolve a relative base URL against the page origin
fn absolute_url(base: &str) -> String {
    if !base.starts_with('/') {
        return base.to_string();
    }
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:8080".into());
    format!("{origin}{base}")
}

fn build_config() -> Result<CheckoutConfig> {
    let config = CheckoutConfig::new(option_env!("PAYSTACK_PUBLIC_KEY").unwrap_or_default())?;
    let config = match option_env!("FLOCK_CURRENCY") {
        Some(code) => config.with_currency(code.parse()?),
        None => config,
    };
    let base = option_env!("FLOCK_API_URL").unwrap_or(DEFAULT_API_BASE_URL);
    Ok(config.with_api_base_url(absolute_url(base)))
}

impl BillingContext {
    fn new(notifier: Rc<dyn Notifier>) -> Self {
        let config = build_config();
        let base_url = config
            .as_ref()
            .map_or_else(|_| absolute_url(DEFAULT_API_BASE_URL), |c| c.api_base_url.clone());
        let api = Rc::new(HttpBillingApi::new(base_url));
        let dyn_api: Rc<dyn BillingApi> = api.clone();

        let checkout = match config {
            Ok(config) => Ok(PageCheckout::new(config, &dyn_api)),
            Err(e) => {
                tracing::error!(error = %e, "Checkout is not configured; paid plans are disabled");
                notifier.notify(Notice::from_error(&e));
                Err(match e {
                    CheckoutError::Config(reason) => reason,
                    other => other.to_string(),
                })
            }
        };

        Self { actions: BillingActions::new(dyn_api, Rc::clone(&notifier)), api, notifier, checkout }
    }

    pub fn api(&self) -> &HttpBillingApi {
        &self.api
    }

    pub const fn actions(&self) -> &BillingActions {
        &self.actions
    }

    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Start loading the checkout script so it is ready by the time the
    /// user picks a plan
    pub async fn preload(&self) {
        if let Ok(checkout) = &self.checkout {
            if let Err(e) = checkout.loader.ensure_loaded().await {
                tracing::warn!(error = %e, src = checkout.loader.src(), "Checkout script unavailable");
            }
        }
    }

    /// Run a purchase from one of the page's controls
    pub async fn purchase(
        &self,
        kind: PurchaseKind,
        plan: &Plan,
        payer_email: &str,
        discount_code: Option<String>,
    ) -> PaymentOutcome {
        let flow = match &self.checkout {
            Ok(checkout) => Ok(checkout.flow(kind)),
            Err(reason) => Err(reason.as_str()),
        };
        self.actions.purchase(kind, flow, plan, payer_email, discount_code).await
    }
}

/// Create the page context. Later calls return the existing one.
pub fn install(notifier: Rc<dyn Notifier>) -> Rc<BillingContext> {
    CONTEXT.with(|cell| Rc::clone(cell.get_or_init(|| Rc::new(BillingContext::new(notifier)))))
}

/// The page context, once [`install`] has run
pub fn context() -> Option<Rc<BillingContext>> {
    CONTEXT.with(|cell| cell.get().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_keeps_full_urls() {
        assert_eq!(absolute_url("https://api.example.org/v1"), "https://api.example.org/v1");
    }
}
