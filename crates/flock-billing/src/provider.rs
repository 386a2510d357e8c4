//! Checkout Provider Strategy
//!
//! Mirrors the contract of the provider's inline popup: `setup(options)`
//! returns a handle whose `openIframe()` shows the popup, and exactly one of
//! two synchronous callbacks fires when the payer is done.
//!
//! The callbacks are plain `FnOnce` closures. The provider never awaits
//! anything it gets back, so nothing asynchronous may run inside them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::money::Currency;

/// Options passed to the provider's `setup`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PopupOptions {
    /// Public key
    pub key: String,
    pub email: String,
    /// Amount in minor units
    pub amount: u64,
    /// Backend session reference
    #[serde(rename = "ref")]
    pub reference: String,
    pub currency: Currency,
}

/// Payload of the provider's completion callback
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub reference: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
}

pub type SuccessCallback = Box<dyn FnOnce(ProviderResponse)>;
pub type CloseCallback = Box<dyn FnOnce()>;

/// The two mutually exclusive popup outcomes
pub struct PopupCallbacks {
    pub on_success: SuccessCallback,
    pub on_close: CloseCallback,
}

/// Handle returned by `setup`
pub trait PopupHandle {
    fn open_iframe(&self) -> Result<()>;
}

/// Strategy trait for inline checkout providers
pub trait CheckoutProvider {
    /// Provider name for logs
    fn name(&self) -> &str;

    fn setup(&self, options: PopupOptions, callbacks: PopupCallbacks) -> Result<Box<dyn PopupHandle>>;
}
