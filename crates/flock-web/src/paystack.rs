//! Paystack Inline Bindings
//!
//! Raw `wasm-bindgen` bindings to the `PaystackPop` global installed by
//! `inline.js`, and the [`CheckoutProvider`] built on top of them.

use flock_billing::{
    CheckoutError, CheckoutProvider, PopupCallbacks, PopupHandle, PopupOptions, ProviderResponse,
    Result,
};
use js_sys::{Object, Reflect};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// `window.PaystackPop`
    #[wasm_bindgen(js_name = PaystackPop)]
    type JsPaystackPop;

    /// Popup handle returned by `setup`
    #[derive(Debug, Clone)]
    type JsPaystackHandle;

    /// `PaystackPop.setup(options)` → handle
    #[wasm_bindgen(static_method_of = JsPaystackPop, catch)]
    fn setup(options: &JsValue) -> std::result::Result<JsPaystackHandle, JsValue>;

    /// `handle.openIframe()`
    #[wasm_bindgen(method, catch, js_name = openIframe)]
    fn open_iframe(this: &JsPaystackHandle) -> std::result::Result<(), JsValue>;
}

/// Best-effort text for a thrown JS value
pub(crate) fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| Reflect::get(value, &JsValue::from_str("message")).ok()?.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|e| CheckoutError::SessionInitiation(js_error_message(&e)))
}

fn read_string(value: &JsValue, key: &str) -> Option<String> {
    Reflect::get(value, &JsValue::from_str(key)).ok()?.as_string()
}

/// Read the completion payload. Only `reference` matters to the flow.
fn parse_response(value: &JsValue) -> ProviderResponse {
    ProviderResponse {
        reference: read_string(value, "reference").unwrap_or_default(),
        status: read_string(value, "status").unwrap_or_default(),
        message: read_string(value, "message"),
        transaction: read_string(value, "transaction"),
    }
}

#[allow(clippy::cast_precision_loss)]
fn build_options(options: &PopupOptions, callbacks: PopupCallbacks) -> Result<Object> {
    let object = Object::new();
    set(&object, "key", &JsValue::from_str(&options.key))?;
    set(&object, "email", &JsValue::from_str(&options.email))?;
    set(&object, "amount", &JsValue::from_f64(options.amount as f64))?;
    set(&object, "ref", &JsValue::from_str(&options.reference))?;
    set(&object, "currency", &JsValue::from_str(options.currency.as_str()))?;

    let PopupCallbacks { on_success, on_close } = callbacks;
    let callback = Closure::once_into_js(move |response: JsValue| on_success(parse_response(&response)));
    let on_close = Closure::once_into_js(move || on_close());
    set(&object, "callback", &callback)?;
    set(&object, "onClose", &on_close)?;

    Ok(object)
}

struct PaystackPopup {
    handle: JsPaystackHandle,
}

impl PopupHandle for PaystackPopup {
    fn open_iframe(&self) -> Result<()> {
        self.handle
            .open_iframe()
            .map_err(|e| CheckoutError::SessionInitiation(js_error_message(&e)))
    }
}

/// Paystack inline popup
#[derive(Debug, Default)]
pub struct PaystackProvider;

impl PaystackProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CheckoutProvider for PaystackProvider {
    fn name(&self) -> &str {
        "paystack"
    }

    fn setup(&self, options: PopupOptions, callbacks: PopupCallbacks) -> Result<Box<dyn PopupHandle>> {
        let object = build_options(&options, callbacks)?;

        // Throws a ReferenceError when inline.js never ran
        let handle = JsPaystackPop::setup(&object).map_err(|e| {
            tracing::error!(reference = %options.reference, error = %js_error_message(&e), "PaystackPop.setup failed");
            CheckoutError::ScriptLoad(js_error_message(&e))
        })?;

        Ok(Box::new(PaystackPopup { handle }))
    }
}
