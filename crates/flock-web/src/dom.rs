//! DOM Script Injection

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use flock_billing::{CheckoutError, Result, ScriptInjector};
use tokio::sync::oneshot;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use crate::paystack::js_error_message;

/// Appends a `<script>` tag to `<head>` and resolves on its `load` or
/// `error` event
#[derive(Debug, Default)]
pub struct DomScriptInjector;

impl DomScriptInjector {
    pub fn new() -> Self {
        Self
    }
}

fn load_error(message: impl Into<String>) -> CheckoutError {
    CheckoutError::ScriptLoad(message.into())
}

#[async_trait(?Send)]
impl ScriptInjector for DomScriptInjector {
    async fn inject(&self, src: &str) -> Result<()> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| load_error("no document"))?;
        let head = document.head().ok_or_else(|| load_error("no <head> element"))?;

        let script: HtmlScriptElement = document
            .create_element("script")
            .map_err(|e| load_error(js_error_message(&e)))?
            .dyn_into()
            .map_err(|_| load_error("created element is not a <script>"))?;
        script.set_src(src);
        script.set_async(true);

        // load and error are exclusive; whichever fires first settles it
        let (tx, rx) = oneshot::channel::<bool>();
        let slot = Rc::new(RefCell::new(Some(tx)));
        let error_slot = Rc::clone(&slot);

        let on_load = Closure::once_into_js(move || {
            if let Some(tx) = slot.borrow_mut().take() {
                let _ = tx.send(true);
            }
        });
        let on_error = Closure::once_into_js(move || {
            if let Some(tx) = error_slot.borrow_mut().take() {
                let _ = tx.send(false);
            }
        });
        script.set_onload(Some(on_load.unchecked_ref()));
        script.set_onerror(Some(on_error.unchecked_ref()));

        head.append_child(&script).map_err(|e| load_error(js_error_message(&e)))?;
        tracing::debug!(src, "Checkout script appended");

        match rx.await {
            Ok(true) => Ok(()),
            Ok(false) => Err(load_error(format!("failed to load {src}"))),
            Err(_) => Err(load_error(format!("{src} never reported load or error"))),
        }
    }
}
