//! flock Billing Frontend
//!
//! Leptos-based WASM screens for plan selection and billing settings, wired
//! to the Paystack inline checkout.

mod app;
mod checkout;
mod components;
mod dom;
mod pages;
mod paystack;
mod plans;

pub use app::App;
pub use dom::DomScriptInjector;
pub use paystack::PaystackProvider;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
