//! Main App Component

use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::checkout;
use crate::components::{ToastList, ToastNotifier};
use crate::pages::{BillingPage, PricingPage};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let toasts = RwSignal::new(Vec::new());
    checkout::install(Rc::new(ToastNotifier::new(toasts)));

    view! {
        <Router>
            <main class="app">
                <ToastList toasts=toasts />
                <Routes fallback=|| view! { <p>"Page not found"</p> }>
                    <Route path=path!("/") view=PricingPage />
                    <Route path=path!("/pricing") view=PricingPage />
                    <Route path=path!("/billing") view=BillingPage />
                </Routes>
            </main>
        </Router>
    }
}
