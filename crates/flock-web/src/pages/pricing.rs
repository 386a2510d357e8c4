//! Pricing Page
//!
//! Plan-selection step of onboarding. Free plans are applied directly; paid
//! plans open the inline checkout.

use flock_billing::{BillingApi, Plan, PlanCharge, PurchaseKind};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::checkout;
use crate::components::PayButton;
use crate::plans::{self, PlanCard};

fn price_label(plan: &Plan) -> String {
    match plan.charge() {
        Ok(PlanCharge::Free) => "Free".into(),
        Ok(PlanCharge::Paid(amount)) => amount.to_string(),
        Err(_) => "-".into(),
    }
}

fn go_to_billing() {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href("/billing");
    }
}

#[component]
pub fn PricingPage() -> impl IntoView {
    let (email, set_email) = signal(String::new());
    let (busy, set_busy) = signal(false);

    spawn_local(async move {
        let Some(ctx) = checkout::context() else { return };
        if let Ok(subscription) = ctx.api().subscription().await {
            if let Some(address) = subscription.billing_email {
                set_email.set(address);
            }
        }
        ctx.preload().await;
    });

    let select = move |plan: Plan| {
        if busy.get_untracked() {
            return;
        }
        let payer = email.get_untracked();
        set_busy.set(true);

        spawn_local(async move {
            if let Some(ctx) = checkout::context() {
                let outcome = ctx.purchase(PurchaseKind::PlanSelection, &plan, payer.trim(), None).await;
                if outcome.is_success() {
                    go_to_billing();
                }
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="pricing">
            <h1>"Choose a plan"</h1>
            <p class="subtitle">"Run your church, not spreadsheets"</p>

            <div class="field">
                <label>"Billing email"</label>
                <input
                    type="email"
                    placeholder="treasurer@yourchurch.org"
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
            </div>

            <div class="plans">
                <For
                    each=plans::catalog
                    key=|card| card.plan.slug.clone()
                    children=move |card: PlanCard| {
                        let plan = card.plan.clone();
                        let class = if card.featured { "plan featured" } else { "plan" };
                        view! {
                            <div class=class>
                                <h2>{card.plan.name.clone()}</h2>
                                <div class="price">
                                    {price_label(&card.plan)}
                                    <span>{plans::interval_label(card.plan.interval)}</span>
                                </div>
                                <ul>
                                    {card.features.iter().map(|f| view! { <li>{*f}</li> }).collect_view()}
                                </ul>
                                <PayButton
                                    label="Choose plan"
                                    busy=busy
                                    on_pay=move || select(plan.clone())
                                    primary=card.featured
                                />
                            </div>
                        }
                    }
                />
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_label() {
        assert_eq!(price_label(&Plan::new("starter", "Starter", dec!(0))), "Free");
        assert_eq!(price_label(&Plan::new("growth", "Growth", dec!(150))), "GHS 150.00");
    }
}
