//! Billing Settings Page
//!
//! Subscription summary, wallet balance, payment history and the two paid
//! actions: the upgrade modal and the renewal button.

use flock_billing::{
    BillingApi, BillingHistoryEntry, Notice, NoticeLevel, PaymentMethod, PurchaseKind,
    Subscription, SubscriptionStatus, WalletBalance,
};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::checkout;
use crate::components::PayButton;
use crate::plans;

const fn status_label(status: SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Active => "Active",
        SubscriptionStatus::Trialing => "Trial",
        SubscriptionStatus::PastDue => "Payment overdue",
        SubscriptionStatus::Expired => "Expired",
        SubscriptionStatus::Cancelled => "Cancelled",
    }
}

/// Discount code as typed, or `None` when left blank
fn discount_code(input: &str) -> Option<String> {
    let code = input.trim();
    (!code.is_empty()).then(|| code.to_string())
}

#[component]
pub fn BillingPage() -> impl IntoView {
    let (subscription, set_subscription) = signal(None::<Subscription>);
    let (wallet, set_wallet) = signal(None::<WalletBalance>);
    let (history, set_history) = signal(Vec::<BillingHistoryEntry>::new());

    let (upgrade_busy, set_upgrade_busy) = signal(false);
    let (renew_busy, set_renew_busy) = signal(false);
    let (modal_open, set_modal_open) = signal(false);
    let (target, set_target) = signal(String::from("growth"));
    let (discount, set_discount) = signal(String::new());

    let refresh = move || {
        spawn_local(async move {
            let Some(ctx) = checkout::context() else { return };
            let api = ctx.api();

            match api.subscription().await {
                Ok(sub) => set_subscription.set(Some(sub)),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load subscription");
                    ctx.notify(Notice::from_error(&e));
                }
            }
            if let Ok(balance) = api.wallet_balance().await {
                set_wallet.set(Some(balance));
            }
            match api.billing_history().await {
                Ok(entries) => set_history.set(entries),
                Err(e) => tracing::warn!(error = %e, "Failed to load billing history"),
            }
        });
    };

    refresh();
    spawn_local(async {
        if let Some(ctx) = checkout::context() {
            ctx.preload().await;
        }
    });

    let upgrade = move |method: PaymentMethod| {
        if upgrade_busy.get_untracked() {
            return;
        }
        let Some(plan) = plans::find(&target.get_untracked()) else { return };
        let code = discount_code(&discount.get_untracked());
        let email = subscription
            .get_untracked()
            .and_then(|sub| sub.billing_email)
            .unwrap_or_default();
        set_upgrade_busy.set(true);

        spawn_local(async move {
            if let Some(ctx) = checkout::context() {
                let outcome = match method {
                    PaymentMethod::Card => ctx.purchase(PurchaseKind::Upgrade, &plan, &email, code).await,
                    PaymentMethod::Wallet => ctx.actions().pay_from_wallet(&plan, code).await,
                };
                if outcome.is_success() {
                    set_modal_open.set(false);
                    set_discount.set(String::new());
                    refresh();
                }
            }
            set_upgrade_busy.set(false);
        });
    };

    let renew = move || {
        if renew_busy.get_untracked() {
            return;
        }
        let Some(sub) = subscription.get_untracked() else { return };
        set_renew_busy.set(true);

        spawn_local(async move {
            if let Some(ctx) = checkout::context() {
                match plans::find(&sub.plan_slug) {
                    Some(plan) => {
                        let email = sub.billing_email.unwrap_or_default();
                        if ctx.purchase(PurchaseKind::Renewal, &plan, &email, None).await.is_success() {
                            refresh();
                        }
                    }
                    None => ctx.notify(Notice {
                        level: NoticeLevel::Warning,
                        message: "This plan cannot be renewed online. Please contact support.".into(),
                    }),
                }
            }
            set_renew_busy.set(false);
        });
    };

    view! {
        <div class="billing">
            <h1>"Billing"</h1>

            <section class="summary">
                {move || {
                    subscription
                        .get()
                        .map(|sub| {
                            view! {
                                <div class="subscription">
                                    <h2>{sub.plan_name.clone().unwrap_or_else(|| sub.plan_slug.clone())}</h2>
                                    <p class="status">{status_label(sub.status)}</p>
                                    <p class="period">
                                        {sub
                                            .current_period_end
                                            .map(|end| format!("Current period ends {}", end.format("%d %b %Y")))
                                            .unwrap_or_default()}
                                    </p>
                                </div>
                            }
                        })
                }}
                {move || {
                    wallet
                        .get()
                        .map(|w| {
                            view! {
                                <p class="wallet">{format!("Wallet balance: {} {:.2}", w.currency, w.balance)}</p>
                            }
                        })
                }}

                <div class="actions">
                    <PayButton
                        label="Upgrade plan"
                        busy=upgrade_busy
                        on_pay=move || set_modal_open.set(true)
                        primary=true
                    />
                    <Show when=move || subscription.get().is_some_and(|sub| sub.status.is_renewable())>
                        <PayButton label="Renew subscription" busy=renew_busy on_pay=renew />
                    </Show>
                </div>
            </section>

            <Show when=move || modal_open.get()>
                <div class="modal">
                    <h2>"Upgrade plan"</h2>
                    <div class="field">
                        <label>"Plan"</label>
                        <select
                            prop:value=move || target.get()
                            on:change=move |ev| set_target.set(event_target_value(&ev))
                        >
                            {plans::catalog()
                                .into_iter()
                                .map(|card| {
                                    let slug = card.plan.slug;
                                    view! { <option value=slug>{card.plan.name}</option> }
                                })
                                .collect_view()}
                        </select>
                    </div>
                    <div class="field">
                        <label>"Discount code"</label>
                        <input
                            type="text"
                            placeholder="Optional"
                            prop:value=move || discount.get()
                            on:input=move |ev| set_discount.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="modal-actions">
                        <PayButton
                            label="Pay with card"
                            busy=upgrade_busy
                            on_pay=move || upgrade(PaymentMethod::Card)
                            primary=true
                        />
                        <PayButton
                            label="Pay from wallet"
                            busy=upgrade_busy
                            on_pay=move || upgrade(PaymentMethod::Wallet)
                        />
                        <button
                            class="btn"
                            disabled=move || upgrade_busy.get()
                            on:click=move |_| set_modal_open.set(false)
                        >
                            "Cancel"
                        </button>
                    </div>
                </div>
            </Show>

            <section class="history">
                <h2>"Payment history"</h2>
                <table>
                    <thead>
                        <tr>
                            <th>"Date"</th>
                            <th>"Description"</th>
                            <th>"Amount"</th>
                            <th>"Status"</th>
                            <th>"Reference"</th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || history.get()
                            key=|entry| entry.reference.clone()
                            children=|entry| {
                                view! {
                                    <tr>
                                        <td>{entry.created_at.format("%d %b %Y").to_string()}</td>
                                        <td>{entry.description}</td>
                                        <td>{format!("{} {:.2}", entry.currency, entry.amount)}</td>
                                        <td>{entry.status}</td>
                                        <td class="reference">{entry.reference}</td>
                                    </tr>
                                }
                            }
                        />
                    </tbody>
                </table>
            </section>
        </div>
    }
}
