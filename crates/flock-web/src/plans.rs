//! Plan Catalog
//!
//! Plans offered on the pricing and billing screens. Prices are in cedis.

use flock_billing::{BillingInterval, Plan};
use rust_decimal_macros::dec;

/// A plan and the bullet points shown on its card
#[derive(Clone, Debug)]
pub struct PlanCard {
    pub plan: Plan,
    pub features: &'static [&'static str],
    pub featured: bool,
}

pub fn catalog() -> Vec<PlanCard> {
    vec![
        PlanCard {
            plan: Plan::new("starter", "Starter", dec!(0)),
            features: &["Up to 100 members", "Attendance tracking", "Email support"],
            featured: false,
        },
        PlanCard {
            plan: Plan::new("growth", "Growth", dec!(150)),
            features: &["Up to 1,000 members", "Campaigns and partnerships", "SMS reminders"],
            featured: true,
        },
        PlanCard {
            plan: Plan::new("cathedral", "Cathedral", dec!(400)),
            features: &["Unlimited members", "Multiple branches", "Priority support"],
            featured: false,
        },
        PlanCard {
            plan: Plan {
                interval: BillingInterval::Yearly,
                ..Plan::new("growth-yearly", "Growth (yearly)", dec!(1500))
            },
            features: &["Everything in Growth", "Two months free"],
            featured: false,
        },
    ]
}

pub fn find(slug: &str) -> Option<Plan> {
    catalog().into_iter().map(|card| card.plan).find(|plan| plan.slug == slug)
}

pub const fn interval_label(interval: BillingInterval) -> &'static str {
    match interval {
        BillingInterval::Monthly => "/month",
        BillingInterval::Yearly => "/year",
    }
}
