//! Page Components

mod billing;
mod pricing;

pub use billing::BillingPage;
pub use pricing::PricingPage;
