//! Subscription Plans
//!
//! Plans are owned by the backend; the frontend only needs enough to decide
//! whether a selection is free (apply directly) or paid (go through checkout).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::money::{Amount, Currency};

/// Billing interval
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    #[default]
    Monthly,
    Yearly,
}

/// A subscription plan as listed by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub slug: String,
    pub name: String,

    /// Price in major units
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,

    #[serde(default)]
    pub currency: Currency,

    #[serde(default)]
    pub interval: BillingInterval,
}

/// What selecting a plan costs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanCharge {
    /// Applied directly, never reaches the checkout
    Free,
    Paid(Amount),
}

impl Plan {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            price,
            currency: Currency::default(),
            interval: BillingInterval::default(),
        }
    }

    pub fn amount(&self) -> Result<Amount> {
        Amount::from_major(self.price, self.currency)
    }

    pub fn charge(&self) -> Result<PlanCharge> {
        let amount = self.amount()?;
        if amount.is_zero() {
            Ok(PlanCharge::Free)
        } else {
            Ok(PlanCharge::Paid(amount))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use crate::error::CheckoutError;

    #[test]
    fn test_free_plan_charge() {
        let plan = Plan::new("starter", "Starter", dec!(0));
        assert_eq!(plan.charge().unwrap(), PlanCharge::Free);
    }

    #[test]
    fn test_paid_plan_charge() {
        let plan = Plan::new("growth", "Growth", dec!(50));
        assert_eq!(
            plan.charge().unwrap(),
            PlanCharge::Paid(Amount::from_minor(5000, Currency::Ghs))
        );
    }

    #[test]
    fn test_plan_deserialize() {
        let plan: Plan = serde_json::from_str(
            r#"{"slug":"growth","name":"Growth","price":"120.50","currency":"NGN","interval":"yearly"}"#,
        )
        .unwrap();
        assert_eq!(plan.price, dec!(120.50));
        assert_eq!(plan.currency, Currency::Ngn);
        assert_eq!(plan.interval, BillingInterval::Yearly);
    }

    #[test]
    fn test_backend_price_beyond_range_is_an_error() {
        let plan: Plan = serde_json::from_str(
            r#"{"slug":"abbey","name":"Abbey","price":"79228162514264337593543950335"}"#,
        )
        .unwrap();
        assert!(matches!(plan.charge(), Err(CheckoutError::Decode(_))));
    }
}
