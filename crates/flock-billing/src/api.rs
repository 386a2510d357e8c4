//! Billing API Boundary
//!
//! The REST backend owns plans, transactions and verification. This module
//! defines the typed surface the checkout flow talks to; [`crate::http`]
//! provides the reqwest implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::money::Currency;
use crate::session::{ProviderReference, SessionReference};

/// How the tenant intends to pay for a plan change
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Inline card/mobile-money checkout through the provider popup
    #[default]
    Card,
    /// Debited from the tenant's prepaid wallet, settled server side
    Wallet,
}

/// `POST /settings/plan` body
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePlanRequest {
    pub plan_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

/// What the backend did with a plan change.
///
/// The wire body is either `{ data: { reference } }` or a plain success
/// envelope; the HTTP client resolves that ambiguity into this variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangePlanResponse {
    /// A paid transaction was opened and must go through the popup
    PaymentRequired { reference: SessionReference },
    /// The plan was applied directly (free plan or wallet debit)
    Applied { message: Option<String> },
}

/// `POST /settings/payment/verify` result
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyResponse {
    pub verified: bool,
    pub message: Option<String>,
}

/// Current subscription of the tenant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan_slug: String,
    #[serde(default)]
    pub plan_name: Option<String>,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_renew: bool,
    /// Address receipts go to; used as the payer email
    #[serde(default)]
    pub billing_email: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    /// Whether the renewal action should be offered
    pub const fn is_renewable(self) -> bool {
        matches!(self, Self::PastDue | Self::Expired | Self::Active)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    #[serde(default)]
    pub currency: Currency,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingHistoryEntry {
    pub reference: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Currency,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Backend operations used by the billing screens.
///
/// Futures are not `Send`: every caller lives on the browser's single
/// event-loop thread.
#[async_trait(?Send)]
pub trait BillingApi {
    /// Open a transaction for a plan change (or apply it directly)
    async fn change_plan(&self, request: &ChangePlanRequest) -> Result<ChangePlanResponse>;

    /// Ask the backend to confirm a provider payment
    async fn verify_payment(&self, reference: &ProviderReference) -> Result<VerifyResponse>;

    async fn subscription(&self) -> Result<Subscription>;

    async fn wallet_balance(&self) -> Result<WalletBalance>;

    async fn billing_history(&self) -> Result<Vec<BillingHistoryEntry>>;
}
