//! HTTP Billing Client
//!
//! reqwest implementation of [`BillingApi`]. Works natively and on
//! `wasm32` (reqwest switches to `fetch` there).

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::api::{
    BillingApi, BillingHistoryEntry, ChangePlanRequest, ChangePlanResponse, Subscription,
    VerifyResponse, WalletBalance,
};
use crate::error::{CheckoutError, Result};
use crate::session::{ProviderReference, SessionReference};

/// Standard backend response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ReferenceData {
    #[serde(default)]
    reference: Option<String>,
}

/// Billing API over HTTP
pub struct HttpBillingApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    tenant: Option<String>,
}

impl HttpBillingApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            tenant: None,
        }
    }

    /// Bearer token for the signed-in staff member
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Tenant (church) the requests act on behalf of
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(tenant) = &self.tenant {
            builder = builder.header("X-Tenant-Id", tenant);
        }
        builder
    }

    /// Send a request and decode the envelope, turning non-2xx bodies into
    /// [`CheckoutError::Api`] with the backend's message.
    async fn send<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<Envelope<T>> {
        let response = self.authorize(builder).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                });
            tracing::warn!(status = status.as_u16(), message = %message, "Billing API error");
            return Err(CheckoutError::Api { status: status.as_u16(), message });
        }

        serde_json::from_str(&body).map_err(|e| CheckoutError::Decode(e.to_string()))
    }

    fn require<T>(envelope: Envelope<T>, what: &str) -> Result<T> {
        envelope
            .data
            .ok_or_else(|| CheckoutError::Decode(format!("missing {what} in response")))
    }
}

#[async_trait(?Send)]
impl BillingApi for HttpBillingApi {
    async fn change_plan(&self, request: &ChangePlanRequest) -> Result<ChangePlanResponse> {
        tracing::debug!(plan = %request.plan_slug, "Requesting plan change");

        let envelope: Envelope<ReferenceData> = self
            .send(self.client.post(self.url("/settings/plan")).json(request))
            .await?;

        if envelope.status == Some(false) {
            return Err(CheckoutError::Api {
                status: 200,
                message: envelope.message.unwrap_or_default(),
            });
        }

        let reference = envelope
            .data
            .and_then(|d| d.reference)
            .filter(|r| !r.is_empty());

        Ok(match reference {
            Some(reference) => ChangePlanResponse::PaymentRequired {
                reference: SessionReference::new(reference),
            },
            None => ChangePlanResponse::Applied { message: envelope.message },
        })
    }

    async fn verify_payment(&self, reference: &ProviderReference) -> Result<VerifyResponse> {
        let body = serde_json::json!({ "reference": reference });
        let envelope: Envelope<serde_json::Value> = self
            .send(self.client.post(self.url("/settings/payment/verify")).json(&body))
            .await?;

        Ok(VerifyResponse {
            verified: envelope.status.unwrap_or(true),
            message: envelope.message,
        })
    }

    async fn subscription(&self) -> Result<Subscription> {
        let envelope = self.send(self.client.get(self.url("/settings/subscription"))).await?;
        Self::require(envelope, "subscription")
    }

    async fn wallet_balance(&self) -> Result<WalletBalance> {
        let envelope = self.send(self.client.get(self.url("/settings/wallet-balance"))).await?;
        Self::require(envelope, "wallet balance")
    }

    async fn billing_history(&self) -> Result<Vec<BillingHistoryEntry>> {
        let envelope: Envelope<Vec<BillingHistoryEntry>> = self
            .send(self.client.get(self.url("/settings/billing-history")))
            .await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PaymentMethod, SubscriptionStatus};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn plan_request() -> ChangePlanRequest {
        ChangePlanRequest {
            plan_slug: "growth".into(),
            discount_code: Some("EASTER".into()),
            payment_method: Some(PaymentMethod::Card),
        }
    }

    #[tokio::test]
    async fn test_change_plan_returns_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settings/plan"))
            .and(body_json(serde_json::json!({
                "planSlug": "growth",
                "discountCode": "EASTER",
                "paymentMethod": "card"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": true,
                "data": { "reference": "PSK_abc" }
            })))
            .mount(&server)
            .await;

        let api = HttpBillingApi::new(server.uri());
        let response = api.change_plan(&plan_request()).await.unwrap();
        assert_eq!(
            response,
            ChangePlanResponse::PaymentRequired { reference: SessionReference::new("PSK_abc") }
        );
    }

    #[tokio::test]
    async fn test_change_plan_applied_without_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settings/plan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": true,
                "message": "Plan changed"
            })))
            .mount(&server)
            .await;

        let api = HttpBillingApi::new(server.uri());
        let response = api.change_plan(&plan_request()).await.unwrap();
        assert_eq!(response, ChangePlanResponse::Applied { message: Some("Plan changed".into()) });
    }

    #[tokio::test]
    async fn test_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settings/plan"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "status": false,
                "message": "Discount code has expired"
            })))
            .mount(&server)
            .await;

        let api = HttpBillingApi::new(server.uri());
        let err = api.change_plan(&plan_request()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Api { status: 422, .. }));
        assert_eq!(err.backend_message(), Some("Discount code has expired"));
    }

    #[tokio::test]
    async fn test_verify_payment_sends_reference_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/settings/payment/verify"))
            .and(header("authorization", "Bearer tok_1"))
            .and(header("x-tenant-id", "grace-chapel"))
            .and(body_json(serde_json::json!({ "reference": "PRV_123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": true,
                "message": "Verification successful"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpBillingApi::new(format!("{}/", server.uri()))
            .with_token("tok_1")
            .with_tenant("grace-chapel");
        let response = api.verify_payment(&ProviderReference::new("PRV_123")).await.unwrap();
        assert!(response.verified);
    }

    #[tokio::test]
    async fn test_subscription_read() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/settings/subscription"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "planSlug": "growth", "status": "active", "autoRenew": true }
            })))
            .mount(&server)
            .await;

        let api = HttpBillingApi::new(server.uri());
        let sub = api.subscription().await.unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.auto_renew);
    }
}
