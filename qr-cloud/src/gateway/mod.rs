//! Payment gateway integration via REST API (Razorpay-compatible, no SDK)

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use shared::models::Plan;

use crate::config::GatewayConfig;
use crate::db::BoxError;

type HmacSha256 = Hmac<Sha256>;

/// Billing cycles requested for a new subscription (monthly, 10 years)
const TOTAL_COUNT: u32 = 120;

#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

#[derive(Debug, Deserialize)]
struct CreatedSubscription {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FetchedPayment {
    amount: i64,
}

/// Gateway amounts are in the currency's minor unit (paise)
pub fn minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

impl GatewayClient {
    pub fn new(http: reqwest::Client, config: GatewayConfig) -> Self {
        Self { http, config }
    }

    /// Public key id handed to the checkout widget
    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    /// Gateway plan id for a purchasable plan
    pub fn plan_id(&self, plan: Plan) -> Option<&str> {
        match plan {
            Plan::Basic => Some(&self.config.plan_basic),
            Plan::Pro => Some(&self.config.plan_pro),
            Plan::Enterprise => self.config.plan_enterprise.as_deref(),
            Plan::Free => None,
        }
    }

    /// Create a gateway subscription, returning its id (`sub_...`)
    pub async fn create_subscription(
        &self,
        plan_id: &str,
        restaurant_id: i64,
        plan: Plan,
    ) -> Result<String, BoxError> {
        let url = format!("{}/v1/subscriptions", self.config.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&serde_json::json!({
                "plan_id": plan_id,
                "total_count": TOTAL_COUNT,
                "customer_notify": 1,
                "notes": {
                    "restaurant_id": restaurant_id.to_string(),
                    "plan": plan.as_str(),
                },
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Gateway create_subscription failed ({status}): {body}").into());
        }
        let created: CreatedSubscription = resp.json().await?;
        Ok(created.id)
    }

    /// Amount of a gateway payment (`pay_...`)
    pub async fn fetch_payment_amount(&self, payment_id: &str) -> Result<Decimal, BoxError> {
        let url = format!(
            "{}/v1/payments/{payment_id}",
            self.config.base_url.trim_end_matches('/')
        );
        let resp = self
            .http
            .get(url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Gateway fetch_payment failed ({status}): {body}").into());
        }
        let payment: FetchedPayment = resp.json().await?;
        Ok(minor_units(payment.amount))
    }

    /// Checkout callback: `HMAC_SHA256(key_secret, "{payment_id}|{subscription_id}")`
    pub fn verify_payment_signature(
        &self,
        payment_id: &str,
        subscription_id: &str,
        signature: &str,
    ) -> bool {
        verify_hex_hmac(
            &self.config.key_secret,
            format!("{payment_id}|{subscription_id}").as_bytes(),
            signature,
        )
        .is_ok()
    }

    /// Webhook: `HMAC_SHA256(webhook_secret, raw_body)`
    pub fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> Result<(), &'static str> {
        verify_hex_hmac(&self.config.webhook_secret, body, signature)
    }
}

/// Constant-time check of a hex HMAC-SHA256 signature
fn verify_hex_hmac(secret: &str, payload: &[u8], signature: &str) -> Result<(), &'static str> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(payload);
    let sig_bytes = hex::decode(signature.trim()).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Signature mismatch")
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
