// Client minimal pour l'API REST PayPal (Orders v2)
// Authentification: Basic (client_id:secret) -> access token OAuth2, puis Bearer

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PayPalConfig;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("paypal api error status={status} body={body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Commande créée chez le prestataire
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_id: String,
    pub status: String,
    pub approve_url: Option<String>,
}

/// Résultat d'une capture
#[derive(Debug, Clone)]
pub struct GatewayCapture {
    pub order_id: String,
    pub status: String,
}

impl GatewayCapture {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("COMPLETED")
    }
}

/// Point de passage vers le prestataire de paiement.
/// Les handlers reçoivent un `web::Data<dyn PaymentGateway>`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        reference: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    async fn capture_order(&self, order_id: &str) -> Result<GatewayCapture, GatewayError>;
}

pub struct PayPalClient {
    http: reqwest::Client,
    config: PayPalConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnit<'a>>,
}

#[derive(Debug, Serialize)]
struct PurchaseUnit<'a> {
    reference_id: &'a str,
    amount: Amount<'a>,
}

#[derive(Debug, Serialize)]
struct Amount<'a> {
    currency_code: &'a str,
    value: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<LinkDescription>,
}

#[derive(Debug, Deserialize)]
struct LinkDescription {
    href: String,
    rel: String,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(format!("{}/v1/oauth2/token", self.config.api_base))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: TokenResponse = parse_response(resp).await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl PaymentGateway for PayPalClient {
    async fn create_order(
        &self,
        amount: Decimal,
        currency: &str,
        reference: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let token = self.access_token().await?;

        let body = CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnit {
                reference_id: reference,
                amount: Amount {
                    currency_code: currency,
                    value: format_amount(amount),
                },
            }],
        };

        let resp = self
            .http
            .post(format!("{}/v2/checkout/orders", self.config.api_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let order: OrderResponse = parse_response(resp).await?;
        let approve_url = order
            .links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone());

        Ok(GatewayOrder {
            order_id: order.id,
            status: order.status,
            approve_url,
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<GatewayCapture, GatewayError> {
        let token = self.access_token().await?;

        let resp = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.config.api_base, order_id
            ))
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await?;

        let order: OrderResponse = parse_response(resp).await?;
        Ok(GatewayCapture {
            order_id: order.id,
            status: order.status,
        })
    }
}

async fn parse_response<T: for<'de> Deserialize<'de>>(
    resp: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(GatewayError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<T>(&body)
        .map_err(|e| GatewayError::InvalidResponse(format!("{e}; body={body}")))
}

/// PayPal attend une chaîne avec 2 décimales ("10.00")
pub fn format_amount(amount: Decimal) -> String {
    let mut value = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(10, 0)), "10.00");
        assert_eq!(format_amount(Decimal::new(12345, 3)), "12.35");
        assert_eq!(format_amount(Decimal::new(5, 1)), "0.50");
    }

    #[test]
    fn test_order_response_approve_link() {
        let raw = r#"{
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "links": [
                {"href": "https://api.paypal.com/v2/checkout/orders/5O190127TN364715T", "rel": "self", "method": "GET"},
                {"href": "https://www.paypal.com/checkoutnow?token=5O190127TN364715T", "rel": "approve", "method": "GET"}
            ]
        }"#;
        let order: OrderResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(order.id, "5O190127TN364715T");
        assert!(order.links.iter().any(|l| l.rel == "approve"));
    }

    #[test]
    fn test_capture_status() {
        let capture = GatewayCapture {
            order_id: "X".into(),
            status: "COMPLETED".into(),
        };
        assert!(capture.is_completed());

        let declined = GatewayCapture {
            order_id: "X".into(),
            status: "DECLINED".into(),
        };
        assert!(!declined.is_completed());
    }
}
