//! Pincode-serviceability lookup.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::order::ShippingQuote;
use crate::domain::value_objects::{Money, Pincode};
use crate::{Error, Result};

#[async_trait]
pub trait ServiceabilityLookup: Send + Sync {
    /// Resolve the shipping cost for a destination pincode. A non-positive
    /// or absent amount from upstream means "not serviceable".
    async fn quote(&self, pincode: &Pincode) -> Result<ShippingQuote>;
}

pub struct HttpServiceability {
    client: reqwest::Client,
    base_url: String,
    currency: String,
}

impl HttpServiceability {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, currency: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into(), currency: currency.into() }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceabilityResponse {
    #[serde(alias = "cost", alias = "shippingCost")]
    shipping_cost: Option<Decimal>,
}

#[async_trait]
impl ServiceabilityLookup for HttpServiceability {
    async fn quote(&self, pincode: &Pincode) -> Result<ShippingQuote> {
        let url = format!("{}/serviceability/{}", self.base_url.trim_end_matches('/'), pincode);
        let response = self.client.get(&url).send().await?;
        // An unknown pincode is a plain "we don't deliver there".
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(ShippingQuote::NotServiceable);
        }
        if !response.status().is_success() {
            return Err(Error::UpstreamStatus(response.status().as_u16()));
        }
        let body: ServiceabilityResponse = response.json().await?;
        let quote = ShippingQuote::from_amount(pincode, body.shipping_cost.map(|a| Money::new(a, &self.currency)));
        tracing::debug!(pincode = %pincode, serviceable = quote.is_serviceable(), "serviceability lookup");
        Ok(quote)
    }
}
