//! Order submission gateway.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::order::OrderPayload;
use crate::{Error, Result};

#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit a checkout payload; returns the created order id. A failure
    /// here leaves the caller's session untouched so the user can retry.
    async fn submit(&self, payload: &OrderPayload) -> Result<String>;
}

pub struct HttpOrderGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedOrder {
    #[serde(alias = "_id", alias = "orderId")]
    id: String,
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn submit(&self, payload: &OrderPayload) -> Result<String> {
        let url = format!("{}/orders", self.base_url.trim_end_matches('/'));
        let response = self.client.post(&url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(Error::UpstreamStatus(response.status().as_u16()));
        }
        let created: CreatedOrder = response.json().await?;
        tracing::info!(order_id = %created.id, "order submitted");
        Ok(created.id)
    }
}
