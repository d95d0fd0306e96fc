//! Catalog data source.
//!
//! The HTTP implementation normalizes raw records here, at the boundary, so
//! everything downstream works with the canonical `CatalogProduct` shape.

use async_trait::async_trait;

use crate::domain::catalog::{CatalogProduct, Category, RawProduct, Subcategory};
use crate::{Error, Result};

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn products(&self) -> Result<Vec<CatalogProduct>>;
    async fn categories(&self) -> Result<Vec<Category>>;
    async fn subcategories(&self) -> Result<Vec<Subcategory>>;
}

pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    currency: String,
}

impl HttpCatalog {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, currency: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into(), currency: currency.into() }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::UpstreamStatus(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn products(&self) -> Result<Vec<CatalogProduct>> {
        let raw: Vec<RawProduct> = self.get_json("products").await?;
        tracing::debug!(count = raw.len(), "fetched catalog products");
        Ok(raw.into_iter().map(|r| r.normalize(&self.currency)).collect())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.get_json("categories").await
    }

    async fn subcategories(&self) -> Result<Vec<Subcategory>> {
        self.get_json("subcategories").await
    }
}

/// Fixed catalog for tests and local development.
#[derive(Default)]
pub struct InMemoryCatalog {
    pub products: Vec<CatalogProduct>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn products(&self) -> Result<Vec<CatalogProduct>> { Ok(self.products.clone()) }
    async fn categories(&self) -> Result<Vec<Category>> { Ok(self.categories.clone()) }
    async fn subcategories(&self) -> Result<Vec<Subcategory>> { Ok(self.subcategories.clone()) }
}
