//! Spire REST client

use async_trait::async_trait;
use reqwest::{header::LOCATION, Response, Url};

use super::OrderBackend;
use crate::config::SpireConfig;
use crate::{BackendError, CreatedOrder, Result, SalesOrder};

/// One authenticated session against a Spire company, shared by every call
/// of a run.
#[derive(Clone)]
pub struct SpireClient {
    http: reqwest::Client,
    orders_url: Url,
    username: String,
    password: String,
}

impl SpireClient {
    pub fn new(config: &SpireConfig) -> Result<Self> {
        let orders_url = Url::parse(&config.orders_url()).map_err(|e| BackendError::Other(e.to_string()))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, orders_url, username: config.username.clone(), password: config.password.clone() })
    }

    fn order_url(&self, order: &CreatedOrder, suffix: &str) -> Result<Url> {
        let id = order.id.ok_or(BackendError::MissingId)?;
        self.orders_url.join(&format!("{}{}", id, suffix)).map_err(|e| BackendError::Other(e.to_string()))
    }

    async fn fetch(&self, url: Url) -> Result<CreatedOrder> {
        let resp = self.http.get(url).basic_auth(&self.username, Some(&self.password)).send().await?;
        Ok(ensure_success(resp).await?.json().await?)
    }
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() { return Ok(resp); }
    let body = resp.text().await.unwrap_or_default();
    Err(BackendError::Status { status: status.as_u16(), body })
}

#[async_trait]
impl OrderBackend for SpireClient {
    async fn create_sales_order(&self, order: &SalesOrder) -> Result<CreatedOrder> {
        let resp = self.http
            .post(self.orders_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .json(order)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        // Spire answers 201 with the new record's URL rather than the record.
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(BackendError::MissingLocation)?;
        let url = self.orders_url.join(location).map_err(|e| BackendError::Other(e.to_string()))?;
        tracing::debug!(reference = %order.reference_no, %url, "Sales order created");
        self.fetch(url).await
    }

    async fn update_sales_order(&self, order: &CreatedOrder) -> Result<()> {
        let url = self.order_url(order, "")?;
        let resp = self.http.put(url).basic_auth(&self.username, Some(&self.password)).json(order).send().await?;
        ensure_success(resp).await?;
        Ok(())
    }

    async fn invoice_sales_order(&self, order: &CreatedOrder) -> Result<()> {
        let url = self.order_url(order, "/invoice")?;
        let resp = self.http
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}
