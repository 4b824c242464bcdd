//! Order management backend.
//!
//! The submission driver only talks to [`OrderBackend`]; the Spire HTTP
//! client is the production implementation.

pub mod spire;

use async_trait::async_trait;

use crate::{CreatedOrder, Result, SalesOrder};

pub use spire::SpireClient;

#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Creates the order and returns it as stored by the backend.
    async fn create_sales_order(&self, order: &SalesOrder) -> Result<CreatedOrder>;

    /// Persists changes made to a created order (payments).
    async fn update_sales_order(&self, order: &CreatedOrder) -> Result<()>;

    /// Turns the order into an invoice.
    async fn invoice_sales_order(&self, order: &CreatedOrder) -> Result<()>;
}
