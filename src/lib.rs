//! FBA Orders Import
//!
//! Turns an Amazon "All Orders" report into Spire sales orders.
//!
//! ## Flow
//! - Load the report rows as text (`source`)
//! - Group rows by Amazon order id into sales orders (`domain::aggregates`)
//! - Create each order in Spire, then pay and invoice it unless it is
//!   backordered or on hold (`submission`)

pub mod backend;
pub mod config;
pub mod domain;
pub mod source;
pub mod submission;
pub mod telemetry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Core Types
// =============================================================================

/// A sales order as sent to Spire's create endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub order_date: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub reference_no: String,
    pub hold: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    pub shipping_address: Address,
    pub items: Vec<SalesOrderItem>,
    pub udf: Udf,
    pub freight: String,
    pub customer: Customer,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderItem {
    pub inventory: Inventory,
    pub part_no: String,
    pub order_qty: String,
    pub unit_price: String,
    pub tax_flags: [bool; 4],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub part_no: String,
    pub whse: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub city: Option<String>,
    pub prov_state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub sales_taxes: Vec<SalesTax>,
}

/// Tax annotation on an address. `code` stays `None` when the rate could not
/// be classified and is still sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesTax {
    pub code: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_no: String,
}

/// User-defined fields carried on the order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Udf {
    pub shopid: String,
    pub shipped: bool,
}

/// An order as returned by Spire after creation.
///
/// Only the fields the importer reads or writes back are modelled; everything
/// else Spire returns is kept in `extra` so an update round-trips it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub order_no: Option<String>,
    #[serde(default)]
    pub reference_no: Option<String>,
    #[serde(default)]
    pub hold: bool,
    #[serde(default)]
    pub total: serde_json::Value,
    #[serde(default)]
    pub items: Vec<CreatedOrderItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payments: Vec<Payment>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CreatedOrder {
    /// True when any line could not be fully allocated.
    pub fn is_backordered(&self) -> bool {
        self.items.iter().any(|i| i.backorder_qty() > 0.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrderItem {
    #[serde(default)]
    pub backorder_qty: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CreatedOrderItem {
    /// Spire sends quantities as decimal strings; numbers are accepted too.
    pub fn backorder_qty(&self) -> f64 {
        match &self.backorder_qty {
            Some(serde_json::Value::String(s)) => domain::value_objects::parse_amount(s).unwrap_or(0.0),
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub method: String,
    pub amount: serde_json::Value,
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unsupported report format: {0}")]
    UnsupportedFormat(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Flat file error: {0}")]
    FlatFile(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Spire returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Created order has no location header")]
    MissingLocation,

    #[error("Order has no id")]
    MissingId,

    #[error("Backend error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;
