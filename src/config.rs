//! Run configuration.
//!
//! Everything is fixed before the run starts: values come from the process
//! environment (optionally seeded from a `.env` file by the binary) and are
//! handed to the aggregator and driver explicitly.

use std::fmt;
use std::path::PathBuf;

use validator::Validate;

use crate::ConfigError;

pub const DEFAULT_REPORT_FILE: &str = "FBA Orders Amazon Report.xlsx";
pub const DEFAULT_SHEET_NAME: &str = "FBA Orders Amazon Report";
pub const DEFAULT_LOG_FILE: &str = "fba-orders-import.log";

#[derive(Clone, Debug, Validate)]
pub struct ImportConfig {
    pub report_file: PathBuf,
    #[validate(length(min = 1))]
    pub sheet_name: String,
    pub log_file: PathBuf,
    #[validate]
    pub spire: SpireConfig,
    #[validate]
    pub defaults: ImportDefaults,
}

#[derive(Clone, Validate)]
pub struct SpireConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub secure: bool,
}

impl SpireConfig {
    /// Base URL of the company's sales order collection.
    pub fn orders_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}/api/v2/companies/{}/sales/orders/", scheme, self.host.trim_end_matches('/'), self.company)
    }
}

impl fmt::Debug for SpireConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpireConfig")
            .field("host", &self.host)
            .field("company", &self.company)
            .field("username", &self.username)
            .field("password", &"***")
            .field("secure", &self.secure)
            .finish()
    }
}

/// Constants stamped onto every imported order.
#[derive(Clone, Debug, PartialEq, Eq, Validate)]
pub struct ImportDefaults {
    #[validate(length(min = 1))]
    pub customer_no: String,
    #[validate(length(min = 1))]
    pub warehouse: String,
    #[validate(length(min = 1))]
    pub payment_method: String,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            customer_no: "AMAZON".to_string(),
            warehouse: "AMZN".to_string(),
            payment_method: "06".to_string(),
        }
    }
}

impl ImportConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` uses the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let secure = match lookup("SPIRE_SECURE") {
            None => false,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { name: "SPIRE_SECURE", value: raw })?,
        };
        let defaults = ImportDefaults::default();

        let config = Self {
            report_file: PathBuf::from(or_default("FBA_REPORT_FILE", DEFAULT_REPORT_FILE)),
            sheet_name: or_default("FBA_SHEET_NAME", DEFAULT_SHEET_NAME),
            log_file: PathBuf::from(or_default("FBA_LOG_FILE", DEFAULT_LOG_FILE)),
            spire: SpireConfig {
                host: required("SPIRE_HOST")?,
                company: required("SPIRE_COMPANY")?,
                username: required("SPIRE_USERNAME")?,
                password: required("SPIRE_PASSWORD")?,
                secure,
            },
            defaults: ImportDefaults {
                customer_no: or_default("FBA_CUSTOMER_NO", &defaults.customer_no),
                warehouse: or_default("FBA_WAREHOUSE", &defaults.warehouse),
                payment_method: or_default("FBA_PAYMENT_METHOD", &defaults.payment_method),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
