//! Configuration loading from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use stockline_orders::TransitionPolicy;

pub const DEFAULT_COUNTRY_LOOKUP_URL: &str = "https://restcountries.com/v3.1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Low-stock message settings (EmailJS-style template service).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifySettings {
    /// Template-service endpoint. `None` means notifications are only logged.
    pub endpoint: Option<String>,
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub from_name: String,
    pub to_name: String,
    pub recipient: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            service_id: String::new(),
            template_id: String::new(),
            user_id: String::new(),
            from_name: "Inventory Management System".to_string(),
            to_name: "Admin".to_string(),
            recipient: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; in-memory stores are used when absent.
    pub database_url: Option<String>,
    pub notify: NotifySettings,
    /// User service endpoint returning the full user list as JSON. When
    /// absent, users come from Postgres (if configured) or an empty
    /// in-memory directory.
    pub users_url: Option<String>,
    pub country_lookup_url: String,
    pub http_timeout: Duration,
    pub transitions: TransitionPolicy,
    /// Whether building the dashboard fires low-stock notifications.
    pub dashboard_low_stock_alerts: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            notify: NotifySettings::default(),
            users_url: None,
            country_lookup_url: DEFAULT_COUNTRY_LOOKUP_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            transitions: TransitionPolicy::default(),
            dashboard_low_stock_alerts: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = AppConfig::default();

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("BIND_ADDR", format!("{raw}: {e}")))?,
            None => defaults.bind_addr,
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => return Err(ConfigError::invalid("HTTP_TIMEOUT_SECS", "must be > 0")),
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => return Err(ConfigError::invalid("HTTP_TIMEOUT_SECS", format!("{raw}: {e}"))),
            },
            None => defaults.http_timeout,
        };

        let transitions = match get("ORDER_TRANSITIONS") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("ORDER_TRANSITIONS", format!("{e}")))?,
            None => defaults.transitions,
        };

        let dashboard_low_stock_alerts = match get("DASHBOARD_LOW_STOCK_ALERTS") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid("DASHBOARD_LOW_STOCK_ALERTS", raw.clone()))?,
            None => defaults.dashboard_low_stock_alerts,
        };

        let notify_defaults = NotifySettings::default();
        let notify = NotifySettings {
            endpoint: get("NOTIFY_ENDPOINT"),
            service_id: get("NOTIFY_SERVICE_ID").unwrap_or_default(),
            template_id: get("NOTIFY_TEMPLATE_ID").unwrap_or_default(),
            user_id: get("NOTIFY_USER_ID").unwrap_or_default(),
            from_name: get("NOTIFY_FROM_NAME").unwrap_or(notify_defaults.from_name),
            to_name: get("NOTIFY_TO_NAME").unwrap_or(notify_defaults.to_name),
            recipient: get("NOTIFY_RECIPIENT").unwrap_or_default(),
        };
        if notify.endpoint.is_some() && notify.recipient.is_empty() {
            return Err(ConfigError::invalid(
                "NOTIFY_RECIPIENT",
                "required when NOTIFY_ENDPOINT is set",
            ));
        }
        if notify.endpoint.is_none() {
            tracing::warn!("NOTIFY_ENDPOINT not set; low-stock notifications will only be logged");
        }

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            notify,
            users_url: get("USERS_URL"),
            country_lookup_url: get("COUNTRY_LOOKUP_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.country_lookup_url),
            http_timeout,
            transitions,
            dashboard_low_stock_alerts,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
