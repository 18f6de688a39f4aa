use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockline_catalog::Product;

use crate::config::NotifySettings;

/// Template variables of one low-stock message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFields {
    pub from_name: String,
    pub to_name: String,
    pub product_name: String,
    pub product_id: String,
    pub product_price: String,
    pub product_stock: u32,
    pub to_email: String,
}

impl TemplateFields {
    pub fn low_stock(product: &Product, settings: &NotifySettings) -> Self {
        Self {
            from_name: settings.from_name.clone(),
            to_name: settings.to_name.clone(),
            product_name: product.name.clone(),
            product_id: product.id.to_string(),
            product_price: product.price.to_string(),
            product_stock: product.stock,
            to_email: settings.recipient.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Network(String),

    #[error("notification service answered {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound message channel.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, fields: &TemplateFields) -> Result<(), NotifyError>;
}

#[async_trait]
impl<S> NotificationDispatcher for Arc<S>
where
    S: NotificationDispatcher + ?Sized,
{
    async fn send(&self, fields: &TemplateFields) -> Result<(), NotifyError> {
        (**self).send(fields).await
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a TemplateFields,
}

/// Posts template messages to an EmailJS-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpNotificationDispatcher {
    client: reqwest::Client,
    endpoint: String,
    service_id: String,
    template_id: String,
    user_id: String,
}

impl HttpNotificationDispatcher {
    pub fn new(
        endpoint: impl Into<String>,
        settings: &NotifySettings,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            service_id: settings.service_id.clone(),
            template_id: settings.template_id.clone(),
            user_id: settings.user_id.clone(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn send(&self, fields: &TemplateFields) -> Result<(), NotifyError> {
        let body = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.user_id,
            template_params: fields,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Writes each message to the log instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn send(&self, fields: &TemplateFields) -> Result<(), NotifyError> {
        tracing::info!(
            product_id = %fields.product_id,
            product_name = %fields.product_name,
            stock = fields.product_stock,
            to = %fields.to_email,
            "low-stock notification (log only)"
        );
        Ok(())
    }
}

/// Keeps every message in memory; can be told to fail. For tests.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<TemplateFields>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose every send fails after recording the attempt.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<TemplateFields> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, fields: &TemplateFields) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(fields.clone());
        }
        if self.fail {
            return Err(NotifyError::Network("dispatcher configured to fail".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockline_core::{Money, ProductId};

    #[test]
    fn template_carries_product_and_recipient() {
        let product = Product {
            id: ProductId::from_raw("p-7"),
            name: "Desk Lamp".to_string(),
            price: Money::from_minor(1999),
            stock: 4,
        };
        let settings = NotifySettings {
            recipient: "ops@example.com".to_string(),
            ..Default::default()
        };
        let fields = TemplateFields::low_stock(&product, &settings);
        assert_eq!(fields.product_id, "p-7");
        assert_eq!(fields.product_price, "19.99");
        assert_eq!(fields.product_stock, 4);
        assert_eq!(fields.to_email, "ops@example.com");
        assert_eq!(fields.from_name, "Inventory Management System");
        assert_eq!(fields.to_name, "Admin");
    }

    #[test]
    fn request_body_nests_template_params() {
        let fields = TemplateFields {
            from_name: "a".into(),
            to_name: "b".into(),
            product_name: "c".into(),
            product_id: "d".into(),
            product_price: "1.00".into(),
            product_stock: 2,
            to_email: "e".into(),
        };
        let body = SendRequest {
            service_id: "svc",
            template_id: "tpl",
            user_id: "usr",
            template_params: &fields,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["service_id"], "svc");
        assert_eq!(json["template_params"]["product_stock"], 2);
    }

    #[tokio::test]
    async fn recording_dispatcher_records_even_when_failing() {
        let dispatcher = RecordingDispatcher::failing();
        let fields = TemplateFields::low_stock(
            &Product {
                id: ProductId::from_raw("p"),
                name: "x".into(),
                price: Money::ZERO,
                stock: 0,
            },
            &NotifySettings::default(),
        );
        assert!(dispatcher.send(&fields).await.is_err());
        assert_eq!(dispatcher.sent().len(), 1);
    }
}
