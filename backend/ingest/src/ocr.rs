//! OCR endpoint client.
//!
//! The OCR service is external: it takes the URL of an uploaded image and
//! returns best-effort parsed receipt fields. Every response field may be
//! absent or wrong; conversion to a draft is lenient and never fails on
//! OCR content, only on transport.

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use scanledger_core::{ItemDraft, ReceiptDraft};

/// Abstract interface for the OCR service.
#[async_trait]
pub trait ReceiptOcr: Send + Sync {
    async fn parse(&self, image_url: &str) -> Result<OcrReceipt>;
}

/// Parsed receipt fields as returned by the OCR endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrReceipt {
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub items: Vec<OcrItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrItem {
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl OcrReceipt {
    /// Convert OCR output into a draft owned by `user_id`. Fields the OCR
    /// could not produce, or produced unusably, stay `None` — "not
    /// provided" is preserved rather than defaulted to an empty value.
    pub fn into_draft(self, user_id: Uuid) -> ReceiptDraft {
        let date = self.date.as_deref().and_then(|raw| {
            let parsed = NaiveDate::from_str(raw).ok();
            if parsed.is_none() {
                warn!(raw, "Discarding unparseable OCR date");
            }
            parsed
        });
        ReceiptDraft {
            user_id,
            store_name: self.store_name,
            total: self.total.and_then(Decimal::from_f64),
            date,
            items: self
                .items
                .into_iter()
                .map(|item| ItemDraft {
                    item_name: item.item_name,
                    custom_name: None,
                    price: item.price.and_then(Decimal::from_f64),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct OcrRequest<'a> {
    url: &'a str,
}

/// HTTP client for the OCR endpoint: `POST {endpoint}` with `{"url": ...}`.
pub struct HttpOcrClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpOcrClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ReceiptOcr for HttpOcrClient {
    async fn parse(&self, image_url: &str) -> Result<OcrReceipt> {
        let body = OcrRequest { url: image_url };
        let parsed: OcrReceipt = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("OCR request failed")?
            .error_for_status()
            .context("OCR endpoint returned an error status")?
            .json()
            .await
            .context("OCR response was not valid JSON")?;
        Ok(parsed)
    }
}
