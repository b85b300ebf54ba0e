use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row id generated by the store for a receipt header.
pub type ReceiptId = i64;
/// Row id generated by the store for an item.
pub type ItemId = i64;

/// A persisted receipt header. Header fields other than the owner are
/// optional: OCR output is best-effort and `None` marks "not provided",
/// distinct from an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_id: ReceiptId,
    pub user_id: Uuid,
    pub store_name: Option<String>,
    pub total: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

/// A persisted line item. Belongs to exactly one receipt.
/// `custom_name` is the user's display override, kept in step with the
/// `item_custom_name` mapping by the propagation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub receipt_id: ReceiptId,
    pub user_id: Uuid,
    pub item_name: Option<String>,
    pub custom_name: Option<String>,
    pub price: Option<Decimal>,
}

/// The canonical per-user mapping from a recognized item name to the
/// user's chosen display name. At most one row per `(user_id, item_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomNameMapping {
    pub user_id: Uuid,
    pub item_name: String,
    pub custom_name: String,
}

/// Receipt fields captured before the store has assigned an identity.
/// A draft always carries its owner; everything else may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptDraft {
    pub user_id: Uuid,
    pub store_name: Option<String>,
    pub total: Option<Decimal>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<ItemDraft>,
}

impl ReceiptDraft {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }
}

/// Item fields for an insert or edit, before the store has assigned an id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemDraft {
    pub item_name: Option<String>,
    pub custom_name: Option<String>,
    pub price: Option<Decimal>,
}

impl ItemDraft {
    pub fn named(item_name: impl Into<String>) -> Self {
        Self {
            item_name: Some(item_name.into()),
            ..Self::default()
        }
    }
}

/// Minimal confirmation returned by every mutating item operation: the
/// affected row's name, re-selected after the write. Callers use this as
/// an idempotent echo rather than trusting a bare boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEcho {
    pub item_name: Option<String>,
}
