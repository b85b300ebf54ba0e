//! Custom-name commands: the four propagation verbs and their wire form.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A resolved custom-name operation. Per-item commands match on
/// `item_name`; the `_all` variants match on the custom label itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomNameCommand {
    /// Set or replace the mapping for one item name and rewrite the label
    /// on every historical item row carrying that name.
    Upsert {
        item_name: String,
        custom_name: String,
    },
    /// Bulk rename: every mapping and item row currently carrying
    /// `old_custom_name` moves to `new_custom_name`.
    UpsertAll {
        old_custom_name: String,
        new_custom_name: String,
    },
    /// Remove the mapping for one item name and clear the label on
    /// matching item rows.
    Delete { item_name: String },
    /// Remove every mapping with this label and clear it on all matching
    /// item rows.
    DeleteAll { custom_name: String },
}

impl CustomNameCommand {
    /// The wire verb for this command.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Upsert { .. } => "upsert",
            Self::UpsertAll { .. } => "upsert_all",
            Self::Delete { .. } => "delete",
            Self::DeleteAll { .. } => "delete_all",
        }
    }
}

/// JSON body accepted by the custom-name transaction endpoint. All fields
/// beyond the verb are optional on the wire; `try_into` a
/// [`CustomNameCommand`] reports exactly which required field is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomNameRequest {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Target label for `upsert_all`; `custom_name` carries the old label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_custom_name: Option<String>,
}

impl TryFrom<CustomNameRequest> for CustomNameCommand {
    type Error = LedgerError;

    fn try_from(req: CustomNameRequest) -> Result<Self, Self::Error> {
        fn require(
            field: Option<String>,
            name: &'static str,
        ) -> Result<String, LedgerError> {
            field.ok_or(LedgerError::PartialInput(name))
        }

        match req.command.as_str() {
            "upsert" => Ok(Self::Upsert {
                item_name: require(req.item_name, "item_name")?,
                custom_name: require(req.custom_name, "custom_name")?,
            }),
            "upsert_all" => Ok(Self::UpsertAll {
                old_custom_name: require(req.custom_name, "custom_name")?,
                new_custom_name: require(req.new_custom_name, "new_custom_name")?,
            }),
            "delete" => Ok(Self::Delete {
                item_name: require(req.item_name, "item_name")?,
            }),
            "delete_all" => Ok(Self::DeleteAll {
                custom_name: require(req.custom_name, "custom_name")?,
            }),
            other => Err(LedgerError::UnknownCommand(other.to_string())),
        }
    }
}

/// Row counts touched by one propagation transaction. An empty match set
/// still commits; callers that care about existence check separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationOutcome {
    pub mappings_touched: usize,
    pub items_touched: usize,
}
