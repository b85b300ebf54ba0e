//! Client-facing receipt/item repository.
//!
//! This is the complete call surface the UI layer consumes. Simple reads
//! and single-row writes go straight to the storage gateway; anything that
//! must touch more than one row consistently (receipt with its items,
//! custom-name propagation) goes through the store's transactional entry
//! points. The store handle is injected, so the repository can be driven
//! against any [`LedgerStore`] implementation.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use scanledger_core::{
    CustomNameCommand, CustomNameMapping, Item, ItemDraft, ItemEcho, ItemId, LedgerError,
    PropagationOutcome, Receipt, ReceiptDraft, ReceiptId,
};
use scanledger_storage::LedgerStore;

#[derive(Clone)]
pub struct ReceiptRepository {
    store: Arc<dyn LedgerStore>,
}

impl ReceiptRepository {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    // -- receipts -----------------------------------------------------------

    /// Persist a draft header together with all of its items as one atomic
    /// unit. Returns the created receipt id. Callers must not retry
    /// blindly on failure: the insert direction is not idempotent.
    pub async fn insert_receipt(&self, draft: &ReceiptDraft) -> Result<ReceiptId, LedgerError> {
        let receipt_id = self.store.commit_receipt_with_items(draft).await?;
        info!(user_id = %draft.user_id, receipt_id, "Receipt inserted");
        Ok(receipt_id)
    }

    /// Delete a receipt and all of its items atomically. The rows to
    /// remove are resolved by `(user_id, receipt_id)`; idempotent, so this
    /// direction is safe to retry.
    pub async fn delete_receipt(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<(), LedgerError> {
        self.store.delete_receipt_with_items(user_id, receipt_id).await
    }

    /// Update the header fields of one receipt, leaving its items alone.
    /// Fails with [`LedgerError::NotFound`] when the scoped row does not
    /// exist rather than silently succeeding a zero-row update.
    pub async fn edit_receipt(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        store_name: Option<String>,
        total: Option<Decimal>,
        date: Option<NaiveDate>,
    ) -> Result<(), LedgerError> {
        self.store
            .update_receipt(user_id, receipt_id, store_name, total, date)
            .await
    }

    pub async fn get_receipt(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<Option<Receipt>, LedgerError> {
        self.store.get_receipt(user_id, receipt_id).await
    }

    pub async fn get_receipts(&self, user_id: Uuid) -> Result<Vec<Receipt>, LedgerError> {
        self.store.get_receipts(user_id).await
    }

    // -- items --------------------------------------------------------------

    pub async fn insert_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item: ItemDraft,
    ) -> Result<ItemEcho, LedgerError> {
        self.store.insert_item(user_id, receipt_id, item).await
    }

    pub async fn edit_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
        item: ItemDraft,
    ) -> Result<ItemEcho, LedgerError> {
        self.store.update_item(user_id, receipt_id, item_id, item).await
    }

    pub async fn get_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
    ) -> Result<Option<Item>, LedgerError> {
        self.store.get_item(user_id, receipt_id, item_id).await
    }

    pub async fn get_items(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<Vec<Item>, LedgerError> {
        self.store.get_items(user_id, receipt_id).await
    }

    pub async fn delete_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
    ) -> Result<ItemEcho, LedgerError> {
        self.store.delete_item(user_id, receipt_id, item_id).await
    }

    // -- custom names -------------------------------------------------------

    /// Set or replace the custom name for one item name, rewriting every
    /// historical item row for this user that carries it.
    pub async fn upsert_custom_item(
        &self,
        user_id: Uuid,
        item_name: impl Into<String>,
        custom_name: impl Into<String>,
    ) -> Result<PropagationOutcome, LedgerError> {
        self.propagate(
            user_id,
            CustomNameCommand::Upsert {
                item_name: item_name.into(),
                custom_name: custom_name.into(),
            },
        )
        .await
    }

    /// Rename a custom label across every mapping and item row that
    /// currently carries it.
    pub async fn upsert_custom_all(
        &self,
        user_id: Uuid,
        old_custom_name: impl Into<String>,
        new_custom_name: impl Into<String>,
    ) -> Result<PropagationOutcome, LedgerError> {
        self.propagate(
            user_id,
            CustomNameCommand::UpsertAll {
                old_custom_name: old_custom_name.into(),
                new_custom_name: new_custom_name.into(),
            },
        )
        .await
    }

    /// Remove the custom name for one item name and clear it from
    /// matching historical item rows.
    pub async fn delete_custom_item(
        &self,
        user_id: Uuid,
        item_name: impl Into<String>,
    ) -> Result<PropagationOutcome, LedgerError> {
        self.propagate(
            user_id,
            CustomNameCommand::Delete {
                item_name: item_name.into(),
            },
        )
        .await
    }

    /// Remove a custom label everywhere it appears for this user.
    pub async fn delete_custom_all(
        &self,
        user_id: Uuid,
        custom_name: impl Into<String>,
    ) -> Result<PropagationOutcome, LedgerError> {
        self.propagate(
            user_id,
            CustomNameCommand::DeleteAll {
                custom_name: custom_name.into(),
            },
        )
        .await
    }

    pub async fn get_custom_item(
        &self,
        user_id: Uuid,
        item_name: &str,
    ) -> Result<Option<CustomNameMapping>, LedgerError> {
        self.store.get_custom_name(user_id, item_name).await
    }

    pub async fn get_custom_all(
        &self,
        user_id: Uuid,
        custom_name: &str,
    ) -> Result<Vec<CustomNameMapping>, LedgerError> {
        self.store.get_custom_names_by_custom(user_id, custom_name).await
    }

    pub async fn get_custom_items_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CustomNameMapping>, LedgerError> {
        self.store.get_custom_names(user_id).await
    }

    async fn propagate(
        &self,
        user_id: Uuid,
        command: CustomNameCommand,
    ) -> Result<PropagationOutcome, LedgerError> {
        let verb = command.verb();
        let outcome = self
            .store
            .commit_custom_name_propagation(user_id, command)
            .await?;
        if outcome.mappings_touched == 0 && outcome.items_touched == 0 {
            // Nothing matched; committed anyway. Callers that care check
            // existence separately before issuing the command.
            warn!(%user_id, command = verb, "Custom-name command matched no rows");
        }
        Ok(outcome)
    }
}
