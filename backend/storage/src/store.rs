use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use scanledger_core::{
    CustomNameCommand, CustomNameMapping, Item, ItemDraft, ItemEcho, ItemId, LedgerError,
    PropagationOutcome, Receipt, ReceiptDraft, ReceiptId,
};

/// Abstract interface over the relational receipt store.
///
/// Every operation is scoped by `user_id` in addition to any row key: a
/// caller can never address another user's row by guessing an id. Point
/// reads return `Ok(None)` / an empty `Vec` for "no rows"; mutations that
/// touch zero rows fail with [`LedgerError::NotFound`]. The three
/// `commit_*`/`delete_*_with_items` entry points are all-or-nothing.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // -- receipt gateway ----------------------------------------------------

    async fn get_receipt(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<Option<Receipt>, LedgerError>;

    async fn get_receipts(&self, user_id: Uuid) -> Result<Vec<Receipt>, LedgerError>;

    /// Update the header fields of one receipt, leaving its items alone.
    async fn update_receipt(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        store_name: Option<String>,
        total: Option<Decimal>,
        date: Option<NaiveDate>,
    ) -> Result<(), LedgerError>;

    // -- item gateway -------------------------------------------------------

    async fn insert_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item: ItemDraft,
    ) -> Result<ItemEcho, LedgerError>;

    async fn update_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
        item: ItemDraft,
    ) -> Result<ItemEcho, LedgerError>;

    async fn get_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
    ) -> Result<Option<Item>, LedgerError>;

    async fn get_items(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<Vec<Item>, LedgerError>;

    async fn delete_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
    ) -> Result<ItemEcho, LedgerError>;

    // -- custom-name gateway ------------------------------------------------

    async fn get_custom_name(
        &self,
        user_id: Uuid,
        item_name: &str,
    ) -> Result<Option<CustomNameMapping>, LedgerError>;

    async fn get_custom_names_by_custom(
        &self,
        user_id: Uuid,
        custom_name: &str,
    ) -> Result<Vec<CustomNameMapping>, LedgerError>;

    async fn get_custom_names(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CustomNameMapping>, LedgerError>;

    // -- atomic transactions ------------------------------------------------

    /// Insert the header row and all item rows of a draft as one unit.
    /// Returns the generated receipt id. No partial receipts: either every
    /// row commits or none do.
    async fn commit_receipt_with_items(
        &self,
        draft: &ReceiptDraft,
    ) -> Result<ReceiptId, LedgerError>;

    /// Delete the header and all its items as one unit, resolving the item
    /// rows by `(user_id, receipt_id)`. Idempotent: deleting an absent
    /// receipt commits cleanly, so the delete direction is safe to retry.
    async fn delete_receipt_with_items(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<(), LedgerError>;

    /// Apply one custom-name command to the mapping table and every
    /// matching item row inside a single transaction. A reader never
    /// observes the mapping changed but historical items stale.
    async fn commit_custom_name_propagation(
        &self,
        user_id: Uuid,
        command: CustomNameCommand,
    ) -> Result<PropagationOutcome, LedgerError>;
}
