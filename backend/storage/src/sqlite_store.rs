//! SQLite-backed ledger store.
//!
//! Uses `rusqlite` to persist the `receipt`, `item`, and
//! `item_custom_name` tables. Multi-row operations (receipt with its
//! items, custom-name propagation) run in native SQLite transactions, so
//! the all-or-nothing guarantee lives in the same tier as the data rather
//! than behind a second network hop. Money is stored as canonical decimal
//! TEXT, dates as ISO-8601 TEXT.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use scanledger_core::{
    CustomNameCommand, CustomNameMapping, Item, ItemDraft, ItemEcho, ItemId, LedgerError,
    PropagationOutcome, Receipt, ReceiptDraft, ReceiptId,
};

use crate::propagation;
use crate::store::LedgerStore;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS receipt (
        receipt_id  INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id     TEXT NOT NULL,
        store_name  TEXT,
        total       TEXT,
        date        TEXT
    );
    CREATE TABLE IF NOT EXISTS item (
        item_id     INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id     TEXT NOT NULL,
        receipt_id  INTEGER NOT NULL REFERENCES receipt(receipt_id),
        item_name   TEXT,
        custom_name TEXT,
        price       TEXT
    );
    CREATE TABLE IF NOT EXISTS item_custom_name (
        user_id     TEXT NOT NULL,
        item_name   TEXT NOT NULL,
        custom_name TEXT NOT NULL,
        PRIMARY KEY (user_id, item_name)
    );
    CREATE INDEX IF NOT EXISTS idx_item_receipt ON item(user_id, receipt_id);
    CREATE INDEX IF NOT EXISTS idx_item_name    ON item(user_id, item_name);
    CREATE INDEX IF NOT EXISTS idx_item_custom  ON item(user_id, custom_name);";

pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
}

impl SqliteLedgerStore {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let conn = Connection::open(path.as_ref()).map_err(LedgerError::backend)?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\nPRAGMA foreign_keys=ON;\n{SCHEMA}"
        ))
        .map_err(LedgerError::backend)?;
        info!("SqliteLedgerStore opened at {:?}", path.as_ref());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory().map_err(LedgerError::backend)?;
        conn.execute_batch(&format!("PRAGMA foreign_keys=ON;\n{SCHEMA}"))
            .map_err(LedgerError::backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Require that a receipt header exists for this owner before touching
    /// its items. Keeps the tenant-isolation invariant even though the
    /// foreign key alone would accept another user's receipt id.
    fn require_receipt(
        tx: &Transaction<'_>,
        user_id: &str,
        receipt_id: ReceiptId,
    ) -> Result<(), LedgerError> {
        let found: Option<i64> = tx
            .query_row(
                "SELECT receipt_id FROM receipt WHERE user_id = ?1 AND receipt_id = ?2",
                params![user_id, receipt_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(LedgerError::backend)?;
        if found.is_none() {
            return Err(LedgerError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn get_receipt(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<Option<Receipt>, LedgerError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT receipt_id, user_id, store_name, total, date
             FROM receipt WHERE user_id = ?1 AND receipt_id = ?2",
            params![user_id.to_string(), receipt_id],
            row_to_receipt,
        )
        .optional()
        .map_err(LedgerError::backend)
    }

    async fn get_receipts(&self, user_id: Uuid) -> Result<Vec<Receipt>, LedgerError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT receipt_id, user_id, store_name, total, date
                 FROM receipt WHERE user_id = ?1 ORDER BY receipt_id",
            )
            .map_err(LedgerError::backend)?;
        let rows = stmt
            .query_map(params![user_id.to_string()], row_to_receipt)
            .map_err(LedgerError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::backend)?;
        Ok(rows)
    }

    async fn update_receipt(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        store_name: Option<String>,
        total: Option<Decimal>,
        date: Option<NaiveDate>,
    ) -> Result<(), LedgerError> {
        let conn = self.conn.lock().await;
        let touched = conn
            .execute(
                "UPDATE receipt SET store_name = ?3, total = ?4, date = ?5
                 WHERE user_id = ?1 AND receipt_id = ?2",
                params![
                    user_id.to_string(),
                    receipt_id,
                    store_name,
                    total.map(|t| t.to_string()),
                    date.map(|d| d.to_string()),
                ],
            )
            .map_err(LedgerError::backend)?;
        if touched == 0 {
            return Err(LedgerError::NotFound);
        }
        debug!(%user_id, receipt_id, "Updated receipt header");
        Ok(())
    }

    async fn insert_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item: ItemDraft,
    ) -> Result<ItemEcho, LedgerError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(LedgerError::backend)?;
        let uid = user_id.to_string();
        Self::require_receipt(&tx, &uid, receipt_id)?;

        let custom_name = match item.custom_name {
            Some(name) => Some(name),
            None => mapped_custom_name(&tx, &uid, item.item_name.as_deref())
                .map_err(LedgerError::backend)?,
        };
        tx.execute(
            "INSERT INTO item (user_id, receipt_id, item_name, custom_name, price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                uid,
                receipt_id,
                item.item_name,
                custom_name,
                item.price.map(|p| p.to_string()),
            ],
        )
        .map_err(LedgerError::backend)?;
        let item_id = tx.last_insert_rowid();

        let echo = tx
            .query_row(
                "SELECT item_name FROM item WHERE item_id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .map(|item_name| ItemEcho { item_name })
            .map_err(LedgerError::backend)?;
        tx.commit().map_err(LedgerError::backend)?;
        debug!(%user_id, receipt_id, item_id, "Inserted item");
        Ok(echo)
    }

    async fn update_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
        item: ItemDraft,
    ) -> Result<ItemEcho, LedgerError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(LedgerError::backend)?;
        let uid = user_id.to_string();
        let touched = tx
            .execute(
                "UPDATE item SET item_name = ?4, custom_name = ?5, price = ?6
                 WHERE user_id = ?1 AND receipt_id = ?2 AND item_id = ?3",
                params![
                    uid,
                    receipt_id,
                    item_id,
                    item.item_name,
                    item.custom_name,
                    item.price.map(|p| p.to_string()),
                ],
            )
            .map_err(LedgerError::backend)?;
        if touched == 0 {
            return Err(LedgerError::NotFound);
        }
        let echo = tx
            .query_row(
                "SELECT item_name FROM item WHERE item_id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .map(|item_name| ItemEcho { item_name })
            .map_err(LedgerError::backend)?;
        tx.commit().map_err(LedgerError::backend)?;
        debug!(%user_id, receipt_id, item_id, "Updated item");
        Ok(echo)
    }

    async fn get_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
    ) -> Result<Option<Item>, LedgerError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT item_id, receipt_id, user_id, item_name, custom_name, price
             FROM item WHERE user_id = ?1 AND receipt_id = ?2 AND item_id = ?3",
            params![user_id.to_string(), receipt_id, item_id],
            row_to_item,
        )
        .optional()
        .map_err(LedgerError::backend)
    }

    async fn get_items(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<Vec<Item>, LedgerError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT item_id, receipt_id, user_id, item_name, custom_name, price
                 FROM item WHERE user_id = ?1 AND receipt_id = ?2 ORDER BY item_id",
            )
            .map_err(LedgerError::backend)?;
        let rows = stmt
            .query_map(params![user_id.to_string(), receipt_id], row_to_item)
            .map_err(LedgerError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::backend)?;
        Ok(rows)
    }

    async fn delete_item(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
        item_id: ItemId,
    ) -> Result<ItemEcho, LedgerError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(LedgerError::backend)?;
        let uid = user_id.to_string();
        // Echo is read before the row disappears.
        let echo: Option<ItemEcho> = tx
            .query_row(
                "SELECT item_name FROM item
                 WHERE user_id = ?1 AND receipt_id = ?2 AND item_id = ?3",
                params![uid, receipt_id, item_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(LedgerError::backend)?
            .map(|item_name| ItemEcho { item_name });
        let Some(echo) = echo else {
            return Err(LedgerError::NotFound);
        };
        tx.execute(
            "DELETE FROM item WHERE user_id = ?1 AND receipt_id = ?2 AND item_id = ?3",
            params![uid, receipt_id, item_id],
        )
        .map_err(LedgerError::backend)?;
        tx.commit().map_err(LedgerError::backend)?;
        debug!(%user_id, receipt_id, item_id, "Deleted item");
        Ok(echo)
    }

    async fn get_custom_name(
        &self,
        user_id: Uuid,
        item_name: &str,
    ) -> Result<Option<CustomNameMapping>, LedgerError> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT user_id, item_name, custom_name FROM item_custom_name
             WHERE user_id = ?1 AND item_name = ?2",
            params![user_id.to_string(), item_name],
            row_to_mapping,
        )
        .optional()
        .map_err(LedgerError::backend)
    }

    async fn get_custom_names_by_custom(
        &self,
        user_id: Uuid,
        custom_name: &str,
    ) -> Result<Vec<CustomNameMapping>, LedgerError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT user_id, item_name, custom_name FROM item_custom_name
                 WHERE user_id = ?1 AND custom_name = ?2 ORDER BY item_name",
            )
            .map_err(LedgerError::backend)?;
        let rows = stmt
            .query_map(params![user_id.to_string(), custom_name], row_to_mapping)
            .map_err(LedgerError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::backend)?;
        Ok(rows)
    }

    async fn get_custom_names(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CustomNameMapping>, LedgerError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT user_id, item_name, custom_name FROM item_custom_name
                 WHERE user_id = ?1 ORDER BY item_name",
            )
            .map_err(LedgerError::backend)?;
        let rows = stmt
            .query_map(params![user_id.to_string()], row_to_mapping)
            .map_err(LedgerError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::backend)?;
        Ok(rows)
    }

    async fn commit_receipt_with_items(
        &self,
        draft: &ReceiptDraft,
    ) -> Result<ReceiptId, LedgerError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(LedgerError::backend)?;
        let uid = draft.user_id.to_string();

        tx.execute(
            "INSERT INTO receipt (user_id, store_name, total, date) VALUES (?1, ?2, ?3, ?4)",
            params![
                uid,
                draft.store_name,
                draft.total.map(|t| t.to_string()),
                draft.date.map(|d| d.to_string()),
            ],
        )
        .map_err(LedgerError::backend)?;
        let receipt_id = tx.last_insert_rowid();

        for item in &draft.items {
            let custom_name = match &item.custom_name {
                Some(name) => Some(name.clone()),
                None => mapped_custom_name(&tx, &uid, item.item_name.as_deref())
                    .map_err(LedgerError::backend)?,
            };
            tx.execute(
                "INSERT INTO item (user_id, receipt_id, item_name, custom_name, price)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    uid,
                    receipt_id,
                    item.item_name,
                    custom_name,
                    item.price.map(|p| p.to_string()),
                ],
            )
            .map_err(LedgerError::backend)?;
        }

        tx.commit().map_err(LedgerError::backend)?;
        info!(
            user_id = %draft.user_id,
            receipt_id,
            items = draft.items.len(),
            "Committed receipt with items"
        );
        Ok(receipt_id)
    }

    async fn delete_receipt_with_items(
        &self,
        user_id: Uuid,
        receipt_id: ReceiptId,
    ) -> Result<(), LedgerError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(LedgerError::backend)?;
        let uid = user_id.to_string();
        let items = tx
            .execute(
                "DELETE FROM item WHERE user_id = ?1 AND receipt_id = ?2",
                params![uid, receipt_id],
            )
            .map_err(LedgerError::backend)?;
        let headers = tx
            .execute(
                "DELETE FROM receipt WHERE user_id = ?1 AND receipt_id = ?2",
                params![uid, receipt_id],
            )
            .map_err(LedgerError::backend)?;
        tx.commit().map_err(LedgerError::backend)?;
        info!(%user_id, receipt_id, items, headers, "Deleted receipt with items");
        Ok(())
    }

    async fn commit_custom_name_propagation(
        &self,
        user_id: Uuid,
        command: CustomNameCommand,
    ) -> Result<PropagationOutcome, LedgerError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(LedgerError::backend)?;
        let outcome =
            propagation::apply(&tx, &user_id.to_string(), &command).map_err(LedgerError::backend)?;
        tx.commit().map_err(LedgerError::backend)?;
        info!(
            %user_id,
            command = command.verb(),
            mappings = outcome.mappings_touched,
            items = outcome.items_touched,
            "Committed custom-name propagation"
        );
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Row deserialization helpers
// ---------------------------------------------------------------------------

fn row_to_receipt(row: &rusqlite::Row) -> rusqlite::Result<Receipt> {
    let user_id: String = row.get(1)?;
    let total: Option<String> = row.get(3)?;
    let date: Option<String> = row.get(4)?;
    Ok(Receipt {
        receipt_id: row.get(0)?,
        user_id: parse_uuid(&user_id)?,
        store_name: row.get(2)?,
        total: parse_decimal(total)?,
        date: parse_date(date)?,
    })
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    let user_id: String = row.get(2)?;
    let price: Option<String> = row.get(5)?;
    Ok(Item {
        item_id: row.get(0)?,
        receipt_id: row.get(1)?,
        user_id: parse_uuid(&user_id)?,
        item_name: row.get(3)?,
        custom_name: row.get(4)?,
        price: parse_decimal(price)?,
    })
}

fn row_to_mapping(row: &rusqlite::Row) -> rusqlite::Result<CustomNameMapping> {
    let user_id: String = row.get(0)?;
    Ok(CustomNameMapping {
        user_id: parse_uuid(&user_id)?,
        item_name: row.get(1)?,
        custom_name: row.get(2)?,
    })
}

fn parse_uuid(raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))
}

fn parse_decimal(raw: Option<String>) -> rusqlite::Result<Option<Decimal>> {
    raw.map(|s| {
        Decimal::from_str(&s).map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))
    })
    .transpose()
}

fn parse_date(raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|s| {
        NaiveDate::from_str(&s).map_err(|e| rusqlite::Error::InvalidParameterName(e.to_string()))
    })
    .transpose()
}

/// Look up the user's declared custom name for an item name, if any. New
/// item rows inherit the mapping so the denormalized cache stays coherent
/// from the moment they are written.
fn mapped_custom_name(
    tx: &Transaction<'_>,
    user_id: &str,
    item_name: Option<&str>,
) -> rusqlite::Result<Option<String>> {
    let Some(name) = item_name else {
        return Ok(None);
    };
    tx.query_row(
        "SELECT custom_name FROM item_custom_name WHERE user_id = ?1 AND item_name = ?2",
        params![user_id, name],
        |row| row.get(0),
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(user_id: Uuid) -> ReceiptDraft {
        ReceiptDraft {
            user_id,
            store_name: Some("Market".to_string()),
            total: Some(Decimal::new(1250, 2)),
            date: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            items: vec![
                ItemDraft {
                    item_name: Some("milk".to_string()),
                    custom_name: None,
                    price: Some(Decimal::new(350, 2)),
                },
                ItemDraft {
                    item_name: Some("apple".to_string()),
                    custom_name: None,
                    price: Some(Decimal::new(120, 2)),
                },
            ],
        }
    }

    #[tokio::test]
    async fn commit_then_read_roundtrip() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();

        let receipt_id = store.commit_receipt_with_items(&draft(user)).await.unwrap();

        let header = store.get_receipt(user, receipt_id).await.unwrap().unwrap();
        assert_eq!(header.store_name.as_deref(), Some("Market"));
        assert_eq!(header.total, Some(Decimal::new(1250, 2)));
        assert_eq!(header.date, NaiveDate::from_ymd_opt(2024, 1, 1));

        let items = store.get_items(user, receipt_id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_name.as_deref(), Some("milk"));
        assert_eq!(items[0].price, Some(Decimal::new(350, 2)));
    }

    #[tokio::test]
    async fn delete_cascades_and_is_idempotent() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let receipt_id = store.commit_receipt_with_items(&draft(user)).await.unwrap();

        store.delete_receipt_with_items(user, receipt_id).await.unwrap();
        assert!(store.get_receipt(user, receipt_id).await.unwrap().is_none());
        assert!(store.get_items(user, receipt_id).await.unwrap().is_empty());

        // Retrying the delete direction is safe.
        store.delete_receipt_with_items(user, receipt_id).await.unwrap();
    }

    #[tokio::test]
    async fn update_receipt_missing_row_is_not_found() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let err = store
            .update_receipt(user, 999, Some("Nowhere".to_string()), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound));
    }

    #[tokio::test]
    async fn upsert_rewrites_mapping_and_history() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let receipt_id = store.commit_receipt_with_items(&draft(user)).await.unwrap();

        let outcome = store
            .commit_custom_name_propagation(
                user,
                CustomNameCommand::Upsert {
                    item_name: "apple".to_string(),
                    custom_name: "fruit-snack".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.items_touched, 1);

        let mapping = store.get_custom_name(user, "apple").await.unwrap().unwrap();
        assert_eq!(mapping.custom_name, "fruit-snack");

        let items = store.get_items(user, receipt_id).await.unwrap();
        let apple = items
            .iter()
            .find(|i| i.item_name.as_deref() == Some("apple"))
            .unwrap();
        assert_eq!(apple.custom_name.as_deref(), Some("fruit-snack"));
        let milk = items
            .iter()
            .find(|i| i.item_name.as_deref() == Some("milk"))
            .unwrap();
        assert_eq!(milk.custom_name, None);
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        store.commit_receipt_with_items(&draft(user)).await.unwrap();

        let cmd = CustomNameCommand::Upsert {
            item_name: "apple".to_string(),
            custom_name: "fruit-snack".to_string(),
        };
        store
            .commit_custom_name_propagation(user, cmd.clone())
            .await
            .unwrap();
        store.commit_custom_name_propagation(user, cmd).await.unwrap();

        let mappings = store.get_custom_names(user).await.unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].custom_name, "fruit-snack");
    }

    #[tokio::test]
    async fn upsert_all_renames_only_the_old_label() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let receipt_id = store.commit_receipt_with_items(&draft(user)).await.unwrap();

        store
            .commit_custom_name_propagation(
                user,
                CustomNameCommand::Upsert {
                    item_name: "apple".to_string(),
                    custom_name: "fruit-snack".to_string(),
                },
            )
            .await
            .unwrap();
        store
            .commit_custom_name_propagation(
                user,
                CustomNameCommand::Upsert {
                    item_name: "milk".to_string(),
                    custom_name: "dairy".to_string(),
                },
            )
            .await
            .unwrap();

        store
            .commit_custom_name_propagation(
                user,
                CustomNameCommand::UpsertAll {
                    old_custom_name: "fruit-snack".to_string(),
                    new_custom_name: "healthy-snack".to_string(),
                },
            )
            .await
            .unwrap();

        let mapping = store.get_custom_name(user, "apple").await.unwrap().unwrap();
        assert_eq!(mapping.custom_name, "healthy-snack");
        // Unrelated label untouched.
        let dairy = store.get_custom_name(user, "milk").await.unwrap().unwrap();
        assert_eq!(dairy.custom_name, "dairy");

        let items = store.get_items(user, receipt_id).await.unwrap();
        let apple = items
            .iter()
            .find(|i| i.item_name.as_deref() == Some("apple"))
            .unwrap();
        assert_eq!(apple.custom_name.as_deref(), Some("healthy-snack"));
    }

    #[tokio::test]
    async fn delete_all_clears_mapping_and_items() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let receipt_id = store.commit_receipt_with_items(&draft(user)).await.unwrap();

        store
            .commit_custom_name_propagation(
                user,
                CustomNameCommand::Upsert {
                    item_name: "apple".to_string(),
                    custom_name: "fruit-snack".to_string(),
                },
            )
            .await
            .unwrap();
        store
            .commit_custom_name_propagation(
                user,
                CustomNameCommand::DeleteAll {
                    custom_name: "fruit-snack".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(
            store
                .get_custom_names_by_custom(user, "fruit-snack")
                .await
                .unwrap()
                .is_empty()
        );
        let items = store.get_items(user, receipt_id).await.unwrap();
        assert!(items.iter().all(|i| i.custom_name.is_none()));
    }

    #[tokio::test]
    async fn empty_match_set_still_commits() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let outcome = store
            .commit_custom_name_propagation(
                user,
                CustomNameCommand::Delete {
                    item_name: "never-seen".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, PropagationOutcome::default());
    }

    #[tokio::test]
    async fn new_items_inherit_declared_mapping() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        store
            .commit_custom_name_propagation(
                user,
                CustomNameCommand::Upsert {
                    item_name: "apple".to_string(),
                    custom_name: "fruit-snack".to_string(),
                },
            )
            .await
            .unwrap();

        let receipt_id = store.commit_receipt_with_items(&draft(user)).await.unwrap();
        let items = store.get_items(user, receipt_id).await.unwrap();
        let apple = items
            .iter()
            .find(|i| i.item_name.as_deref() == Some("apple"))
            .unwrap();
        assert_eq!(apple.custom_name.as_deref(), Some("fruit-snack"));
    }

    #[tokio::test]
    async fn tenant_isolation_holds_across_operations() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let receipt_id = store.commit_receipt_with_items(&draft(owner)).await.unwrap();
        let items = store.get_items(owner, receipt_id).await.unwrap();
        let item_id = items[0].item_id;

        // Reads scoped to the wrong user see nothing.
        assert!(store.get_receipt(intruder, receipt_id).await.unwrap().is_none());
        assert!(store.get_items(intruder, receipt_id).await.unwrap().is_empty());
        assert!(store.get_item(intruder, receipt_id, item_id).await.unwrap().is_none());

        // Writes scoped to the wrong user fail as not-found...
        assert!(matches!(
            store
                .update_receipt(intruder, receipt_id, Some("Hijack".to_string()), None, None)
                .await,
            Err(LedgerError::NotFound)
        ));
        assert!(matches!(
            store
                .insert_item(intruder, receipt_id, ItemDraft::named("stolen"))
                .await,
            Err(LedgerError::NotFound)
        ));
        assert!(matches!(
            store.delete_item(intruder, receipt_id, item_id).await,
            Err(LedgerError::NotFound)
        ));

        // ...and the delete transaction removes nothing it does not own.
        store.delete_receipt_with_items(intruder, receipt_id).await.unwrap();
        assert!(store.get_receipt(owner, receipt_id).await.unwrap().is_some());
        assert_eq!(store.get_items(owner, receipt_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn item_mutations_echo_the_row_name() {
        let store = SqliteLedgerStore::in_memory().unwrap();
        let user = Uuid::new_v4();
        let receipt_id = store.commit_receipt_with_items(&draft(user)).await.unwrap();

        let echo = store
            .insert_item(
                user,
                receipt_id,
                ItemDraft {
                    item_name: Some("candy".to_string()),
                    custom_name: None,
                    price: Some(Decimal::new(99, 2)),
                },
            )
            .await
            .unwrap();
        assert_eq!(echo.item_name.as_deref(), Some("candy"));

        let items = store.get_items(user, receipt_id).await.unwrap();
        let candy = items
            .iter()
            .find(|i| i.item_name.as_deref() == Some("candy"))
            .unwrap();

        let echo = store
            .update_item(
                user,
                receipt_id,
                candy.item_id,
                ItemDraft {
                    item_name: Some("not-candy".to_string()),
                    custom_name: None,
                    price: candy.price,
                },
            )
            .await
            .unwrap();
        assert_eq!(echo.item_name.as_deref(), Some("not-candy"));

        let echo = store.delete_item(user, receipt_id, candy.item_id).await.unwrap();
        assert_eq!(echo.item_name.as_deref(), Some("not-candy"));
        assert!(
            store
                .get_item(user, receipt_id, candy.item_id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
