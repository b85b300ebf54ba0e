//! Custom-name propagation engine.
//!
//! Resolves a [`CustomNameCommand`] into its match set and rewrites the
//! `item_custom_name` mapping table together with the denormalized
//! `custom_name` column on every matching `item` row. Runs inside the
//! transaction opened by the caller, so mapping and items can never be
//! observed out of step.

use rusqlite::{Transaction, params};
use tracing::debug;

use scanledger_core::{CustomNameCommand, PropagationOutcome};

/// Apply one command for one user within an open transaction.
///
/// Per-item commands match on `item_name`; the `_all` variants match on
/// the custom label itself. Both sides of the match are always filtered by
/// `user_id`. An empty match set is not an error: the transaction still
/// commits having touched zero rows.
pub fn apply(
    tx: &Transaction<'_>,
    user_id: &str,
    command: &CustomNameCommand,
) -> rusqlite::Result<PropagationOutcome> {
    let outcome = match command {
        CustomNameCommand::Upsert {
            item_name,
            custom_name,
        } => {
            let mappings = tx.execute(
                "INSERT INTO item_custom_name (user_id, item_name, custom_name)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, item_name) DO UPDATE SET custom_name = excluded.custom_name",
                params![user_id, item_name, custom_name],
            )?;
            let items = tx.execute(
                "UPDATE item SET custom_name = ?3 WHERE user_id = ?1 AND item_name = ?2",
                params![user_id, item_name, custom_name],
            )?;
            PropagationOutcome {
                mappings_touched: mappings,
                items_touched: items,
            }
        }
        CustomNameCommand::UpsertAll {
            old_custom_name,
            new_custom_name,
        } => {
            let mappings = tx.execute(
                "UPDATE item_custom_name SET custom_name = ?3
                 WHERE user_id = ?1 AND custom_name = ?2",
                params![user_id, old_custom_name, new_custom_name],
            )?;
            let items = tx.execute(
                "UPDATE item SET custom_name = ?3 WHERE user_id = ?1 AND custom_name = ?2",
                params![user_id, old_custom_name, new_custom_name],
            )?;
            PropagationOutcome {
                mappings_touched: mappings,
                items_touched: items,
            }
        }
        CustomNameCommand::Delete { item_name } => {
            let mappings = tx.execute(
                "DELETE FROM item_custom_name WHERE user_id = ?1 AND item_name = ?2",
                params![user_id, item_name],
            )?;
            let items = tx.execute(
                "UPDATE item SET custom_name = NULL WHERE user_id = ?1 AND item_name = ?2",
                params![user_id, item_name],
            )?;
            PropagationOutcome {
                mappings_touched: mappings,
                items_touched: items,
            }
        }
        CustomNameCommand::DeleteAll { custom_name } => {
            let mappings = tx.execute(
                "DELETE FROM item_custom_name WHERE user_id = ?1 AND custom_name = ?2",
                params![user_id, custom_name],
            )?;
            let items = tx.execute(
                "UPDATE item SET custom_name = NULL WHERE user_id = ?1 AND custom_name = ?2",
                params![user_id, custom_name],
            )?;
            PropagationOutcome {
                mappings_touched: mappings,
                items_touched: items,
            }
        }
    };

    debug!(
        command = command.verb(),
        mappings = outcome.mappings_touched,
        items = outcome.items_touched,
        "Propagated custom-name change"
    );
    Ok(outcome)
}
