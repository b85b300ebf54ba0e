pub mod custom_name;
pub mod error;
pub mod types;

pub use custom_name::{CustomNameCommand, CustomNameRequest, PropagationOutcome};
pub use error::LedgerError;
pub use types::{
    CustomNameMapping, Item, ItemDraft, ItemEcho, ItemId, Receipt, ReceiptDraft, ReceiptId,
};
