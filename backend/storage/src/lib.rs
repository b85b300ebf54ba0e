pub mod propagation;
pub mod sqlite_store;
pub mod store;

pub use sqlite_store::SqliteLedgerStore;
pub use store::LedgerStore;
