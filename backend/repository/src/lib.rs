pub mod repository;

pub use repository::ReceiptRepository;
