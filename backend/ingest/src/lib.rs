pub mod ocr;
pub mod pipeline;
pub mod upload;

pub use ocr::{HttpOcrClient, OcrItem, OcrReceipt, ReceiptOcr};
pub use pipeline::IngestionPipeline;
pub use upload::{BucketClient, ObjectStorage};
