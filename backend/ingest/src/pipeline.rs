//! Photo-to-ledger ingestion pipeline.
//!
//! Sequential, no branching state: upload the image, hand its URL to the
//! OCR endpoint, convert the parsed fields into a draft, persist through
//! the repository. Each stage is awaited before the next starts, and the
//! pipeline returns the committed receipt id — a caller navigating away on
//! return can no longer race the persistence write.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use scanledger_core::{LedgerError, ReceiptId};
use scanledger_repository::ReceiptRepository;

use crate::ocr::ReceiptOcr;
use crate::upload::ObjectStorage;

pub struct IngestionPipeline {
    storage: Arc<dyn ObjectStorage>,
    ocr: Arc<dyn ReceiptOcr>,
    repository: ReceiptRepository,
}

impl IngestionPipeline {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        ocr: Arc<dyn ReceiptOcr>,
        repository: ReceiptRepository,
    ) -> Self {
        Self {
            storage,
            ocr,
            repository,
        }
    }

    /// Run the full pipeline for one captured image. Stage failures map to
    /// [`LedgerError::Upload`] / [`LedgerError::Ocr`] / the repository's
    /// own errors; nothing is retried here.
    pub async fn ingest(
        &self,
        user_id: Uuid,
        image: &[u8],
        file_name: &str,
    ) -> Result<ReceiptId, LedgerError> {
        let url = self
            .storage
            .upload(image, user_id, file_name)
            .await
            .map_err(|e| LedgerError::Upload(e.to_string()))?;

        let parsed = self
            .ocr
            .parse(&url)
            .await
            .map_err(|e| LedgerError::Ocr(e.to_string()))?;
        info!(
            %user_id,
            store = parsed.store_name.as_deref().unwrap_or("<unrecognized>"),
            items = parsed.items.len(),
            "OCR returned draft receipt"
        );

        let draft = parsed.into_draft(user_id);
        let receipt_id = self.repository.insert_receipt(&draft).await?;
        info!(%user_id, receipt_id, "Ingestion complete");
        Ok(receipt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{OcrItem, OcrReceipt};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use scanledger_storage::SqliteLedgerStore;
    use std::sync::Mutex;

    struct RecordingStorage {
        uploads: Mutex<Vec<(Uuid, String, usize)>>,
    }

    impl RecordingStorage {
        fn new() -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn upload(&self, data: &[u8], owner: Uuid, file_name: &str) -> Result<String> {
            self.uploads
                .lock()
                .unwrap()
                .push((owner, file_name.to_string(), data.len()));
            Ok(format!("https://bucket.test/{owner}/{file_name}"))
        }
    }

    struct CannedOcr {
        response: OcrReceipt,
    }

    #[async_trait]
    impl ReceiptOcr for CannedOcr {
        async fn parse(&self, _image_url: &str) -> Result<OcrReceipt> {
            Ok(self.response.clone())
        }
    }

    struct FailingOcr;

    #[async_trait]
    impl ReceiptOcr for FailingOcr {
        async fn parse(&self, _image_url: &str) -> Result<OcrReceipt> {
            Err(anyhow!("model unavailable"))
        }
    }

    fn market_response() -> OcrReceipt {
        OcrReceipt {
            store_name: Some("Market".to_string()),
            total: Some(12.50),
            date: Some("2024-01-01".to_string()),
            items: vec![OcrItem {
                item_name: Some("milk".to_string()),
                price: Some(3.50),
            }],
        }
    }

    fn repository() -> ReceiptRepository {
        ReceiptRepository::new(Arc::new(SqliteLedgerStore::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn end_to_end_ingest_persists_before_returning() {
        let repo = repository();
        let storage = Arc::new(RecordingStorage::new());
        let pipeline = IngestionPipeline::new(
            storage.clone(),
            Arc::new(CannedOcr {
                response: market_response(),
            }),
            repo.clone(),
        );

        let user = Uuid::new_v4();
        let receipt_id = pipeline
            .ingest(user, b"jpeg-bytes", "receipt.jpg")
            .await
            .unwrap();

        // The returned id addresses committed rows.
        let receipts = repo.get_receipts(user).await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].receipt_id, receipt_id);
        assert_eq!(receipts[0].store_name.as_deref(), Some("Market"));
        assert_eq!(receipts[0].total, Some(Decimal::new(1250, 2)));
        assert_eq!(receipts[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));

        let items = repo.get_items(user, receipt_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_name.as_deref(), Some("milk"));
        assert_eq!(items[0].price, Some(Decimal::new(350, 2)));

        let uploads = storage.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, user);
    }

    #[tokio::test]
    async fn partial_ocr_output_still_persists() {
        let pipeline = IngestionPipeline::new(
            Arc::new(RecordingStorage::new()),
            Arc::new(CannedOcr {
                response: OcrReceipt {
                    store_name: None,
                    total: None,
                    date: Some("garbled".to_string()),
                    items: vec![OcrItem {
                        item_name: Some("bread".to_string()),
                        price: None,
                    }],
                },
            }),
            repository(),
        );

        let user = Uuid::new_v4();
        let receipt_id = pipeline.ingest(user, b"img", "r.jpg").await.unwrap();
        assert!(receipt_id > 0);
    }

    #[tokio::test]
    async fn ocr_failure_surfaces_as_ocr_error() {
        let pipeline = IngestionPipeline::new(
            Arc::new(RecordingStorage::new()),
            Arc::new(FailingOcr),
            repository(),
        );
        let err = pipeline
            .ingest(Uuid::new_v4(), b"img", "r.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Ocr(_)));
    }
}
