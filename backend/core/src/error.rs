use thiserror::Error;

/// Top-level error type for the ScanLedger backend.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The gateway or transaction call itself failed (I/O, constraint
    /// violation, malformed row). Always re-raised to the caller.
    #[error("backend error: {0}")]
    Backend(String),

    /// A scoped mutation matched zero rows. Reads encode absence as
    /// `Option::None` / an empty `Vec` instead of this variant.
    #[error("row not found")]
    NotFound,

    /// A required payload field was omitted when building a request.
    #[error("missing field: {0}")]
    PartialInput(&'static str),

    #[error("unknown custom-name command: {0}")]
    UnknownCommand(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("ocr request failed: {0}")]
    Ocr(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LedgerError {
    /// Wrap any backend-level failure, preserving its message.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}
