//! ScanLedger runtime configuration schema, typed for serde YAML
//! deserialization.

use serde::{Deserialize, Serialize};

/// Root configuration for the ScanLedger backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLedgerConfig {
    /// SQLite database path.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// OCR endpoint settings.
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Object-storage bucket settings.
    #[serde(default)]
    pub bucket: BucketConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ScanLedgerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ocr: OcrConfig::default(),
            bucket: BucketConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrConfig {
    /// URL of the OCR endpoint (POST `{"url": ...}`).
    #[serde(default = "default_ocr_endpoint")]
    pub endpoint: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ocr_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketConfig {
    /// Base URL of the storage API, up to and including its version path.
    #[serde(default)]
    pub base_url: String,
    /// Bucket name holding receipt images.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Bearer token for uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            bucket: default_bucket(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for the rolling NDJSON log file.
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

fn default_db_path() -> String {
    "scanledger.db".to_string()
}

fn default_ocr_endpoint() -> String {
    "http://localhost:3000".to_string()
}

fn default_bucket() -> String {
    "receipts".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ScanLedgerConfig {
    /// Overlay environment variables on top of the loaded file, so a
    /// deployment can override any endpoint without editing YAML.
    pub fn apply_env(mut self) -> Self {
        if let Ok(db) = std::env::var("SCANLEDGER_DB") {
            self.db_path = db;
        }
        if let Ok(url) = std::env::var("SCANLEDGER_OCR_URL") {
            self.ocr.endpoint = url;
        }
        if let Ok(url) = std::env::var("SCANLEDGER_BUCKET_URL") {
            self.bucket.base_url = url;
        }
        if let Ok(bucket) = std::env::var("SCANLEDGER_BUCKET") {
            self.bucket.bucket = bucket;
        }
        if let Ok(key) = std::env::var("SCANLEDGER_BUCKET_KEY") {
            self.bucket.api_key = Some(key);
        }
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        self
    }
}
