pub mod io;
pub mod schema;

pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{BucketConfig, LoggingConfig, OcrConfig, ScanLedgerConfig};
