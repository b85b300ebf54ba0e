use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use scanledger_config::{config_dir, config_file_path, load_config, ScanLedgerConfig};
use scanledger_ingest::{BucketClient, HttpOcrClient, IngestionPipeline};
use scanledger_repository::ReceiptRepository;
use scanledger_storage::SqliteLedgerStore;

#[derive(Parser)]
#[command(name = "scanledger")]
#[command(about = "ScanLedger — receipt capture and custom-name ledger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a receipt image, run OCR, and persist the parsed receipt
    Ingest {
        #[arg(short, long)]
        user: Uuid,
        /// Path to the captured image
        image: PathBuf,
    },
    /// List all receipts for a user
    Receipts {
        #[arg(short, long)]
        user: Uuid,
    },
    /// Show one receipt and its items
    Receipt {
        #[arg(short, long)]
        user: Uuid,
        receipt_id: i64,
    },
    /// Delete a receipt together with all of its items
    DeleteReceipt {
        #[arg(short, long)]
        user: Uuid,
        receipt_id: i64,
    },
    /// Manage custom item names
    Custom {
        #[command(subcommand)]
        command: CustomCommands,
    },
}

#[derive(Subcommand)]
enum CustomCommands {
    /// Set a custom name for an item, rewriting its history
    Upsert {
        #[arg(short, long)]
        user: Uuid,
        item_name: String,
        custom_name: String,
    },
    /// Rename a custom label everywhere it is used
    Rename {
        #[arg(short, long)]
        user: Uuid,
        old_custom_name: String,
        new_custom_name: String,
    },
    /// Remove the custom name for one item
    Delete {
        #[arg(short, long)]
        user: Uuid,
        item_name: String,
    },
    /// Remove a custom label from every item that carries it
    DeleteAll {
        #[arg(short, long)]
        user: Uuid,
        custom_name: String,
    },
    /// List every custom name the user has set
    List {
        #[arg(short, long)]
        user: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config(&config_file_path(&config_dir()))
        .await?
        .apply_env();
    logging::init_logger(&config.logging.dir, &config.logging.level);

    let cli = Cli::parse();

    let store = Arc::new(SqliteLedgerStore::open(&config.db_path)?);
    let repository = ReceiptRepository::new(store);

    match cli.command {
        Commands::Ingest { user, image } => {
            let pipeline = build_pipeline(&config, repository);
            let bytes = tokio::fs::read(&image).await?;
            let file_name = image
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("receipt.jpg");
            let receipt_id = pipeline.ingest(user, &bytes, file_name).await?;
            println!("Ingested receipt {receipt_id}");
        }
        Commands::Receipts { user } => {
            let receipts = repository.get_receipts(user).await?;
            if receipts.is_empty() {
                println!("No receipts for user {user}");
            }
            for r in receipts {
                println!(
                    "{}\t{}\t{}\t{}",
                    r.receipt_id,
                    r.store_name.as_deref().unwrap_or("-"),
                    r.total.map_or_else(|| "-".to_string(), |t| t.to_string()),
                    r.date.map_or_else(|| "-".to_string(), |d| d.to_string()),
                );
            }
        }
        Commands::Receipt { user, receipt_id } => match repository.get_receipt(user, receipt_id).await? {
            Some(r) => {
                println!(
                    "receipt {}: store={} total={} date={}",
                    r.receipt_id,
                    r.store_name.as_deref().unwrap_or("-"),
                    r.total.map_or_else(|| "-".to_string(), |t| t.to_string()),
                    r.date.map_or_else(|| "-".to_string(), |d| d.to_string()),
                );
                for item in repository.get_items(user, receipt_id).await? {
                    println!(
                        "  {}\t{}\t{}\t{}",
                        item.item_id,
                        item.item_name.as_deref().unwrap_or("-"),
                        item.custom_name.as_deref().unwrap_or("-"),
                        item.price.map_or_else(|| "-".to_string(), |p| p.to_string()),
                    );
                }
            }
            None => println!("Receipt {receipt_id} not found"),
        },
        Commands::DeleteReceipt { user, receipt_id } => {
            repository.delete_receipt(user, receipt_id).await?;
            println!("Deleted receipt {receipt_id}");
        }
        Commands::Custom { command } => run_custom(&repository, command).await?,
    }

    Ok(())
}

async fn run_custom(repository: &ReceiptRepository, command: CustomCommands) -> Result<()> {
    match command {
        CustomCommands::Upsert {
            user,
            item_name,
            custom_name,
        } => {
            let outcome = repository
                .upsert_custom_item(user, &item_name, &custom_name)
                .await?;
            println!(
                "{item_name} -> {custom_name} ({} items rewritten)",
                outcome.items_touched
            );
        }
        CustomCommands::Rename {
            user,
            old_custom_name,
            new_custom_name,
        } => {
            let outcome = repository
                .upsert_custom_all(user, &old_custom_name, &new_custom_name)
                .await?;
            println!(
                "{old_custom_name} -> {new_custom_name} ({} mappings, {} items)",
                outcome.mappings_touched, outcome.items_touched
            );
        }
        CustomCommands::Delete { user, item_name } => {
            let outcome = repository.delete_custom_item(user, &item_name).await?;
            println!(
                "Removed custom name for {item_name} ({} items cleared)",
                outcome.items_touched
            );
        }
        CustomCommands::DeleteAll { user, custom_name } => {
            let outcome = repository.delete_custom_all(user, &custom_name).await?;
            println!(
                "Removed {custom_name} everywhere ({} mappings, {} items)",
                outcome.mappings_touched, outcome.items_touched
            );
        }
        CustomCommands::List { user } => {
            for mapping in repository.get_custom_items_user(user).await? {
                println!("{}\t{}", mapping.item_name, mapping.custom_name);
            }
        }
    }
    Ok(())
}

fn build_pipeline(config: &ScanLedgerConfig, repository: ReceiptRepository) -> IngestionPipeline {
    info!(
        ocr = %config.ocr.endpoint,
        bucket = %config.bucket.bucket,
        "Wiring ingestion pipeline"
    );
    let storage = Arc::new(BucketClient::new(
        config.bucket.base_url.as_str(),
        config.bucket.bucket.as_str(),
        config.bucket.api_key.clone().unwrap_or_default(),
    ));
    let ocr = Arc::new(HttpOcrClient::new(config.ocr.endpoint.as_str()));
    IngestionPipeline::new(storage, ocr, repository)
}
