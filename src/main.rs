//! CLI entry point.
//!
//! Each subcommand prints exactly one JSON object to stdout. Operational
//! failures never panic; they are reported as `{"ok":false,"error":…}`
//! with a non-zero exit code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::Arc;

use notion_textfill::application::FillService;
use notion_textfill::domain::BatchOptions;
use notion_textfill::infrastructure::config::AppConfig;
use notion_textfill::infrastructure::logging::init_logging;
use notion_textfill::infrastructure::notion::NotionClient;
use notion_textfill::infrastructure::supabase::SupabaseClient;

#[derive(Parser)]
#[command(name = "notion-textfill", version, about = "Fills Notion text properties from Supabase")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill a single page by id (for per-row, on-demand triggering)
    FillOne {
        /// Notion page id
        page_id: String,
    },
    /// Fill every page selected by the reload-or-empty predicate
    FillBatch {
        /// Database to process; defaults to NOTION_DB_ID
        #[arg(long)]
        database_id: Option<String>,
        /// List the selected page ids without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Only fill pages whose text property is currently empty
        #[arg(long)]
        hard_empty_only: bool,
    },
    /// Liveness check
    Health,
}

fn build_service(config: AppConfig) -> Result<FillService> {
    let config = Arc::new(config);
    let documents = NotionClient::new(&config).context("failed to build Notion client")?;
    let source = SupabaseClient::new(&config).context("failed to build Supabase client")?;
    Ok(FillService::new(config, Arc::new(documents), Arc::new(source)))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // Configuration errors are fatal before any command runs, the
    // liveness check included.
    let config = AppConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Health => print_json(&json!({ "ok": true })),
        Command::FillOne { page_id } => {
            let service = build_service(config)?;
            match service.fill_one(&page_id).await {
                Ok(outcome) => print_json(&serde_json::to_value(&outcome)?),
                Err(e) => {
                    print_json(&json!({ "ok": false, "error": e.to_string(), "page_id": page_id }));
                    std::process::exit(1);
                }
            }
        }
        Command::FillBatch {
            database_id,
            dry_run,
            hard_empty_only,
        } => {
            let database_id = database_id.unwrap_or_else(|| config.notion_db_id.clone());
            let service = build_service(config)?;
            let options = BatchOptions {
                dry_run,
                hard_empty_only,
            };
            match service.fill_batch(&database_id, options).await {
                Ok(report) => print_json(&serde_json::to_value(&report)?),
                Err(e) => {
                    print_json(
                        &json!({ "ok": false, "error": e.to_string(), "database_id": database_id }),
                    );
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
