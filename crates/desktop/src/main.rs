//! Headless entry point.
//!
//! Opens (or creates) the inventory database and runs one command. With no
//! command it prints a summary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stockroom_core::ItemId;
use stockroom_desktop::export::default_report_file_name;
use stockroom_desktop::{InventoryStore, ItemQuery, ReportExporter, StoreConfig};

#[derive(Debug, Parser)]
#[command(name = "stockroom-desktop")]
#[command(about = "Inventory tracker with an audit trail and spreadsheet reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Item, low-stock and audit entry counts
    Summary,

    /// Print items as JSON lines, ordered by id
    List {
        /// Case-insensitive substring of the item name
        filter: Option<String>,
    },

    /// Print one item in "copy details" form
    Show {
        /// Item id
        id: ItemId,
    },

    /// Print the audit log as JSON lines, newest first
    Audit,

    /// Write the two-sheet spreadsheet report
    Export {
        /// Output file (default: inventory_audit_report_YYYY_MM_DD.xlsx)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    stockroom_observability::init();

    let config = StoreConfig::from_env();
    // Startup is fatal without a working store.
    let store = InventoryStore::open(&config)
        .await
        .context("failed to open inventory database")?;

    match cli.command.unwrap_or(Command::Summary) {
        Command::Summary => {
            let items = store.count().await?;
            let entries = store.audit().count().await?;
            let low_stock = store
                .query(&ItemQuery::new().low_stock_only().page_size(u32::MAX))
                .await?
                .len();
            println!("items: {items}\nlow stock: {low_stock}\naudit entries: {entries}");
        }
        Command::List { filter } => {
            let mut query = ItemQuery::new();
            if let Some(filter) = filter {
                query = query.filter(filter);
            }
            loop {
                let page = store.query(&query).await?;
                if page.is_empty() {
                    break;
                }
                for record in &page {
                    println!("{}", serde_json::to_string(record)?);
                }
                query = query.clone().page(query.page + 1);
            }
        }
        Command::Show { id } => {
            let record = store
                .get(id)
                .await?
                .with_context(|| format!("inventory item {id} not found"))?;
            println!("{}", record.details_text());
        }
        Command::Audit => {
            for entry in store.audit().list_all().await? {
                println!("{}", serde_json::to_string(&entry)?);
            }
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| {
                PathBuf::from(default_report_file_name(chrono::Local::now().date_naive()))
            });
            let summary = ReportExporter::new(store)
                .spawn(path)
                .await
                .context("export worker panicked")??;
            println!(
                "wrote {} ({} inventory rows, {} audit rows)",
                summary.path.display(),
                summary.inventory_rows,
                summary.audit_rows
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Option<Command>, clap::Error> {
        Cli::try_parse_from(std::iter::once("stockroom-desktop").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_means_summary() {
        assert_eq!(parse(&[]).unwrap(), None);
        assert_eq!(parse(&["summary"]).unwrap(), Some(Command::Summary));
    }

    #[test]
    fn list_and_export_take_optional_positionals() {
        assert_eq!(parse(&["list"]).unwrap(), Some(Command::List { filter: None }));
        assert_eq!(
            parse(&["list", "widget"]).unwrap(),
            Some(Command::List {
                filter: Some("widget".to_string())
            })
        );
        assert_eq!(
            parse(&["export", "a.xlsx"]).unwrap(),
            Some(Command::Export {
                path: Some(PathBuf::from("a.xlsx"))
            })
        );
    }

    #[test]
    fn show_parses_positive_ids_only() {
        assert_eq!(parse(&["show", "7"]).unwrap(), Some(Command::Show { id: ItemId::new(7) }));
        assert!(parse(&["show", "0"]).is_err());
        assert!(parse(&["show", "abc"]).is_err());
    }

    #[test]
    fn extra_and_unknown_arguments_are_rejected() {
        assert!(parse(&["export", "a.xlsx", "extra"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
    }

    #[test]
    fn help_is_generated() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
