use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use super::{find_property, print_json, AppContext};
use rentbook::importers::{self, ImportStats};
use rentbook::utils::format_currency_with;

const PREVIEW_ROWS: usize = 10;

pub fn dispatch_import(key: &str, file: &Path, dry_run: bool, ctx: &AppContext) -> Result<()> {
    info!("Importing transactions from: {:?}", file);

    let rows = importers::parse_transactions_csv(file)?;

    let mut conn = ctx.open_ledger()?;
    let (property, property_id) = find_property(&conn, key)?;

    if dry_run {
        if ctx.json {
            return print_json(&serde_json::json!({
                "property_id": property_id,
                "dry_run": true,
                "parsed": rows.len(),
            }));
        }
        print_preview(&rows, ctx.currency_symbol());
        println!("\n{} Dry run - no changes saved", "ℹ".blue().bold());
        return Ok(());
    }

    let stats = importers::import_transactions(&mut conn, property_id, &rows)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "property_id": property_id,
            "dry_run": false,
            "parsed": rows.len(),
            "imported": stats.imported,
            "skipped_duplicates": stats.skipped_duplicates,
            "errors": stats.errors,
        }));
    }

    print_preview(&rows, ctx.currency_symbol());
    print_summary(&property.name, &stats);
    Ok(())
}

fn print_preview(rows: &[importers::RawTransaction], symbol: &str) {
    println!(
        "\n{} Found {} transactions\n",
        "✓".green().bold(),
        rows.len()
    );
    if rows.is_empty() {
        return;
    }

    #[derive(Tabled)]
    struct PreviewRow {
        #[tabled(rename = "Line")]
        line: usize,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Type")]
        tx_type: &'static str,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Amount")]
        amount: String,
    }

    let preview: Vec<PreviewRow> = rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|r| PreviewRow {
            line: r.line,
            date: r.date.to_string(),
            tx_type: r.transaction_type.as_str(),
            category: r.category.clone(),
            unit: r.unit.clone().unwrap_or_default(),
            amount: format_currency_with(r.amount, symbol),
        })
        .collect();

    println!("{}", Table::new(preview).with(Style::rounded()));
    if rows.len() > PREVIEW_ROWS {
        println!("\n... and {} more transactions", rows.len() - PREVIEW_ROWS);
    }
}

fn print_summary(property: &str, stats: &ImportStats) {
    println!("\n{} Import into {} complete", "✓".green().bold(), property.bold());
    println!("  Imported:   {}", stats.imported.to_string().green());
    if stats.skipped_duplicates > 0 {
        println!("  Duplicates: {}", stats.skipped_duplicates.to_string().yellow());
    }
    if stats.errors > 0 {
        println!(
            "  Errors:     {} (see warnings above)",
            stats.errors.to_string().red()
        );
    }
}
