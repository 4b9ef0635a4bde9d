use anyhow::{Context, Result};
use colored::Colorize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{find_property, print_json, AppContext};
use crate::cli::formatters::{format_comparison, format_tax_report};
use crate::cli::TaxCommands;
use rentbook::tax;
use rentbook::SqliteStore;

pub fn dispatch_tax(action: &TaxCommands, ctx: &AppContext) -> Result<()> {
    match action {
        TaxCommands::Report {
            property,
            year,
            brackets,
            export,
        } => dispatch_tax_report(property, *year, brackets.as_deref(), *export, ctx),
        TaxCommands::Compare {
            property,
            from_year,
            to_year,
            brackets,
        } => dispatch_tax_compare(property, *from_year, *to_year, brackets.as_deref(), ctx),
    }
}

fn dispatch_tax_report(
    key: &str,
    year: i32,
    brackets_file: Option<&Path>,
    export: bool,
    ctx: &AppContext,
) -> Result<()> {
    let brackets = ctx.tax_brackets(brackets_file)?;

    let conn = ctx.open_ledger()?;
    let (_, property_id) = find_property(&conn, key)?;
    let store = SqliteStore::new(&conn);
    let report = tax::tax_report(&store, property_id, year, &brackets)?;

    let exported = if export {
        let path = PathBuf::from(tax::export_file_name(&report));
        let file = File::create(&path).context(format!("Failed to create {:?}", path))?;
        tax::write_tax_report_csv(&report, file)?;
        info!("Exported tax report to {:?}", path);
        Some(path)
    } else {
        None
    };

    if ctx.json {
        return print_json(&serde_json::json!({
            "property_id": report.property_id,
            "property": report.property_name,
            "year": report.year,
            "gross_income": report.income.gross_income,
            "total_expenses": report.income.total_expenses,
            "deductible_expenses": report.income.deductible_expenses,
            "taxable_income": report.income.taxable_income,
            "total_tax": report.liability.total_tax,
            "effective_rate": report.liability.effective_rate,
            "marginal_rate": report.liability.marginal_rate,
            "brackets": report.liability.brackets,
            "deductions_by_category": report.deductions_by_category,
            "exported_to": exported,
        }));
    }

    print!(
        "{}",
        format_tax_report(&report, !brackets.is_empty(), ctx.currency_symbol())
    );
    if let Some(path) = exported {
        println!(
            "\n{} Report exported to: {}\n",
            "✓".green().bold(),
            path.display()
        );
    }
    Ok(())
}

fn dispatch_tax_compare(
    key: &str,
    from_year: i32,
    to_year: i32,
    brackets_file: Option<&Path>,
    ctx: &AppContext,
) -> Result<()> {
    let brackets = ctx.tax_brackets(brackets_file)?;

    let conn = ctx.open_ledger()?;
    let (_, property_id) = find_property(&conn, key)?;
    let store = SqliteStore::new(&conn);
    let comparison = tax::compare_years(&store, property_id, from_year, to_year, &brackets)?;

    if ctx.json {
        return print_json(&comparison);
    }

    print!(
        "{}",
        format_comparison(&comparison, ctx.currency_symbol())
    );
    Ok(())
}
