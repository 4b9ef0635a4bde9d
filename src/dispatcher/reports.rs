use anyhow::Result;
use colored::Colorize;

use super::{find_property, print_json, AppContext};
use crate::cli::formatters::{
    format_category_table, format_monthly_table, format_no_transactions, format_performance,
};
use crate::cli::ReportCommands;
use rentbook::reports::{self, parse_period};
use rentbook::SqliteStore;

pub fn dispatch_report(action: &ReportCommands, ctx: &AppContext) -> Result<()> {
    match action {
        ReportCommands::Monthly {
            property,
            period,
            unit,
        } => dispatch_monthly(property, period, *unit, ctx),
        ReportCommands::Categories {
            property,
            period,
            unit,
        } => dispatch_categories(property, period, *unit, ctx),
        ReportCommands::Performance { property, year } => dispatch_performance(property, *year, ctx),
    }
}

fn dispatch_monthly(key: &str, period: &str, unit: Option<i64>, ctx: &AppContext) -> Result<()> {
    let range = parse_period(period)?;

    let conn = ctx.open_ledger()?;
    let (_, property_id) = find_property(&conn, key)?;
    let store = SqliteStore::new(&conn);
    let report = reports::financial_report(&store, property_id, range, unit)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "property_id": report.property_id,
            "property": report.property_name,
            "unit_id": report.unit_id,
            "from_date": report.range.from,
            "to_date": report.range.to,
            "months": report.months,
            "totals": report.totals,
        }));
    }

    if report.categories.is_empty() {
        println!("{}", format_no_transactions(&report.property_name));
    }
    print!("{}", format_monthly_table(&report, ctx.currency_symbol()));
    Ok(())
}

fn dispatch_categories(key: &str, period: &str, unit: Option<i64>, ctx: &AppContext) -> Result<()> {
    let range = parse_period(period)?;

    let conn = ctx.open_ledger()?;
    let (_, property_id) = find_property(&conn, key)?;
    let store = SqliteStore::new(&conn);
    let report = reports::financial_report(&store, property_id, range, unit)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "property_id": report.property_id,
            "property": report.property_name,
            "unit_id": report.unit_id,
            "from_date": report.range.from,
            "to_date": report.range.to,
            "categories": report.categories,
        }));
    }

    if report.categories.is_empty() {
        println!("{}", format_no_transactions(&report.property_name));
        return Ok(());
    }

    println!(
        "\n{} {} - Categories ({} - {})\n",
        "🗂".cyan().bold(),
        report.property_name.bold(),
        report.range.from,
        report.range.to
    );
    println!(
        "{}\n",
        format_category_table(&report.categories, ctx.currency_symbol())
    );
    Ok(())
}

fn dispatch_performance(key: &str, year: Option<i32>, ctx: &AppContext) -> Result<()> {
    let conn = ctx.open_ledger()?;
    let (_, property_id) = find_property(&conn, key)?;
    let store = SqliteStore::new(&conn);
    let report = reports::performance_report(&store, property_id, year)?;

    if ctx.json {
        return print_json(&report);
    }

    print!("{}", format_performance(&report, ctx.currency_symbol()));
    Ok(())
}
