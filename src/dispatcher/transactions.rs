use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use colored::Colorize;
use std::collections::HashMap;
use std::str::FromStr;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};
use tracing::info;

use super::ledger::parse_money;
use super::{find_property, print_json, AppContext};
use crate::cli::formatters::format_no_transactions;
use crate::cli::TransactionCommands;
use rentbook::db::{self, Recurrence, RecurrenceFrequency, Transaction, TransactionType};
use rentbook::reports::period::parse_date;
use rentbook::reports::{parse_period, DateRange};
use rentbook::utils::format_currency_with;

pub fn dispatch_transactions(action: &TransactionCommands, ctx: &AppContext) -> Result<()> {
    match action {
        TransactionCommands::Add {
            property,
            transaction_type,
            category,
            amount,
            date,
            unit,
            deductible,
            not_deductible,
            unpaid,
            recurrence,
            until,
            notes,
        } => {
            let deductible = match (*deductible, *not_deductible) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let entry = NewTransaction {
                property,
                transaction_type,
                category,
                amount,
                date,
                unit: *unit,
                deductible,
                paid: !*unpaid,
                recurrence: recurrence.as_deref(),
                until: until.as_deref(),
                notes: notes.as_deref(),
            };
            dispatch_transaction_add(&entry, ctx)
        }
        TransactionCommands::List {
            property,
            period,
            unit,
        } => dispatch_transactions_list(property, period.as_deref(), *unit, ctx),
    }
}

/// Raw `transactions add` arguments
struct NewTransaction<'a> {
    property: &'a str,
    transaction_type: &'a str,
    category: &'a str,
    amount: &'a str,
    date: &'a str,
    unit: Option<i64>,
    /// None = inherit from the category
    deductible: Option<bool>,
    paid: bool,
    recurrence: Option<&'a str>,
    until: Option<&'a str>,
    notes: Option<&'a str>,
}

fn parse_recurrence(frequency: Option<&str>, until: Option<&str>, start: NaiveDate) -> Result<Option<Recurrence>> {
    let Some(frequency) = frequency else {
        return Ok(None);
    };
    let frequency = RecurrenceFrequency::from_str(frequency)
        .map_err(|_| anyhow!("Recurrence must be 'monthly', 'quarterly' or 'yearly'"))?;
    let until = until.map(parse_date).transpose()?;
    if let Some(end) = until {
        if end < start {
            return Err(anyhow!("Recurrence end {} is before the transaction date {}", end, start));
        }
    }
    Ok(Some(Recurrence { frequency, until }))
}

fn dispatch_transaction_add(entry: &NewTransaction, ctx: &AppContext) -> Result<()> {
    let tx_type = TransactionType::from_str(entry.transaction_type).map_err(|_| {
        anyhow!("Transaction type must be 'income', 'expense', 'investment' or 'transfer'")
    })?;
    let amount = parse_money(entry.amount, "amount")?;
    let date = parse_date(entry.date)?;
    let recurrence = parse_recurrence(entry.recurrence, entry.until, date)?;

    let conn = ctx.open_ledger()?;
    let (property, property_id) = find_property(&conn, entry.property)?;
    info!("Adding {} transaction for {}", tx_type.as_str(), property.name);

    let category = db::get_category_by_name(&conn, entry.category)?.ok_or_else(|| {
        anyhow!(
            "Category '{}' not found. Create it with: rentbook category add",
            entry.category
        )
    })?;
    let category_id = category
        .id
        .ok_or_else(|| anyhow!("Category '{}' has no id", category.name))?;

    category.ensure_accepts(tx_type)?;

    if let Some(unit_id) = entry.unit {
        match db::get_unit(&conn, unit_id)? {
            Some(unit) if unit.property_id == property_id => {}
            _ => return Err(anyhow!("Unit {} does not belong to {}", unit_id, property.name)),
        }
    }

    let transaction = Transaction {
        id: None,
        property_id,
        unit_id: entry.unit,
        category_id,
        account_id: None,
        transaction_type: tx_type,
        date,
        amount,
        is_tax_deductible: entry.deductible.unwrap_or(category.is_tax_deductible),
        is_paid: entry.paid,
        recurrence,
        notes: entry.notes.map(|s| s.to_string()),
        source: "MANUAL".to_string(),
        created_at: chrono::Utc::now(),
    };

    let tx_id = db::insert_transaction(&conn, &transaction)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "id": tx_id,
            "property_id": property_id,
            "type": tx_type.as_str(),
            "category": category.name,
            "date": date,
            "amount": amount,
            "is_tax_deductible": transaction.is_tax_deductible,
        }));
    }

    println!(
        "\n{} Transaction added (id {})\n",
        "✓".green().bold(),
        tx_id
    );
    println!("  Property:   {}", property.name.bold());
    println!("  Type:       {}", tx_type.as_str());
    println!("  Category:   {}", category.name);
    println!("  Date:       {}", date);
    println!(
        "  Amount:     {}",
        format_currency_with(amount, ctx.currency_symbol())
    );
    if transaction.is_tax_deductible {
        println!("  Deductible: yes");
    }
    if let Some(r) = transaction.recurrence {
        match r.until {
            Some(until) => println!("  Recurs:     {} until {}", r.frequency.as_str(), until),
            None => println!("  Recurs:     {}", r.frequency.as_str()),
        }
    }
    println!();
    Ok(())
}

fn all_time() -> Result<DateRange> {
    let from = NaiveDate::from_ymd_opt(1900, 1, 1).ok_or_else(|| anyhow!("invalid date"))?;
    let to = NaiveDate::from_ymd_opt(2100, 12, 31).ok_or_else(|| anyhow!("invalid date"))?;
    Ok(DateRange::new(from, to)?)
}

fn dispatch_transactions_list(
    key: &str,
    period: Option<&str>,
    unit: Option<i64>,
    ctx: &AppContext,
) -> Result<()> {
    let range = match period {
        Some(p) => parse_period(p)?,
        None => all_time()?,
    };

    let conn = ctx.open_ledger()?;
    let (property, property_id) = find_property(&conn, key)?;
    let transactions = db::get_transactions(&conn, property_id, unit, range.from, range.to)?;

    if ctx.json {
        return print_json(&transactions);
    }
    if transactions.is_empty() {
        println!("{}", format_no_transactions(&property.name));
        return Ok(());
    }

    let category_names: HashMap<i64, String> = db::list_categories(&conn)?
        .into_iter()
        .filter_map(|c| c.id.map(|id| (id, c.name)))
        .collect();

    #[derive(Tabled)]
    struct TransactionRow {
        #[tabled(rename = "ID")]
        id: i64,
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
        #[tabled(rename = "Flags")]
        flags: String,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let symbol = ctx.currency_symbol();
    let rows: Vec<TransactionRow> = transactions
        .iter()
        .map(|t| {
            let mut flags = Vec::new();
            if t.is_tax_deductible {
                flags.push("deductible".to_string());
            }
            if !t.is_paid {
                flags.push("unpaid".to_string());
            }
            if let Some(r) = t.recurrence {
                flags.push(r.frequency.as_str().to_lowercase());
            }
            TransactionRow {
                id: t.id.unwrap_or_default(),
                date: t.date.to_string(),
                tx_type: t.transaction_type.as_str(),
                category: category_names
                    .get(&t.category_id)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", t.category_id)),
                unit: t.unit_id.map(|u| u.to_string()).unwrap_or_default(),
                amount: format_currency_with(t.amount, symbol),
                flags: flags.join(", "),
                notes: t.notes.clone().unwrap_or_default(),
            }
        })
        .collect();

    println!(
        "\n{} {} - {} transactions\n",
        "📒".cyan().bold(),
        property.name.bold(),
        rows.len()
    );
    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(5..6), Alignment::right());
    println!("{}\n", table);
    Ok(())
}
