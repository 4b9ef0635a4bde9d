// Importers module - bulk-load ledger entries from CSV

pub mod csv_import;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::db::{self, Category, Transaction, TransactionType, Unit};
pub use csv_import::{parse_amount, parse_bool, parse_transactions_csv, RawTransaction};

/// Outcome of writing parsed rows into the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub errors: usize,
}

impl RawTransaction {
    /// Build a ledger entry; the deductible flag falls back to the category's
    pub fn to_transaction(
        &self,
        property_id: i64,
        category: &Category,
        unit_id: Option<i64>,
    ) -> Result<Transaction> {
        let category_id = category
            .id
            .ok_or_else(|| anyhow!("Category '{}' has no id", category.name))?;

        category.ensure_accepts(self.transaction_type)?;

        Ok(Transaction {
            id: None,
            property_id,
            unit_id,
            category_id,
            account_id: None,
            transaction_type: self.transaction_type,
            date: self.date,
            amount: self.amount,
            is_tax_deductible: self.deductible.unwrap_or(category.is_tax_deductible),
            is_paid: self.paid,
            recurrence: None,
            notes: self.notes.clone(),
            source: "CSV".to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Resolve category and unit names and insert the rows for one property.
///
/// Rows naming an unknown category or unit are counted as errors and
/// skipped. A row is a duplicate only when it matches an entry stored before
/// this import, so identical rows within one file are all kept. Rows are
/// written in a single SQL transaction.
pub fn import_transactions(
    conn: &mut Connection,
    property_id: i64,
    rows: &[RawTransaction],
) -> Result<ImportStats> {
    let categories: HashMap<String, Category> = db::list_categories(conn)?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c))
        .collect();
    let units: HashMap<String, Unit> = db::list_units(conn, property_id)?
        .into_iter()
        .map(|u| (u.name.to_lowercase(), u))
        .collect();

    let mut stats = ImportStats::default();
    // Stored matches left to absorb, per (category, type, date, amount)
    let mut existing: HashMap<(i64, TransactionType, NaiveDate, Decimal), usize> = HashMap::new();

    let tx = conn.transaction()?;

    for row in rows {
        let Some(category) = categories.get(&row.category.to_lowercase()) else {
            warn!("Row {}: unknown category '{}'", row.line, row.category);
            stats.errors += 1;
            continue;
        };

        let unit_id = match &row.unit {
            Some(name) => match units.get(&name.to_lowercase()) {
                Some(unit) => unit.id,
                None => {
                    warn!("Row {}: unknown unit '{}'", row.line, name);
                    stats.errors += 1;
                    continue;
                }
            },
            None => None,
        };

        let transaction = match row.to_transaction(property_id, category, unit_id) {
            Ok(transaction) => transaction,
            Err(e) => {
                warn!("Row {}: {}", row.line, e);
                stats.errors += 1;
                continue;
            }
        };

        let key = (
            transaction.category_id,
            transaction.transaction_type,
            transaction.date,
            transaction.amount,
        );
        let remaining = match existing.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(db::count_matching_transactions(&tx, &transaction)?),
        };
        if *remaining > 0 {
            *remaining -= 1;
            debug!("Row {}: already in the ledger", row.line);
            stats.skipped_duplicates += 1;
            continue;
        }

        db::insert_transaction(&tx, &transaction)?;
        stats.imported += 1;
    }

    tx.commit()?;

    info!(
        "Import finished: {} imported, {} duplicates, {} errors",
        stats.imported, stats.skipped_duplicates, stats.errors
    );
    Ok(stats)
}
