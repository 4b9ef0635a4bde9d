// Database module - SQLite ledger connection, models and queries

pub mod models;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

pub use models::{
    Category, CategoryType, Property, Recurrence, RecurrenceFrequency, Transaction,
    TransactionType, Unit, UnitOccupancy,
};

/// Get the default database path (~/.rentbook/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let rentbook_dir = PathBuf::from(home).join(".rentbook");

    std::fs::create_dir_all(&rentbook_dir).context("Failed to create .rentbook directory")?;

    Ok(rentbook_dir.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    Ok(conn)
}

/// Create tables and indexes on an open connection
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!("schema.sql"))
        .context("Failed to execute schema")
}

/// Initialize the database with schema
///
/// Creates the database file (and parent directory) if needed and runs the
/// schema SQL. Safe to call on an existing ledger.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory {:?}", parent))?;
        }
    }

    info!("Initializing database at: {:?}", path);
    let conn = open_db(Some(path))?;
    apply_schema(&conn)?;
    debug!("Database schema applied");
    Ok(())
}

// ============ Properties ============

pub fn insert_property(conn: &Connection, property: &Property) -> Result<i64> {
    conn.execute(
        "INSERT INTO properties (
            name, address, purchase_price, purchase_date, current_value, valuation_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            property.name,
            property.address,
            property.purchase_price.to_string(),
            property.purchase_date,
            property.current_value.map(|v| v.to_string()),
            property.valuation_date,
        ],
    )
    .context(format!("Failed to insert property '{}'", property.name))?;

    Ok(conn.last_insert_rowid())
}

fn property_from_row(row: &Row) -> rusqlite::Result<Property> {
    Ok(Property {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        address: row.get(2)?,
        purchase_price: get_decimal_value(row, 3)?,
        purchase_date: row.get(4)?,
        current_value: get_optional_decimal_value(row, 5)?,
        valuation_date: row.get(6)?,
    })
}

const PROPERTY_COLUMNS: &str =
    "id, name, address, purchase_price, purchase_date, current_value, valuation_date";

pub fn get_property(conn: &Connection, id: i64) -> Result<Option<Property>> {
    let sql = format!("SELECT {} FROM properties WHERE id = ?1", PROPERTY_COLUMNS);
    let property = conn
        .query_row(&sql, [id], property_from_row)
        .optional()?;
    Ok(property)
}

pub fn get_property_by_name(conn: &Connection, name: &str) -> Result<Option<Property>> {
    let sql = format!(
        "SELECT {} FROM properties WHERE name = ?1 COLLATE NOCASE",
        PROPERTY_COLUMNS
    );
    let property = conn
        .query_row(&sql, [name], property_from_row)
        .optional()?;
    Ok(property)
}

pub fn list_properties(conn: &Connection) -> Result<Vec<Property>> {
    let sql = format!("SELECT {} FROM properties ORDER BY name", PROPERTY_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let properties = stmt
        .query_map([], property_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(properties)
}

/// Resolve a property by numeric id or by name
pub fn resolve_property(conn: &Connection, key: &str) -> Result<Property> {
    let found = match key.trim().parse::<i64>() {
        Ok(id) => get_property(conn, id)?,
        Err(_) => get_property_by_name(conn, key.trim())?,
    };
    found.ok_or_else(|| anyhow!("Property '{}' not found", key))
}

pub fn update_property_valuation(
    conn: &Connection,
    property_id: i64,
    value: Decimal,
    valuation_date: NaiveDate,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE properties SET current_value = ?1, valuation_date = ?2 WHERE id = ?3",
        params![value.to_string(), valuation_date, property_id],
    )?;
    if updated == 0 {
        return Err(anyhow!("Property {} not found", property_id));
    }
    Ok(())
}

// ============ Units ============

pub fn insert_unit(conn: &Connection, unit: &Unit) -> Result<i64> {
    conn.execute(
        "INSERT INTO units (property_id, name, is_occupied) VALUES (?1, ?2, ?3)",
        params![unit.property_id, unit.name, unit.is_occupied],
    )
    .context(format!("Failed to insert unit '{}'", unit.name))?;
    Ok(conn.last_insert_rowid())
}

fn unit_from_row(row: &Row) -> rusqlite::Result<Unit> {
    Ok(Unit {
        id: Some(row.get(0)?),
        property_id: row.get(1)?,
        name: row.get(2)?,
        is_occupied: row.get(3)?,
    })
}

pub fn get_unit(conn: &Connection, id: i64) -> Result<Option<Unit>> {
    let unit = conn
        .query_row(
            "SELECT id, property_id, name, is_occupied FROM units WHERE id = ?1",
            [id],
            unit_from_row,
        )
        .optional()?;
    Ok(unit)
}

pub fn list_units(conn: &Connection, property_id: i64) -> Result<Vec<Unit>> {
    let mut stmt = conn.prepare(
        "SELECT id, property_id, name, is_occupied FROM units
         WHERE property_id = ?1 ORDER BY name",
    )?;
    let units = stmt
        .query_map([property_id], unit_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(units)
}

pub fn set_unit_occupancy(conn: &Connection, unit_id: i64, occupied: bool) -> Result<()> {
    let updated = conn.execute(
        "UPDATE units SET is_occupied = ?1 WHERE id = ?2",
        params![occupied, unit_id],
    )?;
    if updated == 0 {
        return Err(anyhow!("Unit {} not found", unit_id));
    }
    Ok(())
}

pub fn get_unit_occupancy(conn: &Connection, property_id: i64) -> Result<UnitOccupancy> {
    let (total, occupied): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_occupied THEN 1 ELSE 0 END), 0)
         FROM units WHERE property_id = ?1",
        [property_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(UnitOccupancy {
        occupied: u32::try_from(occupied).context("occupied unit count out of range")?,
        total: u32::try_from(total).context("unit count out of range")?,
    })
}

// ============ Categories ============

pub fn insert_category(conn: &Connection, category: &Category) -> Result<i64> {
    conn.execute(
        "INSERT INTO categories (name, category_type, is_tax_deductible, is_financing)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            category.name,
            category.category_type.as_str(),
            category.is_tax_deductible,
            category.is_financing,
        ],
    )
    .context(format!("Failed to insert category '{}'", category.name))?;
    Ok(conn.last_insert_rowid())
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    let type_str: String = row.get(2)?;
    let category_type = type_str.parse::<CategoryType>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(2, type_str.clone(), rusqlite::types::Type::Text)
    })?;
    Ok(Category {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        category_type,
        is_tax_deductible: row.get(3)?,
        is_financing: row.get(4)?,
    })
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category_type, is_tax_deductible, is_financing
         FROM categories ORDER BY category_type, name",
    )?;
    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn get_category_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, name, category_type, is_tax_deductible, is_financing
             FROM categories WHERE name = ?1 COLLATE NOCASE",
            [name.trim()],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

// ============ Transactions ============

/// Insert transaction
pub fn insert_transaction(conn: &Connection, tx: &Transaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions (
            property_id, unit_id, category_id, account_id, transaction_type,
            tx_date, amount, is_tax_deductible, is_paid,
            recurrence_frequency, recurrence_until, notes, source
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            tx.property_id,
            tx.unit_id,
            tx.category_id,
            tx.account_id,
            tx.transaction_type.as_str(),
            tx.date,
            tx.amount.to_string(),
            tx.is_tax_deductible,
            tx.is_paid,
            tx.recurrence.map(|r| r.frequency.as_str()),
            tx.recurrence.and_then(|r| r.until),
            tx.notes,
            tx.source,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Number of stored entries identical to `tx` (property, category, type, date, amount)
pub fn count_matching_transactions(conn: &Connection, tx: &Transaction) -> Result<usize> {
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions
         WHERE property_id = ?1 AND category_id = ?2 AND transaction_type = ?3
           AND tx_date = ?4",
    )?;
    let mut rows = stmt.query(params![
        tx.property_id,
        tx.category_id,
        tx.transaction_type.as_str(),
        tx.date,
    ])?;

    let mut count = 0;
    while let Some(row) = rows.next()? {
        if get_decimal_value(row, 0)? == tx.amount {
            count += 1;
        }
    }
    Ok(count)
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let type_str: String = row.get(5)?;
    let transaction_type = type_str.parse::<TransactionType>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(5, type_str.clone(), rusqlite::types::Type::Text)
    })?;

    let frequency: Option<String> = row.get(10)?;
    let recurrence = frequency
        .and_then(|f| f.parse::<RecurrenceFrequency>().ok())
        .map(|frequency| -> rusqlite::Result<Recurrence> {
            Ok(Recurrence {
                frequency,
                until: row.get(11)?,
            })
        })
        .transpose()?;

    Ok(Transaction {
        id: Some(row.get(0)?),
        property_id: row.get(1)?,
        unit_id: row.get(2)?,
        category_id: row.get(3)?,
        account_id: row.get(4)?,
        transaction_type,
        date: row.get(6)?,
        amount: get_decimal_value(row, 7)?,
        is_tax_deductible: row.get(8)?,
        is_paid: row.get(9)?,
        recurrence,
        notes: row.get(12)?,
        source: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// Get transactions of a property (optionally a single unit) within an
/// inclusive date range, ordered by date
pub fn get_transactions(
    conn: &Connection,
    property_id: i64,
    unit_id: Option<i64>,
    from_date: NaiveDate,
    to_date: NaiveDate,
) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, property_id, unit_id, category_id, account_id, transaction_type,
                tx_date, amount, is_tax_deductible, is_paid,
                recurrence_frequency, recurrence_until, notes, source, created_at
         FROM transactions
         WHERE property_id = ?1
           AND (?2 IS NULL OR unit_id = ?2)
           AND tx_date >= ?3 AND tx_date <= ?4
         ORDER BY tx_date ASC, id ASC",
    )?;

    let transactions = stmt
        .query_map(
            params![property_id, unit_id, from_date, to_date],
            transaction_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load transactions")?;

    debug!(
        "Loaded {} transactions for property {} ({} - {})",
        transactions.len(),
        property_id,
        from_date,
        to_date
    );
    Ok(transactions)
}

/// Helper to read Decimal from SQLite (handles TEXT, INTEGER and REAL affinity)
pub fn get_decimal_value(row: &Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Decimal::from_str(s).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => {
            Decimal::try_from(f).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        _ => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            rusqlite::types::Type::Null,
        )),
    }
}

/// Helper to read optional Decimal from SQLite
pub fn get_optional_decimal_value(
    row: &Row,
    idx: usize,
) -> Result<Option<Decimal>, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        _ => get_decimal_value(row, idx).map(Some),
    }
}
