use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::db::TransactionType;

/// Transaction row as read from the file, before names are resolved to ids
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    pub line: usize,
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub category: String,
    pub amount: Decimal,
    pub unit: Option<String>,
    /// None = inherit from the category
    pub deductible: Option<bool>,
    pub paid: bool,
    pub notes: Option<String>,
}

#[derive(Debug)]
struct CsvColumnMapping {
    date: usize,
    transaction_type: usize,
    category: usize,
    amount: usize,
    unit: Option<usize>,
    deductible: Option<usize>,
    paid: Option<usize>,
    notes: Option<usize>,
}

/// Parse a ledger CSV file (comma or semicolon separated)
pub fn parse_transactions_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<RawTransaction>> {
    let path = file_path.as_ref();
    info!("Parsing transactions CSV: {:?}", path);

    let content = std::fs::read_to_string(path).context("Failed to open CSV file")?;
    parse_transactions_reader(content.as_bytes(), detect_delimiter(&content))
}

fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

pub fn parse_transactions_reader<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawTransaction>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("CSV headers: {:?}", headers);

    let mapping = find_columns(&headers)?;
    debug!("Column mapping: {:?}", mapping);

    // Semicolon files come from locales that write 1.234,56
    let decimal_comma = delimiter == b';';

    let mut transactions = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.context("Failed to read CSV record")?;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        match parse_row(&record, &mapping, line, decimal_comma) {
            Ok(tx) => transactions.push(tx),
            Err(e) => warn!("Skipping row {}: {}", line, e),
        }
    }

    info!("Parsed {} transactions from CSV", transactions.len());
    Ok(transactions)
}

fn find_columns(headers: &StringRecord) -> Result<CsvColumnMapping> {
    let mut date = None;
    let mut tx_type = None;
    let mut category = None;
    let mut amount = None;
    let mut unit = None;
    let mut deductible = None;
    let mut paid = None;
    let mut notes = None;

    for (idx, header) in headers.iter().enumerate() {
        let text = header.to_lowercase();

        if text.contains("date") {
            date.get_or_insert(idx);
        } else if text == "type" || text.contains("kind") {
            tx_type.get_or_insert(idx);
        } else if text.contains("category") {
            category.get_or_insert(idx);
        } else if text.contains("amount") || text.contains("value") {
            amount.get_or_insert(idx);
        } else if text.contains("unit") {
            unit.get_or_insert(idx);
        } else if text.contains("deductible") {
            deductible.get_or_insert(idx);
        } else if text.contains("paid") {
            paid.get_or_insert(idx);
        } else if text.contains("note") || text.contains("description") || text.contains("memo") {
            notes.get_or_insert(idx);
        }
    }

    Ok(CsvColumnMapping {
        date: date.ok_or_else(|| anyhow!("Missing 'date' column"))?,
        transaction_type: tx_type.ok_or_else(|| anyhow!("Missing 'type' column"))?,
        category: category.ok_or_else(|| anyhow!("Missing 'category' column"))?,
        amount: amount.ok_or_else(|| anyhow!("Missing 'amount' column"))?,
        unit,
        deductible,
        paid,
        notes,
    })
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str> {
    record
        .get(idx)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("missing {}", name))
}

fn optional_field(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "x" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Accepts plain decimals plus a leading currency symbol and digit grouping.
///
/// A comma is the decimal separator when it comes after the last `.`, when
/// it is followed by one or two digits, or whenever `decimal_comma` is set
/// (semicolon files). Otherwise commas are thousands separators.
pub fn parse_amount(value: &str, decimal_comma: bool) -> Result<Decimal> {
    let digits: String = value
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '-' && c != '.' && c != ',')
        .chars()
        .filter(|c| *c != ' ')
        .collect();

    let comma_is_decimal = match (digits.rfind(','), digits.rfind('.')) {
        (Some(comma), Some(dot)) => comma > dot,
        (Some(comma), None) => decimal_comma || (1..=2).contains(&(digits.len() - comma - 1)),
        (None, _) => false,
    };
    let cleaned = if comma_is_decimal {
        digits.replace('.', "").replace(',', ".")
    } else {
        digits.replace(',', "")
    };

    let amount = Decimal::from_str(&cleaned).map_err(|_| anyhow!("invalid amount '{}'", value))?;
    if amount < Decimal::ZERO {
        return Err(anyhow!("amount must not be negative ({})", value));
    }
    Ok(amount)
}

fn parse_row(
    record: &StringRecord,
    mapping: &CsvColumnMapping,
    line: usize,
    decimal_comma: bool,
) -> Result<RawTransaction> {
    let date_str = field(record, mapping.date, "date")?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_str, "%m/%d/%Y"))
        .map_err(|_| anyhow!("invalid date '{}'", date_str))?;

    let type_str = field(record, mapping.transaction_type, "type")?;
    let transaction_type = TransactionType::from_str(type_str)
        .map_err(|_| anyhow!("unknown transaction type '{}'", type_str))?;

    let category = field(record, mapping.category, "category")?.to_string();
    let amount = parse_amount(field(record, mapping.amount, "amount")?, decimal_comma)?;

    let deductible = match optional_field(record, mapping.deductible) {
        Some(v) => Some(parse_bool(&v).ok_or_else(|| anyhow!("invalid deductible flag '{}'", v))?),
        None => None,
    };
    let paid = match optional_field(record, mapping.paid) {
        Some(v) => parse_bool(&v).ok_or_else(|| anyhow!("invalid paid flag '{}'", v))?,
        None => true,
    };

    Ok(RawTransaction {
        line,
        date,
        transaction_type,
        category,
        amount,
        unit: optional_field(record, mapping.unit),
        deductible,
        paid,
        notes: optional_field(record, mapping.notes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_minimal_columns() {
        let csv = "Date,Type,Category,Amount\n\
                   2024-01-01,income,Rent,\"$1,250.00\"\n\
                   2024-01-15,expense,Repairs,400\n";
        let rows = parse_transactions_reader(csv.as_bytes(), b',').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].transaction_type, TransactionType::Income);
        assert_eq!(rows[0].amount, dec!(1250.00));
        assert_eq!(rows[0].line, 2);
        assert!(rows[0].paid);
        assert_eq!(rows[0].deductible, None);
        assert_eq!(rows[1].category, "Repairs");
    }

    #[test]
    fn test_parse_optional_columns_and_semicolons() {
        let csv = "date;type;category;amount;unit;tax deductible;paid;notes\n\
                   03/05/2024;EXPENSE;Insurance;900.10;1A;yes;no;annual premium\n";
        let rows = parse_transactions_reader(csv.as_bytes(), b';').unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(row.unit.as_deref(), Some("1A"));
        assert_eq!(row.deductible, Some(true));
        assert!(!row.paid);
        assert_eq!(row.notes.as_deref(), Some("annual premium"));
    }

    #[test]
    fn test_semicolon_file_uses_decimal_comma() {
        let csv = "Date;Type;Category;Amount\n\
                   2024-01-01;income;Rent;1250,50\n\
                   2024-01-02;expense;Repairs;R$ 1.234,56\n\
                   2024-01-03;expense;Repairs;75.25\n";
        let rows = parse_transactions_reader(csv.as_bytes(), b';').unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].amount, dec!(1250.50));
        assert_eq!(rows[1].amount, dec!(1234.56));
        assert_eq!(rows[2].amount, dec!(75.25));
    }

    #[test]
    fn test_parse_amount_separators() {
        assert_eq!(parse_amount("$1,250.00", false).unwrap(), dec!(1250.00));
        assert_eq!(parse_amount("1,250", false).unwrap(), dec!(1250));
        assert_eq!(parse_amount("1,250,000", false).unwrap(), dec!(1250000));
        assert_eq!(parse_amount("99,5", false).unwrap(), dec!(99.5));
        assert_eq!(parse_amount("1.234,56", false).unwrap(), dec!(1234.56));
        assert_eq!(parse_amount("1,250", true).unwrap(), dec!(1.250));
        assert!(parse_amount("-10", false).is_err());
        assert!(parse_amount("abc", false).is_err());
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let csv = "date,type,category,amount\n\
                   2024-13-01,income,Rent,100\n\
                   2024-02-01,refund,Rent,100\n\
                   2024-02-01,income,Rent,-5\n\
                   ,,,\n\
                   2024-02-02,income,Rent,100\n";
        let rows = parse_transactions_reader(csv.as_bytes(), b',').unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 6);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "date,type,amount\n2024-01-01,income,100\n";
        let err = parse_transactions_reader(csv.as_bytes(), b',').unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(detect_delimiter("a,b,c"), b',');
    }
}
