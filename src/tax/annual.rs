use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::brackets::{calculate_liability, validate_brackets, TaxBracket, TaxLiability};
use crate::db::{Category, Transaction, TransactionType};
use crate::error::{ReportError, ReportResult};
use crate::reports::financial::{category_breakdown, CategoryBreakdown};
use crate::reports::DateRange;
use crate::store::ReportingStore;

/// Income and deductions of one tax (calendar) year
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaxableIncome {
    pub year: i32,
    pub gross_income: Decimal,
    /// Every expense of the year, deductible or not
    pub total_expenses: Decimal,
    pub deductible_expenses: Decimal,
    /// Gross income minus deductible amounts; negative for a loss
    pub taxable_income: Decimal,
}

/// Annual tax position of a property
#[derive(Debug, Clone, Serialize)]
pub struct TaxReport {
    pub property_id: i64,
    pub property_name: String,
    pub year: i32,
    pub income: TaxableIncome,
    pub liability: TaxLiability,
    pub deductions_by_category: Vec<CategoryBreakdown>,
}

fn is_deduction(tx: &Transaction) -> bool {
    tx.is_tax_deductible && tx.transaction_type != TransactionType::Income
}

/// Taxable income of `year` from the transactions dated in that year
pub fn compute_taxable_income(transactions: &[Transaction], year: i32) -> TaxableIncome {
    let mut result = TaxableIncome {
        year,
        ..Default::default()
    };

    for tx in transactions.iter().filter(|t| t.date.year() == year) {
        if tx.transaction_type == TransactionType::Income {
            result.gross_income += tx.amount;
        }
        if tx.transaction_type == TransactionType::Expense {
            result.total_expenses += tx.amount;
        }
        if is_deduction(tx) {
            result.deductible_expenses += tx.amount;
        }
    }

    result.taxable_income = result.gross_income - result.deductible_expenses;
    result
}

/// Deductible amounts grouped by category
pub fn deductions_by_category(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategoryBreakdown> {
    let deductions: Vec<Transaction> = transactions
        .iter()
        .filter(|t| is_deduction(t))
        .cloned()
        .collect();
    category_breakdown(&deductions, categories)
}

/// Tax report of a property for a calendar year under the given brackets
pub fn tax_report<S: ReportingStore + ?Sized>(
    store: &S,
    property_id: i64,
    year: i32,
    brackets: &[TaxBracket],
) -> ReportResult<TaxReport> {
    let range = DateRange::calendar_year(year)?;
    validate_brackets(brackets)?;

    let property = store
        .property(property_id)?
        .ok_or_else(|| ReportError::property_not_found(property_id))?;

    info!(
        "Generating tax report for '{}' ({}, {} brackets)",
        property.name,
        year,
        brackets.len()
    );

    let transactions = store.transactions(property_id, None, range.from, range.to)?;
    let categories = store.categories()?;

    let income = compute_taxable_income(&transactions, year);
    let liability = calculate_liability(income.taxable_income, brackets)?;

    Ok(TaxReport {
        property_id,
        property_name: property.name,
        year,
        income,
        liability,
        deductions_by_category: deductions_by_category(&transactions, &categories),
    })
}
