use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use super::percent_of;
use super::period::{month_name, DateRange};
use crate::db::{Category, Transaction, TransactionType};
use crate::error::{ReportError, ReportResult};
use crate::store::ReportingStore;

/// Income, expenses and cash flow of one calendar month
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyFinancialSummary {
    pub year: i32,
    pub month: u32,
    pub month_name: &'static str,
    pub income: Decimal,
    /// Operating expenses (financing categories excluded)
    pub expenses: Decimal,
    pub financing_costs: Decimal,
    pub net_operating_income: Decimal,
    pub cash_flow: Decimal,
    pub expense_ratio: Decimal,
}

/// Total of one category over the report period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category_id: i64,
    pub name: String,
    pub transaction_type: TransactionType,
    pub total: Decimal,
    /// Share of the total of the same transaction type
    pub percentage: Decimal,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialTotals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub financing_costs: Decimal,
    pub net_operating_income: Decimal,
    pub cash_flow: Decimal,
    pub expense_ratio: Decimal,
    pub avg_monthly_noi: Decimal,
    pub avg_monthly_cash_flow: Decimal,
    pub investments: Decimal,
    pub unpaid_expenses: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub property_id: i64,
    pub property_name: String,
    pub unit_id: Option<i64>,
    pub range: DateRange,
    pub months: Vec<MonthlyFinancialSummary>,
    pub totals: FinancialTotals,
    pub categories: Vec<CategoryBreakdown>,
}

/// How a single transaction contributes to NOI and cash flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Income,
    OperatingExpense,
    Financing,
    Investment,
    Ignored,
}

fn financing_category_ids(categories: &[Category]) -> HashSet<i64> {
    categories
        .iter()
        .filter(|c| c.is_financing)
        .filter_map(|c| c.id)
        .collect()
}

fn classify(tx: &Transaction, financing: &HashSet<i64>) -> Flow {
    match tx.transaction_type {
        TransactionType::Income => Flow::Income,
        TransactionType::Expense if financing.contains(&tx.category_id) => Flow::Financing,
        TransactionType::Expense => Flow::OperatingExpense,
        TransactionType::Investment => Flow::Investment,
        TransactionType::Transfer => Flow::Ignored,
    }
}

fn finish_month(summary: &mut MonthlyFinancialSummary) {
    summary.net_operating_income = summary.income - summary.expenses;
    summary.cash_flow = summary.net_operating_income - summary.financing_costs;
    summary.expense_ratio = percent_of(summary.expenses, summary.income);
}

/// Group transactions by calendar month.
///
/// Every month touched by `range` gets an entry, zero-filled when it has no
/// activity. Transactions dated outside `range` are ignored.
pub fn monthly_summaries(
    transactions: &[Transaction],
    categories: &[Category],
    range: &DateRange,
) -> Vec<MonthlyFinancialSummary> {
    let financing = financing_category_ids(categories);

    let mut months: BTreeMap<(i32, u32), MonthlyFinancialSummary> = range
        .months()
        .into_iter()
        .map(|(year, month)| {
            (
                (year, month),
                MonthlyFinancialSummary {
                    year,
                    month,
                    month_name: month_name(month),
                    ..Default::default()
                },
            )
        })
        .collect();

    for tx in transactions.iter().filter(|t| range.contains(t.date)) {
        let Some(summary) = months.get_mut(&(tx.date.year(), tx.date.month())) else {
            continue;
        };
        match classify(tx, &financing) {
            Flow::Income => summary.income += tx.amount,
            Flow::OperatingExpense => summary.expenses += tx.amount,
            Flow::Financing => summary.financing_costs += tx.amount,
            Flow::Investment | Flow::Ignored => {}
        }
    }

    months
        .into_values()
        .map(|mut summary| {
            finish_month(&mut summary);
            summary
        })
        .collect()
}

/// Sum transactions per category, with each category's share of its
/// transaction type's total. Sorted by type, then largest total first.
pub fn category_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategoryBreakdown> {
    let names: HashMap<i64, &str> = categories
        .iter()
        .filter_map(|c| c.id.map(|id| (id, c.name.as_str())))
        .collect();

    let mut buckets: HashMap<(TransactionType, i64), (Decimal, usize)> = HashMap::new();
    let mut type_totals: HashMap<TransactionType, Decimal> = HashMap::new();

    for tx in transactions {
        let bucket = buckets
            .entry((tx.transaction_type, tx.category_id))
            .or_insert((Decimal::ZERO, 0));
        bucket.0 += tx.amount;
        bucket.1 += 1;
        *type_totals
            .entry(tx.transaction_type)
            .or_insert(Decimal::ZERO) += tx.amount;
    }

    let mut rows: Vec<CategoryBreakdown> = buckets
        .into_iter()
        .map(|((transaction_type, category_id), (total, count))| {
            let type_total = type_totals
                .get(&transaction_type)
                .copied()
                .unwrap_or(Decimal::ZERO);
            CategoryBreakdown {
                category_id,
                name: names
                    .get(&category_id)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| format!("Uncategorized #{}", category_id)),
                transaction_type,
                total,
                percentage: percent_of(total, type_total),
                transaction_count: count,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.transaction_type
            .cmp(&b.transaction_type)
            .then_with(|| b.total.cmp(&a.total))
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

/// Period totals derived from the monthly summaries plus the raw entries
pub fn summarize_totals(
    months: &[MonthlyFinancialSummary],
    transactions: &[Transaction],
) -> FinancialTotals {
    let mut totals = FinancialTotals::default();

    for month in months {
        totals.income += month.income;
        totals.expenses += month.expenses;
        totals.financing_costs += month.financing_costs;
    }
    totals.net_operating_income = totals.income - totals.expenses;
    totals.cash_flow = totals.net_operating_income - totals.financing_costs;
    totals.expense_ratio = percent_of(totals.expenses, totals.income);

    if !months.is_empty() {
        let count = Decimal::from(months.len() as i64);
        totals.avg_monthly_noi = (totals.net_operating_income / count).round_dp(2);
        totals.avg_monthly_cash_flow = (totals.cash_flow / count).round_dp(2);
    }

    for tx in transactions {
        match tx.transaction_type {
            TransactionType::Investment => totals.investments += tx.amount,
            TransactionType::Expense if !tx.is_paid => totals.unpaid_expenses += tx.amount,
            _ => {}
        }
    }

    totals
}

/// Financial report of a property (or one of its units) over a date range
pub fn financial_report<S: ReportingStore + ?Sized>(
    store: &S,
    property_id: i64,
    range: DateRange,
    unit_id: Option<i64>,
) -> ReportResult<FinancialReport> {
    let range = DateRange::new(range.from, range.to)?;

    let property = store
        .property(property_id)?
        .ok_or_else(|| ReportError::property_not_found(property_id))?;

    if let Some(unit_id) = unit_id {
        match store.unit(unit_id)? {
            Some(unit) if unit.property_id == property_id => {}
            _ => return Err(ReportError::unit_not_found(unit_id)),
        }
    }

    info!(
        "Generating financial report for '{}' ({} - {})",
        property.name, range.from, range.to
    );

    let transactions = store.transactions(property_id, unit_id, range.from, range.to)?;
    let categories = store.categories()?;
    debug!("Aggregating {} transactions", transactions.len());

    let months = monthly_summaries(&transactions, &categories, &range);
    let totals = summarize_totals(&months, &transactions);
    let breakdown = category_breakdown(&transactions, &categories);

    Ok(FinancialReport {
        property_id,
        property_name: property.name,
        unit_id,
        range,
        months,
        totals,
        categories: breakdown,
    })
}
