use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::annual::compute_taxable_income;
use super::brackets::{calculate_liability, validate_brackets, TaxBracket};
use crate::error::{ReportError, ReportResult};
use crate::reports::{percent_change, DateRange};
use crate::store::ReportingStore;

/// Tax position of one year plus its change against the year before
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearTaxPosition {
    pub year: i32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub deductible_expenses: Decimal,
    pub taxable_income: Decimal,
    pub tax_liability: Decimal,
    pub effective_rate: Decimal,
    pub income_change_pct: Decimal,
    pub expense_change_pct: Decimal,
    pub taxable_income_change_pct: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiYearComparison {
    pub property_id: i64,
    pub property_name: String,
    pub from_year: i32,
    pub to_year: i32,
    pub years: Vec<YearTaxPosition>,
}

/// Fill in year-over-year changes; positions must be sorted by year.
/// The first year, and any year following a zero value, shows 0% change.
pub fn apply_year_over_year(positions: &mut [YearTaxPosition]) {
    for idx in 1..positions.len() {
        let (prev_income, prev_expenses, prev_taxable) = {
            let prev = &positions[idx - 1];
            (prev.income, prev.expenses, prev.taxable_income)
        };
        let current = &mut positions[idx];
        current.income_change_pct = percent_change(prev_income, current.income);
        current.expense_change_pct = percent_change(prev_expenses, current.expenses);
        current.taxable_income_change_pct = percent_change(prev_taxable, current.taxable_income);
    }
}

/// Compare the tax positions of `from_year..=to_year`
pub fn compare_years<S: ReportingStore + ?Sized>(
    store: &S,
    property_id: i64,
    from_year: i32,
    to_year: i32,
    brackets: &[TaxBracket],
) -> ReportResult<MultiYearComparison> {
    let first = DateRange::calendar_year(from_year)?;
    let last = DateRange::calendar_year(to_year)?;
    if to_year < from_year {
        return Err(ReportError::ValidationError(format!(
            "to year {} is before from year {}",
            to_year, from_year
        )));
    }
    validate_brackets(brackets)?;

    let property = store
        .property(property_id)?
        .ok_or_else(|| ReportError::property_not_found(property_id))?;

    info!(
        "Comparing tax years {}-{} for '{}'",
        from_year, to_year, property.name
    );

    let transactions = store.transactions(property_id, None, first.from, last.to)?;

    let mut years = Vec::new();
    for year in from_year..=to_year {
        let income = compute_taxable_income(&transactions, year);
        let liability = calculate_liability(income.taxable_income, brackets)?;
        years.push(YearTaxPosition {
            year,
            income: income.gross_income,
            expenses: income.total_expenses,
            deductible_expenses: income.deductible_expenses,
            taxable_income: income.taxable_income,
            tax_liability: liability.total_tax,
            effective_rate: liability.effective_rate,
            ..Default::default()
        });
    }
    apply_year_over_year(&mut years);

    Ok(MultiYearComparison {
        property_id,
        property_name: property.name,
        from_year,
        to_year,
        years,
    })
}
