use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::financial::{monthly_summaries, summarize_totals};
use super::percent_of;
use super::period::DateRange;
use crate::db::UnitOccupancy;
use crate::error::{ReportError, ReportResult};
use crate::store::ReportingStore;

/// Inputs of the performance formulas, already aggregated
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceInputs {
    pub purchase_price: Decimal,
    pub current_value: Decimal,
    pub annual_noi: Decimal,
    pub annual_cash_flow: Decimal,
    /// Cash flow since acquisition
    pub cumulative_cash_flow: Decimal,
    pub total_cash_invested: Decimal,
    pub holding_period_years: Decimal,
    pub occupancy: UnitOccupancy,
}

/// All figures are percentages except `appreciation` and `total_return`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub appreciation: Decimal,
    pub appreciation_percentage: Decimal,
    pub cap_rate: Decimal,
    pub cash_on_cash_return: Decimal,
    pub total_return: Decimal,
    /// Total return over total cash invested (ROI)
    pub roi: Decimal,
    pub annualized_return: Decimal,
    pub occupancy_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub property_id: i64,
    pub property_name: String,
    pub year: i32,
    pub purchase_date: NaiveDate,
    pub valuation_date: Option<NaiveDate>,
    /// End of the since-acquisition figures (total return, ROI, annualized)
    pub as_of: NaiveDate,
    pub annual_income: Decimal,
    pub annual_expenses: Decimal,
    pub inputs: PerformanceInputs,
    pub metrics: PerformanceMetrics,
}

pub fn occupancy_rate(occupancy: UnitOccupancy) -> Decimal {
    percent_of(
        Decimal::from(occupancy.occupied),
        Decimal::from(occupancy.total),
    )
}

/// Years between two dates using a 365.25-day year; 0 when `to` precedes `from`
pub fn holding_period_years(from: NaiveDate, to: NaiveDate) -> Decimal {
    let days = (to - from).num_days();
    if days <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(days) / Decimal::new(36525, 2)).round_dp(4)
}

/// Compound annual growth of `total_return` on `basis` over `years`:
/// `((1 + total_return / basis)^(1 / years) - 1) × 100`.
///
/// Returns 0 when `basis` or `years` is not positive and -100 when the
/// investment was wiped out.
pub fn annualize_return(total_return: Decimal, basis: Decimal, years: Decimal) -> Decimal {
    if basis <= Decimal::ZERO || years <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let growth = Decimal::ONE + total_return / basis;
    if growth <= Decimal::ZERO {
        return Decimal::from(-100);
    }

    let (Some(growth_f), Some(years_f)) = (growth.to_f64(), years.to_f64()) else {
        return Decimal::ZERO;
    };
    let annual = growth_f.powf(1.0 / years_f) - 1.0;

    match Decimal::try_from(annual * 100.0) {
        Ok(pct) => pct.round_dp(2),
        Err(e) => {
            warn!("Annualized return out of range ({}): {}", annual, e);
            Decimal::ZERO
        }
    }
}

/// Derive performance metrics; every zero denominator yields 0
pub fn calculate_performance(inputs: &PerformanceInputs) -> PerformanceMetrics {
    let appreciation = inputs.current_value - inputs.purchase_price;
    let total_return = appreciation + inputs.cumulative_cash_flow;

    PerformanceMetrics {
        appreciation,
        appreciation_percentage: percent_of(appreciation, inputs.purchase_price),
        cap_rate: percent_of(inputs.annual_noi, inputs.current_value),
        cash_on_cash_return: percent_of(inputs.annual_cash_flow, inputs.total_cash_invested),
        total_return,
        roi: percent_of(total_return, inputs.total_cash_invested),
        annualized_return: annualize_return(
            total_return,
            inputs.total_cash_invested,
            inputs.holding_period_years,
        ),
        occupancy_rate: occupancy_rate(inputs.occupancy),
    }
}

/// Performance of a property for a calendar year.
///
/// `year` defaults to the valuation year, or the current year for properties
/// never revalued, and only drives the annual figures. Cumulative cash flow,
/// cash invested and the holding period all run from the acquisition date to
/// the valuation date (end of `year` when never revalued), the same date the
/// current value belongs to.
pub fn performance_report<S: ReportingStore + ?Sized>(
    store: &S,
    property_id: i64,
    year: Option<i32>,
) -> ReportResult<PerformanceReport> {
    if let Some(y) = year {
        DateRange::calendar_year(y)?;
    }

    let property = store
        .property(property_id)?
        .ok_or_else(|| ReportError::property_not_found(property_id))?;

    let year = year
        .or_else(|| property.valuation_date.map(|d| d.year()))
        .unwrap_or_else(|| Local::now().year());
    let annual_range = DateRange::calendar_year(year)?;

    if annual_range.to < property.purchase_date {
        return Err(ReportError::ValidationError(format!(
            "year {} is before the acquisition of '{}' on {}",
            year, property.name, property.purchase_date
        )));
    }

    info!(
        "Calculating performance for '{}' (year {})",
        property.name, year
    );

    let categories = store.categories()?;

    let annual_txs = store.transactions(property_id, None, annual_range.from, annual_range.to)?;
    let annual_months = monthly_summaries(&annual_txs, &categories, &annual_range);
    let annual = summarize_totals(&annual_months, &annual_txs);

    let as_of = property.valuation_date.unwrap_or(annual_range.to);
    let holding_range = DateRange::new(property.purchase_date, as_of)?;
    let holding_txs = store.transactions(property_id, None, holding_range.from, holding_range.to)?;
    let holding_months = monthly_summaries(&holding_txs, &categories, &holding_range);
    let cumulative = summarize_totals(&holding_months, &holding_txs);

    let total_cash_invested = if cumulative.investments > Decimal::ZERO {
        cumulative.investments
    } else {
        property.purchase_price
    };

    let inputs = PerformanceInputs {
        purchase_price: property.purchase_price,
        current_value: property.effective_value(),
        annual_noi: annual.net_operating_income,
        annual_cash_flow: annual.cash_flow,
        cumulative_cash_flow: cumulative.cash_flow,
        total_cash_invested,
        holding_period_years: holding_period_years(holding_range.from, holding_range.to),
        occupancy: store.unit_occupancy(property_id)?,
    };
    debug!("Performance inputs: {:?}", inputs);

    let metrics = calculate_performance(&inputs);

    Ok(PerformanceReport {
        property_id,
        property_name: property.name,
        year,
        purchase_date: property.purchase_date,
        valuation_date: property.valuation_date,
        as_of,
        annual_income: annual.income,
        annual_expenses: annual.expenses,
        inputs,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Category, CategoryType, Property, Transaction, TransactionType, Unit};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_appreciation_with_zero_purchase_price() {
        let metrics = calculate_performance(&PerformanceInputs {
            purchase_price: Decimal::ZERO,
            current_value: dec!(150000),
            ..Default::default()
        });
        assert_eq!(metrics.appreciation, dec!(150000));
        assert_eq!(metrics.appreciation_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_occupancy_with_zero_units() {
        assert_eq!(occupancy_rate(UnitOccupancy::default()), Decimal::ZERO);
        assert_eq!(
            occupancy_rate(UnitOccupancy {
                occupied: 3,
                total: 4
            }),
            dec!(75)
        );
    }

    #[test]
    fn test_core_ratios() {
        let metrics = calculate_performance(&PerformanceInputs {
            purchase_price: dec!(200000),
            current_value: dec!(250000),
            annual_noi: dec!(15000),
            annual_cash_flow: dec!(6000),
            cumulative_cash_flow: dec!(10000),
            total_cash_invested: dec!(60000),
            holding_period_years: dec!(2),
            occupancy: UnitOccupancy {
                occupied: 1,
                total: 2,
            },
        });

        assert_eq!(metrics.appreciation, dec!(50000));
        assert_eq!(metrics.appreciation_percentage, dec!(25));
        assert_eq!(metrics.cap_rate, dec!(6));
        assert_eq!(metrics.cash_on_cash_return, dec!(10));
        assert_eq!(metrics.total_return, dec!(60000));
        assert_eq!(metrics.roi, dec!(100));
        // (1 + 1)^(1/2) - 1 = 41.42%
        assert_eq!(metrics.annualized_return, dec!(41.42));
        assert_eq!(metrics.occupancy_rate, dec!(50));
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let metrics = calculate_performance(&PerformanceInputs {
            annual_noi: dec!(1000),
            annual_cash_flow: dec!(500),
            cumulative_cash_flow: dec!(500),
            ..Default::default()
        });
        assert_eq!(metrics.cap_rate, Decimal::ZERO);
        assert_eq!(metrics.cash_on_cash_return, Decimal::ZERO);
        assert_eq!(metrics.roi, Decimal::ZERO);
        assert_eq!(metrics.annualized_return, Decimal::ZERO);
    }

    #[test]
    fn test_annualize_return_edges() {
        assert_eq!(annualize_return(dec!(100), dec!(100), dec!(1)), dec!(100));
        assert_eq!(annualize_return(dec!(100), dec!(100), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(annualize_return(dec!(-150), dec!(100), dec!(3)), dec!(-100));
        assert_eq!(annualize_return(Decimal::ZERO, dec!(100), dec!(5)), Decimal::ZERO);
    }

    #[test]
    fn test_holding_period_years() {
        assert_eq!(
            holding_period_years(date(2020, 1, 1), date(2020, 1, 1)),
            Decimal::ZERO
        );
        assert_eq!(
            holding_period_years(date(2021, 1, 1), date(2020, 1, 1)),
            Decimal::ZERO
        );
        // 1461 days = exactly 4 years of 365.25 days
        assert_eq!(
            holding_period_years(date(2020, 1, 1), date(2024, 1, 1)),
            dec!(4)
        );
    }

    fn tx(tx_type: TransactionType, category_id: i64, date: NaiveDate, amount: Decimal) -> Transaction {
        Transaction {
            id: None,
            property_id: 1,
            unit_id: None,
            category_id,
            account_id: None,
            transaction_type: tx_type,
            date,
            amount,
            is_tax_deductible: false,
            is_paid: true,
            recurrence: None,
            notes: None,
            source: "TEST".to_string(),
            created_at: Utc::now(),
        }
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_property(Property {
            id: None,
            name: "Birch House".to_string(),
            address: None,
            purchase_price: dec!(200000),
            purchase_date: date(2022, 1, 1),
            current_value: Some(dec!(220000)),
            valuation_date: Some(date(2024, 1, 1)),
        });
        let rent = store.add_category(Category {
            id: None,
            name: "Rent".to_string(),
            category_type: CategoryType::Income,
            is_tax_deductible: false,
            is_financing: false,
        });
        let taxes = store.add_category(Category {
            id: None,
            name: "Property Tax".to_string(),
            category_type: CategoryType::Expense,
            is_tax_deductible: true,
            is_financing: false,
        });
        let mortgage = store.add_category(Category {
            id: None,
            name: "Mortgage".to_string(),
            category_type: CategoryType::Expense,
            is_tax_deductible: false,
            is_financing: true,
        });
        let down_payment = store.add_category(Category {
            id: None,
            name: "Down Payment".to_string(),
            category_type: CategoryType::Expense,
            is_tax_deductible: false,
            is_financing: false,
        });

        store.add_transaction(tx(TransactionType::Investment, down_payment, date(2022, 1, 1), dec!(50000)));
        for year in [2022, 2023] {
            store.add_transaction(tx(TransactionType::Income, rent, date(year, 6, 1), dec!(24000)));
            store.add_transaction(tx(TransactionType::Expense, taxes, date(year, 6, 2), dec!(4000)));
            store.add_transaction(tx(TransactionType::Expense, mortgage, date(year, 6, 3), dec!(12000)));
        }
        for occupied in [true, true, false, true] {
            store.add_unit(Unit {
                id: None,
                property_id: 1,
                name: "unit".to_string(),
                is_occupied: occupied,
            });
        }
        store
    }

    #[test]
    fn test_performance_report_from_store() {
        let store = seeded_store();
        let report = performance_report(&store, 1, Some(2023)).unwrap();

        assert_eq!(report.annual_income, dec!(24000));
        assert_eq!(report.inputs.annual_noi, dec!(20000));
        assert_eq!(report.inputs.annual_cash_flow, dec!(8000));
        assert_eq!(report.inputs.cumulative_cash_flow, dec!(16000));
        assert_eq!(report.inputs.total_cash_invested, dec!(50000));

        assert_eq!(report.metrics.appreciation, dec!(20000));
        assert_eq!(report.metrics.appreciation_percentage, dec!(10));
        // 20000 / 220000
        assert_eq!(report.metrics.cap_rate, dec!(9.09));
        assert_eq!(report.metrics.cash_on_cash_return, dec!(16));
        assert_eq!(report.metrics.total_return, dec!(36000));
        assert_eq!(report.metrics.roi, dec!(72));
        assert_eq!(report.metrics.occupancy_rate, dec!(75));
        assert!(report.metrics.annualized_return > Decimal::ZERO);
        assert!(report.metrics.annualized_return < report.metrics.roi);
    }

    #[test]
    fn test_performance_defaults_to_valuation_year() {
        let store = seeded_store();
        let report = performance_report(&store, 1, None).unwrap();
        assert_eq!(report.year, 2024);
        assert_eq!(report.inputs.annual_noi, Decimal::ZERO);
    }

    #[test]
    fn test_earlier_year_keeps_since_acquisition_figures_at_valuation_date() {
        let store = seeded_store();
        let early = performance_report(&store, 1, Some(2022)).unwrap();
        let valued = performance_report(&store, 1, Some(2023)).unwrap();

        assert_eq!(early.as_of, date(2024, 1, 1));
        assert_eq!(early.inputs.annual_cash_flow, dec!(8000));
        // Both years of cash flow up to the 2024 valuation
        assert_eq!(early.inputs.cumulative_cash_flow, dec!(16000));
        // 730 days
        assert_eq!(early.inputs.holding_period_years, dec!(1.9986));
        assert_eq!(early.metrics.total_return, valued.metrics.total_return);
        assert_eq!(early.metrics.annualized_return, valued.metrics.annualized_return);
    }

    #[test]
    fn test_unvalued_property_measures_to_end_of_year() {
        let mut store = seeded_store();
        store.add_property(Property {
            id: None,
            name: "Alder Court".to_string(),
            address: None,
            purchase_price: dec!(100000),
            purchase_date: date(2021, 1, 1),
            current_value: None,
            valuation_date: None,
        });
        let report = performance_report(&store, 2, Some(2022)).unwrap();
        assert_eq!(report.as_of, date(2022, 12, 31));
        assert_eq!(report.metrics.appreciation, Decimal::ZERO);
        assert!(report.inputs.holding_period_years > dec!(1.99));
    }

    #[test]
    fn test_performance_errors() {
        let store = seeded_store();
        assert!(performance_report(&store, 7, Some(2023))
            .unwrap_err()
            .is_not_found());
        assert!(performance_report(&store, 1, Some(-5))
            .unwrap_err()
            .is_validation());
        assert!(performance_report(&store, 1, Some(2019))
            .unwrap_err()
            .is_validation());
    }
}
