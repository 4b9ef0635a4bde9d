// Reports module - financial aggregation and property performance

pub mod financial;
pub mod performance;
pub mod period;

use rust_decimal::Decimal;

pub use financial::{
    category_breakdown, financial_report, monthly_summaries, CategoryBreakdown, FinancialReport,
    FinancialTotals, MonthlyFinancialSummary,
};
pub use performance::{
    calculate_performance, performance_report, PerformanceInputs, PerformanceMetrics,
    PerformanceReport,
};
pub use period::{parse_period, DateRange};

/// `part / whole × 100`, rounded to 2 places; 0 when `whole` is zero
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    ((part / whole) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Relative change from `previous` to `current` in percent; 0 when `previous` is zero
pub fn percent_change(previous: Decimal, current: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    (((current - previous) / previous) * Decimal::ONE_HUNDRED).round_dp(2)
}
