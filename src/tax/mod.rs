// Tax module - taxable income, progressive brackets, multi-year comparison

pub mod annual;
pub mod brackets;
pub mod comparison;
pub mod export;

pub use annual::{compute_taxable_income, tax_report, TaxReport, TaxableIncome};
pub use brackets::{calculate_liability, validate_brackets, TaxBracket, TaxLiability};
pub use comparison::{compare_years, MultiYearComparison, YearTaxPosition};
pub use export::{export_file_name, write_tax_report_csv};
