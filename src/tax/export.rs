use anyhow::{Context, Result};
use std::io::Write;

use super::annual::TaxReport;

/// File name used by `tax report --export`
pub fn export_file_name(report: &TaxReport) -> String {
    let slug: String = report
        .property_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("tax_report_{}_{}.csv", slug, report.year)
}

/// Write the report as `section,item,amount` rows
pub fn write_tax_report_csv<W: Write>(report: &TaxReport, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["section", "item", "amount"])?;

    let income = &report.income;
    let summary = [
        ("gross_income", income.gross_income),
        ("total_expenses", income.total_expenses),
        ("deductible_expenses", income.deductible_expenses),
        ("taxable_income", income.taxable_income),
    ];
    for (item, amount) in summary {
        wtr.write_record(["summary", item, format!("{:.2}", amount).as_str()])?;
    }

    for deduction in &report.deductions_by_category {
        wtr.write_record([
            "deduction",
            deduction.name.as_str(),
            format!("{:.2}", deduction.total).as_str(),
        ])?;
    }

    for bracket in &report.liability.brackets {
        let label = match bracket.upper {
            Some(upper) => format!("{}-{} @ {}", bracket.lower, upper, bracket.rate),
            None => format!("{}+ @ {}", bracket.lower, bracket.rate),
        };
        wtr.write_record(["bracket", label.as_str(), format!("{:.2}", bracket.tax).as_str()])?;
    }

    let liability = &report.liability;
    wtr.write_record(["liability", "total_tax", format!("{:.2}", liability.total_tax).as_str()])?;
    wtr.write_record([
        "liability",
        "effective_rate_pct",
        format!("{:.2}", liability.effective_rate).as_str(),
    ])?;
    wtr.write_record([
        "liability",
        "marginal_rate_pct",
        format!("{:.2}", liability.marginal_rate).as_str(),
    ])?;

    wtr.flush().context("Failed to write tax report CSV")?;
    Ok(())
}
