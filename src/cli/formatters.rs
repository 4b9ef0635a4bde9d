//! Output formatting module for CLI display
//!
//! Report structs come from the engine fully computed; this module only
//! turns them into tables and summary lines.

use colored::Colorize;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use rentbook::reports::{CategoryBreakdown, FinancialReport, PerformanceReport};
use rentbook::tax::{MultiYearComparison, TaxReport};
use rentbook::utils::{format_currency_with, format_percent};

fn signed_money(value: Decimal, symbol: &str) -> String {
    let text = format_currency_with(value, symbol);
    if value < Decimal::ZERO {
        text.red().to_string()
    } else {
        text
    }
}

fn signed_percent(value: Decimal) -> String {
    let text = format_percent(value);
    if value > Decimal::ZERO {
        text.green().to_string()
    } else if value < Decimal::ZERO {
        text.red().to_string()
    } else {
        text
    }
}

fn summary_line(label: &str, value: String) -> String {
    format!("\n{:<24} {}", format!("{}:", label).bold(), value)
}

/// Monthly table plus period totals
pub fn format_monthly_table(report: &FinancialReport, symbol: &str) -> String {
    #[derive(Tabled)]
    struct MonthRow {
        #[tabled(rename = "Month")]
        month: String,
        #[tabled(rename = "Income")]
        income: String,
        #[tabled(rename = "Expenses")]
        expenses: String,
        #[tabled(rename = "NOI")]
        noi: String,
        #[tabled(rename = "Financing")]
        financing: String,
        #[tabled(rename = "Cash Flow")]
        cash_flow: String,
        #[tabled(rename = "Exp. Ratio")]
        expense_ratio: String,
    }

    let mut output = format!(
        "\n{} {} - Monthly Summary ({} - {})\n\n",
        "📅".cyan().bold(),
        report.property_name.bold(),
        report.range.from,
        report.range.to
    );

    let rows: Vec<MonthRow> = report
        .months
        .iter()
        .map(|m| MonthRow {
            month: format!("{} {}", m.month_name, m.year),
            income: format_currency_with(m.income, symbol),
            expenses: format_currency_with(m.expenses, symbol),
            noi: signed_money(m.net_operating_income, symbol),
            financing: format_currency_with(m.financing_costs, symbol),
            cash_flow: signed_money(m.cash_flow, symbol),
            expense_ratio: format_percent(m.expense_ratio),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());

    let totals = &report.totals;
    output.push_str(&format!("\n\n{} Totals", "━".repeat(60).bright_black()));
    output.push_str(&summary_line("Income", format_currency_with(totals.income, symbol)));
    output.push_str(&summary_line("Operating expenses", format_currency_with(totals.expenses, symbol)));
    output.push_str(&summary_line("Net operating income", signed_money(totals.net_operating_income, symbol)));
    output.push_str(&summary_line("Financing costs", format_currency_with(totals.financing_costs, symbol)));
    output.push_str(&summary_line("Cash flow", signed_money(totals.cash_flow, symbol)));
    output.push_str(&summary_line("Expense ratio", format_percent(totals.expense_ratio)));
    output.push_str(&summary_line("Avg monthly NOI", signed_money(totals.avg_monthly_noi, symbol)));
    output.push_str(&summary_line("Avg monthly cash flow", signed_money(totals.avg_monthly_cash_flow, symbol)));
    if totals.investments > Decimal::ZERO {
        output.push_str(&summary_line("Capital invested", format_currency_with(totals.investments, symbol)));
    }
    if totals.unpaid_expenses > Decimal::ZERO {
        output.push_str(&summary_line(
            "Unpaid expenses",
            format_currency_with(totals.unpaid_expenses, symbol).yellow().to_string(),
        ));
    }
    output.push('\n');
    output
}

/// Category rows grouped by transaction type
pub fn format_category_table(categories: &[CategoryBreakdown], symbol: &str) -> String {
    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "Type")]
        tx_type: String,
        #[tabled(rename = "Category")]
        name: String,
        #[tabled(rename = "Entries")]
        count: usize,
        #[tabled(rename = "Total")]
        total: String,
        #[tabled(rename = "Share")]
        share: String,
    }

    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            tx_type: c.transaction_type.as_str().to_string(),
            name: c.name.clone(),
            count: c.transaction_count,
            total: format_currency_with(c.total, symbol),
            share: format_percent(c.percentage),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(2..), Alignment::right());
    table.to_string()
}

pub fn format_performance(report: &PerformanceReport, symbol: &str) -> String {
    let inputs = &report.inputs;
    let metrics = &report.metrics;

    let mut output = format!(
        "\n{} {} - Performance {}\n",
        "📈".cyan().bold(),
        report.property_name.bold(),
        report.year
    );

    output.push_str(&format!("\n{} Inputs", "━".repeat(60).bright_black()));
    output.push_str(&summary_line(
        "Purchase",
        format!("{} on {}", format_currency_with(inputs.purchase_price, symbol), report.purchase_date),
    ));
    let valued = match report.valuation_date {
        Some(date) => format!("{} on {}", format_currency_with(inputs.current_value, symbol), date),
        None => format!("{} (not revalued)", format_currency_with(inputs.current_value, symbol)),
    };
    output.push_str(&summary_line("Current value", valued));
    output.push_str(&summary_line("Annual income", format_currency_with(report.annual_income, symbol)));
    output.push_str(&summary_line("Annual expenses", format_currency_with(report.annual_expenses, symbol)));
    output.push_str(&summary_line("Annual NOI", signed_money(inputs.annual_noi, symbol)));
    output.push_str(&summary_line("Annual cash flow", signed_money(inputs.annual_cash_flow, symbol)));
    output.push_str(&summary_line("Cumulative cash flow", signed_money(inputs.cumulative_cash_flow, symbol)));
    output.push_str(&summary_line("Cash invested", format_currency_with(inputs.total_cash_invested, symbol)));
    output.push_str(&summary_line(
        "Holding period",
        format!("{:.2} years (to {})", inputs.holding_period_years, report.as_of),
    ));

    output.push_str(&format!("\n\n{} Metrics", "━".repeat(60).bright_black()));
    output.push_str(&summary_line(
        "Appreciation",
        format!(
            "{} ({})",
            signed_money(metrics.appreciation, symbol),
            signed_percent(metrics.appreciation_percentage)
        ),
    ));
    output.push_str(&summary_line("Cap rate", signed_percent(metrics.cap_rate)));
    output.push_str(&summary_line("Cash-on-cash return", signed_percent(metrics.cash_on_cash_return)));
    output.push_str(&summary_line("Total return", signed_money(metrics.total_return, symbol)));
    output.push_str(&summary_line("ROI", signed_percent(metrics.roi)));
    output.push_str(&summary_line("Annualized return", signed_percent(metrics.annualized_return)));
    output.push_str(&summary_line(
        "Occupancy",
        format!(
            "{} ({}/{} units)",
            format_percent(metrics.occupancy_rate),
            inputs.occupancy.occupied,
            inputs.occupancy.total
        ),
    ));
    output.push('\n');
    output
}

/// `brackets_configured` distinguishes "no brackets" from "no income in any bracket"
pub fn format_tax_report(report: &TaxReport, brackets_configured: bool, symbol: &str) -> String {
    #[derive(Tabled)]
    struct BracketRow {
        #[tabled(rename = "Bracket")]
        range: String,
        #[tabled(rename = "Rate")]
        rate: String,
        #[tabled(rename = "Taxed Amount")]
        taxed: String,
        #[tabled(rename = "Tax")]
        tax: String,
    }

    let income = &report.income;
    let liability = &report.liability;

    let mut output = format!(
        "\n{} {} - Tax Report {}\n",
        "📄".cyan().bold(),
        report.property_name.bold(),
        report.year
    );

    output.push_str(&summary_line("Gross income", format_currency_with(income.gross_income, symbol)));
    output.push_str(&summary_line("Total expenses", format_currency_with(income.total_expenses, symbol)));
    output.push_str(&summary_line("Deductible expenses", format_currency_with(income.deductible_expenses, symbol)));
    output.push_str(&summary_line("Taxable income", signed_money(income.taxable_income, symbol)));
    output.push('\n');

    if !report.deductions_by_category.is_empty() {
        output.push_str(&format!("\n{}\n", "Deductions by category".bold()));
        output.push_str(&format_category_table(&report.deductions_by_category, symbol));
        output.push('\n');
    }

    if !brackets_configured {
        output.push_str(&format!(
            "\n{} No tax brackets configured; liability is zero\n",
            "ℹ".blue().bold()
        ));
    } else if liability.brackets.is_empty() {
        output.push_str(&format!(
            "\n{} No taxable income falls into any bracket\n",
            "ℹ".blue().bold()
        ));
    } else {
        let rows: Vec<BracketRow> = liability
            .brackets
            .iter()
            .map(|b| BracketRow {
                range: match b.upper {
                    Some(upper) => format!(
                        "{} - {}",
                        format_currency_with(b.lower, symbol),
                        format_currency_with(upper, symbol)
                    ),
                    None => format!("{}+", format_currency_with(b.lower, symbol)),
                },
                rate: format_percent(b.rate * Decimal::ONE_HUNDRED),
                taxed: format_currency_with(b.taxed_amount, symbol),
                tax: format_currency_with(b.tax, symbol),
            })
            .collect();

        let mut table = Table::new(&rows);
        table.with(Style::rounded());
        table.modify(Columns::new(1..), Alignment::right());
        output.push_str(&format!("\n{}\n", table));
    }

    output.push_str(&format!("\n{} Liability", "━".repeat(60).bright_black()));
    output.push_str(&summary_line(
        "Total tax",
        format_currency_with(liability.total_tax.round_dp(2), symbol).yellow().bold().to_string(),
    ));
    output.push_str(&summary_line("Effective rate", format_percent(liability.effective_rate)));
    output.push_str(&summary_line("Marginal rate", format_percent(liability.marginal_rate)));
    output.push('\n');
    output
}

pub fn format_comparison(comparison: &MultiYearComparison, symbol: &str) -> String {
    #[derive(Tabled)]
    struct YearRow {
        #[tabled(rename = "Year")]
        year: i32,
        #[tabled(rename = "Income")]
        income: String,
        #[tabled(rename = "Δ Income")]
        income_change: String,
        #[tabled(rename = "Expenses")]
        expenses: String,
        #[tabled(rename = "Δ Expenses")]
        expense_change: String,
        #[tabled(rename = "Taxable")]
        taxable: String,
        #[tabled(rename = "Δ Taxable")]
        taxable_change: String,
        #[tabled(rename = "Tax")]
        tax: String,
        #[tabled(rename = "Eff. Rate")]
        effective_rate: String,
    }

    let rows: Vec<YearRow> = comparison
        .years
        .iter()
        .map(|y| YearRow {
            year: y.year,
            income: format_currency_with(y.income, symbol),
            income_change: signed_percent(y.income_change_pct),
            expenses: format_currency_with(y.expenses, symbol),
            expense_change: signed_percent(y.expense_change_pct),
            taxable: signed_money(y.taxable_income, symbol),
            taxable_change: signed_percent(y.taxable_income_change_pct),
            tax: format_currency_with(y.tax_liability.round_dp(2), symbol),
            effective_rate: format_percent(y.effective_rate),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());

    format!(
        "\n{} {} - Tax Comparison {}-{}\n\n{}\n",
        "📊".cyan().bold(),
        comparison.property_name.bold(),
        comparison.from_year,
        comparison.to_year,
        table
    )
}

/// Format empty ledger message
pub fn format_no_transactions(property: &str) -> String {
    format!(
        "{} No transactions found for {}\nAdd entries with: {} transactions add, or {} import <property> <file>\n",
        "ℹ".blue().bold(),
        property.bold(),
        "rentbook".bold(),
        "rentbook".bold()
    )
}
