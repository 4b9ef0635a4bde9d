use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "rentbook")]
#[command(version, about = "Rental property financial and tax reporting")]
#[command(
    long_about = "Keep a ledger of rental property income and expenses, then report monthly cash flow, category breakdowns, performance metrics (cap rate, cash-on-cash, appreciation) and progressive income tax."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Ledger database (default: ~/.rentbook/data.db)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Configuration file (default: $RENTBOOK_CONFIG or ~/.rentbook/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage properties
    Property {
        #[command(subcommand)]
        action: PropertyCommands,
    },

    /// Manage rentable units of a property
    Unit {
        #[command(subcommand)]
        action: UnitCommands,
    },

    /// Manage income/expense categories
    Category {
        #[command(subcommand)]
        action: CategoryCommands,
    },

    /// Manual transaction management
    Transactions {
        #[command(subcommand)]
        action: TransactionCommands,
    },

    /// Import transactions for a property from a CSV file
    Import {
        /// Property id or name
        property: String,

        /// Path to the CSV file (columns: date, type, category, amount, [unit, deductible, paid, notes])
        file: PathBuf,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Financial and performance reports
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },

    /// Taxable income, bracket liability and year comparisons
    Tax {
        #[command(subcommand)]
        action: TaxCommands,
    },
}

#[derive(Subcommand)]
pub enum PropertyCommands {
    /// Register a property
    Add {
        /// Unique property name
        name: String,

        /// Purchase price (e.g., 250000.00)
        #[arg(long)]
        price: String,

        /// Purchase date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Street address
        #[arg(long)]
        address: Option<String>,
    },

    /// List properties
    List,

    /// Record a new market valuation
    Value {
        /// Property id or name
        property: String,

        /// Current market value
        value: String,

        /// Valuation date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UnitCommands {
    /// Add a unit to a property
    Add {
        /// Property id or name
        property: String,

        /// Unit name (e.g., 1A)
        name: String,

        /// Mark the unit as currently occupied
        #[arg(long)]
        occupied: bool,
    },

    /// List units of a property
    List {
        /// Property id or name
        property: String,
    },

    /// Set whether a unit is occupied
    Occupancy {
        /// Unit id
        unit_id: i64,

        /// Occupancy state
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        occupied: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a category
    Add {
        /// Unique category name
        name: String,

        /// Category type: income or expense
        #[arg(short = 't', long = "type")]
        category_type: String,

        /// Expenses in this category are tax deductible by default
        #[arg(long)]
        deductible: bool,

        /// Category holds financing costs (mortgage interest/principal)
        #[arg(long)]
        financing: bool,
    },

    /// List categories
    List,
}

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a manual transaction
    Add {
        /// Property id or name
        property: String,

        /// Transaction type: income, expense, investment, transfer
        #[arg(short = 't', long = "type")]
        transaction_type: String,

        /// Category name
        #[arg(short, long)]
        category: String,

        /// Amount (non-negative; the type carries the direction)
        #[arg(short, long)]
        amount: String,

        /// Transaction date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Unit id within the property
        #[arg(long)]
        unit: Option<i64>,

        /// Force the entry to be tax deductible
        #[arg(long, conflicts_with = "not_deductible")]
        deductible: bool,

        /// Force the entry to be non-deductible
        #[arg(long)]
        not_deductible: bool,

        /// Entry is recorded but not yet paid
        #[arg(long)]
        unpaid: bool,

        /// Recurrence: monthly, quarterly, yearly
        #[arg(long)]
        recurrence: Option<String>,

        /// Last date of the recurrence (YYYY-MM-DD)
        #[arg(long, requires = "recurrence")]
        until: Option<String>,

        /// Optional notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List transactions of a property
    List {
        /// Property id or name
        property: String,

        /// Period: YYYY, YYYY-MM, or from:to (YYYY-MM-DD:YYYY-MM-DD); default all
        period: Option<String>,

        /// Only entries of this unit id
        #[arg(long)]
        unit: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Monthly income, expenses, NOI and cash flow
    Monthly {
        /// Property id or name
        property: String,

        /// Period: YYYY (e.g., 2025), YYYY-MM, or from:to (YYYY-MM-DD:YYYY-MM-DD)
        period: String,

        /// Restrict to one unit id
        #[arg(long)]
        unit: Option<i64>,
    },

    /// Totals and shares per category
    Categories {
        /// Property id or name
        property: String,

        /// Period: YYYY (e.g., 2025), YYYY-MM, or from:to (YYYY-MM-DD:YYYY-MM-DD)
        period: String,

        /// Restrict to one unit id
        #[arg(long)]
        unit: Option<i64>,
    },

    /// Cap rate, cash-on-cash, appreciation and annualized return
    Performance {
        /// Property id or name
        property: String,

        /// Calendar year for annual figures (default: valuation year)
        #[arg(short, long, allow_negative_numbers = true)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum TaxCommands {
    /// Taxable income and bracket liability for a year
    Report {
        /// Property id or name
        property: String,

        /// Tax year (e.g., 2025)
        #[arg(allow_negative_numbers = true)]
        year: i32,

        /// TOML file with [[tax_brackets]] (default: brackets from the configuration)
        #[arg(short, long, value_name = "FILE")]
        brackets: Option<PathBuf>,

        /// Export report to CSV (tax_report_<property>_<year>.csv)
        #[arg(long)]
        export: bool,
    },

    /// Compare tax positions across a range of years
    Compare {
        /// Property id or name
        property: String,

        /// First year
        #[arg(allow_negative_numbers = true)]
        from_year: i32,

        /// Last year
        #[arg(allow_negative_numbers = true)]
        to_year: i32,

        /// TOML file with [[tax_brackets]] (default: brackets from the configuration)
        #[arg(short, long, value_name = "FILE")]
        brackets: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_tax_report_with_globals() {
        let cli = Cli::try_parse_from([
            "rentbook", "--json", "--db", "/tmp/x.db", "tax", "report", "Elm", "2024", "--export",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Commands::Tax {
                action:
                    TaxCommands::Report {
                        property,
                        year,
                        export,
                        brackets,
                    },
            } => {
                assert_eq!(property, "Elm");
                assert_eq!(year, 2024);
                assert!(export);
                assert!(brackets.is_none());
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn deductible_flags_conflict() {
        let result = Cli::try_parse_from([
            "rentbook", "transactions", "add", "Elm", "-t", "expense", "-c", "Repairs", "-a",
            "10", "-d", "2024-01-01", "--deductible", "--not-deductible",
        ]);
        assert!(result.is_err());
    }
}
