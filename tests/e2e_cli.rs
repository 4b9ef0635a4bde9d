use assert_cmd::prelude::*;
use predicates::prelude::*;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use cli_helpers::*;

fn setup_temp_home() -> TempDir {
    TempDir::new().expect("failed to create temp home")
}

#[test]
fn property_list_empty_db_no_color_when_piped() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["property", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No properties yet"))
        .stdout(predicate::str::contains("\u{001b}[").not());

    assert!(db_path(&home).exists(), "ledger is created on first use");
}

#[test]
fn db_flag_overrides_default_location() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["--db", "custom.db", "category", "list"])
        .assert()
        .success();

    assert!(home.path().join("custom.db").exists());
    assert!(!db_path(&home).exists());
}

#[test]
fn monthly_report_january_example() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();
    add_transaction(&home, "income", "Rent", "1000", "2024-01-05").unwrap();
    add_transaction(&home, "expense", "Repairs", "400", "2024-01-18").unwrap();

    let report = run_cmd_json(&home, &["report", "monthly", PROPERTY, "2024"]).unwrap();
    let months = report["months"].as_array().unwrap();
    assert_eq!(months.len(), 12);

    let january = &months[0];
    assert_eq!(january["month_name"], "January");
    assert_eq!(json_decimal(&january["income"]), dec!(1000));
    assert_eq!(json_decimal(&january["expenses"]), dec!(400));
    assert_eq!(json_decimal(&january["net_operating_income"]), dec!(600));
    assert_eq!(json_decimal(&months[1]["income"]), dec!(0));

    assert_eq!(json_decimal(&report["totals"]["income"]), dec!(1000));
}

#[test]
fn financing_costs_reduce_cash_flow_only() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();
    add_transaction(&home, "income", "Rent", "2000", "2024-03-01").unwrap();
    add_transaction(&home, "expense", "Mortgage", "800", "2024-03-02").unwrap();

    let report = run_cmd_json(&home, &["report", "monthly", PROPERTY, "2024-03"]).unwrap();
    let totals = &report["totals"];
    assert_eq!(json_decimal(&totals["net_operating_income"]), dec!(2000));
    assert_eq!(json_decimal(&totals["financing_costs"]), dec!(800));
    assert_eq!(json_decimal(&totals["cash_flow"]), dec!(1200));
}

#[test]
fn transactions_inherit_category_deductibility() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();

    let inherited = add_transaction(&home, "expense", "Repairs", "120", "2024-02-01").unwrap();
    assert_eq!(inherited["is_tax_deductible"], true);

    let forced = run_cmd_json(
        &home,
        &[
            "transactions", "add", PROPERTY, "--type", "expense", "--category", "Repairs",
            "--amount", "80", "--date", "2024-02-02", "--not-deductible",
        ],
    )
    .unwrap();
    assert_eq!(forced["is_tax_deductible"], false);
}

#[test]
fn transaction_type_must_match_category() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();

    base_cmd(&home)
        .args([
            "transactions", "add", PROPERTY, "--type", "income", "--category", "Repairs",
            "--amount", "10", "--date", "2024-01-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot use"));
}

#[test]
fn tax_report_with_brackets_and_export() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();
    add_transaction(&home, "income", "Rent", "20000", "2024-06-01").unwrap();
    add_transaction(&home, "expense", "Repairs", "5000", "2024-07-01").unwrap();
    let brackets = write_brackets(&home).unwrap();
    let brackets = brackets.to_str().unwrap();

    let report = run_cmd_json(
        &home,
        &["tax", "report", PROPERTY, "2024", "--brackets", brackets, "--export"],
    )
    .unwrap();
    assert_eq!(json_decimal(&report["taxable_income"]), dec!(15000));
    assert_eq!(json_decimal(&report["total_tax"]), dec!(2000));
    assert_eq!(json_decimal(&report["effective_rate"]), dec!(13.33));

    let exported = home.path().join("tax_report_maple_duplex_2024.csv");
    let csv = std::fs::read_to_string(exported).expect("export file written");
    assert!(csv.contains("liability,total_tax,2000.00"));
}

#[test]
fn tax_report_without_brackets_has_zero_liability() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();
    add_transaction(&home, "income", "Rent", "9000", "2023-05-01").unwrap();

    base_cmd(&home)
        .args(["tax", "report", PROPERTY, "2023"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tax brackets configured"))
        .stdout(predicate::str::contains("$9,000.00"));
}

#[test]
fn config_file_supplies_brackets_and_currency() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();
    add_transaction(&home, "income", "Rent", "15000", "2024-01-01").unwrap();

    let config = home.path().join("rentbook.toml");
    std::fs::write(
        &config,
        "currency_symbol = \"€\"\n\n[[tax_brackets]]\nlower = \"0\"\nrate = \"0.10\"\n",
    )
    .unwrap();

    base_cmd(&home)
        .args(["--config", config.to_str().unwrap(), "tax", "report", PROPERTY, "2024"])
        .assert()
        .success()
        .stdout(predicate::str::contains("€1,500.00"));
}

#[test]
fn tax_compare_reports_year_over_year_changes() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();
    add_transaction(&home, "income", "Rent", "10000", "2022-04-01").unwrap();
    add_transaction(&home, "income", "Rent", "12000", "2023-04-01").unwrap();
    add_transaction(&home, "expense", "Repairs", "1000", "2023-05-01").unwrap();

    let comparison = run_cmd_json(&home, &["tax", "compare", PROPERTY, "2021", "2023"]).unwrap();
    let years = comparison["years"].as_array().unwrap();
    assert_eq!(years.len(), 3);
    // 2021 has no income: the change into 2022 is reported as 0%
    assert_eq!(json_decimal(&years[1]["income_change_pct"]), dec!(0));
    assert_eq!(json_decimal(&years[2]["income_change_pct"]), dec!(20));
    assert_eq!(json_decimal(&years[2]["taxable_income"]), dec!(11000));
}

#[test]
fn tax_compare_rejects_inverted_years() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();

    base_cmd(&home)
        .args(["tax", "compare", PROPERTY, "2024", "2023"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation error"));
}

#[test]
fn unknown_property_fails_with_not_found() {
    let home = setup_temp_home();

    base_cmd(&home)
        .args(["report", "monthly", "Nowhere", "2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn performance_report_metrics() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();
    add_transaction(&home, "investment", "Down Payment", "50000", "2020-01-01").unwrap();
    add_transaction(&home, "income", "Rent", "12000", "2024-02-01").unwrap();
    add_transaction(&home, "expense", "Repairs", "2000", "2024-03-01").unwrap();
    run_cmd(&home, &["property", "value", PROPERTY, "250000", "--date", "2024-12-31"]).unwrap();

    let report = run_cmd_json(&home, &["report", "performance", PROPERTY]).unwrap();
    assert_eq!(report["year"], 2024);

    let metrics = &report["metrics"];
    assert_eq!(json_decimal(&metrics["appreciation"]), dec!(50000));
    assert_eq!(json_decimal(&metrics["appreciation_percentage"]), dec!(25));
    // 10,000 NOI on a 250,000 valuation
    assert_eq!(json_decimal(&metrics["cap_rate"]), dec!(4));
    // 10,000 cash flow on 50,000 invested
    assert_eq!(json_decimal(&metrics["cash_on_cash_return"]), dec!(20));
    assert_eq!(json_decimal(&metrics["occupancy_rate"]), dec!(50));
}

#[test]
fn import_csv_dry_run_then_real() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();

    let csv_path = home.path().join("ledger.csv");
    std::fs::write(
        &csv_path,
        "date,type,category,amount,unit,notes\n\
         2024-01-05,income,Rent,1500,A,January rent\n\
         2024-01-20,expense,Repairs,300,,Faucet\n\
         2024-02-05,income,Rent,1500,A,\n\
         2024-02-10,expense,Landscaping,50,,\n",
    )
    .unwrap();
    let csv_path = csv_path.to_str().unwrap();

    let preview = run_cmd_json(&home, &["import", PROPERTY, csv_path, "--dry-run"]).unwrap();
    assert_eq!(preview["dry_run"], true);
    assert_eq!(preview["parsed"], 4);
    let listed = run_cmd_json(&home, &["transactions", "list", PROPERTY]).unwrap();
    assert!(listed.as_array().unwrap().is_empty(), "dry run saves nothing");

    let first = run_cmd_json(&home, &["import", PROPERTY, csv_path]).unwrap();
    assert_eq!(first["imported"], 3);
    assert_eq!(first["errors"], 1);

    let second = run_cmd_json(&home, &["import", PROPERTY, csv_path]).unwrap();
    assert_eq!(second["imported"], 0);
    assert_eq!(second["skipped_duplicates"], 3);

    let report = run_cmd_json(&home, &["report", "categories", PROPERTY, "2024"]).unwrap();
    let categories = report["categories"].as_array().unwrap();
    let rent = categories
        .iter()
        .find(|c| c["name"] == "Rent")
        .expect("rent category");
    assert_eq!(json_decimal(&rent["total"]), dec!(3000));
    assert_eq!(json_decimal(&rent["percentage"]), dec!(100));
    assert_eq!(rent["transaction_count"], 2);
}

#[test]
fn unit_occupancy_toggle() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();

    let units = run_cmd_json(&home, &["unit", "list", PROPERTY]).unwrap();
    let unit_b = units
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["name"] == "B")
        .unwrap();
    let id = unit_b["id"].as_i64().unwrap().to_string();

    run_cmd(&home, &["unit", "occupancy", &id, "true"]).unwrap();

    let units = run_cmd_json(&home, &["unit", "list", PROPERTY]).unwrap();
    assert!(units
        .as_array()
        .unwrap()
        .iter()
        .all(|u| u["is_occupied"] == true));
}

#[test]
fn import_semicolon_csv_with_decimal_commas_and_repeated_rows() {
    let home = setup_temp_home();
    setup_ledger(&home).unwrap();

    let csv_path = home.path().join("extrato.csv");
    std::fs::write(
        &csv_path,
        "date;type;category;amount\n\
         2024-03-01;income;Rent;1.250,50\n\
         2024-03-09;expense;Repairs;50,00\n\
         2024-03-09;expense;Repairs;50,00\n",
    )
    .unwrap();

    let stats = run_cmd_json(&home, &["import", PROPERTY, csv_path.to_str().unwrap()]).unwrap();
    assert_eq!(stats["imported"], 3);
    assert_eq!(stats["skipped_duplicates"], 0);

    let report = run_cmd_json(&home, &["report", "monthly", PROPERTY, "2024-03"]).unwrap();
    assert_eq!(json_decimal(&report["totals"]["income"]), dec!(1250.50));
    assert_eq!(json_decimal(&report["totals"]["expenses"]), dec!(100));
}
