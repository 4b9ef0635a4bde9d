use anyhow::{anyhow, Context, Result};
use chrono::Local;
use colored::Colorize;
use rust_decimal::Decimal;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use super::{find_property, print_json, AppContext};
use crate::cli::{CategoryCommands, PropertyCommands, UnitCommands};
use rentbook::db::{self, Category, CategoryType, Property, Unit};
use rentbook::reports::period::parse_date;
use rentbook::utils::format_currency_with;

pub fn dispatch_property(action: &PropertyCommands, ctx: &AppContext) -> Result<()> {
    match action {
        PropertyCommands::Add {
            name,
            price,
            date,
            address,
        } => dispatch_property_add(name, price, date, address.as_deref(), ctx),
        PropertyCommands::List => dispatch_property_list(ctx),
        PropertyCommands::Value {
            property,
            value,
            date,
        } => dispatch_property_value(property, value, date.as_deref(), ctx),
    }
}

pub fn dispatch_unit(action: &UnitCommands, ctx: &AppContext) -> Result<()> {
    match action {
        UnitCommands::Add {
            property,
            name,
            occupied,
        } => dispatch_unit_add(property, name, *occupied, ctx),
        UnitCommands::List { property } => dispatch_unit_list(property, ctx),
        UnitCommands::Occupancy { unit_id, occupied } => {
            dispatch_unit_occupancy(*unit_id, *occupied, ctx)
        }
    }
}

pub fn dispatch_category(action: &CategoryCommands, ctx: &AppContext) -> Result<()> {
    match action {
        CategoryCommands::Add {
            name,
            category_type,
            deductible,
            financing,
        } => dispatch_category_add(name, category_type, *deductible, *financing, ctx),
        CategoryCommands::List => dispatch_category_list(ctx),
    }
}

pub(super) fn parse_money(value: &str, what: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(value.trim())
        .with_context(|| format!("Invalid {}. Must be a decimal number", what))?;
    if amount < Decimal::ZERO {
        return Err(anyhow!("{} cannot be negative", what));
    }
    Ok(amount)
}

fn dispatch_property_add(
    name: &str,
    price: &str,
    date: &str,
    address: Option<&str>,
    ctx: &AppContext,
) -> Result<()> {
    let property = Property {
        id: None,
        name: name.trim().to_string(),
        address: address.map(|s| s.to_string()),
        purchase_price: parse_money(price, "purchase price")?,
        purchase_date: parse_date(date)?,
        current_value: None,
        valuation_date: None,
    };
    if property.name.is_empty() {
        return Err(anyhow!("Property name cannot be empty"));
    }

    let conn = ctx.open_ledger()?;
    if db::get_property_by_name(&conn, &property.name)?.is_some() {
        return Err(anyhow!("Property '{}' already exists", property.name));
    }
    let id = db::insert_property(&conn, &property)?;
    info!("Added property {} ({})", property.name, id);

    if ctx.json {
        return print_json(&serde_json::json!({ "id": id, "name": property.name }));
    }
    println!(
        "{} Added property {} (id {})",
        "✓".green().bold(),
        property.name.bold(),
        id
    );
    Ok(())
}

fn dispatch_property_list(ctx: &AppContext) -> Result<()> {
    let conn = ctx.open_ledger()?;
    let properties = db::list_properties(&conn)?;

    if ctx.json {
        return print_json(&properties);
    }
    if properties.is_empty() {
        println!(
            "{} No properties yet. Add one with: {} property add <name> --price <p> --date <YYYY-MM-DD>",
            "ℹ".blue().bold(),
            "rentbook".bold()
        );
        return Ok(());
    }

    #[derive(Tabled)]
    struct PropertyRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Purchased")]
        purchased: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Valued On")]
        valued_on: String,
    }

    let symbol = ctx.currency_symbol();
    let rows: Vec<PropertyRow> = properties
        .iter()
        .map(|p| PropertyRow {
            id: p.id.unwrap_or_default(),
            name: p.name.clone(),
            purchased: p.purchase_date.to_string(),
            price: format_currency_with(p.purchase_price, symbol),
            value: format_currency_with(p.effective_value(), symbol),
            valued_on: p
                .valuation_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn dispatch_property_value(
    key: &str,
    value: &str,
    date: Option<&str>,
    ctx: &AppContext,
) -> Result<()> {
    let value = parse_money(value, "value")?;
    let valuation_date = match date {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };

    let conn = ctx.open_ledger()?;
    let (property, id) = find_property(&conn, key)?;
    if valuation_date < property.purchase_date {
        return Err(anyhow!(
            "Valuation date {} is before the purchase date {}",
            valuation_date,
            property.purchase_date
        ));
    }
    db::update_property_valuation(&conn, id, value, valuation_date)?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "id": id,
            "current_value": value,
            "valuation_date": valuation_date,
        }));
    }
    println!(
        "{} {} valued at {} on {}",
        "✓".green().bold(),
        property.name.bold(),
        format_currency_with(value, ctx.currency_symbol()),
        valuation_date
    );
    Ok(())
}

fn dispatch_unit_add(key: &str, name: &str, occupied: bool, ctx: &AppContext) -> Result<()> {
    let conn = ctx.open_ledger()?;
    let (property, property_id) = find_property(&conn, key)?;

    let unit = Unit {
        id: None,
        property_id,
        name: name.trim().to_string(),
        is_occupied: occupied,
    };
    let id = db::insert_unit(&conn, &unit)?;

    if ctx.json {
        return print_json(&serde_json::json!({ "id": id, "property_id": property_id, "name": unit.name }));
    }
    println!(
        "{} Added unit {} to {} (id {})",
        "✓".green().bold(),
        unit.name.bold(),
        property.name,
        id
    );
    Ok(())
}

fn dispatch_unit_list(key: &str, ctx: &AppContext) -> Result<()> {
    let conn = ctx.open_ledger()?;
    let (property, property_id) = find_property(&conn, key)?;
    let units = db::list_units(&conn, property_id)?;

    if ctx.json {
        return print_json(&units);
    }
    if units.is_empty() {
        println!("{} {} has no units", "ℹ".blue().bold(), property.name);
        return Ok(());
    }

    #[derive(Tabled)]
    struct UnitRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Unit")]
        name: String,
        #[tabled(rename = "Occupied")]
        occupied: String,
    }

    let rows: Vec<UnitRow> = units
        .iter()
        .map(|u| UnitRow {
            id: u.id.unwrap_or_default(),
            name: u.name.clone(),
            occupied: if u.is_occupied { "yes" } else { "no" }.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn dispatch_unit_occupancy(unit_id: i64, occupied: bool, ctx: &AppContext) -> Result<()> {
    let conn = ctx.open_ledger()?;
    db::set_unit_occupancy(&conn, unit_id, occupied)?;

    if ctx.json {
        return print_json(&serde_json::json!({ "id": unit_id, "is_occupied": occupied }));
    }
    let state = if occupied { "occupied" } else { "vacant" };
    println!("{} Unit {} marked {}", "✓".green().bold(), unit_id, state);
    Ok(())
}

fn dispatch_category_add(
    name: &str,
    category_type: &str,
    deductible: bool,
    financing: bool,
    ctx: &AppContext,
) -> Result<()> {
    let category_type = CategoryType::from_str(category_type)
        .map_err(|_| anyhow!("Category type must be 'income' or 'expense'"))?;
    if financing && category_type != CategoryType::Expense {
        return Err(anyhow!("Only expense categories can hold financing costs"));
    }

    let category = Category {
        id: None,
        name: name.trim().to_string(),
        category_type,
        is_tax_deductible: deductible,
        is_financing: financing,
    };

    let conn = ctx.open_ledger()?;
    if db::get_category_by_name(&conn, &category.name)?.is_some() {
        return Err(anyhow!("Category '{}' already exists", category.name));
    }
    let id = db::insert_category(&conn, &category)?;

    if ctx.json {
        return print_json(&serde_json::json!({ "id": id, "name": category.name }));
    }
    println!(
        "{} Added {} category {} (id {})",
        "✓".green().bold(),
        category_type.as_str().to_lowercase(),
        category.name.bold(),
        id
    );
    Ok(())
}

fn dispatch_category_list(ctx: &AppContext) -> Result<()> {
    let conn = ctx.open_ledger()?;
    let categories = db::list_categories(&conn)?;

    if ctx.json {
        return print_json(&categories);
    }
    if categories.is_empty() {
        println!(
            "{} No categories yet. Add one with: {} category add <name> --type income|expense",
            "ℹ".blue().bold(),
            "rentbook".bold()
        );
        return Ok(());
    }

    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Type")]
        category_type: &'static str,
        #[tabled(rename = "Deductible")]
        deductible: &'static str,
        #[tabled(rename = "Financing")]
        financing: &'static str,
    }

    let flag = |b: bool| if b { "yes" } else { "-" };
    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id.unwrap_or_default(),
            name: c.name.clone(),
            category_type: c.category_type.as_str(),
            deductible: flag(c.is_tax_deductible),
            financing: flag(c.is_financing),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}
