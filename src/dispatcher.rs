//! Command dispatcher that routes parsed clap commands to their handlers.
//!
//! Handlers open the ledger, call the reporting engine through a
//! [`SqliteStore`](rentbook::SqliteStore), and print either tables or JSON.

mod imports;
mod ledger;
mod reports;
mod tax;
mod transactions;

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::Commands;
use rentbook::config::{self, Config};
use rentbook::db::{self, Property};
use rentbook::tax::TaxBracket;

/// Per-invocation settings shared by every handler
pub struct AppContext {
    pub db_path: Option<PathBuf>,
    pub config: Config,
    pub json: bool,
}

impl AppContext {
    /// `--db` wins over the configured database
    pub fn new(db_override: Option<PathBuf>, config: Config, json: bool) -> Self {
        let db_path = db_override.or_else(|| config.database.clone());
        Self {
            db_path,
            config,
            json,
        }
    }

    /// Create the ledger if needed and open it
    pub fn open_ledger(&self) -> Result<Connection> {
        db::init_database(self.db_path.clone())?;
        db::open_db(self.db_path.clone())
    }

    pub fn currency_symbol(&self) -> &str {
        self.config.currency_symbol()
    }

    /// Brackets from an explicit file, else the configured ones
    pub fn tax_brackets(&self, file: Option<&Path>) -> Result<Vec<TaxBracket>> {
        match file {
            Some(path) => config::load_brackets_file(path),
            None => Ok(self.config.tax_brackets.clone()),
        }
    }
}

/// Route a parsed command to its handler
pub fn dispatch_command(command: &Commands, ctx: &AppContext) -> Result<()> {
    match command {
        Commands::Property { action } => ledger::dispatch_property(action, ctx),
        Commands::Unit { action } => ledger::dispatch_unit(action, ctx),
        Commands::Category { action } => ledger::dispatch_category(action, ctx),
        Commands::Transactions { action } => transactions::dispatch_transactions(action, ctx),
        Commands::Import {
            property,
            file,
            dry_run,
        } => imports::dispatch_import(property, file, *dry_run, ctx),
        Commands::Report { action } => reports::dispatch_report(action, ctx),
        Commands::Tax { action } => tax::dispatch_tax(action, ctx),
    }
}

/// Look up a property by id or name, returning it with its row id
fn find_property(conn: &Connection, key: &str) -> Result<(Property, i64)> {
    let property = db::resolve_property(conn, key)?;
    let id = property
        .id
        .ok_or_else(|| anyhow!("Property '{}' has no id", property.name))?;
    Ok((property, id))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
