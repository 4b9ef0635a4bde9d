//! rentbook - property financial and tax reporting
//!
//! Aggregates a rental property's ledger into monthly summaries, category
//! breakdowns and performance metrics, and computes taxable income and
//! progressive tax liability per year.

pub mod config;
pub mod db;
pub mod error;
pub mod importers;
pub mod reports;
pub mod store;
pub mod tax;
pub mod utils;

pub use error::{ReportError, ReportResult};
pub use store::{MemoryStore, ReportingStore, SqliteStore};
