//! Error handling for rentbook
//!
//! Report generation fails with a typed [`ReportError`] so callers can tell a
//! missing property from a rejected request. Everything else (database,
//! import, CLI) uses `anyhow` for context chaining.

use thiserror::Error;

/// Failures of the reporting engine
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("validation error: {0}")]
    ValidationError(String),

    /// Failure raised by the transaction store, passed through untouched
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ReportError {
    pub fn property_not_found(id: i64) -> Self {
        ReportError::NotFound {
            entity: "property",
            id,
        }
    }

    pub fn unit_not_found(id: i64) -> Self {
        ReportError::NotFound { entity: "unit", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReportError::ValidationError(_))
    }
}

/// Result type alias for application operations
pub type Result<T> = anyhow::Result<T>;

/// Result type alias for reporting engine operations
pub type ReportResult<T> = std::result::Result<T, ReportError>;
