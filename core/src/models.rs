use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the catalog and ledger stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("variety '{0}' already exists")]
    DuplicateName(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
}

/// Coarse error classification, used in batch failure reports and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Storage,
    InvalidValue,
    DuplicateName,
    NotFound,
    Conflict,
}

impl StoreError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Sqlite(_) | Self::Csv(_) | Self::Io(_) => ErrorKind::Storage,
            Self::InvalidValue(_) => ErrorKind::InvalidValue,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variety {
    pub id: i64,
    pub name: String,
    pub caffeine_mg: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewVariety {
    pub name: String,
    pub caffeine_mg: i64,
}

/// A consumption entry joined with its variety.
///
/// `caffeine_mg` is the per-cup value read from the catalog at query time,
/// so edits to a variety retroactively change the derived totals of every
/// entry referencing it.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub id: i64,
    pub date: NaiveDate,
    pub cups: i64,
    pub variety_id: i64,
    pub created_at: String,
    // Joined fields for display
    pub variety: String,
    pub caffeine_mg: i64,
}

impl Entry {
    /// Derived, never persisted.
    #[must_use]
    pub const fn total_caffeine(&self) -> i64 {
        self.cups * self.caffeine_mg
    }
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub cups: i64,
    pub variety_id: i64,
}

/// Validate a variety name: must not be blank. Returns the trimmed name.
pub fn validate_variety_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidValue(
            "variety name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_caffeine_mg(caffeine_mg: i64) -> Result<(), StoreError> {
    if caffeine_mg < 0 {
        return Err(StoreError::InvalidValue(format!(
            "caffeine_mg must not be negative (got {caffeine_mg})"
        )));
    }
    Ok(())
}

pub fn validate_cups(cups: i64) -> Result<(), StoreError> {
    if cups < 1 {
        return Err(StoreError::InvalidValue(format!(
            "cups must be at least 1 (got {cups})"
        )));
    }
    Ok(())
}

/// Entries may not be dated in the future relative to `today`.
pub fn validate_entry_date(date: NaiveDate, today: NaiveDate) -> Result<(), StoreError> {
    if date > today {
        return Err(StoreError::InvalidValue(format!(
            "date {date} is in the future"
        )));
    }
    Ok(())
}

/// A single failed row inside a batch operation.
///
/// `row` is a human-readable label ("line 4", "entry 7", a variety name).
#[derive(Debug, Serialize)]
pub struct RowFailure {
    pub row: String,
    pub kind: ErrorKind,
    pub error: String,
}

impl RowFailure {
    #[must_use]
    pub fn new(row: impl Into<String>, error: &StoreError) -> Self {
        Self {
            row: row.into(),
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}

/// Result of a CSV batch import. Rows are attempted independently; one bad
/// row never aborts the rest.
#[derive(Debug, Default, Serialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub failures: Vec<RowFailure>,
}

/// Result of a bulk-edit reconciliation pass.
#[derive(Debug, Default, Serialize)]
pub struct ReconcileOutcome {
    pub deleted: usize,
    pub updated: usize,
    pub inserted: usize,
    pub unchanged: usize,
    pub failures: Vec<RowFailure>,
}

/// Result of a multi-name variety deletion.
#[derive(Debug, Default, Serialize)]
pub struct DeleteOutcome {
    pub deleted: Vec<String>,
    pub failures: Vec<RowFailure>,
}
