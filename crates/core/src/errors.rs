//! Core error types for the reconciliation engine.
//!
//! This module defines storage-agnostic error types. Adapter-specific errors
//! are converted to these types by the storage layer.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
///
/// Every failure is returned for a single operation; nothing here is fatal to
/// the process.
#[derive(Error, Debug)]
pub enum Error {
    /// A referenced aggregate or embedded entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The requested state change is not permitted from the current state.
    #[error("Invalid transition for {aggregate_id}: {from} -> {to}")]
    InvalidTransition {
        aggregate_id: String,
        from: String,
        to: String,
    },

    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// The cross-aggregate step of a payment completion failed and the
    /// transaction was rolled back.
    #[error("Reconciliation of payment {payment_id} into budget item {budget_item_id} failed: {reason}")]
    ReconciliationFailure {
        payment_id: String,
        budget_item_id: String,
        reason: String,
    },

    /// The aggregate changed since it was loaded.
    #[error("{entity} '{id}' was modified concurrently (expected version {expected}, found {found})")]
    ConcurrencyConflict {
        entity: &'static str,
        id: String,
        expected: i64,
        found: i64,
    },

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_transition(
        aggregate_id: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Error::InvalidTransition {
            aggregate_id: aggregate_id.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn business_rule(reason: impl Into<String>) -> Self {
        Error::BusinessRuleViolation(reason.into())
    }

    /// Stable snake_case name of the error kind, for API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::BusinessRuleViolation(_) => "business_rule_violation",
            Error::ReconciliationFailure { .. } => "reconciliation_failure",
            Error::ConcurrencyConflict { .. } => "concurrency_conflict",
            Error::Validation(_) => "validation",
            Error::Database(_) => "database",
            Error::Unexpected(_) => "unexpected",
        }
    }

    /// Whether the caller may retry the same operation after re-fetching state.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ConcurrencyConflict { .. } | Error::ReconciliationFailure { .. } => true,
            Error::Database(db) => matches!(
                db,
                DatabaseError::TransactionFailed(_) | DatabaseError::Unavailable(_)
            ),
            _ => false,
        }
    }
}

/// Storage-agnostic error type for persistence operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// A query or command against the store failed.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// A stored row could not be decoded or failed validation on load.
    #[error("Stored record is corrupted: {0}")]
    Corrupted(String),

    /// A transaction could not be committed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The store is not accepting work (writer stopped, pool closed).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for caller input and decoded data.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Amount for '{field}' must not be negative, got {value}")]
    NegativeAmount { field: String, value: String },

    #[error("Amount for '{0}' is outside the supported decimal range")]
    AmountOverflow(String),

    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),

    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Database(DatabaseError::Corrupted(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
