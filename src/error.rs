//! Engine error types
//!
//! Two families: synchronous rule violations raised while the customer edits
//! a draft, and failures on the asynchronous preview path. Both expose a
//! stable machine-readable `code()` so hosts can key remediation messages
//! without matching on display text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rule violation raised synchronously during draft editing.
/// Recovered locally by re-prompting; never reaches the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Candidate is not strictly later than now + lead time
    #[error("occurrence is too soon to book")]
    FutureViolation,
    /// Time of day falls outside the service window
    #[error("occurrence time is outside business hours")]
    BusinessHoursViolation,
    /// Exact timestamp is already in the chosen set
    #[error("this time is already selected")]
    Duplicate,
    /// Recurrence pattern has no anchor days
    #[error("select at least one day")]
    EmptyDays,
    /// Recurrence end date is not after its start date
    #[error("end date must be after start date")]
    InvalidRange,
    /// Recurrence time of day is unset
    #[error("select a time of day")]
    MissingTime,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FutureViolation => "FUTURE_VIOLATION",
            Self::BusinessHoursViolation => "BUSINESS_HOURS_VIOLATION",
            Self::Duplicate => "DUPLICATE",
            Self::EmptyDays => "EMPTY_DAYS",
            Self::InvalidRange => "INVALID_RANGE",
            Self::MissingTime => "MISSING_TIME",
        }
    }
}

/// Failure on the asynchronous preview path. Unlike [`ValidationError`],
/// these surface in the preview state machine, not as early returns — the
/// draft the customer already entered is preserved either way.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum PreviewError {
    /// Default profile address could not be resolved; no preview request
    /// was dispatched.
    #[error("default address could not be resolved")]
    #[serde(rename = "ADDRESS_UNRESOLVED")]
    AddressUnresolved,
    /// Pricing call failed. Carries the server message when one was given,
    /// otherwise the generic fallback.
    #[error("{message}")]
    #[serde(rename = "PREVIEW_FAILED", rename_all = "camelCase")]
    Failed { message: String },
}

impl PreviewError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AddressUnresolved => "ADDRESS_UNRESOLVED",
            Self::Failed { .. } => "PREVIEW_FAILED",
        }
    }
}
