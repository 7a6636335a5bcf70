//! Time point validation and set editing
//!
//! Every candidate timestamp — whether typed in directly or produced by
//! duplicate-shift — goes through `TimePointPlanner::validate`, so the two
//! paths cannot drift apart as rules evolve. `now` is always an explicit
//! parameter; the planner holds no clock.

use chrono::{Duration, NaiveDateTime};

use crate::config::BookingRules;
use crate::error::ValidationError;
use crate::types::TimePointSet;

/// Applies scheduling rules to candidate occurrences and edits the chosen
/// set on the customer's behalf.
#[derive(Debug, Clone)]
pub struct TimePointPlanner {
    rules: BookingRules,
}

impl TimePointPlanner {
    pub fn new(rules: BookingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    /// Check one candidate against lead time and business hours.
    ///
    /// `FutureViolation` when the candidate is not strictly later than
    /// `now + lead_time`; `BusinessHoursViolation` when its time of day is
    /// outside the service window.
    pub fn validate(
        &self,
        candidate: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), ValidationError> {
        if candidate <= now + self.rules.lead_time() {
            return Err(ValidationError::FutureViolation);
        }
        if !self.rules.business_hours.contains(candidate.time()) {
            return Err(ValidationError::BusinessHoursViolation);
        }
        Ok(())
    }

    /// Validate and insert, keeping ascending order. `Duplicate` when the
    /// exact timestamp is already chosen; the set is left unchanged on any
    /// error.
    pub fn add(
        &self,
        set: &mut TimePointSet,
        candidate: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), ValidationError> {
        self.validate(candidate, now)?;
        if !set.insert(candidate) {
            return Err(ValidationError::Duplicate);
        }
        Ok(())
    }

    /// Remove if present. Absent candidates are a no-op, not an error.
    pub fn remove(&self, set: &mut TimePointSet, candidate: NaiveDateTime) {
        set.remove(candidate);
    }

    /// Copy an existing occurrence `delta_days` away and add the copy,
    /// re-running the full validation. Returns the shifted timestamp.
    pub fn duplicate_shift(
        &self,
        set: &mut TimePointSet,
        source: NaiveDateTime,
        delta_days: i64,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime, ValidationError> {
        let shifted = source + Duration::days(delta_days);
        self.add(set, shifted, now)?;
        Ok(shifted)
    }
}
