//! Recurrence pattern building and validation
//!
//! Builds well-formed recurrence descriptors from wizard input. Patterns are
//! never expanded into concrete dates here — materialization is the
//! recurring-booking service's job.

use std::collections::{BTreeSet, HashMap};

use chrono::Datelike;
use once_cell::sync::Lazy;

use crate::config::BookingRules;
use crate::error::ValidationError;
use crate::types::RecurrencePattern;

/// Quick-pick weekly presets, keyed by wizard template name.
static WEEKLY_TEMPLATES: Lazy<HashMap<&'static str, &'static [u32]>> = Lazy::new(|| {
    HashMap::from([
        ("weekdays", &[1u32, 2, 3, 4, 5][..]),
        ("weekend", &[6u32, 7][..]),
        ("every_day", &[1u32, 2, 3, 4, 5, 6, 7][..]),
    ])
});

/// Look up a weekly preset by name. Returns `None` for unknown names.
pub fn from_weekly_template(name: &str) -> Option<BTreeSet<u32>> {
    WEEKLY_TEMPLATES
        .get(name)
        .map(|days| days.iter().copied().collect())
}

/// Flip one day's membership in the anchor set. The `BTreeSet` keeps the
/// remaining days sorted.
pub fn toggle_day(pattern: &mut RecurrencePattern, day: u32) {
    if !pattern.anchor_days.remove(&day) {
        pattern.anchor_days.insert(day);
    }
}

/// Convert a 0-based Sunday-first weekday index (what browser `Date`
/// objects produce) to canonical 1 (Monday) – 7 (Sunday).
///
/// Sunday arrives as 0 and must become 7 — without this remap the whole
/// schedule silently shifts by one day. Indices 1–7 pass through unchanged.
pub fn normalize_weekday(js_weekday: u32) -> u32 {
    if js_weekday == 0 {
        7
    } else {
        js_weekday
    }
}

/// Canonical weekday index (1–7) of a calendar date.
pub fn weekday_of(date: chrono::NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}

/// Check a pattern is complete and well-formed: at least one anchor day, a
/// forward date range, a selected time of day inside business hours.
pub fn validate(pattern: &RecurrencePattern, rules: &BookingRules) -> Result<(), ValidationError> {
    if pattern.anchor_days.is_empty() {
        return Err(ValidationError::EmptyDays);
    }
    if pattern.end_date <= pattern.start_date {
        return Err(ValidationError::InvalidRange);
    }
    let time_of_day = pattern.time_of_day.ok_or(ValidationError::MissingTime)?;
    if !rules.business_hours.contains(time_of_day) {
        return Err(ValidationError::BusinessHoursViolation);
    }
    Ok(())
}
