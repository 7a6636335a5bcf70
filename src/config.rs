//! Scheduling rule configuration
//!
//! Lead time and business hours are configuration, not constants — the same
//! engine serves regions and service families with different rules. One
//! `BookingRules` value is shared by every call site that checks a candidate
//! time (direct add, duplicate-shift, recurrence validation), so the rules
//! cannot drift apart between paths.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Daily window inside which occurrences may be scheduled.
/// Inclusive on both ends: with 08:00–17:00, a 17:00 start is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl BusinessHours {
    pub fn new(opens_at: NaiveTime, closes_at: NaiveTime) -> Self {
        Self { opens_at, closes_at }
    }

    /// Whether `time` falls inside the service window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.opens_at && time <= self.closes_at
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            opens_at: defaults::default_business_open(),
            closes_at: defaults::default_business_close(),
        }
    }
}

/// Scheduling rules for one region/service family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRules {
    /// Minimum gap between "now" and a bookable occurrence, in hours.
    pub lead_time_hours: i64,
    pub business_hours: BusinessHours,
}

impl BookingRules {
    pub fn new(lead_time_hours: i64, business_hours: BusinessHours) -> Self {
        Self {
            lead_time_hours,
            business_hours,
        }
    }

    pub fn lead_time(&self) -> chrono::Duration {
        chrono::Duration::hours(self.lead_time_hours)
    }
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            lead_time_hours: defaults::DEFAULT_LEAD_TIME_HOURS,
            business_hours: BusinessHours::default(),
        }
    }
}
