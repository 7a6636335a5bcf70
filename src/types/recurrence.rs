//! Recurrence descriptor types
//!
//! A pattern is a rule — day anchors, time of day, active date range — that
//! implicitly describes many future occurrences. It is never expanded into
//! concrete dates here; materialization belongs to the recurring-booking
//! service.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Recurrence cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Declarative recurring schedule.
///
/// Anchor days are canonical 1 (Monday) – 7 (Sunday) for weekly patterns and
/// calendar days 1–31 for monthly ones; the `BTreeSet` keeps them sorted and
/// unique. `time_of_day` stays `None` until the customer picks a time — a
/// pattern is only bookable once `services::recurrence::validate` passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub anchor_days: BTreeSet<u32>,
    pub time_of_day: Option<NaiveTime>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl RecurrencePattern {
    /// New pattern with no days and no time selected yet.
    pub fn new(frequency: Frequency, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            frequency,
            anchor_days: BTreeSet::new(),
            time_of_day: None,
            start_date,
            end_date,
        }
    }
}
