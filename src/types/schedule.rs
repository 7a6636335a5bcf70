//! Chosen occurrence time points

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Ascending, deduplicated set of chosen occurrence timestamps.
///
/// Created empty; grows via `insert`, shrinks via `remove`. The ordering and
/// uniqueness invariants hold at all times — deserialization normalizes, and
/// the fields are private so nothing can bypass `insert`. Callers editing a
/// draft normally go through `TimePointPlanner`, which validates candidates
/// against the booking rules before inserting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<NaiveDateTime>", into = "Vec<NaiveDateTime>")]
pub struct TimePointSet {
    points: Vec<NaiveDateTime>,
}

impl TimePointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, point: NaiveDateTime) -> bool {
        self.points.binary_search(&point).is_ok()
    }

    /// Insert keeping ascending order. Returns `false` if the exact
    /// timestamp is already present (the set is unchanged).
    pub fn insert(&mut self, point: NaiveDateTime) -> bool {
        match self.points.binary_search(&point) {
            Ok(_) => false,
            Err(pos) => {
                self.points.insert(pos, point);
                true
            }
        }
    }

    /// Remove if present. Returns whether the point was there — absent
    /// points are a no-op, not an error.
    pub fn remove(&mut self, point: NaiveDateTime) -> bool {
        match self.points.binary_search(&point) {
            Ok(pos) => {
                self.points.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn first(&self) -> Option<NaiveDateTime> {
        self.points.first().copied()
    }

    pub fn as_slice(&self) -> &[NaiveDateTime] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.points.iter()
    }
}

impl From<Vec<NaiveDateTime>> for TimePointSet {
    fn from(mut points: Vec<NaiveDateTime>) -> Self {
        points.sort();
        points.dedup();
        Self { points }
    }
}

impl From<TimePointSet> for Vec<NaiveDateTime> {
    fn from(set: TimePointSet) -> Self {
        set.points
    }
}
