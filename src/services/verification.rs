//! Verification queue scoring and ordering
//!
//! Admins review unverified open bookings under time pressure. The score is
//! additive so "well-documented" and "time-critical" signals combine instead
//! of one starving the other: pure time-order would bury documented-but-later
//! items, pure media-order would bury urgent plain ones.
//!
//! Scores and urgency labels are derived at scoring time against the clock
//! the caller passes in — callers must re-score as wall-clock time advances
//! or the classification silently goes stale.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{UnverifiedBooking, Urgency, VerificationQueueEntry};

/// Review-priority boost for entries with photo documentation.
const MEDIA_BOOST: i64 = 1000;
/// Boost when the appointment is 4–14 hours out.
const CRITICAL_BOOST: i64 = 500;
/// Boost when the appointment is 14–20 hours out.
const HIGH_BOOST: i64 = 300;

// Band edges in hours-until-scheduled.
// TODO: lift the weights and band edges into BookingRules when deployments
// need per-region tuning; the functions below already take only entry + clock.
const CRITICAL_BAND: (f64, f64) = (4.0, 14.0);
const HIGH_BAND: (f64, f64) = (14.0, 20.0);

/// Fractional hours until the appointment. Negative once it has passed.
fn hours_until(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (scheduled_at - now).num_minutes() as f64 / 60.0
}

fn band(hours: f64) -> Urgency {
    if (CRITICAL_BAND.0..CRITICAL_BAND.1).contains(&hours) {
        Urgency::Critical
    } else if (HIGH_BAND.0..HIGH_BAND.1).contains(&hours) {
        Urgency::High
    } else {
        Urgency::None
    }
}

/// Review priority of one entry at `now`; higher reviews first.
pub fn score(entry: &VerificationQueueEntry, now: DateTime<Utc>) -> i64 {
    let mut score = 0;
    if entry.has_media {
        score += MEDIA_BOOST;
    }
    score += match band(hours_until(entry.scheduled_at, now)) {
        Urgency::Critical => CRITICAL_BOOST,
        Urgency::High => HIGH_BOOST,
        Urgency::None => 0,
    };
    score
}

/// Urgency label for visual flagging. Same bands as the score's urgency
/// contribution, but independent of the media boost — styling only, never
/// sort order. Expired entries fall out of both bands and label as `None`;
/// review is moot once the appointment has passed.
pub fn classify_urgency(entry: &VerificationQueueEntry, now: DateTime<Utc>) -> Urgency {
    band(hours_until(entry.scheduled_at, now))
}

/// Whether the appointment time has already passed. Expired entries remain
/// visible in the queue; they are only excluded from critical/high styling.
pub fn is_expired(entry: &VerificationQueueEntry, now: DateTime<Utc>) -> bool {
    entry.scheduled_at < now
}

/// Stable sort by score descending; ties keep their original order so
/// re-renders with unchanged inputs never visibly reshuffle.
pub fn sort_queue(entries: &mut [VerificationQueueEntry], now: DateTime<Utc>) {
    entries.sort_by_cached_key(|entry| Reverse(score(entry, now)));
}

/// Convert one page of raw feed records into a sorted review queue.
pub fn build_queue(
    records: Vec<UnverifiedBooking>,
    now: DateTime<Utc>,
) -> Vec<VerificationQueueEntry> {
    let mut entries: Vec<VerificationQueueEntry> =
        records.into_iter().map(VerificationQueueEntry::from).collect();
    sort_queue(&mut entries, now);
    debug!(count = entries.len(), "verification queue rebuilt");
    entries
}
