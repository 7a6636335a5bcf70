//! Verification queue types
//!
//! Rebuilt from each list refresh — nothing here is persisted. The priority
//! score and urgency label are always derived at scoring time, never stored
//! on the entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw record from the unverified-bookings feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnverifiedBooking {
    pub booking_id: Uuid,
    /// Photo/media attachments submitted with the booking
    #[serde(default)]
    pub media_urls: Vec<String>,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
}

/// One row of the admin verification queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationQueueEntry {
    pub booking_id: Uuid,
    pub has_media: bool,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
}

impl From<UnverifiedBooking> for VerificationQueueEntry {
    fn from(record: UnverifiedBooking) -> Self {
        Self {
            booking_id: record.booking_id,
            has_media: !record.media_urls.is_empty(),
            scheduled_at: record.scheduled_at,
            status: record.status,
        }
    }
}

/// Urgency label for visual flagging. Decoupled from the priority score —
/// used purely for styling, independent of sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Critical,
    High,
    None,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::None => "none",
        }
    }
}
