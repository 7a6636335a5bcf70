//! Booking draft aggregate
//!
//! Built incrementally across the wizard steps and consumed by the preview
//! reconciler; on confirmation the host hands it to booking creation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recurrence::RecurrencePattern;
use super::schedule::TimePointSet;

/// Selected service and its configured option choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSelection {
    pub service_id: Uuid,
    pub option_choice_ids: Vec<Uuid>,
}

/// A new address entered inline during the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub street: String,
    pub ward: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Where the booking address comes from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AddressSource {
    /// Resolve the customer's default profile address via the directory
    #[default]
    DefaultProfile,
    /// A saved address picked explicitly
    #[serde(rename_all = "camelCase")]
    Saved { address_id: Uuid },
    /// Entered inline on this booking
    New(NewAddress),
}

/// When the service should happen. The two shapes are mutually exclusive by
/// construction — a draft is either a set of explicit occurrences or one
/// recurrence rule, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScheduleChoice {
    Occurrences { points: TimePointSet },
    Recurring { pattern: RecurrencePattern },
}

/// In-progress booking draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub service: Option<ServiceSelection>,
    pub address: AddressSource,
    pub schedule: Option<ScheduleChoice>,
    pub promo_code: Option<String>,
    pub payment_method_id: Option<Uuid>,
    pub note: Option<String>,
}

impl BookingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to explicit-occurrence mode, replacing any recurrence rule.
    pub fn set_occurrences(&mut self, points: TimePointSet) {
        self.schedule = Some(ScheduleChoice::Occurrences { points });
    }

    /// Switch to recurring mode, replacing any explicit occurrences.
    pub fn set_recurrence(&mut self, pattern: RecurrencePattern) {
        self.schedule = Some(ScheduleChoice::Recurring { pattern });
    }

    pub fn time_points(&self) -> Option<&TimePointSet> {
        match &self.schedule {
            Some(ScheduleChoice::Occurrences { points }) => Some(points),
            _ => None,
        }
    }

    pub fn time_points_mut(&mut self) -> Option<&mut TimePointSet> {
        match &mut self.schedule {
            Some(ScheduleChoice::Occurrences { points }) => Some(points),
            _ => None,
        }
    }

    pub fn recurrence(&self) -> Option<&RecurrencePattern> {
        match &self.schedule {
            Some(ScheduleChoice::Recurring { pattern }) => Some(pattern),
            _ => None,
        }
    }
}
