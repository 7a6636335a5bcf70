//! Pricing wire types and the normalized preview model
//!
//! Three external operations return three structurally different response
//! schemas. They are kept as distinct structs under one tagged union so that
//! normalization into [`PricePreview`] is an exhaustive match, checked at
//! compile time, instead of optional-field probing.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::draft::{BookingDraft, NewAddress, ScheduleChoice};
use super::recurrence::RecurrencePattern;

/// Which external pricing operation a draft maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    Single,
    Multiple,
    Recurring,
}

impl PricingMode {
    /// Pure function of the draft shape, evaluated per request: a recurrence
    /// rule always prices as recurring, two or more explicit occurrences as
    /// multiple, anything else as single.
    pub fn for_draft(draft: &BookingDraft) -> Self {
        match &draft.schedule {
            Some(ScheduleChoice::Recurring { .. }) => Self::Recurring,
            Some(ScheduleChoice::Occurrences { points }) if points.len() > 1 => Self::Multiple,
            _ => Self::Single,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
            Self::Recurring => "recurring",
        }
    }
}

/// Address reference sent with a preview request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AddressRef {
    #[serde(rename_all = "camelCase")]
    Existing { address_id: Uuid },
    New(NewAddress),
}

/// Time specification, one variant per booking shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimeSpec {
    Single { at: NaiveDateTime },
    Multiple { at: Vec<NaiveDateTime> },
    Recurring { pattern: RecurrencePattern },
}

/// Normalized request sent to every pricing operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub address: AddressRef,
    pub time: TimeSpec,
    pub service_id: Uuid,
    pub option_choice_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One priced service row as the backend returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

/// One fee row (platform fee, travel surcharge, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub name: String,
    pub amount: f64,
}

/// Applied promotion as the backend reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionInfo {
    pub code: String,
    pub discount_amount: f64,
}

/// Response of `compute_single_preview`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinglePreviewResponse {
    pub service_items: Vec<ServiceItem>,
    pub subtotal: f64,
    pub promotion_info: Option<PromotionInfo>,
    pub fee_breakdowns: Vec<FeeBreakdown>,
    pub grand_total: f64,
}

/// Response of `compute_multiple_preview`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplePreviewResponse {
    pub service_items: Vec<ServiceItem>,
    pub subtotal_per_booking: f64,
    pub booking_count: u32,
    pub price_per_booking: f64,
    pub fee_breakdowns: Vec<FeeBreakdown>,
    pub total_estimated_price: f64,
    pub promotion_info: Option<PromotionInfo>,
}

/// Response of `compute_recurring_preview`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPreviewResponse {
    pub service_items: Vec<ServiceItem>,
    pub subtotal_per_occurrence: f64,
    pub occurrence_count: u32,
    pub has_more_occurrences: bool,
    pub price_per_occurrence: f64,
    pub total_estimated_price: f64,
    pub fee_breakdowns: Vec<FeeBreakdown>,
    pub promotion_info: Option<PromotionInfo>,
}

/// Union of the three response schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum PreviewResponse {
    Single(SinglePreviewResponse),
    Multiple(MultiplePreviewResponse),
    Recurring(RecurringPreviewResponse),
}

/// One display row of the uniform cost breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub label: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

/// Uniform cost breakdown shown to the customer regardless of booking
/// shape. Derived, never persisted — owned by the reconciler for the
/// lifetime of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePreview {
    pub line_items: Vec<LineItem>,
    pub subtotal: f64,
    pub discount: Option<f64>,
    pub fees: Vec<FeeBreakdown>,
    pub grand_total: f64,
    pub occurrence_count: u32,
    pub price_per_occurrence: f64,
    /// The recurring estimate covers only a window of occurrences; true
    /// when the pattern extends past it (displayed as "12+ visits").
    pub more_occurrences: bool,
}

/// Customer's default profile address after resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAddress {
    pub address_id: Uuid,
    pub ward: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
