//! External pricing and directory interfaces
//!
//! Trait abstraction with deterministic mock implementations:
//! - mocks for tests and development (no network, reproducible numbers)
//! - real transport implementations live in the host application
//!
//! The engine never computes fees or promotions itself — every number in a
//! preview comes from one of these operations.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::types::{
    FeeBreakdown, MultiplePreviewResponse, PreviewRequest, PromotionInfo, RecurringPreviewResponse,
    ResolvedAddress, ServiceItem, SinglePreviewResponse, TimeSpec, UnverifiedBooking,
};

/// Pricing backend - one operation per booking shape, each with its own
/// response schema.
#[async_trait]
pub trait PricingApi: Send + Sync {
    async fn compute_single_preview(&self, request: &PreviewRequest)
        -> Result<SinglePreviewResponse>;

    async fn compute_multiple_preview(
        &self,
        request: &PreviewRequest,
    ) -> Result<MultiplePreviewResponse>;

    async fn compute_recurring_preview(
        &self,
        request: &PreviewRequest,
    ) -> Result<RecurringPreviewResponse>;

    /// Name of this implementation, for diagnostics
    fn name(&self) -> &'static str;
}

/// Customer address directory.
#[async_trait]
pub trait AddressDirectory: Send + Sync {
    /// Resolve the customer's default profile address.
    /// `Ok(None)` when the profile has no usable default.
    async fn resolve_default_address(&self, customer_id: Uuid) -> Result<Option<ResolvedAddress>>;

    fn name(&self) -> &'static str;
}

/// Feed of unverified open bookings awaiting admin review.
#[async_trait]
pub trait BookingFeed: Send + Sync {
    /// One page of raw records; `page` is 0-based.
    async fn list_unverified(&self, page: usize, size: usize) -> Result<Vec<UnverifiedBooking>>;

    fn name(&self) -> &'static str;
}

// ==========================================================================
// Mock implementations
// ==========================================================================

/// Invocation counts per pricing mode, for asserting dispatch behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub single: usize,
    pub multiple: usize,
    pub recurring: usize,
}

/// Deterministic in-memory pricing backend.
///
/// Subtotal is `unit_price × (1 + option count)`, every preview carries one
/// visit fee, a promo code is always worth a flat 10.0. Counts every call so
/// tests can assert exactly which operation was dispatched.
pub struct MockPricingApi {
    unit_price: f64,
    visit_fee: f64,
    counts: Mutex<CallCounts>,
    fail_with: Mutex<Option<String>>,
}

impl MockPricingApi {
    pub fn new() -> Self {
        Self {
            unit_price: 120.0,
            visit_fee: 15.0,
            counts: Mutex::new(CallCounts::default()),
            fail_with: Mutex::new(None),
        }
    }

    pub fn with_unit_price(unit_price: f64) -> Self {
        Self {
            unit_price,
            ..Self::new()
        }
    }

    /// Make every subsequent call fail with `message`; `None` restores
    /// success.
    pub fn set_failure(&self, message: Option<String>) {
        *self.fail_with.lock() = message;
    }

    pub fn counts(&self) -> CallCounts {
        *self.counts.lock()
    }

    fn check_failure(&self) -> Result<()> {
        match self.fail_with.lock().as_ref() {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }

    fn items_and_subtotal(&self, request: &PreviewRequest) -> (Vec<ServiceItem>, f64) {
        let mut items = vec![ServiceItem {
            name: "base service".to_string(),
            quantity: 1,
            unit_price: self.unit_price,
            total: self.unit_price,
        }];
        for (i, _) in request.option_choice_ids.iter().enumerate() {
            items.push(ServiceItem {
                name: format!("option {}", i + 1),
                quantity: 1,
                unit_price: self.unit_price,
                total: self.unit_price,
            });
        }
        let subtotal = self.unit_price * (1 + request.option_choice_ids.len()) as f64;
        (items, subtotal)
    }

    fn promotion(&self, request: &PreviewRequest) -> (Option<PromotionInfo>, f64) {
        match &request.promo_code {
            Some(code) => (
                Some(PromotionInfo {
                    code: code.clone(),
                    discount_amount: 10.0,
                }),
                10.0,
            ),
            None => (None, 0.0),
        }
    }

    fn visit_fee_row(&self) -> FeeBreakdown {
        FeeBreakdown {
            name: "visit fee".to_string(),
            amount: self.visit_fee,
        }
    }
}

impl Default for MockPricingApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PricingApi for MockPricingApi {
    async fn compute_single_preview(
        &self,
        request: &PreviewRequest,
    ) -> Result<SinglePreviewResponse> {
        self.counts.lock().single += 1;
        self.check_failure()?;

        let (service_items, subtotal) = self.items_and_subtotal(request);
        let (promotion_info, discount) = self.promotion(request);
        Ok(SinglePreviewResponse {
            service_items,
            subtotal,
            promotion_info,
            fee_breakdowns: vec![self.visit_fee_row()],
            grand_total: subtotal + self.visit_fee - discount,
        })
    }

    async fn compute_multiple_preview(
        &self,
        request: &PreviewRequest,
    ) -> Result<MultiplePreviewResponse> {
        self.counts.lock().multiple += 1;
        self.check_failure()?;

        let booking_count = match &request.time {
            TimeSpec::Multiple { at } => at.len() as u32,
            _ => 1,
        };
        let (service_items, subtotal) = self.items_and_subtotal(request);
        let (promotion_info, discount) = self.promotion(request);
        let price_per_booking = subtotal + self.visit_fee;
        Ok(MultiplePreviewResponse {
            service_items,
            subtotal_per_booking: subtotal,
            booking_count,
            price_per_booking,
            fee_breakdowns: vec![self.visit_fee_row()],
            total_estimated_price: price_per_booking * booking_count as f64 - discount,
            promotion_info,
        })
    }

    async fn compute_recurring_preview(
        &self,
        request: &PreviewRequest,
    ) -> Result<RecurringPreviewResponse> {
        self.counts.lock().recurring += 1;
        self.check_failure()?;

        // four weeks of occurrences, capped at a 12-occurrence estimate window
        let anchors = match &request.time {
            TimeSpec::Recurring { pattern } => pattern.anchor_days.len() as u32,
            _ => 1,
        };
        let projected = anchors * 4;
        let occurrence_count = projected.min(12);
        let (service_items, subtotal) = self.items_and_subtotal(request);
        let (promotion_info, discount) = self.promotion(request);
        let price_per_occurrence = subtotal + self.visit_fee;
        Ok(RecurringPreviewResponse {
            service_items,
            subtotal_per_occurrence: subtotal,
            occurrence_count,
            has_more_occurrences: projected > occurrence_count,
            price_per_occurrence,
            total_estimated_price: price_per_occurrence * occurrence_count as f64 - discount,
            fee_breakdowns: vec![self.visit_fee_row()],
            promotion_info,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Deterministic address directory.
pub struct MockAddressDirectory {
    default_address: Option<ResolvedAddress>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

impl MockAddressDirectory {
    pub fn new() -> Self {
        Self {
            default_address: Some(ResolvedAddress {
                address_id: Uuid::from_u128(0x7a11),
                ward: "Ward 12".to_string(),
                city: "Hanoi".to_string(),
                latitude: Some(21.028),
                longitude: Some(105.854),
            }),
            unavailable: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Directory for a profile with no default address on file.
    pub fn with_no_default() -> Self {
        Self {
            default_address: None,
            ..Self::new()
        }
    }

    /// Simulate the directory being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAddressDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressDirectory for MockAddressDirectory {
    async fn resolve_default_address(&self, _customer_id: Uuid) -> Result<Option<ResolvedAddress>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("address directory unavailable"));
        }
        Ok(self.default_address.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// In-memory booking feed over a fixed record list.
pub struct MockBookingFeed {
    records: Vec<UnverifiedBooking>,
}

impl MockBookingFeed {
    pub fn new(records: Vec<UnverifiedBooking>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl BookingFeed for MockBookingFeed {
    async fn list_unverified(&self, page: usize, size: usize) -> Result<Vec<UnverifiedBooking>> {
        Ok(self
            .records
            .iter()
            .skip(page * size)
            .take(size)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressRef;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_request(option_count: usize, promo: Option<&str>) -> PreviewRequest {
        PreviewRequest {
            address: AddressRef::Existing {
                address_id: Uuid::nil(),
            },
            time: TimeSpec::Single {
                at: NaiveDate::from_ymd_opt(2026, 9, 10)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
            },
            service_id: Uuid::nil(),
            option_choice_ids: (0..option_count).map(|_| Uuid::new_v4()).collect(),
            promo_code: promo.map(str::to_string),
            payment_method_id: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_mock_single_preview_is_deterministic() {
        let pricing = MockPricingApi::new();
        let request = make_request(1, None);

        let first = pricing.compute_single_preview(&request).await.unwrap();
        let second = pricing.compute_single_preview(&request).await.unwrap();

        assert_eq!(first, second);
        // 120 base + 120 option + 15 visit fee
        assert_eq!(first.subtotal, 240.0);
        assert_eq!(first.grand_total, 255.0);
        assert_eq!(first.service_items.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_single_preview_applies_promo() {
        let pricing = MockPricingApi::new();
        let request = make_request(0, Some("SPRING10"));

        let response = pricing.compute_single_preview(&request).await.unwrap();
        assert_eq!(response.promotion_info.as_ref().unwrap().code, "SPRING10");
        assert_eq!(response.grand_total, 120.0 + 15.0 - 10.0);
    }

    #[tokio::test]
    async fn test_mock_multiple_preview_scales_by_booking_count() {
        let pricing = MockPricingApi::new();
        let mut request = make_request(0, None);
        let day = |d| {
            NaiveDate::from_ymd_opt(2026, 9, d)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        };
        request.time = TimeSpec::Multiple {
            at: vec![day(10), day(12), day(14)],
        };

        let response = pricing.compute_multiple_preview(&request).await.unwrap();
        assert_eq!(response.booking_count, 3);
        assert_eq!(response.price_per_booking, 135.0);
        assert_eq!(response.total_estimated_price, 405.0);
    }

    #[tokio::test]
    async fn test_mock_counts_calls_per_mode() {
        let pricing = MockPricingApi::new();
        let request = make_request(0, None);

        pricing.compute_single_preview(&request).await.unwrap();
        pricing.compute_single_preview(&request).await.unwrap();
        pricing.compute_multiple_preview(&request).await.unwrap();

        let counts = pricing.counts();
        assert_eq!(counts.single, 2);
        assert_eq!(counts.multiple, 1);
        assert_eq!(counts.recurring, 0);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let pricing = MockPricingApi::new();
        let request = make_request(0, None);

        pricing.set_failure(Some("service area closed".to_string()));
        let err = pricing.compute_single_preview(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "service area closed");

        pricing.set_failure(None);
        assert!(pricing.compute_single_preview(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_directory_resolves_and_counts() {
        let directory = MockAddressDirectory::new();

        let resolved = directory
            .resolve_default_address(Uuid::nil())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.city, "Hanoi");
        assert_eq!(directory.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_directory_no_default_and_unavailable() {
        let directory = MockAddressDirectory::with_no_default();
        let resolved = directory.resolve_default_address(Uuid::nil()).await.unwrap();
        assert!(resolved.is_none());

        directory.set_unavailable(true);
        assert!(directory.resolve_default_address(Uuid::nil()).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_feed_pages_records() {
        let records: Vec<UnverifiedBooking> = (0..5)
            .map(|i| UnverifiedBooking {
                booking_id: Uuid::from_u128(i),
                media_urls: vec![],
                scheduled_at: Utc.with_ymd_and_hms(2026, 9, 10, 9, 0, 0).unwrap(),
                status: "pending".to_string(),
            })
            .collect();
        let feed = MockBookingFeed::new(records);

        let page0 = feed.list_unverified(0, 2).await.unwrap();
        let page2 = feed.list_unverified(2, 2).await.unwrap();
        assert_eq!(page0.len(), 2);
        assert_eq!(page0[0].booking_id, Uuid::from_u128(0));
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].booking_id, Uuid::from_u128(4));
    }
}
