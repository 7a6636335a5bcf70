//! Price preview reconciliation
//!
//! One reconciler per wizard session. Three external pricing operations with
//! three response schemas feed a single display model; racing responses are
//! arbitrated by a monotonic request token — only the most-recently-issued
//! request's result may be applied, regardless of arrival order. Retries and
//! fast navigation make out-of-order completion a normal case, not an edge
//! case.
//!
//! Cancellation is cooperative, not transport-level: `reset` does not abort
//! the network call, it makes any in-flight response stale and returns the
//! machine to `Idle` immediately. Timeouts are the transport layer's job.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::BookingRules;
use crate::error::{PreviewError, ValidationError};
use crate::services::pricing::{AddressDirectory, PricingApi};
use crate::services::recurrence;
use crate::types::{
    AddressRef, AddressSource, BookingDraft, LineItem, MultiplePreviewResponse, PreviewRequest,
    PreviewResponse, PricePreview, PricingMode, RecurringPreviewResponse, ResolvedAddress,
    ScheduleChoice, ServiceItem, ServiceSelection, SinglePreviewResponse, TimeSpec,
};

/// Shown when the pricing backend fails without a usable message.
pub const FALLBACK_FAILURE_MESSAGE: &str =
    "Unable to estimate the price right now. Please try again.";

/// Preview lifecycle. Pure data — no rendering-layer coupling; hosts mirror
/// it into whatever view state they use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PreviewState {
    /// No estimate requested or shown
    Idle,
    /// Waiting on the pricing backend
    Requesting { token: u64 },
    /// Estimate ready for display
    Ready { preview: PricePreview },
    /// Estimate failed; the entered draft is preserved untouched
    Failed { error: PreviewError },
}

/// Session-scoped collaborator context: whose session this is and the lazily
/// resolved default address. An explicit object handed to the reconciler —
/// never a module-level global — created at session start and dropped at
/// session end.
///
/// The cached address is written at most once per session and read-shared by
/// every preview request; `invalidate_address` is for logout or an
/// address-source change.
pub struct SessionContext {
    customer_id: Uuid,
    resolved_address: Mutex<Option<ResolvedAddress>>,
}

impl SessionContext {
    pub fn new(customer_id: Uuid) -> Self {
        Self {
            customer_id,
            resolved_address: Mutex::new(None),
        }
    }

    pub fn customer_id(&self) -> Uuid {
        self.customer_id
    }

    pub fn cached_address(&self) -> Option<ResolvedAddress> {
        self.resolved_address.lock().clone()
    }

    pub fn cache_address(&self, address: ResolvedAddress) {
        *self.resolved_address.lock() = Some(address);
    }

    /// Forget the cached default address.
    pub fn invalidate_address(&self) {
        *self.resolved_address.lock() = None;
    }
}

/// Drives the preview state machine for one booking draft.
pub struct PreviewReconciler {
    rules: BookingRules,
    pricing: Arc<dyn PricingApi>,
    directory: Arc<dyn AddressDirectory>,
    session: Arc<SessionContext>,
    state: Mutex<PreviewState>,
    /// Monotonic request token; a response is applied only while its token
    /// is still the latest issued.
    latest_token: AtomicU64,
}

impl PreviewReconciler {
    pub fn new(
        rules: BookingRules,
        pricing: Arc<dyn PricingApi>,
        directory: Arc<dyn AddressDirectory>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            rules,
            pricing,
            directory,
            session,
            state: Mutex::new(PreviewState::Idle),
            latest_token: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PreviewState {
        self.state.lock().clone()
    }

    /// Cooperative cancel (backward navigation): any in-flight response
    /// becomes stale and the machine returns to `Idle` right away.
    pub fn reset(&self) {
        self.issue_token();
        *self.state.lock() = PreviewState::Idle;
        debug!("preview reset to idle");
    }

    /// Re-evaluate the draft and, if it is previewable, dispatch exactly one
    /// pricing operation for its shape.
    ///
    /// Returns `Err` for a malformed recurrence descriptor (synchronous,
    /// nothing dispatched, state untouched). An incomplete draft — no
    /// service or no chosen time yet — is not an error; the machine is left
    /// as-is and the wizard keeps collecting input. Otherwise resolves the
    /// address, enters `Requesting` and returns the state after this
    /// request settled (which may reflect a newer request if one superseded
    /// this one mid-flight).
    pub async fn refresh(&self, draft: &BookingDraft) -> Result<PreviewState, ValidationError> {
        let Some((mode, service, time)) = self.prepare(draft)? else {
            debug!("draft not previewable yet");
            return Ok(self.state());
        };

        let token = self.issue_token();

        let Some(address) = self.resolve_address(&draft.address).await else {
            if self.is_current(token) {
                warn!("address unresolved, preview request suppressed");
                *self.state.lock() = PreviewState::Failed {
                    error: PreviewError::AddressUnresolved,
                };
            }
            return Ok(self.state());
        };
        {
            let mut state = self.state.lock();
            if !self.is_current(token) {
                debug!(token, "request superseded during address resolution");
                return Ok(state.clone());
            }
            *state = PreviewState::Requesting { token };
        }
        let request = build_request(draft, service, time, address);
        debug!(token, mode = mode.as_str(), "preview requested");

        let outcome = self.dispatch(mode, &request).await;
        self.settle(token, outcome);
        Ok(self.state())
    }

    fn issue_token(&self) -> u64 {
        self.latest_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, token: u64) -> bool {
        self.latest_token.load(Ordering::SeqCst) == token
    }

    /// Gate before any dispatch: `None` when the draft is still incomplete,
    /// `Err` when its recurrence descriptor fails validation.
    fn prepare(
        &self,
        draft: &BookingDraft,
    ) -> Result<Option<(PricingMode, ServiceSelection, TimeSpec)>, ValidationError> {
        let Some(service) = &draft.service else {
            return Ok(None);
        };
        let time = match &draft.schedule {
            None => return Ok(None),
            Some(ScheduleChoice::Occurrences { points }) => match points.as_slice() {
                [] => return Ok(None),
                [only] => TimeSpec::Single { at: *only },
                many => TimeSpec::Multiple { at: many.to_vec() },
            },
            Some(ScheduleChoice::Recurring { pattern }) => {
                recurrence::validate(pattern, &self.rules)?;
                TimeSpec::Recurring {
                    pattern: pattern.clone(),
                }
            }
        };
        Ok(Some((PricingMode::for_draft(draft), service.clone(), time)))
    }

    /// Turn the draft's address source into a request reference, resolving
    /// the default profile address through the directory at most once per
    /// session. `None` means unresolved — the caller must not dispatch.
    async fn resolve_address(&self, source: &AddressSource) -> Option<AddressRef> {
        match source {
            AddressSource::New(address) => Some(AddressRef::New(address.clone())),
            AddressSource::Saved { address_id } => Some(AddressRef::Existing {
                address_id: *address_id,
            }),
            AddressSource::DefaultProfile => {
                if let Some(cached) = self.session.cached_address() {
                    debug!("default address served from session cache");
                    return Some(AddressRef::Existing {
                        address_id: cached.address_id,
                    });
                }
                match self
                    .directory
                    .resolve_default_address(self.session.customer_id())
                    .await
                {
                    Ok(Some(resolved)) => {
                        let address_id = resolved.address_id;
                        self.session.cache_address(resolved);
                        Some(AddressRef::Existing { address_id })
                    }
                    Ok(None) => {
                        warn!("customer profile has no default address");
                        None
                    }
                    Err(error) => {
                        warn!(%error, "default address resolution failed");
                        None
                    }
                }
            }
        }
    }

    /// Exactly one external operation per request, chosen by mode.
    async fn dispatch(
        &self,
        mode: PricingMode,
        request: &PreviewRequest,
    ) -> anyhow::Result<PreviewResponse> {
        match mode {
            PricingMode::Single => Ok(PreviewResponse::Single(
                self.pricing.compute_single_preview(request).await?,
            )),
            PricingMode::Multiple => Ok(PreviewResponse::Multiple(
                self.pricing.compute_multiple_preview(request).await?,
            )),
            PricingMode::Recurring => Ok(PreviewResponse::Recurring(
                self.pricing.compute_recurring_preview(request).await?,
            )),
        }
    }

    /// Apply a settled outcome — unless a newer request has been issued, in
    /// which case the response is stale and silently dropped (not an error;
    /// a superseded response is irrelevant).
    fn settle(&self, token: u64, outcome: anyhow::Result<PreviewResponse>) {
        let mut state = self.state.lock();
        if self.latest_token.load(Ordering::SeqCst) != token {
            debug!(token, "stale preview response dropped");
            return;
        }
        *state = match outcome {
            Ok(response) => PreviewState::Ready {
                preview: normalize_preview(response),
            },
            Err(error) => {
                warn!(%error, "preview computation failed");
                PreviewState::Failed {
                    error: to_preview_error(error),
                }
            }
        };
    }
}

fn build_request(
    draft: &BookingDraft,
    service: ServiceSelection,
    time: TimeSpec,
    address: AddressRef,
) -> PreviewRequest {
    PreviewRequest {
        address,
        time,
        service_id: service.service_id,
        option_choice_ids: service.option_choice_ids,
        promo_code: draft.promo_code.clone(),
        payment_method_id: draft.payment_method_id,
        note: draft.note.clone(),
    }
}

fn to_preview_error(error: anyhow::Error) -> PreviewError {
    let message = error.to_string();
    if message.trim().is_empty() {
        PreviewError::Failed {
            message: FALLBACK_FAILURE_MESSAGE.to_string(),
        }
    } else {
        PreviewError::Failed { message }
    }
}

/// Collapse any of the three response schemas into the uniform breakdown.
/// One exhaustive arm per variant — adding a fourth mode will not compile
/// until it is normalized here.
pub fn normalize_preview(response: PreviewResponse) -> PricePreview {
    match response {
        PreviewResponse::Single(r) => normalize_single(r),
        PreviewResponse::Multiple(r) => normalize_multiple(r),
        PreviewResponse::Recurring(r) => normalize_recurring(r),
    }
}

fn to_line_items(items: Vec<ServiceItem>) -> Vec<LineItem> {
    items
        .into_iter()
        .map(|item| LineItem {
            label: item.name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total,
        })
        .collect()
}

fn normalize_single(r: SinglePreviewResponse) -> PricePreview {
    PricePreview {
        line_items: to_line_items(r.service_items),
        subtotal: r.subtotal,
        discount: r.promotion_info.map(|p| p.discount_amount),
        fees: r.fee_breakdowns,
        price_per_occurrence: r.grand_total,
        grand_total: r.grand_total,
        occurrence_count: 1,
        more_occurrences: false,
    }
}

fn normalize_multiple(r: MultiplePreviewResponse) -> PricePreview {
    PricePreview {
        line_items: to_line_items(r.service_items),
        subtotal: r.subtotal_per_booking * r.booking_count as f64,
        discount: r.promotion_info.map(|p| p.discount_amount),
        fees: r.fee_breakdowns,
        price_per_occurrence: r.price_per_booking,
        grand_total: r.total_estimated_price,
        occurrence_count: r.booking_count,
        more_occurrences: false,
    }
}

fn normalize_recurring(r: RecurringPreviewResponse) -> PricePreview {
    PricePreview {
        line_items: to_line_items(r.service_items),
        subtotal: r.subtotal_per_occurrence * r.occurrence_count as f64,
        discount: r.promotion_info.map(|p| p.discount_amount),
        fees: r.fee_breakdowns,
        price_per_occurrence: r.price_per_occurrence,
        grand_total: r.total_estimated_price,
        occurrence_count: r.occurrence_count,
        more_occurrences: r.has_more_occurrences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pricing::{MockAddressDirectory, MockPricingApi};
    use crate::types::{Frequency, RecurrencePattern, TimePointSet};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use tokio::sync::oneshot;

    fn make_point(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 9, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn make_service() -> ServiceSelection {
        ServiceSelection {
            service_id: Uuid::from_u128(1),
            option_choice_ids: vec![],
        }
    }

    fn draft_with_points(count: u32) -> BookingDraft {
        let mut draft = BookingDraft::new();
        draft.service = Some(make_service());
        let mut points = TimePointSet::new();
        for day in 1..=count {
            points.insert(make_point(day));
        }
        draft.set_occurrences(points);
        draft
    }

    fn draft_recurring() -> BookingDraft {
        let mut draft = BookingDraft::new();
        draft.service = Some(make_service());
        let mut pattern = RecurrencePattern::new(
            Frequency::Weekly,
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
        );
        pattern.anchor_days.extend([1, 3, 5]);
        pattern.time_of_day = NaiveTime::from_hms_opt(9, 0, 0);
        draft.set_recurrence(pattern);
        draft
    }

    fn make_reconciler(
        pricing: Arc<dyn PricingApi>,
        directory: Arc<dyn AddressDirectory>,
    ) -> PreviewReconciler {
        PreviewReconciler::new(
            BookingRules::default(),
            pricing,
            directory,
            Arc::new(SessionContext::new(Uuid::from_u128(7))),
        )
    }

    #[tokio::test]
    async fn test_incomplete_draft_keeps_machine_idle() {
        let pricing = Arc::new(MockPricingApi::new());
        let reconciler = make_reconciler(pricing.clone(), Arc::new(MockAddressDirectory::new()));

        // no service, no schedule
        let state = reconciler.refresh(&BookingDraft::new()).await.unwrap();
        assert_eq!(state, PreviewState::Idle);

        // service but no schedule
        let mut draft = BookingDraft::new();
        draft.service = Some(make_service());
        let state = reconciler.refresh(&draft).await.unwrap();
        assert_eq!(state, PreviewState::Idle);

        // schedule chosen but emptied again
        draft.set_occurrences(TimePointSet::new());
        let state = reconciler.refresh(&draft).await.unwrap();
        assert_eq!(state, PreviewState::Idle);

        assert_eq!(pricing.counts().single, 0);
        assert_eq!(pricing.counts().multiple, 0);
        assert_eq!(pricing.counts().recurring, 0);
    }

    #[tokio::test]
    async fn test_single_point_draft_reaches_ready() {
        let pricing = Arc::new(MockPricingApi::new());
        let reconciler = make_reconciler(pricing.clone(), Arc::new(MockAddressDirectory::new()));

        let state = reconciler.refresh(&draft_with_points(1)).await.unwrap();
        match state {
            PreviewState::Ready { preview } => {
                assert_eq!(preview.occurrence_count, 1);
                assert_eq!(preview.subtotal, 120.0);
                assert_eq!(preview.grand_total, 135.0);
                assert_eq!(preview.price_per_occurrence, 135.0);
                assert!(!preview.more_occurrences);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        assert_eq!(pricing.counts().single, 1);
        assert_eq!(pricing.counts().multiple, 0);
    }

    #[tokio::test]
    async fn test_multiple_points_normalize_per_occurrence() {
        let pricing = Arc::new(MockPricingApi::new());
        let reconciler = make_reconciler(pricing.clone(), Arc::new(MockAddressDirectory::new()));

        let state = reconciler.refresh(&draft_with_points(3)).await.unwrap();
        match state {
            PreviewState::Ready { preview } => {
                assert_eq!(preview.occurrence_count, 3);
                assert_eq!(preview.price_per_occurrence, 135.0);
                assert_eq!(preview.subtotal, 360.0);
                assert_eq!(preview.grand_total, 405.0);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        assert_eq!(pricing.counts().multiple, 1);
        assert_eq!(pricing.counts().single, 0);
    }

    #[tokio::test]
    async fn test_recurring_draft_dispatches_recurring_exactly_once() {
        let pricing = Arc::new(MockPricingApi::new());
        let reconciler = make_reconciler(pricing.clone(), Arc::new(MockAddressDirectory::new()));

        let state = reconciler.refresh(&draft_recurring()).await.unwrap();
        assert!(matches!(state, PreviewState::Ready { .. }));

        let counts = pricing.counts();
        assert_eq!(counts.recurring, 1);
        assert_eq!(counts.single, 0);
        assert_eq!(counts.multiple, 0);
    }

    #[tokio::test]
    async fn test_invalid_recurrence_blocks_before_dispatch() {
        let pricing = Arc::new(MockPricingApi::new());
        let reconciler = make_reconciler(pricing.clone(), Arc::new(MockAddressDirectory::new()));

        let mut draft = draft_recurring();
        if let Some(ScheduleChoice::Recurring { pattern }) = &mut draft.schedule {
            pattern.time_of_day = None;
        }

        let err = reconciler.refresh(&draft).await.unwrap_err();
        assert_eq!(err, ValidationError::MissingTime);
        assert_eq!(reconciler.state(), PreviewState::Idle);
        assert_eq!(pricing.counts().recurring, 0);
    }

    #[tokio::test]
    async fn test_unresolved_address_suppresses_request() {
        let pricing = Arc::new(MockPricingApi::new());
        let directory = Arc::new(MockAddressDirectory::with_no_default());
        let reconciler = make_reconciler(pricing.clone(), directory);

        let state = reconciler.refresh(&draft_with_points(1)).await.unwrap();
        assert_eq!(
            state,
            PreviewState::Failed {
                error: PreviewError::AddressUnresolved
            }
        );
        // nothing was dispatched
        assert_eq!(pricing.counts().single, 0);
    }

    #[tokio::test]
    async fn test_default_address_resolved_once_per_session() {
        let pricing = Arc::new(MockPricingApi::new());
        let directory = Arc::new(MockAddressDirectory::new());
        let reconciler = make_reconciler(pricing, directory.clone());

        reconciler.refresh(&draft_with_points(1)).await.unwrap();
        reconciler.refresh(&draft_with_points(2)).await.unwrap();

        assert_eq!(directory.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidated_address_cache_is_re_resolved() {
        let pricing = Arc::new(MockPricingApi::new());
        let directory = Arc::new(MockAddressDirectory::new());
        let session = Arc::new(SessionContext::new(Uuid::from_u128(7)));
        let reconciler = PreviewReconciler::new(
            BookingRules::default(),
            pricing,
            directory.clone(),
            session.clone(),
        );

        reconciler.refresh(&draft_with_points(1)).await.unwrap();
        session.invalidate_address();
        reconciler.refresh(&draft_with_points(1)).await.unwrap();

        assert_eq!(directory.call_count(), 2);
    }

    #[tokio::test]
    async fn test_saved_address_skips_directory() {
        let pricing = Arc::new(MockPricingApi::new());
        let directory = Arc::new(MockAddressDirectory::new());
        let reconciler = make_reconciler(pricing, directory.clone());

        let mut draft = draft_with_points(1);
        draft.address = AddressSource::Saved {
            address_id: Uuid::from_u128(9),
        };
        let state = reconciler.refresh(&draft).await.unwrap();

        assert!(matches!(state, PreviewState::Ready { .. }));
        assert_eq!(directory.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_surfaces_server_message_and_retry_recovers() {
        let pricing = Arc::new(MockPricingApi::new());
        let reconciler = make_reconciler(pricing.clone(), Arc::new(MockAddressDirectory::new()));
        let draft = draft_with_points(1);

        pricing.set_failure(Some("promo code expired".to_string()));
        let state = reconciler.refresh(&draft).await.unwrap();
        assert_eq!(
            state,
            PreviewState::Failed {
                error: PreviewError::Failed {
                    message: "promo code expired".to_string()
                }
            }
        );

        // retry re-enters Requesting and succeeds
        pricing.set_failure(None);
        let state = reconciler.refresh(&draft).await.unwrap();
        assert!(matches!(state, PreviewState::Ready { .. }));
    }

    #[tokio::test]
    async fn test_blank_server_message_falls_back_to_generic() {
        let pricing = Arc::new(MockPricingApi::new());
        let reconciler = make_reconciler(pricing.clone(), Arc::new(MockAddressDirectory::new()));

        pricing.set_failure(Some("  ".to_string()));
        let state = reconciler.refresh(&draft_with_points(1)).await.unwrap();
        match state {
            PreviewState::Failed {
                error: PreviewError::Failed { message },
            } => assert_eq!(message, FALLBACK_FAILURE_MESSAGE),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_state_serializes_with_type_tag() {
        let json = serde_json::to_string(&PreviewState::Idle).unwrap();
        assert_eq!(json, r#"{"type":"idle"}"#);

        let json = serde_json::to_string(&PreviewState::Requesting { token: 3 }).unwrap();
        assert!(json.contains("\"type\":\"requesting\""));
        assert!(json.contains("\"token\":3"));
    }

    #[test]
    fn test_normalize_single_maps_flat_subtotal() {
        let preview = normalize_preview(PreviewResponse::Single(SinglePreviewResponse {
            service_items: vec![ServiceItem {
                name: "deep clean".to_string(),
                quantity: 1,
                unit_price: 200.0,
                total: 200.0,
            }],
            subtotal: 200.0,
            promotion_info: Some(crate::types::PromotionInfo {
                code: "WELCOME".to_string(),
                discount_amount: 20.0,
            }),
            fee_breakdowns: vec![],
            grand_total: 180.0,
        }));

        assert_eq!(preview.line_items.len(), 1);
        assert_eq!(preview.line_items[0].label, "deep clean");
        assert_eq!(preview.subtotal, 200.0);
        assert_eq!(preview.discount, Some(20.0));
        assert_eq!(preview.occurrence_count, 1);
        assert_eq!(preview.price_per_occurrence, 180.0);
    }

    #[test]
    fn test_normalize_recurring_carries_occurrence_window() {
        let preview = normalize_preview(PreviewResponse::Recurring(RecurringPreviewResponse {
            service_items: vec![],
            subtotal_per_occurrence: 100.0,
            occurrence_count: 12,
            has_more_occurrences: true,
            price_per_occurrence: 110.0,
            total_estimated_price: 1320.0,
            fee_breakdowns: vec![],
            promotion_info: None,
        }));

        assert_eq!(preview.occurrence_count, 12);
        assert_eq!(preview.subtotal, 1200.0);
        assert_eq!(preview.price_per_occurrence, 110.0);
        assert_eq!(preview.grand_total, 1320.0);
        assert!(preview.more_occurrences);
    }

    // ── racing responses ─────────────────────────────────────────────────

    /// Pricing backend whose first call blocks until released, so tests can
    /// hold a request in flight deterministically.
    struct GatedPricing {
        release: Mutex<Option<oneshot::Receiver<()>>>,
        started: Mutex<Option<oneshot::Sender<()>>>,
        gated_subtotal: f64,
        open_subtotal: f64,
    }

    impl GatedPricing {
        fn new(
            release: oneshot::Receiver<()>,
            started: oneshot::Sender<()>,
            gated_subtotal: f64,
            open_subtotal: f64,
        ) -> Self {
            Self {
                release: Mutex::new(Some(release)),
                started: Mutex::new(Some(started)),
                gated_subtotal,
                open_subtotal,
            }
        }
    }

    #[async_trait]
    impl PricingApi for GatedPricing {
        async fn compute_single_preview(
            &self,
            _request: &PreviewRequest,
        ) -> anyhow::Result<SinglePreviewResponse> {
            let gate = self.release.lock().take();
            let subtotal = match gate {
                Some(release) => {
                    if let Some(started) = self.started.lock().take() {
                        let _ = started.send(());
                    }
                    let _ = release.await;
                    self.gated_subtotal
                }
                None => self.open_subtotal,
            };
            Ok(SinglePreviewResponse {
                service_items: vec![],
                subtotal,
                promotion_info: None,
                fee_breakdowns: vec![],
                grand_total: subtotal,
            })
        }

        async fn compute_multiple_preview(
            &self,
            _request: &PreviewRequest,
        ) -> anyhow::Result<MultiplePreviewResponse> {
            Err(anyhow!("unexpected mode"))
        }

        async fn compute_recurring_preview(
            &self,
            _request: &PreviewRequest,
        ) -> anyhow::Result<RecurringPreviewResponse> {
            Err(anyhow!("unexpected mode"))
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_late_response_from_superseded_request_is_dropped() {
        let (release_tx, release_rx) = oneshot::channel();
        let (started_tx, started_rx) = oneshot::channel();
        let pricing = Arc::new(GatedPricing::new(release_rx, started_tx, 100.0, 200.0));
        let reconciler = Arc::new(make_reconciler(
            pricing,
            Arc::new(MockAddressDirectory::new()),
        ));
        let draft = draft_with_points(1);

        let first = tokio::spawn({
            let reconciler = reconciler.clone();
            let draft = draft.clone();
            async move { reconciler.refresh(&draft).await }
        });
        started_rx.await.unwrap();
        assert!(matches!(
            reconciler.state(),
            PreviewState::Requesting { .. }
        ));

        // second request supersedes the gated one and completes immediately
        let state = reconciler.refresh(&draft).await.unwrap();
        match &state {
            PreviewState::Ready { preview } => assert_eq!(preview.grand_total, 200.0),
            other => panic!("expected Ready, got {other:?}"),
        }

        // releasing the first request must not overwrite the newer result
        release_tx.send(()).unwrap();
        first.await.unwrap().unwrap();
        match reconciler.state() {
            PreviewState::Ready { preview } => assert_eq!(preview.grand_total, 200.0),
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reset_drops_in_flight_response() {
        let (release_tx, release_rx) = oneshot::channel();
        let (started_tx, started_rx) = oneshot::channel();
        let pricing = Arc::new(GatedPricing::new(release_rx, started_tx, 100.0, 200.0));
        let reconciler = Arc::new(make_reconciler(
            pricing,
            Arc::new(MockAddressDirectory::new()),
        ));
        let draft = draft_with_points(1);

        let task = tokio::spawn({
            let reconciler = reconciler.clone();
            let draft = draft.clone();
            async move { reconciler.refresh(&draft).await }
        });
        started_rx.await.unwrap();

        // backward navigation: immediate return to Idle
        reconciler.reset();
        assert_eq!(reconciler.state(), PreviewState::Idle);

        // the late response arrives and is dropped
        release_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(reconciler.state(), PreviewState::Idle);
    }
}
