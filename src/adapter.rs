//! Handler adapters bridging backend callbacks to caller listeners.
//!
//! Adapters implement the backend callback capability ([`SearchEvents`] /
//! [`ProbeEvents`]), validate results through the offer builder, and forward
//! them to the caller-supplied handler. Each adapter finalizes itself exactly
//! once on the backend's `done` signal: it takes the caller handler, delivers
//! the terminal notification, wakes completion waiters, then deregisters
//! from the [`HandlerRegistry`] last.
//!
//! # Completion Contract
//!
//! `wait_done` blocks until the terminal notification has been delivered.
//! The registry's `drain_and_wait` relies on this as its join barrier; a
//! backend that never signals `done` stalls shutdown (documented limitation
//! of the backend contract).

use std::sync::{Arc, Condvar, Mutex, OnceLock};

use crate::backend::{ProbeEvents, SearchEvents};
use crate::offer::build_offer;
use crate::registry::{HandlerRegistry, RegisteredAdapter, RegistryHandle};
use crate::timer::CancellationTimer;
use crate::types::{BackendError, DeviceResult, DiscoverStatus, Offer, ProbeFailure};

// =============================================================================
// Caller Handler Traits
// =============================================================================

/// Caller-supplied listener for a discover operation.
///
/// Receives zero or more `device_found` calls, optional progress updates,
/// and exactly one terminal `finished`.
pub trait DiscoverHandler: Send + Sync {
    /// A newly found device, already converted to its canonical offer.
    fn device_found(&self, offer: Offer);

    /// Search progress in permille (0..=1000). Advisory.
    fn progress_updated(&self, permille: u32) {
        let _ = permille;
    }

    /// Terminal notification. Delivered exactly once.
    fn finished(&self, status: DiscoverStatus);
}

/// Caller-supplied listener for a probe operation.
///
/// Receives exactly one terminal outcome: `finished` with a non-empty offer
/// sequence, or `failed`.
pub trait ProbeHandler: Send + Sync {
    /// Terminal success with all accumulated offers.
    fn finished(&self, offers: Vec<Offer>);

    /// Terminal failure, mapped from the last recorded backend error.
    fn failed(&self, failure: ProbeFailure);
}

// =============================================================================
// Handler Slot
// =============================================================================

struct SlotState<H: ?Sized> {
    handler: Option<Arc<H>>,
    completed: bool,
}

/// Single-assignment, swap-to-empty-under-lock holder for the caller handler.
///
/// `take` clears the handler exactly once: whichever finalize path observes
/// it non-empty first delivers the terminal notification; a later observer
/// sees empty and no-ops. `mark_completed` releases `wait_completed` waiters
/// only after the notification was delivered (two-phase: mark complete, then
/// release).
struct HandlerSlot<H: ?Sized> {
    state: Mutex<SlotState<H>>,
    completed_cv: Condvar,
}

impl<H: ?Sized> HandlerSlot<H> {
    fn new(handler: Arc<H>) -> Self {
        Self {
            state: Mutex::new(SlotState {
                handler: Some(handler),
                completed: false,
            }),
            completed_cv: Condvar::new(),
        }
    }

    /// Clones the handler while it is still live.
    fn live(&self) -> Option<Arc<H>> {
        self.state.lock().unwrap().handler.clone()
    }

    /// Takes the handler exactly once.
    fn take(&self) -> Option<Arc<H>> {
        self.state.lock().unwrap().handler.take()
    }

    /// Marks the terminal notification as delivered and wakes waiters.
    fn mark_completed(&self) {
        let mut state = self.state.lock().unwrap();
        state.completed = true;
        self.completed_cv.notify_all();
    }

    /// Blocks until `mark_completed` fired.
    fn wait_completed(&self) {
        let state = self.state.lock().unwrap();
        let _state = self
            .completed_cv
            .wait_while(state, |s| !s.completed)
            .unwrap();
    }
}

// =============================================================================
// Search Adapter
// =============================================================================

/// Adapter for a broad device search.
///
/// Forwards each validated result immediately, one offer per backend call,
/// with no buffering or deduplication.
pub struct SearchAdapter {
    slot: HandlerSlot<dyn DiscoverHandler>,
    timer: Mutex<Option<CancellationTimer>>,
    registry: Arc<HandlerRegistry>,
    handle: OnceLock<RegistryHandle>,
}

impl SearchAdapter {
    /// Creates the adapter and registers it as a live handler.
    pub(crate) fn register(
        handler: Arc<dyn DiscoverHandler>,
        registry: Arc<HandlerRegistry>,
    ) -> Arc<Self> {
        let adapter = Arc::new(Self {
            slot: HandlerSlot::new(handler),
            timer: Mutex::new(None),
            registry: Arc::clone(&registry),
            handle: OnceLock::new(),
        });
        let handle = registry.register(Arc::clone(&adapter) as Arc<dyn RegisteredAdapter>);
        let _ = adapter.handle.set(handle);
        adapter
    }

    /// Attaches the cancellation timer; completion cancels it best-effort.
    pub(crate) fn attach_timer(&self, timer: CancellationTimer) {
        *self.timer.lock().unwrap() = Some(timer);
    }

    /// Finalizes the operation exactly once: cancels the timer, notifies the
    /// caller, wakes completion waiters, deregisters last. No-op when the
    /// handler was already taken.
    pub(crate) fn finish(&self, status: DiscoverStatus) {
        let Some(handler) = self.slot.take() else {
            return;
        };
        if let Some(timer) = self.timer.lock().unwrap().take() {
            timer.cancel();
        }
        handler.finished(status);
        self.slot.mark_completed();
        if let Some(handle) = self.handle.get() {
            self.registry.unregister(*handle);
        }
    }
}

impl SearchEvents for SearchAdapter {
    fn device_found(&self, result: DeviceResult) {
        let offer = match build_offer(&result) {
            Ok(offer) => offer,
            Err(err) => {
                log::debug!("dropping search result: {}", err);
                return;
            }
        };
        if let Some(handler) = self.slot.live() {
            handler.device_found(offer);
        }
    }

    fn report_progress(&self, num: u32, den: u32) {
        let Some(handler) = self.slot.live() else {
            return;
        };
        let permille = if den == 0 {
            0
        } else {
            (u64::from(num) * 1000 / u64::from(den)).min(1000) as u32
        };
        handler.progress_updated(permille);
    }

    fn done(&self) {
        self.finish(DiscoverStatus::NoError);
    }

    fn failed(&self, error: BackendError) {
        // Not terminal; done is the sole terminal signal.
        log::warn!("search backend reported error: {}", error);
    }
}

impl RegisteredAdapter for SearchAdapter {
    fn wait_done(&self) {
        self.slot.wait_completed();
    }
}

// =============================================================================
// Probe Adapter
// =============================================================================

/// Adapter for a targeted autodetect probe.
///
/// Accumulates validated offers and reports a single terminal outcome on
/// `done`: the full sequence when non-empty, otherwise a failure mapped
/// from the last recorded backend error.
pub struct ProbeAdapter {
    slot: HandlerSlot<dyn ProbeHandler>,
    offers: Mutex<Vec<Offer>>,
    last_error: Mutex<Option<BackendError>>,
    registry: Arc<HandlerRegistry>,
    handle: OnceLock<RegistryHandle>,
}

impl ProbeAdapter {
    /// Creates the adapter and registers it as a live handler.
    pub(crate) fn register(
        handler: Arc<dyn ProbeHandler>,
        registry: Arc<HandlerRegistry>,
    ) -> Arc<Self> {
        let adapter = Arc::new(Self {
            slot: HandlerSlot::new(handler),
            offers: Mutex::new(Vec::new()),
            last_error: Mutex::new(None),
            registry: Arc::clone(&registry),
            handle: OnceLock::new(),
        });
        let handle = registry.register(Arc::clone(&adapter) as Arc<dyn RegisteredAdapter>);
        let _ = adapter.handle.set(handle);
        adapter
    }

    /// Finalizes the probe exactly once with the accumulated outcome.
    pub(crate) fn finish(&self) {
        let Some(handler) = self.slot.take() else {
            return;
        };
        let offers = std::mem::take(&mut *self.offers.lock().unwrap());
        if offers.is_empty() {
            let failure = match self.last_error.lock().unwrap().take() {
                Some(BackendError::AuthorizationFailed) => ProbeFailure::AuthorizationFailed,
                Some(BackendError::ConnectionFailed) => ProbeFailure::ConnectionError,
                _ => ProbeFailure::GeneralError,
            };
            handler.failed(failure);
        } else {
            handler.finished(offers);
        }
        self.slot.mark_completed();
        if let Some(handle) = self.handle.get() {
            self.registry.unregister(*handle);
        }
    }
}

impl ProbeEvents for ProbeAdapter {
    fn autodetected(&self, result: DeviceResult) {
        match build_offer(&result) {
            Ok(offer) => self.offers.lock().unwrap().push(offer),
            Err(err) => log::debug!("dropping autodetect result: {}", err),
        }
    }

    fn done(&self) {
        self.finish();
    }

    fn failed(&self, error: BackendError) {
        // Overwrites any earlier error; surfaced only through done's mapping.
        log::debug!("probe backend reported error: {}", error);
        *self.last_error.lock().unwrap() = Some(error);
    }
}

impl RegisteredAdapter for ProbeAdapter {
    fn wait_done(&self) {
        self.slot.wait_completed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IpDeviceResult;
    use std::thread;
    use std::time::Duration;

    fn valid_result(model: &str) -> DeviceResult {
        DeviceResult::Ip(IpDeviceResult {
            brand: "AcmeCorp".into(),
            model: model.into(),
            firmware: "1.0".into(),
            driver_name: "acme_ip".into(),
            driver_version: 0x0100_0000,
            lan_address: "192.168.1.20".into(),
            wan_address: "203.0.113.7".into(),
            mac: "00:11:22:33:44:55".into(),
            port: 80,
            description: None,
        })
    }

    #[derive(Debug, PartialEq)]
    enum DiscoverEvent {
        Found(String),
        Progress(u32),
        Finished(DiscoverStatus),
    }

    #[derive(Default)]
    struct RecordingDiscoverHandler {
        events: Mutex<Vec<DiscoverEvent>>,
    }

    impl DiscoverHandler for RecordingDiscoverHandler {
        fn device_found(&self, offer: Offer) {
            let model = offer.get("model").unwrap_or_default().to_string();
            self.events.lock().unwrap().push(DiscoverEvent::Found(model));
        }

        fn progress_updated(&self, permille: u32) {
            self.events
                .lock()
                .unwrap()
                .push(DiscoverEvent::Progress(permille));
        }

        fn finished(&self, status: DiscoverStatus) {
            self.events
                .lock()
                .unwrap()
                .push(DiscoverEvent::Finished(status));
        }
    }

    #[derive(Debug, PartialEq)]
    enum ProbeEvent {
        Finished(Vec<String>),
        Failed(ProbeFailure),
    }

    #[derive(Default)]
    struct RecordingProbeHandler {
        events: Mutex<Vec<ProbeEvent>>,
    }

    impl ProbeHandler for RecordingProbeHandler {
        fn finished(&self, offers: Vec<Offer>) {
            let models = offers
                .iter()
                .map(|o| o.get("model").unwrap_or_default().to_string())
                .collect();
            self.events.lock().unwrap().push(ProbeEvent::Finished(models));
        }

        fn failed(&self, failure: ProbeFailure) {
            self.events.lock().unwrap().push(ProbeEvent::Failed(failure));
        }
    }

    #[test]
    fn test_search_forwards_each_result_then_single_finished() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingDiscoverHandler::default());
        let adapter = SearchAdapter::register(handler.clone(), Arc::clone(&registry));

        adapter.device_found(valid_result("Cam A"));
        adapter.device_found(valid_result("Cam B"));
        adapter.device_found(valid_result("Cam C"));
        adapter.done();
        adapter.done(); // second done is a no-op

        let events = handler.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                DiscoverEvent::Found("Cam A".into()),
                DiscoverEvent::Found("Cam B".into()),
                DiscoverEvent::Found("Cam C".into()),
                DiscoverEvent::Finished(DiscoverStatus::NoError),
            ]
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_search_drops_rejected_results() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingDiscoverHandler::default());
        let adapter = SearchAdapter::register(handler.clone(), registry);

        adapter.device_found(DeviceResult::Unsupported);
        adapter.done();

        let events = handler.events.lock().unwrap();
        assert_eq!(*events, vec![DiscoverEvent::Finished(DiscoverStatus::NoError)]);
    }

    #[test]
    fn test_search_progress_is_clamped() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingDiscoverHandler::default());
        let adapter = SearchAdapter::register(handler.clone(), registry);

        adapter.report_progress(5, 10);
        adapter.report_progress(20, 10);
        adapter.report_progress(1, 0);
        adapter.done();
        adapter.report_progress(5, 10); // after done: handler gone, dropped

        let events = handler.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                DiscoverEvent::Progress(500),
                DiscoverEvent::Progress(1000),
                DiscoverEvent::Progress(0),
                DiscoverEvent::Finished(DiscoverStatus::NoError),
            ]
        );
    }

    #[test]
    fn test_search_failed_is_not_terminal() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingDiscoverHandler::default());
        let adapter = SearchAdapter::register(handler.clone(), registry);

        adapter.failed(BackendError::Other(17));
        adapter.device_found(valid_result("Cam A"));
        adapter.done();

        let events = handler.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                DiscoverEvent::Found("Cam A".into()),
                DiscoverEvent::Finished(DiscoverStatus::NoError),
            ]
        );
    }

    #[test]
    fn test_wait_done_blocks_until_terminal_signal() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingDiscoverHandler::default());
        let adapter = SearchAdapter::register(handler.clone(), registry);

        let waiter_adapter = Arc::clone(&adapter);
        let waiter = thread::spawn(move || waiter_adapter.wait_done());

        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());
        // Terminal notification must precede the waiter's release.
        assert!(handler.events.lock().unwrap().is_empty());

        adapter.done();
        waiter.join().unwrap();
        assert_eq!(
            *handler.events.lock().unwrap(),
            vec![DiscoverEvent::Finished(DiscoverStatus::NoError)]
        );
    }

    #[test]
    fn test_probe_accumulates_offers_in_order() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingProbeHandler::default());
        let adapter = ProbeAdapter::register(handler.clone(), Arc::clone(&registry));

        adapter.autodetected(valid_result("Variant 1"));
        adapter.autodetected(valid_result("Variant 2"));
        adapter.done();
        adapter.done();

        let events = handler.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![ProbeEvent::Finished(vec![
                "Variant 1".into(),
                "Variant 2".into()
            ])]
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_probe_without_results_fails_general() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingProbeHandler::default());
        let adapter = ProbeAdapter::register(handler.clone(), registry);

        adapter.done();

        let events = handler.events.lock().unwrap();
        assert_eq!(*events, vec![ProbeEvent::Failed(ProbeFailure::GeneralError)]);
    }

    #[test]
    fn test_probe_maps_last_backend_error() {
        for (backend_error, expected) in [
            (
                BackendError::AuthorizationFailed,
                ProbeFailure::AuthorizationFailed,
            ),
            (BackendError::ConnectionFailed, ProbeFailure::ConnectionError),
            (BackendError::Aborted, ProbeFailure::GeneralError),
            (BackendError::Other(3), ProbeFailure::GeneralError),
        ] {
            let registry = Arc::new(HandlerRegistry::new());
            let handler = Arc::new(RecordingProbeHandler::default());
            let adapter = ProbeAdapter::register(handler.clone(), registry);

            adapter.failed(backend_error);
            adapter.done();

            let events = handler.events.lock().unwrap();
            assert_eq!(*events, vec![ProbeEvent::Failed(expected)]);
        }
    }

    #[test]
    fn test_probe_last_error_overwrites_earlier() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingProbeHandler::default());
        let adapter = ProbeAdapter::register(handler.clone(), registry);

        adapter.failed(BackendError::ConnectionFailed);
        adapter.failed(BackendError::AuthorizationFailed);
        adapter.done();

        let events = handler.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![ProbeEvent::Failed(ProbeFailure::AuthorizationFailed)]
        );
    }

    #[test]
    fn test_probe_results_win_over_recorded_errors() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingProbeHandler::default());
        let adapter = ProbeAdapter::register(handler.clone(), registry);

        adapter.failed(BackendError::ConnectionFailed);
        adapter.autodetected(valid_result("Variant 1"));
        adapter.done();

        let events = handler.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![ProbeEvent::Finished(vec!["Variant 1".into()])]
        );
    }

    #[test]
    fn test_search_finish_cancels_attached_timer() {
        let registry = Arc::new(HandlerRegistry::new());
        let handler = Arc::new(RecordingDiscoverHandler::default());
        let adapter = SearchAdapter::register(handler, registry);

        let timer = CancellationTimer::arm(Duration::from_secs(60), || {});
        adapter.attach_timer(timer.clone());
        assert!(!timer.is_cancelled());

        adapter.done();
        assert!(timer.is_cancelled());
    }
}
