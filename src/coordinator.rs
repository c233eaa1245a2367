//! Discovery coordinator façade.
//!
//! Owns the configuration, starts and stops discover/probe operations, wires
//! timer cancellation into adapter completion, and guarantees on shutdown
//! that no backend callback outlives the coordinator.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trader_discovery::{DiscoveryConfig, DiscoveryCoordinator};
//!
//! let coordinator = DiscoveryCoordinator::new(DiscoveryConfig::default(), backend);
//! coordinator.start_discover(handler)?;
//! // ... devices stream to the handler until done or timeout ...
//! coordinator.shutdown();
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapter::{DiscoverHandler, ProbeAdapter, ProbeHandler, SearchAdapter};
use crate::backend::{DeviceBackend, ProbeEvents, SearchEvents};
use crate::error::Result;
use crate::registry::HandlerRegistry;
use crate::timer::CancellationTimer;
use crate::types::{DiscoverStatus, DiscoveryConfig};

/// Splits probe criteria of the form `"<connection-info>|<brand>"`.
///
/// When the part before the first `|` is non-empty it becomes the connection
/// info and the rest the brand filter; otherwise the criteria passes through
/// unmodified with no brand.
fn split_criteria(criteria: &str) -> (&str, Option<&str>) {
    match criteria.split_once('|') {
        Some((connection_info, brand)) if !connection_info.is_empty() => {
            (connection_info, Some(brand))
        }
        _ => (criteria, None),
    }
}

/// Façade coordinating discover and probe operations against one device
/// backend.
///
/// Dropping the coordinator runs [`shutdown`](Self::shutdown), which blocks
/// until every in-flight adapter observed its terminal signal.
pub struct DiscoveryCoordinator {
    config: DiscoveryConfig,
    backend: Option<Arc<dyn DeviceBackend>>,
    registry: Arc<HandlerRegistry>,
    active_timer: Mutex<Option<CancellationTimer>>,
}

impl DiscoveryCoordinator {
    /// Creates a coordinator operating against `backend`.
    pub fn new(config: DiscoveryConfig, backend: Arc<dyn DeviceBackend>) -> Self {
        Self {
            config,
            backend: Some(backend),
            registry: Arc::new(HandlerRegistry::new()),
            active_timer: Mutex::new(None),
        }
    }

    /// Creates a coordinator with no backend instance available. Discover
    /// operations report a general failure synchronously.
    pub fn without_backend(config: DiscoveryConfig) -> Self {
        Self {
            config,
            backend: None,
            registry: Arc::new(HandlerRegistry::new()),
            active_timer: Mutex::new(None),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Starts a broad device search streaming results to `handler`.
    ///
    /// The handler receives zero or more `device_found` calls, optional
    /// progress updates, and exactly one terminal `finished`. With a
    /// non-zero configured timeout, a cancellation timer asks the backend to
    /// stop when it expires; a search finishing first cancels the timer.
    pub fn start_discover(&self, handler: Arc<dyn DiscoverHandler>) -> Result<()> {
        let Some(backend) = &self.backend else {
            log::warn!("no device backend available, discover reports failure");
            handler.finished(DiscoverStatus::GeneralError);
            return Ok(());
        };

        let adapter = SearchAdapter::register(handler, Arc::clone(&self.registry));

        if self.config.timeout_secs > 0 {
            let stop_backend = Arc::clone(backend);
            let timer = CancellationTimer::arm(
                Duration::from_secs(u64::from(self.config.timeout_secs)),
                move || {
                    // A stop racing natural completion reports the standard
                    // abort code; discard it.
                    if let Err(err) = stop_backend.stop_search() {
                        log::debug!("stop after discover timeout ignored: {}", err);
                    }
                },
            );
            adapter.attach_timer(timer.clone());
            *self.active_timer.lock().unwrap() = Some(timer);
        }

        let events = Arc::clone(&adapter) as Arc<dyn SearchEvents>;
        if let Err(err) = backend.start_search(events, self.config.continuous) {
            log::error!("failed to start device search: {}", err);
            adapter.finish(DiscoverStatus::GeneralError);
            return Err(err);
        }
        Ok(())
    }

    /// Probes one connection endpoint on the default backend.
    ///
    /// `criteria` is either a plain connection info, or
    /// `"<connection-info>|<brand>"` to narrow the probe to one brand.
    /// The handler receives exactly one terminal outcome.
    pub fn start_probe(&self, criteria: &str, handler: Arc<dyn ProbeHandler>) -> Result<()> {
        let Some(backend) = &self.backend else {
            log::warn!("no device backend available, probe reports failure");
            handler.failed(crate::types::ProbeFailure::GeneralError);
            return Ok(());
        };
        let backend = Arc::clone(backend);
        self.start_probe_on(&backend, criteria, handler)
    }

    /// Probes one connection endpoint on an explicitly supplied backend.
    ///
    /// This is the substitution seam: a stand-in backend satisfying the same
    /// [`DeviceBackend`] surface is injected here by the caller instead of
    /// being selected through naming conventions.
    pub fn start_probe_on(
        &self,
        backend: &Arc<dyn DeviceBackend>,
        criteria: &str,
        handler: Arc<dyn ProbeHandler>,
    ) -> Result<()> {
        let (connection_info, brand) = split_criteria(criteria);
        let adapter = ProbeAdapter::register(handler, Arc::clone(&self.registry));
        let events = Arc::clone(&adapter) as Arc<dyn ProbeEvents>;
        if let Err(err) = backend.autodetect(events, connection_info, brand) {
            log::error!("failed to start autodetect for {:?}: {}", connection_info, err);
            // No backend error was recorded, so this surfaces as GeneralError.
            adapter.finish();
            return Err(err);
        }
        Ok(())
    }

    /// Advisory spacing before the next discover, in seconds.
    pub fn advise_timeout_for_next_discover(&self) -> u32 {
        self.config.interval_secs
    }

    /// Cancels any pending timer, requests the backend to stop, and blocks
    /// until every in-flight adapter received its terminal signal.
    pub fn shutdown(&self) {
        if let Some(timer) = self.active_timer.lock().unwrap().take() {
            timer.cancel();
        }
        if let Some(backend) = &self.backend {
            if let Err(err) = backend.stop_search() {
                log::debug!("stop during shutdown ignored: {}", err);
            }
        }
        self.registry.drain_and_wait();
    }
}

impl Drop for DiscoveryCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
