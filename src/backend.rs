//! Device backend capability trait and callback surfaces.
//!
//! This module defines the [`DeviceBackend`] trait that hardware backends
//! implement, and the [`SearchEvents`] / [`ProbeEvents`] callback traits the
//! backend invokes from its own worker thread(s).
//!
//! # Threading Contract
//!
//! The backend is fully asynchronous and callback-based. After
//! `start_search` or `autodetect` returns, callbacks may arrive from zero,
//! one, or many backend threads — possibly concurrently — until `done` fires
//! for that handler. Implementations of the callback traits must therefore
//! be `Send + Sync` and guard their own state. `done` is the sole terminal
//! signal; `failed` never terminates an operation on its own.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{BackendError, DeviceResult};

/// Callback surface for a broad device search.
pub trait SearchEvents: Send + Sync {
    /// A device was found. May be invoked any number of times before `done`.
    fn device_found(&self, result: DeviceResult);

    /// Search progress as a `num/den` fraction. Advisory; `den` may be 0.
    fn report_progress(&self, num: u32, den: u32);

    /// The search finished. Invoked exactly once, last.
    fn done(&self);

    /// The backend hit an error. Not terminal; `done` still follows.
    fn failed(&self, error: BackendError);
}

/// Callback surface for a targeted autodetect probe.
pub trait ProbeEvents: Send + Sync {
    /// A matching device variant was detected. Multiple matches per probe
    /// are expected.
    fn autodetected(&self, result: DeviceResult);

    /// The probe finished. Invoked exactly once, last.
    fn done(&self);

    /// The backend hit an error. Not terminal; `done` still follows.
    fn failed(&self, error: BackendError);
}

/// Capability surface of the hardware-device backend.
///
/// The backend owns its search and autodetect algorithms and protocol
/// drivers; this crate only coordinates operations against it. Stand-in
/// backends used for substitution satisfy this same surface.
pub trait DeviceBackend: Send + Sync {
    /// Start a device search, continuous or one-shot. Results stream to
    /// `handler` from the backend's own thread(s).
    fn start_search(&self, handler: Arc<dyn SearchEvents>, continuous: bool) -> Result<()>;

    /// Request the running search to stop. After the search already
    /// finished this reports the standard [`BackendError::Aborted`] code.
    fn stop_search(&self) -> Result<()>;

    /// Probe one connection endpoint, optionally narrowed to a brand.
    /// Zero or more `autodetected` callbacks precede a single `done`.
    fn autodetect(
        &self,
        handler: Arc<dyn ProbeEvents>,
        connection_info: &str,
        brand: Option<&str>,
    ) -> Result<()>;
}
