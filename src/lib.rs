//! Asynchronous device discovery with canonical trading-service offers.
//!
//! This crate coordinates discovery operations against a pluggable
//! hardware-device backend and converts backend results into the canonical
//! "offer" property list consumed by a trading/directory protocol.
//!
//! Two operation kinds are exposed:
//!
//! - **Discover** — a broad, possibly continuous search that streams each
//!   newly found device to a caller-supplied [`DiscoverHandler`] until the
//!   backend finishes or the configured timeout stops it.
//! - **Probe** — a targeted autodetect against one connection endpoint that
//!   accumulates zero or more results and reports a single terminal outcome
//!   to a [`ProbeHandler`].
//!
//! # Getting Started
//!
//! ```ignore
//! use std::sync::Arc;
//! use trader_discovery::{DiscoveryConfig, DiscoveryCoordinator};
//!
//! let coordinator = DiscoveryCoordinator::new(DiscoveryConfig::default(), backend);
//!
//! // Stream devices for up to the configured timeout.
//! coordinator.start_discover(my_handler)?;
//!
//! // Probe one endpoint, optionally narrowed to a brand.
//! coordinator.start_probe("10.0.0.5:80:admin:pw|AcmeCorp", my_probe_handler)?;
//!
//! // Blocks until every in-flight operation observed its terminal signal.
//! coordinator.shutdown();
//! ```
//!
//! # Threading
//!
//! The backend invokes callbacks from its own worker thread(s), possibly
//! concurrently and after the initiating call returned. The handler adapters
//! in this crate absorb that: shared state is guarded by fine-grained
//! per-adapter and per-registry mutexes, terminal delivery is exactly-once,
//! and shutdown joins all in-flight operations. See [`backend`] for the full
//! contract.

pub mod adapter;
pub mod backend;
pub mod coordinator;
mod error;
pub mod offer;
pub mod registry;
pub mod timer;
pub mod types;

// Crate-level error types
pub use error::{Error, Result};

// Backend capability surface
pub use backend::{DeviceBackend, ProbeEvents, SearchEvents};

// Caller-facing handlers and adapters
pub use adapter::{DiscoverHandler, ProbeAdapter, ProbeHandler, SearchAdapter};

// Coordinator
pub use coordinator::DiscoveryCoordinator;

// Offer construction
pub use offer::{build_offer, OfferError, OFFLINE_GENERIC_DESCRIPTION};

// Registry and timer
pub use registry::{HandlerRegistry, RegisteredAdapter, RegistryHandle};
pub use timer::CancellationTimer;

// Core types
pub use types::{
    prop, BackendError, DeviceResult, DiscoverStatus, DiscoveryConfig, IpDeviceResult, Offer,
    OfferProperty, ProbeFailure, DEFAULT_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS,
};
