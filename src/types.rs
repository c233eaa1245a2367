//! Core data types for device discovery and offer construction.
//!
//! Provides backend-agnostic types for search results, canonical offers,
//! error codes, and discovery configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Search Results
// =============================================================================

/// A single result reported by the hardware backend during a search or probe.
///
/// Results are read-only as far as this crate is concerned; the backend owns
/// their production. Only IP-style device results can be converted into
/// offers — anything else is rejected by the offer builder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum DeviceResult {
    /// An IP-style device result carrying the full field set.
    Ip(IpDeviceResult),
    /// A result from a driver family this core cannot interrogate.
    Unsupported,
}

/// Field set of an IP-style device result.
///
/// `description` models the extended-description capability: `None` means the
/// accessor does not exist on the result and no description property is ever
/// emitted for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IpDeviceResult {
    /// Device brand / vendor name.
    pub brand: String,
    /// Device model name.
    pub model: String,
    /// Firmware version string.
    pub firmware: String,
    /// Name of the protocol driver that produced this result.
    pub driver_name: String,
    /// Packed numeric driver version; renders as a dotted string.
    pub driver_version: u32,
    /// LAN IP address.
    pub lan_address: String,
    /// WAN IP address.
    pub wan_address: String,
    /// MAC address.
    pub mac: String,
    /// Device control port.
    pub port: u16,
    /// Raw device description, when the result exposes one.
    pub description: Option<String>,
}

impl IpDeviceResult {
    /// Renders the packed driver version as a dotted string,
    /// one component per big-endian byte (`0x01020304` -> `"1.2.3.4"`).
    pub fn dotted_driver_version(&self) -> String {
        let [a, b, c, d] = self.driver_version.to_be_bytes();
        format!("{}.{}.{}.{}", a, b, c, d)
    }
}

// =============================================================================
// Offers
// =============================================================================

/// Offer property names, in the fixed wire order.
pub mod prop {
    pub const DRIVER: &str = "driver";
    pub const DRIVER_VERSION: &str = "driver_version";
    pub const MAC_ADDRESS: &str = "mac_address";
    pub const IP_ADDRESS: &str = "ip_address";
    pub const IP_PORT: &str = "ip_port";
    pub const VENDOR: &str = "vendor";
    pub const MODEL: &str = "model";
    pub const FIRMWARE_VERSION: &str = "firmware_version";
    pub const WAN_ADDRESS: &str = "wan_address";
    pub const DEVICE_DESCRIPTION: &str = "device_description";
}

/// One named string property of an offer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct OfferProperty {
    /// Property name, one of the names in [`prop`].
    pub name: &'static str,
    /// Property value. Numeric fields render decimal, the description
    /// property is base64.
    pub value: String,
}

/// Canonical ordered property list describing one discovered device.
///
/// Exactly 9 properties normally, 10 when the backend result exposed an
/// extended description; the name order is fixed (see [`prop`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Offer {
    properties: Vec<OfferProperty>,
}

impl Offer {
    pub(crate) fn from_properties(properties: Vec<OfferProperty>) -> Self {
        Self { properties }
    }

    /// Number of properties (9 or 10).
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if the offer has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks up a property value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Iterates the properties in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &OfferProperty> {
        self.properties.iter()
    }

    /// The properties in wire order.
    pub fn properties(&self) -> &[OfferProperty] {
        &self.properties
    }
}

// =============================================================================
// Status and Error Codes
// =============================================================================

/// Error codes reported by the hardware backend through `failed` callbacks
/// and by `stop_search` when the search already finished.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BackendError {
    /// Standard abort/cancellation code; a stop request that raced natural
    /// completion surfaces this and is discarded.
    #[error("operation aborted")]
    Aborted,
    /// The device rejected the supplied credentials.
    #[error("authorization failed")]
    AuthorizationFailed,
    /// The device could not be reached.
    #[error("general connection error")]
    ConnectionFailed,
    /// Any other backend-specific error code.
    #[error("backend error code {0}")]
    Other(u32),
}

/// Terminal status of a discover operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiscoverStatus {
    /// The search ran to completion.
    NoError,
    /// The search could not run (backend unavailable or failed to start).
    GeneralError,
}

/// Terminal failure of a probe operation, mapped from the last backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProbeFailure {
    /// The device rejected the supplied credentials.
    AuthorizationFailed,
    /// The device could not be reached.
    ConnectionError,
    /// Any other failure, including a probe that found nothing and never
    /// recorded a backend error.
    GeneralError,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::AuthorizationFailed => write!(f, "authorization failed"),
            ProbeFailure::ConnectionError => write!(f, "connection error"),
            ProbeFailure::GeneralError => write!(f, "general error"),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Default auto-stop timeout for discover operations, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u32 = 30;

/// Default advisory spacing between discover operations, in seconds.
pub const DEFAULT_INTERVAL_SECS: u32 = 300;

/// Discovery coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscoveryConfig {
    /// Auto-stop timeout for a discover operation in seconds. 0 disables
    /// the cancellation timer.
    pub timeout_secs: u32,
    /// Advisory spacing between discover operations in seconds. Enforced by
    /// the caller, not by this crate.
    pub interval_secs: u32,
    /// Whether searches run continuously until stopped, or one-shot.
    pub continuous: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            interval_secs: DEFAULT_INTERVAL_SECS,
            continuous: true,
        }
    }
}

impl DiscoveryConfig {
    /// Creates a config with defaults (30s timeout, 300s interval, continuous).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the auto-stop timeout in seconds. 0 disables the timer.
    pub fn with_timeout_secs(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the advisory discover interval in seconds.
    pub fn with_interval_secs(mut self, secs: u32) -> Self {
        self.interval_secs = secs;
        self
    }

    /// Run searches one-shot instead of continuously.
    pub fn one_shot(mut self) -> Self {
        self.continuous = false;
        self
    }

    /// Builds a config from raw string fields, e.g. values read from a
    /// process configuration store. Fields that are absent or fail to parse
    /// are logged and left at their defaults.
    pub fn from_fields(timeout: Option<&str>, interval: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = timeout {
            match raw.trim().parse::<u32>() {
                Ok(secs) => config.timeout_secs = secs,
                Err(err) => {
                    log::warn!("invalid discover timeout {:?}, keeping default: {}", raw, err)
                }
            }
        }
        if let Some(raw) = interval {
            match raw.trim().parse::<u32>() {
                Ok(secs) => config.interval_secs = secs,
                Err(err) => {
                    log::warn!("invalid discover interval {:?}, keeping default: {}", raw, err)
                }
            }
        }
        config
    }
}
