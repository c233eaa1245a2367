//! Offer construction from backend search results.
//!
//! Translates one backend-provided [`DeviceResult`] into the canonical
//! ordered property list handed to the trading/directory service. Pure;
//! rejection is reported to the caller, which logs and drops the result.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::types::{prop, DeviceResult, IpDeviceResult, Offer, OfferProperty};

/// Reserved description value meaning "registered but currently offline".
///
/// A result carrying exactly this raw description is accepted regardless of
/// its driver fields, and its description is replaced by a synthesized
/// minimal device document.
pub const OFFLINE_GENERIC_DESCRIPTION: &str = "offline-generic-device";

/// Schema version stamped into the synthesized offline-device document.
const OFFLINE_SCHEMA_VERSION: u32 = 1;

/// Reasons a result cannot be turned into an offer.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferError {
    /// The result cannot be interrogated as an IP-style device result.
    #[error("result is not an IP device result")]
    NotIpDevice,
    /// The result reports no driver name (and is not offline-generic).
    #[error("driver name is empty")]
    EmptyDriverName,
    /// The result reports driver version 0 (and is not offline-generic).
    #[error("driver version is zero")]
    ZeroDriverVersion,
}

/// Builds the canonical offer for one search result.
///
/// Produces exactly 9 properties in fixed order, plus a 10th base64
/// `device_description` property when the result exposes an extended
/// description. A description equal to [`OFFLINE_GENERIC_DESCRIPTION`]
/// bypasses the driver-name/driver-version acceptance check and is replaced
/// by a synthesized JSON document.
pub fn build_offer(result: &DeviceResult) -> Result<Offer, OfferError> {
    let ip = match result {
        DeviceResult::Ip(ip) => ip,
        _ => return Err(OfferError::NotIpDevice),
    };

    // Sentinel match is on the raw description, before any cleanup.
    let offline_generic = ip.description.as_deref() == Some(OFFLINE_GENERIC_DESCRIPTION);

    if !offline_generic {
        if ip.driver_name.is_empty() {
            return Err(OfferError::EmptyDriverName);
        }
        if ip.driver_version == 0 {
            return Err(OfferError::ZeroDriverVersion);
        }
    }

    let mut properties = vec![
        property(prop::DRIVER, strip_control(&ip.driver_name)),
        property(prop::DRIVER_VERSION, ip.dotted_driver_version()),
        property(prop::MAC_ADDRESS, strip_control(&ip.mac)),
        property(prop::IP_ADDRESS, strip_control(&ip.lan_address)),
        property(prop::IP_PORT, ip.port.to_string()),
        property(prop::VENDOR, strip_control(&ip.brand)),
        property(prop::MODEL, strip_control(&ip.model)),
        property(prop::FIRMWARE_VERSION, strip_control(&ip.firmware)),
        property(prop::WAN_ADDRESS, strip_control(&ip.wan_address)),
    ];

    if let Some(raw) = &ip.description {
        let description = if offline_generic {
            offline_device_document(ip)
        } else {
            strip_control(raw)
        };
        properties.push(property(
            prop::DEVICE_DESCRIPTION,
            BASE64.encode(description.as_bytes()),
        ));
    }

    Ok(Offer::from_properties(properties))
}

fn property(name: &'static str, value: String) -> OfferProperty {
    OfferProperty { name, value }
}

/// Removes control characters from a free-text field.
fn strip_control(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect()
}

/// Synthesizes the minimal device document for a registered-but-offline
/// device: brand, firmware, model, schema version, and one empty
/// video-source/streaming placeholder.
fn offline_device_document(ip: &IpDeviceResult) -> String {
    serde_json::json!({
        "brand": strip_control(&ip.brand),
        "firmware": strip_control(&ip.firmware),
        "model": strip_control(&ip.model),
        "schemaVersion": OFFLINE_SCHEMA_VERSION,
        "videoSources": [
            { "streams": [] }
        ],
    })
    .to_string()
}
