//! Media Transport Constants
//!
//! This module contains the limits, default values and Bluetooth profile
//! identifiers used throughout the media transport broker. All collections in
//! the crate are fixed-capacity, so the limits below bound how many transports,
//! owners and pending teardowns can exist at once.

/// Maximum number of transports the broker can publish at the same time
///
/// Must be a power of two (backing storage is a `FnvIndexMap`).
pub const MAX_TRANSPORTS: usize = 8;

/// Maximum number of owners per transport
///
/// Only two lock bits exist, so at most two owners can hold a transport
/// concurrently; the extra slots are never needed but keep the bound explicit.
pub const MAX_OWNERS: usize = 4;

/// Maximum number of owner teardowns waiting for the next scheduling turn
pub const MAX_DEFERRED: usize = MAX_TRANSPORTS * MAX_OWNERS;

/// Maximum length of a bus client name (unique or well-known)
pub const MAX_BUS_NAME_LENGTH: usize = 64;

/// Maximum length of an object path (adapter, device or transport)
pub const MAX_PATH_LENGTH: usize = 96;

/// Maximum size of a negotiated codec configuration blob
pub const MAX_CONFIGURATION_SIZE: usize = 32;

/// Maximum length of an access type string accepted from the bus
pub const MAX_ACCESS_TYPE_LENGTH: usize = 8;

/// Maximum length of a property name accepted by `SetProperty`
pub const MAX_PROPERTY_NAME_LENGTH: usize = 32;

/// Capacity of the processor event channel
pub const EVENT_QUEUE_SIZE: usize = 8;

/// Nominal SCO frame size used as MTU for voice-channel descriptors
pub const DEFAULT_SCO_MTU: u16 = 48;

/// `BD_ADDR` length in bytes
pub const BD_ADDR_LENGTH: usize = 6;

/// D-Bus interface name of a media transport object
pub const MEDIA_TRANSPORT_INTERFACE: &str = "org.bluez.MediaTransport";

/// Prefix of every error name returned on the transport interface
pub const ERROR_INTERFACE: &str = "org.bluez.Error";

/// A2DP Source service class UUID
pub const A2DP_SOURCE_UUID: &str = "0000110a-0000-1000-8000-00805f9b34fb";

/// A2DP Sink service class UUID
pub const A2DP_SINK_UUID: &str = "0000110b-0000-1000-8000-00805f9b34fb";

/// Headset Profile Audio Gateway service class UUID
pub const HSP_AG_UUID: &str = "00001112-0000-1000-8000-00805f9b34fb";

/// Hands-Free Profile Audio Gateway service class UUID
pub const HFP_AG_UUID: &str = "0000111f-0000-1000-8000-00805f9b34fb";
