//! Transport Properties
//!
//! `GetProperties` answers with a point-in-time snapshot of a transport. The
//! snapshot is an owned value so it can outlive the borrow of the transport
//! and be handed to the bus for encoding as an `a{sv}` dictionary.

use heapless::Vec;

use crate::constants::MAX_CONFIGURATION_SIZE;
use crate::device::ObjectPath;

/// Profile-specific properties appended after the common ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BackendProperties {
    /// A2DP transports report their playback delay
    A2dp {
        /// Delay in 1/10 milliseconds
        delay: u16,
    },
    /// Headset transports report the audio gateway features
    Headset {
        /// Noise reduction and echo cancelling enabled
        nrec: bool,
        /// In-band ringtone enabled
        inband_ringtone: bool,
    },
}

/// Snapshot of every property of a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportProperties {
    /// Object path of the owning device
    pub device: ObjectPath,
    /// Read lock held by some owner
    pub read_lock: bool,
    /// Write lock held by some owner
    pub write_lock: bool,
    /// Input MTU of the live descriptor
    pub imtu: u16,
    /// Output MTU of the live descriptor
    pub omtu: u16,
    /// Profile UUID of the endpoint
    pub uuid: &'static str,
    /// Codec identifier of the endpoint
    pub codec: u8,
    /// Negotiated codec configuration
    pub configuration: Vec<u8, MAX_CONFIGURATION_SIZE>,
    /// Backend specific extras
    pub backend: BackendProperties,
}

/// Value of a single property, typed as it goes on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyValue<'a> {
    /// `o`
    ObjectPath(&'a str),
    /// `b`
    Boolean(bool),
    /// `q`
    Uint16(u16),
    /// `s`
    String(&'a str),
    /// `y`
    Byte(u8),
    /// `ay`
    Bytes(&'a [u8]),
}

/// Largest number of entries a snapshot expands to (headset transports)
pub const MAX_PROPERTY_ENTRIES: usize = 10;

impl TransportProperties {
    /// Dictionary entries in bus order
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, PropertyValue<'_>), MAX_PROPERTY_ENTRIES> {
        let mut entries = Vec::new();
        let common = [
            ("Device", PropertyValue::ObjectPath(self.device.as_str())),
            ("ReadLock", PropertyValue::Boolean(self.read_lock)),
            ("WriteLock", PropertyValue::Boolean(self.write_lock)),
            ("IMTU", PropertyValue::Uint16(self.imtu)),
            ("OMTU", PropertyValue::Uint16(self.omtu)),
            ("UUID", PropertyValue::String(self.uuid)),
            ("Codec", PropertyValue::Byte(self.codec)),
            ("Configuration", PropertyValue::Bytes(self.configuration.as_slice())),
        ];
        for entry in common {
            entries.push(entry).ok();
        }

        match self.backend {
            BackendProperties::A2dp { delay } => {
                entries.push(("Delay", PropertyValue::Uint16(delay))).ok();
            }
            BackendProperties::Headset {
                nrec,
                inband_ringtone,
            } => {
                entries.push(("NREC", PropertyValue::Boolean(nrec))).ok();
                entries
                    .push(("InbandRingtone", PropertyValue::Boolean(inband_ringtone)))
                    .ok();
            }
        }
        entries
    }

    /// Look up a single entry by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyValue<'_>> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}

/// Property change announced through `PropertyChanged`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PropertyChange {
    /// New input MTU
    Imtu(u16),
    /// New output MTU
    Omtu(u16),
    /// New A2DP delay
    Delay(u16),
}

impl PropertyChange {
    /// Property name as seen on the bus
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Imtu(_) => "IMTU",
            Self::Omtu(_) => "OMTU",
            Self::Delay(_) => "Delay",
        }
    }

    /// New value of the property
    #[must_use]
    pub const fn value(&self) -> PropertyValue<'static> {
        match *self {
            Self::Imtu(v) | Self::Omtu(v) | Self::Delay(v) => PropertyValue::Uint16(v),
        }
    }
}
