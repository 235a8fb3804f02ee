//! Devices, Endpoints and Profiles
//!
//! A transport always belongs to one remote audio device and to one local
//! media endpoint. The endpoint carries the profile UUID, which decides the
//! streaming backend of every transport created on it.

use core::fmt::Write;

use crate::constants::{
    A2DP_SINK_UUID, A2DP_SOURCE_UUID, HFP_AG_UUID, HSP_AG_UUID, MAX_PATH_LENGTH,
};
use crate::{BluetoothAddress, TransportError};

/// Object path type used for adapters, devices and transports
pub type ObjectPath = heapless::String<MAX_PATH_LENGTH>;

/// AVDTP Stream Endpoint Identifier (SEID) of a local stream endpoint
pub type StreamEndpointId = u8;

/// Audio profiles a transport can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Profile {
    /// A2DP Source
    A2dpSource,
    /// A2DP Sink
    A2dpSink,
    /// Headset Profile Audio Gateway
    HspAudioGateway,
    /// Hands-Free Profile Audio Gateway
    HfpAudioGateway,
}

impl Profile {
    /// Resolve a profile from its service class UUID
    ///
    /// Comparison is case-insensitive; unknown UUIDs yield `None`.
    #[must_use]
    pub fn from_uuid(uuid: &str) -> Option<Self> {
        [
            Self::A2dpSource,
            Self::A2dpSink,
            Self::HspAudioGateway,
            Self::HfpAudioGateway,
        ]
        .into_iter()
        .find(|profile| profile.uuid().eq_ignore_ascii_case(uuid))
    }

    /// Service class UUID of the profile
    #[must_use]
    pub const fn uuid(self) -> &'static str {
        match self {
            Self::A2dpSource => A2DP_SOURCE_UUID,
            Self::A2dpSink => A2DP_SINK_UUID,
            Self::HspAudioGateway => HSP_AG_UUID,
            Self::HfpAudioGateway => HFP_AG_UUID,
        }
    }

    /// Whether the profile streams over AVDTP (as opposed to a SCO voice link)
    #[must_use]
    pub const fn is_a2dp(self) -> bool {
        matches!(self, Self::A2dpSource | Self::A2dpSink)
    }
}

/// Remote audio device a transport streams to or from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Device object path, `<adapter path>/dev_XX_XX_XX_XX_XX_XX`
    pub path: ObjectPath,
    /// Local adapter address
    pub src: BluetoothAddress,
    /// Remote device address
    pub dst: BluetoothAddress,
}

impl AudioDevice {
    /// Create a device under the given adapter path
    ///
    /// # Errors
    /// Returns `TransportError::InvalidArguments` if the resulting object
    /// path does not fit into [`ObjectPath`].
    pub fn new(
        adapter_path: &str,
        src: BluetoothAddress,
        dst: BluetoothAddress,
    ) -> Result<Self, TransportError> {
        let mut path = ObjectPath::new();
        write!(path, "{}/{}", adapter_path, dst.object_path_segment())
            .map_err(|_| TransportError::InvalidArguments)?;
        Ok(Self { path, src, dst })
    }
}

/// Local media endpoint that negotiated the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaEndpoint {
    /// Profile served by the endpoint
    pub profile: Profile,
    /// Codec identifier (A2DP codec type, 0x00 = SBC)
    pub codec: u8,
    /// Local stream endpoint backing the endpoint (A2DP only)
    pub sep: Option<StreamEndpointId>,
}

impl MediaEndpoint {
    /// Create an endpoint from the UUID advertised by the media application
    ///
    /// # Errors
    /// - `TransportError::NotSupported` if the UUID is not an audio profile
    ///   this broker can stream
    /// - `TransportError::InvalidArguments` if an A2DP endpoint has no stream
    ///   endpoint
    pub fn new(
        uuid: &str,
        codec: u8,
        sep: Option<StreamEndpointId>,
    ) -> Result<Self, TransportError> {
        let profile = Profile::from_uuid(uuid).ok_or(TransportError::NotSupported)?;
        if profile.is_a2dp() && sep.is_none() {
            return Err(TransportError::InvalidArguments);
        }
        Ok(Self {
            profile,
            codec,
            sep,
        })
    }

    /// Service class UUID of the endpoint
    #[must_use]
    pub const fn uuid(&self) -> &'static str {
        self.profile.uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_uuid() {
        assert_eq!(Profile::from_uuid(A2DP_SOURCE_UUID), Some(Profile::A2dpSource));
        assert_eq!(Profile::from_uuid(A2DP_SINK_UUID), Some(Profile::A2dpSink));
        assert_eq!(Profile::from_uuid(HSP_AG_UUID), Some(Profile::HspAudioGateway));
        assert_eq!(
            Profile::from_uuid("0000111F-0000-1000-8000-00805F9B34FB"),
            Some(Profile::HfpAudioGateway)
        );
        // Hands-Free unit side is not a transport profile
        assert_eq!(Profile::from_uuid("0000111e-0000-1000-8000-00805f9b34fb"), None);
    }

    #[test]
    fn test_device_path() {
        let device = AudioDevice::new(
            "/org/bluez/hci0",
            BluetoothAddress::new([0; 6]),
            BluetoothAddress::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
        )
        .unwrap();
        assert_eq!(device.path.as_str(), "/org/bluez/hci0/dev_00_11_22_33_44_55");
    }

    #[test]
    fn test_device_path_too_long() {
        let adapter = "/org/bluez/a-very-long-adapter-path-that-keeps-going-and-going-well-past-the-limit";
        let result = AudioDevice::new(
            adapter,
            BluetoothAddress::new([0; 6]),
            BluetoothAddress::new([1; 6]),
        );
        assert_eq!(result, Err(TransportError::InvalidArguments));
    }

    #[test]
    fn test_endpoint_requires_sep_for_a2dp() {
        assert_eq!(
            MediaEndpoint::new(A2DP_SINK_UUID, 0x00, None),
            Err(TransportError::InvalidArguments)
        );
        let endpoint = MediaEndpoint::new(HFP_AG_UUID, 0x01, None).unwrap();
        assert_eq!(endpoint.profile, Profile::HfpAudioGateway);
        assert_eq!(endpoint.uuid(), HFP_AG_UUID);
    }

    #[test]
    fn test_endpoint_unknown_uuid() {
        assert_eq!(
            MediaEndpoint::new("00001234-0000-1000-8000-00805f9b34fb", 0x00, None),
            Err(TransportError::NotSupported)
        );
    }
}
