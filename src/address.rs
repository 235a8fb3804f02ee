use bt_hci::param::BdAddr;

use crate::constants::BD_ADDR_LENGTH;

/// A Bluetooth Device Address (`BD_ADDR`) wrapper for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BluetoothAddress(pub [u8; BD_ADDR_LENGTH]);

const HEX_CHARS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F',
];

impl BluetoothAddress {
    /// Create a new Bluetooth address from bytes
    #[must_use]
    pub const fn new(addr: [u8; BD_ADDR_LENGTH]) -> Self {
        Self(addr)
    }

    /// Get the raw address bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BD_ADDR_LENGTH] {
        &self.0
    }

    /// Format the address as the last segment of a device object path
    ///
    /// `12:34:56:78:9A:BC` becomes `dev_12_34_56_78_9A_BC`.
    #[must_use]
    pub fn object_path_segment(&self) -> heapless::String<21> {
        let mut segment = heapless::String::new();
        segment.push_str("dev_").ok();
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                segment.push('_').ok();
            }
            segment.push(HEX_CHARS[(byte >> 4) as usize]).ok();
            segment.push(HEX_CHARS[(byte & 0x0F) as usize]).ok();
        }
        segment
    }
}

impl From<[u8; BD_ADDR_LENGTH]> for BluetoothAddress {
    fn from(addr: [u8; BD_ADDR_LENGTH]) -> Self {
        Self(addr)
    }
}

/// Addresses cross into the profile layers as HCI parameters
impl From<BluetoothAddress> for BdAddr {
    fn from(addr: BluetoothAddress) -> Self {
        BdAddr::new(addr.0)
    }
}
