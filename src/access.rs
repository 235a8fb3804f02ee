//! Access Types
//!
//! Clients ask for read and/or write access to a transport with a short
//! string made of the characters `r` and `w` (for example `"r"`, `"w"`,
//! `"rw"` or `"wr"`). Order does not matter and unrecognized characters are
//! ignored, but at least one of the two must be present.
//!
//! Internally an access type is a two-bit set, which makes the release rules
//! (equal, strict subset, anything else) plain set comparisons.

use core::fmt;

/// A combination of read and write access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccessType(u8);

impl AccessType {
    /// No access
    pub const NONE: Self = Self(0);
    /// Read access only
    pub const READ: Self = Self(0x01);
    /// Write access only
    pub const WRITE: Self = Self(0x02);
    /// Read and write access
    pub const READ_WRITE: Self = Self(0x03);

    /// Parse an access type string
    ///
    /// Returns `None` when the string contains neither `r` nor `w`.
    #[must_use]
    pub fn parse(accesstype: &str) -> Option<Self> {
        let mut access = Self::NONE;
        if accesstype.contains('r') {
            access = access.union(Self::READ);
        }
        if accesstype.contains('w') {
            access = access.union(Self::WRITE);
        }
        if access.is_empty() { None } else { Some(access) }
    }

    /// Build an access type from the two lock bits
    #[must_use]
    pub const fn from_locks(read: bool, write: bool) -> Self {
        let mut bits = 0;
        if read {
            bits |= Self::READ.0;
        }
        if write {
            bits |= Self::WRITE.0;
        }
        Self(bits)
    }

    /// Whether read access is included
    #[must_use]
    pub const fn read(self) -> bool {
        self.0 & Self::READ.0 != 0
    }

    /// Whether write access is included
    #[must_use]
    pub const fn write(self) -> bool {
        self.0 & Self::WRITE.0 != 0
    }

    /// Whether no access bit is set
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bits present in either access type
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bits present in both access types
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Bits of `self` not present in `other`
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Whether `self` and `other` share at least one bit
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether every bit of `self` is also in `other`
    #[must_use]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Canonical string form (`""`, `"r"`, `"w"` or `"rw"`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match (self.read(), self.write()) {
            (true, true) => "rw",
            (true, false) => "r",
            (false, true) => "w",
            (false, false) => "",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
