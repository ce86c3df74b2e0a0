//! Identifier newtypes for configuration memory and device identification.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Ord`, `Hash`, and
//! `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` value.
            pub const fn from_raw(value: u32) -> Self {
                Self(value)
            }

            /// Returns the raw `u32` value.
            pub const fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:08X}", self.0)
            }
        }
    };
}

define_id!(
    /// A dense, linear configuration frame address as carried by the FAR register.
    FrameAddress
);

define_id!(
    /// A 32-bit JTAG-style device identifier embedded in a bitstream.
    IdCode
);

impl FrameAddress {
    /// Returns the address following this one (the FAR auto-increment step),
    /// or `None` when the register would wrap past `0xFFFFFFFF`.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

/// Mask selecting everything but the 4-bit silicon revision field.
const IDCODE_REVISION_MASK: u32 = 0x0FFF_FFFF;

impl IdCode {
    /// Returns the IDCODE with the silicon revision nibble (bits 31..28) cleared.
    pub fn without_revision(self) -> Self {
        Self(self.0 & IDCODE_REVISION_MASK)
    }

    /// Returns the silicon revision nibble.
    pub fn revision(self) -> u8 {
        (self.0 >> 28) as u8
    }
}

/// Error type for parsing IDCODE strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdCodeError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseIdCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid IDCODE '{}': expected a 32-bit hex value", self.input)
    }
}

impl std::error::Error for ParseIdCodeError {}

impl FromStr for IdCode {
    type Err = ParseIdCodeError;

    /// Parses `"0x0362D093"`, `"0X0362d093"` or bare `"0362D093"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if hex.is_empty() || hex.len() > 8 {
            return Err(ParseIdCodeError {
                input: s.to_string(),
            });
        }
        u32::from_str_radix(hex, 16)
            .map(IdCode)
            .map_err(|_| ParseIdCodeError {
                input: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn id_roundtrip() {
        let addr = FrameAddress::from_raw(42);
        assert_eq!(addr.as_raw(), 42);
    }

    #[test]
    fn frame_address_ordering() {
        let set: BTreeSet<_> = [5, 1, 3].into_iter().map(FrameAddress::from_raw).collect();
        let raw: Vec<u32> = set.into_iter().map(FrameAddress::as_raw).collect();
        assert_eq!(raw, vec![1, 3, 5]);
    }

    #[test]
    fn frame_address_next() {
        assert_eq!(FrameAddress::from_raw(7).next(), Some(FrameAddress::from_raw(8)));
        assert_eq!(FrameAddress::from_raw(u32::MAX).next(), None);
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(format!("{}", FrameAddress::from_raw(5)), "0x00000005");
        assert_eq!(format!("{}", IdCode::from_raw(0x0362_D093)), "0x0362D093");
    }

    #[test]
    fn parse_idcode_forms() {
        let expected = IdCode::from_raw(0x0362_D093);
        assert_eq!("0x0362D093".parse::<IdCode>().unwrap(), expected);
        assert_eq!("0X0362d093".parse::<IdCode>().unwrap(), expected);
        assert_eq!("0362D093".parse::<IdCode>().unwrap(), expected);
    }

    #[test]
    fn parse_idcode_rejects_garbage() {
        assert!("".parse::<IdCode>().is_err());
        assert!("0x".parse::<IdCode>().is_err());
        assert!("0xXYZ".parse::<IdCode>().is_err());
        assert!("0x1234567890".parse::<IdCode>().is_err());
    }

    #[test]
    fn revision_masking() {
        let id = IdCode::from_raw(0x2362_D093);
        assert_eq!(id.revision(), 2);
        assert_eq!(id.without_revision(), IdCode::from_raw(0x0362_D093));
    }

    #[test]
    fn serde_roundtrip() {
        let id = IdCode::from_raw(0x1234_5678);
        let json = serde_json::to_string(&id).unwrap();
        let back: IdCode = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
