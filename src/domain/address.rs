//! MAC address codec.
//!
//! A `MacAddress` is a 48-bit integer. The canonical string form is
//! derived from it on demand, so the two can never drift apart.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;
use std::sync::OnceLock;

use macaddr::MacAddr6;
use regex::Regex;

use crate::error::AddressError;

/// Mask for the 48 significant bits of a MAC address.
const MAC_BITS: u64 = 0xFFFF_FFFF_FFFF;

fn mac_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9A-F]{2}:){5}[0-9A-F]{2}$").expect("MAC pattern is a valid regex")
    })
}

/// A 48-bit hardware address.
///
/// Ordering follows the integer value. Arithmetic wraps at the 48-bit
/// boundary: `FF:FF:FF:FF:FF:FF + 1 == 00:00:00:00:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress(u64);

impl MacAddress {
    /// Build an address from an integer, keeping the low 48 bits.
    pub fn new(value: u64) -> Self {
        Self(value & MAC_BITS)
    }

    /// Parse a MAC string.
    ///
    /// Accepts `:`, `-` and `.` octet delimiters in any case; the
    /// delimiters are normalized to `:` before validation.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let normalized = input.trim().replace(['-', '.'], ":").to_ascii_uppercase();
        if !mac_pattern().is_match(&normalized) {
            return Err(AddressError::InvalidAddress(input.to_string()));
        }
        let digits: String = normalized.chars().filter(|c| *c != ':').collect();
        u64::from_str_radix(&digits, 16)
            .map(Self)
            .map_err(|_| AddressError::InvalidAddress(input.to_string()))
    }

    /// The address as an integer.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The six octets, most significant first.
    pub fn octets(&self) -> [u8; 6] {
        let bytes = self.0.to_be_bytes();
        [bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
    }

    /// The 12 uppercase hex digits without delimiters (`00904CC1AC21`).
    /// Used for OUI prefix matching and per-target file names.
    pub fn hex_digits(&self) -> String {
        format!("{:012X}", self.0)
    }

    pub fn wrapping_add(self, rhs: u64) -> Self {
        Self::new(self.0.wrapping_add(rhs))
    }

    pub fn wrapping_sub(self, rhs: u64) -> Self {
        Self::new(self.0.wrapping_sub(rhs))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.octets();
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<MacAddr6> for MacAddress {
    fn from(mac: MacAddr6) -> Self {
        let b = mac.into_array();
        Self(u64::from_be_bytes([0, 0, b[0], b[1], b[2], b[3], b[4], b[5]]))
    }
}

impl Add<u64> for MacAddress {
    type Output = MacAddress;

    fn add(self, rhs: u64) -> Self::Output {
        self.wrapping_add(rhs)
    }
}

impl Sub<u64> for MacAddress {
    type Output = MacAddress;

    fn sub(self, rhs: u64) -> Self::Output {
        self.wrapping_sub(rhs)
    }
}

impl AddAssign<u64> for MacAddress {
    fn add_assign(&mut self, rhs: u64) {
        *self = self.wrapping_add(rhs);
    }
}

impl SubAssign<u64> for MacAddress {
    fn sub_assign(&mut self, rhs: u64) {
        *self = self.wrapping_sub(rhs);
    }
}
