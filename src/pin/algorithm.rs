//! WPS PIN generation algorithms.
//!
//! Every algorithm is a row in a static table: an id, a display name and
//! a `Derivation` that maps a MAC address to a raw numeric value. The raw
//! value is reduced to 7 digits and completed with the WPS checksum digit.

use std::fmt;

use crate::domain::MacAddress;
use crate::error::PinError;

/// 7 information digits.
const PIN_MODULUS: u64 = 10_000_000;

/// How an algorithm uses the MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// PIN is computed from the MAC address.
    MacDerived,
    /// The empty PIN; no checksum, no padding.
    Empty,
    /// Fixed vendor default PIN, independent of the MAC address.
    StaticVendor,
}

/// Derivation of the raw PIN value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Low 24 bits of the MAC.
    Mask24,
    /// Low 28 bits of the MAC.
    Mask28,
    /// Low 32 bits of the MAC.
    Mask32,
    /// D-Link NIC XOR with digit rotation.
    DLink,
    /// D-Link derivation applied to MAC + 1.
    DLinkPlusOne,
    /// ASUS per-octet modular digits.
    Asus,
    /// Airocon Realtek pairwise octet sums.
    Airocon,
    Empty,
    Fixed(u32),
}

impl Derivation {
    pub fn mode(self) -> PinMode {
        match self {
            Self::Empty => PinMode::Empty,
            Self::Fixed(_) => PinMode::StaticVendor,
            _ => PinMode::MacDerived,
        }
    }

    /// Raw, unreduced PIN value for `mac`.
    pub fn apply(self, mac: MacAddress) -> u64 {
        let value = mac.as_u64();
        match self {
            Self::Mask24 => value & 0xFF_FFFF,
            Self::Mask28 => value & 0xFFF_FFFF,
            Self::Mask32 => value & 0xFFFF_FFFF,
            Self::DLink => dlink(mac),
            Self::DLinkPlusOne => dlink(mac + 1),
            Self::Asus => asus(mac),
            Self::Airocon => airocon(mac),
            Self::Empty => 0,
            Self::Fixed(pin) => u64::from(pin),
        }
    }
}

fn dlink(mac: MacAddress) -> u64 {
    let nic = mac.as_u64() & 0xFF_FFFF;
    let mut pin = nic ^ 0x55AA55;
    let low = pin & 0xF;
    pin ^= (low << 4) + (low << 8) + (low << 12) + (low << 16) + (low << 20);
    pin %= PIN_MODULUS;
    if pin < 1_000_000 {
        pin += (pin % 9) * 1_000_000 + 1_000_000;
    }
    pin
}

fn asus(mac: MacAddress) -> u64 {
    let b = mac.octets().map(u64::from);
    let tail = b[1] + b[2] + b[3] + b[4] + b[5];
    // Each modulus is in 4..=10, so every term is a single digit.
    (0..7u64).fold(0, |pin, i| {
        let digit = (b[(i % 6) as usize] + b[5]) % (10 - (i + tail) % 7);
        pin * 10 + digit
    })
}

fn airocon(mac: MacAddress) -> u64 {
    let b = mac.octets().map(u64::from);
    (b[0] + b[1]) % 10
        + ((b[5] + b[0]) % 10) * 10
        + ((b[4] + b[5]) % 10) * 100
        + ((b[3] + b[4]) % 10) * 1_000
        + ((b[2] + b[3]) % 10) * 10_000
        + ((b[1] + b[2]) % 10) * 100_000
        + ((b[0] + b[1]) % 10) * 1_000_000
}

/// A registered PIN algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAlgorithm {
    pub id: &'static str,
    pub name: &'static str,
    pub derivation: Derivation,
}

impl PinAlgorithm {
    const fn new(id: &'static str, name: &'static str, derivation: Derivation) -> Self {
        Self {
            id,
            name,
            derivation,
        }
    }

    pub fn mode(&self) -> PinMode {
        self.derivation.mode()
    }

    pub fn is_static(&self) -> bool {
        self.mode() == PinMode::StaticVendor
    }

    /// Name shown to the operator; static PINs are labelled as such.
    pub fn display_name(&self) -> String {
        if self.is_static() {
            format!("Static PIN - {}", self.name)
        } else {
            self.name.to_string()
        }
    }

    /// Generate the PIN candidate for `mac`.
    pub fn generate(&self, mac: MacAddress) -> String {
        match self.derivation {
            Derivation::Empty => String::new(),
            derivation => format_pin(derivation.apply(mac) % PIN_MODULUS),
        }
    }
}

impl fmt::Display for PinAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Every known algorithm, in registration order.
pub static ALGORITHMS: [PinAlgorithm; 30] = [
    PinAlgorithm::new("pin24", "24-bit PIN", Derivation::Mask24),
    PinAlgorithm::new("pin28", "28-bit PIN", Derivation::Mask28),
    PinAlgorithm::new("pin32", "32-bit PIN", Derivation::Mask32),
    PinAlgorithm::new("pinDLink", "D-Link PIN", Derivation::DLink),
    PinAlgorithm::new("pinDLink1", "D-Link PIN +1", Derivation::DLinkPlusOne),
    PinAlgorithm::new("pinASUS", "ASUS PIN", Derivation::Asus),
    PinAlgorithm::new("pinAirocon", "Airocon Realtek", Derivation::Airocon),
    PinAlgorithm::new("pinEmpty", "Empty PIN", Derivation::Empty),
    PinAlgorithm::new("pinCisco", "Cisco", Derivation::Fixed(1234567)),
    PinAlgorithm::new("pinBrcm1", "Broadcom 1", Derivation::Fixed(2017252)),
    PinAlgorithm::new("pinBrcm2", "Broadcom 2", Derivation::Fixed(4626484)),
    PinAlgorithm::new("pinBrcm3", "Broadcom 3", Derivation::Fixed(7622990)),
    PinAlgorithm::new("pinBrcm4", "Broadcom 4", Derivation::Fixed(6232714)),
    PinAlgorithm::new("pinBrcm5", "Broadcom 5", Derivation::Fixed(1086411)),
    PinAlgorithm::new("pinBrcm6", "Broadcom 6", Derivation::Fixed(3195719)),
    PinAlgorithm::new("pinAirc1", "Airocon 1", Derivation::Fixed(3043203)),
    PinAlgorithm::new("pinAirc2", "Airocon 2", Derivation::Fixed(7141225)),
    PinAlgorithm::new("pinDSL2740R", "DSL-2740R", Derivation::Fixed(6817554)),
    PinAlgorithm::new("pinRealtek1", "Realtek 1", Derivation::Fixed(9566146)),
    PinAlgorithm::new("pinRealtek2", "Realtek 2", Derivation::Fixed(9571911)),
    PinAlgorithm::new("pinRealtek3", "Realtek 3", Derivation::Fixed(4856371)),
    PinAlgorithm::new("pinUpvel", "Upvel", Derivation::Fixed(2085483)),
    PinAlgorithm::new("pinUR814AC", "UR-814AC", Derivation::Fixed(4397768)),
    PinAlgorithm::new("pinUR825AC", "UR-825AC", Derivation::Fixed(529417)),
    PinAlgorithm::new("pinOnlime", "Onlime", Derivation::Fixed(9995604)),
    PinAlgorithm::new("pinEdimax", "Edimax", Derivation::Fixed(3561153)),
    PinAlgorithm::new("pinThomson", "Thomson", Derivation::Fixed(6795814)),
    PinAlgorithm::new("pinHG532x", "HG532x", Derivation::Fixed(3425928)),
    PinAlgorithm::new("pinH108L", "H108L", Derivation::Fixed(9422988)),
    PinAlgorithm::new("pinONO", "CBN ONO", Derivation::Fixed(9575521)),
];

/// Look up a registered algorithm by id.
pub fn find_algorithm(id: &str) -> Result<&'static PinAlgorithm, PinError> {
    ALGORITHMS
        .iter()
        .find(|algo| algo.id == id)
        .ok_or_else(|| PinError::UnknownAlgorithm(id.to_string()))
}

/// Standard WPS checksum digit of a 7-digit PIN.
///
/// Out-of-range inputs are not rejected; they go through the same
/// digit-pair accumulation.
pub fn checksum(pin: u64) -> u8 {
    let mut pin = pin;
    let mut accum = 0u64;
    while pin != 0 {
        accum += 3 * (pin % 10);
        pin /= 10;
        accum += pin % 10;
        pin /= 10;
    }
    ((10 - accum % 10) % 10) as u8
}

/// Zero-padded 8-digit PIN from 7 information digits.
pub fn format_pin(seven_digits: u64) -> String {
    format!("{:07}{}", seven_digits, checksum(seven_digits))
}

/// True when `pin` is 8 digits with a correct checksum.
pub fn is_valid_pin(pin: &str) -> bool {
    if pin.len() != 8 || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match pin[..7].parse::<u64>() {
        Ok(body) => pin.as_bytes()[7] - b'0' == checksum(body),
        Err(_) => false,
    }
}
