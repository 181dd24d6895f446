//! Handshake parameters captured from the WPS exchange.

use std::fmt;

/// The six handshake fields needed for offline PIN recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeField {
    /// Enrollee nonce (16 bytes)
    EnrolleeNonce,
    /// DH public key of the access point (192 bytes)
    PeerPublicKey,
    /// Our own DH public key (192 bytes)
    OwnPublicKey,
    /// Authentication key (32 bytes)
    AuthKey,
    /// First enrollee hash (32 bytes)
    EHash1,
    /// Second enrollee hash (32 bytes)
    EHash2,
}

impl HandshakeField {
    pub const ALL: [HandshakeField; 6] = [
        HandshakeField::EnrolleeNonce,
        HandshakeField::PeerPublicKey,
        HandshakeField::OwnPublicKey,
        HandshakeField::AuthKey,
        HandshakeField::EHash1,
        HandshakeField::EHash2,
    ];

    /// Mandated payload length in bytes.
    pub fn byte_len(self) -> usize {
        match self {
            Self::EnrolleeNonce => 16,
            Self::PeerPublicKey | Self::OwnPublicKey => 192,
            Self::AuthKey | Self::EHash1 | Self::EHash2 => 32,
        }
    }

    /// Mandated payload length in hex digits.
    pub fn hex_len(self) -> usize {
        self.byte_len() * 2
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EnrolleeNonce => "E-Nonce",
            Self::PeerPublicKey => "PKE",
            Self::OwnPublicKey => "PKR",
            Self::AuthKey => "AuthKey",
            Self::EHash1 => "E-Hash1",
            Self::EHash2 => "E-Hash2",
        }
    }
}

impl fmt::Display for HandshakeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hex-encoded handshake parameters accumulated during one attempt.
///
/// Reset before every attempt; only the classifier writes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeParameters {
    pub e_nonce: String,
    pub pke: String,
    pub pkr: String,
    pub authkey: String,
    pub e_hash1: String,
    pub e_hash2: String,
}

impl HandshakeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, field: HandshakeField) -> &str {
        match field {
            HandshakeField::EnrolleeNonce => &self.e_nonce,
            HandshakeField::PeerPublicKey => &self.pke,
            HandshakeField::OwnPublicKey => &self.pkr,
            HandshakeField::AuthKey => &self.authkey,
            HandshakeField::EHash1 => &self.e_hash1,
            HandshakeField::EHash2 => &self.e_hash2,
        }
    }

    pub fn set(&mut self, field: HandshakeField, hex: String) {
        let slot = match field {
            HandshakeField::EnrolleeNonce => &mut self.e_nonce,
            HandshakeField::PeerPublicKey => &mut self.pke,
            HandshakeField::OwnPublicKey => &mut self.pkr,
            HandshakeField::AuthKey => &mut self.authkey,
            HandshakeField::EHash1 => &mut self.e_hash1,
            HandshakeField::EHash2 => &mut self.e_hash2,
        };
        *slot = hex;
    }

    /// Fields that are empty or do not decode to their mandated length.
    pub fn missing(&self) -> Vec<HandshakeField> {
        HandshakeField::ALL
            .into_iter()
            .filter(|&field| {
                let value = self.get(field);
                value.is_empty()
                    || value.len() != field.hex_len()
                    || hex::decode(value).is_err()
            })
            .collect()
    }

    /// True iff every field is present with its mandated byte length.
    pub fn got_all(&self) -> bool {
        self.missing().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> HandshakeParameters {
        HandshakeParameters {
            e_nonce: "AB".repeat(16),
            pke: "01".repeat(192),
            pkr: "02".repeat(192),
            authkey: "03".repeat(32),
            e_hash1: "04".repeat(32),
            e_hash2: "05".repeat(32),
        }
    }

    #[test]
    fn test_empty_is_incomplete() {
        let params = HandshakeParameters::new();
        assert!(!params.got_all());
        assert_eq!(params.missing().len(), 6);
    }

    #[test]
    fn test_complete_set() {
        assert!(complete().got_all());
    }

    #[test]
    fn test_single_missing_field() {
        let mut params = complete();
        params.set(HandshakeField::AuthKey, String::new());
        assert!(!params.got_all());
        assert_eq!(params.missing(), vec![HandshakeField::AuthKey]);
    }

    #[test]
    fn test_wrong_length_is_incomplete() {
        let mut params = complete();
        params.set(HandshakeField::EHash2, "05".repeat(31));
        assert_eq!(params.missing(), vec![HandshakeField::EHash2]);
    }

    #[test]
    fn test_non_hex_is_incomplete() {
        let mut params = complete();
        params.set(HandshakeField::EnrolleeNonce, "ZZ".repeat(16));
        assert!(!params.got_all());
    }

    #[test]
    fn test_clear() {
        let mut params = complete();
        params.clear();
        assert_eq!(params, HandshakeParameters::default());
    }

    #[test]
    fn test_field_lengths() {
        assert_eq!(HandshakeField::EnrolleeNonce.hex_len(), 32);
        assert_eq!(HandshakeField::PeerPublicKey.hex_len(), 384);
        assert_eq!(HandshakeField::OwnPublicKey.hex_len(), 384);
        assert_eq!(HandshakeField::AuthKey.hex_len(), 64);
    }
}
