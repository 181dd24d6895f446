//! Protocol status tracked during one WPS attempt.

use std::fmt;

/// Coarse state of the enrollment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WpsStatus {
    #[default]
    Idle,
    Scanning,
    Authenticating,
    Associating,
    EapolStart,
    WscNack,
    WpsFail,
    GotPsk,
}

impl WpsStatus {
    /// Terminal statuses end the attempt; no further trace lines are fed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::WscNack | Self::WpsFail | Self::GotPsk)
    }
}

impl fmt::Display for WpsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning => write!(f, "scanning"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Associating => write!(f, "associating"),
            Self::EapolStart => write!(f, "eapol_start"),
            Self::WscNack => write!(f, "WSC_NACK"),
            Self::WpsFail => write!(f, "WPS_FAIL"),
            Self::GotPsk => write!(f, "GOT_PSK"),
        }
    }
}

/// Status accumulated from the trace of a single attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub status: WpsStatus,
    /// Last WPS message number seen (0-8).
    pub last_message: u8,
    /// Set when M5 was received during this attempt.
    pub received_m5: bool,
    pub essid: String,
    pub wpa_psk: String,
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The access point has confirmed the first four PIN digits.
    pub fn is_first_half_valid(&self) -> bool {
        self.last_message > 5 || self.received_m5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(WpsStatus::WscNack.is_terminal());
        assert!(WpsStatus::WpsFail.is_terminal());
        assert!(WpsStatus::GotPsk.is_terminal());
        assert!(!WpsStatus::Idle.is_terminal());
        assert!(!WpsStatus::Associating.is_terminal());
    }

    #[test]
    fn test_first_half_from_message_number() {
        let mut status = ConnectionStatus::new();
        status.last_message = 5;
        assert!(!status.is_first_half_valid());
        status.last_message = 6;
        assert!(status.is_first_half_valid());
    }

    #[test]
    fn test_first_half_from_m5() {
        let status = ConnectionStatus {
            last_message: 5,
            received_m5: true,
            ..Default::default()
        };
        assert!(status.is_first_half_valid());
    }
}
