//! Result of a single PIN attempt.

use super::address::MacAddress;
use super::status::{ConnectionStatus, WpsStatus};

/// What one attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub success: bool,
    pub pin: String,
    pub passphrase: Option<String>,
    pub essid: Option<String>,
    pub bssid: MacAddress,
    pub error_message: Option<String>,
    /// Final protocol status of the attempt.
    pub status: WpsStatus,
    /// Last WPS message number seen.
    pub last_message: u8,
    pub first_half_valid: bool,
    /// The trace stream closed before a terminal status.
    pub trace_closed: bool,
}

impl AttackOutcome {
    /// Build the outcome from the status left behind by the classifier.
    pub fn from_status(bssid: MacAddress, pin: &str, status: &ConnectionStatus) -> Self {
        let success = status.status == WpsStatus::GotPsk;
        let error_message = match status.status {
            WpsStatus::GotPsk => None,
            WpsStatus::WscNack => Some("Received WSC NACK: wrong PIN".to_string()),
            WpsStatus::WpsFail => Some("WPS transaction failed".to_string()),
            other => Some(format!("Trace ended while {}", other)),
        };

        Self {
            success,
            pin: pin.to_string(),
            passphrase: success.then(|| status.wpa_psk.clone()),
            essid: (!status.essid.is_empty()).then(|| status.essid.clone()),
            bssid,
            error_message,
            status: status.status,
            last_message: status.last_message,
            first_half_valid: status.is_first_half_valid(),
            trace_closed: false,
        }
    }

    /// Mark the attempt as cut short by the engine exiting.
    pub fn with_trace_closed(mut self, closed: bool) -> Self {
        self.trace_closed = closed;
        self
    }

    /// A protocol-level failure that the retry policy may repeat.
    pub fn is_transaction_failure(&self) -> bool {
        self.status == WpsStatus::WpsFail
    }

    /// The access point has confirmed the full PIN.
    pub fn is_second_half_valid(&self) -> bool {
        self.last_message > 6 || self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bssid() -> MacAddress {
        MacAddress::parse("00:90:4C:C1:AC:21").unwrap()
    }

    #[test]
    fn test_got_psk_outcome() {
        let status = ConnectionStatus {
            status: WpsStatus::GotPsk,
            last_message: 8,
            essid: "HomeNet".into(),
            wpa_psk: "hunter22".into(),
            ..Default::default()
        };
        let outcome = AttackOutcome::from_status(bssid(), "12345670", &status);
        assert!(outcome.success);
        assert_eq!(outcome.passphrase.as_deref(), Some("hunter22"));
        assert_eq!(outcome.essid.as_deref(), Some("HomeNet"));
        assert!(outcome.error_message.is_none());
        assert!(outcome.first_half_valid);
    }

    #[test]
    fn test_nack_outcome() {
        let status = ConnectionStatus {
            status: WpsStatus::WscNack,
            last_message: 4,
            ..Default::default()
        };
        let outcome = AttackOutcome::from_status(bssid(), "00000000", &status);
        assert!(!outcome.success);
        assert!(outcome.passphrase.is_none());
        assert!(outcome.essid.is_none());
        assert!(!outcome.first_half_valid);
        assert!(!outcome.is_transaction_failure());
        assert!(outcome.error_message.unwrap().contains("wrong PIN"));
    }

    #[test]
    fn test_wps_fail_is_transaction_failure() {
        let status = ConnectionStatus {
            status: WpsStatus::WpsFail,
            ..Default::default()
        };
        let outcome = AttackOutcome::from_status(bssid(), "00000000", &status);
        assert!(outcome.is_transaction_failure());
    }

    #[test]
    fn test_second_half_valid() {
        let mut status = ConnectionStatus {
            status: WpsStatus::WscNack,
            last_message: 7,
            ..Default::default()
        };
        assert!(AttackOutcome::from_status(bssid(), "12345670", &status).is_second_half_valid());

        status.last_message = 6;
        let outcome = AttackOutcome::from_status(bssid(), "12345670", &status);
        assert!(outcome.first_half_valid);
        assert!(!outcome.is_second_half_valid());
    }
}
