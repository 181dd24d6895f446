//! Stateful classification of the supplicant trace.

use tracing::debug;

use crate::domain::{ConnectionStatus, HandshakeParameters, TraceEvent, WpsStatus};
use crate::error::TraceError;
use crate::parser::{TraceLine, TraceParser};

/// Classifies trace lines into protocol status and handshake parameters.
///
/// Holds the state of exactly one attempt. Call `reset()` before every
/// attempt; lines must be fed in the order the supplicant produced them.
pub struct HandshakeClassifier {
    parser: TraceParser,
    status: ConnectionStatus,
    params: HandshakeParameters,
}

impl HandshakeClassifier {
    /// Create a classifier for the given wireless interface.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            parser: TraceParser::new(interface),
            status: ConnectionStatus::new(),
            params: HandshakeParameters::new(),
        }
    }

    /// Forget everything learned during the previous attempt.
    pub fn reset(&mut self) {
        self.status.clear();
        self.params.clear();
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn params(&self) -> &HandshakeParameters {
        &self.params
    }

    /// The attempt has reached a terminal status.
    pub fn is_finished(&self) -> bool {
        self.status.status.is_terminal()
    }

    /// Feed one line, or `None` when the stream closed.
    ///
    /// Returns `Ok(false)` when no more lines should be fed for this
    /// attempt: the stream closed or the status became terminal.
    pub fn feed(&mut self, line: Option<&str>) -> Result<bool, TraceError> {
        match line {
            None => Ok(false),
            Some(line) => {
                self.classify(line)?;
                Ok(!self.is_finished())
            }
        }
    }

    /// Classify one trace line, updating status and parameters.
    ///
    /// A hex payload of the wrong length is a `ProtocolAssertionViolation`;
    /// the current attempt must be aborted.
    pub fn classify(&mut self, line: &str) -> Result<Option<TraceEvent>, TraceError> {
        debug!(target: "wpspin::trace", "{}", line);

        let event = match self.parser.parse(line) {
            TraceLine::MessageBuilt(n) => {
                self.status.last_message = n;
                TraceEvent::SendingMessage(n)
            }
            TraceLine::MessageReceived(n) => {
                self.status.last_message = n;
                if n == 5 {
                    self.status.received_m5 = true;
                }
                TraceEvent::ReceivedMessage(n)
            }
            TraceLine::WscNack => {
                self.status.status = WpsStatus::WscNack;
                TraceEvent::WscNack
            }
            TraceLine::HexDump { field, hex } => {
                if hex.len() != field.hex_len() {
                    return Err(TraceError::ProtocolAssertionViolation {
                        field: field.label(),
                        expected: field.hex_len(),
                        actual: hex.len(),
                    });
                }
                if hex::decode(&hex).is_err() {
                    return Err(TraceError::InvalidHex {
                        field: field.label(),
                    });
                }
                debug!("Captured {} ({} bytes)", field, field.byte_len());
                self.params.set(field, hex.clone());
                TraceEvent::ParameterCaptured { field, hex }
            }
            TraceLine::NetworkKey(hex) => {
                let bytes = hex::decode(&hex).map_err(|_| TraceError::InvalidHex {
                    field: "Network Key",
                })?;
                self.status.status = WpsStatus::GotPsk;
                self.status.wpa_psk = String::from_utf8_lossy(&bytes).into_owned();
                TraceEvent::GotPsk
            }
            TraceLine::Scanning => {
                self.status.status = WpsStatus::Scanning;
                TraceEvent::Scanning
            }
            TraceLine::WpsFail if self.status.status != WpsStatus::Idle => {
                self.status.status = WpsStatus::WpsFail;
                TraceEvent::WpsFail
            }
            TraceLine::WpsFail => return Ok(None),
            TraceLine::TryingAuthenticate { essid } => {
                self.status.status = WpsStatus::Authenticating;
                self.record_essid(&essid);
                TraceEvent::Authenticating { essid }
            }
            TraceLine::AuthResponse => TraceEvent::Authenticated,
            TraceLine::TryingAssociate { essid } => {
                self.status.status = WpsStatus::Associating;
                self.record_essid(&essid);
                TraceEvent::Associating { essid }
            }
            TraceLine::Associated { bssid } => TraceEvent::Associated {
                bssid,
                essid: (!self.status.essid.is_empty()).then(|| self.status.essid.clone()),
            },
            TraceLine::EapolStart => {
                self.status.status = WpsStatus::EapolStart;
                TraceEvent::EapolStart
            }
            TraceLine::IdentityRequest => TraceEvent::IdentityRequest,
            TraceLine::IdentityResponse => TraceEvent::IdentityResponse,
            TraceLine::Other => return Ok(None),
        };

        Ok(Some(event))
    }

    fn record_essid(&mut self, essid: &Option<String>) {
        if let Some(essid) = essid {
            self.status.essid = essid.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HandshakeField;

    fn hexdump(label: &str, bytes: usize) -> String {
        let payload = vec!["a5"; bytes].join(" ");
        format!("WPS: {} - hexdump(len={}): {}", label, bytes, payload)
    }

    fn classifier() -> HandshakeClassifier {
        HandshakeClassifier::new("wlan0")
    }

    #[test]
    fn test_m5_then_nack_keeps_first_half() {
        let mut c = classifier();
        assert!(c.feed(Some("WPS: Received M5")).unwrap());
        assert!(!c.feed(Some("WPS: Received WSC_NACK")).unwrap());
        assert_eq!(c.status().status, WpsStatus::WscNack);
        assert!(c.status().is_first_half_valid());
    }

    #[test]
    fn test_nack_before_m5() {
        let mut c = classifier();
        c.feed(Some("WPS: Building Message M4")).unwrap();
        c.feed(Some("WPS: Received WSC_NACK")).unwrap();
        assert_eq!(c.status().status, WpsStatus::WscNack);
        assert!(!c.status().is_first_half_valid());
    }

    #[test]
    fn test_stream_close_stops() {
        assert!(!classifier().feed(None).unwrap());
    }

    #[test]
    fn test_wps_fail_requires_prior_status() {
        let mut c = classifier();
        assert_eq!(c.classify("wlan0: WPS-FAIL msg=8").unwrap(), None);
        assert_eq!(c.status().status, WpsStatus::Idle);

        c.classify("wlan0: State: DISCONNECTED -> SCANNING").unwrap();
        assert_eq!(
            c.classify("wlan0: WPS-FAIL msg=8").unwrap(),
            Some(TraceEvent::WpsFail)
        );
        assert!(c.is_finished());
    }

    #[test]
    fn test_collects_all_parameters() {
        let mut c = classifier();
        for (label, bytes) in [
            ("Enrollee Nonce", 16),
            ("DH own Public Key", 192),
            ("DH peer Public Key", 192),
            ("AuthKey", 32),
            ("E-Hash1", 32),
            ("E-Hash2", 32),
        ] {
            let event = c.classify(&hexdump(label, bytes)).unwrap();
            assert!(matches!(event, Some(TraceEvent::ParameterCaptured { .. })));
        }
        assert!(c.params().got_all());
        assert_eq!(c.params().e_nonce, "A5".repeat(16));
    }

    #[test]
    fn test_wrong_length_is_assertion_violation() {
        let mut c = classifier();
        let err = c.classify(&hexdump("E-Hash1", 31)).unwrap_err();
        assert_eq!(
            err,
            TraceError::ProtocolAssertionViolation {
                field: HandshakeField::EHash1.label(),
                expected: 64,
                actual: 62,
            }
        );
        assert!(c.params().e_hash1.is_empty());
    }

    #[test]
    fn test_network_key() {
        let mut c = classifier();
        c.classify("wlan0: Trying to associate with 00:11:22:33:44:55 (SSID='Cafe' freq=2437 MHz)")
            .unwrap();
        let done = c
            .feed(Some("WPS: Network Key - hexdump(len=8): 70 61 73 73 77 6f 72 64"))
            .unwrap();
        assert!(!done);
        assert_eq!(c.status().status, WpsStatus::GotPsk);
        assert_eq!(c.status().wpa_psk, "password");
        assert_eq!(c.status().essid, "Cafe");
    }

    #[test]
    fn test_network_key_lossy() {
        let mut c = classifier();
        c.classify("WPS: Network Key - hexdump(len=2): 61 ff").unwrap();
        assert_eq!(c.status().wpa_psk, "a\u{FFFD}");
    }

    #[test]
    fn test_associated_carries_essid() {
        let mut c = classifier();
        c.classify("wlan0: Trying to authenticate with 00:11:22:33:44:55 (SSID='Net' freq=2412 MHz)")
            .unwrap();
        assert_eq!(c.status().status, WpsStatus::Authenticating);
        let event = c
            .classify("wlan0: Associated with 00:11:22:33:44:55")
            .unwrap();
        assert_eq!(
            event,
            Some(TraceEvent::Associated {
                bssid: "00:11:22:33:44:55".into(),
                essid: Some("Net".into())
            })
        );
    }

    #[test]
    fn test_reset_clears_attempt_state() {
        let mut c = classifier();
        c.classify("WPS: Received M5").unwrap();
        c.classify(&hexdump("AuthKey", 32)).unwrap();
        c.reset();
        assert_eq!(c.status(), &ConnectionStatus::default());
        assert_eq!(c.params(), &HandshakeParameters::default());
    }

    #[test]
    fn test_unknown_lines_ignored() {
        let mut c = classifier();
        assert_eq!(c.classify("random noise").unwrap(), None);
        assert!(c.feed(Some("random noise")).unwrap());
    }
}
