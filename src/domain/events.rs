//! Progress events observed while classifying the supplicant trace.

use std::fmt;

use super::handshake::HandshakeField;

/// A classified trace event, produced for the reporter.
///
/// Events are informational. Status changes live in `ConnectionStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    SendingMessage(u8),
    ReceivedMessage(u8),
    WscNack,
    ParameterCaptured { field: HandshakeField, hex: String },
    GotPsk,
    Scanning,
    WpsFail,
    Authenticating { essid: Option<String> },
    Authenticated,
    Associating { essid: Option<String> },
    Associated { bssid: String, essid: Option<String> },
    EapolStart,
    IdentityRequest,
    IdentityResponse,
}

impl TraceEvent {
    /// Receiving M5 proves the first PIN half.
    pub fn confirms_first_half(&self) -> bool {
        matches!(self, Self::ReceivedMessage(5))
    }

    /// The event signals a failed attempt.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::WscNack | Self::WpsFail)
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendingMessage(n) => write!(f, "Sending WPS Message M{}", n),
            Self::ReceivedMessage(n) => write!(f, "Received WPS Message M{}", n),
            Self::WscNack => write!(f, "Received WSC NACK: wrong PIN code"),
            Self::ParameterCaptured { field, hex } => write!(f, "{}: {}", field, hex),
            Self::GotPsk => write!(f, "Received network key"),
            Self::Scanning => write!(f, "Scanning"),
            Self::WpsFail => write!(f, "wpa_supplicant returned WPS-FAIL"),
            Self::Authenticating { .. } => write!(f, "Authenticating"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::Associating { .. } => write!(f, "Associating with AP"),
            Self::Associated {
                bssid,
                essid: Some(essid),
            } => write!(f, "Associated with {} (ESSID: {})", bssid, essid),
            Self::Associated { bssid, essid: None } => write!(f, "Associated with {}", bssid),
            Self::EapolStart => write!(f, "Sending EAPOL Start"),
            Self::IdentityRequest => write!(f, "Received Identity Request"),
            Self::IdentityResponse => write!(f, "Sending Identity Response"),
        }
    }
}
