//! Line parser for the supplicant debug trace.
//!
//! Recognizes the handful of `wpa_supplicant -d` lines that matter for a
//! WPS enrollment and turns them into `TraceLine` values. The parser is
//! stateless; status tracking belongs to the classifier.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::domain::HandshakeField;

/// One syntactically recognized trace line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceLine {
    /// `WPS: Building Message M<n>`
    MessageBuilt(u8),
    /// `WPS: Received M<n>`
    MessageReceived(u8),
    WscNack,
    /// Hex dump of a handshake parameter, payload uppercased and unspaced.
    HexDump { field: HandshakeField, hex: String },
    /// Hex dump of the network key.
    NetworkKey(String),
    Scanning,
    WpsFail,
    TryingAuthenticate { essid: Option<String> },
    AuthResponse,
    TryingAssociate { essid: Option<String> },
    Associated { bssid: String },
    EapolStart,
    IdentityRequest,
    IdentityResponse,
    /// Anything else; ignored.
    Other,
}

/// Hex dump markers, checked in order.
const HEXDUMP_MARKERS: [(&str, HandshakeField); 6] = [
    ("Enrollee Nonce", HandshakeField::EnrolleeNonce),
    ("DH own Public Key", HandshakeField::OwnPublicKey),
    ("DH peer Public Key", HandshakeField::PeerPublicKey),
    ("AuthKey", HandshakeField::AuthKey),
    ("E-Hash1", HandshakeField::EHash1),
    ("E-Hash2", HandshakeField::EHash2),
];

fn message_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(Building Message|Received) M(\d+)").expect("valid message regex")
    })
}

/// Parser for supplicant trace lines.
pub struct TraceParser {
    /// Interface name; `Associated with` lines for other interfaces are ignored.
    interface: String,
}

impl TraceParser {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Parse a single line (without trailing newline).
    pub fn parse(&self, line: &str) -> TraceLine {
        if line.starts_with("WPS: ") {
            return self.parse_wps(line);
        }

        if line.contains(": State: ") {
            return if line.contains("-> SCANNING") {
                TraceLine::Scanning
            } else {
                TraceLine::Other
            };
        }

        if line.contains("WPS-FAIL") {
            TraceLine::WpsFail
        } else if line.contains("Trying to authenticate with") {
            TraceLine::TryingAuthenticate {
                essid: quoted_essid(line),
            }
        } else if line.contains("Authentication response") {
            TraceLine::AuthResponse
        } else if line.contains("Trying to associate with") {
            TraceLine::TryingAssociate {
                essid: quoted_essid(line),
            }
        } else if line.contains("Associated with") && line.contains(self.interface.as_str()) {
            match line.split_whitespace().last() {
                Some(bssid) => TraceLine::Associated {
                    bssid: bssid.to_uppercase(),
                },
                None => TraceLine::Other,
            }
        } else if line.contains("EAPOL: txStart") {
            TraceLine::EapolStart
        } else if line.contains("EAP entering state IDENTITY") {
            TraceLine::IdentityRequest
        } else if line.contains("using real identity") {
            TraceLine::IdentityResponse
        } else {
            TraceLine::Other
        }
    }

    fn parse_wps(&self, line: &str) -> TraceLine {
        if line.contains("Building Message M") || line.contains("Received M") {
            return match parse_message_number(line) {
                Some((true, n)) => TraceLine::MessageBuilt(n),
                Some((false, n)) => TraceLine::MessageReceived(n),
                None => {
                    debug!("Unparseable WPS message line: {}", line);
                    TraceLine::Other
                }
            };
        }

        if line.contains("Received WSC_NACK") {
            return TraceLine::WscNack;
        }

        if !line.contains("hexdump") {
            return TraceLine::Other;
        }

        if let Some((_, field)) = HEXDUMP_MARKERS
            .iter()
            .find(|(marker, _)| line.contains(marker))
        {
            return TraceLine::HexDump {
                field: *field,
                hex: get_hex(line),
            };
        }

        if line.contains("Network Key") {
            return TraceLine::NetworkKey(get_hex(line));
        }

        TraceLine::Other
    }
}

/// Returns `(built, n)` for message lines.
fn parse_message_number(line: &str) -> Option<(bool, u8)> {
    let caps = message_regex().captures(line)?;
    let built = &caps[1] == "Building Message";
    let n = caps[2].parse().ok()?;
    Some((built, n))
}

/// Hex payload of a hexdump line: the third colon-delimited field,
/// uppercased with whitespace removed.
pub fn get_hex(line: &str) -> String {
    match line.splitn(4, ':').nth(2) {
        Some(payload) => payload
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase(),
        None => {
            debug!("Hexdump line without payload: {}", line);
            String::new()
        }
    }
}

/// ESSID between the first and last single quote of an SSID-bearing line.
fn quoted_essid(line: &str) -> Option<String> {
    if !line.contains("SSID") {
        return None;
    }
    let start = line.find('\'')?;
    let end = line.rfind('\'')?;
    if end <= start {
        return None;
    }
    Some(unescape_ssid(&line[start + 1..end]))
}

/// Decode the C-style escapes the supplicant uses when printing SSIDs.
pub fn unescape_ssid(raw: &str) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        match chars.next() {
            Some('\\') => out.push(b'\\'),
            Some('\'') => out.push(b'\''),
            Some('"') => out.push(b'"'),
            Some('n') => out.push(b'\n'),
            Some('r') => out.push(b'\r'),
            Some('t') => out.push(b'\t'),
            Some('x') => {
                let mut digits = String::new();
                while digits.len() < 2 {
                    match chars.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u8::from_str_radix(&digits, 16) {
                    Ok(byte) => out.push(byte),
                    Err(_) => out.extend_from_slice(b"\\x"),
                }
            }
            Some(d) if d.is_digit(8) => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|n| n.to_digit(8)) {
                        Some(v) => {
                            value = value * 8 + v;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            Some(other) => {
                out.push(b'\\');
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => out.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}
