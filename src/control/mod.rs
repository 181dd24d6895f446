//! Supplicant control module.
//!
//! The attack core talks to the WPS-capable engine through two traits:
//! `ControlChannel` for text commands and `TraceSource` for the debug
//! trace. `Supplicant` implements both over a real `wpa_supplicant`
//! process.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(unix)]
mod supplicant;

#[cfg(unix)]
pub use supplicant::Supplicant;

use std::time::Duration;

use tracing::debug;

use crate::domain::MacAddress;
use crate::error::ControlError;

/// Command/response channel to the engine.
pub trait ControlChannel {
    /// Send a command and wait (bounded) for its reply.
    fn request(&mut self, command: &str) -> Result<String, ControlError>;

    /// Send a command without waiting for a reply.
    fn send(&mut self, command: &str) -> Result<(), ControlError>;
}

/// Result of one bounded read from the trace stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceRead {
    Line(String),
    /// Nothing arrived within the wait.
    Pending,
    /// The engine exited; no more lines will come.
    Closed,
}

/// Line-oriented trace stream produced by the engine.
pub trait TraceSource {
    /// Wait at most `wait` for the next line.
    fn next_line(&mut self, wait: Duration) -> TraceRead;

    /// Discard lines left over from a previous attempt.
    fn drain(&mut self);
}

/// Everything an attack session needs from the engine.
pub trait WpsEngine: ControlChannel + TraceSource {}

impl<T: ControlChannel + TraceSource> WpsEngine for T {}

/// Argument form of a PIN; the empty PIN is passed as `''`.
pub fn pin_argument(pin: &str) -> &str {
    if pin.is_empty() {
        "''"
    } else {
        pin
    }
}

/// Start a WPS registration for `pin` against `bssid`.
pub fn register_pin(
    channel: &mut dyn ControlChannel,
    bssid: MacAddress,
    pin: &str,
) -> Result<(), ControlError> {
    let command = format!("WPS_REG {} {}", bssid, pin_argument(pin));
    let response = channel.request(&command)?;
    debug!("{} -> {}", command, response);

    if response.starts_with("OK") {
        Ok(())
    } else if response.contains("UNKNOWN COMMAND") {
        Err(ControlError::CapabilityMissing("WPS_REG".to_string()))
    } else {
        Err(ControlError::Rejected { command, response })
    }
}

/// Cancel the in-flight WPS transaction. Safe to repeat.
pub fn cancel(channel: &mut dyn ControlChannel) -> Result<(), ControlError> {
    channel.send("WPS_CANCEL")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReply {
        reply: String,
        sent: Vec<String>,
    }

    impl ControlChannel for FixedReply {
        fn request(&mut self, command: &str) -> Result<String, ControlError> {
            self.sent.push(command.to_string());
            Ok(self.reply.clone())
        }

        fn send(&mut self, command: &str) -> Result<(), ControlError> {
            self.sent.push(command.to_string());
            Ok(())
        }
    }

    fn channel(reply: &str) -> FixedReply {
        FixedReply {
            reply: reply.to_string(),
            sent: Vec::new(),
        }
    }

    fn bssid() -> MacAddress {
        MacAddress::parse("00:90:4c:c1:ac:21").unwrap()
    }

    #[test]
    fn test_register_ok() {
        let mut ch = channel("OK\n");
        register_pin(&mut ch, bssid(), "12345670").unwrap();
        assert_eq!(ch.sent, vec!["WPS_REG 00:90:4C:C1:AC:21 12345670"]);
    }

    #[test]
    fn test_register_empty_pin() {
        let mut ch = channel("OK");
        register_pin(&mut ch, bssid(), "").unwrap();
        assert_eq!(ch.sent, vec!["WPS_REG 00:90:4C:C1:AC:21 ''"]);
    }

    #[test]
    fn test_register_unknown_command() {
        let mut ch = channel("UNKNOWN COMMAND\n");
        let err = register_pin(&mut ch, bssid(), "12345670").unwrap_err();
        assert!(matches!(err, ControlError::CapabilityMissing(_)));
    }

    #[test]
    fn test_register_rejected() {
        let mut ch = channel("FAIL");
        let err = register_pin(&mut ch, bssid(), "12345670").unwrap_err();
        assert!(matches!(err, ControlError::Rejected { .. }));
    }

    #[test]
    fn test_cancel() {
        let mut ch = channel("OK");
        cancel(&mut ch).unwrap();
        cancel(&mut ch).unwrap();
        assert_eq!(ch.sent, vec!["WPS_CANCEL", "WPS_CANCEL"]);
    }
}
