//! Error types for the PIN search engine.
//!
//! One enum per concern; `AttackError` aggregates the ones an attack
//! attempt can surface.

use std::path::PathBuf;

use thiserror::Error;

/// MAC address parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid MAC address format: {0}")]
    InvalidAddress(String),
}

/// PIN generation and bruteforce mask errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PinError {
    #[error("Invalid WPS pin algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Invalid bruteforce mask '{0}': expected 4 or 7 digits")]
    InvalidMask(String),

    #[error("Malformed OUI table line {line}: {reason}")]
    MalformedTable { line: usize, reason: String },

    #[error("Failed to read OUI table {path}: {reason}")]
    TableRead { path: PathBuf, reason: String },
}

/// Errors raised while classifying the supplicant trace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("{field} payload has {actual} hex digits, expected {expected}")]
    ProtocolAssertionViolation {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} payload is not valid hex")]
    InvalidHex { field: &'static str },
}

/// Control channel and trace stream errors.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Control channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?} waiting for the supplicant")]
    Timeout(std::time::Duration),

    #[error("Supplicant rejected '{command}': {response}")]
    Rejected { command: String, response: String },

    #[error("Supplicant does not support '{0}' (build it with CONFIG_WPS=y)")]
    CapabilityMissing(String),

    #[error("Failed to start supplicant: {0}")]
    Startup(String),

    #[error("Supplicant exited; trace stream closed")]
    EngineExited,
}

impl ControlError {
    /// Timeouts are transient; every other control error ends the attack.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ControlError::Timeout(_))
    }
}

/// Offline PIN recovery errors.
#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Not enough handshake data to run PIN recovery (missing: {0})")]
    IncompleteHandshakeData(String),

    #[error("PIN recovery tool failed: {0}")]
    ExternalToolFailure(String),
}

/// Session and report persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock {0}")]
    Lock(PathBuf),
}

/// Access point scan errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to run scan: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan command failed: {0}")]
    CommandFailed(String),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// Errors that abort an attack attempt or a bruteforce run.
#[derive(Error, Debug)]
pub enum AttackError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Pin(#[from] PinError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error("Interrupted by user")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_protocol_assertion_message() {
        let err = TraceError::ProtocolAssertionViolation {
            field: "E-Nonce",
            expected: 32,
            actual: 30,
        };
        assert_eq!(
            err.to_string(),
            "E-Nonce payload has 30 hex digits, expected 32"
        );
    }

    #[test]
    fn test_timeout_is_transient() {
        assert!(ControlError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!ControlError::CapabilityMissing("WPS_REG".into()).is_timeout());
    }

    #[test]
    fn test_attack_error_wraps_control() {
        let err: AttackError = ControlError::Timeout(Duration::from_secs(2)).into();
        assert!(matches!(err, AttackError::Control(ControlError::Timeout(_))));
        assert!(err.to_string().contains("Timed out"));
    }
}
