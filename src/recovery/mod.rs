//! Offline PIN recovery through the external `pixiewps` tool.
//!
//! Builds the command line from captured handshake parameters, runs it
//! and extracts the PIN from its report.

use std::fmt;
use std::process::Command;

use tracing::{debug, info};

use crate::domain::HandshakeParameters;
use crate::error::RecoveryError;

/// Token the tool prints when the PIN is empty.
const EMPTY_TOKEN: &str = "<empty>";

/// PIN reported by the recovery tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveredPin {
    Pin(String),
    /// The access point uses the empty PIN.
    Empty,
}

impl RecoveredPin {
    /// PIN as submitted to the engine; empty for `Empty`.
    pub fn as_pin(&self) -> &str {
        match self {
            Self::Pin(pin) => pin,
            Self::Empty => "",
        }
    }
}

impl fmt::Display for RecoveredPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pin(pin) => write!(f, "{}", pin),
            Self::Empty => write!(f, "''"),
        }
    }
}

/// A ready-to-run recovery command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixieCommand {
    binary: String,
    args: Vec<String>,
}

impl PixieCommand {
    /// Build the command; every handshake parameter must be present.
    pub fn new(
        binary: &str,
        params: &HandshakeParameters,
        full_range: bool,
    ) -> Result<Self, RecoveryError> {
        let missing = params.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            return Err(RecoveryError::IncompleteHandshakeData(names.join(", ")));
        }

        let mut args: Vec<String> = [
            ("--pke", &params.pke),
            ("--pkr", &params.pkr),
            ("--e-hash1", &params.e_hash1),
            ("--e-hash2", &params.e_hash2),
            ("--authkey", &params.authkey),
            ("--e-nonce", &params.e_nonce),
        ]
        .into_iter()
        .flat_map(|(flag, value)| [flag.to_string(), value.clone()])
        .collect();
        if full_range {
            args.push("--force".to_string());
        }

        Ok(Self {
            binary: binary.to_string(),
            args,
        })
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the tool. `Ok(None)` means it finished without finding a PIN.
    pub fn run(&self) -> Result<Option<RecoveredPin>, RecoveryError> {
        info!("Running {}", self.binary);
        let output = Command::new(&self.binary)
            .args(&self.args)
            .output()
            .map_err(|e| RecoveryError::ExternalToolFailure(format!("{}: {}", self.binary, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("{} output:\n{}", self.binary, stdout);

        if !output.status.success() {
            debug!("{} exited with {}", self.binary, output.status);
            return Ok(None);
        }
        Ok(parse_output(&stdout))
    }
}

impl fmt::Display for PixieCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Extract the PIN from the `[+] WPS pin: ...` report line.
pub fn parse_output(output: &str) -> Option<RecoveredPin> {
    let line = output
        .lines()
        .find(|line| line.contains("[+]") && line.contains("WPS pin"))?;
    let value = line.rsplit(':').next()?.trim();
    if value == EMPTY_TOKEN {
        Some(RecoveredPin::Empty)
    } else {
        Some(RecoveredPin::Pin(value.to_string()))
    }
}
