//! Reporting module for attack progress.
//!
//! This module defines the `AttackReporter` trait and provides the
//! console implementation used by the CLI.

mod console_reporter;

pub use console_reporter::ConsoleReporter;

use crate::attack::ProgressReport;
use crate::domain::{AttackOutcome, TraceEvent};

/// Severity of a free-form notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives operator-facing progress from attacks.
///
/// Implementations only present information; they never influence
/// control flow.
pub trait AttackReporter: Send {
    /// A PIN is about to be submitted.
    fn on_attempt(&self, pin: &str);

    /// A classified trace event from the current attempt.
    fn on_event(&self, event: &TraceEvent);

    /// Periodic bruteforce statistics.
    fn on_progress(&self, progress: &ProgressReport);

    /// Credentials were recovered.
    fn on_credentials(&self, outcome: &AttackOutcome);

    /// Anything else worth telling the operator.
    fn notice(&self, severity: Severity, message: &str);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl AttackReporter for NullReporter {
    fn on_attempt(&self, _pin: &str) {}
    fn on_event(&self, _event: &TraceEvent) {}
    fn on_progress(&self, _progress: &ProgressReport) {}
    fn on_credentials(&self, _outcome: &AttackOutcome) {}
    fn notice(&self, _severity: Severity, _message: &str) {}
}
