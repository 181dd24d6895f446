//! Console-based attack reporter.

use std::io::{self, Write};

use crate::attack::ProgressReport;
use crate::domain::{AttackOutcome, TraceEvent};
use crate::reporter::{AttackReporter, Severity};

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Reports attack progress to stdout.
pub struct ConsoleReporter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Whether to print captured handshake parameters
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Enable or disable colored output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn format_line(&self, severity: Severity, message: &str) -> String {
        let (tag, color) = match severity {
            Severity::Info => ("[*]", CYAN),
            Severity::Success => ("[+]", GREEN),
            Severity::Warning => ("[!]", YELLOW),
            Severity::Error => ("[-]", RED),
        };
        if self.use_colors {
            format!("{}{}{} {}", color, tag, RESET, message)
        } else {
            format!("{} {}", tag, message)
        }
    }

    fn print(&self, severity: Severity, message: &str) {
        let line = self.format_line(severity, message);
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
    }

    fn event_severity(event: &TraceEvent) -> Severity {
        match event {
            TraceEvent::WscNack => Severity::Warning,
            TraceEvent::WpsFail => Severity::Error,
            TraceEvent::Authenticated | TraceEvent::Associated { .. } | TraceEvent::GotPsk => {
                Severity::Success
            }
            _ => Severity::Info,
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl AttackReporter for ConsoleReporter {
    fn on_attempt(&self, pin: &str) {
        self.print(Severity::Info, &format!("Trying PIN '{}'", pin));
    }

    fn on_event(&self, event: &TraceEvent) {
        if matches!(event, TraceEvent::ParameterCaptured { .. }) && !self.verbose {
            return;
        }
        self.print(Self::event_severity(event), &event.to_string());
        if event.confirms_first_half() {
            self.print(Severity::Success, "The first half of the PIN is valid");
        }
    }

    fn on_progress(&self, progress: &ProgressReport) {
        self.print(Severity::Info, &progress.to_string());
    }

    fn on_credentials(&self, outcome: &AttackOutcome) {
        self.print(Severity::Success, &format!("WPS PIN: '{}'", outcome.pin));
        if let Some(psk) = &outcome.passphrase {
            self.print(Severity::Success, &format!("WPA PSK: '{}'", psk));
        }
        if let Some(essid) = &outcome.essid {
            self.print(Severity::Success, &format!("AP SSID: '{}'", essid));
        }
    }

    fn notice(&self, severity: Severity, message: &str) {
        self.print(severity, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_format() {
        let reporter = ConsoleReporter::new().with_colors(false);
        assert_eq!(
            reporter.format_line(Severity::Success, "done"),
            "[+] done"
        );
        assert_eq!(reporter.format_line(Severity::Error, "bad"), "[-] bad");
    }

    #[test]
    fn test_colored_format() {
        let reporter = ConsoleReporter::new();
        let line = reporter.format_line(Severity::Warning, "careful");
        assert!(line.starts_with(YELLOW));
        assert!(line.ends_with("careful"));
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(
            ConsoleReporter::event_severity(&TraceEvent::WscNack),
            Severity::Warning
        );
        assert_eq!(
            ConsoleReporter::event_severity(&TraceEvent::GotPsk),
            Severity::Success
        );
        assert_eq!(
            ConsoleReporter::event_severity(&TraceEvent::Scanning),
            Severity::Info
        );
    }
}
