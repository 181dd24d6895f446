//! Rolling bruteforce statistics.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Attempts kept for the rolling mean.
const WINDOW: usize = 15;

/// Attempts between two progress reports.
const REPORT_PERIOD: usize = 5;

/// Periodic progress summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    /// Mask of the next untried candidate.
    pub mask: String,
    pub percent: f64,
    pub seconds_per_attempt: f64,
    pub started: DateTime<Local>,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}% complete @ {} ({:.2} seconds/pin)",
            self.percent,
            self.started.format("%Y-%m-%d %H:%M:%S"),
            self.seconds_per_attempt
        )
    }
}

/// Seconds-per-attempt over the last attempts. Informational only.
#[derive(Debug, Clone)]
pub struct BruteforceStats {
    started: DateTime<Local>,
    last_attempt: Instant,
    samples: VecDeque<Duration>,
    counter: usize,
}

impl Default for BruteforceStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BruteforceStats {
    pub fn new() -> Self {
        Self {
            started: Local::now(),
            last_attempt: Instant::now(),
            samples: VecDeque::with_capacity(WINDOW),
            counter: 0,
        }
    }

    /// Record an attempt that just finished.
    ///
    /// Returns a report on every fifth call.
    pub fn register_attempt(&mut self, mask: &str, percent: f64) -> Option<ProgressReport> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_attempt);
        self.last_attempt = now;
        self.record(elapsed, mask, percent)
    }

    fn record(&mut self, elapsed: Duration, mask: &str, percent: f64) -> Option<ProgressReport> {
        if self.samples.len() == WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed);

        self.counter += 1;
        if self.counter < REPORT_PERIOD {
            return None;
        }
        self.counter = 0;
        Some(ProgressReport {
            mask: mask.to_string(),
            percent,
            seconds_per_attempt: self.mean_seconds(),
            started: self.started,
        })
    }

    pub fn mean_seconds(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: f64 = self.samples.iter().map(Duration::as_secs_f64).sum();
        total / self.samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_every_fifth_attempt() {
        let mut stats = BruteforceStats::new();
        let reports: Vec<bool> = (0..10)
            .map(|_| {
                stats
                    .record(Duration::from_secs(1), "0001", 0.0)
                    .is_some()
            })
            .collect();
        assert_eq!(
            reports,
            vec![false, false, false, false, true, false, false, false, false, true]
        );
    }

    #[test]
    fn test_mean_over_window() {
        let mut stats = BruteforceStats::new();
        for _ in 0..WINDOW {
            stats.record(Duration::from_secs(10), "0000", 0.0);
        }
        assert!((stats.mean_seconds() - 10.0).abs() < 1e-9);
        for _ in 0..WINDOW {
            stats.record(Duration::from_secs(2), "0000", 0.0);
        }
        assert!((stats.mean_seconds() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_mean() {
        assert_eq!(BruteforceStats::new().mean_seconds(), 0.0);
    }

    #[test]
    fn test_report_display() {
        let mut stats = BruteforceStats::new();
        let mut report = None;
        for _ in 0..REPORT_PERIOD {
            report = stats.record(Duration::from_millis(1500), "5500", 50.0);
        }
        let text = report.unwrap().to_string();
        assert!(text.starts_with("50.00% complete @ "));
        assert!(text.ends_with("(1.50 seconds/pin)"));
    }
}
