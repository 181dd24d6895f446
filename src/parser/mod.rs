//! Supplicant trace parsing module.
//!
//! Turns raw trace lines into `TraceLine` values. Interpreting them is
//! the classifier's job.

mod trace_parser;

pub use trace_parser::{get_hex, unescape_ssid, TraceLine, TraceParser};
