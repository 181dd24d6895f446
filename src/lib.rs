//! wpspin - WPS PIN search engine.
//!
//! Generates vendor-derived PIN candidates for an access point, drives a
//! `wpa_supplicant` process through WPS registrations, classifies its
//! debug trace and runs single-PIN, offline-recovery and resumable
//! two-phase bruteforce attacks.

pub mod attack;
pub mod config;
pub mod control;
pub mod detector;
pub mod domain;
pub mod error;
pub mod parser;
pub mod pin;
pub mod recovery;
pub mod reporter;
pub mod scan;
pub mod store;
pub mod utils;

pub use attack::{
    AttackSession, BruteforceEngine, BruteforceMask, BruteforceResult, PinAttack,
    PinAttackOptions,
};
pub use config::Config;
pub use domain::{AttackOutcome, MacAddress};
pub use error::AttackError;
pub use pin::{GeneratedPin, OuiIndex, WpsPinGenerator};
