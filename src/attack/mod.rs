//! Online attacks against a WPS registrar.
//!
//! `AttackSession` runs one PIN attempt; `PinAttack` and
//! `BruteforceEngine` build the single-PIN and exhaustive flows on top.

mod bruteforce;
mod session;
mod single;
mod stats;

pub use bruteforce::{BruteforceEngine, BruteforceMask, BruteforcePhase, BruteforceResult};
pub use session::{AttackSession, POLL_INTERVAL};
pub use single::{PinAttack, PinAttackOptions, DEFAULT_PIN};
pub use stats::{BruteforceStats, ProgressReport};
