//! Domain models for WPS PIN attacks.
//!
//! These types carry no I/O: addresses, handshake parameters, the
//! per-attempt protocol status, trace events and the outcome of an
//! attempt.

mod address;
mod events;
mod handshake;
mod outcome;
mod status;

pub use address::MacAddress;
pub use events::TraceEvent;
pub use handshake::{HandshakeField, HandshakeParameters};
pub use outcome::AttackOutcome;
pub use status::{ConnectionStatus, WpsStatus};
