//! Handshake classification module.
//!
//! This module turns parsed trace lines into protocol status and
//! captured handshake parameters for one attempt.

mod handshake_classifier;

pub use handshake_classifier::HandshakeClassifier;
