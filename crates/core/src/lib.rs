//! Ambient support crate shared by every attestation component.
//!
//! Holds the pieces that have nothing to do with TPMs specifically:
//! the top-level error type, structured logging setup, and layered
//! configuration loading used by both the prover and verifier binaries.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod logging;

pub use error::CoreError;
