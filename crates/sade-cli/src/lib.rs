//! sade-cli - fixture collaborators and configuration for the `sade`
//! binary.
//!
//! The library target exists so integration tests can drive the same
//! fixture-backed collaborators the binary wires up.

pub mod config;
pub mod fixtures;
