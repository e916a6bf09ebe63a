//! The vigil agent: wiring for a batch monitoring run
//!
//! The binary half parses arguments and runs one batch pass per
//! configuration file; this library half exposes the orchestration and the
//! production collaborators so integration tests can drive a full run with
//! fakes substituted at the edges.

pub mod exec;
pub mod mail;
pub mod runner;
