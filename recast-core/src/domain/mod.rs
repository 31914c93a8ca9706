//! Core domain types
//!
//! This module contains the core domain structures used across Recast crates.
//! Recordings are shared between the compiler (which consumes them) and the
//! orchestrator (which persists them); jobs and reports flow between the
//! orchestrator, the client and the CLI.

pub mod job;
pub mod recording;
pub mod report;
