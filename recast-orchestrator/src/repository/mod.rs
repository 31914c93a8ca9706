//! Repository Module
//!
//! File-backed storage for the orchestrator.
//! Submitted recordings are persisted to disk before compilation.

pub mod recording;

// Re-export for convenience
pub use recording as recording_repository;
