//! Recast Core
//!
//! Core types and abstractions for the Recast recording-to-test system.
//!
//! This crate contains:
//! - Domain types: Recordings and their steps, queued jobs, test reports
//! - DTOs: Data transfer objects for the orchestrator API and the reporting system

pub mod domain;
pub mod dto;
