//! Data Transfer Objects
//!
//! DTOs used on the wire: requests and responses of the orchestrator HTTP
//! API, and the envelopes exchanged with the external reporting system.
//! Field names match what existing clients and forms already send.

pub mod job;
pub mod report;
