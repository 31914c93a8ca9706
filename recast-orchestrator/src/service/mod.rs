//! Service Module
//!
//! Business logic layer for the orchestrator.
//! The queue drives jobs through the pipeline stages, which in turn use the
//! recording repository, the compiler, external processes and Helix.

pub mod pipeline;
pub mod process;
pub mod queue;

// Re-export for convenience
pub use pipeline::{JobPipeline, StandardPipeline};
pub use queue::Orchestrator;
