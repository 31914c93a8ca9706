//! Recast Compiler
//!
//! Turns browser recordings into Cypress test scripts.
//! It includes:
//! - Selector resolution over a step's candidate groups
//! - One emission handler per step type, with frame scoping
//! - Script assembly with per-step error isolation
//! - A conversion driver that consumes recording files from a directory
//!   and keeps an append-only conversion log

pub mod driver;
pub mod error;
pub mod frame;
pub mod handlers;
pub mod log;
pub mod script;
pub mod selector;

pub use driver::{ConversionDriver, ConversionReport, ConvertedFile, FailedFile};
pub use error::{ConvertError, StepError};
pub use handlers::{Emission, compile_step};
pub use log::ConversionLog;
pub use script::{CompiledScript, DiagnosticKind, StepDiagnostic, compile_recording};
pub use selector::{locator_code, resolve_selector};
