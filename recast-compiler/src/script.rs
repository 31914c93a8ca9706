//! Script assembly
//!
//! Composes the Cypress header, the suite/test scaffold, the optional
//! viewport line and one block per recorded step.

use recast_core::domain::job::safe_file_stem;
use recast_core::domain::recording::Recording;

use crate::error::StepError;
use crate::handlers::{Emission, compile_step};
use crate::selector::resolve_selector;

const HEADER: [&str; 2] = [
    "import 'cypress-xpath';",
    "import 'cypress-real-events/support';",
];

const STEP_INDENT: &str = "    ";

/// A generated test script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScript {
    /// Suite and test name
    pub name: String,
    lines: Vec<String>,
    /// Steps that did not produce a real instruction
    pub diagnostics: Vec<StepDiagnostic>,
}

impl CompiledScript {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The script text as written to disk
    pub fn to_source(&self) -> String {
        let mut source = self.lines.join("\n");
        source.push('\n');
        source
    }

    /// File name the script is written under
    pub fn file_name(stem: &str) -> String {
        format!("{}.cy.js", safe_file_stem(stem))
    }
}

/// Why a step produced a placeholder instead of an instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Unhandled,
    Failed(StepError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDiagnostic {
    /// 1-based position of the step in the recording
    pub index: usize,
    pub step_type: String,
    pub kind: DiagnosticKind,
}

impl std::fmt::Display for StepDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            DiagnosticKind::Unhandled => {
                write!(f, "Step {}: unhandled step type '{}'", self.index, self.step_type)
            }
            DiagnosticKind::Failed(err) => write!(f, "Step {}: {}", self.index, err),
        }
    }
}

/// Compile a recording into a script
///
/// Never fails: a step that cannot be compiled becomes a commented line and
/// a diagnostic, and the remaining steps still compile.
///
/// # Arguments
/// * `recording` - Parsed recording
/// * `fallback_name` - Suite name used when the recording has no title
pub fn compile_recording(recording: &Recording, fallback_name: &str) -> CompiledScript {
    let name = recording
        .title
        .as_deref()
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(fallback_name)
        .to_string();

    let mut lines: Vec<String> = HEADER.iter().map(|line| line.to_string()).collect();
    lines.push(String::new());
    lines.push(format!("describe({}, () => {{", js_string(&name)));
    lines.push(format!("  it({}, () => {{", js_string(&name)));

    if let Some(viewport) = recording.viewport.filter(|viewport| viewport.is_set()) {
        lines.push(format!(
            "{}cy.viewport({}, {});",
            STEP_INDENT, viewport.width, viewport.height
        ));
    }

    let mut diagnostics = Vec::new();
    for (position, recorded) in recording.steps.iter().enumerate() {
        let index = position + 1;
        let step = match recorded.decode() {
            Ok(step) => step,
            Err(e) => {
                let step_type = recorded.type_name().unwrap_or("?").to_string();
                let err = StepError::Malformed {
                    message: e.to_string(),
                };
                lines.push(format!("{}{}", STEP_INDENT, skipped_line(index, &step_type, &err)));
                diagnostics.push(StepDiagnostic {
                    index,
                    step_type,
                    kind: DiagnosticKind::Failed(err),
                });
                continue;
            }
        };

        let selector = resolve_selector(&step.selectors);
        let block = match compile_step(&step, selector) {
            Ok(Emission::Code(code)) => code,
            Ok(Emission::Placeholder(placeholder)) => {
                diagnostics.push(StepDiagnostic {
                    index,
                    step_type: step.step_type.to_string(),
                    kind: DiagnosticKind::Unhandled,
                });
                vec![placeholder]
            }
            Err(err) => {
                let line = skipped_line(index, step.step_type.as_str(), &err);
                diagnostics.push(StepDiagnostic {
                    index,
                    step_type: step.step_type.to_string(),
                    kind: DiagnosticKind::Failed(err),
                });
                vec![line]
            }
        };
        lines.extend(block.into_iter().map(|line| format!("{}{}", STEP_INDENT, line)));
    }

    lines.push("  });".to_string());
    lines.push("});".to_string());

    CompiledScript {
        name,
        lines,
        diagnostics,
    }
}

/// Inert line standing in for a step that could not be compiled
fn skipped_line(index: usize, step_type: &str, err: &StepError) -> String {
    format!(
        "// Step {} ({}) skipped: {}",
        index,
        comment_text(step_type),
        comment_text(&err.to_string())
    )
}

// =============================================================================
// Literal embedding
// =============================================================================

/// Quote text as a single-quoted JavaScript string literal
pub fn js_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Flatten text so it stays inside a single `//` comment
pub fn comment_text(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}
