//! Conversion driver
//!
//! Consumes recording files from a directory and writes one script per
//! recording. A recording is deleted only after its script was written, so
//! running the driver again over the same directory never converts twice.

use std::path::{Path, PathBuf};

use recast_core::domain::recording::Recording;

use crate::error::ConvertError;
use crate::log::ConversionLog;
use crate::script::{CompiledScript, DiagnosticKind, compile_recording};

/// A recording that was turned into a script
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    pub source: PathBuf,
    pub script: PathBuf,
    /// Steps that produced a placeholder or were skipped
    pub diagnostics: usize,
}

/// A recording that could not be converted
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub source: PathBuf,
    pub error: String,
}

/// Result of one batch
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub converted: Vec<ConvertedFile>,
    pub failed: Vec<FailedFile>,
}

impl ConversionReport {
    pub fn is_empty(&self) -> bool {
        self.converted.is_empty() && self.failed.is_empty()
    }
}

pub struct ConversionDriver {
    output_dir: PathBuf,
    log: ConversionLog,
}

impl ConversionDriver {
    pub fn new(output_dir: impl Into<PathBuf>, log: ConversionLog) -> Self {
        Self {
            output_dir: output_dir.into(),
            log,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Convert every `*.json` recording in `input_dir`
    ///
    /// A failing file is logged and recorded in the report; the batch goes
    /// on. A missing input directory is an empty batch.
    pub fn convert_all(&self, input_dir: &Path) -> Result<ConversionReport, ConvertError> {
        let mut report = ConversionReport::default();

        if !input_dir.exists() {
            self.log.info(&format!(
                "No recordings directory at {}, nothing to convert",
                input_dir.display()
            ));
            return Ok(report);
        }

        let entries = std::fs::read_dir(input_dir).map_err(|source| ConvertError::ListDir {
            path: input_dir.to_path_buf(),
            source,
        })?;

        let recordings: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && is_recording(path))
            .collect();

        if recordings.is_empty() {
            self.log.info(&format!(
                "No recordings found in {}",
                input_dir.display()
            ));
        }

        for path in recordings {
            match self.convert_file(&path) {
                Ok(converted) => report.converted.push(converted),
                Err(e) => {
                    self.log.error(&e.to_string());
                    report.failed.push(FailedFile {
                        source: path,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Convert a single recording file and delete it once the script exists
    pub fn convert_file(&self, path: &Path) -> Result<ConvertedFile, ConvertError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| ConvertError::InvalidName {
                path: path.to_path_buf(),
            })?;

        let source = std::fs::read_to_string(path).map_err(|source| ConvertError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let recording = Recording::from_json(&source).map_err(|source| ConvertError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = file_name_of(path);
        if let Some(viewport) = recording.viewport.filter(|viewport| viewport.is_set()) {
            self.log.info(&format!(
                "{}: viewport {}x{}",
                file_name, viewport.width, viewport.height
            ));
        }

        let script = compile_recording(&recording, stem);
        self.log_diagnostics(&file_name, &script);

        std::fs::create_dir_all(&self.output_dir).map_err(|source| ConvertError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let script_path = self.output_dir.join(CompiledScript::file_name(stem));
        std::fs::write(&script_path, script.to_source()).map_err(|source| ConvertError::Write {
            path: script_path.clone(),
            source,
        })?;

        if let Err(e) = std::fs::remove_file(path) {
            self.log.warn(&format!(
                "{}: converted but could not delete source: {}",
                file_name, e
            ));
        }

        self.log.info(&format!(
            "Converted {} -> {}",
            file_name,
            script_path.display()
        ));

        Ok(ConvertedFile {
            source: path.to_path_buf(),
            script: script_path,
            diagnostics: script.diagnostics.len(),
        })
    }

    fn log_diagnostics(&self, file_name: &str, script: &CompiledScript) {
        for diagnostic in &script.diagnostics {
            let message = format!("{}: {}", file_name, diagnostic);
            match diagnostic.kind {
                DiagnosticKind::Unhandled => self.log.info(&message),
                DiagnosticKind::Failed(_) => self.log.error(&message),
            }
        }
    }
}

fn is_recording(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        input: PathBuf,
        output: PathBuf,
        log_path: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let input = dir.path().join("recordings");
            let output = dir.path().join("e2e");
            let log_path = dir.path().join("conversion.log");
            std::fs::create_dir_all(&input).unwrap();
            Self {
                _dir: dir,
                input,
                output,
                log_path,
            }
        }

        fn driver(&self) -> ConversionDriver {
            ConversionDriver::new(&self.output, ConversionLog::new(&self.log_path))
        }

        fn add(&self, name: &str, content: &str) -> PathBuf {
            let path = self.input.join(name);
            std::fs::write(&path, content).unwrap();
            path
        }

        fn log(&self) -> String {
            std::fs::read_to_string(&self.log_path).unwrap_or_default()
        }
    }

    #[test]
    fn test_converts_and_consumes_recording() {
        let fx = Fixture::new();
        let source = fx.add(
            "Login Flow.json",
            r##"{ "steps": [{ "type": "click", "selectors": [["#go"]] }] }"##,
        );

        let report = fx.driver().convert_all(&fx.input).unwrap();

        assert_eq!(report.converted.len(), 1);
        assert!(report.failed.is_empty());
        assert!(!source.exists());
        let script = std::fs::read_to_string(fx.output.join("login_flow.cy.js")).unwrap();
        assert!(script.contains("describe('Login Flow', () => {"));
        assert!(script.contains(".should('exist').first().click();"));
    }

    #[test]
    fn test_rerun_on_consumed_input_produces_nothing() {
        let fx = Fixture::new();
        fx.add("a.json", r#"{ "steps": [] }"#);

        let first = fx.driver().convert_all(&fx.input).unwrap();
        assert_eq!(first.converted.len(), 1);

        let second = fx.driver().convert_all(&fx.input).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_bad_file_is_isolated() {
        let fx = Fixture::new();
        let broken = fx.add("broken.json", "{ not json");
        fx.add("good.json", r#"{ "title": "Good" }"#);
        fx.add("notes.txt", "ignored");

        let report = fx.driver().convert_all(&fx.input).unwrap();

        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source, broken);
        assert!(broken.exists());
        assert!(fx.input.join("notes.txt").exists());
        assert!(fx.log().contains("Failed to parse recording"));
    }

    #[test]
    fn test_missing_input_dir_is_empty_batch() {
        let fx = Fixture::new();
        let report = fx.driver().convert_all(&fx.input.join("absent")).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_step_problems_are_logged_with_position() {
        let fx = Fixture::new();
        let path = fx.add(
            "steps.json",
            r#"{ "steps": [
                { "type": "navigate", "url": "https://example.com" },
                { "type": "click" },
                { "type": "customStep" }
            ] }"#,
        );

        let converted = fx.driver().convert_file(&path).unwrap();

        assert_eq!(converted.diagnostics, 2);
        let log = fx.log();
        assert!(log.contains("steps.json: Step 2: click is missing a selector"));
        assert!(log.contains("steps.json: Step 3: unhandled step type 'customStep'"));
    }

    #[test]
    fn test_malformed_step_still_writes_script() {
        let fx = Fixture::new();
        let path = fx.add(
            "mixed.json",
            r##"{
                "viewport": { "width": 1280.5, "height": 720 },
                "steps": [
                    { "url": "x" },
                    { "type": "click", "selectors": [["#go"]] },
                    { "type": "keyDown", "key": 13 }
                ]
            }"##,
        );

        let converted = fx.driver().convert_file(&path).unwrap();

        assert_eq!(converted.diagnostics, 1);
        assert!(!path.exists());
        let script = std::fs::read_to_string(&converted.script).unwrap();
        assert!(script.contains("cy.viewport(1281, 720);"));
        assert!(script.contains("// Step 1 (?) skipped: malformed step: missing field `type`"));
        assert!(script.contains("cy.get('#go', { timeout: 10000 }).should('exist').first().click();"));
        assert!(fx.log().contains("mixed.json: Step 1: malformed step"));
    }

    #[test]
    fn test_unwritable_output_keeps_source() {
        let fx = Fixture::new();
        let path = fx.add("keep.json", r#"{ "steps": [] }"#);
        // A file where the output directory should be
        std::fs::write(&fx.output, "").unwrap();

        let result = fx.driver().convert_file(&path);

        assert!(matches!(result, Err(ConvertError::OutputDir { .. })));
        assert!(path.exists());
    }
}
