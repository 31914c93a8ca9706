//! Orchestrator configuration
//!
//! Defines the directories the pipeline reads and writes, the external
//! commands it runs and the limits applied to them.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// An external command split into program and leading arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line on whitespace
    ///
    /// No quoting is supported; returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API listens on
    pub bind_addr: String,

    /// Where submitted recordings are persisted before compilation
    pub recordings_dir: PathBuf,

    /// Where compiled scripts are written
    pub scripts_dir: PathBuf,

    /// Append-only conversion log
    pub conversion_log: PathBuf,

    /// Per-spec report files written by the runner
    pub reports_dir: PathBuf,

    /// Merged results file
    pub results_path: PathBuf,

    /// Per-spec screenshot directories written by the runner
    pub screenshots_dir: PathBuf,

    /// Test runner; `--spec <script>` is appended
    pub runner_command: CommandSpec,

    /// Report merger; the report files are appended
    pub merge_command: CommandSpec,

    /// Limit for every external process; `None` waits forever
    pub stage_timeout: Option<Duration>,

    /// Number of finished jobs kept for the status endpoint
    pub history_limit: usize,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - RECAST_BIND_ADDR (default: 0.0.0.0:3000)
    /// - RECORDINGS_DIR (default: recordings)
    /// - SCRIPTS_DIR (default: cypress/e2e)
    /// - CONVERSION_LOG (default: conversion.log)
    /// - REPORTS_DIR (default: cypress/reports)
    /// - RESULTS_PATH (default: cypress/results.json)
    /// - SCREENSHOTS_DIR (default: cypress/screenshots)
    /// - RUNNER_COMMAND (default: npx cypress run --browser edge --headless)
    /// - MERGE_COMMAND (default: npx mochawesome-merge)
    /// - STAGE_TIMEOUT_SECS (default: unset, no limit)
    /// - HISTORY_LIMIT (default: 20)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();

        if let Some(addr) = get("RECAST_BIND_ADDR") {
            config.bind_addr = addr;
        }

        for (key, field) in [
            ("RECORDINGS_DIR", &mut config.recordings_dir),
            ("SCRIPTS_DIR", &mut config.scripts_dir),
            ("CONVERSION_LOG", &mut config.conversion_log),
            ("REPORTS_DIR", &mut config.reports_dir),
            ("RESULTS_PATH", &mut config.results_path),
            ("SCREENSHOTS_DIR", &mut config.screenshots_dir),
        ] {
            if let Some(value) = get(key) {
                *field = PathBuf::from(value);
            }
        }

        // Blank values were filtered above, so parsing cannot come back empty
        if let Some(runner) = get("RUNNER_COMMAND").and_then(|line| CommandSpec::parse(&line)) {
            config.runner_command = runner;
        }
        if let Some(merge) = get("MERGE_COMMAND").and_then(|line| CommandSpec::parse(&line)) {
            config.merge_command = merge;
        }

        if let Some(raw) = get("STAGE_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("STAGE_TIMEOUT_SECS must be a number of seconds, got '{}'", raw)
            })?;
            config.stage_timeout = Some(Duration::from_secs(secs));
        }

        config.history_limit = get("HISTORY_LIMIT")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(config.history_limit);

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("bind address '{}' is not a valid socket address", self.bind_addr);
        }

        if self.stage_timeout.is_some_and(|timeout| timeout.is_zero()) {
            anyhow::bail!("stage timeout must be greater than 0");
        }

        if self.results_path.file_name().is_none() {
            anyhow::bail!("results path must name a file");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            recordings_dir: PathBuf::from("recordings"),
            scripts_dir: PathBuf::from("cypress/e2e"),
            conversion_log: PathBuf::from("conversion.log"),
            reports_dir: PathBuf::from("cypress/reports"),
            results_path: PathBuf::from("cypress/results.json"),
            screenshots_dir: PathBuf::from("cypress/screenshots"),
            runner_command: CommandSpec::new(
                "npx",
                ["cypress", "run", "--browser", "edge", "--headless"],
            ),
            merge_command: CommandSpec::new("npx", ["mochawesome-merge"]),
            stage_timeout: None,
            history_limit: 20,
        }
    }
}
