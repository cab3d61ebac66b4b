//! External Lean compiler invocation.
//!
//! Thin boundary around a `lean <file>` subprocess: writes the generated
//! skeleton to a temporary `.lean` file, runs the compiler with a timeout,
//! and classifies the captured output. Output classification is a pure
//! function so it can be tested without a Lean toolchain installed.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

static DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:[^:\n]+):(\d+):(\d+):\s*(error|warning):\s*(.*)$")
        .expect("invalid regex")
});

static SORRY_WARNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"declaration uses 'sorry'").expect("invalid regex"));

/// Configuration for a compiler invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Explicit path to the `lean` binary; resolved via `PATH` when absent.
    pub lean_path: Option<PathBuf>,
    /// Wall-clock budget for the subprocess.
    pub timeout_ms: u64,
    /// Captured stdout/stderr are truncated beyond this many bytes.
    pub max_output_bytes: usize,
    /// Keep the temporary `.lean` file and report its path.
    pub keep_artifact: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            lean_path: None,
            timeout_ms: 60_000,
            max_output_bytes: 262_144,
            keep_artifact: false,
        }
    }
}

impl CheckConfig {
    pub fn with_lean_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lean_path = Some(path.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_keep_artifact(mut self, keep: bool) -> Self {
        self.keep_artifact = keep;
        self
    }
}

/// One `file:line:col: severity: message` compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// Outcome classification of a compiler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Compiled cleanly with no open obligations.
    Passed,
    /// Compiled, but one or more declarations still use `sorry`.
    ProofIncomplete,
    /// The compiler reported errors or exited nonzero.
    CompileError,
    /// No usable `lean` binary was found.
    ToolNotFound,
}

/// Full report of a compiler invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub ok: bool,
    pub status: CheckStatus,
    pub stdout: String,
    pub stderr: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Path of the retained `.lean` file, when artifact keeping is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl CheckReport {
    fn tool_not_found() -> Self {
        Self {
            ok: false,
            status: CheckStatus::ToolNotFound,
            stdout: String::new(),
            stderr: String::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            artifact: None,
        }
    }
}

/// Invokes the Lean compiler on generated skeletons.
#[derive(Debug, Clone, Default)]
pub struct LeanChecker {
    config: CheckConfig,
}

impl LeanChecker {
    pub fn new(config: CheckConfig) -> Self {
        Self { config }
    }

    /// Resolve the compiler binary from the explicit path or `PATH`.
    fn resolve_binary(&self) -> Option<PathBuf> {
        match self.config.lean_path {
            Some(ref path) => path.is_file().then(|| path.clone()),
            None => which::which("lean").ok(),
        }
    }

    /// Compile `source` and classify the result.
    ///
    /// A missing binary is reported as a `ToolNotFound` report rather than
    /// an error; `Err` is reserved for I/O failures and timeout expiry.
    pub fn check(&self, source: &str) -> Result<CheckReport> {
        let Some(binary) = self.resolve_binary() else {
            tracing::debug!("lean binary not found on PATH");
            return Ok(CheckReport::tool_not_found());
        };

        let mut file = tempfile::Builder::new()
            .prefix("prooflift-")
            .suffix(".lean")
            .tempfile()?;
        file.write_all(source.as_bytes())?;
        file.flush()?;

        tracing::debug!(path = %file.path().display(), "invoking lean");
        let mut child = Command::new(&binary)
            .arg(file.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::SubprocessComm(format!("failed to spawn lean: {}", e)))?;

        let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms);
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(Error::timeout(self.config.timeout_ms));
                }
                None => std::thread::sleep(Duration::from_millis(50)),
            }
        };

        let output = child
            .wait_with_output()
            .map_err(|e| Error::SubprocessComm(format!("failed to collect output: {}", e)))?;
        let stdout = truncate_output(&output.stdout, self.config.max_output_bytes);
        let stderr = truncate_output(&output.stderr, self.config.max_output_bytes);

        let artifact = if self.config.keep_artifact {
            let (_, path) = file
                .keep()
                .map_err(|e| Error::SubprocessComm(format!("failed to keep artifact: {}", e)))?;
            Some(path)
        } else {
            None
        };

        let mut report = classify_output(&stdout, &stderr, status.success());
        report.artifact = artifact;
        Ok(report)
    }
}

fn truncate_output(bytes: &[u8], max: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= max {
        return text.into_owned();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Classify captured compiler output. Pure, so tests can feed it canned
/// transcripts without running Lean.
fn classify_output(stdout: &str, stderr: &str, exited_ok: bool) -> CheckReport {
    let combined = format!("{}\n{}", stdout, stderr);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for caps in DIAGNOSTIC.captures_iter(&combined) {
        let diagnostic = Diagnostic {
            line: caps[1].parse().unwrap_or(0),
            column: caps[2].parse().unwrap_or(0),
            message: caps[4].trim().to_string(),
        };
        match &caps[3] {
            "error" => errors.push(diagnostic),
            _ => warnings.push(diagnostic),
        }
    }

    let status = if !errors.is_empty() || !exited_ok {
        CheckStatus::CompileError
    } else if SORRY_WARNING.is_match(&combined) {
        CheckStatus::ProofIncomplete
    } else {
        CheckStatus::Passed
    };

    CheckReport {
        ok: matches!(status, CheckStatus::Passed | CheckStatus::ProofIncomplete),
        status,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        errors,
        warnings,
        artifact: None,
    }
}
