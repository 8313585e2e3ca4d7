use std::path::PathBuf;

use crate::domain::{ExecutionLimits, ResourceUsage};

/// What a successful compile step produces. Interpreted backends hand back
/// the materialized script; Java needs the class directory plus entry class.
#[derive(Clone, Debug)]
pub enum Artifact {
    Executable(PathBuf),
    Script(PathBuf),
    JavaClass { class_dir: PathBuf, class: String },
}

#[derive(Clone, Debug)]
pub enum CompileError {
    CompilationFailed { msg: String },
    Internal { msg: String },
}

impl CompileError {
    pub fn message(&self) -> &str {
        match self {
            CompileError::CompilationFailed { msg } => msg,
            CompileError::Internal { msg } => msg,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExecOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
    pub usage: ResourceUsage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitKind {
    Time,
    Ram,
}

#[derive(Clone, Debug)]
pub enum ExecError {
    /// Killed for exceeding a limit; whatever output was captured rides along.
    LimitsExceeded { output: ExecOutput, kind: LimitKind },
    /// Non-zero exit or signal death of the candidate.
    Crash { output: ExecOutput },
    /// The judge itself failed (spawn error, missing artifact).
    Internal { msg: String },
}

impl ExecError {
    pub fn describe(&self) -> String {
        match self {
            ExecError::LimitsExceeded { kind, .. } => match kind {
                LimitKind::Time => "Time limit exceeded".to_string(),
                LimitKind::Ram => "Memory limit exceeded".to_string(),
            },
            ExecError::Crash { output } => {
                format!("Runtime error (exit status {})", output.status)
            }
            ExecError::Internal { msg } => msg.clone(),
        }
    }

    /// Captured output, if the process got far enough to produce any.
    pub fn into_output(self) -> ExecOutput {
        match self {
            ExecError::LimitsExceeded { output, .. } => output,
            ExecError::Crash { output } => output,
            ExecError::Internal { .. } => ExecOutput::default(),
        }
    }
}

/// One implementation per target language, selected once at startup.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Judge: std::fmt::Debug + Send + Sync {
    /// Materializes `source` under `tag` and compiles it if the language
    /// needs it. Interpreted backends always succeed short of I/O errors.
    async fn compile(&self, source: &str, tag: &str) -> Result<Artifact, CompileError>;

    /// Bounded execution: exceeding a limit yields `ExecError::LimitsExceeded`
    /// after a hard kill, never an indefinite wait.
    async fn execute(
        &self,
        artifact: &Artifact,
        stdin: &str,
        limits: &ExecutionLimits,
    ) -> Result<ExecOutput, ExecError>;

    /// Deterministic output-equivalence check. Backends share the default
    /// normalization unless the language demands otherwise.
    fn outputs_equivalent(&self, actual: &str, expected: &str) -> bool;
}

/// Trailing-whitespace-insensitive comparison: each line is right-trimmed and
/// trailing blank lines are dropped before an exact match.
pub fn normalized_eq(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}

fn normalize(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_is_reflexive() {
        for sample in ["", "42\n", "a b\nc d", "1 \n2\t\n\n\n", "no newline"] {
            assert!(normalized_eq(sample, sample), "not reflexive for {sample:?}");
        }
    }

    #[test]
    fn trailing_whitespace_is_ignored() {
        assert!(normalized_eq("1 2 3   \n", "1 2 3\n"));
        assert!(normalized_eq("yes\n\n\n", "yes"));
        assert!(normalized_eq("a\r", "a"));
    }

    #[test]
    fn leading_whitespace_is_significant() {
        assert!(!normalized_eq("  1 2 3", "1 2 3"));
        assert!(!normalized_eq("1\n2", "1\n 2"));
    }

    #[test]
    fn different_content_differs() {
        assert!(!normalized_eq("1 2 3", "1 2 4"));
        assert!(!normalized_eq("1\n2\n3", "1\n2"));
    }
}
