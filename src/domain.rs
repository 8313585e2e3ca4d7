use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A problem as shipped in the dataset. `title` is the resume key and must be
/// stable across runs.
#[derive(Clone, Debug, Deserialize)]
pub struct ProblemSpec {
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Seconds.
    pub time_limit: f64,
    /// Megabytes.
    pub memory_limit: u64,
    pub test_cases: Vec<TestCase>,
}

impl ProblemSpec {
    pub fn execution_limits(&self, ignore_limits: bool) -> ExecutionLimits {
        if ignore_limits {
            ExecutionLimits {
                time_ms: None,
                memory_bytes: None,
            }
        } else {
            ExecutionLimits {
                time_ms: Some((self.time_limit * 1000.0) as u64),
                memory_bytes: Some(self.memory_limit * 1024 * 1024),
            }
        }
    }

    pub fn category_or_default(&self) -> String {
        self.category
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub output: String,
}

#[derive(Clone, Debug, Default)]
pub struct ExecutionLimits {
    pub time_ms: Option<u64>,
    pub memory_bytes: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub execution_time_ms: u64,
    pub peak_memory_usage_bytes: u64,
}

/// Outcome of running one test case. Immutable once built.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Verdict {
    pub stdout: String,
    pub stderr: String,
    #[serde(default)]
    pub error: Option<String>,
    pub usage: ResourceUsage,
    pub pass: bool,
    pub log: String,
}

/// What one shot produced, before pass/fail classification.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShotOutcome {
    GenerationFailed { message: String },
    CompilationFailed { message: String },
    Evaluated { verdicts: Vec<Verdict> },
}

impl ShotOutcome {
    pub fn passed(&self) -> bool {
        match self {
            ShotOutcome::Evaluated { verdicts } => verdicts.iter().all(|v| v.pass),
            _ => false,
        }
    }

    pub fn status(&self) -> ShotStatus {
        match self {
            ShotOutcome::GenerationFailed { .. } => ShotStatus::GenerationError,
            ShotOutcome::CompilationFailed { .. } => ShotStatus::CompileError,
            ShotOutcome::Evaluated { .. } => {
                if self.passed() {
                    ShotStatus::Passed
                } else {
                    ShotStatus::Failed
                }
            }
        }
    }

    /// One-line summary in the shape the run log and progress output use.
    pub fn summary(&self) -> String {
        match self {
            ShotOutcome::GenerationFailed { message } => message.clone(),
            ShotOutcome::CompilationFailed { message } => message.clone(),
            ShotOutcome::Evaluated { verdicts } => {
                let passed = verdicts.iter().filter(|v| v.pass).count();
                format!("Passed {}/{} test cases", passed, verdicts.len())
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShotStatus {
    Passed,
    Failed,
    CompileError,
    GenerationError,
    ValidationError,
}

/// One record in the run log. Failed shots are appended as they happen; the
/// passing shot (or the last attempted one) is the terminal record for the
/// problem.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProblemResult {
    pub title: String,
    pub category: String,
    /// `None` only for validation failures, where no shot ever ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ShotOutcome>,
    /// Raw candidate source, kept for diagnostics.
    pub candidate: String,
    /// Cumulative passed-problem count at the time this record was written.
    pub passed_so_far: u64,
    pub shot: u32,
    pub status: ShotStatus,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

/// Derived from the run log at startup; mutated only by appending results.
#[derive(Clone, Debug, Default)]
pub struct RunState {
    pub total_passed: u64,
    pub processed_titles: HashSet<String>,
}

impl RunState {
    pub fn is_processed(&self, title: &str) -> bool {
        self.processed_titles.contains(title)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    GnuCpp,
    Python,
    Java,
}

impl Language {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "cpp" => Some(Language::GnuCpp),
            "python" => Some(Language::Python),
            "java" => Some(Language::Java),
            _ => None,
        }
    }
}
