use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::{ProblemResult, RunState, ShotStatus};
use crate::error::RunError;

/// On-disk shape: one document per (provider, model, language) run, holding
/// the initial config, the cumulative passed count, and the append-ordered
/// per-problem records.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LogDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<Config>,
    #[serde(default)]
    total_passed_problems: u64,
    #[serde(default)]
    problems: Vec<ProblemResult>,
}

/// The sole persistence boundary for run results. Appends are durable before
/// they return: the document is rewritten to a temp file and renamed over the
/// old one, so a crash mid-run loses at most the in-flight problem and never
/// leaves a torn record.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    doc: LogDocument,
}

impl RunLog {
    /// Starts a fresh log, discarding any previous file at `path`.
    pub fn create(path: &Path, config: &Config) -> Result<Self, RunError> {
        let log = Self {
            path: path.to_path_buf(),
            doc: LogDocument {
                config: Some(config.clone()),
                ..LogDocument::default()
            },
        };
        log.persist()?;
        Ok(log)
    }

    /// Reloads an existing log for a resumed run, or starts fresh if there is
    /// nothing to resume.
    pub fn resume(path: &Path, config: &Config) -> Result<Self, RunError> {
        if !path.exists() {
            return Self::create(path, config);
        }

        let raw = std::fs::read_to_string(path).map_err(|source| RunError::LogIo {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: LogDocument =
            serde_json::from_str(&raw).map_err(|source| RunError::LogCorrupt {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// The state a resumed pipeline starts from.
    pub fn state(&self) -> RunState {
        RunState {
            total_passed: self.doc.total_passed_problems,
            processed_titles: self
                .doc
                .problems
                .iter()
                .map(|p| p.title.clone())
                .collect(),
        }
    }

    /// Appends one record and persists immediately.
    pub fn append(&mut self, result: ProblemResult) -> Result<(), RunError> {
        self.doc.total_passed_problems = result.passed_so_far;
        self.doc.problems.push(result);
        self.persist()
    }

    pub fn records(&self) -> &[ProblemResult] {
        &self.doc.problems
    }

    fn persist(&self) -> Result<(), RunError> {
        let io_err = |source| RunError::LogIo {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(&self.doc).map_err(|e| RunError::LogIo {
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

/// Counts records whose terminal status is Passed; used by tests and the
/// end-of-run summary to cross-check the cumulative counter.
pub fn passed_record_count(records: &[ProblemResult]) -> u64 {
    records
        .iter()
        .filter(|r| r.status == ShotStatus::Passed)
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ShotOutcome, ShotStatus};
    use uuid::Uuid;

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir().join(format!("codebench_log_{}.json", Uuid::new_v4()))
    }

    fn test_config() -> Config {
        serde_json::from_str(r#"{"provider": "openai", "model": "gpt-4o", "language": "cpp"}"#)
            .unwrap()
    }

    fn record(title: &str, status: ShotStatus, passed_so_far: u64, shot: u32) -> ProblemResult {
        let outcome = match status {
            ShotStatus::ValidationError => None,
            ShotStatus::GenerationError => Some(ShotOutcome::GenerationFailed {
                message: "Solution generation failed".to_string(),
            }),
            ShotStatus::CompileError => Some(ShotOutcome::CompilationFailed {
                message: "Compilation failed".to_string(),
            }),
            _ => Some(ShotOutcome::Evaluated { verdicts: vec![] }),
        };
        ProblemResult {
            title: title.to_string(),
            category: "Uncategorized".to_string(),
            outcome,
            candidate: "int main() {}".to_string(),
            passed_so_far,
            shot,
            status,
            recorded_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn appends_survive_reopen() {
        let path = temp_log_path();
        let config = test_config();

        let mut log = RunLog::create(&path, &config).unwrap();
        log.append(record("Two Sum", ShotStatus::Passed, 1, 1)).unwrap();
        log.append(record("Sort List", ShotStatus::Failed, 1, 1)).unwrap();
        drop(log);

        let reopened = RunLog::resume(&path, &config).unwrap();
        let state = reopened.state();
        assert_eq!(state.total_passed, 1);
        assert!(state.is_processed("Two Sum"));
        assert!(state.is_processed("Sort List"));
        assert!(!state.is_processed("Apartments"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn create_discards_previous_run() {
        let path = temp_log_path();
        let config = test_config();

        let mut log = RunLog::create(&path, &config).unwrap();
        log.append(record("Two Sum", ShotStatus::Passed, 1, 1)).unwrap();
        drop(log);

        let fresh = RunLog::create(&path, &config).unwrap();
        assert_eq!(fresh.state().total_passed, 0);
        assert!(fresh.state().processed_titles.is_empty());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn resume_without_existing_file_starts_fresh() {
        let path = temp_log_path();
        let log = RunLog::resume(&path, &test_config()).unwrap();
        assert_eq!(log.state().total_passed, 0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corrupt_log_is_reported_not_swallowed() {
        let path = temp_log_path();
        std::fs::write(&path, "{not json").unwrap();

        let err = RunLog::resume(&path, &test_config()).unwrap_err();
        assert!(matches!(err, RunError::LogCorrupt { .. }));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn no_temp_file_left_behind() {
        let path = temp_log_path();
        let mut log = RunLog::create(&path, &test_config()).unwrap();
        log.append(record("Two Sum", ShotStatus::Passed, 1, 1)).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn failed_shots_count_as_processed_on_resume() {
        let path = temp_log_path();
        let config = test_config();

        let mut log = RunLog::create(&path, &config).unwrap();
        log.append(record("Apartments", ShotStatus::GenerationError, 0, 1))
            .unwrap();
        log.append(record("Apartments", ShotStatus::Failed, 0, 2)).unwrap();
        drop(log);

        let state = RunLog::resume(&path, &config).unwrap().state();
        assert!(state.is_processed("Apartments"));
        assert_eq!(state.total_passed, 0);

        std::fs::remove_file(&path).unwrap();
    }
}
