use std::sync::Arc;

use crate::dataset::RawProblem;
use crate::domain::{
    ExecutionLimits, ProblemResult, ProblemSpec, RunState, ShotOutcome, ShotStatus, TestCase,
    Verdict,
};
use crate::error::RunError;
use crate::judge::traits::Judge;
use crate::provider::traits::Provider;
use crate::runlog::RunLog;
use crate::sanitize::sanitize_filename;

/// Drives the per-problem shot loop: generation, compilation, execution over
/// every test case, verdict aggregation, and durable recording. Owns the run
/// state for the duration of the run; the run log is its only persistence
/// boundary.
#[derive(Debug)]
pub struct EvaluationPipeline {
    judge: Arc<dyn Judge>,
    provider: Arc<dyn Provider>,
    log: RunLog,
    state: RunState,
    shots: u32,
    ignore_limits: bool,
}

impl EvaluationPipeline {
    pub fn new(
        judge: Arc<dyn Judge>,
        provider: Arc<dyn Provider>,
        log: RunLog,
        shots: u32,
        ignore_limits: bool,
    ) -> Self {
        let state = log.state();
        Self {
            judge,
            provider,
            log,
            state,
            shots,
            ignore_limits,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Evaluates one problem across up to `shots` attempts, stopping at the
    /// first fully-passing shot. Returns the terminal record, or `None` when
    /// the title was already processed (re-evaluation is never attempted).
    ///
    /// Every failed shot is appended to the log as it happens; the terminal
    /// record is the passing shot's, or the last attempted shot's.
    #[tracing::instrument(skip_all, fields(title = %raw.title))]
    pub async fn evaluate(
        &mut self,
        raw: &RawProblem,
        position: usize,
        total: usize,
    ) -> Result<Option<ProblemResult>, RunError> {
        if self.state.is_processed(&raw.title) {
            tracing::info!("Skipping already processed problem: {}", raw.title);
            return Ok(None);
        }

        let problem = match raw.validate() {
            Ok(problem) => problem,
            Err(message) => {
                tracing::error!("Problem validation error: {}", message);
                let record = self.append_record(
                    raw.title.clone(),
                    raw.category_or_default(),
                    None,
                    message,
                    0,
                    ShotStatus::ValidationError,
                )?;
                self.state.processed_titles.insert(raw.title.clone());
                return Ok(Some(record));
            }
        };

        tracing::info!("Judging problem: {}", problem.title);
        let limits = problem.execution_limits(self.ignore_limits);
        let tag_base = sanitize_filename(&problem.title);

        let mut terminal = None;
        for shot in 1..=self.shots {
            let candidate = match self.provider.generate(&problem).await {
                Ok(candidate) => candidate,
                Err(e) => {
                    let message = e.message();
                    tracing::error!("Solution generation failed: {}", message);
                    let record = self.record_shot(
                        &problem,
                        ShotOutcome::GenerationFailed { message },
                        "No solution generated".to_string(),
                        shot,
                    )?;
                    terminal = Some(record);
                    continue;
                }
            };

            let tag = format!("{}_shot_{}", tag_base, shot);
            let artifact = match self.judge.compile(&candidate, &tag).await {
                Ok(artifact) => artifact,
                Err(e) => {
                    tracing::error!("Compilation failed: {}", e.message());
                    let record = self.record_shot(
                        &problem,
                        ShotOutcome::CompilationFailed {
                            message: e.message().to_string(),
                        },
                        candidate,
                        shot,
                    )?;
                    terminal = Some(record);
                    continue;
                }
            };

            // Every test case runs, in problem order, so the summary reflects
            // full coverage rather than stopping at the first mismatch.
            let mut verdicts = Vec::with_capacity(problem.test_cases.len());
            for test_case in &problem.test_cases {
                verdicts.push(self.run_test_case(&artifact, test_case, &limits).await);
            }

            let outcome = ShotOutcome::Evaluated { verdicts };
            let passed = outcome.passed();
            tracing::info!(
                "Problem {}/{} Shot {}: {}",
                position + 1,
                total,
                shot,
                outcome.summary()
            );

            if passed {
                self.state.total_passed += 1;
            }
            let record = self.record_shot(&problem, outcome, candidate, shot)?;
            terminal = Some(record);
            if passed {
                break;
            }
        }

        self.state.processed_titles.insert(problem.title.clone());
        Ok(terminal)
    }

    async fn run_test_case(
        &self,
        artifact: &crate::judge::traits::Artifact,
        test_case: &TestCase,
        limits: &ExecutionLimits,
    ) -> Verdict {
        let (output, error) = match self.judge.execute(artifact, &test_case.input, limits).await {
            Ok(output) => (output, None),
            Err(e) => {
                let message = e.describe();
                tracing::debug!("Execution failed: {}", message);
                (e.into_output(), Some(message))
            }
        };

        let pass = self
            .judge
            .outputs_equivalent(&output.stdout, &test_case.output);
        let log = error
            .clone()
            .unwrap_or_else(|| if pass { "Passed" } else { "Failed" }.to_string());

        Verdict {
            stdout: output.stdout,
            stderr: output.stderr,
            error,
            usage: output.usage,
            pass,
            log,
        }
    }

    fn record_shot(
        &mut self,
        problem: &ProblemSpec,
        outcome: ShotOutcome,
        candidate: String,
        shot: u32,
    ) -> Result<ProblemResult, RunError> {
        let status = outcome.status();
        self.append_record(
            problem.title.clone(),
            problem.category_or_default(),
            Some(outcome),
            candidate,
            shot,
            status,
        )
    }

    fn append_record(
        &mut self,
        title: String,
        category: String,
        outcome: Option<ShotOutcome>,
        candidate: String,
        shot: u32,
        status: ShotStatus,
    ) -> Result<ProblemResult, RunError> {
        let record = ProblemResult {
            title,
            category,
            outcome,
            candidate,
            passed_so_far: self.state.total_passed,
            shot,
            status,
            recorded_at: chrono::Utc::now(),
        };
        self.log.append(record.clone())?;
        Ok(record)
    }
}
