use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use uuid::Uuid;

use crate::domain::ExecutionLimits;
use crate::judge::process::run_bounded;
use crate::judge::traits::{
    Artifact, CompileError, ExecError, ExecOutput, Judge, normalized_eq,
};

/// Interpreted backend: "compilation" only materializes the script, so it
/// always succeeds short of I/O errors.
#[derive(Debug)]
pub struct PythonJudge {
    workspace: PathBuf,
}

impl PythonJudge {
    pub fn new() -> std::io::Result<Self> {
        let base = std::env::temp_dir().join("codebench");
        std::fs::create_dir_all(&base)?;

        let workspace = base.join(format!("python_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&workspace)?;
        Ok(Self { workspace })
    }
}

#[async_trait]
impl Judge for PythonJudge {
    async fn compile(&self, source: &str, tag: &str) -> Result<Artifact, CompileError> {
        let script = self.workspace.join(format!("{}.py", tag));
        tokio::fs::write(&script, source)
            .await
            .map_err(|e| CompileError::Internal {
                msg: format!("Failed to write source file: {}", e),
            })?;
        Ok(Artifact::Script(script))
    }

    async fn execute(
        &self,
        artifact: &Artifact,
        stdin: &str,
        limits: &ExecutionLimits,
    ) -> Result<ExecOutput, ExecError> {
        let Artifact::Script(path) = artifact else {
            return Err(ExecError::Internal {
                msg: "Python judge was handed a non-script artifact".to_string(),
            });
        };
        let mut cmd = Command::new("python3");
        cmd.arg(path);
        run_bounded(cmd, stdin, limits).await
    }

    fn outputs_equivalent(&self, actual: &str, expected: &str) -> bool {
        normalized_eq(actual, expected)
    }
}

impl Drop for PythonJudge {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.workspace);
    }
}
