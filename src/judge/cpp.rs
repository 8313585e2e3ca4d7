use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use uuid::Uuid;

use crate::domain::ExecutionLimits;
use crate::judge::process::run_bounded;
use crate::judge::traits::{
    Artifact, CompileError, ExecError, ExecOutput, Judge, normalized_eq,
};

const COMPILE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct CppJudge {
    workspace: PathBuf,
}

impl CppJudge {
    pub fn new() -> std::io::Result<Self> {
        let base = std::env::temp_dir().join("codebench");
        std::fs::create_dir_all(&base)?;

        let workspace = base.join(format!("cpp_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&workspace)?;
        Ok(Self { workspace })
    }
}

#[async_trait]
impl Judge for CppJudge {
    async fn compile(&self, source: &str, tag: &str) -> Result<Artifact, CompileError> {
        let source_file = self.workspace.join(format!("{}.cpp", tag));
        let binary_file = self.workspace.join(format!("{}_bin", tag));

        tokio::fs::write(&source_file, source)
            .await
            .map_err(|e| CompileError::Internal {
                msg: format!("Failed to write source file: {}", e),
            })?;

        let mut cmd = Command::new("g++");
        cmd.arg("-o")
            .arg(&binary_file)
            .arg(&source_file)
            .arg("-std=c++17")
            .arg("-O2")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match timeout(COMPILE_TIMEOUT, cmd.output()).await {
            Ok(result) => result.map_err(|e| CompileError::Internal {
                msg: format!("Failed to execute g++: {}", e),
            })?,
            Err(_) => {
                return Err(CompileError::CompilationFailed {
                    msg: "Compilation timed out".to_string(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompileError::CompilationFailed {
                msg: format!("Compilation failed:\n{}", stderr),
            });
        }

        Ok(Artifact::Executable(binary_file))
    }

    async fn execute(
        &self,
        artifact: &Artifact,
        stdin: &str,
        limits: &ExecutionLimits,
    ) -> Result<ExecOutput, ExecError> {
        let Artifact::Executable(path) = artifact else {
            return Err(ExecError::Internal {
                msg: "C++ judge was handed a non-executable artifact".to_string(),
            });
        };
        run_bounded(Command::new(path), stdin, limits).await
    }

    fn outputs_equivalent(&self, actual: &str, expected: &str) -> bool {
        normalized_eq(actual, expected)
    }
}

impl Drop for CppJudge {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.workspace);
    }
}
