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
pub struct JavaJudge {
    workspace: PathBuf,
}

impl JavaJudge {
    pub fn new() -> std::io::Result<Self> {
        let base = std::env::temp_dir().join("codebench");
        std::fs::create_dir_all(&base)?;

        let workspace = base.join(format!("java_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&workspace)?;
        Ok(Self { workspace })
    }
}

/// The source file must be named after the public class, so the class name has
/// to be recovered from the candidate text before anything touches javac.
pub(crate) fn public_class_name(source: &str) -> Option<String> {
    let tokens: Vec<&str> = source.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        if *token != "public" {
            continue;
        }
        // Skip modifiers between `public` and `class`.
        let mut j = i + 1;
        while tokens
            .get(j)
            .is_some_and(|t| matches!(*t, "final" | "abstract" | "strictfp"))
        {
            j += 1;
        }
        if tokens.get(j).copied() != Some("class") {
            continue;
        }
        let name: String = tokens
            .get(j + 1)?
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
            .collect();
        if !name.is_empty() {
            return Some(name);
        }
    }
    None
}

#[async_trait]
impl Judge for JavaJudge {
    async fn compile(&self, source: &str, tag: &str) -> Result<Artifact, CompileError> {
        let class = public_class_name(source).ok_or_else(|| CompileError::CompilationFailed {
            msg: "Could not determine public class name".to_string(),
        })?;

        // Per-shot directory: the file name is dictated by the class, so two
        // shots of the same problem would otherwise clobber each other.
        let class_dir = self.workspace.join(tag);
        tokio::fs::create_dir_all(&class_dir)
            .await
            .map_err(|e| CompileError::Internal {
                msg: format!("Failed to create class directory: {}", e),
            })?;

        let source_file = class_dir.join(format!("{}.java", class));
        tokio::fs::write(&source_file, source)
            .await
            .map_err(|e| CompileError::Internal {
                msg: format!("Failed to write source file: {}", e),
            })?;

        let mut cmd = Command::new("javac");
        cmd.arg("-d")
            .arg(&class_dir)
            .arg(&source_file)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match timeout(COMPILE_TIMEOUT, cmd.output()).await {
            Ok(result) => result.map_err(|e| CompileError::Internal {
                msg: format!("Failed to execute javac: {}", e),
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

        Ok(Artifact::JavaClass { class_dir, class })
    }

    async fn execute(
        &self,
        artifact: &Artifact,
        stdin: &str,
        limits: &ExecutionLimits,
    ) -> Result<ExecOutput, ExecError> {
        let Artifact::JavaClass { class_dir, class } = artifact else {
            return Err(ExecError::Internal {
                msg: "Java judge was handed a non-class artifact".to_string(),
            });
        };

        let mut cmd = Command::new("java");
        // The heap cap goes to the JVM itself; RSS-based watching would count
        // JVM overhead against the candidate.
        if let Some(memory_bytes) = limits.memory_bytes {
            cmd.arg(format!("-Xmx{}m", memory_bytes / (1024 * 1024)));
        }
        cmd.arg("-cp").arg(class_dir).arg(class);

        let jvm_limits = ExecutionLimits {
            time_ms: limits.time_ms,
            memory_bytes: None,
        };
        run_bounded(cmd, stdin, &jvm_limits).await
    }

    fn outputs_equivalent(&self, actual: &str, expected: &str) -> bool {
        normalized_eq(actual, expected)
    }
}

impl Drop for JavaJudge {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.workspace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_plain_public_class() {
        let source = "import java.util.*;\npublic class Main {\n}";
        assert_eq!(public_class_name(source), Some("Main".to_string()));
    }

    #[test]
    fn finds_public_class_with_modifiers() {
        let source = "public final class Solution { }";
        assert_eq!(public_class_name(source), Some("Solution".to_string()));
    }

    #[test]
    fn handles_brace_glued_to_name() {
        let source = "public class Apartments{public static void main(String[] a){}}";
        assert_eq!(public_class_name(source), Some("Apartments".to_string()));
    }

    #[test]
    fn rejects_source_without_public_class() {
        assert_eq!(public_class_name("class Main { }"), None);
        assert_eq!(public_class_name("int main() { return 0; }"), None);
    }

    #[test]
    fn public_method_does_not_confuse_the_scan() {
        let source = "public class A { public static void main(String[] args) {} }";
        assert_eq!(public_class_name(source), Some("A".to_string()));
    }
}
