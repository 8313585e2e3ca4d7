use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::{Duration, Instant, sleep};

use crate::domain::{ExecutionLimits, ResourceUsage};
use crate::judge::traits::{ExecError, ExecOutput, LimitKind};

const MEMORY_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs `cmd` with `stdin` piped in, enforcing the given limits. The process
/// is hard-killed the moment a limit is exceeded; a hung candidate can never
/// wedge the run. Peak memory is sampled from /proc/<pid>/status while the
/// process lives.
pub async fn run_bounded(
    mut cmd: Command,
    stdin: &str,
    limits: &ExecutionLimits,
) -> Result<ExecOutput, ExecError> {
    cmd.stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(|e| ExecError::Internal {
        msg: format!("Failed to spawn process: {}", e),
    })?;

    let stdout_task = child.stdout.take().map(read_to_string_task);
    let stderr_task = child.stderr.take().map(read_to_string_task);

    // The write runs detached: a candidate that never drains its input would
    // otherwise fill the pipe and stall the judge before the limit clock
    // below ever starts. A candidate that exits without reading closes the
    // pipe; that is its problem, not the judge's.
    if let Some(mut stdin_handle) = child.stdin.take() {
        let input = stdin.to_string();
        tokio::spawn(async move {
            if let Err(e) = stdin_handle.write_all(input.as_bytes()).await {
                tracing::debug!("stdin write ended early: {}", e);
            }
        });
    }

    let pid = child.id();
    let peak_memory = Arc::new(AtomicU64::new(0));

    enum WaitEnd {
        Exited(std::process::ExitStatus),
        TimedOut,
        MemoryExceeded,
    }

    let time_limit = limits.time_ms.map(Duration::from_millis);
    let end = tokio::select! {
        res = child.wait() => match res {
            Ok(status) => WaitEnd::Exited(status),
            Err(e) => {
                return Err(ExecError::Internal {
                    msg: format!("Failed to wait for process: {}", e),
                });
            }
        },
        _ = watch_memory(pid, limits.memory_bytes, peak_memory.clone()) => WaitEnd::MemoryExceeded,
        _ = sleep(time_limit.unwrap_or_default()), if time_limit.is_some() => WaitEnd::TimedOut,
    };

    let limit_kind = match &end {
        WaitEnd::TimedOut => Some(LimitKind::Time),
        WaitEnd::MemoryExceeded => Some(LimitKind::Ram),
        WaitEnd::Exited(_) => None,
    };
    if limit_kind.is_some() {
        let _ = child.kill().await;
    }

    let stdout = collect(stdout_task).await;
    let stderr = collect(stderr_task).await;
    let usage = ResourceUsage {
        execution_time_ms: start.elapsed().as_millis() as u64,
        peak_memory_usage_bytes: peak_memory.load(Ordering::Relaxed),
    };

    let status = match end {
        WaitEnd::Exited(status) => status.code().unwrap_or(-1),
        _ => -1,
    };

    let output = ExecOutput {
        status,
        stdout,
        stderr,
        usage,
    };

    if let Some(kind) = limit_kind {
        return Err(ExecError::LimitsExceeded { output, kind });
    }
    if status != 0 {
        return Err(ExecError::Crash { output });
    }
    Ok(output)
}

fn read_to_string_task<R>(mut pipe: R) -> tokio::task::JoinHandle<String>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect(task: Option<tokio::task::JoinHandle<String>>) -> String {
    match task {
        Some(task) => task.await.unwrap_or_default(),
        None => String::new(),
    }
}

/// Samples VmHWM for the child. Resolves only when the memory limit is
/// exceeded; once the process exits the /proc entry disappears and the loop
/// idles until the select drops it.
async fn watch_memory(pid: Option<u32>, limit: Option<u64>, peak: Arc<AtomicU64>) {
    let Some(pid) = pid else {
        std::future::pending::<()>().await;
        return;
    };

    loop {
        sleep(MEMORY_POLL_INTERVAL).await;
        if let Some(hwm) = read_vm_hwm(pid) {
            peak.fetch_max(hwm, Ordering::Relaxed);
            if limit.is_some_and(|l| hwm > l) {
                return;
            }
        }
    }
}

fn read_vm_hwm(pid: u32) -> Option<u64> {
    let status = std::fs::read_to_string(format!("/proc/{}/status", pid)).ok()?;
    let line = status.lines().find(|l| l.starts_with("VmHWM:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    fn unlimited() -> ExecutionLimits {
        ExecutionLimits {
            time_ms: None,
            memory_bytes: None,
        }
    }

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let output = run_bounded(sh("echo out; echo err >&2"), "", &unlimited())
            .await
            .unwrap();
        assert_eq!(output.status, 0);
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn feeds_stdin() {
        let output = run_bounded(sh("cat"), "1 2 3\n", &unlimited()).await.unwrap();
        assert_eq!(output.stdout, "1 2 3\n");
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_crash() {
        let err = run_bounded(sh("echo partial; exit 3"), "", &unlimited())
            .await
            .unwrap_err();
        match err {
            ExecError::Crash { output } => {
                assert_eq!(output.status, 3);
                assert_eq!(output.stdout, "partial\n");
            }
            other => panic!("expected Crash, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn time_limit_kills_the_process() {
        let limits = ExecutionLimits {
            time_ms: Some(100),
            memory_bytes: None,
        };
        let start = Instant::now();
        let err = run_bounded(sh("sleep 5"), "", &limits).await.unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(4), "kill was not bounded");
        assert!(matches!(
            err,
            ExecError::LimitsExceeded {
                kind: LimitKind::Time,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unread_stdin_larger_than_the_pipe_does_not_defeat_the_time_limit() {
        // A candidate that never drains its input must still die on time:
        // the input is far past the pipe buffer, so a blocking write before
        // the limit clock would stall here indefinitely.
        let limits = ExecutionLimits {
            time_ms: Some(100),
            memory_bytes: None,
        };
        let input = "x".repeat(1024 * 1024);

        let start = Instant::now();
        let err = run_bounded(sh("sleep 5"), &input, &limits).await.unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(3), "kill was not bounded");
        assert!(matches!(
            err,
            ExecError::LimitsExceeded {
                kind: LimitKind::Time,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn memory_limit_kills_the_process() {
        // String doubling blows past 50 MB within a few polls; the generous
        // time limit is only a backstop so a broken watch fails fast instead
        // of hanging the test.
        let limits = ExecutionLimits {
            time_ms: Some(10_000),
            memory_bytes: Some(50 * 1024 * 1024),
        };

        let err = run_bounded(
            sh("x=0123456789; while :; do x=$x$x; done"),
            "",
            &limits,
        )
        .await
        .unwrap_err();

        match err {
            ExecError::LimitsExceeded {
                kind: LimitKind::Ram,
                output,
            } => {
                assert!(output.usage.peak_memory_usage_bytes > 50 * 1024 * 1024);
            }
            other => panic!("expected Ram limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_internal() {
        let cmd = Command::new("/nonexistent/binary/for/codebench");
        let err = run_bounded(cmd, "", &unlimited()).await.unwrap_err();
        assert!(matches!(err, ExecError::Internal { .. }));
    }
}
