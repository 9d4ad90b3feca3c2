use crate::core::{Verdict, Verifier};
use crate::utils::error::{CheckError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_PROGRAM: &str = "cargo";
pub const DEFAULT_ARGS: [&str; 4] = ["check", "--quiet", "--message-format", "short"];

/// How long a killed checker gets to be reaped before we give up on it.
const REAP_GRACE: Duration = Duration::from_secs(5);

pub fn timeout_message(timeout: Duration) -> String {
    format!("Verification timed out after {}s", timeout.as_secs_f32())
}

enum Completion {
    Exited {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    TimedOut,
}

/// Runs an external checker inside the sandbox and trusts its exit status.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    target_dir: Option<PathBuf>,
}

impl CommandVerifier {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            target_dir: None,
        }
    }

    /// `cargo check` with the given timeout.
    pub fn cargo_check(timeout: Duration) -> Self {
        Self::new(
            DEFAULT_PROGRAM,
            DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout,
        )
    }

    /// Shares one cargo target directory between all sandboxes so dependencies
    /// are compiled once per run instead of once per block.
    pub fn with_target_dir(mut self, target_dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(target_dir.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn target_dir(&self) -> Option<&Path> {
        self.target_dir.as_deref()
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn failure_diagnostic(&self, status: ExitStatus, stdout: String, stderr: String) -> String {
        let output = if stderr.trim().is_empty() { stdout } else { stderr };
        match status.code() {
            Some(code) if output.trim().is_empty() => {
                format!("`{}` exited with status {}", self.command_line(), code)
            }
            None if output.trim().is_empty() => {
                format!("`{}` was terminated by a signal", self.command_line())
            }
            _ => output,
        }
    }

    fn spawn(&self, project_dir: &Path) -> Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(target_dir) = &self.target_dir {
            command.env("CARGO_TARGET_DIR", target_dir);
        }
        // Own group, so a timeout can take down rustc and build scripts too.
        #[cfg(unix)]
        command.process_group(0);

        command.spawn().map_err(|e| CheckError::VerifierError {
            message: format!("Failed to run `{}`: {}", self.command_line(), e),
        })
    }

    /// Runs the checker to completion, or until `deadline` when one is given.
    /// The deadline covers both the exit and the draining of its output.
    async fn execute(&self, project_dir: &Path, deadline: Option<Instant>) -> Result<Completion> {
        let mut child = self.spawn(project_dir)?;
        let group = child.id();

        let mut stdout = spawn_reader(child.stdout.take());
        let mut stderr = spawn_reader(child.stderr.take());

        let finished = async {
            let status = child.wait().await?;
            let stdout = (&mut stdout).await.unwrap_or_default();
            let stderr = (&mut stderr).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };
        let finished = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, finished).await,
            None => Ok(finished.await),
        };

        match finished {
            Ok(Ok((status, stdout, stderr))) => Ok(Completion::Exited {
                status,
                stdout,
                stderr,
            }),
            Ok(Err(e)) => {
                stdout.abort();
                stderr.abort();
                Err(CheckError::VerifierError {
                    message: format!("Failed waiting for `{}`: {}", self.command_line(), e),
                })
            }
            Err(_) => {
                if let Err(e) = terminate(&mut child, group).await {
                    tracing::warn!("⚠️ {}", e);
                }
                stdout.abort();
                stderr.abort();
                Ok(Completion::TimedOut)
            }
        }
    }

    /// Runs the checker once with no deadline so the shared target directory
    /// holds compiled dependencies before the first timed block.
    pub async fn warm_up(&self, project_dir: &Path) -> Result<()> {
        tracing::debug!(
            "Warming up `{}` in {}",
            self.command_line(),
            project_dir.display()
        );
        match self.execute(project_dir, None).await? {
            Completion::Exited { status, .. } if status.success() => Ok(()),
            Completion::Exited {
                status,
                stdout,
                stderr,
            } => Err(CheckError::VerifierError {
                message: format!(
                    "warm-up check failed: {}",
                    self.failure_diagnostic(status, stdout, stderr).trim()
                ),
            }),
            Completion::TimedOut => Err(CheckError::VerifierError {
                message: "warm-up check did not finish".to_string(),
            }),
        }
    }
}

fn spawn_reader<R>(reader: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader {
            if let Err(e) = reader.read_to_end(&mut buf).await {
                tracing::debug!("Failed to read verifier output: {}", e);
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(unix)]
fn kill_process_group(group: Option<u32>) -> bool {
    let Some(pgid) = group.and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return false;
    };
    // SAFETY: killpg only delivers a signal; the group was created for this checker at spawn.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        tracing::debug!(
            "killpg({}) failed: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
    rc == 0
}

#[cfg(not(unix))]
fn kill_process_group(_group: Option<u32>) -> bool {
    false
}

/// Kills the checker's whole process group, then reaps the checker itself.
async fn terminate(child: &mut Child, group: Option<u32>) -> Result<()> {
    if !kill_process_group(group) {
        if let Err(e) = child.start_kill() {
            tracing::debug!("Direct kill of verifier failed: {}", e);
        }
    }

    match tokio::time::timeout(REAP_GRACE, child.wait()).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(CheckError::VerifierError {
            message: format!("could not reap timed-out verifier: {}", e),
        }),
        Err(_) => Err(CheckError::VerifierError {
            message: format!(
                "timed-out verifier still running {}s after kill",
                REAP_GRACE.as_secs()
            ),
        }),
    }
}

#[async_trait]
impl Verifier for CommandVerifier {
    async fn verify(&self, project_dir: &Path) -> Verdict {
        tracing::debug!(
            "Running `{}` in {} (timeout {:?})",
            self.command_line(),
            project_dir.display(),
            self.timeout
        );

        let deadline = Instant::now() + self.timeout;
        match self.execute(project_dir, Some(deadline)).await {
            Ok(Completion::Exited { status, .. }) if status.success() => Verdict::pass(),
            Ok(Completion::Exited {
                status,
                stdout,
                stderr,
            }) => Verdict::fail(self.failure_diagnostic(status, stdout, stderr)),
            Ok(Completion::TimedOut) => {
                tracing::warn!("`{}` timed out after {:?}", self.command_line(), self.timeout);
                Verdict::fail(timeout_message(self.timeout))
            }
            Err(e) => {
                tracing::warn!("{}", e);
                Verdict::fail(e.to_string())
            }
        }
    }

    async fn prepare(&self, project_dir: &Path) -> Result<()> {
        self.warm_up(project_dir).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, timeout: Duration) -> CommandVerifier {
        CommandVerifier::new("sh", vec!["-c".to_string(), script.to_string()], timeout)
    }

    #[tokio::test]
    async fn test_zero_exit_passes() {
        let dir = TempDir::new().unwrap();
        let verdict = sh("exit 0", Duration::from_secs(5)).verify(dir.path()).await;
        assert_eq!(verdict, Verdict::pass());
    }

    #[tokio::test]
    async fn test_non_zero_exit_captures_stderr() {
        let dir = TempDir::new().unwrap();
        let verdict = sh("echo 'error[E0425]: cannot find value' >&2; exit 101", Duration::from_secs(5))
            .verify(dir.path())
            .await;
        assert!(!verdict.passed);
        assert!(verdict.diagnostic.contains("error[E0425]"));
    }

    #[tokio::test]
    async fn test_silent_failure_reports_status() {
        let dir = TempDir::new().unwrap();
        let verdict = sh("exit 3", Duration::from_secs(5)).verify(dir.path()).await;
        assert!(!verdict.passed);
        assert!(verdict.diagnostic.contains("status 3"));
    }

    #[tokio::test]
    async fn test_runs_inside_project_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        let verdict = sh("test -f Cargo.toml", Duration::from_secs(5))
            .verify(dir.path())
            .await;
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn test_target_dir_is_exported() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("shared-target");
        let verifier = CommandVerifier::new(
            "sh",
            vec![
                "-c".to_string(),
                "test \"$CARGO_TARGET_DIR\" = \"$1\"".to_string(),
                "sh".to_string(),
                target.display().to_string(),
            ],
            Duration::from_secs(5),
        )
        .with_target_dir(&target);

        assert_eq!(verifier.target_dir(), Some(target.as_path()));
        assert_eq!(verifier.timeout(), Duration::from_secs(5));
        assert!(verifier.verify(dir.path()).await.passed);
    }

    #[tokio::test]
    async fn test_missing_program_fails_without_panicking() {
        let dir = TempDir::new().unwrap();
        let verifier = CommandVerifier::new("no-such-checker-binary", vec![], Duration::from_secs(5));
        let verdict = verifier.verify(dir.path()).await;
        assert!(!verdict.passed);
        assert!(verdict.diagnostic.contains("no-such-checker-binary"));
    }

    #[tokio::test]
    async fn test_timeout_kills_the_process() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 2; touch {}", marker.display());
        let timeout = Duration::from_millis(200);

        let verdict = sh(&script, timeout).verify(dir.path()).await;
        assert!(!verdict.passed);
        assert_eq!(verdict.diagnostic, timeout_message(timeout));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "timed-out process kept running");
    }

    #[tokio::test]
    async fn test_timeout_kills_background_children() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("(sleep 2; touch {}) & wait", marker.display());

        let verdict = sh(&script, Duration::from_millis(300)).verify(dir.path()).await;
        assert!(!verdict.passed);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists(), "background child outlived the timeout");
    }

    #[tokio::test]
    async fn test_output_held_open_by_background_child_is_bounded() {
        let dir = TempDir::new().unwrap();
        let timeout = Duration::from_secs(1);
        let started = std::time::Instant::now();

        let verdict = sh("sleep 6 & exit 1", timeout).verify(dir.path()).await;

        assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
        assert!(!verdict.passed);
        assert_eq!(verdict.diagnostic, timeout_message(timeout));
    }

    #[tokio::test]
    async fn test_warm_up_runs_without_deadline() {
        let dir = TempDir::new().unwrap();
        let verifier = sh("sleep 1", Duration::from_millis(100));
        assert!(verifier.warm_up(dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_warm_up_failures_are_verifier_errors() {
        let dir = TempDir::new().unwrap();

        let err = sh("echo 'error: could not compile' >&2; exit 101", Duration::from_secs(5))
            .warm_up(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::VerifierError { .. }));
        assert!(err.to_string().contains("could not compile"));

        let err = CommandVerifier::new("no-such-checker-binary", vec![], Duration::from_secs(5))
            .warm_up(dir.path())
            .await
            .unwrap_err();
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Verification);
        assert!(err.recovery_suggestion().contains("cargo"));
    }
}
