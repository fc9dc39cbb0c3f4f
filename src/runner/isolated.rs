//! Deadline-bounded execution in a child interpreter.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use uuid::Uuid;

use crate::config::{SandboxConfig, DEFAULT_PYTHON};
use crate::error::{Error, Result};
use crate::sandbox::{program, IsolationPolicy, ScriptArtifact, Validator};

use super::{
    CodeExecutor, ExecutionResult, LaunchSpec, ProcessLauncher, Termination, TokioLauncher,
};

/// Reported when a child ends without an exit code or signal.
const UNKNOWN_EXIT_STATUS: i32 = 1;

/// Runs vetted fragments in a separate interpreter process.
///
/// Every call owns its own script file and child, so a runner can be shared
/// by concurrent callers without locking. The deadline is fixed at
/// construction and applies to each call independently.
///
/// On timeout only the direct child is killed. Processes the fragment spawns
/// itself are not tracked and may outlive the deadline.
pub struct IsolatedRunner {
    timeout: Duration,
    interpreter: String,
    scratch_dir: Option<PathBuf>,
    policy: Box<dyn IsolationPolicy>,
    launcher: Box<dyn ProcessLauncher>,
}

impl IsolatedRunner {
    /// Creates a runner with the given deadline, the default interpreter and
    /// the import denylist.
    pub fn new(timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }

        Ok(Self {
            timeout,
            interpreter: DEFAULT_PYTHON.to_string(),
            scratch_dir: None,
            policy: Box::new(Validator::new()),
            launcher: Box::new(TokioLauncher),
        })
    }

    /// Creates a runner from a validated configuration.
    pub fn from_config(config: &SandboxConfig) -> Result<Self> {
        for warning in config.validated()? {
            tracing::warn!(warning = %warning, "sandbox configuration warning");
        }

        let mut runner = Self::new(config.timeout())?.with_interpreter(config.python.clone());
        runner.scratch_dir = config.scratch_dir.clone();
        Ok(runner)
    }

    /// Sets the interpreter binary.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Sets the directory that receives generated scripts.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Replaces the isolation policy.
    pub fn with_policy(mut self, policy: impl IsolationPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Replaces the spawn primitive.
    pub fn with_launcher(mut self, launcher: impl ProcessLauncher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Returns the per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the interpreter binary.
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Vets and runs a fragment. Never fails; see [`ExecutionResult`].
    pub async fn execute(&self, source: &str) -> ExecutionResult {
        let execution_id = Uuid::new_v4();
        let start_time = Instant::now();

        let termination = self.run(execution_id, source).await;

        let result = ExecutionResult::from(termination);
        tracing::info!(
            execution_id = %execution_id,
            succeeded = result.succeeded,
            exit_status = result.exit_status,
            duration = ?start_time.elapsed(),
            "execution finished"
        );
        result
    }

    async fn run(&self, execution_id: Uuid, source: &str) -> Termination {
        let verdict = self.policy.check(source);
        if !verdict.accepted {
            let reason = verdict
                .reason
                .unwrap_or_else(|| format!("rejected by {} policy", self.policy.name()));
            tracing::info!(
                execution_id = %execution_id,
                policy = self.policy.name(),
                reason = %reason,
                "program rejected before execution"
            );
            return Termination::Rejected(reason);
        }

        match self.run_validated(execution_id, source).await {
            Ok(termination) => termination,
            Err(e) => {
                tracing::error!(
                    execution_id = %execution_id,
                    interpreter = %self.interpreter,
                    error = %e,
                    "failed to start program"
                );
                Termination::SpawnFailed(e.to_string())
            }
        }
    }

    async fn run_validated(&self, execution_id: Uuid, source: &str) -> Result<Termination> {
        let working_dir = std::env::current_dir().map_err(Error::WorkingDir)?;
        let program = program::synthesize(source, &working_dir);

        let scratch_dir = self
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let artifact = ScriptArtifact::create(&scratch_dir, &program)?;

        let spec = LaunchSpec {
            interpreter: self.interpreter.clone(),
            script: artifact.path().to_path_buf(),
            working_dir,
        };

        tracing::debug!(
            execution_id = %execution_id,
            artifact = ?spec.script,
            timeout_secs = self.timeout.as_secs_f64(),
            "running program"
        );

        let termination = self.supervise(execution_id, &spec).await;
        artifact.release();
        termination
    }

    /// Spawns the child and waits for exit or deadline.
    async fn supervise(&self, execution_id: Uuid, spec: &LaunchSpec) -> Result<Termination> {
        let mut child = self.launcher.launch(spec).map_err(|source| Error::Spawn {
            interpreter: spec.interpreter.clone(),
            source,
        })?;

        let waited = tokio::time::timeout(self.timeout, collect_output(&mut child)).await;

        match waited {
            Ok(output) => {
                let (status, stdout, stderr) = output?;
                Ok(Termination::Completed {
                    exit_status: exit_code(status),
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                })
            }
            Err(_) => {
                tracing::warn!(
                    execution_id = %execution_id,
                    pid = ?child.id(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "deadline elapsed, killing child"
                );

                // kill() sends SIGKILL and reaps the child.
                if let Err(e) = child.kill().await {
                    tracing::warn!(
                        execution_id = %execution_id,
                        error = %e,
                        "failed to kill timed out child"
                    );
                }

                Ok(Termination::TimedOut(self.timeout))
            }
        }
    }
}

#[async_trait]
impl CodeExecutor for IsolatedRunner {
    async fn execute(&self, source: &str) -> ExecutionResult {
        IsolatedRunner::execute(self, source).await
    }

    fn name(&self) -> &str {
        "isolated-process"
    }
}

/// Drains both pipes while waiting, so a chatty child cannot block on a full
/// pipe.
async fn collect_output(child: &mut Child) -> Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let (status, stdout_read, stderr_read) = tokio::join!(
        child.wait(),
        read_pipe(stdout_pipe, &mut stdout),
        read_pipe(stderr_pipe, &mut stderr),
    );

    let status = status.map_err(Error::Wait)?;
    stdout_read.map_err(Error::Wait)?;
    stderr_read.map_err(Error::Wait)?;

    Ok((status, stdout, stderr))
}

async fn read_pipe<R>(pipe: Option<R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

/// Signal deaths map to the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    UNKNOWN_EXIT_STATUS
}
