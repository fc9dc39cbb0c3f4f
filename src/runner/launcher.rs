//! Spawn primitive used by the runner.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

/// Everything needed to start one interpreter process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Interpreter binary, resolved through `PATH` when not absolute.
    pub interpreter: String,
    /// Generated script passed as the sole argument.
    pub script: PathBuf,
    /// Working directory of the child.
    pub working_dir: PathBuf,
}

/// Starts interpreter processes.
///
/// The runner owns waiting, deadlines and killing; a launcher only spawns.
pub trait ProcessLauncher: Send + Sync {
    /// Spawns the process described by `spec`.
    fn launch(&self, spec: &LaunchSpec) -> std::io::Result<Child>;
}

/// Launcher backed by [`tokio::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl TokioLauncher {
    /// Builds the command without spawning it.
    fn command(&self, spec: &LaunchSpec) -> Command {
        let mut command = Command::new(&spec.interpreter);
        command
            .arg(&spec.script)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl ProcessLauncher for TokioLauncher {
    fn launch(&self, spec: &LaunchSpec) -> std::io::Result<Child> {
        tracing::debug!(
            interpreter = %spec.interpreter,
            script = ?spec.script,
            working_dir = ?spec.working_dir,
            "spawning interpreter"
        );

        self.command(spec).spawn()
    }
}
