//! Process-level execution of vetted programs.
//!
//! [`IsolatedRunner`] is the only [`CodeExecutor`]. It spawns the Python
//! interpreter through a [`ProcessLauncher`] and bounds every run with a
//! wall-clock deadline.

mod isolated;
mod launcher;

pub use isolated::IsolatedRunner;
pub use launcher::{LaunchSpec, ProcessLauncher, TokioLauncher};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Exit status reported for programs refused by the isolation policy.
pub const REJECTED_EXIT_STATUS: i32 = 1;

/// Exit status reported when the deadline elapsed and the child was killed.
pub const TIMEOUT_EXIT_STATUS: i32 = -1;

/// Exit status reported when no child process could be started.
pub const SPAWN_FAILURE_EXIT_STATUS: i32 = -2;

/// Uniform outcome handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// True iff `exit_status` is zero.
    pub succeeded: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, or a diagnostic on every failure path.
    pub stderr: String,
    /// Process exit code or one of the sentinel statuses above.
    pub exit_status: i32,
}

impl ExecutionResult {
    fn failure(stderr: impl Into<String>, exit_status: i32) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_status,
        }
    }

    /// Returns true if the run was cut short by the deadline.
    pub fn timed_out(&self) -> bool {
        self.exit_status == TIMEOUT_EXIT_STATUS
    }
}

/// Terminal state of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Refused before any resource was allocated.
    Rejected(String),
    /// The child exited on its own.
    Completed {
        exit_status: i32,
        stdout: String,
        stderr: String,
    },
    /// The deadline elapsed and the child was killed.
    TimedOut(Duration),
    /// No child could be started.
    SpawnFailed(String),
}

impl From<Termination> for ExecutionResult {
    fn from(termination: Termination) -> Self {
        match termination {
            Termination::Rejected(reason) => Self::failure(reason, REJECTED_EXIT_STATUS),
            Termination::Completed {
                exit_status,
                stdout,
                stderr,
            } => Self {
                succeeded: exit_status == 0,
                stdout,
                stderr,
                exit_status,
            },
            Termination::TimedOut(timeout) => Self::failure(
                format!("Execution timeout after {} seconds", format_seconds(timeout)),
                TIMEOUT_EXIT_STATUS,
            ),
            Termination::SpawnFailed(message) => {
                Self::failure(message, SPAWN_FAILURE_EXIT_STATUS)
            }
        }
    }
}

/// Whole seconds print without a fractional part.
fn format_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        duration.as_secs_f64().to_string()
    }
}

/// Trait for components that run untrusted program fragments.
///
/// Implementations never fail: every problem is reported through the
/// returned [`ExecutionResult`].
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Runs the fragment and reports how it ended.
    async fn execute(&self, source: &str) -> ExecutionResult;

    /// Returns the name of this executor.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_maps_to_exit_status_one() {
        let result = ExecutionResult::from(Termination::Rejected("Forbidden import: os".into()));

        assert!(!result.succeeded);
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "Forbidden import: os");
        assert_eq!(result.exit_status, 1);
    }

    #[test]
    fn completed_succeeds_only_on_zero() {
        let ok = ExecutionResult::from(Termination::Completed {
            exit_status: 0,
            stdout: "hello\n".into(),
            stderr: String::new(),
        });
        assert!(ok.succeeded);
        assert_eq!(ok.stdout, "hello\n");

        let failed = ExecutionResult::from(Termination::Completed {
            exit_status: 3,
            stdout: "partial\n".into(),
            stderr: "boom".into(),
        });
        assert!(!failed.succeeded);
        assert_eq!(failed.stdout, "partial\n");
        assert_eq!(failed.exit_status, 3);
    }

    #[test]
    fn timed_out_discards_output_and_uses_sentinel() {
        let result = ExecutionResult::from(Termination::TimedOut(Duration::from_secs(30)));

        assert!(!result.succeeded);
        assert!(result.stdout.is_empty());
        assert_eq!(result.stderr, "Execution timeout after 30 seconds");
        assert_eq!(result.exit_status, TIMEOUT_EXIT_STATUS);
        assert!(result.timed_out());
    }

    #[test]
    fn fractional_timeout_is_reported() {
        let result = ExecutionResult::from(Termination::TimedOut(Duration::from_millis(1500)));
        assert_eq!(result.stderr, "Execution timeout after 1.5 seconds");
    }

    #[test]
    fn spawn_failure_uses_its_own_sentinel() {
        let result = ExecutionResult::from(Termination::SpawnFailed("no python".into()));

        assert!(!result.succeeded);
        assert_eq!(result.exit_status, SPAWN_FAILURE_EXIT_STATUS);
        assert_ne!(result.exit_status, TIMEOUT_EXIT_STATUS);
        assert!(!result.timed_out());
    }

    #[test]
    fn execution_result_serializes_to_snake_case_json() {
        let result = ExecutionResult::from(Termination::Rejected("Syntax error: x".into()));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["succeeded"], false);
        assert_eq!(json["stderr"], "Syntax error: x");
        assert_eq!(json["exit_status"], 1);
    }
}
