//! Code Sandbox - best-effort execution of model-generated Python fragments
//!
//! A fragment is vetted by a static import denylist, wrapped in an async
//! entry point, written to a scoped temporary file and run by a separate
//! interpreter process under a wall-clock deadline. Every outcome, including
//! rejection, crash, timeout and spawn failure, comes back as one
//! [`ExecutionResult`].
//!
//! This is not a security boundary: there is no namespace, container or
//! syscall isolation. See [`sandbox::Validator`] for what the filter misses.

pub mod config;
pub mod error;
pub mod fence;
pub mod runner;
pub mod sandbox;

pub use config::{SandboxConfig, Validate, ValidationResult};
pub use error::Error;
pub use fence::strip_code_fence;
pub use runner::{
    CodeExecutor, ExecutionResult, IsolatedRunner, LaunchSpec, ProcessLauncher, Termination,
    TokioLauncher, REJECTED_EXIT_STATUS, SPAWN_FAILURE_EXIT_STATUS, TIMEOUT_EXIT_STATUS,
};
pub use sandbox::{IsolationPolicy, Rejection, ScriptArtifact, ValidationVerdict, Validator};
