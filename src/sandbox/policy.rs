//! Isolation policy trait and verdict types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a candidate program was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The source did not parse.
    Syntax(String),
    /// The source imports a module whose name matches the denylist.
    ForbiddenImport(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Syntax(message) => write!(f, "Syntax error: {}", message),
            Rejection::ForbiddenImport(module) => write!(f, "Forbidden import: {}", module),
        }
    }
}

/// Outcome of checking one candidate program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Whether the program may be executed.
    pub accepted: bool,
    /// Human-readable reason when rejected.
    pub reason: Option<String>,
}

impl ValidationVerdict {
    /// Creates an accepting verdict.
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    /// Creates a rejecting verdict with the given reason.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}

impl From<Result<(), Rejection>> for ValidationVerdict {
    fn from(outcome: Result<(), Rejection>) -> Self {
        match outcome {
            Ok(()) => Self::accept(),
            Err(rejection) => Self::reject(rejection.to_string()),
        }
    }
}

/// Strategy deciding whether a program may run.
///
/// [`super::Validator`] is the only implementation today. A stronger policy
/// (separate user, restricted filesystem view, network rules) plugs in here.
pub trait IsolationPolicy: Send + Sync {
    /// Checks the source. Must be free of side effects.
    fn check(&self, source: &str) -> ValidationVerdict;

    /// Returns the name of this policy.
    fn name(&self) -> &str;
}
