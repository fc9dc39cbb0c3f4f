//! Static vetting and program preparation.
//!
//! This module provides the [`IsolationPolicy`] trait with its denylist
//! implementation [`Validator`], the program wrapper, and the scoped
//! [`ScriptArtifact`] the runner executes.

mod artifact;
mod policy;
pub mod program;
mod validator;

pub use artifact::ScriptArtifact;
pub use policy::{IsolationPolicy, Rejection, ValidationVerdict};
pub use validator::{Validator, DENYLIST};
