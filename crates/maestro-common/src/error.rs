//! Unified error types for the Maestro workspace.
//!
//! Every fatal condition of loading, resolving, and orchestrating a
//! deployment document is a variant of [`MaestroError`]. Merge conflicts are
//! not errors; see [`MergeWarning`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{RunPhase, TaskPhase};

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum MaestroError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A document could not be parsed or one of its imports could not be loaded.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Document being loaded when the failure happened.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// An entity refers to a key that does not exist.
    #[error("{kind} '{key}' not found (referenced by {referrer})")]
    Reference {
        /// Kind of the missing entity.
        kind: &'static str,
        /// The dangling key.
        key: String,
        /// Entity holding the reference.
        referrer: String,
    },

    /// A job could not be placed on any instance.
    #[error("job '{job}': {reason}")]
    Match {
        /// Job that failed to match.
        job: String,
        /// Why no placement was possible.
        reason: MatchFailure,
    },

    /// An exposed-port specification is malformed.
    #[error("bad port list for job '{job}': '{spec}': {message}")]
    PortSpec {
        /// Job the port list belongs to.
        job: String,
        /// The offending entry.
        spec: String,
        /// Description of the syntax problem.
        message: String,
    },

    /// A task failed while being validated or run.
    #[error("task {index} ({description}) failed during {phase}: {source}")]
    Task {
        /// Phase in which the task failed.
        phase: TaskPhase,
        /// Position of the task in the plan.
        index: usize,
        /// Task description.
        description: String,
        /// Error reported by the provisioner.
        source: TaskError,
    },

    /// An orchestration step was invoked in the wrong phase.
    #[error("cannot {operation} while {phase}")]
    Lifecycle {
        /// The attempted operation.
        operation: &'static str,
        /// Phase the orchestrator was in.
        phase: RunPhase,
    },
}

/// Reason a job could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchFailure {
    /// The document declares no instances at all.
    NoInstances,
    /// No instance offers every label the job requires.
    NoMatchingInstance,
    /// Matching produced no container instances.
    NoContainerInstances,
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInstances => write!(f, "no instances specified in document"),
            Self::NoMatchingInstance => write!(f, "no instance satisfies the label selector"),
            Self::NoContainerInstances => write!(f, "no container instances created"),
        }
    }
}

/// Failure reported by a provisioner for a single task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TaskError {
    /// Provisioner-supplied description.
    pub message: String,
}

impl TaskError {
    /// Creates a task error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Non-fatal notice that a merge overwrote an existing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeWarning {
    /// Document section holding the key (`vars`, `jobs`, ...).
    pub section: &'static str,
    /// The overwritten key.
    pub key: String,
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] overridden by import", self.section, self.key)
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MaestroError>;
