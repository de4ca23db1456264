//! Merge error types.
//!
//! Defines [`MergeError`], the unified error type for the merge engine.
//! Each variant is self-contained: the message says what went wrong and,
//! where the caller can do something about it, how to fix it. Failures
//! abort the in-progress merge; the engine performs no recovery.

use std::fmt;

use crate::model::pipeline::UndeclaredType;

// ---------------------------------------------------------------------------
// MergeError
// ---------------------------------------------------------------------------

/// Unified error type for pipeline merge operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeError {
    /// A pre-merge validation check rejected an input pipeline.
    InvalidPipeline {
        /// Which input failed.
        side: Side,
        /// Every resource whose type is not declared.
        undeclared: Vec<UndeclaredType>,
    },

    /// A task step the rewriter cannot inspect.
    UnsupportedTask {
        /// The task's display name.
        task: String,
        /// What makes it uninspectable.
        detail: String,
    },

    /// Deep-mode job fusion found incompatible jobs sharing a name.
    DeepMergeConflict {
        /// The contested job name.
        job: String,
        /// Why the two plans could not be fused.
        reason: FuseConflict,
    },

    /// The rewriter was handed a map that does not cover a referenced name.
    ///
    /// Indicates a driver bug: the rewrite maps produced by the merge phases
    /// must cover every name the next phase can encounter.
    MissingRewriteKey {
        /// The name with no rewrite entry.
        name: String,
    },
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which of the two merge inputs an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

// ---------------------------------------------------------------------------
// FuseConflict
// ---------------------------------------------------------------------------

/// Why two same-named jobs could not be fused in deep mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FuseConflict {
    /// The plans have different lengths.
    PlanLength { left: usize, right: usize },
    /// The steps at one plan index are neither identical nor both parallel.
    StepMismatch { index: usize },
    /// A lifecycle hook differs between the two jobs.
    HookMismatch { hook: &'static str },
}

impl fmt::Display for FuseConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlanLength { left, right } => {
                write!(f, "plans differ in length ({left} vs {right} steps)")
            }
            Self::StepMismatch { index } => {
                write!(
                    f,
                    "steps at plan index {index} are neither identical nor both in_parallel"
                )
            }
            Self::HookMismatch { hook } => write!(f, "'{hook}' hooks differ"),
        }
    }
}

// ---------------------------------------------------------------------------
// Display — actionable error messages
// ---------------------------------------------------------------------------

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPipeline { side, undeclared } => {
                write!(
                    f,
                    "the {side} pipeline is not valid ({} problem(s)):",
                    undeclared.len()
                )?;
                for u in undeclared {
                    write!(f, "\n  - {u}")?;
                }
                write!(
                    f,
                    "\n  To fix: declare the missing resource types or correct each resource's 'type' field."
                )
            }
            Self::UnsupportedTask { task, detail } => {
                write!(
                    f,
                    "task '{task}' cannot be merged: {detail}\n  To fix: inline the task configuration under 'config'; external task files are not supported."
                )
            }
            Self::DeepMergeConflict { job, reason } => {
                write!(
                    f,
                    "cannot deep-merge job '{job}': {reason}\n  To fix: align the two definitions of '{job}', or merge without --deep to keep both jobs under distinct names."
                )
            }
            Self::MissingRewriteKey { name } => {
                write!(
                    f,
                    "no rewrite entry for name '{name}'.\n  This is a bug in the merge driver — the rewrite map must cover every referenced name. Please report it."
                )
            }
        }
    }
}

impl std::error::Error for MergeError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
