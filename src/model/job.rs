//! Jobs — named plans plus scheduling metadata and lifecycle hooks.

use serde::{Deserialize, Serialize};

use super::step::Step;

// ---------------------------------------------------------------------------
// BuildLogRetention
// ---------------------------------------------------------------------------

/// How many build logs the job keeps around.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLogRetention {
    pub days: u32,
    pub builds: u32,
    pub minimum_succeeded_builds: u32,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A job: an ordered plan of steps plus scheduling metadata.
///
/// Semantic equality ([`Job::semantic_eq`]) compares the plan and the
/// scheduling metadata but ignores `name` and the five lifecycle hooks:
/// two jobs that do the same work under different names (or with different
/// cleanup hooks) are the same job for merge purposes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    /// Steps executed in order when the job runs.
    pub plan: Vec<Step>,
    /// Previous name, preserving build history across a rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    /// Only one build at a time.
    #[serde(default)]
    pub serial: bool,
    /// Serial groups this job shares a lock with.
    #[serde(default)]
    pub serial_groups: Vec<String>,
    /// Cap on concurrent builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_log_retention: Option<BuildLogRetention>,
    /// Make build logs publicly viewable.
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub disable_manual_trigger: bool,
    /// Allow the job to run while the pipeline is paused.
    #[serde(default)]
    pub interruptible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_abort: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure: Option<Step>,
}

impl Job {
    /// A job with the given name and plan, everything else defaulted.
    pub fn new(name: impl Into<String>, plan: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            plan,
            old_name: None,
            serial: false,
            serial_groups: Vec::new(),
            max_in_flight: None,
            build_log_retention: None,
            public: false,
            disable_manual_trigger: false,
            interruptible: false,
            on_success: None,
            on_failure: None,
            on_error: None,
            on_abort: None,
            ensure: None,
        }
    }

    /// Plan and metadata equality, ignoring `name` and hook bodies.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        self.plan == other.plan
            && self.old_name == other.old_name
            && self.serial == other.serial
            && self.serial_groups == other.serial_groups
            && self.max_in_flight == other.max_in_flight
            && self.build_log_retention == other.build_log_retention
            && self.public == other.public
            && self.disable_manual_trigger == other.disable_manual_trigger
            && self.interruptible == other.interruptible
    }

    /// Semantic equality plus the same `name`.
    #[must_use]
    pub fn exact_eq(&self, other: &Self) -> bool {
        self.name == other.name && self.semantic_eq(other)
    }

    /// The five lifecycle hooks in declaration order, with their YAML keys.
    #[must_use]
    pub fn hooks(&self) -> [(&'static str, Option<&Step>); 5] {
        [
            ("on_success", self.on_success.as_ref()),
            ("on_failure", self.on_failure.as_ref()),
            ("on_error", self.on_error.as_ref()),
            ("on_abort", self.on_abort.as_ref()),
            ("ensure", self.ensure.as_ref()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
