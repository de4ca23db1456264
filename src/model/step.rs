//! The step sum type — the recursive building block of job plans.
//!
//! A step is one of five kinds, selected in YAML by the presence of its
//! discriminator key (`get` / `put` / `task` / `do` / `in_parallel`). The
//! enum is `#[serde(untagged)]`: each variant's struct has exactly one
//! required field named after its discriminator, so decoding is unambiguous.
//!
//! `in_parallel` accepts two spellings: the long form (a mapping with
//! `steps`, `limit`, `fail_fast`) and the short form (a bare sequence of
//! steps). The short form is coerced to the long form on ingest and never
//! written back out.
//!
//! Get and Put steps reference a resource through a *handle*: the value of
//! `get:`/`put:` names the artifact inside the job, while the optional
//! `resource:` field names the pipeline [`Resource`](super::Resource) it
//! binds to. When `resource:` is absent the handle doubles as the resource
//! name ([`GetStep::effective_resource`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::task::{ContainerLimits, TaskConfig};

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// A single step in a job plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Fetch a version of a resource.
    Get(GetStep),
    /// Push to a resource.
    Put(PutStep),
    /// Run a one-off build in a container.
    Task(TaskStep),
    /// Run steps serially.
    Do(DoStep),
    /// Run steps concurrently.
    InParallel(ParallelStep),
}

// ---------------------------------------------------------------------------
// GetStep
// ---------------------------------------------------------------------------

fn default_version() -> String {
    "latest".to_owned()
}

/// `get:` — fetch a version of a resource under a handle.
///
/// Equality compares the *effective* resource binding, so `get: a` and
/// `get: a, resource: a` are the same step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetStep {
    /// Handle the fetched artifact is available under.
    pub get: String,
    /// Resource to fetch; defaults to the handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Upstream jobs whose passage gates this version.
    #[serde(default)]
    pub passed: Vec<String>,
    /// Opaque parameters for the plugin's `in` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_yaml::Value>,
    /// Trigger new builds when a version appears.
    #[serde(default)]
    pub trigger: bool,
    /// Which version to fetch.
    #[serde(default = "default_version")]
    pub version: String,
}

impl GetStep {
    /// A get step whose handle doubles as the resource name.
    pub fn new(get: impl Into<String>) -> Self {
        Self {
            get: get.into(),
            resource: None,
            passed: Vec::new(),
            params: None,
            trigger: false,
            version: default_version(),
        }
    }

    /// A get step with an explicit resource binding.
    pub fn aliased(get: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Self::new(get)
        }
    }

    /// The resource this step binds to: `resource` if set, else the handle.
    #[must_use]
    pub fn effective_resource(&self) -> &str {
        self.resource.as_deref().unwrap_or(&self.get)
    }
}

impl PartialEq for GetStep {
    fn eq(&self, other: &Self) -> bool {
        self.get == other.get
            && self.effective_resource() == other.effective_resource()
            && self.passed == other.passed
            && self.params == other.params
            && self.trigger == other.trigger
            && self.version == other.version
    }
}

// ---------------------------------------------------------------------------
// PutStep
// ---------------------------------------------------------------------------

fn default_put_inputs() -> String {
    "all".to_owned()
}

/// `put:` — push to a resource under a handle.
///
/// Equality compares the *effective* resource binding, like [`GetStep`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PutStep {
    /// Handle naming the push (and the implicit re-fetch).
    pub put: String,
    /// Resource to push to; defaults to the handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Which artifacts are made available to the plugin.
    #[serde(default = "default_put_inputs")]
    pub inputs: String,
    /// Opaque parameters for the plugin's `out` operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_yaml::Value>,
    /// Opaque parameters for the implicit get that follows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_params: Option<serde_yaml::Value>,
}

impl PutStep {
    /// A put step whose handle doubles as the resource name.
    pub fn new(put: impl Into<String>) -> Self {
        Self {
            put: put.into(),
            resource: None,
            inputs: default_put_inputs(),
            params: None,
            get_params: None,
        }
    }

    /// A put step with an explicit resource binding.
    pub fn aliased(put: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Self::new(put)
        }
    }

    /// The resource this step binds to: `resource` if set, else the handle.
    #[must_use]
    pub fn effective_resource(&self) -> &str {
        self.resource.as_deref().unwrap_or(&self.put)
    }
}

impl PartialEq for PutStep {
    fn eq(&self, other: &Self) -> bool {
        self.put == other.put
            && self.effective_resource() == other.effective_resource()
            && self.inputs == other.inputs
            && self.params == other.params
            && self.get_params == other.get_params
    }
}

// ---------------------------------------------------------------------------
// TaskStep
// ---------------------------------------------------------------------------

/// `task:` — run a one-off build.
///
/// The configuration is either inline (`config`) or external (`file`). The
/// merge engine only supports inline configs: an external file cannot be
/// inspected for handles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskStep {
    /// Display name of the task.
    pub task: String,
    /// Inline task configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TaskConfig>,
    /// Path to an external task config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Artifact providing the task image, overriding `image_resource`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub privileged: bool,
    /// Template variables for an external config file.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_limits: Option<ContainerLimits>,
    /// Environment parameters overriding the config's.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Artifact name substitutions for the config's inputs.
    #[serde(default)]
    pub input_mapping: BTreeMap<String, String>,
    /// Artifact name substitutions for the config's outputs.
    #[serde(default)]
    pub output_mapping: BTreeMap<String, String>,
}

impl TaskStep {
    /// A task step with no configuration attached.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            config: None,
            file: None,
            image: None,
            privileged: false,
            vars: BTreeMap::new(),
            container_limits: None,
            params: BTreeMap::new(),
            input_mapping: BTreeMap::new(),
            output_mapping: BTreeMap::new(),
        }
    }

    /// A task step with an inline config.
    pub fn with_config(task: impl Into<String>, config: TaskConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::new(task)
        }
    }
}

// ---------------------------------------------------------------------------
// DoStep
// ---------------------------------------------------------------------------

/// `do:` — run a sequence of steps serially.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoStep {
    pub r#do: Vec<Step>,
}

impl DoStep {
    pub fn of(steps: Vec<Step>) -> Self {
        Self { r#do: steps }
    }
}

// ---------------------------------------------------------------------------
// ParallelStep
// ---------------------------------------------------------------------------

/// `in_parallel:` — run steps concurrently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParallelStep {
    pub in_parallel: ParallelConfig,
}

impl ParallelStep {
    /// A parallel step over the given branches, long form, no limit.
    pub fn of(steps: Vec<Step>) -> Self {
        Self {
            in_parallel: ParallelConfig {
                steps,
                limit: None,
                fail_fast: false,
            },
        }
    }
}

/// The long form of `in_parallel`. The short form (a bare step sequence)
/// is coerced here on deserialization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParallelForm")]
pub struct ParallelConfig {
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Cap on concurrently running branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Fail the whole step as soon as one branch fails.
    #[serde(default)]
    pub fail_fast: bool,
}

/// The two accepted spellings of `in_parallel`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ParallelForm {
    Short(Vec<Step>),
    Long {
        #[serde(default)]
        steps: Vec<Step>,
        #[serde(default)]
        limit: Option<u64>,
        #[serde(default)]
        fail_fast: bool,
    },
}

impl From<ParallelForm> for ParallelConfig {
    fn from(form: ParallelForm) -> Self {
        match form {
            ParallelForm::Short(steps) => Self {
                steps,
                limit: None,
                fail_fast: false,
            },
            ParallelForm::Long {
                steps,
                limit,
                fail_fast,
            } => Self {
                steps,
                limit,
                fail_fast,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Command;

    #[test]
    fn decodes_by_discriminator_key() {
        let get: Step = serde_yaml::from_str("get: a\n").unwrap();
        assert!(matches!(get, Step::Get(_)));

        let put: Step = serde_yaml::from_str("put: a\n").unwrap();
        assert!(matches!(put, Step::Put(_)));

        let task: Step = serde_yaml::from_str("task: a\n").unwrap();
        assert!(matches!(task, Step::Task(_)));

        let do_: Step = serde_yaml::from_str("do:\n- get: a\n").unwrap();
        assert!(matches!(do_, Step::Do(_)));

        let par: Step = serde_yaml::from_str("in_parallel:\n  steps:\n  - get: a\n").unwrap();
        assert!(matches!(par, Step::InParallel(_)));
    }

    #[test]
    fn get_defaults() {
        let step: GetStep = serde_yaml::from_str("get: a\n").unwrap();
        assert_eq!(step.effective_resource(), "a");
        assert!(!step.trigger);
        assert_eq!(step.version, "latest");
        assert!(step.passed.is_empty());
    }

    #[test]
    fn get_explicit_resource_wins() {
        let step = GetStep::aliased("a", "b");
        assert_eq!(step.effective_resource(), "b");
    }

    #[test]
    fn implicit_and_explicit_self_binding_are_equal() {
        assert_eq!(GetStep::new("a"), GetStep::aliased("a", "a"));
        assert_ne!(GetStep::new("a"), GetStep::aliased("a", "b"));
        assert_eq!(PutStep::new("a"), PutStep::aliased("a", "a"));
        assert_ne!(PutStep::new("a"), PutStep::new("b"));
    }

    #[test]
    fn get_full_round_trip() {
        let yaml = "\
get: a
resource: b
passed:
- d
params:
  e: f
trigger: true
version: g
";
        let step: GetStep = serde_yaml::from_str(yaml).unwrap();
        let back: GetStep = serde_yaml::from_str(&serde_yaml::to_string(&step).unwrap()).unwrap();
        assert_eq!(step, back);
    }

    #[test]
    fn put_defaults() {
        let step: PutStep = serde_yaml::from_str("put: a\n").unwrap();
        assert_eq!(step.inputs, "all");
        assert_eq!(step.effective_resource(), "a");
    }

    #[test]
    fn in_parallel_short_form_coerces_to_long() {
        let short: Step = serde_yaml::from_str("in_parallel:\n- get: a\n").unwrap();
        let long: Step =
            serde_yaml::from_str("in_parallel:\n  steps:\n  - get: a\n  fail_fast: false\n")
                .unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn in_parallel_serializes_long_form() {
        let step = Step::InParallel(ParallelStep::of(vec![Step::Get(GetStep::new("a"))]));
        let yaml = serde_yaml::to_string(&step).unwrap();
        assert!(yaml.contains("steps:"), "expected long form, got:\n{yaml}");

        let back: Step = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(step, back);
    }

    #[test]
    fn in_parallel_long_form_keeps_limit() {
        let step: ParallelStep =
            serde_yaml::from_str("in_parallel:\n  steps:\n  - get: a\n  limit: 1\n  fail_fast: true\n")
                .unwrap();
        assert_eq!(step.in_parallel.limit, Some(1));
        assert!(step.in_parallel.fail_fast);
    }

    #[test]
    fn do_nests_recursively() {
        let step: Step = serde_yaml::from_str(
            "do:\n- get: a\n- do:\n  - put: b\n",
        )
        .unwrap();
        let Step::Do(outer) = step else {
            panic!("expected do step");
        };
        assert_eq!(outer.r#do.len(), 2);
        assert!(matches!(outer.r#do[1], Step::Do(_)));
    }

    #[test]
    fn task_round_trip_with_config() {
        let task = TaskStep::with_config("build", TaskConfig::new("linux", Command::new("sh")));
        let step = Step::Task(task);
        let yaml = serde_yaml::to_string(&step).unwrap();
        let back: Step = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(step, back);
    }
}
