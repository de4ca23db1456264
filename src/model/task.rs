//! Inline task configuration — the executable payload of a task step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::resource::AnonymousResource;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// The command a task runs inside its container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Path to the executable.
    pub path: String,
    /// Arguments passed to the executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory, relative to the build root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// User to run as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Command {
    /// A command with the given path and no arguments.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            dir: None,
            user: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs / outputs / caches
// ---------------------------------------------------------------------------

/// An artifact the task consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl TaskInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            optional: false,
        }
    }
}

/// An artifact the task produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl TaskOutput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }
}

/// A directory cached between runs of the task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskCache {
    pub path: String,
}

/// CPU and memory limits for the task's container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLimits {
    pub cpu: u64,
    pub memory: u64,
}

// ---------------------------------------------------------------------------
// TaskConfig
// ---------------------------------------------------------------------------

/// Inline task configuration.
///
/// The merge engine treats this as a value: it never rewrites task
/// input/output names during resource renames (task handles are local to
/// the job, not pipeline resources).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Platform the task runs on (e.g. `linux`).
    pub platform: String,
    /// The command to run.
    pub run: Command,
    /// Image the task container is built from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_resource: Option<AnonymousResource>,
    #[serde(default)]
    pub inputs: Vec<TaskInput>,
    #[serde(default)]
    pub outputs: Vec<TaskOutput>,
    #[serde(default)]
    pub caches: Vec<TaskCache>,
    /// Environment parameters for the run command.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rootfs_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_limits: Option<ContainerLimits>,
}

impl TaskConfig {
    /// A config with the given platform and run command, everything else
    /// defaulted.
    pub fn new(platform: impl Into<String>, run: Command) -> Self {
        Self {
            platform: platform.into(),
            run,
            image_resource: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            caches: Vec::new(),
            params: BTreeMap::new(),
            rootfs_uri: None,
            container_limits: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
