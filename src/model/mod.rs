//! Concourse pipeline data model — entities, steps, and the pipeline root.

pub mod job;
pub mod pipeline;
pub mod resource;
pub mod step;
pub mod task;

pub use job::{BuildLogRetention, Job};
pub use pipeline::{Pipeline, UndeclaredType};
pub use resource::{AnonymousResource, ConfigMap, Resource, ResourceType};
pub use step::{DoStep, GetStep, ParallelConfig, ParallelStep, PutStep, Step, TaskStep};
pub use task::{Command, ContainerLimits, TaskCache, TaskConfig, TaskInput, TaskOutput};
