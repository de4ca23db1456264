//! Handle analysis — enumerate the artifact names a job's plan uses.
//!
//! A *handle* is the name a step gives the artifact it works with: the
//! value of `get:`/`put:`, or a task config's input/output names. Get and
//! put handles bind to a pipeline resource (the effective resource); task
//! handles are local to the job and bind to nothing.
//!
//! Deep job fusion uses this inventory to detect handle collisions between
//! the two plans being fused: the same handle name bound to different
//! resources must be renamed on one side before the branches can coexist
//! in one job.

use crate::error::MergeError;
use crate::model::{Job, Step};

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// One handle a plan uses, with the resource it binds to (`None` for
/// job-local task handles).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handle {
    pub name: String,
    pub resource: Option<String>,
}

impl Handle {
    fn bound(name: &str, resource: &str) -> Self {
        Self {
            name: name.to_owned(),
            resource: Some(resource.to_owned()),
        }
    }

    fn local(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            resource: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// The handles a step subtree uses, in plan order.
///
/// A task without an inline config cannot be inventoried and is rejected
/// with [`MergeError::UnsupportedTask`].
pub fn step_handles(step: &Step) -> Result<Vec<Handle>, MergeError> {
    match step {
        Step::Get(get) => Ok(vec![Handle::bound(&get.get, get.effective_resource())]),
        Step::Put(put) => Ok(vec![Handle::bound(&put.put, put.effective_resource())]),
        Step::Task(task) => {
            let Some(config) = &task.config else {
                return Err(MergeError::UnsupportedTask {
                    task: task.task.clone(),
                    detail: "has no inline config".to_owned(),
                });
            };
            let mut handles: Vec<Handle> = config
                .inputs
                .iter()
                .map(|input| Handle::local(&input.name))
                .collect();
            handles.extend(config.outputs.iter().map(|output| Handle::local(&output.name)));
            Ok(handles)
        }
        Step::Do(do_) => collect(&do_.r#do),
        Step::InParallel(par) => collect(&par.in_parallel.steps),
    }
}

/// The handles a whole job uses: its plan's handles concatenated in order.
pub fn job_handles(job: &Job) -> Result<Vec<Handle>, MergeError> {
    collect(&job.plan)
}

fn collect(steps: &[Step]) -> Result<Vec<Handle>, MergeError> {
    let mut handles = Vec::new();
    for step in steps {
        handles.extend(step_handles(step)?);
    }
    Ok(handles)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
