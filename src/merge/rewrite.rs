//! Reference rewriting — apply a `name → name` map to everything that
//! references a renamed entity, producing fresh values.
//!
//! Resources reference resource types through their `type` field; get/put
//! steps reference resources through their *effective resource* (the
//! explicit `resource:` field, or the handle when absent). Rewriting pins
//! the binding to the mapped name while leaving the user-facing handle
//! untouched, so a job keeps its artifact names after a merge renames the
//! resources underneath it.
//!
//! Task steps are not affected by resource renames: their input/output
//! names are job-local artifacts, not pipeline resources. A task is still
//! rejected when it cannot be inspected at all (no inline config, or an
//! external config file).
//!
//! Every function returns a new value; inputs are never mutated. A name
//! missing from the map is a driver bug and surfaces as
//! [`MergeError::MissingRewriteKey`].

use crate::error::MergeError;
use crate::model::{
    DoStep, GetStep, Job, ParallelConfig, ParallelStep, PutStep, Resource, ResourceType, Step,
};

use super::unique::RewriteMap;

fn lookup(map: &RewriteMap, name: &str) -> Result<String, MergeError> {
    map.get(name).cloned().ok_or_else(|| MergeError::MissingRewriteKey {
        name: name.to_owned(),
    })
}

/// A copy of `rt` with its plugin reference substituted through `map`.
pub fn rewrite_resource_type(
    rt: &ResourceType,
    map: &RewriteMap,
) -> Result<ResourceType, MergeError> {
    Ok(ResourceType {
        r#type: lookup(map, &rt.r#type)?,
        ..rt.clone()
    })
}

/// A copy of `resource` with its resource type substituted through `map`.
pub fn rewrite_resource(resource: &Resource, map: &RewriteMap) -> Result<Resource, MergeError> {
    Ok(Resource {
        r#type: lookup(map, &resource.r#type)?,
        ..resource.clone()
    })
}

/// A copy of `step` with every resource reference substituted through `map`.
///
/// Get and put steps are re-pinned to `map[effective_resource]`; their
/// handles stay as written. Do and in_parallel recurse. Tasks are copied
/// unchanged once they pass the inspectability check.
pub fn rewrite_step(step: &Step, map: &RewriteMap) -> Result<Step, MergeError> {
    match step {
        Step::Get(get) => Ok(Step::Get(GetStep {
            resource: Some(lookup(map, get.effective_resource())?),
            ..get.clone()
        })),
        Step::Put(put) => Ok(Step::Put(PutStep {
            resource: Some(lookup(map, put.effective_resource())?),
            ..put.clone()
        })),
        Step::Task(task) => {
            if task.config.is_none() {
                return Err(MergeError::UnsupportedTask {
                    task: task.task.clone(),
                    detail: "has no inline config".to_owned(),
                });
            }
            if task.file.is_some() {
                return Err(MergeError::UnsupportedTask {
                    task: task.task.clone(),
                    detail: "references an external task file".to_owned(),
                });
            }
            Ok(Step::Task(task.clone()))
        }
        Step::Do(do_) => {
            let steps = do_
                .r#do
                .iter()
                .map(|s| rewrite_step(s, map))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Step::Do(DoStep { r#do: steps }))
        }
        Step::InParallel(par) => {
            let steps = par
                .in_parallel
                .steps
                .iter()
                .map(|s| rewrite_step(s, map))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Step::InParallel(ParallelStep {
                in_parallel: ParallelConfig {
                    steps,
                    ..par.in_parallel.clone()
                },
            }))
        }
    }
}

/// A copy of `job` with `map` applied to its plan and lifecycle hooks.
pub fn rewrite_job(job: &Job, map: &RewriteMap) -> Result<Job, MergeError> {
    let plan = job
        .plan
        .iter()
        .map(|s| rewrite_step(s, map))
        .collect::<Result<Vec<_>, _>>()?;

    let rewrite_hook = |hook: &Option<Step>| -> Result<Option<Step>, MergeError> {
        hook.as_ref().map(|s| rewrite_step(s, map)).transpose()
    };

    Ok(Job {
        plan,
        on_success: rewrite_hook(&job.on_success)?,
        on_failure: rewrite_hook(&job.on_failure)?,
        on_error: rewrite_hook(&job.on_error)?,
        on_abort: rewrite_hook(&job.on_abort)?,
        ensure: rewrite_hook(&job.ensure)?,
        ..job.clone()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
