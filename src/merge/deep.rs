//! Deep job fusion — merge two same-named jobs into one instead of
//! renaming the incoming one.
//!
//! Activated by the driver's `deep` flag. When the job lists collide on a
//! name with different content, the two plans are fused position by
//! position: identical steps collapse, parallel steps union their
//! branches, and anything else is a conflict. Before fusing, the incoming
//! job's handles are checked against the target's — a handle name bound
//! to a *different* resource is renamed (with the same `-NNN` scheme used
//! for entity collisions) so both branches can coexist in one plan. The
//! rename is applied only within the incoming job's plan.
//!
//! The fused job keeps the target's name, metadata, and hooks; fusion is
//! only attempted when both jobs' hooks agree.

use tracing::debug;

use crate::error::{FuseConflict, MergeError};
use crate::model::{
    DoStep, GetStep, Job, ParallelConfig, ParallelStep, PutStep, Step, TaskConfig, TaskInput,
    TaskOutput, TaskStep,
};

use super::handles::{Handle, job_handles};
use super::unique::{RewriteMap, unique_name};

// ---------------------------------------------------------------------------
// merge_jobs
// ---------------------------------------------------------------------------

/// Deep variant of the unique-merge primitive for job lists.
///
/// Follows the same decision tree as the shallow merge, except that a name
/// clash fuses the two jobs in place instead of appending a renamed copy.
/// Fused jobs get no rewrite entry; the driver discards the job-level map
/// either way.
pub fn merge_jobs(left: &[Job], right: &[Job]) -> Result<(Vec<Job>, RewriteMap), MergeError> {
    let mut merged: Vec<Job> = left.to_vec();
    let mut rewrites = RewriteMap::new();

    for job in right {
        if let Some(existing) = merged.iter().find(|m| m.semantic_eq(job)) {
            rewrites.insert(job.name.clone(), existing.name.clone());
        } else if let Some(pos) = merged.iter().position(|m| m.name == job.name) {
            debug!(job = %job.name, "fusing same-named jobs");
            merged[pos] = fuse_jobs(&merged[pos], job)?;
        } else {
            rewrites.insert(job.name.clone(), job.name.clone());
            merged.push(job.clone());
        }
    }

    Ok((merged, rewrites))
}

// ---------------------------------------------------------------------------
// fuse_jobs
// ---------------------------------------------------------------------------

/// Fuse `incoming` into `target`, returning the combined job.
///
/// # Errors
///
/// [`MergeError::DeepMergeConflict`] when the hooks differ, the plans have
/// different lengths, or a step pair is neither identical nor both
/// `in_parallel`. [`MergeError::UnsupportedTask`] when either plan contains
/// a task whose handles cannot be inventoried.
pub fn fuse_jobs(target: &Job, incoming: &Job) -> Result<Job, MergeError> {
    for ((hook, target_step), (_, incoming_step)) in
        target.hooks().into_iter().zip(incoming.hooks())
    {
        if target_step != incoming_step {
            return Err(MergeError::DeepMergeConflict {
                job: target.name.clone(),
                reason: FuseConflict::HookMismatch { hook },
            });
        }
    }

    if target.plan.len() != incoming.plan.len() {
        return Err(MergeError::DeepMergeConflict {
            job: target.name.clone(),
            reason: FuseConflict::PlanLength {
                left: target.plan.len(),
                right: incoming.plan.len(),
            },
        });
    }

    let handle_map = collision_rewrites(&job_handles(target)?, &job_handles(incoming)?);

    let mut plan = Vec::with_capacity(target.plan.len());
    for (index, (target_step, incoming_step)) in
        target.plan.iter().zip(&incoming.plan).enumerate()
    {
        let incoming_step = apply_handle_map(incoming_step, &handle_map);
        if *target_step == incoming_step {
            plan.push(target_step.clone());
        } else if let (Step::InParallel(t), Step::InParallel(i)) = (target_step, &incoming_step) {
            plan.push(Step::InParallel(union_branches(t, i)));
        } else {
            return Err(MergeError::DeepMergeConflict {
                job: target.name.clone(),
                reason: FuseConflict::StepMismatch { index },
            });
        }
    }

    Ok(Job {
        plan,
        ..target.clone()
    })
}

/// Union the incoming parallel step's branches into the target's, skipping
/// branches the target already has. The target's `limit`/`fail_fast` win.
fn union_branches(target: &ParallelStep, incoming: &ParallelStep) -> ParallelStep {
    let mut steps = target.in_parallel.steps.clone();
    for branch in &incoming.in_parallel.steps {
        if !steps.contains(branch) {
            steps.push(branch.clone());
        }
    }
    ParallelStep {
        in_parallel: ParallelConfig {
            steps,
            ..target.in_parallel.clone()
        },
    }
}

// ---------------------------------------------------------------------------
// Handle collision renaming
// ---------------------------------------------------------------------------

/// The handle renames the incoming job needs before its branches can join
/// the target's plan.
///
/// Walks the incoming handles in order against a working copy of the
/// target's: an identical `(name, resource)` pair aliases to itself; a name
/// bound to a different resource gets a minted alternative; a fresh pair is
/// adopted unchanged. Duplicate pairs are decided once.
fn collision_rewrites(target_handles: &[Handle], incoming_handles: &[Handle]) -> RewriteMap {
    let mut working: Vec<Handle> = target_handles.to_vec();
    let mut rewrites = RewriteMap::new();

    for handle in incoming_handles {
        if rewrites.contains_key(&handle.name) {
            continue;
        }
        if working.contains(handle) {
            rewrites.insert(handle.name.clone(), handle.name.clone());
        } else if working.iter().any(|w| w.name == handle.name) {
            let alt = unique_name(&handle.name, working.iter().map(|w| w.name.as_str()));
            rewrites.insert(handle.name.clone(), alt.clone());
            working.push(Handle {
                name: alt,
                resource: handle.resource.clone(),
            });
        } else {
            rewrites.insert(handle.name.clone(), handle.name.clone());
            working.push(handle.clone());
        }
    }

    rewrites
}

/// Apply a handle rename map inside one plan subtree.
///
/// Get/put steps are pinned to their effective resource before the handle
/// changes, so the binding survives the rename. Task configs rename their
/// input/output names. Identity entries are no-ops.
fn apply_handle_map(step: &Step, map: &RewriteMap) -> Step {
    match step {
        Step::Get(get) => match map.get(&get.get) {
            Some(alt) if *alt != get.get => Step::Get(GetStep {
                resource: Some(get.effective_resource().to_owned()),
                get: alt.clone(),
                ..get.clone()
            }),
            _ => step.clone(),
        },
        Step::Put(put) => match map.get(&put.put) {
            Some(alt) if *alt != put.put => Step::Put(PutStep {
                resource: Some(put.effective_resource().to_owned()),
                put: alt.clone(),
                ..put.clone()
            }),
            _ => step.clone(),
        },
        Step::Task(task) => {
            let Some(config) = &task.config else {
                return step.clone();
            };
            let renamed = |name: &str| map.get(name).cloned().unwrap_or_else(|| name.to_owned());
            let config = TaskConfig {
                inputs: config
                    .inputs
                    .iter()
                    .map(|input| TaskInput {
                        name: renamed(&input.name),
                        ..input.clone()
                    })
                    .collect(),
                outputs: config
                    .outputs
                    .iter()
                    .map(|output| TaskOutput {
                        name: renamed(&output.name),
                        ..output.clone()
                    })
                    .collect(),
                ..config.clone()
            };
            Step::Task(TaskStep {
                config: Some(config),
                ..task.clone()
            })
        }
        Step::Do(do_) => Step::Do(DoStep {
            r#do: do_.r#do.iter().map(|s| apply_handle_map(s, map)).collect(),
        }),
        Step::InParallel(par) => Step::InParallel(ParallelStep {
            in_parallel: ParallelConfig {
                steps: par
                    .in_parallel
                    .steps
                    .iter()
                    .map(|s| apply_handle_map(s, map))
                    .collect(),
                ..par.in_parallel.clone()
            },
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
