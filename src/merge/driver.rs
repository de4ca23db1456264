//! The merge driver — validate, then merge resource types, resources, and
//! jobs in that order, threading each phase's rewrite map into the next.
//!
//! The three phases are strictly ordered because each one's renames
//! invalidate names the next layer references:
//!
//! 1. Resource types merge; the resulting map rewrites the right side's
//!    resources (their `type` fields).
//! 2. Resources merge; the resulting map rewrites the right side's jobs
//!    (every get/put binding in every plan and hook).
//! 3. Jobs merge, shallowly or deeply. The job-level rewrite map has no
//!    downstream consumer and is discarded; in particular, `passed` lists
//!    are left as written.
//!
//! The driver is pure: both inputs are read-only and the output is freshly
//! allocated, so callers may keep using the inputs afterwards.

use tracing::{debug, instrument};

use crate::error::{MergeError, Side};
use crate::model::{Job, Pipeline};

use super::deep;
use super::rewrite::{rewrite_job, rewrite_resource};
use super::unique::unique_merge;

/// Merge `right` into `left`, producing a pipeline that behaves like both.
///
/// Shared declarations collapse onto the left side's names; colliding names
/// with different content are renamed on the right side and every reference
/// to them rewritten. With `deep` set, jobs sharing a name are fused by
/// unioning their parallel branches instead of being renamed.
///
/// # Errors
///
/// [`MergeError::InvalidPipeline`] when either input fails the pre-merge
/// check; [`MergeError::UnsupportedTask`] when a right-side job carries a
/// task the rewriter cannot inspect; [`MergeError::DeepMergeConflict`] when
/// deep fusion finds incompatible same-named jobs.
#[instrument(skip_all, fields(deep = deep))]
pub fn merge(left: &Pipeline, right: &Pipeline, deep: bool) -> Result<Pipeline, MergeError> {
    validate(left, Side::Left)?;
    validate(right, Side::Right)?;

    let (resource_types, type_map) =
        unique_merge(&left.resource_types, &right.resource_types);
    debug!(merged = resource_types.len(), renames = type_map.len(), "resource types merged");

    let right_resources = right
        .resources
        .iter()
        .map(|r| rewrite_resource(r, &type_map))
        .collect::<Result<Vec<_>, _>>()?;
    let (resources, resource_map) = unique_merge(&left.resources, &right_resources);
    debug!(merged = resources.len(), renames = resource_map.len(), "resources merged");

    let right_jobs = right
        .jobs
        .iter()
        .map(|j| rewrite_job(j, &resource_map))
        .collect::<Result<Vec<Job>, _>>()?;
    let (jobs, _) = if deep {
        deep::merge_jobs(&left.jobs, &right_jobs)?
    } else {
        unique_merge(&left.jobs, &right_jobs)
    };
    debug!(merged = jobs.len(), "jobs merged");

    Ok(Pipeline {
        resource_types,
        resources,
        jobs,
    })
}

fn validate(pipeline: &Pipeline, side: Side) -> Result<(), MergeError> {
    let undeclared = pipeline.undeclared_types();
    if undeclared.is_empty() {
        Ok(())
    } else {
        Err(MergeError::InvalidPipeline { side, undeclared })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GetStep, PutStep, Resource, ResourceType, Step};

    fn pipeline(
        resource_types: Vec<ResourceType>,
        resources: Vec<Resource>,
        jobs: Vec<Job>,
    ) -> Pipeline {
        Pipeline {
            resource_types,
            resources,
            jobs,
        }
    }

    #[test]
    fn empty_merge_is_empty() {
        let merged = merge(&Pipeline::default(), &Pipeline::default(), false).unwrap();
        assert_eq!(merged, Pipeline::default());
    }

    #[test]
    fn left_only_content_passes_through() {
        let left = pipeline(vec![ResourceType::new("a", "a1")], vec![], vec![]);
        let merged = merge(&left, &Pipeline::default(), false).unwrap();
        assert!(merged.exact_eq(&left));
    }

    #[test]
    fn right_only_content_passes_through() {
        let right = pipeline(vec![ResourceType::new("a", "a1")], vec![], vec![]);
        let merged = merge(&Pipeline::default(), &right, false).unwrap();
        assert!(merged.exact_eq(&right));
    }

    #[test]
    fn invalid_left_is_fatal() {
        let left = pipeline(vec![], vec![Resource::new("a", "ghost")], vec![]);
        let err = merge(&left, &Pipeline::default(), false).unwrap_err();
        assert!(matches!(
            err,
            MergeError::InvalidPipeline {
                side: Side::Left,
                ..
            }
        ));
    }

    #[test]
    fn invalid_right_is_fatal() {
        let right = pipeline(vec![], vec![Resource::new("a", "ghost")], vec![]);
        let err = merge(&Pipeline::default(), &right, false).unwrap_err();
        assert!(matches!(
            err,
            MergeError::InvalidPipeline {
                side: Side::Right,
                ..
            }
        ));
    }

    #[test]
    fn type_rename_cascades_into_resources() {
        let left = pipeline(
            vec![ResourceType::new("a", "a1")],
            vec![Resource::new("g", "a")],
            vec![],
        );
        let right = pipeline(
            vec![ResourceType::new("a", "a2")],
            vec![Resource::new("g", "a")],
            vec![],
        );
        let merged = merge(&left, &right, false).unwrap();

        let type_names: Vec<&str> = merged
            .resource_types
            .iter()
            .map(|rt| rt.name.as_str())
            .collect();
        assert_eq!(type_names, ["a", "a-000"]);

        // The right's `g` differs after the type rewrite, so it is renamed
        // and re-typed.
        assert_eq!(merged.resources.len(), 2);
        assert_eq!(merged.resources[1].name, "g-000");
        assert_eq!(merged.resources[1].r#type, "a-000");
    }

    #[test]
    fn resource_rename_cascades_into_jobs() {
        let job = |name: &str| {
            Job::new(
                name,
                vec![
                    Step::Get(GetStep::new("g")),
                    Step::Put(PutStep::new("g")),
                ],
            )
        };
        let left = pipeline(
            vec![ResourceType::new("a", "a1")],
            vec![Resource::new("g", "a")],
            vec![job("k")],
        );
        let right = pipeline(
            vec![ResourceType::new("a", "a2")],
            vec![Resource::new("g", "a")],
            vec![job("l")],
        );
        let merged = merge(&left, &right, false).unwrap();

        // Left job untouched.
        assert_eq!(merged.jobs[0], job("k"));

        // Right job re-pinned to the renamed resource, handles intact.
        let rewritten = &merged.jobs[1];
        assert_eq!(rewritten.name, "l");
        assert_eq!(
            rewritten.plan,
            vec![
                Step::Get(GetStep::aliased("g", "g-000")),
                Step::Put(PutStep::aliased("g", "g-000")),
            ]
        );
    }

    #[test]
    fn merged_pipeline_stays_valid() {
        let left = pipeline(
            vec![ResourceType::new("a", "a1")],
            vec![Resource::new("g", "a")],
            vec![],
        );
        let right = pipeline(
            vec![ResourceType::new("a", "a2")],
            vec![Resource::new("h", "a")],
            vec![],
        );
        let merged = merge(&left, &right, false).unwrap();
        assert!(merged.is_valid());
    }

    #[test]
    fn inputs_are_not_mutated() {
        let left = pipeline(
            vec![ResourceType::new("a", "a1")],
            vec![Resource::new("g", "a")],
            vec![Job::new("k", vec![Step::Get(GetStep::new("g"))])],
        );
        let right = pipeline(
            vec![ResourceType::new("a", "a2")],
            vec![Resource::new("g", "a")],
            vec![Job::new("l", vec![Step::Get(GetStep::new("g"))])],
        );
        let (left_before, right_before) = (left.clone(), right.clone());
        let _ = merge(&left, &right, false).unwrap();
        assert_eq!(left, left_before);
        assert_eq!(right, right_before);
    }

    #[test]
    fn merge_with_self_is_semantically_identity() {
        let p = pipeline(
            vec![ResourceType::new("a", "a1")],
            vec![Resource::new("g", "a")],
            vec![Job::new("k", vec![Step::Get(GetStep::new("g"))])],
        );
        let merged = merge(&p, &p, false).unwrap();
        assert!(merged.semantic_eq(&p));
    }
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------
