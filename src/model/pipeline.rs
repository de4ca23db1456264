//! The pipeline root — three entity lists and their well-formedness rule.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::job::Job;
use super::resource::{Resource, ResourceType};

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A Concourse pipeline: resource types, resources, and jobs.
///
/// Structural `==` is exact and order-sensitive. The merge engine's
/// equivalence predicates ([`Pipeline::semantic_eq`] and
/// [`Pipeline::exact_eq`]) sort each list by name first, so two pipelines
/// that declare the same entities in different orders compare equal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub resource_types: Vec<ResourceType>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl Pipeline {
    /// Name-sorted, name-insensitive equivalence.
    ///
    /// Each list is sorted by `name` and compared pairwise with the
    /// per-entity semantic predicate.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        sorted_pairs_match(&self.resource_types, &other.resource_types, |rt| &rt.name, ResourceType::semantic_eq)
            && sorted_pairs_match(&self.resources, &other.resources, |r| &r.name, Resource::semantic_eq)
            && sorted_pairs_match(&self.jobs, &other.jobs, |j| &j.name, Job::semantic_eq)
    }

    /// Name-sorted equivalence requiring matching names as well.
    #[must_use]
    pub fn exact_eq(&self, other: &Self) -> bool {
        sorted_pairs_match(&self.resource_types, &other.resource_types, |rt| &rt.name, ResourceType::exact_eq)
            && sorted_pairs_match(&self.resources, &other.resources, |r| &r.name, Resource::exact_eq)
            && sorted_pairs_match(&self.jobs, &other.jobs, |j| &j.name, Job::exact_eq)
    }

    /// Resources whose `type` does not name a declared resource type.
    ///
    /// An empty result means the pipeline satisfies the cross-reference
    /// invariant the merge engine relies on.
    #[must_use]
    pub fn undeclared_types(&self) -> Vec<UndeclaredType> {
        let declared: BTreeSet<&str> = self
            .resource_types
            .iter()
            .map(|rt| rt.name.as_str())
            .collect();
        self.resources
            .iter()
            .filter(|r| !declared.contains(r.r#type.as_str()))
            .map(|r| UndeclaredType {
                resource: r.name.clone(),
                resource_type: r.r#type.clone(),
            })
            .collect()
    }

    /// True when every resource references a declared resource type.
    ///
    /// TODO: also check that every get/put in every job plan resolves to a
    /// declared resource.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.undeclared_types().is_empty()
    }
}

/// Sort both slices by name and compare pairwise with `eq`.
fn sorted_pairs_match<T>(
    left: &[T],
    right: &[T],
    name: impl Fn(&T) -> &String,
    eq: impl Fn(&T, &T) -> bool,
) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left: Vec<&T> = left.iter().collect();
    let mut right: Vec<&T> = right.iter().collect();
    left.sort_by_key(|item| name(item).clone());
    right.sort_by_key(|item| name(item).clone());
    left.iter().zip(&right).all(|(l, r)| eq(l, r))
}

// ---------------------------------------------------------------------------
// UndeclaredType
// ---------------------------------------------------------------------------

/// A resource referencing a resource type the pipeline does not declare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndeclaredType {
    /// Name of the offending resource.
    pub resource: String,
    /// The resource type name it references.
    pub resource_type: String,
}

impl fmt::Display for UndeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resource '{}' references undeclared resource type '{}'",
            self.resource, self.resource_type
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::step::{GetStep, Step};

    #[test]
    fn empty_pipeline_is_valid() {
        assert!(Pipeline::default().is_valid());
    }

    #[test]
    fn resource_with_undeclared_type_is_invalid() {
        let p = Pipeline {
            resources: vec![Resource::new("a", "b")],
            ..Pipeline::default()
        };
        assert!(!p.is_valid());
        let offenders = p.undeclared_types();
        assert_eq!(offenders.len(), 1);
        assert_eq!(offenders[0].resource, "a");
        assert_eq!(offenders[0].resource_type, "b");
    }

    #[test]
    fn resource_with_declared_type_is_valid() {
        let p = Pipeline {
            resource_types: vec![ResourceType::new("b", "c")],
            resources: vec![Resource::new("a", "b")],
            ..Pipeline::default()
        };
        assert!(p.is_valid());
    }

    #[test]
    fn semantic_eq_ignores_declaration_order() {
        let a = Pipeline {
            resource_types: vec![ResourceType::new("x", "t1"), ResourceType::new("y", "t2")],
            ..Pipeline::default()
        };
        let b = Pipeline {
            resource_types: vec![ResourceType::new("y", "t2"), ResourceType::new("x", "t1")],
            ..Pipeline::default()
        };
        assert!(a.semantic_eq(&b));
        assert!(a.exact_eq(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn semantic_eq_tolerates_renames_exact_eq_does_not() {
        let a = Pipeline {
            jobs: vec![Job::new("a", vec![Step::Get(GetStep::new("g"))])],
            ..Pipeline::default()
        };
        let b = Pipeline {
            jobs: vec![Job::new("b", vec![Step::Get(GetStep::new("g"))])],
            ..Pipeline::default()
        };
        assert!(a.semantic_eq(&b));
        assert!(!a.exact_eq(&b));
    }

    #[test]
    fn length_mismatch_is_never_equal() {
        let a = Pipeline::default();
        let b = Pipeline {
            resource_types: vec![ResourceType::new("x", "t")],
            ..Pipeline::default()
        };
        assert!(!a.semantic_eq(&b));
    }

    #[test]
    fn missing_sections_parse_as_empty() {
        let p: Pipeline = serde_yaml::from_str("jobs: []\n").unwrap();
        assert!(p.resource_types.is_empty());
        assert!(p.resources.is_empty());
    }
}
