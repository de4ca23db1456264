//! The unique-merge primitive — union two named entity lists, minting
//! collision names and recording the rewrites the right side's consumers
//! must apply.
//!
//! Given a left list `A` and a right list `B` of the same entity kind, the
//! merge processes each `b ∈ B` in order:
//!
//! 1. **Semantic match** — some entity already in the output has the same
//!    content (ignoring name): record `b.name → that name`, append nothing.
//!    The left side's name wins.
//! 2. **Name clash** — the name is taken by different content: mint the
//!    smallest free `name-NNN` alternative, append `b` under it, record
//!    `b.name → alternative`.
//! 3. **Fresh** — append a copy of `b` unchanged, record the identity.
//!
//! The output is the left list verbatim (a stable prefix) followed by the
//! right side's new entries in their input order. Every name in `B` gets a
//! rewrite entry; every entry maps to a name present in the output.

use std::collections::BTreeMap;

use crate::model::{Job, Resource, ResourceType};

/// A `name → name` substitution produced by a merge phase.
pub type RewriteMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Mergeable
// ---------------------------------------------------------------------------

/// A named entity the unique-merge primitive can operate on.
pub trait Mergeable: Clone {
    /// The entity's unique-within-kind name.
    fn name(&self) -> &str;

    /// Content equality ignoring the name.
    fn semantic_eq(&self, other: &Self) -> bool;

    /// A copy of the entity under a different name.
    #[must_use]
    fn renamed(&self, name: String) -> Self;
}

impl Mergeable for ResourceType {
    fn name(&self) -> &str {
        &self.name
    }

    fn semantic_eq(&self, other: &Self) -> bool {
        Self::semantic_eq(self, other)
    }

    fn renamed(&self, name: String) -> Self {
        Self { name, ..self.clone() }
    }
}

impl Mergeable for Resource {
    fn name(&self) -> &str {
        &self.name
    }

    fn semantic_eq(&self, other: &Self) -> bool {
        Self::semantic_eq(self, other)
    }

    fn renamed(&self, name: String) -> Self {
        Self { name, ..self.clone() }
    }
}

impl Mergeable for Job {
    fn name(&self) -> &str {
        &self.name
    }

    fn semantic_eq(&self, other: &Self) -> bool {
        Self::semantic_eq(self, other)
    }

    fn renamed(&self, name: String) -> Self {
        Self { name, ..self.clone() }
    }
}

// ---------------------------------------------------------------------------
// unique_name
// ---------------------------------------------------------------------------

/// The smallest `base-NNN` (zero-padded, three digits, counting from 0)
/// not present in `taken`.
///
/// Names minted in earlier iterations count as taken, so repeated clashes
/// on the same base yield `base-000`, `base-001`, ….
pub fn unique_name<'a>(base: &str, taken: impl IntoIterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = taken.into_iter().collect();
    let mut index = 0_u32;
    loop {
        let candidate = format!("{base}-{index:03}");
        if !taken.contains(&candidate.as_str()) {
            return candidate;
        }
        index += 1;
    }
}

// ---------------------------------------------------------------------------
// unique_merge
// ---------------------------------------------------------------------------

/// Merge `right` into `left`, returning the merged list and the rewrite map
/// for the right side's downstream references.
pub fn unique_merge<T: Mergeable>(left: &[T], right: &[T]) -> (Vec<T>, RewriteMap) {
    let mut merged: Vec<T> = left.to_vec();
    let mut rewrites = RewriteMap::new();

    for item in right {
        if let Some(existing) = merged.iter().find(|m| m.semantic_eq(item)) {
            // Same content already present: the existing name wins.
            rewrites.insert(item.name().to_owned(), existing.name().to_owned());
        } else if merged.iter().any(|m| m.name() == item.name()) {
            // Name taken by different content: mint an alternative.
            let alt = unique_name(item.name(), merged.iter().map(Mergeable::name));
            rewrites.insert(item.name().to_owned(), alt.clone());
            merged.push(item.renamed(alt));
        } else {
            rewrites.insert(item.name().to_owned(), item.name().to_owned());
            merged.push(item.clone());
        }
    }

    (merged, rewrites)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rt(name: &str, r#type: &str) -> ResourceType {
        ResourceType::new(name, r#type)
    }

    fn rewrites(pairs: &[(&str, &str)]) -> RewriteMap {
        pairs
            .iter()
            .map(|(from, to)| ((*from).to_owned(), (*to).to_owned()))
            .collect()
    }

    // -- unique_name --

    #[test]
    fn unique_name_starts_at_zero() {
        assert_eq!(unique_name("a", ["a"]), "a-000");
    }

    #[test]
    fn unique_name_skips_taken_alternatives() {
        assert_eq!(unique_name("a", ["a", "a-000", "a-001"]), "a-002");
    }

    #[test]
    fn unique_name_ignores_other_bases() {
        assert_eq!(unique_name("a", ["b", "b-000"]), "a-000");
    }

    // -- unique_merge cases --

    #[test]
    fn merge_empty_lists() {
        let (merged, map) = unique_merge::<ResourceType>(&[], &[]);
        assert!(merged.is_empty());
        assert!(map.is_empty());
    }

    #[test]
    fn merge_identical_entry_maps_to_existing() {
        let (merged, map) = unique_merge(&[rt("a", "b")], &[rt("a", "b")]);
        assert_eq!(merged, vec![rt("a", "b")]);
        assert_eq!(map, rewrites(&[("a", "a")]));
    }

    #[test]
    fn merge_fresh_entry_appends() {
        let (merged, map) = unique_merge(&[rt("a", "b")], &[rt("c", "d")]);
        assert_eq!(merged, vec![rt("a", "b"), rt("c", "d")]);
        assert_eq!(map, rewrites(&[("c", "c")]));
    }

    #[test]
    fn merge_same_content_different_name_maps_to_left_name() {
        let (merged, map) = unique_merge(&[rt("a", "b")], &[rt("c", "b")]);
        assert_eq!(merged, vec![rt("a", "b")]);
        assert_eq!(map, rewrites(&[("c", "a")]));
    }

    #[test]
    fn merge_name_clash_mints_alternative() {
        let (merged, map) = unique_merge(&[rt("a", "b")], &[rt("a", "c")]);
        assert_eq!(merged, vec![rt("a", "b"), rt("a-000", "c")]);
        assert_eq!(map, rewrites(&[("a", "a-000")]));
    }

    #[test]
    fn merge_name_clash_skips_existing_alternative() {
        let (merged, map) = unique_merge(&[rt("a", "b"), rt("a-000", "d")], &[rt("a", "c")]);
        assert_eq!(merged, vec![rt("a", "b"), rt("a-000", "d"), rt("a-001", "c")]);
        assert_eq!(map, rewrites(&[("a", "a-001")]));
    }

    #[test]
    fn merge_mixed_match_and_clash() {
        let (merged, map) = unique_merge(
            &[rt("a", "x"), rt("c", "y")],
            &[rt("b", "x"), rt("a", "z")],
        );
        assert_eq!(merged, vec![rt("a", "x"), rt("c", "y"), rt("a-000", "z")]);
        assert_eq!(map, rewrites(&[("b", "a"), ("a", "a-000")]));
    }

    #[test]
    fn merge_left_is_stable_prefix() {
        let left = vec![rt("a", "x"), rt("b", "y")];
        let (merged, _) = unique_merge(&left, &[rt("z", "q"), rt("a", "w")]);
        assert!(merged[..left.len()]
            .iter()
            .zip(&left)
            .all(|(m, l)| m.exact_eq(l)));
    }

    #[test]
    fn merge_right_order_preserved_in_tail() {
        let (merged, _) = unique_merge(&[], &[rt("b", "x"), rt("a", "y"), rt("c", "z")]);
        let names: Vec<&str> = merged.iter().map(|rt| rt.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn merge_with_self_is_identity() {
        let list = vec![rt("a", "x"), rt("b", "y")];
        let (merged, map) = unique_merge(&list, &list);
        assert_eq!(merged, list);
        assert!(map.iter().all(|(from, to)| from == to));
    }

    #[test]
    fn minted_entry_collides_with_later_right_entry() {
        // The second right entry clashes with a name minted for the first.
        let (merged, map) = unique_merge(
            &[rt("a", "x")],
            &[rt("a", "y"), rt("a-000", "z")],
        );
        assert_eq!(
            merged,
            vec![rt("a", "x"), rt("a-000", "y"), rt("a-000-000", "z")]
        );
        assert_eq!(map, rewrites(&[("a", "a-000"), ("a-000", "a-000-000")]));
    }

    // -- contract properties on a small fixed corpus --

    #[test]
    fn every_right_name_is_covered_and_maps_into_merged() {
        let left = vec![rt("a", "x"), rt("b", "y")];
        let right = vec![rt("a", "z"), rt("b", "y"), rt("c", "w")];
        let (merged, map) = unique_merge(&left, &right);

        for r in &right {
            let target = map.get(&r.name).expect("every right name covered");
            assert!(merged.iter().any(|m| &m.name == target));
        }
    }
}
