//! The pipeline merge engine.
//!
//! Merges two pipelines into one semantically-equivalent pipeline with
//! minimal duplication, in three strictly ordered phases (resource types →
//! resources → jobs). Each phase is a separate module:
//!
//! - **unique**: the unique-merge primitive — union two named-entity lists,
//!   minting `-NNN` names for collisions and recording the rewrites the
//!   right side must apply.
//! - **rewrite**: apply a rename map to every reference inside resources,
//!   steps, and jobs, producing fresh values.
//! - **handles**: inventory the `(handle, resource)` pairs a job uses.
//! - **deep**: fuse two same-named jobs by unioning their parallel
//!   branches, renaming colliding handles locally.
//! - **driver**: the three-phase orchestration.
//!
//! The engine is a pure transformation: inputs are never mutated, the
//! output is freshly allocated, and the result is deterministic for a
//! given pair of inputs and `deep` flag.

pub mod deep;
pub mod driver;
pub mod handles;
pub mod rewrite;
pub mod unique;

pub use driver::merge;
pub use unique::{Mergeable, RewriteMap, unique_merge, unique_name};
