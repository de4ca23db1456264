//! conflate library crate — merge Concourse CI pipeline definitions.
//!
//! The primary interface is the `conflate` CLI binary; the library exposes
//! the pipeline model, the YAML codec, and the merge engine for embedding.

pub mod codec;
pub mod error;
pub mod merge;
pub mod model;
pub mod telemetry;
