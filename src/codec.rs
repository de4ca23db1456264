//! YAML codec — load and serialize pipeline documents.
//!
//! Thin glue over serde_yaml. All the interesting decoding rules (step
//! discrimination, `in_parallel` short-form coercion, defaults) live on the
//! model types themselves; this module adds file/reader plumbing and path
//! context on errors.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::model::Pipeline;

// ---------------------------------------------------------------------------
// CodecError
// ---------------------------------------------------------------------------

/// Error loading or writing a pipeline document.
#[derive(Debug)]
pub struct CodecError {
    /// The file being processed (if one was involved).
    pub path: Option<PathBuf>,
    /// Human-readable message, with line/column detail when the parser
    /// provides it.
    pub message: String,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "pipeline document error: {}", self.message)
        }
    }
}

impl std::error::Error for CodecError {}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a pipeline from a YAML string.
///
/// # Errors
/// Returns [`CodecError`] on malformed YAML or a document that does not
/// match the pipeline schema.
pub fn parse_pipeline(yaml: &str) -> Result<Pipeline, CodecError> {
    serde_yaml::from_str(yaml).map_err(|e| CodecError {
        path: None,
        message: e.to_string(),
    })
}

/// Read and parse a pipeline from anything readable (a file, stdin, …).
///
/// # Errors
/// Returns [`CodecError`] on I/O or parse failure.
pub fn read_pipeline(mut reader: impl Read) -> Result<Pipeline, CodecError> {
    let mut contents = String::new();
    reader.read_to_string(&mut contents).map_err(|e| CodecError {
        path: None,
        message: format!("could not read input: {e}"),
    })?;
    parse_pipeline(&contents)
}

/// Load a pipeline from a file.
///
/// # Errors
/// Returns [`CodecError`] with the path attached on I/O or parse failure.
pub fn load_pipeline(path: &Path) -> Result<Pipeline, CodecError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CodecError {
        path: Some(path.to_owned()),
        message: format!("could not read file: {e}"),
    })?;
    parse_pipeline(&contents).map_err(|mut e| {
        e.path = Some(path.to_owned());
        e
    })
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialize a pipeline to YAML.
///
/// The output always uses the canonical long form for `in_parallel`.
///
/// # Errors
/// Returns [`CodecError`] if serialization fails (e.g. a non-string key in
/// an opaque config map).
pub fn serialize_pipeline(pipeline: &Pipeline) -> Result<String, CodecError> {
    serde_yaml::to_string(pipeline).map_err(|e| CodecError {
        path: None,
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
