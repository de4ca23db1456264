//! Resource types and resources — the external-facing entities of a pipeline.
//!
//! A [`ResourceType`] declares the plugin (container image) used to interact
//! with resources of that type. A [`Resource`] registers a concrete external
//! artifact (a repo, a registry image, a bucket) backed by a resource type.
//!
//! Both kinds carry two equality predicates used by the merge engine:
//!
//! - **semantic** ([`ResourceType::semantic_eq`]) — content-equal ignoring
//!   `name`. Two declarations with different names but identical plugin
//!   config are the same thing and collapse during merge.
//! - **exact** ([`ResourceType::exact_eq`]) — semantic equality plus the
//!   same `name`.
//!
//! Plugin configuration (`source`, `params`, `defaults`) is opaque to the
//! merge engine: it is carried as structured YAML values and compared for
//! equality only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque plugin configuration, keyed deterministically.
pub type ConfigMap = BTreeMap<String, serde_yaml::Value>;

fn default_check_every() -> String {
    "1m".to_owned()
}

fn default_check_timeout() -> String {
    "1h".to_owned()
}

// ---------------------------------------------------------------------------
// ResourceType
// ---------------------------------------------------------------------------

/// A resource type declaration — the plugin backing one or more resources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceType {
    /// Handle by which resources reference this type.
    pub name: String,
    /// Plugin image reference (e.g. `registry-image`).
    pub r#type: String,
    /// Opaque plugin source configuration.
    #[serde(default)]
    pub source: ConfigMap,
    /// Run the plugin's containers with elevated privileges.
    #[serde(default)]
    pub privileged: bool,
    /// Opaque parameters passed to the plugin on check.
    #[serde(default)]
    pub params: ConfigMap,
    /// Check interval (Concourse duration string).
    #[serde(default = "default_check_every")]
    pub check_every: String,
    /// Worker tags the plugin's containers must run on.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Defaults merged into the `source` of every resource of this type.
    #[serde(default)]
    pub defaults: ConfigMap,
}

impl ResourceType {
    /// A resource type with the given name and plugin image, everything else
    /// defaulted.
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.into(),
            source: ConfigMap::new(),
            privileged: false,
            params: ConfigMap::new(),
            check_every: default_check_every(),
            tags: Vec::new(),
            defaults: ConfigMap::new(),
        }
    }

    /// Content equality, ignoring `name`.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.source == other.source
            && self.privileged == other.privileged
            && self.params == other.params
            && self.check_every == other.check_every
            && self.tags == other.tags
            && self.defaults == other.defaults
    }

    /// Semantic equality plus the same `name`.
    #[must_use]
    pub fn exact_eq(&self, other: &Self) -> bool {
        self.name == other.name && self.semantic_eq(other)
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A named external artifact registered in the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Handle by which job steps reference this resource.
    pub name: String,
    /// Name of the [`ResourceType`] backing this resource.
    pub r#type: String,
    /// Opaque plugin source configuration.
    pub source: ConfigMap,
    /// Previous name, preserving build history across a rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_name: Option<String>,
    /// Icon shown in the web UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Version pinning for the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Check interval (Concourse duration string).
    #[serde(default = "default_check_every")]
    pub check_every: String,
    /// Timeout applied to check containers.
    #[serde(default = "default_check_timeout")]
    pub check_timeout: String,
    /// Expose the user who created the build to the resource's containers.
    #[serde(default)]
    pub expose_build_created_by: bool,
    /// Worker tags the resource's containers must run on.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Make this resource's versions publicly viewable.
    #[serde(default)]
    pub public: bool,
    /// Token for triggering checks via webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_token: Option<String>,
}

impl Resource {
    /// A resource with the given name and type, everything else defaulted.
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.into(),
            source: ConfigMap::new(),
            old_name: None,
            icon: None,
            version: None,
            check_every: default_check_every(),
            check_timeout: default_check_timeout(),
            expose_build_created_by: false,
            tags: Vec::new(),
            public: false,
            webhook_token: None,
        }
    }

    /// Content equality, ignoring `name`.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.source == other.source
            && self.old_name == other.old_name
            && self.icon == other.icon
            && self.version == other.version
            && self.check_every == other.check_every
            && self.check_timeout == other.check_timeout
            && self.expose_build_created_by == other.expose_build_created_by
            && self.tags == other.tags
            && self.public == other.public
            && self.webhook_token == other.webhook_token
    }

    /// Semantic equality plus the same `name`.
    #[must_use]
    pub fn exact_eq(&self, other: &Self) -> bool {
        self.name == other.name && self.semantic_eq(other)
    }
}

// ---------------------------------------------------------------------------
// AnonymousResource
// ---------------------------------------------------------------------------

/// A resource declaration without a name, used inline as a task's
/// `image_resource`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnonymousResource {
    /// Name of the resource type backing this resource.
    pub r#type: String,
    /// Opaque plugin source configuration.
    pub source: ConfigMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Opaque parameters passed when fetching the image.
    #[serde(default)]
    pub params: ConfigMap,
}

impl AnonymousResource {
    /// An anonymous resource with the given type, everything else defaulted.
    pub fn new(r#type: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            source: ConfigMap::new(),
            version: None,
            params: ConfigMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
