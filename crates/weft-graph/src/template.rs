//! Pod templates attached to nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::promise::impl_param_from;

/// Custom pod definition for the node's container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodTemplate {
    pub primary_container_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Pod spec document, passed through untouched.
    #[serde(default)]
    pub pod_spec: serde_json::Value,
}

impl PodTemplate {
    pub fn new(primary_container_name: impl Into<String>) -> Self {
        Self {
            primary_container_name: primary_container_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_pod_spec(mut self, pod_spec: serde_json::Value) -> Self {
        self.pod_spec = pod_spec;
        self
    }
}

impl_param_from!(PodTemplate);
