//! Compiled entities that nodes execute.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::node::NodeMetadata;

/// Plugin-specific task configuration of any concrete type.
#[derive(Clone)]
pub struct TaskConfig {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl TaskConfig {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` when both configs hold the same concrete type.
    pub fn is_same_type(&self, other: &TaskConfig) -> bool {
        self.type_id == other.type_id
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for TaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskConfig")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// What a node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunEntityKind {
    Task,
    Workflow,
    /// A task fanned out over a collection, one sub-node per item.
    ArrayMap,
}

/// A compiled task or workflow, shared by every node that invokes it.
///
/// Task config and the sub-node metadata of array maps are mutable through
/// node overrides, and the change is visible to all nodes sharing the
/// entity.
#[derive(Debug)]
pub struct RunEntity {
    name: String,
    kind: RunEntityKind,
    metadata: NodeMetadata,
    sub_node_metadata: RwLock<NodeMetadata>,
    task_config: RwLock<Option<TaskConfig>>,
}

impl RunEntity {
    fn with_kind(name: String, kind: RunEntityKind) -> Self {
        Self {
            metadata: NodeMetadata::new(name.clone()),
            sub_node_metadata: RwLock::new(NodeMetadata::new(name.clone())),
            task_config: RwLock::new(None),
            name,
            kind,
        }
    }

    pub fn task(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), RunEntityKind::Task)
    }

    pub fn workflow(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), RunEntityKind::Workflow)
    }

    /// A mapped task whose instances start from `sub_node_metadata`.
    pub fn array_map(name: impl Into<String>, sub_node_metadata: NodeMetadata) -> Self {
        let entity = Self::with_kind(name.into(), RunEntityKind::ArrayMap);
        *entity.sub_node_metadata.write() = sub_node_metadata;
        entity
    }

    /// Sets the metadata nodes start from, such as a preset timeout.
    #[must_use]
    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_task_config<T: Any + Send + Sync>(self, config: T) -> Self {
        *self.task_config.write() = Some(TaskConfig::new(config));
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RunEntityKind {
        self.kind
    }

    pub fn is_array_map(&self) -> bool {
        self.kind == RunEntityKind::ArrayMap
    }

    /// Metadata new nodes invoking this entity start from.
    pub fn default_metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    /// Metadata of each mapped instance; only meaningful for array maps.
    pub fn sub_node_metadata(&self) -> NodeMetadata {
        self.sub_node_metadata.read().clone()
    }

    pub(crate) fn update_sub_node_metadata<F>(&self, update: F)
    where
        F: FnOnce(&mut NodeMetadata),
    {
        update(&mut self.sub_node_metadata.write());
    }

    pub fn task_config(&self) -> Option<TaskConfig> {
        self.task_config.read().clone()
    }

    pub(crate) fn set_task_config(&self, config: TaskConfig) {
        *self.task_config.write() = Some(config);
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct GpuConfig {
        replicas: u32,
    }

    #[test]
    fn task_config_keeps_its_type() {
        let entity = RunEntity::task("train").with_task_config(GpuConfig { replicas: 2 });
        let config = entity.task_config().unwrap();
        assert_eq!(config.downcast_ref::<GpuConfig>(), Some(&GpuConfig { replicas: 2 }));
        assert!(config.downcast_ref::<String>().is_none());
        assert!(config.is_same_type(&TaskConfig::new(GpuConfig { replicas: 4 })));
        assert!(!config.is_same_type(&TaskConfig::new("other")));
    }

    #[test]
    fn array_maps_carry_sub_node_metadata() {
        let preset = NodeMetadata::new("square").with_timeout(SignedDuration::from_secs(30));
        let entity = RunEntity::array_map("map_square", preset.clone());
        assert!(entity.is_array_map());
        assert_eq!(entity.sub_node_metadata(), preset);

        entity.update_sub_node_metadata(|metadata| metadata.retries.retries = 3);
        assert_eq!(entity.sub_node_metadata().retries.retries, 3);
        assert_eq!(entity.default_metadata().name, "map_square");
    }
}
