//! Graph nodes and their override protocol.

mod binding;
mod metadata;
mod overrides;

use std::collections::BTreeMap;
use std::sync::Arc;

use derive_more::Display;
use serde::{Deserialize, Serialize};

pub use binding::{Binding, BindingData};
pub use metadata::{NodeMetadata, RetryStrategy};
pub use overrides::{Cache, CachePolicy, Overrides, OverridesBuilder, OverridesBuilderError, Timeout};

use crate::entity::RunEntity;
use crate::resources::{ExtendedResources, ResourceRequirements};
use crate::template::PodTemplate;

/// Stable position of a node inside its graph.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("#{_0}")]
pub struct NodeHandle(usize);

impl NodeHandle {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// External name for one node output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub var: String,
    pub alias: String,
}

/// One invocation of a task or workflow inside a graph.
///
/// Nodes are created by [`WorkflowGraph`](crate::WorkflowGraph), which owns
/// them; upstream dependencies are handles into the same graph.
#[derive(Debug, Clone)]
pub struct Node {
    handle: NodeHandle,
    id: String,
    metadata: NodeMetadata,
    bindings: Vec<Binding>,
    upstream: Vec<NodeHandle>,
    aliases: Vec<Alias>,
    resources: Option<ResourceRequirements>,
    extended_resources: ExtendedResources,
    pod_template: Option<PodTemplate>,
    container_image: Option<String>,
    run_entity: Arc<RunEntity>,
}

impl Node {
    /// Upstream nodes start as the producers of promised bindings.
    pub(crate) fn new(
        handle: NodeHandle,
        id: String,
        run_entity: Arc<RunEntity>,
        bindings: Vec<Binding>,
    ) -> Self {
        let mut upstream = Vec::new();
        for binding in &bindings {
            for promise in binding.binding.promises() {
                if !upstream.contains(&promise.node()) {
                    upstream.push(promise.node());
                }
            }
        }

        Self {
            handle,
            id,
            metadata: run_entity.default_metadata().clone(),
            bindings,
            upstream,
            aliases: Vec::new(),
            resources: None,
            extended_resources: ExtendedResources::default(),
            pod_template: None,
            container_image: None,
            run_entity,
        }
    }

    #[inline]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// DNS-label-safe id, unique within the graph.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Nodes that must finish first, in the order they were added.
    pub fn upstream_nodes(&self) -> &[NodeHandle] {
        &self.upstream
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn resources(&self) -> Option<&ResourceRequirements> {
        self.resources.as_ref()
    }

    pub fn extended_resources(&self) -> &ExtendedResources {
        &self.extended_resources
    }

    pub fn pod_template(&self) -> Option<&PodTemplate> {
        self.pod_template.as_ref()
    }

    pub fn container_image(&self) -> Option<&str> {
        self.container_image.as_deref()
    }

    pub fn run_entity(&self) -> &Arc<RunEntity> {
        &self.run_entity
    }

    /// Adds `upstream` once; returns `false` when it was already present.
    pub(crate) fn add_upstream(&mut self, upstream: NodeHandle) -> bool {
        if self.upstream.contains(&upstream) {
            return false;
        }
        self.upstream.push(upstream);
        true
    }

    pub(crate) fn alias_map(aliases: BTreeMap<String, String>) -> Vec<Alias> {
        aliases
            .into_iter()
            .map(|(var, alias)| Alias { var, alias })
            .collect()
    }
}
