//! Serializable form of a finalized graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use weft_core::literal::Literal;

use crate::error::{GraphError, GraphResult};
use crate::graph::WorkflowGraph;
use crate::node::{Alias, BindingData, Node, NodeHandle, NodeMetadata};
use crate::resources::{ExtendedResources, ResourceRequirements};
use crate::template::PodTemplate;

/// Output `var` of the node with id `node_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputReference {
    pub node_id: String,
    pub var: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingDataSpec {
    Scalar(Literal),
    Promise(OutputReference),
    Collection(Vec<BindingDataSpec>),
    Map(BTreeMap<String, BindingDataSpec>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub var: String,
    pub binding: BindingDataSpec,
}

/// Per-node overrides of the task's resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOverridesSpec {
    pub resources: ResourceRequirements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_resources: Option<ExtendedResources>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub metadata: NodeMetadata,
    pub upstream_node_ids: Vec<String>,
    pub bindings: Vec<BindingSpec>,
    pub overrides: NodeOverridesSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_template: Option<PodTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<Alias>,
    /// Metadata of each mapped instance, for array map nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_node_metadata: Option<NodeMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub nodes: Vec<NodeSpec>,
}

impl WorkflowSpec {
    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

impl WorkflowGraph {
    /// Validates the graph and renders every node in insertion order.
    pub fn to_spec(&self) -> GraphResult<WorkflowSpec> {
        self.validate()?;
        let nodes = self
            .nodes()
            .map(|node| self.node_spec(node))
            .collect::<GraphResult<Vec<_>>>()?;
        Ok(WorkflowSpec { nodes })
    }

    fn node_id(&self, handle: NodeHandle) -> GraphResult<String> {
        self.node(handle)
            .map(|node| node.id().to_owned())
            .ok_or(GraphError::NodeNotFound(handle))
    }

    fn binding_spec(&self, data: &BindingData) -> GraphResult<BindingDataSpec> {
        let spec = match data {
            BindingData::Scalar(literal) => BindingDataSpec::Scalar(literal.clone()),
            BindingData::Promise(promise) => BindingDataSpec::Promise(OutputReference {
                node_id: self.node_id(promise.node())?,
                var: promise.var().to_owned(),
            }),
            BindingData::Collection(items) => BindingDataSpec::Collection(
                items
                    .iter()
                    .map(|item| self.binding_spec(item))
                    .collect::<GraphResult<_>>()?,
            ),
            BindingData::Map(items) => BindingDataSpec::Map(
                items
                    .iter()
                    .map(|(key, item)| Ok((key.clone(), self.binding_spec(item)?)))
                    .collect::<GraphResult<_>>()?,
            ),
        };
        Ok(spec)
    }

    fn node_spec(&self, node: &Node) -> GraphResult<NodeSpec> {
        let upstream_node_ids: Vec<String> = node
            .upstream_nodes()
            .iter()
            .map(|handle| self.node_id(*handle))
            .collect::<GraphResult<_>>()?;
        let bindings: Vec<BindingSpec> = node
            .bindings()
            .iter()
            .map(|binding| {
                Ok(BindingSpec {
                    var: binding.var.clone(),
                    binding: self.binding_spec(&binding.binding)?,
                })
            })
            .collect::<GraphResult<_>>()?;

        let extended = node.extended_resources();
        let entity = node.run_entity();
        Ok(NodeSpec {
            id: node.id().to_owned(),
            metadata: node.metadata().clone(),
            upstream_node_ids,
            bindings,
            overrides: NodeOverridesSpec {
                resources: node.resources().cloned().unwrap_or_default(),
                extended_resources: (!extended.is_empty()).then(|| extended.clone()),
            },
            container_image: node.container_image().map(str::to_owned),
            pod_template: node.pod_template().cloned(),
            aliases: node.aliases().to_vec(),
            sub_node_metadata: entity.is_array_map().then(|| entity.sub_node_metadata()),
        })
    }
}
