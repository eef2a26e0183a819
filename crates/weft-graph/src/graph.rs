//! Workflow graph owning all nodes.

use std::collections::HashSet;
use std::ops::Shr;
use std::sync::Arc;

use petgraph::algo::{has_path_connecting, is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::TRACING_TARGET;
use crate::dnsify::dnsify;
use crate::entity::RunEntity;
use crate::error::{GraphError, GraphResult};
use crate::node::{Binding, Node, NodeHandle, Overrides};
use crate::promise::Promise;

/// Arena of nodes with dependency edges.
///
/// Edges point from upstream to downstream nodes. Handles stay valid for
/// the lifetime of the graph since nodes are never removed.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    graph: DiGraph<Node, ()>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Adds a node with a generated `n<k>` id.
    ///
    /// `k` starts at the node count and skips ids already taken by
    /// author-assigned nodes.
    pub fn add_node(
        &mut self,
        run_entity: Arc<RunEntity>,
        bindings: Vec<Binding>,
    ) -> GraphResult<NodeHandle> {
        let id = (self.graph.node_count()..)
            .map(|k| format!("n{k}"))
            .find(|id| !self.contains_id(id))
            .ok_or_else(|| GraphError::invalid_value("no free generated node id"))?;
        self.insert(id, run_entity, bindings)
    }

    fn contains_id(&self, id: &str) -> bool {
        self.nodes().any(|node| node.id() == id)
    }

    /// Adds a node with an author-assigned id, converted to a DNS label.
    pub fn add_node_with_id(
        &mut self,
        id: &str,
        run_entity: Arc<RunEntity>,
        bindings: Vec<Binding>,
    ) -> GraphResult<NodeHandle> {
        let label = dnsify(id);
        if label.is_empty() {
            return Err(GraphError::invalid_value(format!(
                "`{id}` has no characters usable in a node id"
            )));
        }
        if self.contains_id(&label) {
            return Err(GraphError::DuplicateNodeId(label));
        }
        self.insert(label, run_entity, bindings)
    }

    fn insert(
        &mut self,
        id: String,
        run_entity: Arc<RunEntity>,
        bindings: Vec<Binding>,
    ) -> GraphResult<NodeHandle> {
        let handle = NodeHandle::new(self.graph.node_count());
        let node = Node::new(handle, id, run_entity, bindings);
        for upstream in node.upstream_nodes() {
            self.check(*upstream)?;
        }

        let upstream = node.upstream_nodes().to_vec();
        let index = self.graph.add_node(node);
        for from in upstream {
            self.graph.add_edge(NodeIndex::new(from.index()), index, ());
        }

        tracing::debug!(
            target: TRACING_TARGET,
            handle = %handle,
            node_id = %self.graph[index].id(),
            "Added node"
        );
        Ok(handle)
    }

    fn check(&self, handle: NodeHandle) -> GraphResult<NodeIndex> {
        let index = NodeIndex::new(handle.index());
        if self.graph.node_weight(index).is_none() {
            return Err(GraphError::NodeNotFound(handle));
        }
        Ok(index)
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.graph.node_weight(NodeIndex::new(handle.index()))
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.graph.node_weight_mut(NodeIndex::new(handle.index()))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// A deferred reference to output `var` of `handle`.
    pub fn output(&self, handle: NodeHandle, var: impl Into<String>) -> GraphResult<Promise> {
        self.check(handle)?;
        Ok(Promise::new(handle, var))
    }

    /// Overrides the node at `handle`; see [`Node::with_overrides`].
    pub fn with_overrides(&mut self, handle: NodeHandle, overrides: Overrides) -> GraphResult<()> {
        let node = self.node_mut(handle).ok_or(GraphError::NodeNotFound(handle))?;
        node.with_overrides(overrides)?;
        Ok(())
    }

    /// Makes `before` an upstream dependency of `after`.
    ///
    /// Only the downstream node's upstream list changes, and a repeated call
    /// is a no-op. Edges that would close a cycle are rejected.
    pub fn runs_before(&mut self, before: NodeHandle, after: NodeHandle) -> GraphResult<()> {
        let from = self.check(before)?;
        let to = self.check(after)?;

        if self.graph[to].upstream_nodes().contains(&before) {
            return Ok(());
        }
        if from == to || has_path_connecting(&self.graph, to, from, None) {
            return Err(GraphError::Cycle {
                from: self.graph[from].id().to_owned(),
                to: self.graph[to].id().to_owned(),
            });
        }

        self.graph[to].add_upstream(before);
        self.graph.add_edge(from, to, ());
        tracing::debug!(
            target: TRACING_TARGET,
            before = %self.graph[from].id(),
            after = %self.graph[to].id(),
            "Added node dependency"
        );
        Ok(())
    }

    /// Cursor on `handle` supporting `graph.at(a) >> b` chains.
    pub fn at(&mut self, handle: NodeHandle) -> NodeRef<'_> {
        NodeRef {
            graph: self,
            handle,
        }
    }

    /// Handles ordered so that every node follows its upstream nodes.
    pub fn topological_order(&self) -> GraphResult<Vec<NodeHandle>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let id = self.graph[cycle.node_id()].id().to_owned();
            GraphError::Cycle {
                from: id.clone(),
                to: id,
            }
        })?;
        Ok(order
            .into_iter()
            .map(|index| NodeHandle::new(index.index()))
            .collect())
    }

    /// Checks that node ids are unique and the graph is acyclic.
    ///
    /// Ids can collide after `node_name` overrides, so this runs again
    /// before serialization.
    pub fn validate(&self) -> GraphResult<()> {
        let mut seen = HashSet::new();
        for node in self.nodes() {
            if !seen.insert(node.id()) {
                return Err(GraphError::DuplicateNodeId(node.id().to_owned()));
            }
        }
        if is_cyclic_directed(&self.graph) {
            return Err(GraphError::invalid_value("the workflow graph contains a cycle"));
        }
        Ok(())
    }
}

/// A node of a graph, borrowed for dependency chaining.
#[derive(Debug)]
pub struct NodeRef<'g> {
    graph: &'g mut WorkflowGraph,
    handle: NodeHandle,
}

impl<'g> NodeRef<'g> {
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Makes this node run before `other` and moves the cursor to `other`.
    pub fn runs_before(self, other: NodeHandle) -> GraphResult<NodeRef<'g>> {
        self.graph.runs_before(self.handle, other)?;
        Ok(NodeRef {
            graph: self.graph,
            handle: other,
        })
    }
}

impl<'g> Shr<NodeHandle> for NodeRef<'g> {
    type Output = GraphResult<NodeRef<'g>>;

    fn shr(self, other: NodeHandle) -> Self::Output {
        self.runs_before(other)
    }
}
