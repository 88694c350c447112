use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::exception::{WorkflowException, WorkflowResult};

/// Precedence edge between two task nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagEdge {
    pub from_node_name: String,
    pub to_node_name: String,
}

/// One task node and the edges stored on it. In edges must point at the
/// node itself, out edges must leave from it; the builder rejects anything
/// else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DagNode {
    pub name: String,
    pub skip: bool,
    pub in_edges: Vec<DagEdge>,
    pub out_edges: Vec<DagEdge>,
}

impl DagNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Static dependency graph of one workflow definition version. Several
/// disjoint sub-dags may coexist. Cycle detection is left to upstream
/// validation of the task relations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDag {
    nodes: HashMap<String, DagNode>,
}

impl WorkflowDag {
    pub fn builder() -> WorkflowDagBuilder {
        WorkflowDagBuilder::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> WorkflowResult<&DagNode> {
        self.nodes.get(name).ok_or_else(|| WorkflowException::NoSuchNode {
            name: name.to_owned(),
        })
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_skip(&self, name: &str) -> WorkflowResult<bool> {
        Ok(self.node(name)?.skip)
    }

    /// Names of the direct predecessors of `name`.
    pub fn predecessors(&self, name: &str) -> WorkflowResult<Vec<&str>> {
        Ok(self.node(name)?.in_edges.iter().map(|e| e.from_node_name.as_str()).collect())
    }

    /// Names of the direct successors of `name`.
    pub fn successors(&self, name: &str) -> WorkflowResult<Vec<&str>> {
        Ok(self.node(name)?.out_edges.iter().map(|e| e.to_node_name.as_str()).collect())
    }

    /// Nodes without predecessors, the default entry set of a full run.
    pub fn entry_nodes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .nodes
            .values()
            .filter(|n| n.in_edges.is_empty())
            .map(|n| n.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Default)]
pub struct WorkflowDagBuilder {
    nodes: Vec<DagNode>,
    edges: Vec<DagEdge>,
}

impl WorkflowDagBuilder {
    /// Add a node, possibly already carrying stored in/out edges.
    pub fn add_node(mut self, node: DagNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add an edge; it is attached to both endpoint nodes at build time.
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(DagEdge {
            from_node_name: from.into(),
            to_node_name: to.into(),
        });
        self
    }

    pub fn build(self) -> WorkflowResult<WorkflowDag> {
        let mut nodes: HashMap<String, DagNode> = HashMap::with_capacity(self.nodes.len());
        for node in self.nodes {
            if node.name.is_empty() {
                return Err(WorkflowException::EmptyNodeName);
            }
            for edge in &node.in_edges {
                if edge.to_node_name != node.name {
                    return Err(WorkflowException::InEdgeMismatch {
                        name: node.name.clone(),
                        to_node_name: edge.to_node_name.clone(),
                    });
                }
            }
            for edge in &node.out_edges {
                if edge.from_node_name != node.name {
                    return Err(WorkflowException::OutEdgeMismatch {
                        name: node.name.clone(),
                        from_node_name: edge.from_node_name.clone(),
                    });
                }
            }
            if nodes.contains_key(&node.name) {
                return Err(WorkflowException::DuplicatedNodeName { name: node.name });
            }
            nodes.insert(node.name.clone(), node);
        }

        for edge in self.edges {
            match nodes.get_mut(&edge.to_node_name) {
                Some(node) => node.in_edges.push(edge.clone()),
                None => {
                    return Err(WorkflowException::NoSuchNode {
                        name: edge.to_node_name,
                    })
                }
            }
            match nodes.get_mut(&edge.from_node_name) {
                Some(node) => node.out_edges.push(edge),
                None => {
                    return Err(WorkflowException::NoSuchNode {
                        name: edge.from_node_name,
                    })
                }
            }
        }

        Ok(WorkflowDag { nodes })
    }
}
