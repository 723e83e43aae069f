use indexmap::IndexSet;

use crate::primitives::{PackageName, Reference};

use super::NodeId;

/// A single package instance in the caller's source graph.
///
/// `dependencies` may form cycles; the engine never assumes the graph is a
/// tree.
#[derive(Clone, Debug)]
pub struct InputNode {
    pub name: PackageName,
    pub reference: Reference,
    pub dependencies: IndexSet<NodeId>,
    pub peer_names: IndexSet<PackageName>,
}

impl InputNode {
    pub fn new(name: impl Into<PackageName>, reference: impl Into<Reference>) -> InputNode {
        InputNode {
            name: name.into(),
            reference: reference.into(),
            dependencies: IndexSet::new(),
            peer_names: IndexSet::new(),
        }
    }
}

/// The caller's dependency graph, as an arena of [`InputNode`]s.
///
/// By convention the root carries the name `.`, but the engine does not
/// interpret the name or reference of the root — only its dependencies.
#[derive(Clone, Debug)]
pub struct InputTree {
    pub nodes: Vec<InputNode>,
    pub root: NodeId,
}

impl InputTree {
    pub fn new(root: InputNode) -> InputTree {
        InputTree {
            nodes: vec![root],
            root: 0,
        }
    }

    /// Adds a node to the arena and returns its handle.
    pub fn push(&mut self, node: InputNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_dependency(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].dependencies.insert(child);
    }

    pub fn add_peer_dependency(&mut self, parent: NodeId, child: NodeId) {
        let name = self.nodes[child].name.clone();
        self.nodes[parent].dependencies.insert(child);
        self.nodes[parent].peer_names.insert(name);
    }
}
