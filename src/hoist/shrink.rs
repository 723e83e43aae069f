use indexmap::IndexMap;

use crate::primitives::{PackageName, Reference};

use super::work::WorkTree;
use super::NodeId;

/// The public result shape: `{name, references, dependencies}`. Lives in an
/// arena like [`WorkTree`] so that cycles in the input survive as genuine
/// shared handles rather than needing interior mutability to express a
/// cyclic `Rc` graph.
#[derive(Clone, Debug)]
pub struct OutputNode {
    pub name: PackageName,
    pub references: Vec<Reference>,
    pub dependencies: Vec<NodeId>,
}

/// Component E, shrinker half. Projects the (possibly cyclic) working graph
/// down to an [`OutputTree`], memoized by [`WorkNode`](super::work::WorkNode)
/// identity so a node reachable through multiple paths becomes a single
/// shared handle instead of being duplicated.
#[derive(Clone, Debug)]
pub struct OutputTree {
    pub nodes: Vec<OutputNode>,
    pub root: NodeId,
}

pub fn shrink(tree: &WorkTree, root: NodeId) -> OutputTree {
    let mut memo: IndexMap<NodeId, NodeId> = IndexMap::new();
    let mut nodes: Vec<OutputNode> = Vec::new();
    let out_root = visit(tree, root, &mut memo, &mut nodes);
    OutputTree { nodes, root: out_root }
}

fn visit(tree: &WorkTree, node_id: NodeId, memo: &mut IndexMap<NodeId, NodeId>, nodes: &mut Vec<OutputNode>) -> NodeId {
    if let Some(&existing) = memo.get(&node_id) {
        return existing;
    }

    let node = &tree.nodes[node_id];
    let name = node.name.clone();
    let references: Vec<Reference> = node.references.iter().cloned().collect();

    // Reserve the output handle before recursing into children so a cycle
    // back to this node resolves to the handle rather than recursing again.
    let out_id = nodes.len();
    nodes.push(OutputNode { name, references, dependencies: Vec::new() });
    memo.insert(node_id, out_id);

    let child_ids: Vec<NodeId> = node
        .dependencies
        .iter()
        .filter(|(dep_name, _)| !node.peer_names.contains(*dep_name))
        .map(|(_, &id)| id)
        .collect();

    let mut dependencies = Vec::with_capacity(child_ids.len());
    for child_id in child_ids {
        dependencies.push(visit(tree, child_id, memo, nodes));
    }

    nodes[out_id].dependencies = dependencies;
    out_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hoist::{InputNode, InputTree, WorkTree as WT};

    #[test]
    fn cycle_collapses_to_one_shared_node() {
        let mut input = InputTree::new(InputNode::new(".", "workspace:."));
        let a = input.push(InputNode::new("a", "npm:1.0.0"));
        let b = input.push(InputNode::new("b", "npm:1.0.0"));
        input.add_dependency(input.root, a);
        input.add_dependency(a, b);
        input.add_dependency(b, a);

        let tree = WT::from_input_tree(&input);
        let output = shrink(&tree, tree.root);

        assert_eq!(output.nodes.len(), 3);
        let root_out = &output.nodes[output.root];
        let a_out_id = root_out.dependencies[0];
        let b_out_id = output.nodes[a_out_id].dependencies[0];
        assert_eq!(output.nodes[b_out_id].dependencies[0], a_out_id);
    }
}
