use indexmap::{IndexMap, IndexSet};

use crate::primitives::Ident;

use super::work::WorkTree;
use super::NodeId;

/// Component B: the Ancestor Index.
///
/// Maps each package identity to the set of distinct identities that depend
/// on it through a non-peer edge, anywhere in the original (pre-hoist)
/// graph. The cardinality of a node's entry is its popularity **weight** —
/// the candidate finder's predicate 4 uses this to break ties between
/// multiple idents competing for the same package name.
///
/// Built once, right after the Input Cloner runs, from the untouched
/// working graph — never rebuilt mid-hoist, since weight is a property of
/// the *original* graph shape, not of whatever has been hoisted so far.
pub type AncestorIndex = IndexMap<Ident, IndexSet<Ident>>;

pub fn build(tree: &WorkTree) -> AncestorIndex {
    let mut index = AncestorIndex::new();
    let mut seen: IndexSet<NodeId> = IndexSet::new();
    visit(tree, tree.root, &mut index, &mut seen);
    index
}

fn visit(tree: &WorkTree, node_id: NodeId, index: &mut AncestorIndex, seen: &mut IndexSet<NodeId>) {
    if !seen.insert(node_id) {
        return;
    }

    let node = &tree.nodes[node_id];

    for (name, &dep_id) in &node.dependencies {
        if node.peer_names.contains(name) {
            continue;
        }

        let dep = &tree.nodes[dep_id];
        index.entry(dep.ident.clone()).or_default().insert(node.ident.clone());

        visit(tree, dep_id, index, seen);
    }
}

pub fn weight(index: &AncestorIndex, ident: &Ident) -> usize {
    index.get(ident).map_or(0, IndexSet::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hoist::{InputNode, InputTree};

    #[test]
    fn weight_counts_distinct_dependents() {
        let mut input = InputTree::new(InputNode::new(".", "workspace:."));
        let a = input.push(InputNode::new("a", "npm:1.0.0"));
        let b = input.push(InputNode::new("b", "npm:1.0.0"));
        let l = input.push(InputNode::new("l", "npm:1.0.0"));
        input.add_dependency(input.root, a);
        input.add_dependency(input.root, b);
        input.add_dependency(a, l);
        input.add_dependency(b, l);

        let tree = WorkTree::from_input_tree(&input);
        let index = build(&tree);

        assert_eq!(weight(&index, &tree.nodes[l].ident), 2);
        assert_eq!(weight(&index, &tree.nodes[a].ident), 1);
    }

    #[test]
    fn peer_edges_do_not_contribute_to_popularity() {
        let mut input = InputTree::new(InputNode::new(".", "workspace:."));
        let x = input.push(InputNode::new("x", "npm:1.0.0"));
        let p = input.push(InputNode::new("p", "npm:1.0.0"));
        input.add_dependency(input.root, x);
        input.add_peer_dependency(x, p);

        let tree = WorkTree::from_input_tree(&input);
        let index = build(&tree);

        assert_eq!(weight(&index, &tree.nodes[p].ident), 0);
    }
}
