use indexmap::{IndexMap, IndexSet};

use crate::primitives::PackageName;

use super::work::WorkTree;
use super::NodeId;

/// Component E, checker half. Walks the working graph verifying both
/// correctness promises from the data model still hold, returning a
/// multi-line diagnostic (empty string on success).
pub fn check(tree: &WorkTree, root: NodeId) -> String {
    let mut log = String::new();
    let mut stack: IndexSet<NodeId> = IndexSet::new();
    visit(tree, root, &IndexMap::new(), &mut stack, &mut log);
    log
}

fn visit(
    tree: &WorkTree,
    node_id: NodeId,
    visible: &IndexMap<PackageName, NodeId>,
    stack: &mut IndexSet<NodeId>,
    log: &mut String,
) {
    if !stack.insert(node_id) {
        return;
    }

    let node = &tree.nodes[node_id];

    let mut own_visible = visible.clone();
    for (name, &dep_id) in &node.dependencies {
        if !node.peer_names.contains(name) {
            own_visible.insert(name.clone(), dep_id);
        }
    }

    for (name, &declared_id) in &node.original_dependencies {
        if node.peer_names.contains(name) {
            let parent_resolution = visible.get(name).copied();
            let own_resolution = own_visible.get(name).copied();
            if parent_resolution != own_resolution {
                log.push_str(&format!(
                    "broken peer promise: {} expected peer {} to resolve like its parent, but it did not\n",
                    node.locator, name,
                ));
            }
        } else {
            match own_visible.get(name) {
                Some(&resolved_id) if tree.nodes[resolved_id].ident == tree.nodes[declared_id].ident => {}
                Some(&resolved_id) => {
                    log.push_str(&format!(
                        "broken require promise: {} expected {} to resolve to {}, found {}\n",
                        node.locator, name, tree.nodes[declared_id].locator, tree.nodes[resolved_id].locator,
                    ));
                }
                None => {
                    log.push_str(&format!(
                        "broken require promise: {} expected {} to resolve to {}, found nothing\n",
                        node.locator, name, tree.nodes[declared_id].locator,
                    ));
                }
            }
        }
    }

    for &dep_id in node.dependencies.values() {
        visit(tree, dep_id, &own_visible, stack, log);
    }

    stack.shift_remove(&node_id);
}
