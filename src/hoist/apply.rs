use indexmap::IndexMap;

use crate::error::HoistError;
use crate::primitives::PackageName;

use super::candidates::{HoistCandidateSet, NodePath};
use super::check;
use super::render::TreeRenderer;
use super::work::WorkTree;
use super::NodeId;

/// The Hoist Applier.
///
/// Applies every location of every candidate returned by one Candidate
/// Finder pass, cloning intermediate ancestors lazily (the CloneTree) so
/// subtrees the batch doesn't touch stay shared and unaffected.
pub fn apply_candidates(
    tree: &mut WorkTree,
    root: NodeId,
    ancestor_dependencies: &mut IndexMap<PackageName, NodeId>,
    candidates: IndexMap<PackageName, HoistCandidateSet>,
    check: bool,
) -> Result<usize, HoistError> {
    let mut clone_map: IndexMap<NodeId, NodeId> = IndexMap::new();
    let mut applied = 0;

    for (_, candidate) in candidates {
        for (node_path, node_id) in candidate.locations {
            apply_one(tree, root, ancestor_dependencies, &node_path, node_id, &mut clone_map)?;
            applied += 1;

            if check {
                run_check(tree)?;
            }
        }
    }

    Ok(applied)
}

fn apply_one(
    tree: &mut WorkTree,
    root: NodeId,
    ancestor_dependencies: &mut IndexMap<PackageName, NodeId>,
    node_path: &NodePath,
    node_id: NodeId,
    clone_map: &mut IndexMap<NodeId, NodeId>,
) -> Result<(), HoistError> {
    let name = tree.nodes[node_id].name.clone();

    // Step 1 + 2: walk/clone the intermediate chain, dropping a
    // relayed-dependency breadcrumb on every intermediate along the way.
    let mut parent = root;
    for &ancestor in node_path.iter() {
        let clone_id = match clone_map.get(&ancestor) {
            Some(&id) => id,
            None => {
                let id = tree.clone_node(ancestor);
                clone_map.insert(ancestor, id);
                id
            }
        };

        let ancestor_name = tree.nodes[ancestor].name.clone();
        tree.nodes[parent].dependencies.insert(ancestor_name, clone_id);
        tree.nodes[clone_id].relayed_dependencies.insert(name.clone(), node_id);

        parent = clone_id;
    }

    // Step 3: the terminal intermediate loses its direct edge to the node.
    tree.nodes[parent].dependencies.shift_remove(&name);
    tree.nodes[parent].reasons.shift_remove(&name);

    // Step 4: splice the node in at the root, merging References if a
    // matching instance is already there instead of overwriting it.
    match tree.nodes[root].dependencies.get(&name).copied() {
        Some(existing_id) if existing_id != node_id => {
            if tree.nodes[existing_id].ident == tree.nodes[node_id].ident {
                let merged: Vec<_> = tree.nodes[node_id].references.iter().cloned().collect();
                tree.nodes[existing_id].references.extend(merged);
            }
            // Identity conflict at the root is forbidden by predicate 2;
            // the finder should never have produced this location.
        }
        _ => {
            tree.nodes[root].dependencies.insert(name.clone(), node_id);
            ancestor_dependencies.insert(name, node_id);
            record_hoisted_dependencies(tree, node_id);
        }
    }

    Ok(())
}

/// The first time a node is promoted, snapshot its own regular
/// dependencies into `hoisted_dependencies`: the promise predicate 5
/// re-checks on any later attempt to promote the same node even further.
/// A node promoted more than once keeps its first snapshot.
fn record_hoisted_dependencies(tree: &mut WorkTree, node_id: NodeId) {
    let node = &tree.nodes[node_id];
    if !node.hoisted_dependencies.is_empty() {
        return;
    }

    let snapshot: Vec<(PackageName, NodeId)> = node
        .dependencies
        .iter()
        .filter(|(dep_name, _)| !node.peer_names.contains(*dep_name))
        .map(|(n, &id)| (n.clone(), id))
        .collect();

    tree.nodes[node_id].hoisted_dependencies.extend(snapshot);
}

fn run_check(tree: &WorkTree) -> Result<(), HoistError> {
    let log = check::check(tree, tree.root);
    if log.is_empty() {
        Ok(())
    } else {
        Err(HoistError::Inconsistent { check_log: log, dump: TreeRenderer::new(tree).render() })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexSet;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::hoist::candidates::find_candidates;
    use crate::hoist::{ancestors, InputNode, InputTree};

    #[test]
    fn applying_a_candidate_leaves_an_unrelated_sibling_intermediate_untouched() {
        // . -> A@1 -> M@1 -> B@1
        //   -> C@1 -> M@1 (shared) -> B@1
        // Hoisting B to root must clone M (to drop its B edge) without
        // touching the other subtree that still shares the same M instance.
        let mut input = InputTree::new(InputNode::new(".", "workspace:."));
        let a = input.push(InputNode::new("A", "npm:1.0.0"));
        let c = input.push(InputNode::new("C", "npm:1.0.0"));
        let m = input.push(InputNode::new("M", "npm:1.0.0"));
        let b = input.push(InputNode::new("B", "npm:1.0.0"));
        input.add_dependency(input.root, a);
        input.add_dependency(input.root, c);
        input.add_dependency(a, m);
        input.add_dependency(c, m);
        input.add_dependency(m, b);

        let mut tree = WorkTree::from_input_tree(&input);
        let ancestor_index = ancestors::build(&tree);
        let root = tree.root;
        let root_path = IndexSet::new();
        let mut ancestor_dependencies = tree.nodes[root].dependencies.clone();

        // The finder/applier pair only reaches a fixed point once it is
        // driven to convergence — a single pass can leave a just-promoted
        // node's own nested duplicate unresolved until the next find.
        loop {
            let candidates =
                find_candidates(&mut tree, &ancestor_index, root, &root_path, &ancestor_dependencies, false);
            if candidates.is_empty() {
                break;
            }
            apply_candidates(&mut tree, root, &mut ancestor_dependencies, candidates, true).unwrap();
        }

        let b_name = PackageName::new("B");
        let m_name = PackageName::new("M");
        assert!(tree.nodes[root].dependencies.contains_key(&b_name));
        assert!(tree.nodes[root].dependencies.contains_key(&m_name));

        // A and C each keep their own (cloned) intermediate, but neither
        // retains a nested M or B of its own — both now resolve through root.
        let a_now = tree.nodes[root].dependencies[&PackageName::new("A")];
        let c_now = tree.nodes[root].dependencies[&PackageName::new("C")];
        assert!(!tree.nodes[a_now].dependencies.contains_key(&m_name));
        assert!(!tree.nodes[c_now].dependencies.contains_key(&m_name));

        let root_m = tree.nodes[root].dependencies[&m_name];
        assert!(!tree.nodes[root_m].dependencies.contains_key(&b_name));
    }

    #[test]
    fn promoting_a_duplicate_instance_merges_references_instead_of_overwriting() {
        // . -> A@1, C@1 -> A@1 (same ident, reached through a virtual
        // reference) — the second copy's reference is merged into root's
        // A instead of replacing it.
        let mut input = InputTree::new(InputNode::new(".", "workspace:."));
        let a1 = input.push(InputNode::new("A", "npm:1.0.0"));
        let c = input.push(InputNode::new("C", "npm:1.0.0"));
        let a1_virtual = input.push(InputNode::new("A", "virtual:deadbeef#npm:1.0.0"));
        input.add_dependency(input.root, a1);
        input.add_dependency(input.root, c);
        input.add_dependency(c, a1_virtual);

        let mut tree = WorkTree::from_input_tree(&input);
        let ancestor_index = ancestors::build(&tree);
        let root = tree.root;
        let root_path = IndexSet::new();
        let mut ancestor_dependencies = tree.nodes[root].dependencies.clone();

        let candidates =
            find_candidates(&mut tree, &ancestor_index, root, &root_path, &ancestor_dependencies, false);
        apply_candidates(&mut tree, root, &mut ancestor_dependencies, candidates, true).unwrap();

        let root_a = tree.nodes[root].dependencies[&PackageName::new("A")];
        assert_eq!(root_a, a1);
        assert!(tree.nodes[a1].references.contains(&tree.nodes[a1_virtual].references[0]));
        assert!(!tree.nodes[c].dependencies.contains_key(&PackageName::new("A")));
    }
}
