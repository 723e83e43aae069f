use indexmap::{IndexMap, IndexSet};

use crate::primitives::{Ident, Locator, PackageName};

use super::ancestors::AncestorIndex;
use super::render::pretty_locator;
use super::work::WorkTree;
use super::NodeId;

/// A path of intermediate ancestors between a hoist root and a candidate
/// node, exclusive of both endpoints. Relaying a promotion walks exactly
/// this chain.
pub type NodePath = Vec<NodeId>;

/// One package name's worth of promotable instances found by a single
/// candidate-finder pass.
#[derive(Clone, Debug)]
pub struct HoistCandidateSet {
    pub name: PackageName,
    pub ident: Ident,
    pub weight: usize,
    pub locations: IndexSet<(NodePath, NodeId)>,
}

/// Component C: the Candidate Finder.
///
/// Depth-first starting one level below `root`'s own children — a child
/// already sitting at `root` is never a candidate for itself — skipping peer
/// edges and breaking cycles on re-entry into the current node path. Returns
/// one [`HoistCandidateSet`] per promotable package name.
pub fn find_candidates(
    tree: &mut WorkTree,
    ancestor_index: &AncestorIndex,
    root: NodeId,
    root_path: &IndexSet<Locator>,
    ancestor_dependencies: &IndexMap<PackageName, NodeId>,
    record_reasons: bool,
) -> IndexMap<PackageName, HoistCandidateSet> {
    let mut sets = IndexMap::new();
    let mut explored: IndexSet<Locator> = IndexSet::new();
    let mut ancestors: NodePath = Vec::new();

    // `rootNode`'s own direct children are never themselves registered as
    // candidates for `rootNode` — they are already there, so "promoting"
    // one to its own parent would be a no-op that the finder would keep
    // reporting forever. The search instead starts one level down, at each
    // child's own children, looking for nested duplicates to pull up.
    for child in regular_children(tree, root) {
        let locator = tree.nodes[child].locator.clone();
        if !explored.insert(locator) {
            continue;
        }

        ancestors.push(child);
        for grandchild in regular_children(tree, child) {
            visit(
                tree,
                ancestor_index,
                root,
                root_path,
                ancestor_dependencies,
                &mut ancestors,
                grandchild,
                &mut explored,
                record_reasons,
                &mut sets,
            );
        }
        ancestors.pop();
    }

    sets
}

pub(super) fn regular_children(tree: &WorkTree, node_id: NodeId) -> Vec<NodeId> {
    let node = &tree.nodes[node_id];
    node.dependencies
        .iter()
        .filter(|(name, _)| !node.peer_names.contains(*name))
        .map(|(_, &id)| id)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn visit(
    tree: &mut WorkTree,
    ancestor_index: &AncestorIndex,
    root: NodeId,
    root_path: &IndexSet<Locator>,
    ancestor_dependencies: &IndexMap<PackageName, NodeId>,
    ancestors: &mut NodePath,
    node: NodeId,
    explored: &mut IndexSet<Locator>,
    record_reasons: bool,
    sets: &mut IndexMap<PackageName, HoistCandidateSet>,
) {
    if node == root || ancestors.contains(&node) {
        return;
    }

    try_register(
        tree,
        ancestor_index,
        root,
        root_path,
        ancestor_dependencies,
        ancestors,
        node,
        record_reasons,
        sets,
    );

    let locator = tree.nodes[node].locator.clone();
    if explored.insert(locator) {
        ancestors.push(node);
        for child in regular_children(tree, node) {
            visit(
                tree,
                ancestor_index,
                root,
                root_path,
                ancestor_dependencies,
                ancestors,
                child,
                explored,
                record_reasons,
                sets,
            );
        }
        ancestors.pop();
    }
}

fn record_reason(
    tree: &mut WorkTree,
    parent: NodeId,
    name: &PackageName,
    rejecting_root: NodeId,
    reason: String,
    enabled: bool,
) {
    if !enabled {
        return;
    }
    tree.nodes[parent].reasons.insert(name.clone(), (rejecting_root, reason));
}

fn describe_path(tree: &WorkTree, root_path: &IndexSet<Locator>) -> String {
    let _ = tree;
    root_path.iter().map(pretty_locator).collect::<Vec<_>>().join("→")
}

#[allow(clippy::too_many_arguments)]
fn try_register(
    tree: &mut WorkTree,
    ancestor_index: &AncestorIndex,
    root: NodeId,
    root_path: &IndexSet<Locator>,
    ancestor_dependencies: &IndexMap<PackageName, NodeId>,
    ancestors: &NodePath,
    node: NodeId,
    record_reasons: bool,
    sets: &mut IndexMap<PackageName, HoistCandidateSet>,
) {
    let parent = *ancestors.last().unwrap_or(&root);
    let name = tree.nodes[node].name.clone();
    let ident = tree.nodes[node].ident.clone();
    let path_desc = describe_path(tree, root_path);

    // Predicate 1: not a peer at the root.
    if tree.nodes[root].peer_names.contains(&name) {
        record_reason(
            tree,
            parent,
            &name,
            root,
            format!("- cannot shadow peer: {name} at {path_desc}"),
            record_reasons,
        );
        return;
    }

    // Predicate 2: no identity conflict with the root itself.
    if tree.nodes[root].name == name && tree.nodes[root].ident != ident {
        record_reason(
            tree,
            parent,
            &name,
            root,
            format!("- would conflict with root package {}", tree.nodes[root].locator),
            record_reasons,
        );
        return;
    }

    // Predicate 3: the name is available at the root. The root's original
    // declaration and whatever a previous pass has already committed there
    // both count — once a pass has settled a name on a winning Ident, a
    // differently-identified latecomer found in a later pass must not be
    // allowed to quietly fall off the tree.
    let root_claim = tree.nodes[root]
        .original_dependencies
        .get(&name)
        .or_else(|| tree.nodes[root].dependencies.get(&name));
    if let Some(&existing) = root_claim {
        if tree.nodes[existing].ident != ident {
            record_reason(
                tree,
                parent,
                &name,
                root,
                format!("- filled by: {} at {}", pretty_locator(&tree.nodes[existing].locator), path_desc),
                record_reasons,
            );
            return;
        }
    }
    for &ancestor_id in ancestors.iter() {
        let blocking = tree.nodes[ancestor_id]
            .dependencies
            .get(&name)
            .or_else(|| tree.nodes[ancestor_id].relayed_dependencies.get(&name))
            .copied();

        if let Some(blocking_id) = blocking {
            if tree.nodes[blocking_id].ident != ident {
                record_reason(
                    tree,
                    parent,
                    &name,
                    root,
                    format!(
                        "- filled by {} at {}",
                        pretty_locator(&tree.nodes[blocking_id].locator),
                        pretty_locator(&tree.nodes[ancestor_id].locator),
                    ),
                    record_reasons,
                );
                return;
            }
        }
    }

    // Predicate 4: popularity. A less popular, differently-identified
    // candidate for the same name loses outright.
    let weight = super::ancestors::weight(ancestor_index, &ident);
    if let Some(existing) = sets.get(&name) {
        if existing.ident != ident && weight < existing.weight {
            record_reason(
                tree,
                parent,
                &name,
                root,
                format!("- less popular than the already-selected {} at {}", existing.ident, path_desc),
                record_reasons,
            );
            return;
        }
    }

    // Predicate 5: regular dependencies will still be satisfied after
    // promotion, unless the name is already satisfied at the root (a pure
    // reference merge).
    let already_at_root = tree.nodes[root]
        .dependencies
        .get(&name)
        .is_some_and(|&id| tree.nodes[id].ident == ident);

    if !already_at_root {
        let hoisted: Vec<(PackageName, NodeId)> = tree.nodes[node]
            .hoisted_dependencies
            .iter()
            .filter(|(dep_name, _)| tree.nodes[node].original_dependencies.contains_key(*dep_name))
            .map(|(n, &id)| (n.clone(), id))
            .collect();

        for (dep_name, hoisted_dep_id) in hoisted {
            let hoisted_ident = tree.nodes[hoisted_dep_id].ident.clone();
            let satisfied = ancestor_dependencies
                .get(&dep_name)
                .is_some_and(|&id| tree.nodes[id].ident == hoisted_ident);

            if !satisfied {
                record_reason(
                    tree,
                    parent,
                    &name,
                    root,
                    format!(
                        "- previously hoisted dependency mismatch, needed: {}",
                        pretty_locator(&tree.nodes[hoisted_dep_id].locator),
                    ),
                    record_reasons,
                );
                return;
            }
        }
    }

    // Predicate 6: peer dependencies have already been satisfied by the
    // ancestors between the root and this node.
    let mut required: IndexSet<PackageName> = tree.nodes[node].peer_names.clone();
    for &ancestor_id in ancestors.iter().rev() {
        if required.is_empty() {
            break;
        }

        let mut resolved_here = Vec::new();
        for peer_name in required.iter() {
            if let Some(&dep_id) = tree.nodes[ancestor_id].dependencies.get(peer_name) {
                if tree.nodes[ancestor_id].peer_names.contains(peer_name) {
                    // The ancestor re-declares the name as a peer itself;
                    // keep walking further up.
                    continue;
                }

                record_reason(
                    tree,
                    parent,
                    &name,
                    root,
                    format!(
                        "- peer dependency {} from parent {} was not hoisted to {}",
                        pretty_locator(&tree.nodes[dep_id].locator),
                        pretty_locator(&tree.nodes[ancestor_id].locator),
                        path_desc,
                    ),
                    record_reasons,
                );
                return;
            }

            resolved_here.push(peer_name.clone());
        }

        for resolved in resolved_here {
            required.shift_remove(&resolved);
        }
    }

    // All predicates passed: register this location.
    let location = (ancestors.clone(), node);

    match sets.get_mut(&name) {
        None => {
            let mut locations = IndexSet::new();
            locations.insert(location);
            sets.insert(name.clone(), HoistCandidateSet { name, ident, weight, locations });
        }
        Some(existing) if existing.ident == ident => {
            existing.locations.insert(location);
        }
        Some(existing) if weight > existing.weight => {
            let mut locations = IndexSet::new();
            locations.insert(location);
            *existing = HoistCandidateSet { name, ident, weight, locations };
        }
        Some(_) => {
            // Equal weight, different ident: the first-encountered
            // candidate keeps the name (P5's first-encounter tie-break).
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::hoist::ancestors;
    use crate::hoist::{InputNode, InputTree};

    #[test]
    fn name_already_at_root_blocks_differing_ident() {
        // . -> A@1, C@1 -> A@2: predicate 3 rejects A@2, A@1 is root's own.
        let mut input = InputTree::new(InputNode::new(".", "workspace:."));
        let a1 = input.push(InputNode::new("A", "npm:1.0.0"));
        let c = input.push(InputNode::new("C", "npm:1.0.0"));
        let a2 = input.push(InputNode::new("A", "npm:2.0.0"));
        input.add_dependency(input.root, a1);
        input.add_dependency(input.root, c);
        input.add_dependency(c, a2);

        let mut tree = WorkTree::from_input_tree(&input);
        let ancestor_index = ancestors::build(&tree);
        let root = tree.root;
        let root_path = IndexSet::new();
        let ancestor_dependencies: IndexMap<PackageName, NodeId> =
            tree.nodes[root].dependencies.clone();

        let candidates =
            find_candidates(&mut tree, &ancestor_index, root, &root_path, &ancestor_dependencies, false);

        assert!(!candidates.contains_key(&PackageName::new("A")));
    }

    #[test]
    fn root_sharing_name_with_differing_ident_is_never_a_candidate() {
        // Root itself is "A@1"; a nested "A@2" can never be promoted to it.
        let mut input = InputTree::new(InputNode::new("A", "npm:1.0.0"));
        let c = input.push(InputNode::new("C", "npm:1.0.0"));
        let a2 = input.push(InputNode::new("A", "npm:2.0.0"));
        input.add_dependency(input.root, c);
        input.add_dependency(c, a2);

        let mut tree = WorkTree::from_input_tree(&input);
        let ancestor_index = ancestors::build(&tree);
        let root = tree.root;
        let root_path = IndexSet::new();
        let ancestor_dependencies: IndexMap<PackageName, NodeId> =
            tree.nodes[root].dependencies.clone();

        let candidates =
            find_candidates(&mut tree, &ancestor_index, root, &root_path, &ancestor_dependencies, false);

        assert!(!candidates.contains_key(&PackageName::new("A")));
    }

    #[test]
    fn higher_weight_candidate_replaces_a_lower_weight_one() {
        // . -> A@1 -> L@1, B@1 -> L@1, C@1 -> L@2: L@1 has weight 2, wins.
        let mut input = InputTree::new(InputNode::new(".", "workspace:."));
        let a = input.push(InputNode::new("A", "npm:1.0.0"));
        let b = input.push(InputNode::new("B", "npm:1.0.0"));
        let c = input.push(InputNode::new("C", "npm:1.0.0"));
        let l1a = input.push(InputNode::new("L", "npm:1.0.0"));
        let l1b = input.push(InputNode::new("L", "npm:1.0.0"));
        let l2 = input.push(InputNode::new("L", "npm:2.0.0"));
        input.add_dependency(input.root, a);
        input.add_dependency(input.root, b);
        input.add_dependency(input.root, c);
        input.add_dependency(a, l1a);
        input.add_dependency(b, l1b);
        input.add_dependency(c, l2);

        let mut tree = WorkTree::from_input_tree(&input);
        let ancestor_index = ancestors::build(&tree);
        let root = tree.root;
        let root_path = IndexSet::new();
        let ancestor_dependencies: IndexMap<PackageName, NodeId> = IndexMap::new();

        let candidates =
            find_candidates(&mut tree, &ancestor_index, root, &root_path, &ancestor_dependencies, false);

        let l = candidates.get(&PackageName::new("L")).expect("L should be a candidate");
        assert_eq!(l.weight, 2);
        assert_eq!(l.ident, tree.nodes[l1a].ident);
    }

    #[test]
    fn reasons_are_recorded_only_when_requested() {
        let mut input = InputTree::new(InputNode::new(".", "workspace:."));
        let a1 = input.push(InputNode::new("A", "npm:1.0.0"));
        let c = input.push(InputNode::new("C", "npm:1.0.0"));
        let a2 = input.push(InputNode::new("A", "npm:2.0.0"));
        input.add_dependency(input.root, a1);
        input.add_dependency(input.root, c);
        input.add_dependency(c, a2);

        let mut tree = WorkTree::from_input_tree(&input);
        let ancestor_index = ancestors::build(&tree);
        let root = tree.root;
        let root_path = IndexSet::new();
        let ancestor_dependencies: IndexMap<PackageName, NodeId> =
            tree.nodes[root].dependencies.clone();

        find_candidates(&mut tree, &ancestor_index, root, &root_path, &ancestor_dependencies, false);
        assert!(tree.nodes[c].reasons.is_empty());

        find_candidates(&mut tree, &ancestor_index, root, &root_path, &ancestor_dependencies, true);
        assert!(tree.nodes[c].reasons.contains_key(&PackageName::new("A")));
    }
}
