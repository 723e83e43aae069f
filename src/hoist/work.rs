use indexmap::{IndexMap, IndexSet};

use crate::primitives::{Ident, Locator, PackageName, Reference};

use super::input::InputTree;
use super::NodeId;

/// The mutable working graph the hoisting passes operate on.
///
/// Created once from an [`InputTree`] by [`WorkTree::from_input_tree`]
/// (component A, the Input Cloner) and then rewired in place by the
/// candidate finder and hoist applier (components C and D).
#[derive(Clone, Debug)]
pub struct WorkNode {
    pub name: PackageName,
    pub ident: Ident,
    pub locator: Locator,

    /// References that have been merged into this node by the applier when
    /// a promoted node turns out to already exist at a hoist target.
    pub references: IndexSet<Reference>,

    /// The dependencies currently visible from this node.
    pub dependencies: IndexMap<PackageName, NodeId>,

    /// The dependencies the input graph declared for this node. Never
    /// mutated after [`WorkTree::from_input_tree`] runs; used by the
    /// self-checker and by the candidate finder's predicate 5.
    pub original_dependencies: IndexMap<PackageName, NodeId>,

    /// What a previous hoist pass, at some ancestor root, promised this
    /// node it would find at that ancestor. Consulted by predicate 5 to
    /// make sure a later promotion doesn't retroactively break the promise.
    pub hoisted_dependencies: IndexMap<PackageName, NodeId>,

    /// Breadcrumbs left on intermediate nodes by the applier: "this name
    /// was promoted past me". Consulted by predicate 3 on later passes.
    pub relayed_dependencies: IndexMap<PackageName, NodeId>,

    /// The subset of `original_dependencies`'s keys that are peer
    /// dependencies.
    pub peer_names: IndexSet<PackageName>,

    /// Diagnostic: why a rejected dependency name could not be hoisted,
    /// keyed by name, carrying the root that rejected it.
    pub reasons: IndexMap<PackageName, (NodeId, String)>,
}

impl WorkNode {
    fn new(name: PackageName, reference: Reference) -> WorkNode {
        let ident = Ident::new(&name, &reference);
        let locator = Locator::new(&name, &reference);
        let mut references = IndexSet::new();
        references.insert(reference);

        WorkNode {
            name,
            ident,
            locator,
            references,
            dependencies: IndexMap::new(),
            original_dependencies: IndexMap::new(),
            hoisted_dependencies: IndexMap::new(),
            relayed_dependencies: IndexMap::new(),
            peer_names: IndexSet::new(),
            reasons: IndexMap::new(),
        }
    }

    /// Shallow-clones this node: all six maps/sets are copied by value,
    /// identity fields are unchanged. Used by the applier when an
    /// intermediate ancestor needs a divergent view.
    pub(super) fn shallow_clone(&self) -> WorkNode {
        self.clone()
    }
}

#[derive(Clone, Debug)]
pub struct WorkTree {
    pub nodes: Vec<WorkNode>,
    pub root: NodeId,
}

impl WorkTree {
    /// Component A: the Input Cloner.
    ///
    /// A depth-first traversal keyed by input-node identity: the first
    /// visit creates a [`WorkNode`], subsequent visits reuse it, so input
    /// cycles are preserved rather than expanded. The traversal itself uses
    /// an explicit work-stack instead of native recursion, so that a
    /// pathologically deep (but finite) input chain cannot overflow the
    /// call stack before the engine has even started hoisting.
    pub fn from_input_tree(input: &InputTree) -> WorkTree {
        let mut memo: Vec<Option<NodeId>> = vec![None; input.nodes.len()];
        let mut nodes: Vec<WorkNode> = Vec::with_capacity(input.nodes.len());

        let mut stack = vec![input.root];
        while let Some(input_id) = stack.pop() {
            if memo[input_id].is_some() {
                continue;
            }

            let input_node = &input.nodes[input_id];
            let work_id = nodes.len();
            memo[input_id] = Some(work_id);

            nodes.push(WorkNode::new(input_node.name.clone(), input_node.reference.clone()));

            for &dep in &input_node.dependencies {
                if memo[dep].is_none() {
                    stack.push(dep);
                }
            }
        }

        for (input_id, slot) in memo.iter().enumerate() {
            let Some(work_id) = *slot else { continue };
            let input_node = &input.nodes[input_id];

            let mut dependencies = IndexMap::new();
            for &dep_input_id in &input_node.dependencies {
                let dep_work_id = memo[dep_input_id]
                    .expect("every declared dependency of a reached node is itself reached");
                dependencies.insert(input.nodes[dep_input_id].name.clone(), dep_work_id);
            }

            nodes[work_id].original_dependencies = dependencies.clone();
            nodes[work_id].dependencies = dependencies;
            nodes[work_id].peer_names = input_node.peer_names.clone();
        }

        let root = memo[input.root].expect("the root is always reached");
        WorkTree { nodes, root }
    }

    /// Appends a shallow clone of `node_id` to the arena and returns its
    /// new handle. Used by the hoist applier's CloneTree mechanism and
    /// exercised directly in tests.
    pub(super) fn clone_node(&mut self, node_id: NodeId) -> NodeId {
        let clone = self.nodes[node_id].shallow_clone();
        self.nodes.push(clone);
        self.nodes.len() - 1
    }
}
