use std::time::Instant;

use indexmap::{IndexMap, IndexSet};

use crate::error::HoistError;
use crate::primitives::{Locator, PackageName};

use super::apply::apply_candidates;
use super::candidates::{find_candidates, regular_children};
use super::check;
use super::input::{InputNode, InputTree};
use super::render::TreeRenderer;
use super::shrink::{shrink, OutputTree};
use super::work::WorkTree;
use super::{ancestors, NodeId};

/// Debug-level thresholds: `>= 0` times the run, `>= 1` runs a final check,
/// `>= 2` records rejection reasons and dumps the tree, `>= 9` checks after
/// every single promotion.
const CHECK_ON_EVERY_PROMOTION: i32 = 9;
const FINAL_CHECK: i32 = 1;
const RECORD_REASONS: i32 = 2;
const TIME_ONLY: i32 = 0;

/// `{check?, debugLevel?}`, resolved against `NM_DEBUG_LEVEL` by
/// [`Hoister::new`] when `debug_level` is left unset.
#[derive(Clone, Copy, Debug, Default)]
pub struct HoistOptions {
    pub check: Option<bool>,
    pub debug_level: Option<i32>,
}

fn resolve_debug_level(explicit: Option<i32>) -> i32 {
    explicit
        .or_else(|| std::env::var("NM_DEBUG_LEVEL").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(-1)
}

/// The builder-style façade over one hoisting run. Operates in place on a
/// caller-owned [`WorkTree`]; the free [`hoist`] function is a thin wrapper
/// that builds the tree, drives a `Hoister`, and shrinks the result.
pub struct Hoister<'a> {
    tree: &'a mut WorkTree,
    check: bool,
    print_logs: bool,
    debug_level: i32,
}

impl<'a> Hoister<'a> {
    pub fn new(tree: &'a mut WorkTree) -> Hoister<'a> {
        let debug_level = resolve_debug_level(None);
        Hoister { tree, check: false, print_logs: false, debug_level }
    }

    pub fn set_check(&mut self, check: bool) -> &mut Self {
        self.check = check;
        self
    }

    pub fn set_print_logs(&mut self, print_logs: bool) -> &mut Self {
        self.print_logs = print_logs;
        self
    }

    pub fn set_debug_level(&mut self, debug_level: i32) -> &mut Self {
        self.debug_level = debug_level;
        self
    }

    /// Runs the candidate-finder/applier fixed point over the whole tree,
    /// recursing into every subtree in turn.
    pub fn hoist(&mut self) -> Result<(), HoistError> {
        let started = Instant::now();
        let ancestor_index = ancestors::build(self.tree);
        let root = self.tree.root;
        let check_enabled = self.check || self.debug_level >= CHECK_ON_EVERY_PROMOTION;
        let record_reasons = self.debug_level >= RECORD_REASONS;

        let mut seen_roots = IndexSet::new();
        let mut ancestor_roots = IndexSet::new();
        hoist_into(
            self.tree,
            &ancestor_index,
            root,
            &mut ancestor_roots,
            IndexMap::new(),
            &mut seen_roots,
            check_enabled,
            record_reasons,
        )?;

        if self.debug_level >= FINAL_CHECK {
            let log = check::check(self.tree, root);
            if !log.is_empty() {
                return Err(HoistError::Inconsistent { check_log: log, dump: TreeRenderer::new(self.tree).render() });
            }
        }

        if self.print_logs && self.debug_level >= RECORD_REASONS {
            log::debug!("{}", TreeRenderer::new(self.tree).render());
        }

        if self.debug_level >= TIME_ONLY {
            log::trace!("hoisting finished in {:?}", started.elapsed());
        }

        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn hoist_into(
    tree: &mut WorkTree,
    ancestor_index: &ancestors::AncestorIndex,
    root: NodeId,
    ancestor_roots: &mut IndexSet<Locator>,
    ancestor_dependencies: IndexMap<PackageName, NodeId>,
    seen_roots: &mut IndexSet<NodeId>,
    check_enabled: bool,
    record_reasons: bool,
) -> Result<(), HoistError> {
    if !seen_roots.insert(root) {
        return Ok(());
    }

    ancestor_roots.insert(tree.nodes[root].locator.clone());
    let mut ancestor_dependencies = ancestor_dependencies;

    loop {
        let candidates = find_candidates(
            tree,
            ancestor_index,
            root,
            ancestor_roots,
            &ancestor_dependencies,
            record_reasons,
        );
        if candidates.is_empty() {
            break;
        }

        apply_candidates(tree, root, &mut ancestor_dependencies, candidates, check_enabled)?;
    }

    let children = regular_children(tree, root);
    for child in children {
        let mut child_ancestor_dependencies = ancestor_dependencies.clone();
        for (name, &dep_id) in &tree.nodes[root].dependencies {
            child_ancestor_dependencies.insert(name.clone(), dep_id);
        }

        let mut child_ancestor_roots = ancestor_roots.clone();
        hoist_into(
            tree,
            ancestor_index,
            child,
            &mut child_ancestor_roots,
            child_ancestor_dependencies,
            seen_roots,
            check_enabled,
            record_reasons,
        )?;
    }

    Ok(())
}

/// `hoist(tree, options) → resultTree`: clone the input, drive a
/// [`Hoister`] to a fixed point, then shrink to the output shape.
pub fn hoist(input: InputTree, options: HoistOptions) -> Result<OutputTree, HoistError> {
    let mut tree = WorkTree::from_input_tree(&input);
    let debug_level = resolve_debug_level(options.debug_level);

    let mut hoister = Hoister::new(&mut tree);
    hoister
        .set_check(options.check.unwrap_or(false))
        .set_debug_level(debug_level)
        .set_print_logs(debug_level >= RECORD_REASONS);
    hoister.hoist()?;

    let root = tree.root;
    Ok(shrink(&tree, root))
}
