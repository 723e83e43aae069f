use indexmap::IndexSet;

use crate::primitives::Locator;

use super::work::WorkTree;
use super::NodeId;

const MAX_NODES_TO_DUMP: usize = 50_000;

/// Renders a [`WorkTree`] as a `yarn why`-like textual dump, for
/// troubleshooting only — never consulted by the algorithm itself.
pub struct TreeRenderer<'a> {
    tree: &'a WorkTree,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(tree: &'a WorkTree) -> TreeRenderer<'a> {
        TreeRenderer { tree }
    }

    pub fn render(&self) -> String {
        let mut node_count = 0;
        let mut parents = IndexSet::new();
        let mut out = String::new();
        out.push_str(&pretty_locator(&self.tree.nodes[self.tree.root].locator));
        out.push('\n');
        self.dump(self.tree.root, &mut parents, "", &mut node_count, &mut out);

        if node_count > MAX_NODES_TO_DUMP {
            out.push_str("\nTree is too large, part of the tree has been dumped.\n");
        }

        out
    }

    fn dump(&self, node_id: NodeId, parents: &mut IndexSet<NodeId>, prefix: &str, node_count: &mut usize, out: &mut String) {
        if *node_count > MAX_NODES_TO_DUMP || parents.contains(&node_id) {
            return;
        }

        *node_count += 1;
        parents.insert(node_id);

        let node = &self.tree.nodes[node_id];
        let children: Vec<NodeId> = node
            .dependencies
            .iter()
            .filter(|(name, _)| !node.peer_names.contains(*name))
            .map(|(_, &id)| id)
            .collect();

        for (idx, &child_id) in children.iter().enumerate() {
            let child = &self.tree.nodes[child_id];
            let is_last = idx + 1 == children.len();
            let connector = if is_last { "└─" } else { "├─" };
            let marker = if parents.contains(&child_id) { ">" } else { "" };
            let reason = node.reasons.get(&child.name).map(|(_, reason)| format!(" {reason}")).unwrap_or_default();

            out.push_str(&format!("{prefix}{connector}{marker}{}{reason}\n", pretty_locator(&child.locator)));

            let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
            self.dump(child_id, parents, &child_prefix, node_count, out);
        }

        parents.shift_remove(&node_id);
    }
}

/// Applies the locator pretty-printing rules: `workspace:.` collapses to
/// `.`, any `npm:` prefix and any portion before a `#` are stripped from the
/// version, and virtual references get a `v:` name prefix.
pub fn pretty_locator(locator: &Locator) -> String {
    let text = locator.as_str();
    let idx = text.find('@').map(|i| i + 1).unwrap_or(0);

    let mut name = text[..idx.saturating_sub(1)].to_string();
    let reference = &text[idx..];

    if reference.is_empty() {
        return name;
    }
    if reference == "workspace:." {
        return ".".to_string();
    }

    let source_version = reference.split('#').nth(1).unwrap_or(reference);
    let version = source_version.replace("npm:", "");

    if reference.starts_with("virtual") {
        name = format!("v:{name}");
    }

    if version.is_empty() {
        name
    } else {
        format!("{name}@{version}")
    }
}
