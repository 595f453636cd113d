//! Canonical Newick emission for expanded trees.
//!
//! The emitter renders children, sorts them lexicographically by their
//! rendered string (subtree included) and joins them, so two trees that
//! differ only in sibling order produce the same output. Numbers use the
//! shortest decimal that round-trips, with a `.0` appended to integral
//! values.

use crate::model::expanded::ExpandedTree;
use crate::model::taxa::TaxonTable;

/// Renders the subtree rooted at `node` as a Newick fragment without a
/// trailing `;`.
///
/// Branch lengths are skipped entirely with `topology_only`; the branch
/// above `node` itself is written only when `include_stem` is set.
pub(crate) fn render_subtree(
    tree: &ExpandedTree,
    taxa: &TaxonTable,
    node: usize,
    topology_only: bool,
    include_stem: bool,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    render(tree, taxa, &mut parts, node, topology_only, include_stem);
    parts.pop().unwrap_or_default()
}

/// Post-order worker: renders `node` onto the top of `parts`.
fn render(
    tree: &ExpandedTree,
    taxa: &TaxonTable,
    parts: &mut Vec<String>,
    node: usize,
    topology_only: bool,
    include_stem: bool,
) {
    let sons = tree.sons(node);
    if sons.is_empty() {
        let label = tree
            .node(node)
            .taxon
            .and_then(|t| taxa.label(t))
            .unwrap_or("");
        parts.push(label.to_string());
    } else {
        for &son in sons {
            render(tree, taxa, parts, son as usize, topology_only, true);
        }

        // canonical order: sort children by their rendered form
        let first = parts.len() - sons.len();
        parts[first..].sort_unstable();

        let mut joined = String::from("(");
        joined.push_str(&parts[first]);
        for part in &parts[first + 1..] {
            joined.push(',');
            joined.push_str(part);
        }
        joined.push(')');

        parts.truncate(first);
        parts.push(joined);
    }

    if !topology_only && include_stem {
        if let Some(branch) = tree.node(node).branch {
            if let Some(tail) = parts.last_mut() {
                tail.push(':');
                tail.push_str(&format_branch(branch));
            }
        }
    }
}

/// Shortest round-trip decimal for a branch length, with `.0` appended to
/// integral values so lengths always read as reals.
fn format_branch(value: f64) -> String {
    let mut s = value.to_string();
    if s.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        s.push_str(".0");
    }
    s
}
