//! On-demand expansion of a compact tree into a navigable node array.
//!
//! The expander inverts the encoder: given the topology and heights
//! vectors of a [TreeRep] it rebuilds every node with parent, children,
//! branch length and height. The reconstruction is a divide-and-conquer
//! split on the heights vector: the maximum of a range is the height of
//! the range's root, and the positions attaining it are the boundaries
//! between the root's children.

use crate::model::taxa::TaxonId;
use crate::model::tree_rep::TreeRep;

/// Height-comparison tolerance for detecting multifurcation ties.
const EPSILON: f64 = f64::EPSILON;

/// One reconstructed node.
///
/// `height` is `NaN` on cladogram nodes, where heights are ordinal rather
/// than metric; accessors surface that as "undefined".
#[derive(Debug, Clone)]
pub struct ExpandedNode {
    /// Taxon id for tips, `None` for internal nodes
    pub taxon: Option<TaxonId>,
    /// Start of this node's children in the shared block
    sons_start: u32,
    /// Number of children
    sons_len: u32,
    /// Length of the branch above this node
    pub branch: Option<f64>,
    /// Height of this node above the base level
    pub height: f64,
    /// Index of the parent node, `None` for the root
    pub parent: Option<usize>,
    /// Index into the representation's attribute slots
    pub(crate) attr_slot: usize,
}

/// A fully expanded tree: nodes in post-order (leaves before their
/// ancestors, root last) with one contiguous child-index block.
///
/// Expansion never reallocates per node: all child indices live in a
/// single buffer of size `2N`, which bounds the total child count of any
/// rooted tree on `N` tips.
#[derive(Debug, Clone)]
pub struct ExpandedTree {
    nodes: Vec<ExpandedNode>,
    sons_block: Box<[u32]>,
    cladogram: bool,
}

impl ExpandedTree {
    /// Reconstructs the node array of `rep`.
    pub(crate) fn from_rep(rep: &TreeRep) -> ExpandedTree {
        let topology = rep.topology();
        let n_taxa = topology.len();
        let heights = rep.heights();
        let tip_heights = rep
            .tip_heights()
            .unwrap_or_else(|| vec![0.0; n_taxa]);

        let mut tree = ExpandedTree {
            nodes: Vec::with_capacity(2 * n_taxa - 1),
            sons_block: vec![0u32; 2 * n_taxa].into_boxed_slice(),
            cladogram: rep.is_cladogram(),
        };

        let mut cursor = 0usize;
        expand_range(
            &mut tree,
            0,
            heights.len(),
            &topology,
            &tip_heights,
            &heights,
            &mut cursor,
        );

        if tree.cladogram {
            // cladogram heights are ordinal, not metric
            for node in &mut tree.nodes {
                node.branch = None;
                node.height = f64::NAN;
            }
        }

        tree
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the root node (always the last one).
    pub fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns `true` if this expansion came from a cladogram.
    pub fn is_cladogram(&self) -> bool {
        self.cladogram
    }

    /// The node at `id`.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    pub fn node(&self, id: usize) -> &ExpandedNode {
        &self.nodes[id]
    }

    /// Child indices of the node at `id`, left to right.
    pub fn sons(&self, id: usize) -> &[u32] {
        let node = &self.nodes[id];
        let start = node.sons_start as usize;
        &self.sons_block[start..start + node.sons_len as usize]
    }

    /// Collects node ids of the subtree under `root` into `out`, pre- or
    /// post-order, including tips only when `include_tips`.
    pub(crate) fn order_ids(
        &self,
        pre_order: bool,
        root: usize,
        include_tips: bool,
        out: &mut Vec<usize>,
    ) {
        let mut stack = vec![(root, false)];
        while let Some((id, visited)) = stack.pop() {
            let sons = self.sons(id);
            if sons.is_empty() {
                if include_tips {
                    out.push(id);
                }
            } else if pre_order {
                out.push(id);
                for &son in sons.iter().rev() {
                    stack.push((son as usize, false));
                }
            } else if visited {
                out.push(id);
            } else {
                stack.push((id, true));
                for &son in sons.iter().rev() {
                    stack.push((son as usize, false));
                }
            }
        }
    }

    /// Sets the branch above `id` to `new_len` and cascades the height
    /// adjustment: the whole subtree shifts by the length difference, and
    /// if that pushes any node below the base level the entire tree is
    /// re-baselined so the minimum height is 0 again.
    pub(crate) fn set_branch(&mut self, id: usize, new_len: f64) {
        let old = self.nodes[id].branch.unwrap_or(0.0);
        self.nodes[id].branch = Some(new_len);

        let dif = new_len - old;
        if dif == 0.0 {
            return;
        }

        let mut subtree = Vec::new();
        self.order_ids(false, id, true, &mut subtree);

        let mut min_height = f64::MAX;
        for &k in &subtree {
            let node = &mut self.nodes[k];
            if !node.height.is_nan() {
                node.height -= dif;
                min_height = min_height.min(node.height);
            }
        }

        if min_height < 0.0 {
            for node in &mut self.nodes {
                if !node.height.is_nan() {
                    node.height -= min_height;
                }
            }
        }
    }
}

/// Builds the subtree covering tips `low..=hi` (`heights[low..hi]` being
/// the LCA heights inside the range) and returns the index of its root.
///
/// The children of the range's root are the subranges delimited by the
/// positions holding the range maximum; equal maxima (within tolerance)
/// therefore reproduce multifurcations in the original left-to-right
/// order.
#[allow(clippy::too_many_arguments)]
fn expand_range(
    tree: &mut ExpandedTree,
    low: usize,
    hi: usize,
    topology: &[TaxonId],
    tip_heights: &[f64],
    heights: &[f64],
    cursor: &mut usize,
) -> usize {
    if low == hi {
        tree.nodes.push(ExpandedNode {
            taxon: Some(topology[low]),
            sons_start: 0,
            sons_len: 0,
            branch: None,
            height: tip_heights[low],
            parent: None,
            attr_slot: low,
        });
        return tree.nodes.len() - 1;
    }

    let mut max_height = -1.0f64;
    let mut splits: Vec<usize> = Vec::new();
    for (k, &h) in heights.iter().enumerate().take(hi).skip(low) {
        if h > max_height + EPSILON {
            max_height = h;
            splits.clear();
            splits.push(k);
        } else if h >= max_height - EPSILON {
            splits.push(k);
        }
    }

    let n_sons = splits.len() + 1;
    let sons_start = *cursor;
    *cursor += n_sons;
    debug_assert!(*cursor <= tree.sons_block.len());

    let attr_slot = splits[0] + topology.len();

    let mut slot = sons_start;
    let mut son_low = low;
    for &bound in splits.iter().chain(std::iter::once(&hi)) {
        let son = expand_range(tree, son_low, bound, topology, tip_heights, heights, cursor);
        let son_height = tree.nodes[son].height;
        tree.nodes[son].branch = Some(max_height - son_height);
        tree.sons_block[slot] = son as u32;
        slot += 1;
        son_low = bound + 1;
    }

    let index = tree.nodes.len();
    for s in sons_start..slot {
        let son = tree.sons_block[s] as usize;
        tree.nodes[son].parent = Some(index);
    }

    tree.nodes.push(ExpandedNode {
        taxon: None,
        sons_start: sons_start as u32,
        sons_len: n_sons as u32,
        branch: None,
        height: max_height,
        parent: None,
        attr_slot,
    });

    index
}
