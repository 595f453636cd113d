//! Encodes a parsed node list into the compact [TreeRep] form.
//!
//! The encoder runs a single pass over the post-order node list. Working
//! bottom-up it derives every internal node's height from the branch
//! lengths below it, converts non-contemporaneous tips into per-tip
//! offsets, and lays the heights out in the adjacent-tip-LCA order the
//! [expander](crate::model::expanded) inverts.

use crate::model::packer::{bits_for, IntPacker};
use crate::model::parsed_node::{Attributes, ParsedNode};
use crate::model::taxa::{TaxonId, TaxonTable};
use crate::model::tree_rep::{RepBase, TreeRep};
use crate::model::trees_set::Precision;

/// Encodes one parsed tree, interning its taxa into `taxa`.
///
/// The tree is classified as a cladogram iff no parsed node carries a
/// branch length. Tips (and non-root internal nodes) missing a branch
/// length in a phylogram default to length 1, so mixed inputs still
/// encode.
///
/// With `compressed`, the topology and cladogram heights are bit-packed
/// at the smallest width that fits the tree's largest value; phylogram
/// heights are always stored verbatim at `precision`.
pub(crate) fn encode(
    mut nodes: Vec<ParsedNode>,
    taxa: &mut TaxonTable,
    compressed: bool,
    precision: Precision,
) -> TreeRep {
    let n_nodes = nodes.len();

    // Classify and collect the tip sequence.
    let mut topology: Vec<TaxonId> = Vec::new();
    let mut max_taxon: TaxonId = 0;
    let mut cladogram = true;
    let mut has_attributes = false;

    for node in &nodes {
        if node.is_leaf() {
            let id = taxa.intern(node.taxon.as_deref().unwrap_or(""));
            max_taxon = max_taxon.max(id);
            topology.push(id);
        }
        if node.branch.is_some() {
            cladogram = false;
        }
        if node.attributes.is_some() {
            has_attributes = true;
        }
    }

    let n_taxa = topology.len();

    // Heights of internal nodes, one between each adjacent tip pair.
    let mut heights = vec![0.0f64; n_taxa.saturating_sub(1)];
    // If nodes[i] is a tip, locs[i]+1 is its ordinal in the tip sequence.
    // For internal nodes, locs[i] is the ordinal of the node's rightmost
    // heights slot.
    let mut locs = vec![0isize; n_nodes];
    // Tip offsets above the base level; allocated on first use.
    let mut tip_heights: Option<Vec<f64>> = None;
    // Height carried by each node towards its parent (height + branch).
    let mut hval = vec![0.0f64; n_nodes];
    // Attribute slot of each internal node: first heights slot holding
    // its height, shifted past the tip slots.
    let mut attr_slot = vec![usize::MAX; n_nodes];

    for i in 0..n_nodes {
        if nodes[i].is_leaf() {
            hval[i] = nodes[i].branch.unwrap_or(1.0);
            locs[i] = if i == 0 { -1 } else { locs[i - 1] + 1 };
            continue;
        }

        let mut h = -1.0f64;
        for &s in &nodes[i].sons {
            h = h.max(hval[s]);
        }

        if !cladogram {
            // Children shorter than the tallest sibling lift their whole
            // subtree: internal descendants gain height, tip descendants
            // gain an offset. The descent is an explicit stack since
            // caterpillar inputs can be deep.
            for &s in &nodes[i].sons {
                let dh = h - hval[s];
                if dh > 0.0 && (h - hval[s]).abs() >= f64::EPSILON {
                    let tips = tip_heights.get_or_insert_with(|| vec![0.0; n_taxa]);
                    let mut pending = vec![s];
                    while let Some(x) = pending.pop() {
                        if nodes[x].is_leaf() {
                            tips[(locs[x] + 1) as usize] += dh;
                        } else {
                            heights[locs[x] as usize] += dh;
                            pending.extend(nodes[x].sons.iter().copied());
                        }
                    }
                }
            }
        }

        // The node's height sits between each pair of adjacent children.
        let sons = &nodes[i].sons;
        for &s in &sons[..sons.len() - 1] {
            heights[(locs[s] + 1) as usize] = h;
        }

        locs[i] = locs[i - 1];
        // A unary group yields no node of its own in the reconstruction;
        // its attributes travel with the only child, which covers the
        // same tip range.
        attr_slot[i] = if sons.len() == 1 {
            let only = sons[0];
            if nodes[only].is_leaf() {
                (locs[only] + 1) as usize
            } else {
                attr_slot[only]
            }
        } else {
            (locs[sons[0]] + 1) as usize + n_taxa
        };

        // Carry height + branch up; the root's value is never read.
        let default_branch = if i + 1 == n_nodes { 0.0 } else { 1.0 };
        hval[i] = h + nodes[i].branch.unwrap_or(default_branch);
    }

    // Move attributes from the parsed nodes into their slots. Collapsed
    // unary groups share their child's slot, so concatenate rather than
    // overwrite; post-order keeps the child's own attributes first.
    let attributes = if has_attributes {
        let mut slots: Vec<Option<Attributes>> = vec![None; 2 * n_taxa - 1];
        for i in 0..n_nodes {
            if let Some(attrs) = nodes[i].attributes.take() {
                let slot = if nodes[i].is_leaf() {
                    (locs[i] + 1) as usize
                } else {
                    attr_slot[i]
                };
                debug_assert!(slot < slots.len());
                slots[slot].get_or_insert_with(Vec::new).extend(attrs);
            }
        }
        Some(slots)
    } else {
        None
    };

    let topology = if compressed {
        IntPacker::fixed_width(&topology, bits_for(max_taxon))
    } else {
        IntPacker::simple(topology)
    };

    let base = RepBase {
        topology,
        attributes,
    };

    if cladogram {
        // round half up for bit-packing
        let hs: Vec<u32> = heights.iter().map(|&h| (h + 0.5) as u32).collect();
        let heights = if compressed && !hs.is_empty() {
            let max_h = hs.iter().copied().max().unwrap_or(0);
            IntPacker::fixed_width(&hs, bits_for(max_h))
        } else {
            IntPacker::simple(hs)
        };
        TreeRep::Cladogram { base, heights }
    } else {
        match precision {
            Precision::F32 => TreeRep::PhylogramF32 {
                base,
                heights: heights.iter().map(|&h| h as f32).collect(),
                tip_heights: tip_heights
                    .map(|v| v.iter().map(|&h| h as f32).collect()),
            },
            Precision::F64 => TreeRep::PhylogramF64 {
                base,
                heights,
                tip_heights,
            },
        }
    }
}
