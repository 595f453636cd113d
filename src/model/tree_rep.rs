//! Persistent compact tree representation.
//!
//! A [TreeRep] stores a tree as its ordered tip sequence (`topology`) plus
//! the heights of the lowest common ancestors of adjacent tips
//! (`heights`). That pair determines the full topology; the
//! [expander](crate::model::expanded) reconstructs a navigable node array
//! from it on demand.

use crate::model::packer::IntPacker;
use crate::model::parsed_node::Attributes;
use crate::model::taxa::TaxonId;
use std::borrow::Cow;

/// Parts shared by every representation variant: the packed tip sequence
/// and the optional per-node attribute slots.
#[derive(Debug, Clone, PartialEq)]
pub struct RepBase {
    /// Taxon ids of the tips, left to right
    pub(crate) topology: IntPacker,
    /// One slot per reconstructed node (length `2N-1`), or `None` when no
    /// node in the tree carries attributes. Tips occupy slots `0..N`,
    /// internal nodes `N..2N-1`.
    pub(crate) attributes: Option<Vec<Option<Attributes>>>,
}

/// Compact, immutable representation of one tree.
///
/// A tree of `N` tips stores `N` topology entries and `N-1` heights. A
/// *cladogram* (no branch lengths anywhere) keeps integer heights, bit-
/// packable; a *phylogram* keeps real heights at the owning set's
/// precision, plus optional per-tip offsets when tips are not
/// contemporaneous (`None` means all zero).
#[derive(Debug, Clone, PartialEq)]
pub enum TreeRep {
    /// Tree without branch lengths; heights are node counts
    Cladogram {
        base: RepBase,
        heights: IntPacker,
    },
    /// Tree with branch lengths stored in single precision
    PhylogramF32 {
        base: RepBase,
        heights: Vec<f32>,
        tip_heights: Option<Vec<f32>>,
    },
    /// Tree with branch lengths stored in double precision
    PhylogramF64 {
        base: RepBase,
        heights: Vec<f64>,
        tip_heights: Option<Vec<f64>>,
    },
}

impl TreeRep {
    fn base(&self) -> &RepBase {
        match self {
            TreeRep::Cladogram { base, .. } => base,
            TreeRep::PhylogramF32 { base, .. } => base,
            TreeRep::PhylogramF64 { base, .. } => base,
        }
    }

    /// Number of tips.
    pub fn n_taxa(&self) -> usize {
        self.base().topology.len()
    }

    /// Returns `true` if this tree carries no branch lengths.
    pub fn is_cladogram(&self) -> bool {
        matches!(self, TreeRep::Cladogram { .. })
    }

    /// The tip sequence as taxon ids.
    ///
    /// Borrowed when the topology is stored verbatim, owned when it has to
    /// be decoded from a bit-packed buffer.
    pub fn topology(&self) -> Cow<'_, [TaxonId]> {
        self.base().topology.unpacked()
    }

    /// Heights of the LCAs of adjacent tips, widened to `f64`.
    pub fn heights(&self) -> Vec<f64> {
        match self {
            TreeRep::Cladogram { heights, .. } => {
                heights.unpacked().iter().map(|&h| h as f64).collect()
            }
            TreeRep::PhylogramF32 { heights, .. } => {
                heights.iter().map(|&h| h as f64).collect()
            }
            TreeRep::PhylogramF64 { heights, .. } => heights.clone(),
        }
    }

    /// Per-tip height offsets, widened to `f64`. `None` means every tip
    /// sits at the base level (contemporaneous tips, and all cladograms).
    pub fn tip_heights(&self) -> Option<Vec<f64>> {
        match self {
            TreeRep::Cladogram { .. } => None,
            TreeRep::PhylogramF32 { tip_heights, .. } => tip_heights
                .as_ref()
                .map(|v| v.iter().map(|&h| h as f64).collect()),
            TreeRep::PhylogramF64 { tip_heights, .. } => tip_heights.clone(),
        }
    }

    /// Per-node attribute slots, if any node carries attributes.
    pub fn attributes(&self) -> Option<&[Option<Attributes>]> {
        self.base().attributes.as_deref()
    }
}
