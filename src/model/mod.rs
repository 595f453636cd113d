//! Data model for compactly stored phylogenetic trees.
//!
//! # Representation
//! A parsed tree goes through three forms:
//!
//! | Form | Type | Lifetime |
//! |------|------|----------|
//! | parse | [ParsedNode] list, post-order | transient (kept in `store` mode) |
//! | compact | [TreeRep]: packed topology + heights | persistent, owned by [TreesSet] |
//! | expanded | [ExpandedTree]: full node array | cached per [Tree] handle |
//!
//! The compact form stores a tree of `N` tips as the tip sequence
//! (taxon ids, shared via the set's [TaxonTable]) and the `N-1` heights
//! of the lowest common ancestors of adjacent tips. The
//! [encoder] derives that pair from branch lengths; the
//! [expanded] module inverts it back into parent/child/branch/height
//! records on demand.
//!
//! Integer vectors can be bit-packed at per-tree optimal widths via
//! [IntPacker] when the set is created in compressed mode.

pub mod encoder;
pub mod expanded;
pub mod packer;
pub mod parsed_node;
pub mod taxa;
pub mod tree_rep;
pub mod trees_set;

pub use expanded::{ExpandedNode, ExpandedTree};
pub use packer::IntPacker;
pub use parsed_node::{Attributes, ParsedNode};
pub use taxa::{TaxonId, TaxonTable};
pub use tree_rep::TreeRep;
pub use trees_set::{Error, NodeView, Precision, Tree, TreeAttributes, TreesSet};
