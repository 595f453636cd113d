//! Compact in-memory storage for large sets of phylogenetic trees.
//!
//! This crate parses trees in Newick format (with BEAST-style `[&...]`
//! annotations) and stores them in a compact topology-plus-heights
//! representation, so that many thousands of trees over a shared taxon
//! universe fit in memory without a full object graph per tree. Each tree
//! can still be expanded on demand into a navigable node array with
//! parents, children, branch lengths and heights.
//!
//! # Example
//! ```
//! use phylopack::{Precision, TreesSet};
//!
//! let mut set = TreesSet::new(true, Precision::F64, false);
//! set.add("((A:1,B:1):2,C:3);", None).unwrap();
//! set.add("((A,B),(C,D));", None).unwrap();
//!
//! assert_eq!(set.len(), 2);
//! assert_eq!(set.num_taxa(), 4); // A, B, C, D shared across trees
//!
//! let tree = set.get(0).unwrap();
//! let root = tree.node(tree.root_id()).unwrap();
//! assert_eq!(root.height, Some(3.0));
//! ```

/// Compact representation, encoding and expansion
pub mod model;
/// Newick reading and canonical writing
pub mod newick;
/// Byte cursor and parse errors
pub mod parser;

pub use model::{
    Attributes, Error, ExpandedNode, ExpandedTree, IntPacker, NodeView, ParsedNode, Precision,
    TaxonId, TaxonTable, Tree, TreeAttributes, TreeRep, TreesSet,
};
pub use newick::parse_tree;
pub use parser::{ParseError, ParseErrorKind};
