//! The tree-set orchestrator and its per-tree handle.
//!
//! A [TreesSet] owns the taxon table and the compact representation of
//! every tree added to it. Individual trees are accessed through a
//! [Tree] handle, which lazily expands the compact form into a navigable
//! node array and caches the expansion for its own lifetime.

use crate::model::encoder::encode;
use crate::model::expanded::ExpandedTree;
use crate::model::parsed_node::{Attributes, ParsedNode};
use crate::model::taxa::{TaxonId, TaxonTable};
use crate::model::tree_rep::TreeRep;
use crate::newick::parser::parse_tree;
use crate::newick::writer::render_subtree;
use crate::parser::ParseError;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::error;
use std::fmt;
use std::ops::Range;

// =#========================================================================#=
// ERROR
// =#========================================================================#=
/// Errors surfaced by [TreesSet] and [Tree] operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The tree text could not be parsed; the set is unchanged
    Parse(ParseError),
    /// A tree or node index was out of bounds
    Range { index: usize, len: usize },
    /// An argument was rejected (e.g. a negative branch length)
    InvalidArgument(String),
    /// A broken internal invariant; indicates a bug, not bad input
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{}", e),
            Error::Range { index, len } => {
                write!(f, "index {} out of range (len {})", index, len)
            }
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

/// Floating point precision for phylogram heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Store heights as `f32`
    F32,
    /// Store heights as `f64`
    F64,
}

/// Per-tree user attribute bag, attached at [TreesSet::add] time.
pub type TreeAttributes = HashMap<String, String>;

// =#========================================================================#=
// TREES SET
// =#========================================================================#=
/// A write-once collection of compactly stored trees over a shared taxon
/// universe.
///
/// Every call to [add](Self::add) parses one Newick string, interns its
/// taxa, and encodes the tree into a [TreeRep]. Nothing else mutates the
/// set; reading happens through [get](Self::get) handles.
///
/// # Configuration
/// * `compressed` - bit-pack topology and cladogram heights at per-tree
///   optimal widths; otherwise store vectors verbatim.
/// * `precision` - `f32` or `f64` storage for phylogram heights.
/// * `store` - diagnostic mode: retain the raw parsed node lists instead
///   of encoding; [parsed](Self::parsed) gives access, [get](Self::get)
///   reports out of range since no compact trees exist.
///
/// # Example
/// ```
/// use phylopack::{Precision, TreesSet};
///
/// let mut set = TreesSet::new(true, Precision::F64, false);
/// let index = set.add("((A:1,B:1):2,C:3);", None).unwrap();
///
/// let tree = set.get(index).unwrap();
/// assert_eq!(tree.taxa(), vec!["A", "B", "C"]);
/// assert_eq!(tree.to_newick(None, false, false).unwrap(),
///            "((A:1.0,B:1.0):2.0,C:3.0)");
/// ```
pub struct TreesSet {
    compressed: bool,
    precision: Precision,
    store: bool,
    taxa: TaxonTable,
    trees: Vec<TreeRep>,
    tree_attrs: Vec<Option<TreeAttributes>>,
    stored: Vec<Vec<ParsedNode>>,
}

impl TreesSet {
    /// Creates an empty set with the given storage configuration.
    pub fn new(compressed: bool, precision: Precision, store: bool) -> Self {
        TreesSet {
            compressed,
            precision,
            store,
            taxa: TaxonTable::new(),
            trees: Vec::new(),
            tree_attrs: Vec::new(),
            stored: Vec::new(),
        }
    }

    /// Parses a Newick string and appends the tree to the set.
    ///
    /// # Arguments
    /// * `text` - One Newick tree, optionally terminated by `;`
    /// * `attrs` - Optional user attributes to attach to the tree
    ///
    /// # Returns
    /// The index of the new tree, or a parse error with a byte offset. On
    /// error the set is left untouched.
    pub fn add(
        &mut self,
        text: &str,
        attrs: Option<TreeAttributes>,
    ) -> Result<usize, Error> {
        let nodes = parse_tree(text)?;
        self.tree_attrs.push(attrs);

        if self.store {
            self.stored.push(nodes);
            Ok(self.stored.len() - 1)
        } else {
            let rep = encode(nodes, &mut self.taxa, self.compressed, self.precision);
            self.trees.push(rep);
            Ok(self.trees.len() - 1)
        }
    }

    /// Number of trees in the set.
    pub fn len(&self) -> usize {
        if self.store {
            self.stored.len()
        } else {
            self.trees.len()
        }
    }

    /// Returns `true` if no trees have been added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a handle to the `index`-th tree.
    ///
    /// The handle lazily expands the compact representation on first
    /// navigation and keeps the expansion for its own lifetime; handles to
    /// the same tree are independent.
    pub fn get(&self, index: usize) -> Result<Tree<'_>, Error> {
        if index >= self.trees.len() {
            return Err(Error::Range {
                index,
                len: self.trees.len(),
            });
        }
        Ok(Tree {
            set: self,
            index,
            expanded: OnceCell::new(),
        })
    }

    /// The compact representation of the `index`-th tree.
    pub fn rep(&self, index: usize) -> Result<&TreeRep, Error> {
        self.trees.get(index).ok_or(Error::Range {
            index,
            len: self.trees.len(),
        })
    }

    /// Store-mode access to the raw parse of the `index`-th tree.
    pub fn parsed(&self, index: usize) -> Result<&[ParsedNode], Error> {
        self.stored
            .get(index)
            .map(|v| v.as_slice())
            .ok_or(Error::Range {
                index,
                len: self.stored.len(),
            })
    }

    /// The label interned for `id`, if any.
    pub fn taxon(&self, id: TaxonId) -> Option<&str> {
        self.taxa.label(id)
    }

    /// Number of distinct taxa across all trees.
    pub fn num_taxa(&self) -> usize {
        self.taxa.len()
    }

    /// The shared taxon table.
    pub fn taxa(&self) -> &TaxonTable {
        &self.taxa
    }
}

// =#========================================================================#=
// TREE HANDLE
// =#========================================================================#=
/// Read view of one node of an expanded tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView<'t> {
    /// Index of the parent node, `None` for the root
    pub parent: Option<usize>,
    /// Child indices, left to right (empty for tips)
    pub sons: &'t [u32],
    /// Taxon label for tips
    pub taxon: Option<&'t str>,
    /// Branch length above the node (`None` on cladograms and the root)
    pub branch: Option<f64>,
    /// Height above the base level (`None` on cladograms)
    pub height: Option<f64>,
    /// Annotations parsed from the input, in input order
    pub attributes: Option<&'t Attributes>,
}

/// Handle to one tree of a [TreesSet].
///
/// Navigation operations ([node](Self::node), [postorder](Self::postorder),
/// [to_newick](Self::to_newick), ...) expand the compact representation on
/// first use and then work on the cached [ExpandedTree]. After a
/// [set_branch](Self::set_branch) edit the cached expansion is the
/// canonical state; the packed representation is not rewritten.
pub struct Tree<'a> {
    set: &'a TreesSet,
    index: usize,
    expanded: OnceCell<ExpandedTree>,
}

impl<'a> Tree<'a> {
    /// The compact representation this handle reads from.
    pub fn rep(&self) -> &'a TreeRep {
        &self.set.trees[self.index]
    }

    fn expanded(&self) -> &ExpandedTree {
        self.expanded
            .get_or_init(|| ExpandedTree::from_rep(self.rep()))
    }

    /// Number of tips.
    pub fn n_taxa(&self) -> usize {
        self.rep().n_taxa()
    }

    /// Number of nodes in the expansion (`2N-1` for a binary tree of `N`
    /// tips, fewer with multifurcations).
    pub fn n_nodes(&self) -> usize {
        self.expanded().len()
    }

    /// Id of the root node.
    pub fn root_id(&self) -> usize {
        self.expanded().root()
    }

    /// Returns `true` if this tree carries no branch lengths.
    pub fn is_cladogram(&self) -> bool {
        self.rep().is_cladogram()
    }

    /// Taxon labels along the topology (tip sequence, left to right).
    pub fn taxa(&self) -> Vec<&'a str> {
        self.rep()
            .topology()
            .iter()
            .map(|&id| self.set.taxa.label(id).unwrap_or(""))
            .collect()
    }

    /// Taxon ids along the topology.
    pub fn topology(&self) -> Vec<TaxonId> {
        self.rep().topology().into_owned()
    }

    /// Ids of the leaf nodes, in topology order.
    pub fn terminals(&self) -> Vec<usize> {
        let expanded = self.expanded();
        (0..expanded.len())
            .filter(|&id| expanded.node(id).taxon.is_some())
            .collect()
    }

    /// All node ids, `0..n_nodes`.
    pub fn all_ids(&self) -> Range<usize> {
        0..self.n_nodes()
    }

    /// User attributes attached when the tree was added.
    pub fn attributes(&self) -> Option<&'a TreeAttributes> {
        self.set.tree_attrs[self.index].as_ref()
    }

    /// Read view of the node at `id`.
    pub fn node(&self, id: usize) -> Result<NodeView<'_>, Error> {
        let expanded = self.expanded();
        if id >= expanded.len() {
            return Err(Error::Range {
                index: id,
                len: expanded.len(),
            });
        }

        let node = expanded.node(id);
        let attributes = self
            .rep()
            .attributes()
            .and_then(|slots| slots[node.attr_slot].as_ref());

        Ok(NodeView {
            parent: node.parent,
            sons: expanded.sons(id),
            taxon: node.taxon.and_then(|t| self.set.taxa.label(t)),
            branch: node.branch,
            height: (!node.height.is_nan()).then_some(node.height),
            attributes,
        })
    }

    /// Node ids of the subtree under `root` (the whole tree when `None`)
    /// in post-order, with tips included only when `include_tips`.
    pub fn postorder(
        &self,
        root: Option<usize>,
        include_tips: bool,
    ) -> Result<Vec<usize>, Error> {
        self.order(false, root, include_tips)
    }

    /// Node ids of the subtree under `root` (the whole tree when `None`)
    /// in pre-order, with tips included only when `include_tips`.
    pub fn preorder(
        &self,
        root: Option<usize>,
        include_tips: bool,
    ) -> Result<Vec<usize>, Error> {
        self.order(true, root, include_tips)
    }

    fn order(
        &self,
        pre_order: bool,
        root: Option<usize>,
        include_tips: bool,
    ) -> Result<Vec<usize>, Error> {
        let expanded = self.expanded();
        let root = root.unwrap_or_else(|| expanded.root());
        if root >= expanded.len() {
            return Err(Error::Range {
                index: root,
                len: expanded.len(),
            });
        }
        let mut ids = Vec::new();
        expanded.order_ids(pre_order, root, include_tips, &mut ids);
        Ok(ids)
    }

    /// Sets the branch above `id` to `new_len`.
    ///
    /// The heights of the subtree shift so the metric above the node is
    /// preserved; if any height would go negative the whole tree is
    /// re-baselined to a minimum height of 0. The edit lives in the cached
    /// expansion only.
    ///
    /// # Errors
    /// [Error::InvalidArgument] for a negative length, [Error::Range] for
    /// an unknown node id.
    pub fn set_branch(&mut self, id: usize, new_len: f64) -> Result<(), Error> {
        if new_len < 0.0 || !new_len.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "branch length must be non-negative, got {}",
                new_len
            )));
        }

        self.expanded(); // force initialisation
        let expanded = self
            .expanded
            .get_mut()
            .ok_or_else(|| Error::Internal("expansion cache not initialised".into()))?;

        if id >= expanded.len() {
            return Err(Error::Range {
                index: id,
                len: expanded.len(),
            });
        }

        expanded.set_branch(id, new_len);
        Ok(())
    }

    /// Renders the subtree under `root` (the whole tree when `None`) as a
    /// canonical Newick string.
    ///
    /// Children are ordered by their rendered form, so trees differing
    /// only in sibling order produce identical strings. Branch lengths
    /// are omitted with `topology_only`; the root's own branch is written
    /// only with `include_stem`. No trailing `;` is appended.
    pub fn to_newick(
        &self,
        root: Option<usize>,
        topology_only: bool,
        include_stem: bool,
    ) -> Result<String, Error> {
        let expanded = self.expanded();
        let root = root.unwrap_or_else(|| expanded.root());
        if root >= expanded.len() {
            return Err(Error::Range {
                index: root,
                len: expanded.len(),
            });
        }
        Ok(render_subtree(
            expanded,
            &self.set.taxa,
            root,
            topology_only,
            include_stem,
        ))
    }
}
