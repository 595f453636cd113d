//! Transient node records produced by the Newick parser.

/// Ordered `(name, value)` pairs collected from `[&...]` annotation blocks.
///
/// Values are kept as raw strings; interpreting them (number, array, ...)
/// is left to the caller.
pub type Attributes = Vec<(String, String)>;

/// A single node recovered from a Newick string.
///
/// The parser emits these in post-order: the `sons` of a node index into
/// the same vector and always refer to earlier entries, so a parent sees
/// its children's indices already fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedNode {
    /// Leaf label, or an explicit internal-node label if the input has one
    pub taxon: Option<String>,
    /// Length of the branch above this node
    pub branch: Option<f64>,
    /// Indices of child nodes in the parse vector (empty for a tip)
    pub sons: Vec<usize>,
    /// Annotations attached to this node, in input order
    pub attributes: Option<Attributes>,
}

impl ParsedNode {
    /// Returns `true` if this node is a tip (has no children).
    pub fn is_leaf(&self) -> bool {
        self.sons.is_empty()
    }
}
