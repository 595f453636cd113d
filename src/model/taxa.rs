//! Taxon interning for sets of trees over a shared label universe.

use std::collections::HashMap;

/// Dense identifier assigned to a taxon label on first sighting.
pub type TaxonId = u32;

/// Append-only bijection between taxon labels and dense [TaxonId]s.
///
/// Every tree added to a set interns its leaf labels here, so trees over
/// the same taxa share one id space and topologies reduce to small-integer
/// vectors. The table is per set; ids are never reused for different
/// labels and never invalidated.
///
/// # Example
/// ```
/// use phylopack::model::taxa::TaxonTable;
///
/// let mut taxa = TaxonTable::new();
/// let a = taxa.intern("A");
/// let b = taxa.intern("B");
/// assert_eq!(taxa.intern("A"), a); // deduplicated
/// assert_ne!(a, b);
/// assert_eq!(taxa.label(a), Some("A"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaxonTable {
    /// Labels in id order
    labels: Vec<String>,
    /// Map from label to its id
    index: HashMap<String, TaxonId>,
}

impl TaxonTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        TaxonTable::default()
    }

    /// Returns the id for a label, assigning the next dense id if the
    /// label has not been seen before.
    pub fn intern(&mut self, label: &str) -> TaxonId {
        if let Some(&id) = self.index.get(label) {
            return id;
        }
        let id = self.labels.len() as TaxonId;
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), id);
        id
    }

    /// Returns the id of a label if it has been interned.
    pub fn get(&self, label: &str) -> Option<TaxonId> {
        self.index.get(label).copied()
    }

    /// Returns the label for an id, or `None` if the id is unknown.
    pub fn label(&self, id: TaxonId) -> Option<&str> {
        self.labels.get(id as usize).map(|s| s.as_str())
    }

    /// Number of distinct labels interned so far.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no labels have been interned.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
