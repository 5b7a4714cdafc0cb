use std::collections::HashMap;

/// Index of a taxon inside a [`TaxonNamespace`].
pub type TaxonId = u32;

/// Ordered registry of the leaf labels attached to a tree.
///
/// Two trees can only be compared bipartition-by-bipartition once both
/// reference their leaves through the same namespace, so label identity
/// rather than node position decides equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonNamespace {
    labels: Vec<String>,
    index: HashMap<String, TaxonId>,
}

impl TaxonNamespace {
    /// Build a namespace from labels; duplicates collapse, order is sorted.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        labels.sort();
        labels.dedup();
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i as TaxonId))
            .collect();
        Self { labels, index }
    }

    pub fn id_of(&self, label: &str) -> Option<TaxonId> {
        self.index.get(label).copied()
    }

    pub fn label(&self, id: TaxonId) -> &str {
        &self.labels[id as usize]
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Labels present in exactly one of the two namespaces. These are the
    /// leaves that must be pruned before an RF comparison.
    pub fn symmetric_difference(&self, other: &TaxonNamespace) -> Vec<String> {
        let mut out: Vec<String> = self
            .labels
            .iter()
            .filter(|l| !other.contains(l))
            .chain(other.labels.iter().filter(|l| !self.contains(l)))
            .cloned()
            .collect();
        out.sort();
        out
    }

    /// Labels present in both namespaces.
    pub fn intersection(&self, other: &TaxonNamespace) -> Vec<String> {
        self.labels
            .iter()
            .filter(|l| other.contains(l))
            .cloned()
            .collect()
    }
}
