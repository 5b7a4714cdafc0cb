//! Robinson-Foulds distance with taxon-set reconciliation.
//!
//! Trees being compared rarely share an identical leaf set: species trees are
//! complete while inferred trees may drop taxa, and gene trees routinely
//! cover subsets. Both trees are therefore derooted, pruned to their common
//! taxa and migrated onto one shared namespace before their bipartition sets
//! are compared.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::namespace::TaxonNamespace;
use super::topology::Topology;
use crate::{Result, TreebenchError};

/// Smallest shared leaf count that still carries unrooted topological signal.
/// Below this the comparison is degenerate and reported as a recoverable
/// error instead of a misleading zero.
pub const MIN_SHARED_TAXA: usize = 4;

/// Outcome of one reconciled RF comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RfDistance {
    /// Symmetric difference of the two bipartition sets.
    pub raw: usize,
    /// `raw` divided by the internal edge count of both pruned trees.
    pub normalized: f64,
    /// Taxa surviving the pruning step.
    pub shared_taxa: usize,
    /// Normalization denominator.
    pub internal_edges: usize,
}

/// Normalized RF distance between the first trees of two Newick files.
pub fn normalized_rf_distance(tree_a: &Path, tree_b: &Path) -> Result<f64> {
    Ok(rf_distance(tree_a, tree_b)?.normalized)
}

/// Full RF comparison between the first trees of two Newick files.
pub fn rf_distance(tree_a: &Path, tree_b: &Path) -> Result<RfDistance> {
    let a = Topology::from_newick_file(tree_a)?;
    let b = Topology::from_newick_file(tree_b)?;
    rf_distance_topologies(&a, &b)
}

/// RF comparison between already-parsed trees. Input rooting state does not
/// matter; both values are normalized to unrooted form first.
pub fn rf_distance_topologies(a: &Topology, b: &Topology) -> Result<RfDistance> {
    let a = unroot(a)?;
    let b = unroot(b)?;

    let labels_a = a.leaf_labels();
    let labels_b = b.leaf_labels();
    let shared: BTreeSet<String> = labels_a.intersection(&labels_b).cloned().collect();
    if shared.len() < MIN_SHARED_TAXA {
        return Err(TreebenchError::Degenerate(format!(
            "{} shared taxa, need at least {}",
            shared.len(),
            MIN_SHARED_TAXA
        )));
    }
    debug!(
        shared = shared.len(),
        only_a = labels_a.len() - shared.len(),
        only_b = labels_b.len() - shared.len(),
        "reconciling taxon sets"
    );

    let a = a.restrict(&shared);
    let b = b.restrict(&shared);

    // One namespace object for both trees so bipartitions compare by label.
    let namespace = Arc::new(TaxonNamespace::from_labels(shared));
    let a = a.migrate(&namespace)?;
    let b = b.migrate(&namespace)?;

    let internal_edges = a.internal_edge_count() + b.internal_edge_count();
    let parts_a = a.bipartitions();
    let parts_b = b.bipartitions();
    let raw = parts_a.symmetric_difference(&parts_b).count();

    Ok(RfDistance {
        raw,
        normalized: raw as f64 / internal_edges as f64,
        shared_taxa: namespace.len(),
        internal_edges,
    })
}

/// Force a topology to its unrooted representation. A value that still
/// reports rooted after a second pass indicates a malformed input or a bug
/// in tree handling and is surfaced as a fatal, descriptive error.
fn unroot(t: &Topology) -> Result<Topology> {
    let mut u = t.deroot();
    if u.is_rooted() {
        u = u.deroot();
    }
    if u.is_rooted() {
        return Err(TreebenchError::Unroot(format!(
            "root still has degree 2 after two deroot passes ({} leaves)",
            u.leaf_count()
        )));
    }
    Ok(u)
}
