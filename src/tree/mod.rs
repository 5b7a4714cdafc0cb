//! Leaf-labeled tree values and the Robinson-Foulds core.
//!
//! `phylotree` handles Newick parsing; everything on top (taxon namespaces,
//! derooting, pruning, bipartition comparison) lives here as pure operations
//! over immutable `Topology` values.

pub mod namespace;
pub mod rf;
pub mod topology;

pub use namespace::{TaxonId, TaxonNamespace};
pub use topology::Topology;
