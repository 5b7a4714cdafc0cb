use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use phylotree::tree::Tree as PhyloTree;

use super::namespace::{TaxonId, TaxonNamespace};
use crate::{Result, TreebenchError};

#[derive(Debug, Clone)]
struct TopoNode {
    parent: Option<usize>,
    children: Vec<usize>,
    taxon: Option<TaxonId>,
}

impl TopoNode {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An immutable leaf-labeled tree.
///
/// The arena may contain nodes orphaned by derooting; traversal always starts
/// at `root`, so they are simply unreachable. Operations that change the
/// shape (`deroot`, `restrict`, `migrate`) return new values and leave the
/// receiver untouched.
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: Vec<TopoNode>,
    root: usize,
    namespace: Arc<TaxonNamespace>,
}

impl Topology {
    /// Parse the first Newick tree found in `path`.
    ///
    /// Files holding multiple trees (gene-tree collections) are accepted;
    /// only the first semicolon-terminated tree is read.
    pub fn from_newick_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| TreebenchError::TreeParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let first = text
            .split(';')
            .map(str::trim)
            .find(|t| !t.is_empty())
            .ok_or_else(|| TreebenchError::TreeParse {
                path: path.to_path_buf(),
                reason: "no tree found in file".to_string(),
            })?;
        Self::parse(&format!("{};", first)).map_err(|reason| TreebenchError::TreeParse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a Newick string.
    pub fn from_newick(text: &str) -> Result<Self> {
        Self::parse(text).map_err(|reason| TreebenchError::TreeParse {
            path: PathBuf::from("<newick string>"),
            reason,
        })
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let ptree = PhyloTree::from_newick(text).map_err(|e| e.to_string())?;
        Self::from_phylotree(&ptree)
    }

    fn from_phylotree(ptree: &PhyloTree) -> std::result::Result<Self, String> {
        let proot = ptree.get_root().map_err(|e| e.to_string())?;

        // First pass: collect leaf labels for the namespace.
        let mut labels = Vec::new();
        for leaf_id in ptree.get_leaves() {
            let node = ptree.get(&leaf_id).map_err(|e| e.to_string())?;
            let name = node
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .ok_or_else(|| format!("unlabeled leaf node {}", leaf_id))?;
            labels.push(name);
        }
        let n_leaves = labels.len();
        let namespace = Arc::new(TaxonNamespace::from_labels(labels));
        if namespace.len() != n_leaves {
            return Err("duplicate leaf labels".to_string());
        }

        // Second pass: copy the shape into the arena.
        let mut nodes = Vec::new();
        let root = Self::copy_node(ptree, proot, None, &namespace, &mut nodes)?;
        Ok(Self {
            nodes,
            root,
            namespace,
        })
    }

    fn copy_node(
        ptree: &PhyloTree,
        id: usize,
        parent: Option<usize>,
        namespace: &TaxonNamespace,
        nodes: &mut Vec<TopoNode>,
    ) -> std::result::Result<usize, String> {
        let pnode = ptree.get(&id).map_err(|e| e.to_string())?;
        let idx = nodes.len();
        let taxon = if pnode.children.is_empty() {
            let name = pnode.name.as_deref().unwrap_or_default();
            Some(
                namespace
                    .id_of(name)
                    .ok_or_else(|| format!("leaf {:?} missing from namespace", name))?,
            )
        } else {
            None
        };
        nodes.push(TopoNode {
            parent,
            children: Vec::new(),
            taxon,
        });
        for child in pnode.children.clone() {
            let c = Self::copy_node(ptree, child, Some(idx), namespace, nodes)?;
            nodes[idx].children.push(c);
        }
        Ok(idx)
    }

    pub fn namespace(&self) -> &Arc<TaxonNamespace> {
        &self.namespace
    }

    /// Nodes reachable from the root, preorder.
    fn preorder(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx].children.iter().copied());
        }
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.preorder()
            .into_iter()
            .filter(|&i| self.nodes[i].is_leaf())
            .count()
    }

    /// Labels of the leaves actually present in the tree (after pruning this
    /// can be a subset of the namespace).
    pub fn leaf_labels(&self) -> BTreeSet<String> {
        self.preorder()
            .into_iter()
            .filter_map(|i| self.nodes[i].taxon)
            .map(|t| self.namespace.label(t).to_string())
            .collect()
    }

    /// A topology is considered rooted while its root is a true degree-2
    /// node, i.e. has two children of which at least one is internal. A bare
    /// two-leaf cherry has no unrooted representation distinct from this one
    /// and is treated as unrooted.
    pub fn is_rooted(&self) -> bool {
        let root = &self.nodes[self.root];
        root.children.len() == 2
            && root
                .children
                .iter()
                .any(|&c| !self.nodes[c].children.is_empty())
    }

    /// Return the unrooted form: single-child root chains are collapsed and a
    /// degree-2 root is suppressed by splicing an internal child upward,
    /// leaving a trifurcating (or wider) root.
    pub fn deroot(&self) -> Self {
        let mut t = self.clone();
        t.deroot_in_place();
        t
    }

    fn deroot_in_place(&mut self) {
        while self.nodes[self.root].children.len() == 1 {
            let child = self.nodes[self.root].children[0];
            self.nodes[child].parent = None;
            self.root = child;
        }
        while self.nodes[self.root].children.len() == 2 {
            let splice = self.nodes[self.root]
                .children
                .iter()
                .copied()
                .find(|&c| !self.nodes[c].children.is_empty());
            let Some(spliced) = splice else {
                // Two-leaf tree; nothing to suppress.
                break;
            };
            let grandchildren = std::mem::take(&mut self.nodes[spliced].children);
            for &g in &grandchildren {
                self.nodes[g].parent = Some(self.root);
            }
            let pos = self.nodes[self.root]
                .children
                .iter()
                .position(|&c| c == spliced)
                .expect("spliced node is a root child");
            self.nodes[self.root].children.remove(pos);
            self.nodes[self.root].children.extend(grandchildren);
        }
    }

    /// Prune every leaf whose label is not in `keep`, suppressing internal
    /// nodes left with a single child. The result carries a fresh namespace
    /// holding exactly the surviving labels. Idempotent.
    pub fn restrict(&self, keep: &BTreeSet<String>) -> Self {
        let kept_labels: Vec<String> = self
            .leaf_labels()
            .into_iter()
            .filter(|l| keep.contains(l))
            .collect();
        let namespace = Arc::new(TaxonNamespace::from_labels(kept_labels));

        let mut nodes = Vec::new();
        let root = match self.rebuild(self.root, None, keep, &namespace, &mut nodes) {
            Some(idx) => {
                nodes[idx].parent = None;
                idx
            }
            None => {
                // Everything pruned away; leave an empty topology.
                nodes.push(TopoNode {
                    parent: None,
                    children: Vec::new(),
                    taxon: None,
                });
                nodes.len() - 1
            }
        };

        let mut t = Self {
            nodes,
            root,
            namespace,
        };
        t.deroot_in_place();
        t
    }

    /// Rebuild the subtree under `idx`, returning its new index, or `None` if
    /// it was pruned away. A surviving single child replaces its parent
    /// (degree-2 suppression).
    fn rebuild(
        &self,
        idx: usize,
        parent: Option<usize>,
        keep: &BTreeSet<String>,
        namespace: &TaxonNamespace,
        nodes: &mut Vec<TopoNode>,
    ) -> Option<usize> {
        let node = &self.nodes[idx];
        if let Some(taxon) = node.taxon {
            let label = self.namespace.label(taxon);
            if !keep.contains(label) {
                return None;
            }
            let new_taxon = namespace.id_of(label)?;
            nodes.push(TopoNode {
                parent,
                children: Vec::new(),
                taxon: Some(new_taxon),
            });
            return Some(nodes.len() - 1);
        }

        let new_idx = nodes.len();
        nodes.push(TopoNode {
            parent,
            children: Vec::new(),
            taxon: None,
        });
        let mut built = Vec::new();
        for &child in &node.children {
            if let Some(c) = self.rebuild(child, Some(new_idx), keep, namespace, nodes) {
                built.push(c);
            }
        }
        match built.len() {
            0 => None,
            1 => {
                // Splice: the lone child takes this node's place.
                let child = built[0];
                nodes[child].parent = parent;
                Some(child)
            }
            _ => {
                nodes[new_idx].children = built;
                Some(new_idx)
            }
        }
    }

    /// Re-express the leaves of this tree in `namespace`. Fails if a leaf
    /// label has no entry there.
    pub fn migrate(&self, namespace: &Arc<TaxonNamespace>) -> Result<Self> {
        let mut t = self.clone();
        for idx in t.preorder() {
            if let Some(taxon) = t.nodes[idx].taxon {
                let label = self.namespace.label(taxon);
                let new_id = namespace.id_of(label).ok_or_else(|| {
                    TreebenchError::Degenerate(format!(
                        "taxon {:?} is absent from the shared namespace",
                        label
                    ))
                })?;
                t.nodes[idx].taxon = Some(new_id);
            }
        }
        t.namespace = Arc::clone(namespace);
        Ok(t)
    }

    /// Number of edges on the internal side of the tree: each internal node
    /// owns the edge above it, the root's stem edge included. This is the
    /// per-tree contribution to the RF normalization denominator.
    pub fn internal_edge_count(&self) -> usize {
        self.preorder()
            .into_iter()
            .filter(|&i| !self.nodes[i].is_leaf())
            .count()
    }

    /// Canonical non-trivial bipartitions induced by the internal edges.
    ///
    /// Each bipartition is the smaller of the two leaf-id sides (sorted;
    /// lexicographic tiebreak on equal sizes), so equality means label-set
    /// equality once both trees share a namespace.
    pub fn bipartitions(&self) -> HashSet<Vec<TaxonId>> {
        let mut all_leaves: Vec<TaxonId> = Vec::new();
        let mut below: Vec<Vec<TaxonId>> = vec![Vec::new(); self.nodes.len()];

        // Postorder accumulation of the leaf set under every node.
        let order = self.preorder();
        for &idx in order.iter().rev() {
            if let Some(taxon) = self.nodes[idx].taxon {
                below[idx].push(taxon);
            } else {
                let mut agg = Vec::new();
                for &c in &self.nodes[idx].children {
                    agg.extend_from_slice(&below[c]);
                }
                agg.sort_unstable();
                below[idx] = agg;
            }
        }
        all_leaves.extend_from_slice(&below[self.root]);

        let n = all_leaves.len();
        let mut parts = HashSet::new();
        for idx in order {
            if idx == self.root || self.nodes[idx].is_leaf() {
                continue;
            }
            let side = &below[idx];
            if side.len() < 2 || n - side.len() < 2 {
                continue;
            }
            parts.insert(Self::canonical(side, &all_leaves));
        }
        parts
    }

    fn canonical(side: &[TaxonId], all: &[TaxonId]) -> Vec<TaxonId> {
        let other: Vec<TaxonId> = all.iter().copied().filter(|t| !side.contains(t)).collect();
        if side.len() < other.len() || (side.len() == other.len() && side <= other.as_slice()) {
            side.to_vec()
        } else {
            other
        }
    }

    /// Serialize to Newick, labels only (branch lengths are not tracked).
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(self.root, &mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, idx: usize, out: &mut String) {
        let node = &self.nodes[idx];
        if let Some(taxon) = node.taxon {
            out.push_str(self.namespace.label(taxon));
            return;
        }
        out.push('(');
        for (i, &child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.write_newick(child, out);
        }
        out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn topo(newick: &str) -> Topology {
        Topology::from_newick(newick).unwrap()
    }

    #[test]
    fn parses_leaves_into_namespace() {
        let t = topo("((A,B),(C,D),E);");
        assert_eq!(t.leaf_count(), 5);
        assert_eq!(t.namespace().len(), 5);
        assert!(t.namespace().contains("E"));
    }

    #[test]
    fn rejects_duplicate_labels() {
        assert!(Topology::from_newick("((A,B),(A,C));").is_err());
    }

    #[test]
    fn deroot_suppresses_binary_root() {
        let rooted = topo("((A,B),((C,D),E));");
        assert!(rooted.is_rooted());
        let unrooted = rooted.deroot();
        assert!(!unrooted.is_rooted());
        // The original value is untouched.
        assert!(rooted.is_rooted());
        assert_eq!(unrooted.leaf_count(), 5);
    }

    #[test]
    fn deroot_is_stable_on_unrooted_input() {
        let t = topo("((A,B),(C,D),E);");
        assert!(!t.is_rooted());
        let d = t.deroot();
        assert_eq!(d.bipartitions(), t.bipartitions());
    }

    #[test]
    fn restrict_prunes_and_splices() {
        let t = topo("((A,B),((C,D),E),F);").deroot();
        let keep: BTreeSet<String> = ["A", "B", "C", "E", "F"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let pruned = t.restrict(&keep);
        assert_eq!(pruned.leaf_count(), 5);
        assert_eq!(pruned.namespace().len(), 5);
        assert!(!pruned.leaf_labels().contains("D"));
        // (C,D) collapsed onto C; no degree-2 internal node may survive.
        let parts = pruned.bipartitions();
        assert!(parts.iter().all(|p| p.len() >= 2));
    }

    #[test]
    fn restrict_is_idempotent() {
        let t = topo("((A,B),(C,D),E);");
        let keep: BTreeSet<String> = t.leaf_labels();
        let once = t.restrict(&keep);
        let twice = once.restrict(&keep);
        assert_eq!(once.bipartitions(), twice.bipartitions());
        assert_eq!(once.internal_edge_count(), twice.internal_edge_count());
    }

    #[test]
    fn internal_edge_count_matches_shape() {
        // Unrooted 5-leaf binary tree: root plus two internal nodes.
        let t = topo("((A,B),(C,D),E);");
        assert_eq!(t.internal_edge_count(), 3);
        // Star tree: only the root.
        let star = topo("(A,B,C,D);");
        assert_eq!(star.internal_edge_count(), 1);
        assert!(star.bipartitions().is_empty());
    }

    #[test]
    fn bipartitions_are_canonical() {
        let t = topo("((A,B),(C,D),E);");
        let ns = t.namespace();
        let parts = t.bipartitions();
        assert_eq!(parts.len(), 2);
        let ab = vec![ns.id_of("A").unwrap(), ns.id_of("B").unwrap()];
        let cd = vec![ns.id_of("C").unwrap(), ns.id_of("D").unwrap()];
        assert!(parts.contains(&ab));
        assert!(parts.contains(&cd));
    }

    #[test]
    fn newick_round_trip_preserves_bipartitions() {
        let t = topo("((A,B),((C,D),E),F);").deroot();
        let back = Topology::from_newick(&t.to_newick()).unwrap();
        assert_eq!(t.bipartitions(), back.bipartitions());
    }
}
