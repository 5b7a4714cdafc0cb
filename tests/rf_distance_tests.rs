use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use treebench::{normalized_rf_distance, rf_distance, TreebenchError};

fn write_tree(dir: &TempDir, name: &str, newick: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, newick).unwrap();
    path
}

#[test]
fn test_identical_trees_have_zero_distance() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.tre", "((A,B),(C,D),E);");
    let b = write_tree(&dir, "b.tre", "((A,B),(C,D),E);");

    let d = rf_distance(&a, &b).unwrap();
    assert_eq!(d.raw, 0);
    assert_eq!(d.normalized, 0.0);
    assert_eq!(d.shared_taxa, 5);
}

#[test]
fn test_reserialized_topology_has_zero_distance() {
    // Same unrooted topology written with different rotation and rooting.
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.tre", "((A,B),(C,D),E);");
    let b = write_tree(&dir, "b.tre", "(E,(D,C),(B,A));");

    assert_eq!(normalized_rf_distance(&a, &b).unwrap(), 0.0);
}

#[test]
fn test_single_conflicting_split_is_positive_and_below_one() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.tre", "((A,B),(C,D),E);");
    let b = write_tree(&dir, "b.tre", "((A,C),(B,D),E);");

    let d = rf_distance(&a, &b).unwrap();
    assert_eq!(d.raw, 4);
    assert_eq!(d.internal_edges, 6);
    assert!(d.normalized > 0.0);
    assert!(d.normalized < 1.0);
    assert!((d.normalized - 4.0 / 6.0).abs() < 1e-12);
}

#[test]
fn test_distance_is_symmetric() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.tre", "((A,B),((C,D),(E,F)));");
    let b = write_tree(&dir, "b.tre", "((A,C),((B,D),(E,F)));");

    assert_eq!(
        normalized_rf_distance(&a, &b).unwrap(),
        normalized_rf_distance(&b, &a).unwrap()
    );
}

#[test]
fn test_rooting_does_not_change_distance() {
    let dir = TempDir::new().unwrap();
    let unrooted = write_tree(&dir, "u.tre", "((A,B),(C,D),E);");
    let rooted = write_tree(&dir, "r.tre", "(((A,B),(C,D)),E);");

    assert_eq!(normalized_rf_distance(&unrooted, &rooted).unwrap(), 0.0);
}

#[test]
fn test_partial_overlap_prunes_before_comparing() {
    // Six vs five leaves; the five shared taxa agree after pruning F.
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.tre", "((A,B),((C,F),D),E);");
    let b = write_tree(&dir, "b.tre", "((A,B),(C,D),E);");

    let d = rf_distance(&a, &b).unwrap();
    assert_eq!(d.shared_taxa, 5);
    assert_eq!(d.normalized, 0.0);
}

#[test]
fn test_too_few_shared_taxa_is_recoverable() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.tre", "((A,B),((C,X),Y),Z);");
    let b = write_tree(&dir, "b.tre", "((A,B),C,D);");

    let err = rf_distance(&a, &b).unwrap_err();
    assert!(matches!(err, TreebenchError::Degenerate(_)));
    assert!(err.is_recoverable());
}

#[test]
fn test_disjoint_namespaces_are_recoverable() {
    let dir = TempDir::new().unwrap();
    let a = write_tree(&dir, "a.tre", "((A,B),(C,D),E);");
    let b = write_tree(&dir, "b.tre", "((V,W),(X,Y),Z);");

    let err = rf_distance(&a, &b).unwrap_err();
    assert!(err.is_recoverable());
}

#[test]
fn test_parse_failure_names_the_file() {
    let dir = TempDir::new().unwrap();
    let good = write_tree(&dir, "good.tre", "((A,B),(C,D),E);");
    let bad = write_tree(&dir, "bad.tre", "((A,B,(C;");

    match rf_distance(&good, &bad) {
        Err(TreebenchError::TreeParse { path, .. }) => {
            assert!(path.ends_with("bad.tre"));
        }
        other => panic!("expected a parse error, got {:?}", other.map(|d| d.raw)),
    }
}

#[test]
fn test_multifurcations_compare_without_error() {
    let dir = TempDir::new().unwrap();
    let binary = write_tree(&dir, "a.tre", "((A,B),((C,D),E),F);");
    let star = write_tree(&dir, "b.tre", "(A,B,C,D,E,F);");

    // The star tree has no nontrivial splits; every split of the binary
    // tree is unmatched.
    let d = rf_distance(&binary, &star).unwrap();
    assert_eq!(d.raw, 3);
    assert!(d.normalized > 0.0);
}
