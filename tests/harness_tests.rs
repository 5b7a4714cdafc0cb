use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use treebench::bench;
use treebench::cli::commands::analyze::{self, AnalyzeArgs};
use treebench::config::ExperimentConfig;
use treebench::report::ResultTable;
use treebench::TreebenchError;

const CAPTURED_OUTPUT: &str = "\
Time Count Quartets: 2.0 seconds
Time Start Tree: 1.0 seconds
Time Tree Search: 5.5 seconds
Time Total: 8.5 seconds
Sum LQIC final Tree: -42.25
";

fn write_config(dir: &TempDir) -> PathBuf {
    let eval = dir.path().join("ds_all.tre");
    let reference = dir.path().join("ds_reference.tre");
    fs::write(&eval, "((A,B),(C,D),E);\n((A,B),(C,E),D);\n").unwrap();
    fs::write(&reference, "((A,B),(C,D),E);\n").unwrap();

    let config_path = dir.path().join("experiment.json");
    let document = format!(
        r#"{{
            "data": [{{"eval": {:?}, "reference": {:?}, "name": "ds"}}],
            "exe": "treesearch",
            "algorithms": [{{"label": "nni", "args": ["-a", "nni"]}}],
            "repeat": 1
        }}"#,
        eval, reference
    );
    fs::write(&config_path, document).unwrap();
    config_path
}

#[test]
fn test_config_rejects_missing_algorithms() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{"data": [{"eval": "e", "reference": "r"}], "exe": "x", "algorithms": []}"#,
    )
    .unwrap();

    match ExperimentConfig::load(&path) {
        Err(TreebenchError::Config(_)) => {}
        other => panic!("expected a config error, got {:?}", other.map(|c| c.run_count())),
    }
}

#[test]
fn test_analyze_scrapes_script_artifacts() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir);
    let config = ExperimentConfig::load(&config_path).unwrap();

    // Fabricate what an offline script run leaves behind: one captured
    // console output and one tree per run, named by the run's file stem.
    let out_dir = dir.path().join("runs");
    fs::create_dir(&out_dir).unwrap();
    let runs = bench::enumerate_runs(&config);
    assert_eq!(runs.len(), 1);
    let stem = runs[0].file_stem();
    assert_eq!(stem, "ds_nni_0");
    fs::write(out_dir.join(format!("{}.out", stem)), CAPTURED_OUTPUT).unwrap();
    fs::write(out_dir.join(format!("{}.tre", stem)), "((A,B),(C,D),E);\n").unwrap();

    analyze::run(AnalyzeArgs {
        config: config_path.clone(),
        out_dir,
        results: None,
    })
    .unwrap();

    let results = PathBuf::from(format!("{}.results.csv", config_path.display()));
    let table = ResultTable::load_csv(&results).unwrap();
    assert_eq!(table.len(), 1);

    let record = &table.records()[0];
    assert_eq!(record.dataset, "ds");
    assert_eq!(record.algorithm, "nni");
    assert_eq!(record.runtime_count, 2.0);
    assert_eq!(record.runtime_start, 1.0);
    assert_eq!(record.runtime_search, 5.5);
    assert_eq!(record.lqic, Some(-42.25));
    assert_eq!(record.qpic, None);
    // The fabricated tree matches the reference exactly.
    assert_eq!(record.rf, 0.0);
    assert_eq!(record.rf_normalized, 0.0);
}

#[test]
fn test_checkpoint_survives_process_boundaries() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir);
    let exe = dir.path().join("treesearch");
    fs::write(&exe, "fake binary").unwrap();

    let mut table = ResultTable::new();
    table.push(treebench::report::RunRecord {
        dataset: "ds".into(),
        algorithm: "nni".into(),
        seed: 0,
        runtime_start: 1.0,
        runtime_count: 2.0,
        runtime_search: 5.5,
        lqic: Some(-42.25),
        qpic: None,
        eqpic: None,
        rf: 0.0,
        rf_normalized: 0.0,
    });

    let checkpoint = bench::Checkpoint::new(&config_path, &exe).unwrap();
    checkpoint.save(&table).unwrap();

    // A fresh handle (as after a crash and restart) restores the rows.
    let restored = bench::Checkpoint::new(&config_path, &exe)
        .unwrap()
        .resume()
        .unwrap()
        .expect("checkpoint should be accepted");
    assert_eq!(restored.records(), table.records());

    // Editing the configuration invalidates it.
    let mut text = fs::read_to_string(&config_path).unwrap();
    text.push('\n');
    fs::write(&config_path, text).unwrap();
    assert!(bench::Checkpoint::new(&config_path, &exe)
        .unwrap()
        .resume()
        .unwrap()
        .is_none());
}
