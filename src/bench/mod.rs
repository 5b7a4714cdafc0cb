//! Batch driver for a whole measurement campaign.
//!
//! The configuration spans a run matrix (datasets x start-tree strategies x
//! algorithms x repetitions); the driver executes it run by run, scrapes
//! scores and timings, compares against the reference tree and persists
//! progress after every run so an interrupted campaign resumes where it
//! stopped.

use anyhow::{Context, Result as AnyResult};
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{DatasetPair, ExperimentConfig, LabeledArgs};
use crate::report::{ResultTable, RunRecord};
use crate::scrape::{self, Score};
use crate::tools::Treesearch;
use crate::tree::rf::rf_distance;
use crate::{Result, TreebenchError};

/// One cell of the run matrix.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub index: usize,
    pub dataset: DatasetPair,
    pub starttree: Option<LabeledArgs>,
    pub algorithm: LabeledArgs,
    pub seed: u64,
}

impl RunSpec {
    /// Label recorded in the result table; start-tree strategy and algorithm
    /// are folded into one column.
    pub fn label(&self) -> String {
        match &self.starttree {
            Some(st) => format!("{}-{}", st.label, self.algorithm.label),
            None => self.algorithm.label.clone(),
        }
    }

    /// Stem for this run's artifacts (output tree, captured console text).
    /// Batch scripts and their offline analysis rely on this being stable.
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.dataset.display_name(), self.label(), self.seed)
    }
}

/// Expand the configuration into its full run list. Iteration order is
/// datasets, then start-tree strategies, then algorithms, then repetitions,
/// so the checkpoint index is stable across invocations.
pub fn enumerate_runs(config: &ExperimentConfig) -> Vec<RunSpec> {
    let starttrees: Vec<Option<LabeledArgs>> = if config.starttrees.is_empty() {
        vec![None]
    } else {
        config.starttrees.iter().cloned().map(Some).collect()
    };

    let mut runs = Vec::with_capacity(config.run_count());
    let mut index = 0;
    for dataset in &config.data {
        for starttree in &starttrees {
            for algorithm in &config.algorithms {
                for seed in 0..config.repeat as u64 {
                    runs.push(RunSpec {
                        index,
                        dataset: dataset.clone(),
                        starttree: starttree.clone(),
                        algorithm: algorithm.clone(),
                        seed,
                    });
                    index += 1;
                }
            }
        }
    }
    runs
}

/// Run-matrix checkpoint: partial results next to the configuration file,
/// guarded by a fingerprint of the configuration and the tool executable.
/// When either changes, the partial results describe a different experiment
/// and are discarded.
pub struct Checkpoint {
    progress_path: PathBuf,
    hash_path: PathBuf,
    fingerprint: String,
}

impl Checkpoint {
    pub fn new(config_path: &Path, exe: &Path) -> Result<Self> {
        Ok(Self {
            progress_path: PathBuf::from(format!("{}.progress.csv", config_path.display())),
            hash_path: PathBuf::from(format!("{}.progress.hash", config_path.display())),
            fingerprint: fingerprint(config_path, exe)?,
        })
    }

    pub fn progress_path(&self) -> &Path {
        &self.progress_path
    }

    /// Load partial results if they exist and belong to this experiment.
    pub fn resume(&self) -> Result<Option<ResultTable>> {
        if !self.progress_path.exists() {
            return Ok(None);
        }
        let recorded = match fs::read_to_string(&self.hash_path) {
            Ok(text) => text.trim().to_string(),
            Err(_) => String::new(),
        };
        if recorded != self.fingerprint {
            warn!(
                path = %self.progress_path.display(),
                "configuration or executable changed since the checkpoint was written; discarding it"
            );
            self.clear()?;
            return Ok(None);
        }
        let table = ResultTable::load_csv(&self.progress_path)?;
        Ok(Some(table))
    }

    pub fn save(&self, table: &ResultTable) -> Result<()> {
        table.write_csv(&self.progress_path)?;
        fs::write(&self.hash_path, format!("{}\n", self.fingerprint))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        for path in [&self.progress_path, &self.hash_path] {
            if path.exists() {
                fs::remove_file(path).map_err(|e| {
                    TreebenchError::Checkpoint(format!(
                        "failed to remove {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

/// SHA-256 over the configuration file bytes followed by the executable
/// bytes.
pub fn fingerprint(config_path: &Path, exe: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(fs::read(config_path)?);
    hasher.update(fs::read(exe)?);
    Ok(hex::encode(hasher.finalize()))
}

/// What a finished (or fully resumed) campaign produced.
pub struct MatrixOutcome {
    pub table: ResultTable,
    /// Runs whose RF comparison was degenerate; recorded as NaN rows.
    pub degenerate: usize,
    /// Runs restored from the checkpoint instead of executed.
    pub resumed: usize,
}

/// Execute the full run matrix, resuming from the checkpoint if one is
/// valid. Output trees are written under `outdir`, one file per run.
pub fn run_matrix(
    config_path: &Path,
    config: &ExperimentConfig,
    outdir: &Path,
    threads: usize,
) -> AnyResult<MatrixOutcome> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("failed to create output directory {:?}", outdir))?;

    let tool = Treesearch::new(config.exe.clone(), config.args.clone(), threads)?;
    let checkpoint = Checkpoint::new(config_path, tool.exe())?;

    let runs = enumerate_runs(config);
    let mut table = checkpoint.resume()?.unwrap_or_default();
    if table.len() > runs.len() {
        anyhow::bail!(
            "checkpoint holds {} runs but the matrix only has {}",
            table.len(),
            runs.len()
        );
    }
    let resumed = table.len();
    if resumed > 0 {
        info!(resumed, total = runs.len(), "resuming from checkpoint");
    }

    let bar = ProgressBar::new(runs.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .expect("static progress template")
        .progress_chars("#>-"),
    );
    bar.inc(resumed as u64);

    let mut degenerate = 0;
    for spec in runs.iter().skip(resumed) {
        bar.set_message(format!("{} {} seed {}", spec.dataset.display_name(), spec.label(), spec.seed));

        let record = execute_run(&tool, spec, outdir, &mut degenerate)?;
        table.push(record);
        checkpoint.save(&table)?;
        bar.inc(1);
    }
    bar.finish_with_message("done");

    Ok(MatrixOutcome {
        table,
        degenerate,
        resumed,
    })
}

fn execute_run(
    tool: &Treesearch,
    spec: &RunSpec,
    outdir: &Path,
    degenerate: &mut usize,
) -> AnyResult<RunRecord> {
    let output_tree = outdir.join(format!("{}.tre", spec.file_stem()));

    let starttree_args: &[String] = spec.starttree.as_ref().map_or(&[], |st| st.args.as_slice());
    let run = tool.run_search(
        starttree_args,
        &spec.algorithm.args,
        &spec.dataset.eval,
        &output_tree,
        spec.seed,
    )?;
    if !run.success {
        anyhow::bail!(
            "run {} ({} {} seed {}) failed (exit {:?}):\n{}",
            spec.index,
            spec.dataset.display_name(),
            spec.label(),
            spec.seed,
            run.exit_code,
            run.tail(20)
        );
    }

    let times = scrape::parse_times(&run.output);
    let lqic = scrape::parse_score(&run.output, Score::Lqic, false)?;
    let qpic = scrape::parse_score(&run.output, Score::Qpic, false)?;
    let eqpic = scrape::parse_score(&run.output, Score::Eqpic, false)?;

    let (rf, rf_normalized) = match rf_distance(&output_tree, &spec.dataset.reference) {
        Ok(d) => (d.raw as f64, d.normalized),
        Err(e) if e.is_recoverable() => {
            warn!(
                dataset = %spec.dataset.display_name(),
                algorithm = %spec.label(),
                seed = spec.seed,
                "skipping RF comparison: {e}"
            );
            *degenerate += 1;
            (f64::NAN, f64::NAN)
        }
        Err(e) => return Err(e.into()),
    };

    Ok(RunRecord {
        dataset: spec.dataset.display_name(),
        algorithm: spec.label(),
        seed: spec.seed,
        runtime_start: times.start_tree,
        runtime_count: times.count_quartets,
        runtime_search: times.search + times.search_clustered,
        lqic,
        qpic,
        eqpic,
        rf,
        rf_normalized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_config() -> ExperimentConfig {
        serde_json::from_str(
            r#"{
                "data": [
                    {"eval": "a_all.tre", "reference": "a_ref.tre"},
                    {"eval": "b_all.tre", "reference": "b_ref.tre"}
                ],
                "exe": "treesearch",
                "algorithms": [
                    {"label": "nni", "args": ["-a", "nni"]},
                    {"label": "spr", "args": ["-a", "spr"]}
                ],
                "starttrees": [
                    {"label": "random", "args": ["-s", "random"]}
                ],
                "repeat": 2
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn enumeration_is_dense_and_ordered() {
        let config = sample_config();
        let runs = enumerate_runs(&config);
        assert_eq!(runs.len(), config.run_count());
        for (i, run) in runs.iter().enumerate() {
            assert_eq!(run.index, i);
        }
        // Repetitions are innermost.
        assert_eq!(runs[0].seed, 0);
        assert_eq!(runs[1].seed, 1);
        assert_eq!(runs[0].label(), "random-nni");
        assert_eq!(runs[2].label(), "random-spr");
    }

    #[test]
    fn no_starttrees_still_yields_every_algorithm() {
        let mut config = sample_config();
        config.starttrees.clear();
        let runs = enumerate_runs(&config);
        assert_eq!(runs.len(), 8);
        assert_eq!(runs[0].label(), "nni");
    }

    #[test]
    fn fingerprint_tracks_both_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("conf.json");
        let exe = dir.path().join("tool");
        std::fs::write(&config, "{}").unwrap();
        std::fs::write(&exe, "binary-v1").unwrap();

        let original = fingerprint(&config, &exe).unwrap();
        assert_eq!(original, fingerprint(&config, &exe).unwrap());

        std::fs::write(&exe, "binary-v2").unwrap();
        assert_ne!(original, fingerprint(&config, &exe).unwrap());

        std::fs::write(&exe, "binary-v1").unwrap();
        std::fs::write(&config, "{ }").unwrap();
        assert_ne!(original, fingerprint(&config, &exe).unwrap());
    }

    #[test]
    fn checkpoint_round_trip_and_invalidation() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("conf.json");
        let exe = dir.path().join("tool");
        std::fs::write(&config, "{}").unwrap();
        std::fs::write(&exe, "binary").unwrap();

        let mut table = ResultTable::new();
        table.push(RunRecord {
            dataset: "a".into(),
            algorithm: "nni".into(),
            seed: 0,
            runtime_start: 0.5,
            runtime_count: 1.0,
            runtime_search: 2.0,
            lqic: Some(-3.0),
            qpic: None,
            eqpic: None,
            rf: 4.0,
            rf_normalized: 0.5,
        });

        let checkpoint = Checkpoint::new(&config, &exe).unwrap();
        assert!(checkpoint.resume().unwrap().is_none());
        checkpoint.save(&table).unwrap();

        let restored = Checkpoint::new(&config, &exe)
            .unwrap()
            .resume()
            .unwrap()
            .expect("checkpoint should be valid");
        assert_eq!(restored.records(), table.records());

        // A changed executable invalidates the checkpoint and removes it.
        std::fs::write(&exe, "binary-v2").unwrap();
        let stale = Checkpoint::new(&config, &exe).unwrap();
        assert!(stale.resume().unwrap().is_none());
        assert!(!stale.progress_path().exists());
    }
}
