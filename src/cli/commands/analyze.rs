use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::bench;
use crate::config::ExperimentConfig;
use crate::report::{self, ResultTable, RunRecord};
use crate::scrape::{self, Score};
use crate::tree::rf::rf_distance;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Experiment configuration (JSON) the script was generated from
    pub config: PathBuf,

    /// Directory holding the `<run>.out` / `<run>.tre` files
    #[arg(long, value_name = "DIR", default_value = "runs")]
    pub out_dir: PathBuf,

    /// Basename for result files; defaults to the configuration path
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,
}

/// Offline counterpart of `run`: instead of executing the tools, scrape the
/// output and tree files a generated script left behind. Runs whose capture
/// file is missing are skipped with a warning, so a partially finished
/// script can still be summarized.
pub fn run(args: AnalyzeArgs) -> Result<()> {
    let config = ExperimentConfig::load(&args.config)?;

    let mut table = ResultTable::new();
    let mut missing = 0;
    let mut degenerate = 0;
    for spec in bench::enumerate_runs(&config) {
        let stem = spec.file_stem();
        let capture = args.out_dir.join(format!("{}.out", stem));
        let tree = args.out_dir.join(format!("{}.tre", stem));

        let output = match fs::read_to_string(&capture) {
            Ok(text) => text,
            Err(_) => {
                warn!(path = %capture.display(), "no captured output for this run; skipping");
                missing += 1;
                continue;
            }
        };

        let times = scrape::parse_times(&output);
        let (rf, rf_normalized) = match rf_distance(&tree, &spec.dataset.reference) {
            Ok(d) => (d.raw as f64, d.normalized),
            Err(e) if e.is_recoverable() => {
                warn!(run = %stem, "skipping RF comparison: {e}");
                degenerate += 1;
                (f64::NAN, f64::NAN)
            }
            Err(e) => return Err(e.into()),
        };

        table.push(RunRecord {
            dataset: spec.dataset.display_name(),
            algorithm: spec.label(),
            seed: spec.seed,
            runtime_start: times.start_tree,
            runtime_count: times.count_quartets,
            runtime_search: times.search + times.search_clustered,
            lqic: scrape::parse_score(&output, Score::Lqic, false)?,
            qpic: scrape::parse_score(&output, Score::Qpic, false)?,
            eqpic: scrape::parse_score(&output, Score::Eqpic, false)?,
            rf,
            rf_normalized,
        });
    }

    if table.is_empty() {
        anyhow::bail!(
            "no captured runs found under {:?}; was the script executed there?",
            args.out_dir
        );
    }
    if missing > 0 {
        eprintln!("{} runs had no captured output", missing);
    }
    if degenerate > 0 {
        eprintln!("{} runs had a degenerate RF comparison", degenerate);
    }

    let base = args.results.unwrap_or_else(|| args.config.clone());
    let stats = table.grouped_stats();
    let pivot = table.pivot(&config.report);

    let write = |suffix: &str, text: String| -> Result<()> {
        let path = PathBuf::from(format!("{}.{}", base.display(), suffix));
        fs::write(&path, text).with_context(|| format!("failed to write {:?}", path))?;
        println!("wrote {}", path.display());
        Ok(())
    };
    write("results.csv", table.to_csv())?;
    write("stats.csv", report::stats_csv(&stats))?;
    write("summary.csv", report::pivot_csv(&pivot))?;

    println!("{}", report::pivot_table(&pivot));
    Ok(())
}
