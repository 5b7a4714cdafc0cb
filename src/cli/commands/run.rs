use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::bench::{self, Checkpoint};
use crate::config::ExperimentConfig;
use crate::report::{self, latex};

#[derive(Args)]
pub struct RunArgs {
    /// Experiment configuration (JSON)
    pub config: PathBuf,

    /// Directory for per-run output trees
    #[arg(long, value_name = "DIR", default_value = "runs")]
    pub out_dir: PathBuf,

    /// Basename for result files; defaults to the configuration path
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,

    /// Also write the pivoted summary as a LaTeX tabular
    #[arg(long)]
    pub latex: bool,

    /// Keep the progress checkpoint after the campaign completes
    #[arg(long)]
    pub keep_progress: bool,
}

pub fn run(args: RunArgs, threads: usize) -> Result<()> {
    let config = ExperimentConfig::load(&args.config)?;
    info!(
        runs = config.run_count(),
        datasets = config.data.len(),
        algorithms = config.algorithms.len(),
        "starting experiment matrix"
    );

    let outcome = bench::run_matrix(&args.config, &config, &args.out_dir, threads)?;
    if outcome.degenerate > 0 {
        eprintln!(
            "{} of {} runs had a degenerate RF comparison (recorded as NaN)",
            outcome.degenerate,
            outcome.table.len()
        );
    }

    let base = args.results.unwrap_or_else(|| args.config.clone());
    let write = |suffix: &str, text: String| -> Result<()> {
        let path = PathBuf::from(format!("{}.{}", base.display(), suffix));
        fs::write(&path, text).with_context(|| format!("failed to write {:?}", path))?;
        println!("wrote {}", path.display());
        Ok(())
    };

    let stats = outcome.table.grouped_stats();
    let pivot = outcome.table.pivot(&config.report);

    write("results.csv", outcome.table.to_csv())?;
    write("stats.csv", report::stats_csv(&stats))?;
    write("summary.csv", report::pivot_csv(&pivot))?;
    if args.latex {
        write("summary.tex", latex::render(&pivot))?;
    }

    println!("{}", report::pivot_table(&pivot));

    if !args.keep_progress {
        Checkpoint::new(&args.config, &config.exe)?.clear()?;
    }
    Ok(())
}
