use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::bench;
use crate::config::ExperimentConfig;
use crate::report::plot;

#[derive(Args)]
pub struct CorrelateArgs {
    /// Experiment configuration (JSON); `repeat` controls the sample size
    pub config: PathBuf,

    /// Directory for per-run output trees
    #[arg(long, value_name = "DIR", default_value = "runs")]
    pub out_dir: PathBuf,

    /// Scatter plot destination (PNG)
    #[arg(long, value_name = "FILE")]
    pub plot: Option<PathBuf>,
}

/// How well does the quartet score predict topological accuracy? Runs the
/// matrix, then correlates per-run LQIC with normalized RF distance.
pub fn run(args: CorrelateArgs, threads: usize) -> Result<()> {
    let config = ExperimentConfig::load(&args.config)?;
    let outcome = bench::run_matrix(&args.config, &config, &args.out_dir, threads)?;

    let points: Vec<(f64, f64)> = outcome
        .table
        .records()
        .iter()
        .filter_map(|r| match (r.lqic, r.rf_normalized) {
            (Some(lqic), rf) if rf.is_finite() => Some((lqic, rf)),
            _ => None,
        })
        .collect();

    if points.len() < 2 {
        anyhow::bail!(
            "only {} runs carry both an LQIC score and an RF distance; \
             nothing to correlate (is `repeat` large enough?)",
            points.len()
        );
    }

    let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let r = plot::pearson(&xs, &ys);
    println!("runs:                {}", points.len());
    println!("Pearson correlation: {:.4}", r);

    let plot_path = args
        .plot
        .unwrap_or_else(|| PathBuf::from(format!("{}.scatter.png", args.config.display())));
    plot::scatter(&points, "LQIC vs normalized RF distance", &plot_path)?;
    println!("wrote {}", plot_path.display());
    Ok(())
}
