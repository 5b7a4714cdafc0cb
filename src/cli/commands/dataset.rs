use anyhow::{Context, Result};
use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::tree::rf::rf_distance_topologies;
use crate::tree::Topology;

#[derive(Args)]
pub struct DatasetArgs {
    /// Directory scanned for `.tre` files
    pub dir: PathBuf,

    /// Print every pairwise distance, not only the summary
    #[arg(long)]
    pub pairs: bool,
}

/// Pairwise normalized RF across every tree file of a directory, as a
/// homogeneity measure for a gene tree collection.
pub fn run(args: DatasetArgs) -> Result<()> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(&args.dir)
        .with_context(|| format!("failed to read directory {:?}", args.dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "tre"))
        .collect();
    files.sort();

    if files.len() < 2 {
        anyhow::bail!(
            "need at least two .tre files in {:?}, found {}",
            args.dir,
            files.len()
        );
    }

    let trees: Vec<(PathBuf, Topology)> = files
        .into_iter()
        .map(|path| Topology::from_newick_file(&path).map(|t| (path, t)))
        .collect::<crate::Result<_>>()?;

    let mut distances = Vec::new();
    let mut degenerate = 0;
    for i in 0..trees.len() {
        for j in (i + 1)..trees.len() {
            let (path_a, a) = &trees[i];
            let (path_b, b) = &trees[j];
            match rf_distance_topologies(a, b) {
                Ok(d) => {
                    if args.pairs {
                        println!(
                            "{}\t{}\t{}",
                            path_a.display(),
                            path_b.display(),
                            d.normalized
                        );
                    }
                    distances.push(d.normalized);
                }
                Err(e) if e.is_recoverable() => {
                    debug!(a = %path_a.display(), b = %path_b.display(), "degenerate pair: {e}");
                    degenerate += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    if distances.is_empty() {
        warn!("every pair was degenerate; the trees share too few taxa");
    }
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    let variance = if distances.len() < 2 {
        f64::NAN
    } else {
        distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0)
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Trees", "Pairs", "Degenerate", "Mean RF", "Variance"]);
    table.add_row(vec![
        trees.len().to_string(),
        distances.len().to_string(),
        degenerate.to_string(),
        format!("{:.4}", mean),
        format!("{:.4}", variance),
    ]);
    println!("{table}");
    Ok(())
}
