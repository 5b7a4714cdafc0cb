use anyhow::{Context, Result};
use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::ExperimentConfig;
use crate::scrape::{self, Score};
use crate::tools::{Astral, SpeciesTreeTool, Treesearch};
use crate::tree::rf::rf_distance;

#[derive(Args)]
pub struct VersusArgs {
    /// Experiment configuration (JSON); must carry an `astral` section
    pub config: PathBuf,

    /// Directory for the inferred trees
    #[arg(long, value_name = "DIR", default_value = "versus")]
    pub out_dir: PathBuf,

    /// Random seed handed to both tools
    #[arg(long, default_value = "0")]
    pub seed: u64,
}

struct Contender {
    tool: String,
    dataset: String,
    wall: f64,
    lqic: Option<f64>,
    rf_normalized: Option<f64>,
}

pub fn run(args: VersusArgs, threads: usize) -> Result<()> {
    let config = ExperimentConfig::load(&args.config)?;
    let astral_config = config
        .astral
        .as_ref()
        .context("`versus` needs an `astral` section in the configuration")?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create output directory {:?}", args.out_dir))?;

    let search = Treesearch::new(config.exe.clone(), config.args.clone(), threads)?;
    let astral = Astral::new(astral_config)?;

    let mut rows = Vec::new();
    for dataset in &config.data {
        let name = dataset.display_name();

        let search_out = args.out_dir.join(format!("{}_treesearch.tre", name));
        let run = search.infer(&dataset.eval, &search_out, args.seed)?;
        if !run.success {
            anyhow::bail!(
                "search tool failed on {} (exit {:?}):\n{}",
                name,
                run.exit_code,
                run.tail(20)
            );
        }
        rows.push(Contender {
            tool: search.name().to_string(),
            dataset: name.clone(),
            wall: run.wall.as_secs_f64(),
            lqic: scrape::parse_score(&run.output, Score::Lqic, false)?,
            rf_normalized: reference_distance(&search_out, &dataset.reference, &name)?,
        });

        let astral_out = args.out_dir.join(format!("{}_astral.tre", name));
        let run = astral.infer(&dataset.eval, &astral_out, args.seed)?;
        // ASTRAL prints no quartet scores, so its tree is re-scored by the
        // search tool in evaluation mode.
        rows.push(Contender {
            tool: astral.name().to_string(),
            dataset: name.clone(),
            wall: run.wall.as_secs_f64(),
            lqic: Some(search.score_tree(&astral_out, &dataset.eval)?),
            rf_normalized: reference_distance(&astral_out, &dataset.reference, &name)?,
        });
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Dataset", "Tool", "Wall [s]", "LQIC", "RF_normalized"]);
    for row in &rows {
        let cell = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |x| format!("{:.4}", x));
        table.add_row(vec![
            row.dataset.clone(),
            row.tool.clone(),
            format!("{:.2}", row.wall),
            cell(row.lqic),
            cell(row.rf_normalized),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn reference_distance(tree: &Path, reference: &Path, dataset: &str) -> Result<Option<f64>> {
    match rf_distance(tree, reference) {
        Ok(d) => Ok(Some(d.normalized)),
        Err(e) if e.is_recoverable() => {
            warn!(dataset, "skipping RF comparison: {e}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
