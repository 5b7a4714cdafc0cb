use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::tools::RaxmlRf;
use crate::tree::rf::rf_distance;

#[derive(Args)]
pub struct CompareArgs {
    /// First tree file (single Newick tree)
    pub tree_a: PathBuf,

    /// Second tree file
    pub tree_b: PathBuf,

    /// Delegate the comparison to a RAxML binary instead of computing it
    /// natively
    #[arg(long, value_name = "BIN")]
    pub raxml: Option<PathBuf>,

    /// Working directory for RAxML's fixed-name artifacts
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    /// Also print raw distance, shared taxon count and internal edge count
    #[arg(long)]
    pub details: bool,
}

pub fn run(args: CompareArgs) -> Result<()> {
    if let Some(binary) = args.raxml {
        let backend = RaxmlRf::new(binary, args.workdir)?;
        let (raw, normalized) = backend.compare(&args.tree_a, &args.tree_b)?;
        if args.details {
            println!("raw RF distance:        {}", raw);
        }
        println!("normalized RF distance: {}", normalized);
        return Ok(());
    }

    let distance = rf_distance(&args.tree_a, &args.tree_b)?;
    if args.details {
        println!("raw RF distance:        {}", distance.raw);
        println!("shared taxa:            {}", distance.shared_taxa);
        println!("internal edges:         {}", distance.internal_edges);
    }
    println!("normalized RF distance: {}", distance.normalized);
    Ok(())
}
