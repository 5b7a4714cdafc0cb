use anyhow::{Context, Result};
use clap::Args;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use crate::bench;
use crate::config::ExperimentConfig;
use crate::tools::treesearch::search_arg_vector;

#[derive(Args)]
pub struct ScriptArgs {
    /// Experiment configuration (JSON)
    pub config: PathBuf,

    /// Directory the script writes its trees and captured output into
    #[arg(long, value_name = "DIR", default_value = "runs")]
    pub out_dir: PathBuf,

    /// Write the script here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Thread count baked into the generated commands
    #[arg(long, default_value = "1")]
    pub script_threads: usize,
}

/// Emit a shell script that executes the run matrix without this harness,
/// for clusters where only a batch queue is available. Each run `tee`s its
/// console output next to its tree so `analyze` can scrape it later.
pub fn run(args: ScriptArgs) -> Result<()> {
    let config = ExperimentConfig::load(&args.config)?;

    let mut script = String::from("#!/bin/sh\nset -e\n");
    writeln!(
        &mut script,
        "# generated from {} on {}",
        args.config.display(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
    .expect("write to string");
    for line in &config.script {
        writeln!(&mut script, "{}", line).expect("write to string");
    }
    writeln!(&mut script, "mkdir -p {}", args.out_dir.display()).expect("write to string");

    for spec in bench::enumerate_runs(&config) {
        let stem = spec.file_stem();
        let output_tree = args.out_dir.join(format!("{}.tre", stem));
        let starttree_args = spec.starttree.as_ref().map_or(&[][..], |st| st.args.as_slice());
        let argv = search_arg_vector(
            &config.args,
            starttree_args,
            &spec.algorithm.args,
            &spec.dataset.eval,
            &output_tree,
            spec.seed,
            args.script_threads,
        );
        writeln!(
            &mut script,
            "{} {} | tee {}",
            config.exe.display(),
            argv.join(" "),
            args.out_dir.join(format!("{}.out", stem)).display()
        )
        .expect("write to string");
    }

    match args.output {
        Some(path) => {
            fs::write(&path, script).with_context(|| format!("failed to write {:?}", path))?;
            println!("wrote {}", path.display());
        }
        None => print!("{}", script),
    }
    Ok(())
}
