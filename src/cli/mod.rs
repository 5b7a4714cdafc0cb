pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "treebench",
    version,
    about = "Benchmark harness for quartet-based species tree inference",
    long_about = "Treebench drives quartet-based tree search and ASTRAL over collections of \
                  gene trees, scrapes quality scores and timings from their output, and \
                  compares the inferred species trees against references via the normalized \
                  Robinson-Foulds distance."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Threads handed to external tools (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalized Robinson-Foulds distance between two tree files
    Compare(commands::compare::CompareArgs),

    /// Execute a full experiment matrix with checkpointing
    Run(commands::run::RunArgs),

    /// Head-to-head comparison of the search tool against ASTRAL
    Versus(commands::versus::VersusArgs),

    /// Emit a shell script that runs the matrix offline
    Script(commands::script::ScriptArgs),

    /// Analyze captured output files from an offline script run
    Analyze(commands::analyze::AnalyzeArgs),

    /// Correlate LQIC scores with RF distance over repeated runs
    Correlate(commands::correlate::CorrelateArgs),

    /// Pairwise RF distances across the tree files of a directory
    Dataset(commands::dataset::DatasetArgs),
}
