use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::debug;

use super::traits::{CapturedRun, SpeciesTreeTool};
use crate::scrape::{self, Score};

/// Full argument vector for one search invocation. Shared between direct
/// execution and batch-script generation, so both agree on the flag layout.
pub fn search_arg_vector(
    base_args: &[String],
    starttree_args: &[String],
    algorithm_args: &[String],
    eval_trees: &Path,
    output_tree: &Path,
    seed: u64,
    threads: usize,
) -> Vec<String> {
    let mut args = base_args.to_vec();
    args.extend(starttree_args.iter().cloned());
    args.extend(algorithm_args.iter().cloned());
    args.extend([
        "-e".to_string(),
        eval_trees.display().to_string(),
        "-o".to_string(),
        output_tree.display().to_string(),
        "--seed".to_string(),
        seed.to_string(),
        "-t".to_string(),
        threads.to_string(),
    ]);
    args
}

/// Runner for the quartet-based search tool.
///
/// The tool is a black box: configuration goes in as command-line flags,
/// results come back as an output tree file plus free-text console output
/// that the `scrape` grammar picks apart.
pub struct Treesearch {
    exe: PathBuf,
    base_args: Vec<String>,
    threads: usize,
}

impl Treesearch {
    pub fn new(exe: PathBuf, base_args: Vec<String>, threads: usize) -> Result<Self> {
        if !exe.exists() {
            anyhow::bail!("search tool not found at {:?}", exe);
        }
        Ok(Self {
            exe,
            base_args,
            threads,
        })
    }

    /// Executable path, used for checkpoint fingerprinting.
    pub fn exe(&self) -> &Path {
        &self.exe
    }

    fn capture(&self, args: &[String]) -> Result<CapturedRun> {
        debug!(exe = ?self.exe, ?args, "invoking search tool");
        let started = Instant::now();
        let output = Command::new(&self.exe)
            .args(args)
            .output()
            .with_context(|| format!("failed to start {:?}", self.exe))?;
        let wall = started.elapsed();

        // The tool logs to both streams; scraping wants one text.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CapturedRun {
            output: text,
            exit_code: output.status.code(),
            success: output.status.success(),
            wall,
        })
    }

    /// One configured search run: base args, then the start-tree strategy
    /// and algorithm flags, then input/output/seed/threads.
    pub fn run_search(
        &self,
        starttree_args: &[String],
        algorithm_args: &[String],
        eval_trees: &Path,
        output_tree: &Path,
        seed: u64,
    ) -> Result<CapturedRun> {
        let args = search_arg_vector(
            &self.base_args,
            starttree_args,
            algorithm_args,
            eval_trees,
            output_tree,
            seed,
            self.threads,
        );
        self.capture(&args)
    }

    /// Score an existing tree against the evaluation trees by running the
    /// no-op algorithm with that tree as the start tree. Used to obtain LQIC
    /// values for trees produced by other tools; here the score marker is
    /// mandatory.
    pub fn score_tree(&self, tree: &Path, eval_trees: &Path) -> Result<f64> {
        let mut args = self.base_args.clone();
        args.extend([
            "-a".to_string(),
            "no".to_string(),
            "-e".to_string(),
            eval_trees.display().to_string(),
            "--starttree".to_string(),
            tree.display().to_string(),
        ]);
        let run = self.capture(&args)?;
        if !run.success {
            anyhow::bail!(
                "scoring {:?} failed (exit {:?}):\n{}",
                tree,
                run.exit_code,
                run.tail(20)
            );
        }
        let score = scrape::parse_score(&run.output, Score::Lqic, true)?
            .expect("mandatory score is present on Ok");
        Ok(score)
    }
}

impl SpeciesTreeTool for Treesearch {
    fn name(&self) -> &str {
        "treesearch"
    }

    fn infer(&self, eval_trees: &Path, output_tree: &Path, seed: u64) -> Result<CapturedRun> {
        self.run_search(&[], &[], eval_trees, output_tree, seed)
    }
}
