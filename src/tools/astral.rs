use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::debug;

use super::traits::{CapturedRun, SpeciesTreeTool};
use crate::config::AstralConfig;

/// Runner for the ASTRAL-like species-tree tool, invoked as a Java archive.
///
/// Its only result contract is the output tree file; the console text has no
/// score markers, so quality scores for ASTRAL trees come from re-scoring
/// with the search tool.
pub struct Astral {
    java: PathBuf,
    jar: PathBuf,
    extra_args: Vec<String>,
}

impl Astral {
    pub fn new(config: &AstralConfig) -> Result<Self> {
        if !config.jar.exists() {
            anyhow::bail!("ASTRAL jar not found at {:?}", config.jar);
        }
        Ok(Self {
            java: config
                .java
                .clone()
                .unwrap_or_else(|| PathBuf::from("java")),
            jar: config.jar.clone(),
            extra_args: config.args.clone(),
        })
    }
}

impl SpeciesTreeTool for Astral {
    fn name(&self) -> &str {
        "astral"
    }

    fn infer(&self, eval_trees: &Path, output_tree: &Path, seed: u64) -> Result<CapturedRun> {
        let mut args = vec!["-jar".to_string(), self.jar.display().to_string()];
        args.extend(self.extra_args.iter().cloned());
        args.extend([
            "-i".to_string(),
            eval_trees.display().to_string(),
            "-o".to_string(),
            output_tree.display().to_string(),
            "--seed".to_string(),
            seed.to_string(),
        ]);
        debug!(java = ?self.java, ?args, "invoking ASTRAL");

        let started = Instant::now();
        let output = Command::new(&self.java)
            .args(&args)
            .output()
            .with_context(|| format!("failed to start {:?}", self.java))?;
        let wall = started.elapsed();

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let run = CapturedRun {
            output: text,
            exit_code: output.status.code(),
            success: output.status.success(),
            wall,
        };

        if !run.success {
            anyhow::bail!("ASTRAL failed (exit {:?}):\n{}", run.exit_code, run.tail(20));
        }
        if !output_tree.exists() {
            anyhow::bail!("ASTRAL exited cleanly but produced no tree at {:?}", output_tree);
        }
        Ok(run)
    }
}
