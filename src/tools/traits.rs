use anyhow::Result;
use std::path::Path;
use std::time::Duration;

/// Captured outcome of one synchronous tool invocation.
#[derive(Debug, Clone)]
pub struct CapturedRun {
    /// Combined stdout and stderr, stdout first.
    pub output: String,
    /// Exit code if the process terminated normally.
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Wall-clock duration of the invocation.
    pub wall: Duration,
}

impl CapturedRun {
    /// Last lines of the captured text, for error messages.
    pub fn tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.output.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Common interface over the species-tree inference tools so drivers can
/// iterate a mixed tool list from one configuration.
pub trait SpeciesTreeTool {
    /// Short name used in result tables.
    fn name(&self) -> &str;

    /// Infer a species tree from a multi-tree input file, writing the result
    /// to `output_tree`.
    fn infer(&self, eval_trees: &Path, output_tree: &Path, seed: u64) -> Result<CapturedRun>;
}
