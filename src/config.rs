//! Declarative JSON experiment configuration.
//!
//! One document describes the whole measurement campaign: dataset pairs,
//! the tool invocation templates, repetition counts and the shaping rules
//! for report generation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{Result, TreebenchError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Dataset pairs: evaluation gene trees plus a reference species tree.
    pub data: Vec<DatasetPair>,

    /// Path to the search tool executable.
    pub exe: PathBuf,

    /// Arguments prepended to every invocation (log level, thread flags...).
    #[serde(default)]
    pub args: Vec<String>,

    /// Labeled argument sets, one per search configuration.
    pub algorithms: Vec<LabeledArgs>,

    /// Optional start-tree strategies crossed with the algorithms.
    #[serde(default)]
    pub starttrees: Vec<LabeledArgs>,

    /// Runs per configuration; the repetition index doubles as random seed.
    #[serde(default = "default_repeat")]
    pub repeat: u32,

    /// ASTRAL-like tool used by `versus` and `correlate`.
    #[serde(default)]
    pub astral: Option<AstralConfig>,

    /// Column shaping for summary exports.
    #[serde(default)]
    pub report: ReportRules,

    /// Preamble lines for generated batch scripts.
    #[serde(default)]
    pub script: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPair {
    /// Multi-tree Newick file handed to the tools as input.
    pub eval: PathBuf,
    /// Single-tree Newick reference for the RF comparison.
    pub reference: PathBuf,
    /// Display name; defaults to the eval file stem.
    #[serde(default)]
    pub name: Option<String>,
}

impl DatasetPair {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .eval
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.eval.display().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledArgs {
    pub label: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstralConfig {
    /// Path to the ASTRAL jar archive.
    pub jar: PathBuf,
    /// Java binary; defaults to `java` on PATH.
    #[serde(default)]
    pub java: Option<PathBuf>,
    /// Extra arguments placed before the input/output flags.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Rename/replace/select/round rules applied to the pivoted summary table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRules {
    /// Column rename map, e.g. `{"runtime_total": "time"}`.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    /// Cell value replacements, e.g. shortening dataset names.
    #[serde(default)]
    pub replace: BTreeMap<String, String>,
    /// Columns to keep, in order; empty keeps everything.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Decimal places in the pivoted table.
    #[serde(default = "default_round")]
    pub round: usize,
}

fn default_repeat() -> u32 {
    1
}

fn default_round() -> usize {
    2
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ExperimentConfig = serde_json::from_str(&text).map_err(|e| {
            TreebenchError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(TreebenchError::Config("no datasets configured".into()));
        }
        if self.algorithms.is_empty() {
            return Err(TreebenchError::Config("no algorithms configured".into()));
        }
        if self.repeat == 0 {
            return Err(TreebenchError::Config("repeat must be at least 1".into()));
        }
        Ok(())
    }

    /// Total number of runs in the matrix.
    pub fn run_count(&self) -> usize {
        let starttrees = self.starttrees.len().max(1);
        self.data.len() * starttrees * self.algorithms.len() * self.repeat as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "data": [
            {"eval": "data/yeast_all.tre", "reference": "data/yeast_reference.tre"},
            {"eval": "data/avian_all.tre", "reference": "data/avian_reference.tre", "name": "avian"}
        ],
        "exe": "build/treesearch",
        "args": ["-l", "Info"],
        "algorithms": [
            {"label": "nni", "args": ["-s", "random", "-a", "nni"]},
            {"label": "combo", "args": ["-s", "random", "-a", "combo", "-x"]}
        ],
        "repeat": 3,
        "report": {
            "rename": {"runtime_total": "time"},
            "columns": ["time", "LQIC", "RF_normalized"]
        }
    }"#;

    #[test]
    fn parses_sample_document() {
        let config: ExperimentConfig = serde_json::from_str(SAMPLE).unwrap();
        config.validate().unwrap();
        assert_eq!(config.data.len(), 2);
        assert_eq!(config.data[0].display_name(), "yeast_all");
        assert_eq!(config.data[1].display_name(), "avian");
        assert_eq!(config.algorithms[1].label, "combo");
        assert_eq!(config.repeat, 3);
        assert_eq!(config.run_count(), 12);
        assert_eq!(config.report.round, 2);
        assert_eq!(
            config.report.rename.get("runtime_total").map(String::as_str),
            Some("time")
        );
    }

    #[test]
    fn rejects_empty_matrix() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{"data": [], "exe": "x", "algorithms": []}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
