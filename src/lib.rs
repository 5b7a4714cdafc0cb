pub mod bench;
pub mod cli;
pub mod config;
pub mod report;
pub mod scrape;
pub mod tools;
pub mod tree;

pub use crate::tree::rf::{normalized_rf_distance, rf_distance, RfDistance};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreebenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse tree file {path:?}: {reason}")]
    TreeParse { path: PathBuf, reason: String },

    #[error("degenerate comparison: {0}")]
    Degenerate(String),

    #[error("tree could not be unrooted: {0}")]
    Unroot(String),

    #[error("marker {marker:?} not found in tool output")]
    MissingMarker { marker: String },

    #[error("external tool error: {0}")]
    Tool(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

impl TreebenchError {
    /// Recoverable errors are tallied per comparison by batch drivers;
    /// everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TreebenchError::Degenerate(_))
    }
}

pub type Result<T> = std::result::Result<T, TreebenchError>;
