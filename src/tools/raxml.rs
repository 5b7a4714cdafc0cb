use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::tree::Topology;

/// Legacy RF backend: both trees are derooted, concatenated into one file
/// and handed to RAxML in Robinson-Foulds mode (`-f r`), whose distances
/// file is then parsed.
///
/// RAxML insists on fixed-name artifacts (`trees`, `RAxML_info.<run>`,
/// `RAxML_RF-Distances.<run>`) in its working directory, so concurrent
/// comparisons must use distinct working directories.
pub struct RaxmlRf {
    binary: PathBuf,
    workdir: PathBuf,
    run_name: String,
}

impl RaxmlRf {
    pub fn new(binary: PathBuf, workdir: PathBuf) -> Result<Self> {
        if !binary.exists() {
            anyhow::bail!("RAxML binary not found at {:?}", binary);
        }
        Ok(Self {
            binary,
            workdir,
            run_name: "TEST".to_string(),
        })
    }

    fn info_file(&self) -> PathBuf {
        self.workdir.join(format!("RAxML_info.{}", self.run_name))
    }

    fn distances_file(&self) -> PathBuf {
        self.workdir
            .join(format!("RAxML_RF-Distances.{}", self.run_name))
    }

    fn trees_file(&self) -> PathBuf {
        self.workdir.join("trees")
    }

    fn remove_stale_artifacts(&self) -> Result<()> {
        for path in [self.info_file(), self.distances_file(), self.trees_file()] {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove stale {:?}", path))?;
            }
        }
        Ok(())
    }

    /// Raw and pre-normalized RF distance between two tree files, as
    /// computed by RAxML.
    pub fn compare(&self, tree_a: &Path, tree_b: &Path) -> Result<(f64, f64)> {
        self.remove_stale_artifacts()?;

        let a = Topology::from_newick_file(tree_a)?.deroot();
        let b = Topology::from_newick_file(tree_b)?.deroot();
        let merged = format!("{}\n{}\n", a.to_newick(), b.to_newick());
        fs::write(self.trees_file(), merged)
            .with_context(|| format!("failed to write {:?}", self.trees_file()))?;

        debug!(binary = ?self.binary, workdir = ?self.workdir, "invoking RAxML -f r");
        let output = Command::new(&self.binary)
            .current_dir(&self.workdir)
            .args([
                "-m", "GTRCAT", "-z", "trees", "-f", "r", "-n", &self.run_name,
            ])
            .output()
            .with_context(|| format!("failed to start {:?}", self.binary))?;

        let distances = self.distances_file();
        if !distances.exists() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            anyhow::bail!(
                "RAxML produced no distances file (exit {:?}):\n{}",
                output.status.code(),
                text
            );
        }

        let result = Self::parse_distances(&fs::read_to_string(&distances)?)
            .with_context(|| format!("unexpected layout in {:?}", distances))?;
        Ok(result)
    }

    /// The distances file is one whitespace-delimited line; field 2 holds
    /// the raw RF count and field 3 the pre-normalized distance.
    fn parse_distances(text: &str) -> Result<(f64, f64)> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < 4 {
            anyhow::bail!("expected at least 4 fields, got {}", fields.len());
        }
        let raw: f64 = fields[2]
            .parse()
            .with_context(|| format!("bad raw distance field {:?}", fields[2]))?;
        let normalized: f64 = fields[3]
            .parse()
            .with_context(|| format!("bad normalized distance field {:?}", fields[3]))?;
        Ok((raw, normalized))
    }
}
