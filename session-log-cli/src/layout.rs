//! Output directory layout

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the count summary written next to the bridged tables
pub const COUNTS_FILE_NAME: &str = "Final_Counts.csv";

/// Where each pipeline stage writes its files
#[derive(Debug, Clone)]
pub struct OutputLayout {
    /// Tab-delimited conversions of the raw inputs
    pub converted: PathBuf,
    /// Merger output (one row per distinct time)
    pub aligned: PathBuf,
    /// Expanded indicator tables
    pub raster: PathBuf,
    /// Per-group files fed to bridging
    pub final_dir: PathBuf,
    /// Bridged sessions and the count summary
    pub bridged: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            converted: root.join("converted"),
            aligned: root.join("aligned"),
            raster: root.join("raster"),
            final_dir: root.join("final"),
            bridged: root.join("bridged"),
        }
    }

    /// Create every output directory
    ///
    /// This is the only failure that stops a run.
    pub fn create(&self) -> Result<()> {
        for dir in [&self.converted, &self.aligned, &self.raster, &self.final_dir, &self.bridged] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
        }
        Ok(())
    }

    pub fn counts_file(&self) -> PathBuf {
        self.bridged.join(COUNTS_FILE_NAME)
    }
}
