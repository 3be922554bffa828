//! Radius analysis service
//!
//! Locates and loads a tree document, runs the radius engine on it and
//! writes the report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::render::{RadiusReport, ReportFormat};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{analyze, RadiusConfig, TreeDocument};
use crate::infrastructure::traits::FileSystem;

/// Service computing ring radii for tree documents.
pub struct RadiusService {
    fs: Arc<dyn FileSystem>,
}

impl RadiusService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Pick the tree document to analyze.
    ///
    /// An explicit path must exist. Without one the first existing candidate wins.
    pub fn resolve_tree_path(
        &self,
        explicit: Option<&Path>,
        candidates: &[PathBuf],
    ) -> ApplicationResult<PathBuf> {
        if let Some(path) = explicit {
            return if self.fs.is_file(path) {
                Ok(path.to_path_buf())
            } else {
                Err(ApplicationError::InputNotFound(path.to_path_buf()))
            };
        }

        for candidate in candidates {
            if self.fs.is_file(candidate) {
                info!("Found tree data at: {}", candidate.display());
                return Ok(candidate.clone());
            }
            debug!("resolve_tree_path: not found {}", candidate.display());
        }
        Err(ApplicationError::NoTreeFound {
            candidates: candidates.to_vec(),
        })
    }

    /// Read and parse a tree document.
    pub fn load(&self, path: &Path) -> ApplicationResult<TreeDocument> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read tree", path)?;
        Ok(TreeDocument::from_json_str(&content)?)
    }

    /// Collect statistics and compute radii for the tree at `path`.
    #[instrument(level = "debug", skip(self, config))]
    pub fn analyze(&self, path: &Path, config: &RadiusConfig) -> ApplicationResult<RadiusReport> {
        let document = self.load(path)?;
        let analysis = analyze(Some(&document.root), config)?;
        debug!("analyze: {} levels", analysis.radii.len());
        Ok(RadiusReport::from_analysis(&analysis))
    }

    /// Render the report and write it to `output`.
    pub fn write_report(
        &self,
        report: &RadiusReport,
        output: &Path,
        format: ReportFormat,
    ) -> ApplicationResult<()> {
        let rendered = report.render(format)?;
        self.fs
            .ensure_parent(output)
            .with_path_context("create output directory for", output)?;
        self.fs
            .write(output, &rendered)
            .with_path_context("write report", output)?;
        info!("Configuration written to {}", output.display());
        Ok(())
    }
}
