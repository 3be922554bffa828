//! Tree building service
//!
//! Streams a field dictionary CSV into the category tree and writes the
//! resulting JSON document.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{BuilderConfig, DomainError, Provenance, RecordSchema, TreeBuilder};
use crate::infrastructure::traits::FileSystem;

/// Outcome of a tree build.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Path the tree document was written to
    pub output: PathBuf,
    /// Data rows read from the CSV
    pub rows: usize,
    /// Rows without any category value
    pub skipped_rows: usize,
    pub total_nodes: usize,
    pub field_nodes: usize,
    pub max_depth: usize,
    /// Names of the first-level categories, in insertion order
    pub top_level_categories: Vec<String>,
    pub elapsed: Duration,
}

/// Undecodable or malformed rows are invalid input; only I/O failures stay operational.
fn csv_error(action: &str, input: &Path, e: csv::Error) -> ApplicationError {
    if e.is_io_error() {
        return ApplicationError::OperationFailed {
            context: format!("{}: {}", action, input.display()),
            source: Box::new(e),
        };
    }
    DomainError::invalid_input(format!("{}: {}", input.display(), e)).into()
}

/// Service converting dictionary CSV files into tree documents.
pub struct TreeService {
    fs: Arc<dyn FileSystem>,
}

impl TreeService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Build the tree from `input` and write it to `output`.
    ///
    /// Records are streamed; progress is logged every `chunk_size` rows.
    #[instrument(level = "debug", skip(self, config))]
    pub fn build(
        &self,
        input: &Path,
        output: &Path,
        config: &BuilderConfig,
    ) -> ApplicationResult<BuildSummary> {
        let started = Instant::now();
        info!("Starting processing at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

        if !self.fs.is_file(input) {
            return Err(ApplicationError::InputNotFound(input.to_path_buf()));
        }
        self.fs
            .ensure_parent(output)
            .with_path_context("create output directory for", output)?;

        info!("Reading CSV file in chunks: {}", input.display());
        info!("Excluding {} columns", config.excluded_columns.len());

        let source = self.fs.open_read(input).with_path_context("open", input)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error("read header of", input, e))?
            .iter()
            .map(str::to_string)
            .collect();
        let schema = RecordSchema::from_header(&header, config)?;
        debug!("build: {} columns in header", header.len());

        let chunk_size = config.chunk_size.max(1);
        let mut builder = TreeBuilder::new(&config.root_name);
        let mut rows = 0;
        let mut skipped_rows = 0;

        for result in reader.records() {
            if rows % chunk_size == 0 {
                info!("Processing chunk {}", rows / chunk_size + 1);
            }
            rows += 1;

            let record = result.map_err(|e| csv_error("read record from", input, e))?;
            let cells: Vec<&str> = record.iter().collect();
            match schema.parse_row(&cells) {
                Some(field) => {
                    builder.add_record(field);
                }
                None => skipped_rows += 1,
            }
        }
        if skipped_rows > 0 {
            debug!("build: skipped {} rows without category", skipped_rows);
        }

        let arena = builder.arena();
        let field_nodes = arena.field_count();
        let top_level_categories = arena.top_level_names();

        let provenance = Provenance {
            generated_at: Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            source_file: input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            excluded_columns: config.excluded_columns.clone(),
        };
        let document = builder.into_document(provenance);
        let (total_nodes, max_depth) = document
            .metadata
            .as_ref()
            .map(|m| (m.total_nodes, m.max_depth))
            .unwrap_or_default();

        let mut json = document.to_json_pretty()?;
        json.push('\n');
        self.fs.write(output, &json).with_path_context("write tree", output)?;

        let elapsed = started.elapsed();
        info!("Writing output to: {}", output.display());
        info!("Processing completed in {:.2} seconds", elapsed.as_secs_f64());
        info!("Total nodes: {}", total_nodes);
        info!("Max depth: {}", max_depth);
        info!(
            "Top-level categories: {}",
            top_level_categories.iter().join(", ")
        );

        Ok(BuildSummary {
            output: output.to_path_buf(),
            rows,
            skipped_rows,
            total_nodes,
            field_nodes,
            max_depth,
            top_level_categories,
            elapsed,
        })
    }
}
