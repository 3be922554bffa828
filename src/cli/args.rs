//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::ReportFormat;
use crate::domain::RadiusConfig;

/// Build data-dictionary trees and size the rings of their radial layout
#[derive(Parser, Debug)]
#[command(name = "radtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file replacing ./.radtree.toml
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the tree document from a field dictionary CSV
    Build {
        /// Dictionary CSV (default: paths.input_csv)
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        /// Tree JSON to write (default: paths.tree_json)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Rows per progress report
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Compute per-level ring radii for a tree document
    Radii {
        /// Tree JSON (default: first existing of paths.tree_candidates)
        #[arg(value_hint = ValueHint::FilePath)]
        tree: Option<PathBuf>,
        /// Report file (default: paths.radii_output)
        #[arg(short, long, value_hint = ValueHint::FilePath, conflicts_with = "stdout")]
        output: Option<PathBuf>,
        /// Report format (default: from output extension)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
        /// Print the report instead of writing a file
        #[arg(long)]
        stdout: bool,
        #[command(flatten)]
        overrides: RadiusOverrides,
    },

    /// Print a tree document as an indented tree
    Show {
        /// Tree JSON (default: first existing of paths.tree_candidates)
        #[arg(value_hint = ValueHint::FilePath)]
        tree: Option<PathBuf>,
        /// Deepest level to print
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Create a config file from the template
    Init {
        /// Create in the global config directory instead of ./.radtree.toml
        #[arg(short, long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Show config file locations
    Path,
    /// Open a config file in the editor
    Edit {
        /// Edit the global config instead of ./.radtree.toml
        #[arg(short, long)]
        global: bool,
    },
}

/// Report format on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    /// TypeScript module for the front-end
    Ts,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Ts => ReportFormat::TypeScript,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// Per-invocation overrides of the `[radius]` settings.
#[derive(Args, Debug, Default, Clone)]
pub struct RadiusOverrides {
    /// Label font size in points
    #[arg(long)]
    pub font_size: Option<f64>,
    #[arg(long)]
    pub pt_to_px: Option<f64>,
    /// Pixels added per node
    #[arg(long)]
    pub min_spacing: Option<f64>,
    /// Minimum ratio between consecutive levels
    #[arg(long)]
    pub min_radius_growth: Option<f64>,
    #[arg(long)]
    pub inner_level_buffer: Option<f64>,
    /// Spacing multiplier for levels holding field nodes
    #[arg(long)]
    pub field_node_spacing_factor: Option<f64>,
    #[arg(long)]
    pub label_weight_avg: Option<f64>,
    #[arg(long)]
    pub label_weight_max: Option<f64>,
    /// Floor for the first ring
    #[arg(long)]
    pub min_inner_radius: Option<f64>,
    /// Fraction of the circumference labels may use
    #[arg(long)]
    pub max_label_density: Option<f64>,
    /// Inflation per level beyond the first
    #[arg(long)]
    pub depth_safety_step: Option<f64>,
}

impl RadiusOverrides {
    /// Apply the given overrides on top of `base`.
    pub fn apply_to(&self, base: RadiusConfig) -> RadiusConfig {
        RadiusConfig {
            font_size: self.font_size.unwrap_or(base.font_size),
            pt_to_px: self.pt_to_px.unwrap_or(base.pt_to_px),
            min_spacing: self.min_spacing.unwrap_or(base.min_spacing),
            min_radius_growth: self.min_radius_growth.unwrap_or(base.min_radius_growth),
            inner_level_buffer: self.inner_level_buffer.unwrap_or(base.inner_level_buffer),
            field_node_spacing_factor: self
                .field_node_spacing_factor
                .unwrap_or(base.field_node_spacing_factor),
            label_weight_avg: self.label_weight_avg.unwrap_or(base.label_weight_avg),
            label_weight_max: self.label_weight_max.unwrap_or(base.label_weight_max),
            min_inner_radius: self.min_inner_radius.unwrap_or(base.min_inner_radius),
            max_label_density: self.max_label_density.unwrap_or(base.max_label_density),
            depth_safety_step: self.depth_safety_step.unwrap_or(base.depth_safety_step),
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_overrides_when_applied_then_base_unchanged() {
        let base = RadiusConfig::default();
        assert_eq!(RadiusOverrides::default().apply_to(base), base);
    }

    #[test]
    fn given_radii_flags_when_parsed_then_overrides_set() {
        let cli = Cli::parse_from([
            "radtree",
            "radii",
            "tree.json",
            "--font-size",
            "10",
            "--format",
            "json",
            "-dd",
        ]);
        assert_eq!(cli.debug, 2);
        match cli.command {
            Commands::Radii {
                tree,
                format,
                overrides,
                ..
            } => {
                assert_eq!(tree, Some(PathBuf::from("tree.json")));
                assert_eq!(format, Some(FormatArg::Json));
                let config = overrides.apply_to(RadiusConfig::default());
                assert_eq!(config.font_size, 10.0);
                assert_eq!(config.min_spacing, 10.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
