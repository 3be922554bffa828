//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/radtree/radtree.toml`
//! 3. Local config: `./.radtree.toml` or the file given with `--config`
//! 4. Environment variables: `RADTREE_<SECTION>__<KEY>`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{BuilderConfig, RadiusConfig};

/// Name of the local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".radtree.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "RADTREE";

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathSettings {
    /// Field dictionary CSV read by `build`
    pub input_csv: PathBuf,
    /// Tree document written by `build`
    pub tree_json: PathBuf,
    /// Tree documents tried in order by `radii` and `show`
    pub tree_candidates: Vec<PathBuf>,
    /// Report written by `radii`
    pub radii_output: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        let tree_json = PathBuf::from("data_processed/uk_biobank_features.json");
        Self {
            input_csv: PathBuf::from("data_raw/uk_biobank_features.csv"),
            tree_candidates: vec![
                tree_json.clone(),
                PathBuf::from("public/graph-data/uk_biobank_features.json"),
                PathBuf::from("graph-data/uk_biobank_features.json"),
                PathBuf::from("./uk_biobank_features.json"),
            ],
            tree_json,
            radii_output: PathBuf::from("optimal_radii_config.ts"),
        }
    }
}

/// Unified configuration for radtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Editor command for `config edit` (default: $VISUAL, $EDITOR or vim)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    pub paths: PathSettings,
    pub builder: BuilderConfig,
    pub radius: RadiusConfig,
}

/// Get the XDG config directory for radtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "radtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("radtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE)
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// `local` replaces the `./.radtree.toml` lookup; an explicitly given file must exist.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.is_file());
        let local = match local {
            Some(path) if !path.is_file() => {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                })
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(local_config_path(Path::new("."))).filter(|p| p.is_file()),
        };
        Self::load_from(global.as_deref(), local.as_deref(), None)
    }

    /// Load settings from explicit layers.
    ///
    /// `env` replaces the process environment as source of overrides.
    pub fn load_from(
        global: Option<&Path>,
        local: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default()).map_err(config_err)?);

        for path in [global, local].into_iter().flatten() {
            debug!("load_from: config file {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let mut settings: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_err)?;

        settings.expand_paths();
        settings.radius.validate()?;
        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        let paths = &mut self.paths;
        for path in [
            &mut paths.input_csv,
            &mut paths.tree_json,
            &mut paths.radii_output,
        ]
        .into_iter()
        .chain(paths.tree_candidates.iter_mut())
        {
            *path = expand_path(path);
        }
        if let Some(editor) = self.editor.as_mut() {
            *editor = expand_str(editor);
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# radtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/radtree/radtree.toml
#   Local:  ./.radtree.toml (or --config FILE)
#   Env:    RADTREE_<SECTION>__<KEY>, e.g. RADTREE_RADIUS__FONT_SIZE=10

# Editor for `radtree config edit`
# editor = "vim"

[paths]
# input_csv = "data_raw/uk_biobank_features.csv"
# tree_json = "data_processed/uk_biobank_features.json"
# tree_candidates = [
#     "data_processed/uk_biobank_features.json",
#     "public/graph-data/uk_biobank_features.json",
#     "graph-data/uk_biobank_features.json",
#     "./uk_biobank_features.json",
# ]
# radii_output = "optimal_radii_config.ts"

[builder]
# root_name = "UKB"
# category_columns = ["category_level_1", "category_level_2", "category_level_3"]
# array_separator = ";"
# chunk_size = 10000

[radius]
# Label font size in points
# font_size = 8.0
# pt_to_px = 1.333
# char_width_factor = 0.6
# Pixels added per node
# min_spacing = 10.0
# Minimum ratio between consecutive levels
# min_radius_growth = 1.2
# inner_level_buffer = 40.0
# field_node_spacing_factor = 1.5
# Weights of average and maximum label length, must sum to 1
# label_weight_avg = 0.7
# label_weight_max = 0.3
# min_inner_radius = 200.0
# max_label_density = 0.85
# depth_safety_step = 0.1
"#
        .to_string()
    }
}

fn expand_str(value: &str) -> String {
    shellexpand::full(value)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_str(&path.to_string_lossy()))
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
