//! Integration tests for Settings config loading with layered precedence.
//!
//! Uses explicit layers and environment maps so that neither the user's
//! global config nor the process environment leaks into the results.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use radtree::application::ApplicationError;
use radtree::config::{local_config_path, Settings};
use radtree::domain::DomainError;

fn no_env() -> Option<HashMap<String, String>> {
    Some(HashMap::new())
}

#[test]
fn given_local_config_when_load_then_sections_override_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let local = local_config_path(dir.path());
    fs::write(
        &local,
        r#"
[paths]
tree_json = "build/tree.json"
tree_candidates = ["build/tree.json"]

[builder]
root_name = "Dictionary"
category_columns = ["level_a", "level_b"]

[radius]
min_inner_radius = 150.0
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load_from(None, Some(&local), no_env()).expect("load settings");

    // Assert
    assert_eq!(settings.paths.tree_json, PathBuf::from("build/tree.json"));
    assert_eq!(settings.paths.tree_candidates, vec![PathBuf::from("build/tree.json")]);
    assert_eq!(settings.builder.root_name, "Dictionary");
    assert_eq!(settings.builder.category_columns, vec!["level_a", "level_b"]);
    assert_eq!(settings.builder.array_separator, ";", "untouched keys keep defaults");
    assert_eq!(settings.radius.min_inner_radius, 150.0);
    assert_eq!(settings.radius.font_size, 8.0);
}

#[test]
fn given_global_and_local_when_load_then_local_replaces_arrays() {
    let dir = TempDir::new().unwrap();
    let global = dir.path().join("radtree.toml");
    let local = local_config_path(dir.path());
    fs::write(&global, "[builder]\nboolean_columns = [\"a\", \"b\"]\nchunk_size = 50\n").unwrap();
    fs::write(&local, "[builder]\nboolean_columns = [\"c\"]\n").unwrap();

    let settings = Settings::load_from(Some(&global), Some(&local), no_env()).unwrap();

    assert_eq!(settings.builder.boolean_columns, vec!["c"]);
    assert_eq!(settings.builder.chunk_size, 50);
}

#[test]
fn given_env_vars_when_load_then_override_files() {
    let dir = TempDir::new().unwrap();
    let local = local_config_path(dir.path());
    fs::write(&local, "editor = \"nano\"\n[radius]\nfont_size = 9.0\n").unwrap();
    let env = HashMap::from([
        ("RADTREE_RADIUS__FONT_SIZE".to_string(), "11.5".to_string()),
        ("RADTREE_PATHS__RADII_OUTPUT".to_string(), "web/radii.ts".to_string()),
        ("RADTREE_EDITOR".to_string(), "hx".to_string()),
    ]);

    let settings = Settings::load_from(None, Some(&local), Some(env)).unwrap();

    assert_eq!(settings.radius.font_size, 11.5);
    assert_eq!(settings.paths.radii_output, PathBuf::from("web/radii.ts"));
    assert_eq!(settings.editor.as_deref(), Some("hx"));
}

#[test]
fn given_malformed_toml_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let local = local_config_path(dir.path());
    fs::write(&local, "[radius\nfont_size = ").unwrap();

    let result = Settings::load_from(None, Some(&local), no_env());

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_invalid_density_when_load_then_invalid_config() {
    let dir = TempDir::new().unwrap();
    let local = local_config_path(dir.path());
    fs::write(&local, "[radius]\nmax_label_density = 1.5\n").unwrap();

    let result = Settings::load_from(None, Some(&local), no_env());

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidConfig { .. }))
    ));
}

#[test]
fn given_env_var_path_when_load_then_expanded() {
    let dir = TempDir::new().unwrap();
    let local = local_config_path(dir.path());
    fs::write(&local, "[paths]\ninput_csv = \"${CARGO_MANIFEST_DIR}/data.csv\"\n").unwrap();

    let settings = Settings::load_from(None, Some(&local), no_env()).unwrap();

    assert_eq!(
        settings.paths.input_csv,
        PathBuf::from(format!("{}/data.csv", env!("CARGO_MANIFEST_DIR")))
    );
}
