//! Tests for RadiusService

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use radtree::application::services::RadiusService;
use radtree::application::{ApplicationError, RadiusReport, ReportFormat};
use radtree::domain::{DomainError, RadiusConfig};
use radtree::infrastructure::traits::RealFileSystem;
use radtree::util::testing;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources")
        .join(name)
}

fn service() -> RadiusService {
    testing::init_test_setup();
    RadiusService::new(Arc::new(RealFileSystem))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

// ============================================================
// Tree path resolution
// ============================================================

#[test]
fn given_explicit_existing_path_when_resolving_then_returned() {
    let tree = fixture("tree.json");
    let resolved = service().resolve_tree_path(Some(&tree), &[]).unwrap();
    assert_eq!(resolved, tree);
}

#[test]
fn given_explicit_missing_path_when_resolving_then_input_not_found() {
    let result = service().resolve_tree_path(Some(Path::new("/nonexistent/tree.json")), &[fixture("tree.json")]);
    assert!(matches!(result, Err(ApplicationError::InputNotFound(_))));
}

#[test]
fn given_candidates_when_resolving_then_first_existing_wins() {
    let temp = TempDir::new().unwrap();
    let second = temp.path().join("graph-data/tree.json");
    let third = temp.path().join("tree.json");
    std::fs::create_dir_all(second.parent().unwrap()).unwrap();
    std::fs::write(&second, "{}").unwrap();
    std::fs::write(&third, "{}").unwrap();
    let candidates = vec![temp.path().join("data_processed/tree.json"), second.clone(), third];

    let resolved = service().resolve_tree_path(None, &candidates).unwrap();

    assert_eq!(resolved, second);
}

#[test]
fn given_no_existing_candidate_when_resolving_then_lists_candidates() {
    let temp = TempDir::new().unwrap();
    let candidates = vec![temp.path().join("a.json"), temp.path().join("b.json")];

    let err = service().resolve_tree_path(None, &candidates).unwrap_err();

    match &err {
        ApplicationError::NoTreeFound { candidates: tried } => assert_eq!(tried, &candidates),
        other => panic!("expected NoTreeFound, got {other:?}"),
    }
    assert!(err.to_string().contains("a.json"));
    assert!(err.to_string().contains("b.json"));
}

// ============================================================
// Analysis
// ============================================================

#[test]
fn given_fixture_tree_when_analyzing_then_report_statistics() {
    let report = service()
        .analyze(&fixture("tree.json"), &RadiusConfig::default())
        .unwrap();

    assert_eq!(report.total_nodes, 7);
    assert_eq!(report.max_depth, 3);
    assert_eq!(
        report.nodes_by_level.values().copied().collect::<Vec<_>>(),
        vec![1, 2, 3, 1]
    );
    assert_eq!(
        report.field_nodes_by_level.values().copied().collect::<Vec<_>>(),
        vec![0, 0, 2, 1]
    );
    assert_eq!(report.max_label_length_by_level[&1], 26);
    assert_close(report.avg_label_length_by_level[&2], 11.0);
}

#[test]
fn given_fixture_tree_when_analyzing_then_radii_grow_with_safety_margin() {
    let report = service()
        .analyze(&fixture("tree.json"), &RadiusConfig::default())
        .unwrap();

    let radii = &report.optimal_radii;
    assert_eq!(radii.len(), 4);
    assert_close(radii[&0], 200.0);
    assert_close(radii[&1], 240.0);
    assert_close(radii[&2], 240.0 * 1.2 * 1.2);
    assert_close(radii[&3], 240.0 * 1.2 * 1.2 * 1.3);
}

#[rstest]
#[case("")]
#[case("null")]
#[case("[1, 2]")]
#[case("{\"name\": ")]
fn given_unusable_tree_file_when_analyzing_then_invalid_input(#[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("tree.json");
    std::fs::write(&path, content).unwrap();

    let result = service().analyze(&path, &RadiusConfig::default());

    assert!(
        matches!(result, Err(ApplicationError::Domain(DomainError::InvalidInput { .. }))),
        "got {result:?}"
    );
}

#[test]
fn given_invalid_weights_when_analyzing_then_invalid_config() {
    let config = RadiusConfig {
        label_weight_avg: 0.5,
        label_weight_max: 0.6,
        ..RadiusConfig::default()
    };

    let result = service().analyze(&fixture("tree.json"), &config);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidConfig { .. }))
    ));
}

// ============================================================
// Report output
// ============================================================

#[test]
fn given_report_when_writing_typescript_then_file_has_radius_map() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("src/config/optimal_radii_config.ts");
    let service = service();
    let report = service
        .analyze(&fixture("tree.json"), &RadiusConfig::default())
        .unwrap();

    service
        .write_report(&report, &output, ReportFormat::TypeScript)
        .unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("// Total nodes: 7"));
    assert!(written.contains("// Maximum depth: 3"));
    assert!(written.contains("  [0, 200.0],"));
    assert!(written.contains("  [1, 240.0],"));
    assert!(written.contains("  [2, 345.6],"));
    assert!(written.contains("getOptimalRadius"));
}

#[test]
fn given_report_when_writing_json_then_parses_back() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("radii.json");
    let service = service();
    let report = service
        .analyze(&fixture("tree.json"), &RadiusConfig::default())
        .unwrap();

    service
        .write_report(&report, &output, ReportFormat::Json)
        .unwrap();

    let parsed: RadiusReport =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(parsed, report);
}
