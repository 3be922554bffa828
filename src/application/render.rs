//! Radius report and its renderings for the front-end.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{LevelStats, RadiusTable, TreeAnalysis, TreeStats};

/// Radius returned by the generated accessor for levels without an entry.
pub const DEFAULT_ACCESSOR_RADIUS: u32 = 200;

/// Output format of a radius report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    TypeScript,
    Json,
}

impl ReportFormat {
    /// `.json` files get JSON, everything else TypeScript.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::TypeScript,
        }
    }
}

/// Tree statistics and ring radii, keyed by depth level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusReport {
    pub total_nodes: usize,
    pub max_depth: usize,
    pub nodes_by_level: BTreeMap<usize, usize>,
    pub field_nodes_by_level: BTreeMap<usize, usize>,
    pub avg_label_length_by_level: BTreeMap<usize, f64>,
    pub max_label_length_by_level: BTreeMap<usize, usize>,
    pub optimal_radii: RadiusTable,
}

impl RadiusReport {
    pub fn from_analysis(analysis: &TreeAnalysis) -> Self {
        let stats = &analysis.stats;
        Self {
            total_nodes: stats.total_nodes(),
            max_depth: stats.max_depth(),
            nodes_by_level: per_level(stats, |s| s.node_count),
            field_nodes_by_level: per_level(stats, |s| s.field_node_count),
            avg_label_length_by_level: per_level(stats, LevelStats::average_label_len),
            max_label_length_by_level: per_level(stats, LevelStats::max_label_len),
            optimal_radii: analysis.radii.clone(),
        }
    }

    pub fn render(&self, format: ReportFormat) -> ApplicationResult<String> {
        match format {
            ReportFormat::Json => render_json(self),
            ReportFormat::TypeScript => render_typescript(self),
        }
    }
}

fn per_level<T>(stats: &TreeStats, f: impl Fn(&LevelStats) -> T) -> BTreeMap<usize, T> {
    stats.levels().iter().map(|(&level, s)| (level, f(s))).collect()
}

fn to_pretty<T: Serialize>(value: &T) -> ApplicationResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize radius report".into(),
        source: Box::new(e),
    })
}

pub fn render_json(report: &RadiusReport) -> ApplicationResult<String> {
    to_pretty(report).map(|mut s| {
        s.push('\n');
        s
    })
}

/// JSON block as line comments.
fn commented(json: &str) -> String {
    json.lines().map(|l| format!("// {l}\n")).collect()
}

/// TypeScript module defining `optimalRadii` and `getOptimalRadius`.
pub fn render_typescript(report: &RadiusReport) -> ApplicationResult<String> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct LabelStats<'a> {
        avg_label_length_by_level: &'a BTreeMap<usize, f64>,
        max_label_length_by_level: &'a BTreeMap<usize, usize>,
    }

    let label_stats = LabelStats {
        avg_label_length_by_level: &report.avg_label_length_by_level,
        max_label_length_by_level: &report.max_label_length_by_level,
    };

    let mut out = String::new();
    out.push_str("// Auto-generated optimal radii configuration\n");
    out.push_str(&format!("// Total nodes: {}\n", report.total_nodes));
    out.push_str(&format!("// Maximum depth: {}\n", report.max_depth));
    out.push('\n');
    out.push_str("// Node distribution by level:\n");
    out.push_str(&commented(&to_pretty(&report.nodes_by_level)?));
    out.push('\n');
    out.push_str("// Field node distribution by level:\n");
    out.push_str(&commented(&to_pretty(&report.field_nodes_by_level)?));
    out.push('\n');
    out.push_str("// Label length statistics by level:\n");
    out.push_str(&commented(&to_pretty(&label_stats)?));
    out.push('\n');
    out.push_str("// Pre-calculated optimal radii for each level:\n");
    out.push_str("const optimalRadii = new Map<number, number>([\n");
    for (level, radius) in &report.optimal_radii {
        out.push_str(&format!("  [{level}, {radius:.1}],\n"));
    }
    out.push_str("]);\n\n");
    out.push_str("// Accessor function to get optimal radius for a level\n");
    out.push_str(&format!(
        "export const getOptimalRadius = (level: number, defaultRadius: number = {DEFAULT_ACCESSOR_RADIUS}): number => {{\n"
    ));
    out.push_str("    if (optimalRadii.has(level)) {\n");
    out.push_str("        return optimalRadii.get(level) || defaultRadius;\n");
    out.push_str("    }\n");
    out.push_str("    return defaultRadius;\n");
    out.push_str("};\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{analyze, RadiusConfig, TreeNode};

    fn report() -> RadiusReport {
        let root = TreeNode::category("UKB").with_children(vec![
            TreeNode::category("Population"),
            TreeNode::category("Imaging"),
        ]);
        let analysis = analyze(Some(&root), &RadiusConfig::default()).unwrap();
        RadiusReport::from_analysis(&analysis)
    }

    #[test]
    fn given_analysis_when_building_report_then_levels_filled() {
        let report = report();
        assert_eq!(report.total_nodes, 3);
        assert_eq!(report.max_depth, 1);
        assert_eq!(report.nodes_by_level[&1], 2);
        assert_eq!(report.field_nodes_by_level[&1], 0);
        assert_eq!(report.max_label_length_by_level[&1], "Population".len());
        assert!((report.avg_label_length_by_level[&1] - 8.5).abs() < 1e-12);
        assert_eq!(report.optimal_radii[&0], 200.0);
    }

    #[test]
    fn given_report_when_rendering_json_then_camel_case_keys() {
        let json = render_json(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalNodes"], 3);
        assert_eq!(value["nodesByLevel"]["1"], 2);
        assert_eq!(value["optimalRadii"]["0"], 200.0);
    }

    #[test]
    fn given_report_when_rendering_typescript_then_map_and_accessor() {
        let ts = render_typescript(&report()).unwrap();
        assert!(ts.starts_with("// Auto-generated optimal radii configuration\n// Total nodes: 3\n// Maximum depth: 1\n\n"));
        assert!(ts.contains("  [0, 200.0],"));
        assert!(ts.contains("  [1, 240.0],"));
        assert!(ts.contains("getOptimalRadius = (level: number, defaultRadius: number = 200): number => {\n    if"));
        // statistics only appear inside comments
        for line in ts.lines().filter(|l| l.contains('"')) {
            assert!(line.starts_with("//"), "uncommented JSON: {line}");
        }
    }

    #[test]
    fn given_paths_when_inferring_format_then_by_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("radii.json")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("radii.ts")), ReportFormat::TypeScript);
        assert_eq!(ReportFormat::from_path(Path::new("radii")), ReportFormat::TypeScript);
    }
}
