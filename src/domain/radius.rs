//! Per-level ring radius computation for radial tree layouts.
//!
//! Every depth level gets one radius so that labels spread evenly around
//! that level's circle do not collide. The computation runs as three pure
//! passes over levels in increasing order:
//!
//! 1. [`initial_radii`]: label-density radius for each level on its own
//! 2. [`enforce_growth`]: each ring at least `min_radius_growth` times the ring inside it
//! 3. [`apply_depth_safety`]: depth-proportional margin for levels beyond the first ring
//!
//! [`optimal_radii`] validates the configuration and composes the passes.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::stats::{LevelStats, TreeStats};
use crate::domain::tree::TreeNode;

/// Depth level → radius in pixels. Levels without nodes have no entry.
pub type RadiusTable = BTreeMap<usize, f64>;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Tuning parameters for ring sizing.
///
/// Override any subset with struct update syntax:
/// ```
/// use radtree::domain::RadiusConfig;
/// let config = RadiusConfig { font_size: 10.0, ..RadiusConfig::default() };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    /// Label font size in points
    pub font_size: f64,
    /// Point to pixel conversion factor
    pub pt_to_px: f64,
    /// Average glyph width as a fraction of the font size in pixels
    pub char_width_factor: f64,
    /// Fixed pixel gap added per node
    pub min_spacing: f64,
    /// Minimum ratio between a ring and the ring inside it
    pub min_radius_growth: f64,
    /// Candidate radius for the root hub
    pub inner_level_buffer: f64,
    /// Spacing multiplier for levels holding field nodes
    pub field_node_spacing_factor: f64,
    /// Weight of the average label length
    pub label_weight_avg: f64,
    /// Weight of the longest label length
    pub label_weight_max: f64,
    /// Floor for the first ring, also a candidate for the hub
    pub min_inner_radius: f64,
    /// Largest fraction of a circumference labels may occupy
    pub max_label_density: f64,
    /// Safety inflation per level of depth, applied beyond level 1
    pub depth_safety_step: f64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            font_size: 8.0,
            pt_to_px: 1.333,
            char_width_factor: 0.6,
            min_spacing: 10.0,
            min_radius_growth: 1.2,
            inner_level_buffer: 40.0,
            field_node_spacing_factor: 1.5,
            label_weight_avg: 0.7,
            label_weight_max: 0.3,
            min_inner_radius: 200.0,
            max_label_density: 0.85,
            depth_safety_step: 0.1,
        }
    }
}

impl RadiusConfig {
    /// Reject configurations that would skew or break the sizing passes.
    pub fn validate(&self) -> DomainResult<()> {
        let named = [
            ("font_size", self.font_size),
            ("pt_to_px", self.pt_to_px),
            ("char_width_factor", self.char_width_factor),
            ("min_spacing", self.min_spacing),
            ("min_radius_growth", self.min_radius_growth),
            ("inner_level_buffer", self.inner_level_buffer),
            ("field_node_spacing_factor", self.field_node_spacing_factor),
            ("label_weight_avg", self.label_weight_avg),
            ("label_weight_max", self.label_weight_max),
            ("min_inner_radius", self.min_inner_radius),
            ("max_label_density", self.max_label_density),
            ("depth_safety_step", self.depth_safety_step),
        ];
        if let Some((name, value)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DomainError::invalid_config(format!(
                "{name} must be finite, got {value}"
            )));
        }

        for (name, value) in [
            ("font_size", self.font_size),
            ("pt_to_px", self.pt_to_px),
            ("char_width_factor", self.char_width_factor),
            ("field_node_spacing_factor", self.field_node_spacing_factor),
            ("min_inner_radius", self.min_inner_radius),
        ] {
            if value <= 0.0 {
                return Err(DomainError::invalid_config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("min_spacing", self.min_spacing),
            ("inner_level_buffer", self.inner_level_buffer),
            ("label_weight_avg", self.label_weight_avg),
            ("label_weight_max", self.label_weight_max),
            ("depth_safety_step", self.depth_safety_step),
        ] {
            if value < 0.0 {
                return Err(DomainError::invalid_config(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        let weight_sum = self.label_weight_avg + self.label_weight_max;
        if (weight_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(DomainError::invalid_config(format!(
                "label weights must sum to 1, got {} + {} = {}",
                self.label_weight_avg, self.label_weight_max, weight_sum
            )));
        }

        if self.max_label_density <= 0.0 || self.max_label_density > 1.0 {
            return Err(DomainError::invalid_config(format!(
                "max_label_density must be in (0, 1], got {}",
                self.max_label_density
            )));
        }

        if self.min_radius_growth < 1.0 {
            return Err(DomainError::invalid_config(format!(
                "min_radius_growth must be at least 1, got {}",
                self.min_radius_growth
            )));
        }

        Ok(())
    }

    /// Fixed radius of the root hub.
    pub fn root_radius(&self) -> f64 {
        self.inner_level_buffer.max(self.min_inner_radius)
    }

    /// Pixel width of one label character.
    pub fn char_width_px(&self) -> f64 {
        self.font_size * self.pt_to_px * self.char_width_factor
    }
}

/// Statistics and radii for one tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeAnalysis {
    pub stats: TreeStats,
    pub radii: RadiusTable,
}

/// Weighted blend of average and longest label length.
pub fn effective_label_len(level: &LevelStats, config: &RadiusConfig) -> f64 {
    level.average_label_len() * config.label_weight_avg
        + level.max_label_len() as f64 * config.label_weight_max
}

/// Pixels of circumference one node at this level needs.
pub fn node_space_px(level: &LevelStats, config: &RadiusConfig) -> f64 {
    let spacing = if level.has_field_nodes() {
        config.field_node_spacing_factor
    } else {
        1.0
    };
    config.char_width_px() * effective_label_len(level, config) * spacing + config.min_spacing
}

/// Radius at which the level's labels fit within `max_label_density` of the circle.
pub fn density_radius(level: &LevelStats, config: &RadiusConfig) -> f64 {
    let circumference = level.node_count as f64 * node_space_px(level, config);
    let adjusted = circumference / config.max_label_density;
    adjusted / (2.0 * PI)
}

/// First pass: independent radius per level.
///
/// Level 0 is the fixed hub; level 1 is floored at `min_inner_radius`;
/// levels without nodes are skipped.
pub fn initial_radii(stats: &TreeStats, config: &RadiusConfig) -> RadiusTable {
    let mut radii = RadiusTable::new();
    for (&level, level_stats) in stats.levels() {
        if level == 0 {
            radii.insert(0, config.root_radius());
            continue;
        }
        if level_stats.node_count == 0 {
            continue;
        }

        let radius = density_radius(level_stats, config);
        trace!(
            level,
            nodes = level_stats.node_count,
            radius,
            "density radius"
        );
        let radius = if level == 1 {
            radius.max(config.min_inner_radius)
        } else {
            radius
        };
        radii.insert(level, radius);
    }
    radii
}

/// Second pass: every ring grows by at least `min_radius_growth` over the
/// previous present ring. Single left-to-right pass, no backward revision.
pub fn enforce_growth(initial: &RadiusTable, config: &RadiusConfig) -> RadiusTable {
    let mut radii = RadiusTable::new();
    let mut previous = initial
        .get(&0)
        .copied()
        .unwrap_or_else(|| config.root_radius());
    radii.insert(0, previous);

    for (&level, &radius) in initial.range(1..) {
        let required = previous * config.min_radius_growth;
        let radius = if level == 1 {
            radius.max(required).max(config.min_inner_radius)
        } else {
            radius.max(required)
        };
        radii.insert(level, radius);
        previous = radius;
    }
    radii
}

/// Third pass: inflate levels beyond the first ring by `1 + step * level`.
///
/// The factor grows with depth, so the growth invariant of the second pass holds.
pub fn apply_depth_safety(mut radii: RadiusTable, config: &RadiusConfig) -> RadiusTable {
    for (&level, radius) in radii.range_mut(2..) {
        *radius *= 1.0 + config.depth_safety_step * level as f64;
    }
    radii
}

/// Radii for an already collected set of statistics.
pub fn radii_from_stats(stats: &TreeStats, config: &RadiusConfig) -> DomainResult<RadiusTable> {
    config.validate()?;
    let initial = initial_radii(stats, config);
    let grown = enforce_growth(&initial, config);
    Ok(apply_depth_safety(grown, config))
}

/// Radius table for a tree. A missing tree is an input error.
pub fn optimal_radii(tree: Option<&TreeNode>, config: &RadiusConfig) -> DomainResult<RadiusTable> {
    analyze(tree, config).map(|analysis| analysis.radii)
}

/// Statistics and radius table for a tree.
#[instrument(level = "debug", skip_all)]
pub fn analyze(tree: Option<&TreeNode>, config: &RadiusConfig) -> DomainResult<TreeAnalysis> {
    let root = tree.ok_or_else(|| DomainError::invalid_input("no tree root to size"))?;
    config.validate()?;

    let stats = TreeStats::collect(root);
    let radii = radii_from_stats(&stats, config)?;
    debug!(
        levels = radii.len(),
        outer = radii.values().next_back().copied().unwrap_or_default(),
        "computed radii"
    );
    Ok(TreeAnalysis { stats, radii })
}
