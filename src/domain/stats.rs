//! Per-level tree statistics feeding the radius engine.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::domain::tree::TreeNode;

/// Aggregates for one depth level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelStats {
    /// Nodes at this level
    pub node_count: usize,
    /// Label length of every node at this level
    pub label_lengths: Vec<usize>,
    /// Data-bearing (field) nodes at this level
    pub field_node_count: usize,
}

impl LevelStats {
    pub fn average_label_len(&self) -> f64 {
        if self.label_lengths.is_empty() {
            return 0.0;
        }
        self.label_lengths.iter().sum::<usize>() as f64 / self.label_lengths.len() as f64
    }

    pub fn max_label_len(&self) -> usize {
        self.label_lengths.iter().copied().max().unwrap_or(0)
    }

    pub fn has_field_nodes(&self) -> bool {
        self.field_node_count > 0
    }

    fn record(&mut self, node: &TreeNode) {
        self.node_count += 1;
        self.label_lengths.push(node.label_len());
        if node.is_field() {
            self.field_node_count += 1;
        }
    }
}

/// Statistics for every level of a tree, keyed by depth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeStats {
    levels: BTreeMap<usize, LevelStats>,
}

impl TreeStats {
    /// Walk the tree once and aggregate by depth.
    #[instrument(level = "debug", skip(root), fields(root = %root.name))]
    pub fn collect(root: &TreeNode) -> Self {
        let mut levels: BTreeMap<usize, LevelStats> = BTreeMap::new();
        let mut stack = vec![(root, 0usize)];

        while let Some((node, level)) = stack.pop() {
            levels.entry(level).or_default().record(node);
            stack.extend(node.children().iter().map(|c| (c, level + 1)));
        }

        debug!("collected statistics for {} levels", levels.len());
        Self { levels }
    }

    /// Build from precomputed levels; levels may be sparse.
    pub fn from_levels(levels: BTreeMap<usize, LevelStats>) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &BTreeMap<usize, LevelStats> {
        &self.levels
    }

    pub fn level(&self, level: usize) -> Option<&LevelStats> {
        self.levels.get(&level)
    }

    pub fn total_nodes(&self) -> usize {
        self.levels.values().map(|l| l.node_count).sum()
    }

    pub fn max_depth(&self) -> usize {
        self.levels.keys().next_back().copied().unwrap_or(0)
    }
}
