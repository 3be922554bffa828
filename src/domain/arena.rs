use std::fmt;

use generational_arena::{Arena, Index};
use serde_json::{Map, Number, Value};
use tracing::instrument;

use crate::domain::tree::TreeNode;

/// Role of a node in the dictionary hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Grouping node created from a category column
    Category,
    /// Leaf created from one dictionary row
    Field {
        data: Map<String, Value>,
        size: Option<Number>,
    },
}

/// Data payload for tree nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Display label
    pub name: String,
    pub kind: NodeKind,
}

impl NodeData {
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Category,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, NodeKind::Field { .. })
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct ArenaNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub children: Vec<Index>,
}

/// Arena-based tree used while building the hierarchy from flat rows.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<ArenaNode>,
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self, data), fields(node = %data))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = ArenaNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&ArenaNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal, children left to right.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn field_count(&self) -> usize {
        self.iter().filter(|(_, node)| node.data.is_field()).count()
    }

    /// Depth in edges of the deepest node; 0 for a root-only or empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn max_depth(&self) -> usize {
        self.root
            .map(|root| self.calculate_depth(root).saturating_sub(1))
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Names of the root's children, in insertion order.
    pub fn top_level_names(&self) -> Vec<String> {
        self.root
            .and_then(|root| self.get_node(root))
            .map(|root| {
                root.children
                    .iter()
                    .filter_map(|&c| self.get_node(c))
                    .map(|c| c.data.name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Convert to the nested document form. Categories always carry a
    /// children list, fields never do.
    #[instrument(level = "debug", skip(self))]
    pub fn to_tree_node(&self) -> Option<TreeNode> {
        self.root.map(|root| self.convert(root))
    }

    fn convert(&self, node_idx: Index) -> TreeNode {
        let Some(node) = self.get_node(node_idx) else {
            return TreeNode::default();
        };
        match &node.data.kind {
            NodeKind::Category => TreeNode::category(node.data.name.clone()).with_children(
                node.children.iter().map(|&c| self.convert(c)).collect(),
            ),
            NodeKind::Field { data, size } => TreeNode {
                name: node.data.name.clone(),
                children: None,
                data: Some(Value::Object(data.clone())),
                size: size.clone(),
            },
        }
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a ArenaNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, id: i64) -> NodeData {
        let mut data = Map::new();
        data.insert("field_id".into(), json!(id));
        NodeData {
            name: name.into(),
            kind: NodeKind::Field { data, size: None },
        }
    }

    #[test]
    fn given_nodes_when_iterating_then_preorder_left_to_right() {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(NodeData::category("UKB"), None);
        let a = tree.insert_node(NodeData::category("A"), Some(root));
        tree.insert_node(field("1: x", 1), Some(a));
        tree.insert_node(NodeData::category("B"), Some(root));

        let names: Vec<String> = tree.iter().map(|(_, n)| n.data.name.clone()).collect();
        assert_eq!(names, vec!["UKB", "A", "1: x", "B"]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.field_count(), 1);
        assert_eq!(tree.max_depth(), 2);
        assert_eq!(tree.top_level_names(), vec!["A", "B"]);
    }

    #[test]
    fn given_empty_arena_when_converting_then_none() {
        let tree = TreeArena::new();
        assert!(tree.is_empty());
        assert_eq!(tree.max_depth(), 0);
        assert!(tree.to_tree_node().is_none());
    }

    #[test]
    fn given_mixed_nodes_when_converting_then_categories_keep_children() {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(NodeData::category("UKB"), None);
        tree.insert_node(NodeData::category("Empty"), Some(root));
        tree.insert_node(field("2: y", 2), Some(root));

        let node = tree.to_tree_node().unwrap();
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[0].children, Some(vec![]));
        assert_eq!(node.children()[1].children, None);
        assert!(node.children()[1].is_field());
    }
}
