//! Tree document: the nested node structure exchanged between the builder,
//! the radius engine and the front-end.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use termtree::Tree;

use crate::domain::error::{DomainError, DomainResult};

/// Payload key that marks a node as a data-bearing field leaf.
pub const FIELD_ID_KEY: &str = "field_id";

/// One node of the category/field hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Display label
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    /// Ordered children; `None` for leaves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
    /// Per-leaf payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Participant count used by the front-end for node sizing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<serde_json::Number>,
}

/// Provenance attached to the root of a generated tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeMetadata {
    pub generated_at: String,
    pub source_file: String,
    pub excluded_columns: Vec<String>,
    pub total_nodes: usize,
    pub max_depth: usize,
}

/// Root node plus optional metadata, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(flatten)]
    pub root: TreeNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TreeMetadata>,
}

/// Labels that are null or non-string are tolerated: null becomes empty,
/// scalars use their JSON text.
fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

impl TreeNode {
    /// Category node with an empty child list.
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Leaf node without children.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Label length in characters.
    pub fn label_len(&self) -> usize {
        self.name.chars().count()
    }

    /// True if the payload is an object carrying the field-identifying key.
    pub fn is_field(&self) -> bool {
        self.data
            .as_ref()
            .and_then(Value::as_object)
            .is_some_and(|m| m.contains_key(FIELD_ID_KEY))
    }

    /// Number of nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }

    /// Depth (in edges) of the deepest node below self.
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children().iter().map(|c| (c, depth + 1)));
        }
        deepest
    }

    /// Render for the terminal, cutting off below `max_depth` if given.
    pub fn to_display_tree(&self, max_depth: Option<usize>) -> Tree<String> {
        self.display_subtree(0, max_depth)
    }

    fn display_subtree(&self, depth: usize, max_depth: Option<usize>) -> Tree<String> {
        let mut tree = Tree::new(self.name.clone());
        let children = self.children();
        if children.is_empty() {
            return tree;
        }
        if max_depth.is_some_and(|max| depth >= max) {
            tree.push(Tree::new(format!("… {} more", children.len())));
            return tree;
        }
        for child in children {
            tree.push(child.display_subtree(depth + 1, max_depth));
        }
        tree
    }
}

impl TreeDocument {
    /// Parse a tree document. A missing root (`null`, empty input, non-object)
    /// is rejected.
    pub fn from_json_str(content: &str) -> DomainResult<Self> {
        if content.trim().is_empty() {
            return Err(DomainError::invalid_input("tree document is empty"));
        }
        let value: Value = serde_json::from_str(content)
            .map_err(|e| DomainError::invalid_input(format!("malformed tree JSON: {e}")))?;
        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| DomainError::invalid_input(format!("malformed tree node: {e}"))),
            Value::Null => Err(DomainError::invalid_input("tree document has no root")),
            other => Err(DomainError::invalid_input(format!(
                "tree root must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn to_json_pretty(&self) -> DomainResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::invalid_input(format!("serialize tree: {e}")))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
