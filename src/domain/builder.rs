//! Tree builder grouping flat dictionary records into a category hierarchy.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::trace;

use crate::domain::arena::{NodeData, NodeKind, TreeArena};
use crate::domain::record::FieldRecord;
use crate::domain::tree::{TreeDocument, TreeMetadata};

/// Provenance recorded on the finished document.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    pub generated_at: String,
    pub source_file: String,
    pub excluded_columns: Vec<String>,
}

/// Constructs the category/field hierarchy one record at a time.
///
/// Categories with the same name under the same parent are merged; every
/// record adds a new field leaf under its deepest category.
pub struct TreeBuilder {
    tree: TreeArena,
    root: Index,
    categories: HashMap<(Index, String), Index>,
}

impl TreeBuilder {
    pub fn new(root_name: &str) -> Self {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(NodeData::category(root_name), None);
        Self {
            tree,
            root,
            categories: HashMap::new(),
        }
    }

    /// Place a record under its category path, creating categories as needed.
    pub fn add_record(&mut self, record: FieldRecord) -> Index {
        let mut current = self.root;
        for category in record.categories {
            current = self.find_or_create_category(current, category);
        }

        let leaf = NodeData {
            name: record.label,
            kind: NodeKind::Field {
                data: record.data,
                size: record.size,
            },
        };
        self.tree.insert_node(leaf, Some(current))
    }

    fn find_or_create_category(&mut self, parent: Index, name: String) -> Index {
        if let Some(&existing) = self.categories.get(&(parent, name.clone())) {
            return existing;
        }
        trace!(category = %name, "new category");
        let idx = self
            .tree
            .insert_node(NodeData::category(name.clone()), Some(parent));
        self.categories.insert((parent, name), idx);
        idx
    }

    pub fn arena(&self) -> &TreeArena {
        &self.tree
    }

    /// Finish the tree and attach metadata with node totals.
    pub fn into_document(self, provenance: Provenance) -> TreeDocument {
        let metadata = TreeMetadata {
            generated_at: provenance.generated_at,
            source_file: provenance.source_file,
            excluded_columns: provenance.excluded_columns,
            total_nodes: self.tree.len(),
            max_depth: self.tree.max_depth(),
        };
        TreeDocument {
            root: self.tree.to_tree_node().unwrap_or_default(),
            metadata: Some(metadata),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn record(categories: &[&str], id: i64, title: &str) -> FieldRecord {
        let mut data = Map::new();
        data.insert("field_id".into(), json!(id));
        data.insert("title".into(), json!(title));
        FieldRecord {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            label: format!("{id}: {title}"),
            data,
            size: None,
        }
    }

    #[test]
    fn given_shared_categories_when_adding_then_merged() {
        let mut builder = TreeBuilder::new("UKB");
        builder.add_record(record(&["Population", "Baseline"], 31, "Sex"));
        builder.add_record(record(&["Population", "Baseline"], 34, "Year of birth"));
        builder.add_record(record(&["Population"], 52, "Month of birth"));
        builder.add_record(record(&["Imaging"], 20000, "Scan"));

        let doc = builder.into_document(Provenance::default());
        let root = &doc.root;
        assert_eq!(root.name, "UKB");
        assert_eq!(root.children().len(), 2);

        let population = &root.children()[0];
        assert_eq!(population.name, "Population");
        // category first, then the leaf added directly below it
        assert_eq!(population.children()[0].name, "Baseline");
        assert_eq!(population.children()[0].children().len(), 2);
        assert_eq!(population.children()[1].name, "52: Month of birth");

        let meta = doc.metadata.unwrap();
        assert_eq!(meta.total_nodes, 8);
        assert_eq!(meta.max_depth, 3);
    }

    #[test]
    fn given_same_name_under_different_parents_when_adding_then_kept_apart() {
        let mut builder = TreeBuilder::new("UKB");
        builder.add_record(record(&["A", "Shared"], 1, "x"));
        builder.add_record(record(&["B", "Shared"], 2, "y"));

        assert_eq!(builder.arena().len(), 7);
        assert_eq!(builder.arena().top_level_names(), vec!["A", "B"]);
    }

    #[test]
    fn given_no_records_when_finishing_then_root_only() {
        let doc = TreeBuilder::new("UKB").into_document(Provenance {
            source_file: "empty.csv".into(),
            ..Provenance::default()
        });
        assert_eq!(doc.root.children, Some(vec![]));
        let meta = doc.metadata.unwrap();
        assert_eq!(meta.total_nodes, 1);
        assert_eq!(meta.max_depth, 0);
        assert_eq!(meta.source_file, "empty.csv");
    }
}
