//! Domain layer: tree model, statistics and ring sizing
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod error;
pub mod radius;
pub mod record;
pub mod stats;
pub mod tree;

pub use arena::{NodeData, NodeKind, TreeArena};
pub use builder::{Provenance, TreeBuilder};
pub use error::{DomainError, DomainResult};
pub use radius::{analyze, optimal_radii, RadiusConfig, RadiusTable, TreeAnalysis};
pub use record::{BuilderConfig, FieldRecord, RecordSchema};
pub use stats::{LevelStats, TreeStats};
pub use tree::{TreeDocument, TreeMetadata, TreeNode, FIELD_ID_KEY};
