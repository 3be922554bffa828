//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the FileSystem boundary trait but are themselves
//! concrete structs, not traits.

mod radius;
mod tree;

pub use radius::RadiusService;
pub use tree::{BuildSummary, TreeService};
