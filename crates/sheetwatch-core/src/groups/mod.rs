//! Named field-group catalog and filter presets.

mod builtin;
pub mod catalog;
pub mod presets;

pub use builtin::builtin_builder;
pub use catalog::{GroupCatalog, GroupCatalogBuilder, GroupDefinition, ResolvedPatterns};
pub use presets::{preset, presets, FilterPreset};
