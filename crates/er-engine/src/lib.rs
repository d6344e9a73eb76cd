#![forbid(unsafe_code)]

//! Graph editing and synthesis: resolves extracted intents against an ER
//! graph, builds fresh diagrams, and chains the strategies into one policy.

mod catalog;
mod mutator;
mod policy;
mod resolver;
mod synth;

pub use catalog::{CatalogEntry, DiagramCatalog};
pub use mutator::{
    ColumnStatus, UpdateReport, add_column_to_node, apply_incremental_updates,
    create_node_with_defaults, upsert_relation_edge,
};
pub use policy::{Generation, Pipeline};
pub use resolver::{LabelLookup, lookup_keys};
pub use synth::{
    default_diagram, extract_entity_candidates, synthesize_dynamic, synthesize_relation_first,
};
