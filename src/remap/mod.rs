//! Directory remapping between the shared filesystem and a local workspace
//!
//! - `table` - the ordered source -> destination prefix table
//! - `builder` - derives a table from an argument tree
//! - `paths` - lexical, component-aware path helpers

pub mod builder;
pub mod paths;
pub mod table;


pub use builder::{build_remap_table, EXTERNAL_DIR};
pub use table::{RemapEntry, RemapTable};
