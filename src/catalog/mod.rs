//! Resource catalog
//!
//! Every resource type is a `ResourceDescriptor` value: endpoint path,
//! permitted verbs, search keys, query options and the skeleton used for
//! new records. There are no per-type structs; behavior specific to one
//! type lives in `resource::helpers`.

mod registry;
mod types;

pub use registry::{Registry, BUILTIN_CATALOG};
pub use types::{CatalogFile, ResourceDescriptor, NAME_PLACEHOLDER};
