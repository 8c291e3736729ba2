mod collection;
mod field;
mod registry;
mod types;

pub use collection::{AccessRules, CollectionDef, CollectionType};
pub use field::{FieldDef, FieldPatch};
pub use registry::{RegistrySnapshot, SchemaRegistry};
pub use types::{
    AutodateOptions, BoolOptions, DateOptions, DomainOptions, FieldOptions, FileOptions,
    JsonOptions, NumberOptions, RelationOptions, SelectOptions, TextOptions,
};
