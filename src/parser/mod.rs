pub mod coerce;
pub mod extract;
pub mod locator;
pub mod schema;

pub use coerce::{Coercion, Status, Value, ValueKind};
pub use extract::{extract, extract_values, Entity, FieldValues};
pub use locator::{Locator, Selection, SelectorExpr};
pub use schema::{FieldId, FieldSchema, FieldSpec, SchemaBuilder};
