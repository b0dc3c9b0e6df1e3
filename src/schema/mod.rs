//! Action schemas.
//!
//! Each scripted action declares its outputs in a JSON schema file next to
//! the script. The [`SchemaCatalog`] built by [`discover`] is immutable once
//! loaded and is shared by every dispatch.
//!
//! ```json
//! {
//!   "description": "Install a package",
//!   "timeout": 20,
//!   "output": {
//!     "status": {"type": "string", "default": "unknown", "description": "Outcome"}
//!   }
//! }
//! ```

mod catalog;
mod loader;
mod types;

pub use catalog::{SchemaCatalog, SchemaSource};
pub use loader::{discover, load_schema_file, SCHEMA_EXTENSION};
pub use types::{ActionSchema, OutputField, OutputType, SchemaError, SchemaFile};
