//! Script configuration
//!
//! Typed YAML schema for interview scripts, the loading pipeline and
//! semantic validation.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, LoadResult, LoadWarning, LoaderOptions, ScriptLoader};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
