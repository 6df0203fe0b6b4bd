//! Typelift upgrades JavaScript sources toward TypeScript.
//!
//! Two transforms read the type information a JS codebase already carries:
//! `PropTypes.shape` calls become named type aliases, and JSDoc
//! `@param`/`@returns` tags become signature annotations. Both describe their
//! changes as edits against the untouched original text, so everything they
//! do not rewrite is reproduced byte for byte.

// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod jsdoc;
pub mod migrate;
pub mod parser;
pub mod patch;
pub mod transformers;
pub mod types;

// Re-export commonly used types
pub use crate::config::{MigrateConfig, TypeMapping};
pub use crate::core::{Error, JsLanguageVariant, Result, SourceFile};
pub use crate::migrate::{migrate_source, MigrationOutcome, Migrator, TransformStats};
pub use crate::patch::{apply_edits, Edit};
pub use crate::transformers::{ShapeExtraction, SignatureAnnotation, Transform};
pub use crate::types::{
    parse_shape_literal, parse_type, TypeDescriptor, TypeRenderer,
};
