//! Source rewrites
//!
//! A [`Transform`] scans one parsed file read-only and describes its changes
//! as [`Edit`]s against that file's text. The driver in [`crate::migrate`]
//! applies them and hands the result to the next transform.

use crate::config::MigrateConfig;
use crate::core::{Result, SourceFile};
use crate::patch::Edit;

pub mod shape_extraction;
pub mod signature_annotation;

pub use shape_extraction::ShapeExtraction;
pub use signature_annotation::SignatureAnnotation;

pub trait Transform: Send + Sync {
    /// Short stable name, used in logs and reports
    fn name(&self) -> &'static str;

    /// Edits for `file`, all in `file.source` coordinates
    fn run(&self, file: &SourceFile, config: &MigrateConfig) -> Result<Vec<Edit>>;
}

/// Shape extraction first, so signature annotation sees the final bindings
pub fn default_transforms() -> Vec<Box<dyn Transform>> {
    vec![Box::new(ShapeExtraction), Box::new(SignatureAnnotation)]
}
