pub mod ast;
pub mod errors;

pub use ast::{JsLanguageVariant, SourceFile};
pub use errors::{Error, Result};
