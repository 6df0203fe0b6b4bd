//! Type descriptor model, its input grammars, and its renderer

pub mod descriptor;
pub mod grammar;
pub mod prop_types;
pub mod render;
pub mod tag_tree;

pub use descriptor::{IndexKey, Member, Param, Primitive, TypeDescriptor};
pub use grammar::{parse_binding_type, parse_type, ParsedBinding};
pub use prop_types::{parse_shape_literal, PropTypesReader, PropTypesScope, ShapePattern};
pub use render::TypeRenderer;
pub use tag_tree::TagTree;
