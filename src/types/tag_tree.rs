//! Nested object types from dotted documentary tag names
//!
//! `@param {string} opts.name` and `@param {number} opts.age` describe one
//! parameter `opts` of type `{ name: string; age: number }`. A segment ending
//! in `[]` (`users[].name`) makes its node an array of objects.

use indexmap::IndexMap;

use super::descriptor::{Member, TypeDescriptor};

#[derive(Debug, Clone, Default)]
struct TagNode {
    /// Type from a tag naming this exact path
    declared: Option<TypeDescriptor>,
    optional: bool,
    array: bool,
    children: IndexMap<String, TagNode>,
}

/// Tags sharing one root name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct TagTree {
    root_name: String,
    root: TagNode,
}

/// Split `users[]` into (`users`, true)
fn split_segment(segment: &str) -> (&str, bool) {
    match segment.strip_suffix("[]") {
        Some(name) => (name, true),
        None => (segment, false),
    }
}

/// First segment of a dotted tag name, without any `[]` suffix
pub fn root_segment(dotted: &str) -> &str {
    let first = dotted.split('.').next().unwrap_or(dotted);
    split_segment(first).0
}

/// Second segment of a dotted tag name, if any
pub fn child_segment(dotted: &str) -> Option<&str> {
    dotted.split('.').nth(1).map(|s| split_segment(s).0)
}

impl TagTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            root: TagNode::default(),
        }
    }

    /// Record one tag; its first segment must name this tree's root
    pub fn insert(&mut self, dotted: &str, ty: TypeDescriptor, optional: bool) {
        let mut segments = dotted.split('.');
        if let Some(first) = segments.next() {
            if split_segment(first).1 {
                self.root.array = true;
            }
        }

        let mut node = &mut self.root;
        for segment in segments {
            let (name, array) = split_segment(segment);
            node = node.children.entry(name.to_string()).or_default();
            node.array |= array;
        }
        node.declared = Some(ty);
        node.optional = optional;
    }

    /// Type of the root; a root without children keeps its declared type
    pub fn to_descriptor(&self) -> TypeDescriptor {
        self.root.to_descriptor(&self.root_name, true)
    }
}

impl TagNode {
    fn to_descriptor(&self, path: &str, is_root: bool) -> TypeDescriptor {
        if self.children.is_empty() {
            return self.declared.clone().unwrap_or(TypeDescriptor::Unknown);
        }

        if !is_root && self.declared.is_none() {
            log::warn!(
                "Tag path {} is never declared itself; typing it as unknown",
                path
            );
            return TypeDescriptor::Unknown;
        }

        let members = self
            .children
            .iter()
            .map(|(name, child)| {
                let child_path = format!("{}.{}", path, name);
                (
                    name.clone(),
                    Member::new(child.to_descriptor(&child_path, false), child.optional),
                )
            })
            .collect();
        let object = TypeDescriptor::Object(members);

        let declared_array = self.declared.as_ref().is_some_and(TypeDescriptor::is_array);
        if self.array || declared_array {
            TypeDescriptor::array(object)
        } else {
            object
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrateConfig;
    use crate::types::descriptor::Primitive;
    use crate::types::render::TypeRenderer;
    use pretty_assertions::assert_eq;

    fn render(tree: &TagTree) -> String {
        let config = MigrateConfig::default();
        TypeRenderer::new(&config).render(&tree.to_descriptor())
    }

    fn prim(p: Primitive) -> TypeDescriptor {
        TypeDescriptor::Primitive(p)
    }

    #[test]
    fn test_segments() {
        assert_eq!(root_segment("users[].name"), "users");
        assert_eq!(child_segment("users[].name"), Some("name"));
        assert_eq!(child_segment("opts"), None);
    }

    #[test]
    fn test_children_form_object() {
        let mut tree = TagTree::new("opts");
        tree.insert("opts.name", prim(Primitive::String), false);
        tree.insert("opts.age", prim(Primitive::Number), true);
        assert_eq!(render(&tree), "{ name: string; age?: number }");
    }

    #[test]
    fn test_declared_root_is_overridden_by_children() {
        let mut tree = TagTree::new("opts");
        tree.insert("opts", prim(Primitive::Object), false);
        tree.insert("opts.name", prim(Primitive::String), false);
        assert_eq!(render(&tree), "{ name: string }");
    }

    #[test]
    fn test_array_of_objects() {
        let mut tree = TagTree::new("users");
        tree.insert(
            "users",
            TypeDescriptor::array(prim(Primitive::Object)),
            false,
        );
        tree.insert("users[].name", prim(Primitive::String), false);
        assert_eq!(render(&tree), "{ name: string }[]");
    }

    #[test]
    fn test_nested_declared_levels() {
        let mut tree = TagTree::new("a");
        tree.insert("a.b", prim(Primitive::Object), false);
        tree.insert("a.b.c", prim(Primitive::Number), false);
        assert_eq!(render(&tree), "{ b: { c: number } }");
    }

    #[test]
    fn test_undeclared_intermediate_is_unknown() {
        let mut tree = TagTree::new("a");
        tree.insert("a.b.c", prim(Primitive::Number), false);
        tree.insert("a.d", prim(Primitive::String), false);
        assert_eq!(render(&tree), "{ b: any; d: string }");
    }

    #[test]
    fn test_untyped_leaf_is_unknown() {
        let mut tree = TagTree::new("a");
        tree.insert("a.x", TypeDescriptor::Unknown, false);
        assert_eq!(render(&tree), "{ x: any }");
    }
}
