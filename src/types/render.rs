//! Declaration synthesizer
//!
//! Renders [`TypeDescriptor`] trees as TypeScript syntax. The renderer knows
//! nothing about where a descriptor came from; it only needs the configured
//! unknown-type alias, which it writes for [`TypeDescriptor::Unknown`] and for
//! any descriptor it cannot express.

use indexmap::IndexMap;

use super::descriptor::{Member, Param, TypeDescriptor};
use crate::config::MigrateConfig;

/// Syntactic position of a type, which decides when parentheses are needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Top,
    UnionMember,
    ArrayElement,
}

/// Whether object types are written on one line or one member per line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Inline,
    Block { indent: usize },
}

pub struct TypeRenderer<'a> {
    unknown_alias: &'a str,
}

impl<'a> TypeRenderer<'a> {
    pub fn new(config: &'a MigrateConfig) -> Self {
        Self {
            unknown_alias: &config.unknown_type_alias,
        }
    }

    /// Single-line type expression
    pub fn render(&self, ty: &TypeDescriptor) -> String {
        self.write(ty, Position::Top, Layout::Inline)
    }

    /// `type Name = ...;`, object members one per line
    pub fn render_type_alias(&self, name: &str, ty: &TypeDescriptor) -> String {
        format!(
            "type {} = {};",
            name,
            self.write(ty, Position::Top, Layout::Block { indent: 0 })
        )
    }

    /// `: T` or `?: T`, to follow a parameter or variable name
    pub fn render_parameter_annotation(&self, ty: &TypeDescriptor, optional: bool) -> String {
        let (ty, nested_optional) = strip_optional(ty);
        let marker = if optional || nested_optional { "?" } else { "" };
        format!("{}: {}", marker, self.render(ty))
    }

    /// Member signatures of an object type, one per entry, without braces
    ///
    /// Anything other than an object renders no members.
    pub fn render_member_list(&self, ty: &TypeDescriptor) -> Vec<String> {
        match ty {
            TypeDescriptor::Object(members) => self.member_lines(members, Layout::Inline),
            _ => Vec::new(),
        }
    }

    /// `(a: T, b?: U, ...rest: V[])`
    pub fn render_parameter_list(&self, params: &[Param]) -> String {
        self.parameter_list(params, Layout::Inline)
    }

    /// `: T`, to follow a parameter list
    pub fn render_return_type(&self, ty: &TypeDescriptor) -> String {
        let (ty, _) = strip_optional(ty);
        format!(": {}", self.render(ty))
    }

    fn write(&self, ty: &TypeDescriptor, position: Position, layout: Layout) -> String {
        match ty {
            TypeDescriptor::Primitive(primitive) => primitive.as_str().to_string(),
            TypeDescriptor::Named { name, args } if args.is_empty() => name.clone(),
            TypeDescriptor::Named { name, args } => {
                let args: Vec<String> = args
                    .iter()
                    .map(|arg| self.write(arg, Position::Top, layout))
                    .collect();
                format!("{}<{}>", name, args.join(", "))
            }
            TypeDescriptor::Array(element) => {
                format!("{}[]", self.write(element, Position::ArrayElement, layout))
            }
            TypeDescriptor::Function { params, ret } => {
                let text = format!(
                    "{} => {}",
                    self.parameter_list(params, layout),
                    self.write(ret, Position::Top, layout)
                );
                parenthesize_unless_top(text, position)
            }
            TypeDescriptor::Object(members) => self.object(members, layout),
            TypeDescriptor::IndexSignature { key, value } => {
                let member = format!(
                    "[key: {}]: {}",
                    key.as_str(),
                    self.write(value, Position::Top, nested(layout))
                );
                wrap_members(vec![member], layout)
            }
            TypeDescriptor::Union(_) | TypeDescriptor::Nullable(_) => {
                let mut variants = Vec::new();
                self.flatten_union(ty, layout, &mut variants);
                variants.dedup();
                if variants.len() == 1 {
                    return variants.remove(0);
                }
                let text = variants.join(" | ");
                if position == Position::ArrayElement {
                    format!("({})", text)
                } else {
                    text
                }
            }
            TypeDescriptor::Optional(_) => {
                log::debug!("Optional marker outside a declaration site; using unknown alias");
                self.unknown_alias.to_string()
            }
            TypeDescriptor::Literal(text) => text.clone(),
            TypeDescriptor::Opaque(text) if text.trim().is_empty() => self.unknown_alias.to_string(),
            TypeDescriptor::Opaque(text) => {
                let needs_parens = text.contains(char::is_whitespace) || text.contains('|');
                if needs_parens && position != Position::Top {
                    format!("({})", text)
                } else {
                    text.clone()
                }
            }
            TypeDescriptor::Unknown => self.unknown_alias.to_string(),
        }
    }

    fn flatten_union(&self, ty: &TypeDescriptor, layout: Layout, out: &mut Vec<String>) {
        match ty {
            TypeDescriptor::Union(variants) => {
                for variant in variants {
                    self.flatten_union(variant, layout, out);
                }
            }
            TypeDescriptor::Nullable(inner) => {
                self.flatten_union(inner, layout, out);
                out.push("null".to_string());
            }
            other => out.push(self.write(other, Position::UnionMember, layout)),
        }
    }

    fn object(&self, members: &IndexMap<String, Member>, layout: Layout) -> String {
        wrap_members(self.member_lines(members, nested(layout)), layout)
    }

    fn member_lines(&self, members: &IndexMap<String, Member>, layout: Layout) -> Vec<String> {
        members
            .iter()
            .map(|(key, member)| self.member_signature(key, member, layout))
            .collect()
    }

    fn member_signature(&self, key: &str, member: &Member, layout: Layout) -> String {
        let (ty, nested_optional) = strip_optional(&member.ty);
        let marker = if member.optional || nested_optional {
            "?"
        } else {
            ""
        };
        format!(
            "{}{}: {}",
            property_key(key),
            marker,
            self.write(ty, Position::Top, layout)
        )
    }

    fn parameter_list(&self, params: &[Param], layout: Layout) -> String {
        let rendered: Vec<String> = params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let name = match (&param.name, param.rest) {
                    (Some(name), _) => name.clone(),
                    (None, true) => "rest".to_string(),
                    (None, false) => format!("arg{}", i),
                };
                let (ty, nested_optional) = strip_optional(&param.ty);
                let rest = if param.rest { "..." } else { "" };
                let marker = if !param.rest && (param.optional || nested_optional) {
                    "?"
                } else {
                    ""
                };
                format!(
                    "{}{}{}: {}",
                    rest,
                    name,
                    marker,
                    self.write(ty, Position::Top, layout)
                )
            })
            .collect();
        format!("({})", rendered.join(", "))
    }
}

fn strip_optional(ty: &TypeDescriptor) -> (&TypeDescriptor, bool) {
    match ty {
        TypeDescriptor::Optional(inner) => (strip_optional(inner).0, true),
        other => (other, false),
    }
}

fn nested(layout: Layout) -> Layout {
    match layout {
        Layout::Inline => Layout::Inline,
        Layout::Block { indent } => Layout::Block { indent: indent + 2 },
    }
}

fn wrap_members(members: Vec<String>, layout: Layout) -> String {
    if members.is_empty() {
        return "{}".to_string();
    }
    match layout {
        Layout::Inline => format!("{{ {} }}", members.join("; ")),
        Layout::Block { indent } => {
            let inner = " ".repeat(indent + 2);
            let body: String = members
                .iter()
                .map(|m| format!("{}{};\n", inner, m))
                .collect();
            format!("{{\n{}{}}}", body, " ".repeat(indent))
        }
    }
}

fn parenthesize_unless_top(text: String, position: Position) -> String {
    if position == Position::Top {
        text
    } else {
        format!("({})", text)
    }
}

/// Property names that are not identifiers get quoted
fn property_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    let is_numeric = !key.is_empty() && key.chars().all(|c| c.is_ascii_digit());

    if is_identifier || is_numeric {
        key.to_string()
    } else {
        format!("'{}'", key.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::descriptor::{IndexKey, Primitive};
    use crate::types::grammar::parse_type;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn render(raw: &str) -> String {
        let config = MigrateConfig::default();
        TypeRenderer::new(&config).render(&parse_type(raw, &config))
    }

    fn prim(p: Primitive) -> TypeDescriptor {
        TypeDescriptor::Primitive(p)
    }

    #[test]
    fn test_render_matches_hand_written() {
        assert_eq!(render("?number"), "number | null");
        assert_eq!(render("Array.<string|number>"), "(string | number)[]");
        assert_eq!(render("Object<string, Foo>"), "{ [key: string]: Foo }");
        assert_eq!(render("Promise"), "Promise<any>");
        assert_eq!(render("function(string, number=): boolean"), "(arg0: string, arg1?: number) => boolean");
        assert_eq!(render("function(...string)"), "(...rest: string[]) => any");
        assert_eq!(render("{a: string, b: number=}"), "{ a: string; b?: number }");
        assert_eq!(render("?function()"), "(() => any) | null");
        assert_eq!(render("function()[]"), "(() => any)[]");
    }

    #[test]
    fn test_adjacent_duplicate_variants_collapse() {
        assert_eq!(render("string|String|number"), "string | number");
        assert_eq!(render("?(string|null)"), "string | null");
    }

    #[test]
    fn test_unknown_alias_is_configurable() {
        let config = MigrateConfig::default().with_unknown_type_alias("$TSFixMe");
        let renderer = TypeRenderer::new(&config);
        assert_eq!(
            renderer.render(&TypeDescriptor::array(TypeDescriptor::Unknown)),
            "$TSFixMe[]"
        );
        assert_eq!(renderer.render(&TypeDescriptor::Opaque(String::new())), "$TSFixMe");
    }

    #[test]
    fn test_misplaced_optional_falls_back() {
        let config = MigrateConfig::default();
        let ty = TypeDescriptor::array(TypeDescriptor::optional(prim(Primitive::Number)));
        assert_eq!(TypeRenderer::new(&config).render(&ty), "any[]");
    }

    #[test]
    fn test_type_alias_block_layout() {
        let mut address = IndexMap::new();
        address.insert("city".to_string(), Member::new(prim(Primitive::String), false));
        let mut members = IndexMap::new();
        members.insert("name".to_string(), Member::new(prim(Primitive::String), true));
        members.insert(
            "address".to_string(),
            Member::new(TypeDescriptor::Object(address), false),
        );
        members.insert(
            "tags".to_string(),
            Member::new(
                TypeDescriptor::IndexSignature {
                    key: IndexKey::String,
                    value: Box::new(prim(Primitive::Number)),
                },
                true,
            ),
        );
        members.insert(
            "aria-label".to_string(),
            Member::new(prim(Primitive::String), true),
        );

        let config = MigrateConfig::default();
        let text =
            TypeRenderer::new(&config).render_type_alias("User", &TypeDescriptor::Object(members));
        assert_eq!(
            text,
            indoc! {"
                type User = {
                  name?: string;
                  address: {
                    city: string;
                  };
                  tags?: {
                    [key: string]: number;
                  };
                  'aria-label'?: string;
                };"}
        );
    }

    #[test]
    fn test_parameter_and_return_annotations() {
        let config = MigrateConfig::default();
        let renderer = TypeRenderer::new(&config);
        assert_eq!(
            renderer.render_parameter_annotation(&prim(Primitive::Number), false),
            ": number"
        );
        assert_eq!(
            renderer.render_parameter_annotation(
                &TypeDescriptor::optional(prim(Primitive::Number)),
                false
            ),
            "?: number"
        );
        assert_eq!(
            renderer.render_return_type(&TypeDescriptor::named(
                "Promise",
                vec![prim(Primitive::Void)]
            )),
            ": Promise<void>"
        );
        assert_eq!(
            renderer.render_parameter_list(&[
                Param::positional(prim(Primitive::String)),
                Param {
                    name: None,
                    ty: TypeDescriptor::array(prim(Primitive::Number)),
                    optional: false,
                    rest: true,
                }
            ]),
            "(arg0: string, ...rest: number[])"
        );
    }

    #[test]
    fn test_member_list() {
        let config = MigrateConfig::default();
        let renderer = TypeRenderer::new(&config);
        let mut members = IndexMap::new();
        members.insert("id".to_string(), Member::new(prim(Primitive::Number), false));
        members.insert(
            "first-name".to_string(),
            Member::new(TypeDescriptor::Unknown, true),
        );

        assert_eq!(
            renderer.render_member_list(&TypeDescriptor::Object(members)),
            vec!["id: number".to_string(), "'first-name'?: any".to_string()]
        );
        assert!(renderer
            .render_member_list(&prim(Primitive::String))
            .is_empty());
    }

    #[test]
    fn test_opaque_is_parenthesized_when_nested() {
        let config = MigrateConfig::default();
        let ty = TypeDescriptor::array(TypeDescriptor::Opaque("typeof foo".into()));
        assert_eq!(TypeRenderer::new(&config).render(&ty), "(typeof foo)[]");
    }
}
