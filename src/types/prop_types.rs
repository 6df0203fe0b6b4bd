//! Structural grammar: `prop-types` validator expressions
//!
//! Converts validator call trees such as
//! `PropTypes.shape({ id: PropTypes.number.isRequired })` into
//! [`TypeDescriptor`]s. Validators are recognised through the bindings the
//! file itself creates for `prop-types`, so both `PropTypes.string` and a
//! named `string` import resolve.

use std::collections::HashMap;

use indexmap::IndexMap;
use tree_sitter::Node;

use super::descriptor::{IndexKey, Member, Primitive, TypeDescriptor};
use super::grammar::parse_type;
use crate::config::MigrateConfig;
use crate::core::JsLanguageVariant;
use crate::parser::{named_children, node_text, parse_tree, string_value};

pub const PROP_TYPES_MODULE: &str = "prop-types";

/// Local name used when the file has no default or namespace binding
pub const DEFAULT_NAMESPACE: &str = "PropTypes";

/// How one file binds the `prop-types` module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropTypesScope {
    /// Locals bound to the whole module, in declaration order
    pub namespaces: Vec<String>,
    /// Named-import locals mapped to the validator they import
    pub named: HashMap<String, String>,
    /// Top-level shape bindings mapped to their synthesized alias
    pub shape_aliases: HashMap<String, String>,
}

/// A validator expression reduced to a type plus its `.isRequired` marker
#[derive(Debug, Clone, PartialEq)]
pub struct PropType {
    pub ty: TypeDescriptor,
    pub required: bool,
}

/// Top-level initializer patterns that produce a type alias
#[derive(Debug, Clone, Copy)]
pub enum ShapePattern<'t> {
    /// `shape({...})`; the node is the object literal
    Shape(Node<'t>),
    /// `arrayOf(shape({...}))`; the node is the inner object literal
    ArrayOfShape(Node<'t>),
}

impl<'t> ShapePattern<'t> {
    pub fn object(&self) -> Node<'t> {
        match self {
            ShapePattern::Shape(node) | ShapePattern::ArrayOfShape(node) => *node,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ShapePattern::ArrayOfShape(_))
    }
}

impl PropTypesScope {
    pub fn with_namespace(name: impl Into<String>) -> Self {
        Self {
            namespaces: vec![name.into()],
            ..Self::default()
        }
    }

    /// Collect the `prop-types` bindings made by top-level imports and requires
    pub fn from_program(root: Node, source: &str) -> Self {
        let mut scope = Self::default();
        for statement in named_children(&root) {
            match statement.kind() {
                "import_statement" => scope.collect_import(statement, source),
                "lexical_declaration" | "variable_declaration" => {
                    for declarator in named_children(&statement) {
                        if declarator.kind() == "variable_declarator" {
                            scope.collect_require(declarator, source);
                        }
                    }
                }
                _ => {}
            }
        }
        scope
    }

    /// Whether the file binds `prop-types` at all
    pub fn is_present(&self) -> bool {
        !self.namespaces.is_empty() || !self.named.is_empty()
    }

    /// The local that carries the module's type namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespaces.first().map(String::as_str)
    }

    fn collect_import(&mut self, statement: Node, source: &str) {
        let is_prop_types = statement
            .child_by_field_name("source")
            .is_some_and(|s| string_value(&s, source) == PROP_TYPES_MODULE);
        if !is_prop_types {
            return;
        }

        let clauses = named_children(&statement)
            .into_iter()
            .filter(|c| c.kind() == "import_clause");
        for clause in clauses {
            for binding in named_children(&clause) {
                match binding.kind() {
                    "identifier" => self.namespaces.push(node_text(&binding, source).to_string()),
                    "namespace_import" => {
                        if let Some(local) = named_children(&binding)
                            .into_iter()
                            .find(|n| n.kind() == "identifier")
                        {
                            self.namespaces.push(node_text(&local, source).to_string());
                        }
                    }
                    "named_imports" => {
                        for specifier in named_children(&binding) {
                            if specifier.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(name) = specifier.child_by_field_name("name") else {
                                continue;
                            };
                            let imported = string_value(&name, source);
                            let local = specifier
                                .child_by_field_name("alias")
                                .map(|alias| node_text(&alias, source).to_string())
                                .unwrap_or_else(|| imported.clone());
                            self.bind_named(local, imported);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// `const PropTypes = require('prop-types')` and destructuring forms
    fn collect_require(&mut self, declarator: Node, source: &str) {
        let (Some(name), Some(value)) = (
            declarator.child_by_field_name("name"),
            declarator.child_by_field_name("value"),
        ) else {
            return;
        };
        if !is_require_of(value, source, PROP_TYPES_MODULE) {
            return;
        }

        match name.kind() {
            "identifier" => self.namespaces.push(node_text(&name, source).to_string()),
            "object_pattern" => {
                for property in named_children(&name) {
                    match property.kind() {
                        "shorthand_property_identifier_pattern" => {
                            let local = node_text(&property, source).to_string();
                            self.bind_named(local.clone(), local);
                        }
                        "pair_pattern" => {
                            if let (Some(key), Some(value)) = (
                                property.child_by_field_name("key"),
                                property.child_by_field_name("value"),
                            ) {
                                if value.kind() == "identifier" {
                                    self.bind_named(
                                        node_text(&value, source).to_string(),
                                        string_value(&key, source),
                                    );
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn bind_named(&mut self, local: String, imported: String) {
        if imported == "default" {
            self.namespaces.push(local);
        } else {
            self.named.insert(local, imported);
        }
    }

    /// Validator name an expression refers to: `PropTypes.x` or a named import
    pub fn validator_name(&self, node: Node, source: &str) -> Option<String> {
        match node.kind() {
            "member_expression" => {
                let object = node.child_by_field_name("object")?;
                let property = node.child_by_field_name("property")?;
                let is_namespace = object.kind() == "identifier"
                    && self.namespaces.iter().any(|ns| ns == node_text(&object, source));
                is_namespace.then(|| node_text(&property, source).to_string())
            }
            "identifier" => self.named.get(node_text(&node, source)).cloned(),
            _ => None,
        }
    }

    /// Match an initializer against the alias-producing patterns
    pub fn match_shape_pattern<'t>(&self, node: Node<'t>, source: &str) -> Option<ShapePattern<'t>> {
        if let Some(object) = self.shape_call_object(node, source) {
            return Some(ShapePattern::Shape(object));
        }
        let (name, args) = self.validator_call(node, source)?;
        if name != "arrayOf" {
            return None;
        }
        let inner = args.into_iter().next()?;
        self.shape_call_object(inner, source)
            .map(ShapePattern::ArrayOfShape)
    }

    /// The object literal argument of a `shape(...)` or `exact(...)` call
    fn shape_call_object<'t>(&self, node: Node<'t>, source: &str) -> Option<Node<'t>> {
        let (name, args) = self.validator_call(node, source)?;
        if name != "shape" && name != "exact" {
            return None;
        }
        args.into_iter().next().filter(|arg| arg.kind() == "object")
    }

    fn validator_call<'t>(&self, node: Node<'t>, source: &str) -> Option<(String, Vec<Node<'t>>)> {
        if node.kind() != "call_expression" {
            return None;
        }
        let name = self.validator_name(node.child_by_field_name("function")?, source)?;
        let args = node
            .child_by_field_name("arguments")
            .map(|args| {
                named_children(&args)
                    .into_iter()
                    .filter(|a| a.kind() != "comment")
                    .collect()
            })
            .unwrap_or_default();
        Some((name, args))
    }
}

/// Whether `node` is `require('<module>')`
pub fn is_require_of(node: Node, source: &str, module: &str) -> bool {
    if node.kind() != "call_expression" {
        return false;
    }
    let is_require = node
        .child_by_field_name("function")
        .is_some_and(|f| node_text(&f, source) == "require");
    is_require
        && node.child_by_field_name("arguments").is_some_and(|args| {
            named_children(&args)
                .first()
                .is_some_and(|a| a.kind() == "string" && string_value(a, source) == module)
        })
}

/// Walks validator expressions of one file
pub struct PropTypesReader<'a> {
    scope: &'a PropTypesScope,
    source: &'a str,
    config: &'a MigrateConfig,
}

impl<'a> PropTypesReader<'a> {
    pub fn new(scope: &'a PropTypesScope, source: &'a str, config: &'a MigrateConfig) -> Self {
        Self {
            scope,
            source,
            config,
        }
    }

    /// Convert an object literal of validators into an object type
    pub fn shape_literal(&self, object: Node) -> TypeDescriptor {
        let mut members = IndexMap::new();
        for property in named_children(&object) {
            match property.kind() {
                "pair" => {
                    let (Some(key), Some(value)) = (
                        property.child_by_field_name("key"),
                        property.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    let Some(key) = self.property_key(key) else {
                        log::debug!(
                            "Skipping computed shape key at line {}",
                            key.start_position().row + 1
                        );
                        continue;
                    };
                    let prop = self.prop_type(value);
                    members.insert(key, Member::new(prop.ty, !prop.required));
                }
                "shorthand_property_identifier" => {
                    let key = node_text(&property, self.source).to_string();
                    let prop = self.prop_type(property);
                    members.insert(key, Member::new(prop.ty, !prop.required));
                }
                "comment" => {}
                other => log::debug!("Skipping {} inside shape literal", other),
            }
        }
        TypeDescriptor::Object(members)
    }

    fn property_key(&self, key: Node) -> Option<String> {
        match key.kind() {
            "property_identifier" | "number" => Some(node_text(&key, self.source).to_string()),
            "string" => Some(string_value(&key, self.source)),
            _ => None,
        }
    }

    /// Convert one validator expression
    pub fn prop_type(&self, node: Node) -> PropType {
        let optional = |ty| PropType {
            ty,
            required: false,
        };

        if node.kind() == "member_expression" {
            let is_required = node
                .child_by_field_name("property")
                .is_some_and(|p| node_text(&p, self.source) == "isRequired");
            if let (true, Some(object)) = (is_required, node.child_by_field_name("object")) {
                return PropType {
                    ty: self.prop_type(object).ty,
                    required: true,
                };
            }
        }

        if let Some((name, args)) = self.scope.validator_call(node, self.source) {
            return optional(self.validator_call_type(&name, &args));
        }

        if let Some(name) = self.scope.validator_name(node, self.source) {
            return optional(simple_validator_type(&name));
        }

        let text = node_text(&node, self.source);
        if let Some(alias) = self.scope.shape_aliases.get(text) {
            return optional(TypeDescriptor::named(alias.clone(), vec![]));
        }

        log::debug!("Unrecognised validator {:?}", text);
        optional(TypeDescriptor::Unknown)
    }

    fn validator_call_type(&self, name: &str, args: &[Node]) -> TypeDescriptor {
        let Some(first) = args.first().copied() else {
            return TypeDescriptor::Unknown;
        };
        match name {
            "shape" | "exact" if first.kind() == "object" => self.shape_literal(first),
            "arrayOf" => TypeDescriptor::array(self.prop_type(first).ty),
            "objectOf" => TypeDescriptor::IndexSignature {
                key: IndexKey::String,
                value: Box::new(self.prop_type(first).ty),
            },
            "instanceOf" => match first.kind() {
                "identifier" | "member_expression" => {
                    parse_type(node_text(&first, self.source), self.config)
                }
                _ => TypeDescriptor::Unknown,
            },
            "oneOf" => self.one_of(first),
            "oneOfType" if first.kind() == "array" => {
                let variants: Vec<_> = named_children(&first)
                    .into_iter()
                    .filter(|n| n.kind() != "comment")
                    .map(|n| self.prop_type(n).ty)
                    .collect();
                match variants.len() {
                    0 => TypeDescriptor::Unknown,
                    1 => variants.into_iter().next().unwrap_or(TypeDescriptor::Unknown),
                    _ => TypeDescriptor::Union(variants),
                }
            }
            _ => TypeDescriptor::Unknown,
        }
    }

    /// `oneOf([...])` of literals; any non-literal entry makes the whole set unknown
    fn one_of(&self, list: Node) -> TypeDescriptor {
        if list.kind() != "array" {
            return TypeDescriptor::Unknown;
        }
        let mut variants = Vec::new();
        for element in named_children(&list) {
            let variant = match element.kind() {
                "string" | "number" | "true" | "false" => {
                    TypeDescriptor::Literal(node_text(&element, self.source).to_string())
                }
                "null" => TypeDescriptor::Primitive(Primitive::Null),
                "undefined" => TypeDescriptor::Primitive(Primitive::Undefined),
                "comment" => continue,
                _ => return TypeDescriptor::Unknown,
            };
            variants.push(variant);
        }
        match variants.len() {
            0 => TypeDescriptor::Unknown,
            1 => variants.remove(0),
            _ => TypeDescriptor::Union(variants),
        }
    }
}

fn simple_validator_type(name: &str) -> TypeDescriptor {
    match name {
        "array" => TypeDescriptor::array(TypeDescriptor::Unknown),
        "bool" => TypeDescriptor::Primitive(Primitive::Boolean),
        "func" => TypeDescriptor::any_function(),
        "number" => TypeDescriptor::Primitive(Primitive::Number),
        "object" => TypeDescriptor::Primitive(Primitive::Object),
        "string" => TypeDescriptor::Primitive(Primitive::String),
        "symbol" => TypeDescriptor::Primitive(Primitive::Symbol),
        "node" => TypeDescriptor::named("React.ReactNode", vec![]),
        "element" => TypeDescriptor::named("React.ReactElement", vec![]),
        "elementType" => TypeDescriptor::named("React.ElementType", vec![]),
        _ => TypeDescriptor::Unknown,
    }
}

/// Parse a standalone object literal of `PropTypes.*` validators
pub fn parse_shape_literal(raw: &str, config: &MigrateConfig) -> TypeDescriptor {
    let wrapped = format!("({});", raw.trim());
    let Some(tree) = parse_tree(&wrapped, JsLanguageVariant::Tsx) else {
        return TypeDescriptor::Unknown;
    };

    let object = named_children(&tree.root_node())
        .into_iter()
        .find(|n| n.kind() == "expression_statement")
        .and_then(|statement| named_children(&statement).into_iter().next())
        .and_then(|expr| {
            if expr.kind() == "parenthesized_expression" {
                named_children(&expr).into_iter().next()
            } else {
                Some(expr)
            }
        })
        .filter(|n| n.kind() == "object");

    match object {
        Some(object) => {
            let scope = PropTypesScope::with_namespace(DEFAULT_NAMESPACE);
            PropTypesReader::new(&scope, &wrapped, config).shape_literal(object)
        }
        None => {
            log::debug!("Not an object literal: {:?}", raw);
            TypeDescriptor::Unknown
        }
    }
}
