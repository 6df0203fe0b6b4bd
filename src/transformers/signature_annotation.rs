//! Signature annotation
//!
//! Moves the types written in `@param`/`@returns` tags onto the signature
//! itself. Functions are visited children first, so a closure nested in a
//! documented function is annotated from its own comment. Parameters and
//! return types that already carry an annotation are never touched.

use tree_sitter::Node;

use super::Transform;
use crate::config::MigrateConfig;
use crate::core::{Result, SourceFile};
use crate::jsdoc::{leading_doc_comment, DocComment, ParamTag};
use crate::parser::{has_child_kind, named_children, node_line, node_text};
use crate::patch::Edit;
use crate::types::tag_tree::{child_segment, root_segment};
use crate::types::{
    parse_binding_type, parse_type, ParsedBinding, Primitive, TagTree, TypeDescriptor,
    TypeRenderer,
};

pub struct SignatureAnnotation;

impl Transform for SignatureAnnotation {
    fn name(&self) -> &'static str {
        "signature-annotation"
    }

    fn run(&self, file: &SourceFile, config: &MigrateConfig) -> Result<Vec<Edit>> {
        let mut annotator = Annotator {
            source: &file.source,
            config,
            renderer: TypeRenderer::new(config),
            edits: Vec::new(),
        };
        annotator.visit(file.root());
        Ok(annotator.edits)
    }
}

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "function",
    "generator_function_declaration",
    "generator_function",
    "arrow_function",
    "method_definition",
];

fn is_generator(function: Node) -> bool {
    matches!(
        function.kind(),
        "generator_function_declaration" | "generator_function"
    ) || has_child_kind(&function, "*")
}

/// One entry of a formal parameter list
struct ParamSite {
    /// Where a `: T` goes (end of the binding pattern)
    anchor: usize,
    name: Option<String>,
    /// Property names of an object destructuring pattern
    properties: Vec<String>,
    rest: bool,
    has_default: bool,
    /// Written as `a?` already
    marked_optional: bool,
    typed: bool,
}

impl ParamSite {
    fn is_required(&self) -> bool {
        !self.rest && !self.has_default && !self.marked_optional
    }
}

struct ParamPlan {
    anchor: usize,
    ty: TypeDescriptor,
    optional: bool,
}

struct Annotator<'a> {
    source: &'a str,
    config: &'a MigrateConfig,
    renderer: TypeRenderer<'a>,
    edits: Vec<Edit>,
}

impl Annotator<'_> {
    fn visit(&mut self, node: Node) {
        for child in named_children(&node) {
            self.visit(child);
        }
        if FUNCTION_KINDS.contains(&node.kind()) {
            self.annotate_function(node);
        }
    }

    fn annotate_function(&mut self, function: Node) {
        let Some(doc) = leading_doc_comment(function, self.source) else {
            return;
        };
        if doc.is_empty() {
            return;
        }

        let return_annotation = if self.config.annotate_returns {
            self.return_annotation(function, &doc)
        } else {
            None
        };

        if let Some(parameter) = function.child_by_field_name("parameter") {
            // `x => ...` needs parentheses before anything can be attached
            let annotation = self.bare_parameter_annotation(parameter, &doc);
            if annotation.is_some() || return_annotation.is_some() {
                self.edits.push(Edit::insert(parameter.start_byte(), "("));
                self.edits.push(Edit::insert(
                    parameter.end_byte(),
                    format!("{})", annotation.unwrap_or_default()),
                ));
            }
            if let Some(ret) = return_annotation {
                self.edits.push(Edit::insert(parameter.end_byte(), ret));
            }
        } else if let Some(parameters) = function.child_by_field_name("parameters") {
            if !doc.params.is_empty() {
                self.annotate_parameters(parameters, &doc);
            }
            if let Some(ret) = return_annotation {
                self.edits.push(Edit::insert(parameters.end_byte(), ret));
            }
        }

        if function.kind() == "method_definition" {
            self.annotate_accessibility(function, &doc);
        }
    }

    fn bare_parameter_annotation(&self, parameter: Node, doc: &DocComment) -> Option<String> {
        if parameter.kind() != "identifier" {
            return None;
        }
        let name = node_text(&parameter, self.source);
        let tag = doc
            .top_level_params()
            .find(|t| t.name == name)
            .or_else(|| doc.top_level_params().next());
        let root = tag.map_or(name, |t| t.name.as_str());
        let (ty, optional) = self.tag_type(root, tag, doc)?;
        Some(self.renderer.render_parameter_annotation(&ty, optional))
    }

    fn annotate_parameters(&mut self, parameters: Node, doc: &DocComment) {
        let sites = self.parameter_sites(parameters);
        let names: Vec<&str> = sites.iter().filter_map(|s| s.name.as_deref()).collect();

        let mut plans: Vec<Option<ParamPlan>> = sites
            .iter()
            .enumerate()
            .map(|(index, site)| {
                if site.typed {
                    return None;
                }
                self.plan_parameter(site, index, &names, doc)
            })
            .collect();

        // an optional parameter may not precede a required one
        let mut later_required = false;
        for (site, plan) in sites.iter().zip(plans.iter_mut()).rev() {
            if let Some(plan) = plan.as_mut() {
                if plan.optional && later_required {
                    plan.optional = false;
                    if !plan.ty.is_unknown() {
                        let ty = std::mem::replace(&mut plan.ty, TypeDescriptor::Unknown);
                        plan.ty = TypeDescriptor::Union(vec![
                            ty,
                            TypeDescriptor::Primitive(Primitive::Undefined),
                        ]);
                    }
                }
            }
            let planned_optional = plan.as_ref().is_some_and(|p| p.optional);
            later_required |= site.is_required() && !planned_optional;
        }

        for plan in plans.into_iter().flatten() {
            self.edits.push(Edit::insert(
                plan.anchor,
                self.renderer.render_parameter_annotation(&plan.ty, plan.optional),
            ));
        }
    }

    fn parameter_sites(&self, parameters: Node) -> Vec<ParamSite> {
        named_children(&parameters)
            .into_iter()
            .filter(|p| matches!(p.kind(), "required_parameter" | "optional_parameter"))
            .filter_map(|param| {
                let pattern = param.child_by_field_name("pattern")?;
                // `a?` takes its annotation after the question mark
                let mut cursor = param.walk();
                let anchor = param
                    .children(&mut cursor)
                    .find(|c| c.kind() == "?")
                    .map_or(pattern.end_byte(), |mark| mark.end_byte());
                let mut site = ParamSite {
                    anchor,
                    name: None,
                    properties: Vec::new(),
                    rest: false,
                    has_default: param.child_by_field_name("value").is_some(),
                    marked_optional: param.kind() == "optional_parameter",
                    typed: param.child_by_field_name("type").is_some(),
                };
                match pattern.kind() {
                    "identifier" => site.name = Some(node_text(&pattern, self.source).to_string()),
                    "rest_pattern" => {
                        site.rest = true;
                        site.name = named_children(&pattern)
                            .into_iter()
                            .find(|n| n.kind() == "identifier")
                            .map(|n| node_text(&n, self.source).to_string());
                    }
                    "object_pattern" => site.properties = self.pattern_properties(pattern),
                    _ => {}
                }
                Some(site)
            })
            .collect()
    }

    fn pattern_properties(&self, pattern: Node) -> Vec<String> {
        named_children(&pattern)
            .into_iter()
            .filter_map(|property| match property.kind() {
                "shorthand_property_identifier_pattern" => {
                    Some(node_text(&property, self.source).to_string())
                }
                "pair_pattern" => property
                    .child_by_field_name("key")
                    .map(|key| node_text(&key, self.source).to_string()),
                "object_assignment_pattern" => property
                    .child_by_field_name("left")
                    .map(|left| node_text(&left, self.source).to_string()),
                _ => None,
            })
            .collect()
    }

    fn plan_parameter(
        &self,
        site: &ParamSite,
        index: usize,
        names: &[&str],
        doc: &DocComment,
    ) -> Option<ParamPlan> {
        // a positional tag must not belong to some other parameter
        let positional = || {
            doc.top_level_params()
                .nth(index)
                .filter(|t| !names.contains(&t.name.as_str()))
        };

        let (ty, optional) = if let Some(name) = &site.name {
            let tag = doc
                .top_level_params()
                .find(|t| &t.name == name)
                .or_else(positional);
            let root = tag.map_or(name.as_str(), |t| t.name.as_str());
            self.tag_type(root, tag, doc)?
        } else if !site.properties.is_empty() {
            let root = doc
                .params
                .iter()
                .filter(|t| t.is_dotted())
                .find(|t| {
                    child_segment(&t.name).is_some_and(|c| site.properties.iter().any(|p| p == c))
                })
                .map(|t| root_segment(&t.name));
            match root {
                Some(root) => {
                    let tag = doc.top_level_params().find(|t| t.name == root);
                    self.tag_type(root, tag, doc)?
                }
                None => match positional() {
                    Some(tag) => self.tag_type(&tag.name, Some(tag), doc)?,
                    None => (TypeDescriptor::Primitive(Primitive::Object), false),
                },
            }
        } else {
            let tag = positional()?;
            self.tag_type(&tag.name, Some(tag), doc)?
        };

        let ty = if site.rest && !ty.is_array() {
            TypeDescriptor::array(ty)
        } else {
            ty
        };

        Some(ParamPlan {
            anchor: site.anchor,
            ty,
            optional: optional && site.is_required(),
        })
    }

    /// Type for the tag group rooted at `root`, and whether it is optional
    fn tag_type(
        &self,
        root: &str,
        tag: Option<&ParamTag>,
        doc: &DocComment,
    ) -> Option<(TypeDescriptor, bool)> {
        let members: Vec<&ParamTag> = doc
            .params
            .iter()
            .filter(|t| t.is_dotted() && root_segment(&t.name) == root)
            .collect();
        if tag.is_none() && members.is_empty() {
            return None;
        }

        let binding = tag.map(|t| self.parse_tag(t)).unwrap_or(ParsedBinding {
            ty: TypeDescriptor::Unknown,
            optional: false,
            rest: false,
        });
        let optional = tag.is_some_and(|t| t.optional) || binding.optional;
        if members.is_empty() {
            return Some((binding.ty, optional));
        }

        let mut tree = TagTree::new(root);
        if tag.is_some() {
            tree.insert(root, binding.ty, false);
        }
        for member in members {
            let parsed = self.parse_tag(member);
            tree.insert(&member.name, parsed.ty, member.optional || parsed.optional);
        }
        Some((tree.to_descriptor(), optional))
    }

    fn parse_tag(&self, tag: &ParamTag) -> ParsedBinding {
        match &tag.type_expr {
            Some(expr) => parse_binding_type(expr, self.config),
            None => ParsedBinding {
                ty: TypeDescriptor::Unknown,
                optional: false,
                rest: false,
            },
        }
    }

    fn return_annotation(&self, function: Node, doc: &DocComment) -> Option<String> {
        let raw = doc.returns.as_deref()?;
        if function.child_by_field_name("return_type").is_some() {
            return None;
        }
        if function.kind() == "method_definition" {
            let is_constructor = function
                .child_by_field_name("name")
                .is_some_and(|n| node_text(&n, self.source) == "constructor");
            if is_constructor || has_child_kind(&function, "set") {
                return None;
            }
        }

        let (ty, _) = parse_type(raw, self.config).split_optional();
        if is_generator(function) {
            // a documented yield type is not a valid generator return type
            if !ty.is_iterator_like() {
                log::debug!("Generator at line {} keeps its return type", node_line(&function));
                return None;
            }
            return Some(self.renderer.render_return_type(&ty));
        }
        let ty = if has_child_kind(&function, "async") && !ty.is_promise() {
            TypeDescriptor::named("Promise", vec![ty])
        } else {
            ty
        };
        Some(self.renderer.render_return_type(&ty))
    }

    fn annotate_accessibility(&mut self, method: Node, doc: &DocComment) {
        let Some(access) = doc.access else {
            return;
        };
        let in_class = method.parent().is_some_and(|p| p.kind() == "class_body");
        let is_private_name = method
            .child_by_field_name("name")
            .is_some_and(|n| n.kind() == "private_property_identifier");
        if !in_class || is_private_name || has_child_kind(&method, "accessibility_modifier") {
            return;
        }

        let mut cursor = method.walk();
        let first = method
            .children(&mut cursor)
            .find(|c| !matches!(c.kind(), "decorator" | "comment"));
        if let Some(first) = first {
            self.edits.push(Edit::insert(
                first.start_byte(),
                format!("{} ", access.keyword()),
            ));
        }
    }
}
