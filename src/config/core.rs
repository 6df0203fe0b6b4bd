use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::type_map::{TypeMapping, DEFAULT_TYPE_MAP};
use crate::core::{Error, Result};

/// Root configuration structure, read from `.typelift.toml`
///
/// Read-only for the duration of a file's migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Type name written wherever nothing better is known
    #[serde(
        default = "default_unknown_type_alias",
        alias = "unknownTypeAlias",
        alias = "anyAlias"
    )]
    pub unknown_type_alias: String,

    /// Whether `@returns` tags produce return type annotations
    #[serde(default = "default_annotate_returns", alias = "annotateReturns")]
    pub annotate_returns: bool,

    /// Documentary type name translations, applied on top of the defaults
    #[serde(default, alias = "typeMap", alias = "typeNameMap")]
    pub type_map: IndexMap<String, TypeMapping>,

    /// Glob patterns the CLI skips when walking directories
    #[serde(default)]
    pub ignore: Vec<String>,
}

pub fn default_unknown_type_alias() -> String {
    "any".to_string()
}

pub fn default_annotate_returns() -> bool {
    true
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            unknown_type_alias: default_unknown_type_alias(),
            annotate_returns: default_annotate_returns(),
            type_map: IndexMap::new(),
            ignore: Vec::new(),
        }
    }
}

impl MigrateConfig {
    pub fn with_unknown_type_alias(mut self, alias: impl Into<String>) -> Self {
        self.unknown_type_alias = alias.into();
        self
    }

    pub fn with_annotate_returns(mut self, annotate: bool) -> Self {
        self.annotate_returns = annotate;
        self
    }

    pub fn with_type_mapping(mut self, name: impl Into<String>, mapping: TypeMapping) -> Self {
        self.type_map.insert(name.into(), mapping);
        self
    }

    /// Resolve a documentary type name, user entries first
    pub fn lookup_type(&self, name: &str) -> Option<&TypeMapping> {
        self.type_map
            .get(name)
            .or_else(|| DEFAULT_TYPE_MAP.get(name))
    }

    pub fn validate(&self) -> Result<()> {
        if !is_type_name(&self.unknown_type_alias) {
            return Err(Error::configuration(format!(
                "unknown_type_alias must be a type name, got {:?}",
                self.unknown_type_alias
            )));
        }

        if let Some((name, _)) = self
            .type_map
            .iter()
            .find(|(name, mapping)| name.is_empty() || mapping.target().trim().is_empty())
        {
            return Err(Error::configuration(format!(
                "type_map entry {:?} needs a non-empty name and target",
                name
            )));
        }

        Ok(())
    }
}

/// Identifier-like, optionally dotted (`any`, `$TSFixMe`, `Types.Unknown`)
fn is_type_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MigrateConfig::default();
        assert_eq!(config.unknown_type_alias, "any");
        assert!(config.annotate_returns);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: MigrateConfig = toml::from_str("annotate_returns = false").unwrap();
        assert_eq!(config.unknown_type_alias, "any");
        assert!(!config.annotate_returns);
    }

    #[test]
    fn test_camel_case_keys() {
        let config: MigrateConfig =
            toml::from_str("anyAlias = \"$TSFixMe\"\nannotateReturns = false").unwrap();
        assert_eq!(config.unknown_type_alias, "$TSFixMe");
        assert!(!config.annotate_returns);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_user_mapping_overrides_default() {
        let config = MigrateConfig::default()
            .with_type_mapping("Object", TypeMapping::Rename("Record".into()));
        assert_eq!(config.lookup_type("Object").unwrap().target(), "Record");
        assert_eq!(config.lookup_type("String").unwrap().target(), "string");
        assert!(config.lookup_type("Widget").is_none());
    }

    #[test]
    fn test_validate_rejects_bad_alias() {
        let config = MigrateConfig::default().with_unknown_type_alias("not a type");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = MigrateConfig::default().with_unknown_type_alias("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_mapping_target() {
        let config =
            MigrateConfig::default().with_type_mapping("Foo", TypeMapping::Rename(" ".into()));
        assert!(config.validate().is_err());
    }
}
