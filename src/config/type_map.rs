use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// How a documentary type name is translated
///
/// In config files either a bare string (`Foo = "Bar"`) or a table
/// (`date = { ts_name = "Date", accepts_type_arguments = false }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeMapping {
    Rename(String),
    Record {
        #[serde(alias = "tsName", alias = "targetName", alias = "target_name")]
        ts_name: String,
        #[serde(
            default = "default_accepts_type_arguments",
            alias = "acceptsTypeArguments",
            alias = "acceptsTypeParameters",
            alias = "accepts_type_parameters"
        )]
        accepts_type_arguments: bool,
    },
}

fn default_accepts_type_arguments() -> bool {
    true
}

impl TypeMapping {
    pub fn record(ts_name: &str, accepts_type_arguments: bool) -> Self {
        Self::Record {
            ts_name: ts_name.to_string(),
            accepts_type_arguments,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Rename(name) => name,
            Self::Record { ts_name, .. } => ts_name,
        }
    }

    pub fn accepts_type_arguments(&self) -> bool {
        match self {
            Self::Rename(_) => true,
            Self::Record {
                accepts_type_arguments,
                ..
            } => *accepts_type_arguments,
        }
    }
}

/// Mappings that apply unless a config entry of the same name overrides them
pub static DEFAULT_TYPE_MAP: Lazy<IndexMap<String, TypeMapping>> = Lazy::new(|| {
    let mut map = IndexMap::new();
    map.insert("String".to_string(), TypeMapping::record("string", false));
    map.insert("Boolean".to_string(), TypeMapping::record("boolean", false));
    map.insert("Number".to_string(), TypeMapping::record("number", false));
    map.insert("Object".to_string(), TypeMapping::record("object", false));
    map.insert("date".to_string(), TypeMapping::record("Date", false));
    map.insert("array".to_string(), TypeMapping::Rename("Array".to_string()));
    map.insert("promise".to_string(), TypeMapping::Rename("Promise".to_string()));
    map
});
