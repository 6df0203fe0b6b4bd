//! Migration options
//!
//! `MigrateConfig` carries the unknown-type alias, the return annotation
//! switch, and the documentary type-name map. It is passed explicitly into
//! every parse and render call; nothing here is global mutable state.

mod core;
mod loader;
pub mod type_map;

pub use core::{default_annotate_returns, default_unknown_type_alias, MigrateConfig};
pub use loader::{
    directory_ancestors, discover_config, load_config, load_config_from,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
pub use type_map::{TypeMapping, DEFAULT_TYPE_MAP};
