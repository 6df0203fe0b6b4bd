use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# Typelift Configuration

# Type written wherever nothing better is known
unknown_type_alias = "any"

# Turn @returns tags into return type annotations
annotate_returns = true

# Paths the CLI skips
ignore = [
    "node_modules/**",
    "dist/**",
    "*.min.js",
]

# Documentary type names to translate. A string renames; a table can also
# drop type arguments.
[type_map]
# "Immutable.Map" = "Map"
# "Immutable.List" = { ts_name = "ReadonlyArray", accepts_type_arguments = true }
"#;

pub fn init_config(force: bool) -> Result<()> {
    init_config_in(Path::new("."), force)
}

pub fn init_config_in(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG)?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);

    Ok(())
}
