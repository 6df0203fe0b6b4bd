use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::MigrateConfig;
use crate::core::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".typelift.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Read a config file's contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse and validate config from a TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<MigrateConfig> {
    let config = toml::from_str::<MigrateConfig>(contents)?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly named config file; it must exist and be valid
pub fn load_config_from(path: &Path) -> Result<MigrateConfig> {
    let contents = read_config_file(path).map_err(|e| {
        Error::configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    let config = parse_and_validate_config(&contents).map_err(|e| {
        Error::configuration(format!("{}: {}", path.display(), e))
    })?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Try one candidate location during discovery
///
/// A missing file is silently skipped; an unreadable or invalid one is an
/// error, since the user clearly meant it to apply.
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Result<Option<MigrateConfig>> {
    match read_config_file(config_path) {
        Ok(contents) => {
            let config = parse_and_validate_config(&contents).map_err(|e| {
                Error::configuration(format!("{}: {}", config_path.display(), e))
            })?;
            log::debug!("Loaded config from {}", config_path.display());
            Ok(Some(config))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => {
            log::warn!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            );
            Ok(None)
        }
    }
}

/// Directory ancestors of `start`, nearest first, up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for `.typelift.toml`
pub fn discover_config(start: &Path) -> Result<MigrateConfig> {
    for dir in directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH) {
        if let Some(config) = try_load_config_from_path(&dir.join(CONFIG_FILE_NAME))? {
            return Ok(config);
        }
    }

    log::debug!(
        "No config found after checking {} directories. Using default config.",
        MAX_TRAVERSAL_DEPTH
    );
    Ok(MigrateConfig::default())
}

/// Config for the current working directory
pub fn load_config() -> Result<MigrateConfig> {
    match std::env::current_dir() {
        Ok(dir) => discover_config(&dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            Ok(MigrateConfig::default())
        }
    }
}
