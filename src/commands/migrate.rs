use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::cli::{configure_thread_pool, OutputFormat};
use crate::config::{load_config, load_config_from, MigrateConfig};
use crate::core::Error;
use crate::io::{self, find_source_files, FileOutcome, FileStatus, Report};
use crate::migrate::Migrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Report what would change
    DryRun,
    Write,
    /// Like `DryRun`, but pending changes fail the run
    Check,
    /// Print one file's migrated text
    Stdout,
}

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub paths: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub mode: RunMode,
    pub no_annotate_returns: bool,
    pub unknown_alias: Option<String>,
    pub jobs: usize,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub changed: usize,
    pub failed: usize,
}

/// File config first, then command-line overrides
pub fn resolve_config(options: &MigrateOptions) -> Result<MigrateConfig> {
    let mut config = match &options.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if options.no_annotate_returns {
        config.annotate_returns = false;
    }
    if let Some(alias) = &options.unknown_alias {
        config.unknown_type_alias = alias.clone();
    }
    config.validate()?;
    Ok(config)
}

pub fn run_migrate(options: MigrateOptions) -> Result<RunSummary> {
    configure_thread_pool(options.jobs);
    let config = resolve_config(&options)?;
    let files = find_source_files(&options.paths, &config.ignore)?;
    let migrator = Migrator::default();

    if options.mode == RunMode::Stdout {
        return print_single(&files, &config, &migrator);
    }

    log::info!("Migrating {} files", files.len());
    let write = options.mode == RunMode::Write;
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| migrate_file(path, &config, &migrator, write))
        .collect();

    let report = Report::new(outcomes, write);
    match options.format {
        OutputFormat::Terminal => print!("{}", report.to_terminal()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(RunSummary {
        changed: report.migrated_count(),
        failed: report.failed_count(),
    })
}

fn print_single(files: &[PathBuf], config: &MigrateConfig, migrator: &Migrator) -> Result<RunSummary> {
    let [path] = files else {
        anyhow::bail!("--stdout needs exactly one source file, found {}", files.len());
    };
    let source = io::read_file(path)?;
    let outcome = migrator
        .migrate(&source, path, config)
        .with_context(|| format!("migrating {}", path.display()))?;
    print!("{}", outcome.text);
    Ok(RunSummary {
        changed: usize::from(outcome.is_changed()),
        failed: 0,
    })
}

/// Migrate one file; failures are recorded, never propagated
pub fn migrate_file(path: &Path, config: &MigrateConfig, migrator: &Migrator, write: bool) -> FileOutcome {
    let span = tracing::info_span!("migrate_file", path = %path.display());
    let _guard = span.enter();

    let status = match try_migrate_file(path, config, migrator, write) {
        Ok(status) => status,
        Err(e) => {
            // a transform produced bad edits; the input itself was fine
            if e.downcast_ref::<Error>().is_some_and(Error::is_fatal) {
                log::error!("{}: {:#}", path.display(), e);
            } else {
                log::warn!("{}: {:#}", path.display(), e);
            }
            FileStatus::Failed {
                error: format!("{:#}", e),
            }
        }
    };

    FileOutcome {
        path: path.to_path_buf(),
        status,
    }
}

fn try_migrate_file(
    path: &Path,
    config: &MigrateConfig,
    migrator: &Migrator,
    write: bool,
) -> Result<FileStatus> {
    let source = io::read_file(path)?;
    let outcome = migrator.migrate(&source, path, config)?;
    if !outcome.is_changed() {
        return Ok(FileStatus::Unchanged);
    }
    if write {
        io::write_file(path, &outcome.text)?;
    }
    Ok(FileStatus::Migrated {
        transforms: outcome.applied,
    })
}
