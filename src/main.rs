use anyhow::Result;
use std::process::ExitCode;
use typelift::cli::{init_logging, parse_args, Commands};
use typelift::commands::{init_config, run_migrate, MigrateOptions, RunMode};

fn main() -> Result<ExitCode> {
    let cli = parse_args();

    match cli.command {
        Commands::Migrate {
            paths,
            config,
            write,
            check,
            stdout,
            no_annotate_returns,
            unknown_alias,
            jobs,
            format,
            verbosity,
        } => {
            init_logging(verbosity);
            let mode = select_mode(write, check, stdout);
            let summary = run_migrate(MigrateOptions {
                paths,
                config,
                mode,
                no_annotate_returns,
                unknown_alias,
                jobs,
                format,
            })?;

            if summary.failed > 0 {
                return Ok(ExitCode::from(2));
            }
            if mode == RunMode::Check && summary.changed > 0 {
                return Ok(ExitCode::from(1));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            init_logging(0);
            init_config(force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn select_mode(write: bool, check: bool, stdout: bool) -> RunMode {
    if write {
        RunMode::Write
    } else if check {
        RunMode::Check
    } else if stdout {
        RunMode::Stdout
    } else {
        RunMode::DryRun
    }
}
