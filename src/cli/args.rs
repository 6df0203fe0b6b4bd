use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "typelift")]
#[command(about = "Upgrade JavaScript to TypeScript from PropTypes shapes and JSDoc tags", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite files with type aliases and signature annotations
    Migrate {
        /// Files or directories to migrate
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Config file (defaults to the nearest .typelift.toml)
        #[arg(short, long, env = "TYPELIFT_CONFIG")]
        config: Option<PathBuf>,

        /// Write migrated text back to the files
        #[arg(short, long, conflicts_with_all = ["check", "stdout"])]
        write: bool,

        /// Exit with status 1 if any file would change
        #[arg(long, conflicts_with = "stdout")]
        check: bool,

        /// Print the migrated text of a single file instead of a report
        #[arg(long)]
        stdout: bool,

        /// Leave return types alone
        #[arg(long = "no-annotate-returns")]
        no_annotate_returns: bool,

        /// Type written where nothing better is known
        #[arg(long = "unknown-alias")]
        unknown_alias: Option<String>,

        /// Number of parallel jobs (0 = all cores)
        #[arg(short = 'j', long = "jobs", default_value = "0")]
        jobs: usize,

        /// Report format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Increase log verbosity (can be repeated: -v, -vv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Write a default .typelift.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_migrate_flags() {
        let cli = Cli::try_parse_from([
            "typelift",
            "migrate",
            "src",
            "--check",
            "--unknown-alias",
            "unknown",
            "-vv",
        ])
        .unwrap();
        let Commands::Migrate {
            paths,
            check,
            unknown_alias,
            verbosity,
            ..
        } = cli.command
        else {
            panic!("expected migrate");
        };
        assert_eq!(paths, vec![PathBuf::from("src")]);
        assert!(check);
        assert_eq!(unknown_alias.as_deref(), Some("unknown"));
        assert_eq!(verbosity, 2);
    }

    #[test]
    fn test_write_conflicts_with_check() {
        assert!(Cli::try_parse_from(["typelift", "migrate", "a.js", "--write", "--check"]).is_err());
    }
}
