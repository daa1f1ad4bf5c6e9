//! CLI argument definitions for keel.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "keel",
    version,
    about = "Dependency resolver for extension packages",
    long_about = "keel tracks installed extension packages in a lock and checks that a \
                  package's declared dependencies are installed at compatible versions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a package revision against the lock
    Resolve {
        /// Package metadata file (TOML)
        #[arg(short, long)]
        meta: PathBuf,
        /// Package reference, e.g. registry/org/name:v1.0.0
        #[arg(short, long)]
        package: String,
        /// Remove the package from the lock instead of installing it
        #[arg(long)]
        inactive: bool,
        /// Lock file (defaults to the configured lock path)
        #[arg(long, env = "KEEL_LOCK")]
        lock: Option<PathBuf>,
        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },

    /// List the packages recorded in the lock
    Lock {
        /// Lock file (defaults to the configured lock path)
        #[arg(long, env = "KEEL_LOCK")]
        lock: Option<PathBuf>,
    },

    /// Print the transitive dependencies of an installed package
    Trace {
        /// Package source, without tag or digest
        source: String,
        /// Lock file (defaults to the configured lock path)
        #[arg(long, env = "KEEL_LOCK")]
        lock: Option<PathBuf>,
        /// Maximum tree depth to display
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

/// Parse command-line arguments.
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_flags() {
        let cli = Cli::try_parse_from([
            "keel",
            "resolve",
            "--meta",
            "meta.toml",
            "--package",
            "org/a:v1.0.0",
            "--inactive",
            "--lock",
            "other.lock",
        ])
        .unwrap();
        match cli.command {
            Command::Resolve {
                meta,
                package,
                inactive,
                lock,
                json,
            } => {
                assert_eq!(meta, PathBuf::from("meta.toml"));
                assert_eq!(package, "org/a:v1.0.0");
                assert!(inactive);
                assert_eq!(lock, Some(PathBuf::from("other.lock")));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
