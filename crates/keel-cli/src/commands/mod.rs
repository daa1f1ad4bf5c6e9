//! Command dispatch and handler modules.

mod lock;
mod resolve;
mod trace;

use std::path::PathBuf;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve {
            meta,
            package,
            inactive,
            lock,
            json,
        } => resolve::exec(meta, package, inactive, lock, json).await,
        Command::Lock { lock } => lock::exec(lock),
        Command::Trace {
            source,
            lock,
            depth,
        } => trace::exec(&source, lock, depth),
    }
}

fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir().map_err(keel_util::errors::KeelError::Io)?)
}
