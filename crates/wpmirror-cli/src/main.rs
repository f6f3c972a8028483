//! wpmirror CLI - Mirror a WordPress post feed into object storage
//!
//! Each invocation runs at most one sync cycle; scheduling is left to cron or
//! whatever timer hosts the binary.

mod cli;
mod commands;
mod error;


use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::check::run_check;
use crate::commands::posts::run_posts;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    // Env files have to be loaded before clap resolves `env = ...` defaults.
    load_env_file(env_file_arg(std::env::args_os()))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wpmirror=info".parse().expect("valid directive"))
                .add_directive("wpmirror_core=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { json, strict } => run_sync(json, strict).await?,
        Commands::Posts {
            url,
            timeout_secs,
            limit,
            json,
        } => run_posts(&url, timeout_secs, limit, json).await?,
        Commands::Check => run_check().await?,
    }

    Ok(())
}

fn load_env_file(path: Option<PathBuf>) -> Result<(), CliError> {
    match path {
        Some(path) => {
            dotenvy::from_path(&path).map_err(|error| {
                CliError::Config(format!("Failed to load {}: {error}", path.display()))
            })?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

/// Finds `--env-file PATH` or `--env-file=PATH` in raw process arguments.
fn env_file_arg<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        let Some(arg) = arg.to_str() else {
            continue;
        };
        if arg == "--" {
            break;
        }
        if arg == "--env-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--env-file=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}
