//! `eventided`: the policy API and auth token servers, plus content pack
//! tooling.
//!
//! Usage:
//!   eventided [-c <context-name-or-path>] api [--listen <addr>]
//!   eventided [-c <context-name-or-path>] auth [--listen <addr>]
//!   eventided [-c <context-name-or-path>] register [--packs <dir>] [--fail-on-failure]
//!   eventided [-c <context-name-or-path>] diff [--packs <dir>]
//!
//! The context name resolves to `/etc/eventide/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly. Without `-c`
//! every setting takes its default.

mod commands;
mod config;
mod db;
mod logging;
mod routes;
mod server;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use config::Config;

/// Eventide server.
#[derive(Parser, Debug)]
#[command(name = "eventided", about = "Eventide policy and auth server", version)]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the policy REST API.
    Api {
        /// Listen address (overrides api.host and api.port).
        #[arg(long = "listen")]
        listen: Option<String>,
    },
    /// Serve the token endpoint.
    Auth {
        /// Listen address (overrides auth.host and auth.port).
        #[arg(long = "listen")]
        listen: Option<String>,
    },
    /// Register policy types and policies from content packs.
    Register {
        /// Packs base directory (overrides content.packs_base_path).
        #[arg(long = "packs")]
        packs: Option<PathBuf>,
        /// Stop at the first file that fails to register.
        #[arg(long = "fail-on-failure")]
        fail_on_failure: bool,
    },
    /// Compare content packs on disk with the database.
    Diff {
        /// Packs base directory (overrides content.packs_base_path).
        #[arg(long = "packs")]
        packs: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let log_handle = logging::init();
    let cli = Cli::parse();

    match run(cli, &log_handle).await {
        Ok(code) => code,
        Err(e) => {
            error!("(PID={}) eventided quit due to exception: {:#}", std::process::id(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, log_handle: &logging::LogHandle) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(name) => {
            let path = Config::resolve_path(name);
            info!("Loading configuration from {}", path.display());
            Config::load(&path)?
        }
        None => Config::default(),
    };
    logging::apply_level(log_handle, &config.log.level)?;

    match cli.command {
        Command::Api { listen } => commands::api::run(&config, listen.as_deref()).await?,
        Command::Auth { listen } => commands::auth::run(&config, listen.as_deref()).await?,
        Command::Register { packs, fail_on_failure } => {
            commands::register::run(&config, packs.as_deref(), fail_on_failure)?
        }
        Command::Diff { packs } => {
            if !commands::diff::run(&config, packs.as_deref())? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
