mod chat;
mod commands;
mod config;
mod error;
mod i18n;
mod input;
mod llm;
mod stream;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::commands::config::ConfigAction;
use crate::config::ConfigStore;

const LOG_ENV: &str = "AI_CHAT_LOG";

/// Chat with an OpenAI or Azure OpenAI model from your terminal.
#[derive(Parser, Debug)]
#[command(name = "ai-chat", version, about, long_about = None)]
struct Cli {
    /// The system prompt
    #[arg(short, long)]
    system: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new chat session; keeps replying until you type `exit`.
    Chat {
        /// The system prompt
        #[arg(short, long)]
        system: Option<String>,
    },
    /// View or change settings. Without arguments opens an interactive menu.
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Update ai-chat to the latest version.
    Update {
        /// Apply sudo
        #[arg(short, long)]
        sudo: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let store = ConfigStore::locate();
    debug!(path = %store.path().display(), "using config file");

    match cli.command {
        None => {
            commands::chat::run(store, cli.system)?;
        }
        Some(Command::Chat { system }) => {
            commands::chat::run(store, system.or(cli.system))?;
        }
        Some(Command::Config { action }) => commands::config::run(&store, action)?,
        Some(Command::Update { sudo }) => {
            let config = store.read().context("failed to load configuration")?;
            commands::update::run(sudo, config.language());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            eprintln!("\n{} {err:#}", "✖".red());
            ExitCode::FAILURE
        }
    }
}
