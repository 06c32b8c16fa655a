//! voxterm: terminal front-end for real-time voice/chat engines
//!
//! Maps keyboard events to start/stop/pause intents for one of four
//! interaction modes and forwards them to an engine:
//! - Push-to-talk: hold SPACE to record
//! - Always-on: continuous listening, P to pause
//! - Text: typed messages
//! - Turn-based: SPACE to take and yield the turn
//!
//! Audio, transport and inference belong to the engine; this binary ships
//! an offline loopback engine so every mode can be exercised locally.

mod cli;
mod config;
mod engine;
mod events;
mod keyboard;
mod lifecycle;
mod modes;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::VoxTermCli;
use crate::config::{Config, Settings};
use crate::engine::{Engine, EngineConfig, LoopbackEngine};
use crate::events::EngineEvent;
use crate::modes::{create_mode, ModeKind};

/// Capacity of the engine -> CLI event channel
const ENGINE_EVENT_CAPACITY: usize = 256;

/// voxterm - exercise a real-time voice/chat engine from the terminal
#[derive(Parser)]
#[command(name = "voxterm", version, about)]
struct Args {
    #[command(flatten)]
    settings: Settings,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the interaction modes
    Modes {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// One row of the `modes` listing
#[derive(Serialize)]
struct ModeInfo {
    number: usize,
    name: ModeKind,
    aliases: &'static [&'static str],
    description: &'static str,
    engine: EngineConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env first so env-backed arguments can see it
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(args.verbose);

    info!(version = env!("CARGO_PKG_VERSION"), "voxterm starting");
    match dotenv {
        Ok(path) => debug!(?path, "loaded .env"),
        Err(e) => debug!(%e, "no .env loaded"),
    }

    if let Some(Command::Modes { json }) = args.command {
        return print_modes(json);
    }

    let config = Config::load(&args.settings)?;
    let kind = match config.mode {
        Some(kind) => kind,
        None => select_mode()?,
    };
    info!(mode = %kind, "mode selected");

    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(ENGINE_EVENT_CAPACITY);
    let engine_config = config.engine_config(kind);
    debug!(?engine_config, "engine configuration");

    let engine: Arc<dyn Engine> = Arc::new(LoopbackEngine::new(engine_config, event_tx));
    let mode = create_mode(kind.name(), Arc::clone(&engine), config.mode_settings())
        .with_context(|| format!("no mode named {}", kind.name()))?;

    VoxTermCli::new(engine, event_rx, mode, config.repeat_window)
        .run()
        .await
}

/// Log to stderr so records do not interleave with the conversation
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Ask for a mode when none was given; non-interactive runs get the default
fn select_mode() -> Result<ModeKind> {
    if !std::io::stdin().is_terminal() {
        return Ok(ModeKind::default());
    }

    let items: Vec<String> = ModeKind::ALL
        .iter()
        .map(|kind| format!("{} - {}", kind, kind.description()))
        .collect();
    let default = ModeKind::ALL
        .iter()
        .position(|kind| *kind == ModeKind::default())
        .unwrap_or(0);

    let index = dialoguer::Select::new()
        .with_prompt("Select mode")
        .items(&items)
        .default(default)
        .interact()?;

    Ok(ModeKind::ALL[index])
}

fn print_modes(json: bool) -> Result<()> {
    let modes: Vec<ModeInfo> = ModeKind::ALL
        .into_iter()
        .map(|kind| ModeInfo {
            number: kind.number(),
            name: kind,
            aliases: kind.aliases(),
            description: kind.description(),
            engine: EngineConfig::for_mode(kind, None, EngineConfig::DEFAULT_VOICE),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&modes)?);
        return Ok(());
    }

    for info in &modes {
        println!(
            "{}. {} ({}) - {}",
            info.number,
            info.name,
            info.aliases.join(", "),
            info.description
        );
    }
    Ok(())
}
