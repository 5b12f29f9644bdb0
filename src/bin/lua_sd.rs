//! lua-sd CLI - run a Lua services discovery script from the command line
//!
//! Activates one instance, sends it commands and prints the results as JSON.
//! Diagnostics go to stderr through `tracing` (filter with `RUST_LOG`).

// Exclude from coverage - CLI binary tested via integration tests
#![cfg_attr(tarpaulin, ignore)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lua_sd::{SdCommand, SdConfig, SdReply, ServicesDiscovery};
use tracing_subscriber::EnvFilter;

/// Run Lua services discovery scripts
#[derive(Parser, Debug)]
#[command(name = "lua-sd")]
#[command(version = lua_sd::VERSION)]
#[command(about = "Run Lua services discovery scripts")]
#[command(after_help = "EXAMPLES:
  # Show what a script declares about itself
  lua-sd descriptor jamendo

  # Run two searches and print the published catalog
  lua-sd --search-path ./sd search jamendo ambient drone
")]
struct Cli {
    /// JSON configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Extra directory to look for scripts in (repeatable)
    #[arg(long = "search-path", value_name = "DIR", global = true)]
    search_paths: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the script's descriptor
    Descriptor {
        /// Script name (looked up as <NAME>.lua on the search paths)
        name: String,
    },

    /// Queue searches, wait for them and print the catalog
    Search {
        /// Script name (looked up as <NAME>.lua on the search paths)
        name: String,

        /// Queries, queued in the order given
        #[arg(required = true)]
        queries: Vec<String>,

        /// How long to wait for the worker to go idle
        #[arg(long = "timeout-ms", default_value = "30000")]
        timeout_ms: u64,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lua_sd=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl Command {
    fn name(&self) -> &str {
        match self {
            Command::Descriptor { name } | Command::Search { name, .. } => name,
        }
    }
}

fn load_config(cli: &Cli) -> Result<SdConfig> {
    let mut config = match &cli.config {
        Some(path) => SdConfig::from_file(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => SdConfig::default(),
    };

    config.sd = Some(cli.command.name().to_string());
    config.module = lua_sd::core::GENERIC_MODULE.to_string();
    let mut search_paths = cli.search_paths.clone();
    search_paths.append(&mut config.search_paths);
    config.search_paths = search_paths;

    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let sd = ServicesDiscovery::open(&config).with_context(|| {
        format!("activating services discovery '{}'", cli.command.name())
    })?;

    match cli.command {
        Command::Descriptor { .. } => {
            let SdReply::Descriptor(record) = sd.control(SdCommand::GetDescriptor)? else {
                anyhow::bail!("unexpected reply to descriptor request");
            };
            let output = serde_json::json!({
                "script": sd.script(),
                "short_description": record.short_description,
                "icon": record.icon,
                "url": record.url,
                "capabilities": record.capabilities,
                "capability_bits": record.capabilities.bits(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Search {
            queries,
            timeout_ms,
            ..
        } => {
            for query in queries {
                sd.control(SdCommand::Search(query))?;
            }
            if !sd.wait_idle(Duration::from_millis(timeout_ms)) {
                tracing::warn!(timeout_ms, "search worker still busy, printing partial catalog");
            }
            let catalog = sd.with_catalog(|c| serde_json::to_string_pretty(c))?;
            println!("{}", catalog);
        }
    }

    let dropped = sd.close();
    if dropped > 0 {
        tracing::warn!(dropped, "queries were never served");
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
