//! # Context Relay CLI (`relayctx`)
//!
//! Inspect and exercise the relay's retrieval pipeline from a shell.
//!
//! ## Usage
//!
//! ```bash
//! relayctx --config ./config/relay.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `relayctx sources` | Show configured corpus sources and their health |
//! | `relayctx index` | Ingest the corpus and print the index report |
//! | `relayctx search "<query>"` | Ingest, then print the ranked chunks |
//! | `relayctx prompt "<message>"` | Ingest, then print the grounded prompt |
//!
//! ## Examples
//!
//! ```bash
//! DOCS_ZIP_PATH=./docs.zip relayctx index
//! relayctx search "refund policy" --limit 3
//! relayctx prompt "how do refunds work" --turn user=hi --turn assistant=hello
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use context_relay::{config, ingest, logging, prompt, search, sources};
use context_relay_core::models::Role;
use std::path::PathBuf;

/// Context Relay CLI: lexical retrieval and conversation memory for a chat
/// assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Environment variables such as `DOCS_ZIP_PATH` and `CHUNK_SIZE`
/// override it.
#[derive(Parser)]
#[command(
    name = "relayctx",
    about = "Context Relay: grounded prompts from a Markdown knowledge base",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/relay.toml`. A missing file means defaults
    /// plus environment overrides.
    #[arg(long, global = true, default_value = "./config/relay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configured corpus sources and whether they are readable.
    Sources,

    /// Ingest the corpus and report documents, chunks and keywords.
    Index {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search the corpus.
    Search {
        /// The search query.
        query: String,

        /// Maximum number of chunks (defaults to `retrieval.max_context_chunks`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print hits as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compose the grounded prompt for a chat message.
    Prompt {
        /// The incoming user message.
        message: String,

        /// Conversation thread identifier.
        #[arg(long, default_value = "cli")]
        thread: String,

        /// Prior turn as `role=content`; repeatable, applied in order.
        #[arg(long = "turn", value_parser = parse_turn)]
        turns: Vec<(Role, String)>,

        /// Print the prepared prompt as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Parse a `key=value` pair.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Parse a `--turn role=content` argument.
fn parse_turn(s: &str) -> Result<(Role, String), String> {
    let (role, content) = parse_key_val(s)?;
    let role = role.parse::<Role>().map_err(|e| e.to_string())?;
    Ok((role, content))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init_logging(&cfg.logging)?;

    match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Index { json } => {
            ingest::run_index(&cfg, json)?;
        }
        Commands::Search { query, limit, json } => {
            search::run_search(&cfg, &query, limit, json)?;
        }
        Commands::Prompt {
            message,
            thread,
            turns,
            json,
        } => {
            prompt::run_prompt(&cfg, &message, &thread, &turns, json)?;
        }
    }

    Ok(())
}
