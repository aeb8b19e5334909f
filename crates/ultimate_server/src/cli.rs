//! Command-line interface for the session server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ultimate tic-tac-toe session server
#[derive(Parser, Debug)]
#[command(name = "ultimate_server")]
#[command(about = "Real-time ultimate tic-tac-toe sessions over WebSocket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Secret used to sign identity tokens
    #[arg(long, global = true, env = "ULTIMATE_SIGNING_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Number of game slots (overrides the config file)
        #[arg(long)]
        pool_size: Option<usize>,
    },

    /// Mint an identity token for a player id
    Token {
        /// Player id to embed in the token
        player_id: String,

        /// Path to a TOML config file (for the token lifetime)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
