//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for parley
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about = "Terminal client for a chat assistant")]
#[command(long_about = r#"
Parley is a terminal client for a session-based chat assistant.

Conversations are listed from the server's history API, replies arrive over
a persistent WebSocket and are revealed a few characters at a time. A new
conversation starts as a draft and receives its identity from the first
reply.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./parley.toml       Project-level config
3. ~/.config/parley/config.toml   Global config

Environment variables prefixed with PARLEY_ override the defaults, e.g.
PARLEY_SERVER__WS_URL=wss://chat.example.com/ws/chat/.
The password may be supplied with PARLEY_PASSWORD.

Example:
  parley
  parley --username alice --api-url https://chat.example.com/api
  parley -vv --conversation-log ./transcript.jsonl
"#)]
pub struct Cli {
    /// Username to log in with when the server has no session for us
    #[arg(short, long, value_name = "NAME")]
    pub username: Option<String>,

    /// REST API root (overrides server.api_base_url)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// WebSocket endpoint (overrides server.ws_url)
    #[arg(long, value_name = "URL")]
    pub ws_url: Option<String>,

    /// Append a JSONL transcript of conversation events to this file
    #[arg(long, value_name = "PATH")]
    pub conversation_log: Option<PathBuf>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ignore all config files, use built-in defaults
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// `tracing` filter directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
