//! gamecode: custom game code tooling.
//!
//! Converts game codes to and from their wire form, computes client
//! fingerprints, prints the resolved plugin config, and walks the
//! reserve-then-join flow against an in-memory worker.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

/// gamecode: custom game code tooling
#[derive(Parser)]
#[command(name = "gamecode", version, about = "Custom game code reservations: codes, fingerprints, flow simulation")]
struct Cli {
    /// Plugin config file path
    #[arg(long, global = true, default_value = "~/.gamecode/config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a 4- or 6-letter game code to its integer form
    Encode {
        /// Game code, e.g. ABCDEF
        code: String,
    },

    /// Convert an integer game code back to letters
    Decode {
        /// Integer code as sent on the wire
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },

    /// Compute the reservation fingerprint of a client
    Fingerprint {
        /// Remote IP address
        #[arg(long)]
        addr: std::net::IpAddr,
        /// Declared username
        #[arg(long)]
        username: String,
        /// Client version string
        #[arg(long)]
        client_version: String,
        /// Platform tag
        #[arg(long)]
        platform: String,
        /// Language id
        #[arg(long, default_value_t = 0)]
        language: u32,
        /// Installed mod as ID=VERSION (repeatable, order matters)
        #[arg(long = "mod", value_name = "ID=VERSION")]
        mods: Vec<String>,
    },

    /// Print the resolved plugin config as TOML
    Config,

    /// Reserve settings, then join with a code, against an in-memory worker
    Simulate {
        /// Code to join with (use CANCEL to abandon the reservation)
        #[arg(long)]
        code: String,
        /// Room settings as JSON
        #[arg(long, default_value = "{}")]
        settings: String,
        /// Codes of rooms that already exist
        #[arg(long = "taken", value_name = "CODE")]
        taken: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing (logs go to stderr; stdout carries command output).
    use tracing_subscriber::EnvFilter;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Encode { code } => commands::code::run_encode(&code),
        Command::Decode { value } => commands::code::run_decode(value),
        Command::Fingerprint {
            addr,
            username,
            client_version,
            platform,
            language,
            mods,
        } => commands::fingerprint::run(addr, username, client_version, platform, language, &mods),
        Command::Config => commands::config::run(&cli.config),
        Command::Simulate {
            code,
            settings,
            taken,
        } => commands::simulate::run(&cli.config, &code, &settings, &taken).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        eprintln!("gamecode: {e:#}");
        std::process::exit(1);
    }
}
