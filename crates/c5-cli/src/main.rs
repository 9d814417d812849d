//! C5 CLI - canonical JSON, content hashes and envelopes from the shell.

use clap::{Parser, Subcommand};
use std::str::FromStr;

mod commands;
mod input;

use commands::{canonicalize, envelope, events, hash, smoke};

#[derive(Parser)]
#[command(name = "c5")]
#[command(about = "Canonical JSON, content hashes and message envelopes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical JSON text of a JSON document
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
        /// Spaces per nesting level (0 prints compact JSON)
        #[arg(long, default_value_t = 0)]
        indent: usize,
    },
    /// Print the Base58 content hash of a JSON document
    Hash {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
    /// Print the canonical traversal events of a JSON document
    Events {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
    /// Wrap a JSON document in an envelope and print its JSON text
    Envelope {
        /// Input JSON file holding the payload data (or stdin if not provided)
        input: Option<String>,
        /// Sender
        #[arg(long)]
        src: String,
        /// Payload kind
        #[arg(long)]
        kind: String,
        /// Destination (repeatable)
        #[arg(long)]
        dst: Vec<String>,
        /// Explicit envelope id (derived from time and hash if omitted)
        #[arg(long)]
        id: Option<String>,
        /// Creation time in milliseconds since the Unix epoch (default: now)
        #[arg(long)]
        t: Option<i64>,
        /// Time to live in seconds (default: 10)
        #[arg(long)]
        ttl: Option<u32>,
        /// Spaces per nesting level (0 prints compact JSON)
        #[arg(long, default_value_t = 0)]
        indent: usize,
        /// Derive the id from the content hash alone
        #[arg(long)]
        hash_id: bool,
    },
    /// Build, decode and re-encode an envelope; fail unless the texts match
    Smoke,
}

fn init_tracing() {
    let env = std::env::var("C5_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Canonicalize { input, indent } => canonicalize::run(input, indent),
        Commands::Hash { input } => hash::run(input),
        Commands::Events { input } => events::run(input),
        Commands::Envelope {
            input,
            src,
            kind,
            dst,
            id,
            t,
            ttl,
            indent,
            hash_id,
        } => envelope::run(envelope::EnvelopeArgs {
            input,
            src,
            kind,
            dst,
            id,
            t,
            ttl,
            indent,
            hash_id,
        }),
        Commands::Smoke => smoke::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
