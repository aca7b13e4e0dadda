//! ChunkKV CLI
//!
//! Command-line interface for inspecting and editing a ChunkKV store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use chunkkv::{ChunkHandler, Config, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// ChunkKV CLI
#[derive(Parser, Debug)]
#[command(name = "chunkkv")]
#[command(about = "CLI for the ChunkKV file-backed key-value store")]
#[command(version)]
struct Args {
    /// Data directory (parent of the store directory)
    #[arg(short, long, default_value = "./data")]
    data_dir: String,

    /// Store name
    #[arg(short, long, default_value = "default")]
    name: String,

    /// Maximum number of keys per chunk
    #[arg(short, long, default_value = "100")]
    max_chunk_size: usize,

    /// Snowflake epoch for chunk ids (unix millis)
    #[arg(long)]
    epoch: Option<u64>,

    /// Run a synchronize pass when the store is opened
    #[arg(long)]
    synchronize_on_init: bool,

    /// File that must exist before the store is opened
    #[arg(long)]
    required_marker: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the store directory and index
    Init,

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set (parsed as JSON, falls back to a plain string)
        value: String,
    },

    /// Delete a key
    #[command(alias = "del")]
    Delete {
        /// The key to delete
        key: String,
    },

    /// List all keys
    Keys,

    /// Print the number of keys
    Size,

    /// Print every key-value pair
    Entries,

    /// Remove every key and chunk
    Clear,

    /// Repair the index against the chunk files
    Sync,

    /// Issue the next auto-key
    AutoKey,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chunkkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .name(&args.name)
        .max_chunk_size(args.max_chunk_size)
        .synchronize_on_init(args.synchronize_on_init);
    if let Some(epoch) = args.epoch {
        builder = builder.epoch(epoch);
    }
    if let Some(marker) = args.required_marker {
        builder = builder.required_marker(marker);
    }
    let config = builder.build();

    let handler = match ChunkHandler::open(config) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&handler, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(handler: &ChunkHandler, command: Commands) -> chunkkv::Result<()> {
    match command {
        Commands::Init => {
            println!("{}", handler.directory().display());
        }
        Commands::Get { key } => match handler.get(&key)? {
            Some(value) => println!("{}", value),
            None => {
                println!("(nil)");
            }
        },
        Commands::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            handler.set(&key, value)?;
            println!("OK");
        }
        Commands::Delete { key } => {
            let removed = handler.delete(&key)?;
            println!("{}", if removed { "1" } else { "0" });
        }
        Commands::Keys => {
            for key in handler.keys()? {
                println!("{}", key);
            }
        }
        Commands::Size => {
            println!("{}", handler.size()?);
        }
        Commands::Entries => {
            for (key, value) in handler.entries()? {
                println!("{}\t{}", key, value);
            }
        }
        Commands::Clear => {
            handler.clear()?;
            println!("OK");
        }
        Commands::Sync => {
            let report = handler.synchronize()?;
            println!("{:#?}", report);
        }
        Commands::AutoKey => {
            println!("{}", handler.auto_key()?);
        }
    }

    Ok(())
}
