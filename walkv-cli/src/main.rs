//! walkv-cli - command-line front-end for walkv.
//!
//! With no subcommand it drops into an interactive REPL; with one it runs
//! a single command and exits.

mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;
use walkv_client::Client;

#[derive(Parser)]
#[command(name = "walkv-cli", version, about = "CLI for the walkv key-value store")]
struct Cli {
    /// Server address.
    #[arg(short, long, default_value = "127.0.0.1:7400", env = "WALKV_ADDR")]
    addr: SocketAddr,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Get the value of a key.
    Get { key: String },
    /// Set a key to a value (JSON, or a bare string).
    Put { key: String, value: String },
    /// Delete a key.
    Delete { key: String },
    /// List all keys.
    Keys,
    /// Ask the server to take a checkpoint.
    Checkpoint,
}

/// Parses a CLI value argument as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let client = Client::connect(cli.addr).await?;

    match cli.command {
        None => repl::run(client, cli.addr).await?,

        Some(Commands::Get { key }) => match client.get(&key).await? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => {
                eprintln!("{}: key not found: {}", "error".red(), key);
                std::process::exit(1);
            }
        },

        Some(Commands::Put { key, value }) => {
            client.put(&key, parse_value(&value)).await?;
            println!("{}", "OK".green());
        }

        Some(Commands::Delete { key }) => {
            if client.delete(&key).await? {
                println!("{}", "OK".green());
            } else {
                eprintln!("{}: key not found: {}", "error".red(), key);
                std::process::exit(1);
            }
        }

        Some(Commands::Keys) => {
            for key in client.keys().await? {
                println!("{}", key);
            }
        }

        Some(Commands::Checkpoint) => {
            client.checkpoint().await?;
            println!("{}", "OK".green());
        }
    }

    Ok(())
}
