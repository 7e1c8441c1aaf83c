//! Interactive REPL.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use serde_json::Value;
use std::net::SocketAddr;
use walkv_client::Client;

const HELP_TEXT: &str = r#"
Available commands:
  help                 Show this help
  get <key>            Get the value of a key
  put <key> <value>    Set a key (value is JSON, or a bare string)
  delete <key>         Delete a key
  keys                 List all keys
  checkpoint           Take a checkpoint on the server
  quit, exit           Exit the REPL
"#;

pub async fn run(client: Client, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "walkv CLI".bold().cyan());
    println!("Connected to {}.", addr);
    println!("Type 'help' for available commands.\n");

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    loop {
        let prompt = format!("{} ", "walkv>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute(&client, line).await {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = client.quit().await;
    println!("{}", "Disconnected.".dimmed());

    Ok(())
}

async fn execute(client: &Client, line: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let cmd = parts[0].to_lowercase();
    let args = &parts[1..];

    match cmd.as_str() {
        "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

        "quit" | "exit" | "q" => Ok(None),

        "get" | "g" => {
            if args.is_empty() {
                return Ok(Some("Usage: get <key>".to_string()));
            }
            match client.get(args[0]).await? {
                Some(value) => Ok(Some(format_json(&value))),
                None => Ok(Some(format!("{} {}", "(not found)".yellow(), args[0]))),
            }
        }

        "put" | "p" => {
            if args.len() < 2 {
                return Ok(Some("Usage: put <key> <value>".to_string()));
            }
            let raw = args[1..].join(" ");
            let value: Value =
                serde_json::from_str(&raw).unwrap_or_else(|_| Value::String(raw.clone()));
            client.put(args[0], value).await?;
            Ok(Some("OK".green().to_string()))
        }

        "delete" | "del" | "d" => {
            if args.is_empty() {
                return Ok(Some("Usage: delete <key>".to_string()));
            }
            if client.delete(args[0]).await? {
                Ok(Some(format!("{} {}", "Deleted".green(), args[0].cyan())))
            } else {
                Ok(Some(format!("{} {}", "(not found)".yellow(), args[0])))
            }
        }

        "keys" | "k" => {
            let keys = client.keys().await?;
            if keys.is_empty() {
                Ok(Some("(empty)".yellow().to_string()))
            } else {
                Ok(Some(keys.join("\n")))
            }
        }

        "checkpoint" | "cp" => {
            client.checkpoint().await?;
            Ok(Some("Checkpoint complete".green().to_string()))
        }

        _ => Ok(Some(format!(
            "Unknown command: {}. Type 'help' for help.",
            cmd
        ))),
    }
}

fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
