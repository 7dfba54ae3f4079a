//! YesSQL CLI Client
//!
//! Sends a single command to a YesSQL server and prints the reply.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use yessql_client::{Client, ClientConfig, Command, Response, Status};

/// YesSQL CLI
#[derive(Parser, Debug)]
#[command(name = "yessql-cli")]
#[command(about = "CLI for the YesSQL key-value store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Read timeout in milliseconds (0 = wait forever)
    #[arg(long, default_value = "20000")]
    read_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Remove a key
    Remove {
        /// The key to remove
        key: String,
    },

    /// Create a cursor positioned at a key
    CreateCursor {
        /// Cursor name (at most 255 bytes)
        name: String,

        /// Starting key
        key: String,
    },

    /// Delete a cursor
    DeleteCursor {
        /// Cursor name
        name: String,
    },

    /// Step a cursor forward
    GetFf {
        /// Cursor name
        name: String,

        /// Number of entries to fetch
        count: u16,
    },

    /// Step a cursor backward
    GetFb {
        /// Cursor name
        name: String,

        /// Number of entries to fetch
        count: u16,
    },

    /// List keys from a cursor
    GetKeys {
        /// Cursor name
        name: String,

        /// Number of keys to fetch
        count: u16,
    },

    /// List keys starting with a prefix
    GetKeysPrefix {
        /// Cursor name
        name: String,

        /// Number of keys to fetch
        count: u16,

        /// Key prefix
        prefix: String,
    },
}

impl Commands {
    fn into_command(self) -> Command {
        match self {
            Commands::Get { key } => Command::Get { key: key.into_bytes() },
            Commands::Set { key, value } => Command::Set {
                key: key.into_bytes(),
                value: value.into_bytes(),
            },
            Commands::Remove { key } => Command::Remove { key: key.into_bytes() },
            Commands::CreateCursor { name, key } => Command::CreateCursor {
                cursor: name.into_bytes(),
                key: key.into_bytes(),
            },
            Commands::DeleteCursor { name } => Command::DeleteCursor {
                cursor: name.into_bytes(),
            },
            Commands::GetFf { name, count } => Command::GetFf {
                cursor: name.into_bytes(),
                count,
            },
            Commands::GetFb { name, count } => Command::GetFb {
                cursor: name.into_bytes(),
                count,
            },
            Commands::GetKeys { name, count } => Command::GetKeys {
                cursor: name.into_bytes(),
                count,
            },
            Commands::GetKeysPrefix {
                name,
                count,
                prefix,
            } => Command::GetKeysPrefix {
                cursor: name.into_bytes(),
                count,
                prefix: prefix.into_bytes(),
            },
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,yessql_client=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .server_addr(&args.server)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let mut client = match Client::connect(&config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let command = args.command.into_command();
    match client.execute(&command) {
        Ok(response) => {
            print_response(&response);
            if matches!(response.status, Status::Error(_) | Status::Invalid) {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!("Request failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_response(response: &Response) {
    match response.status {
        Status::Error(code) => println!("ERR {}", code),
        _ => println!("{}", response.status.name()),
    }

    for entry in &response.entries {
        let key = String::from_utf8_lossy(&entry.key);
        match &entry.value {
            Some(value) => println!("  {} = {}", key, String::from_utf8_lossy(value)),
            None => println!("  {}", key),
        }
    }

    if response.truncated {
        println!("(response truncated)");
    }
}
