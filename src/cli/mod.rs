pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "cms")]
#[command(about = "CMS operator CLI - tokens, password hashes and query previews")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Mint a development admin JWT from the configured secret")]
    Token(commands::token::TokenArgs),

    #[command(name = "hash-password", about = "Print an argon2 PHC hash for a password")]
    HashPassword(commands::password::HashPasswordArgs),

    #[command(about = "Show the SQL a list query string would produce")]
    Query(commands::query::QueryArgs),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token(args) => commands::token::handle(args, output_format),
        Commands::HashPassword(args) => commands::password::handle(args, output_format),
        Commands::Query(args) => commands::query::handle(args, output_format),
    }
}
