use clap::Args;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Args, Debug)]
pub struct HashPasswordArgs {
    #[arg(help = "Plain-text password to hash")]
    pub password: String,
}

pub fn handle(args: HashPasswordArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    if args.password.trim().is_empty() {
        anyhow::bail!("password must not be empty");
    }
    let hash = hash_password(&args.password)?;
    match output_format {
        OutputFormat::Text => {
            println!("{}", hash);
            Ok(())
        }
        OutputFormat::Json => output_success(&output_format, "Password hashed", Some(json!({ "hash": hash }))),
    }
}
