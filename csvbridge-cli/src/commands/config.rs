//! Config command - view or change connection settings

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use serde_json::json;

use csvbridge_core::config::timeout_from_secs;

use super::get_context;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective connection settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the ledger base URL
    SetUrl { url: String },
    /// Set the personal access token
    SetToken { token: String },
    /// Turn TLS certificate verification on or off
    SetVerify {
        #[arg(action = clap::ArgAction::Set)]
        verify: bool,
    },
    /// Set the request timeout in seconds
    SetTimeout { seconds: f64 },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let mut ctx = get_context()?;

    match command {
        ConfigCommands::Show { json } => {
            let conn = &ctx.config.connection;
            let valid = conn.validate();

            if json {
                let value = json!({
                    "url": conn.base_url,
                    "accessToken": output::mask_secret(&conn.access_token),
                    "verify": conn.verify,
                    "timeout": conn.timeout.as_secs_f64(),
                    "valid": valid.is_ok(),
                    "error": valid.as_ref().err().map(|e| e.to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            let mut table = output::create_table();
            table.add_row(vec!["URL".to_string(), conn.base_url.clone()]);
            table.add_row(vec!["Access token".to_string(), output::mask_secret(&conn.access_token)]);
            table.add_row(vec!["Verify TLS".to_string(), conn.verify.to_string()]);
            table.add_row(vec!["Timeout".to_string(), format!("{} s", conn.timeout.as_secs_f64())]);
            println!("{}", table);
            println!("Settings directory: {}", ctx.config_dir.display());

            if let Err(e) = valid {
                println!("{} {}", "Incomplete:".yellow(), e);
            }
            return Ok(());
        }
        ConfigCommands::SetUrl { url } => {
            ctx.config.connection.base_url = url.trim().to_string();
        }
        ConfigCommands::SetToken { token } => {
            ctx.config.connection.access_token = token.trim().to_string();
        }
        ConfigCommands::SetVerify { verify } => {
            ctx.config.connection.verify = verify;
            if !verify {
                output::warning("TLS certificate verification disabled.");
            }
        }
        ConfigCommands::SetTimeout { seconds } => {
            ctx.config.connection.timeout = timeout_from_secs(seconds).ok_or_else(|| {
                anyhow::anyhow!("Timeout must be a positive number of seconds, got {}", seconds)
            })?;
        }
    }

    ctx.config.save(&ctx.config_dir)?;
    output::success("Settings saved.");
    Ok(())
}
