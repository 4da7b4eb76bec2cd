use clap::Subcommand;

use crate::cli::utils::{output_success, output_value, parse_json_arg, resolve_secret};
use crate::cli::OutputFormat;
use crate::console::Console;

#[derive(Subcommand)]
pub enum MeCommands {
    #[command(about = "Update fields of the current user from a JSON object")]
    Update {
        #[arg(help = "JSON body, e.g. '{\"full_name\": \"Ada\"}'")]
        json: String,
    },

    #[command(about = "Change the current user's password")]
    Password {
        #[arg(long, help = "Current password (will prompt if not provided)")]
        current: Option<String>,
        #[arg(long = "new", help = "New password (will prompt if not provided)")]
        new_password: Option<String>,
    },
}

pub async fn handle(console: &Console, cmd: MeCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        MeCommands::Update { json } => {
            let profile = console.users().update_me(parse_json_arg(&json)?).await?;
            output_value(output_format, &serde_json::to_value(&profile)?)
        }
        MeCommands::Password { current, new_password } => {
            let current = resolve_secret(current, "Current password")?;
            let new_password = resolve_secret(new_password, "New password")?;
            console.users().update_password(&current, &new_password).await?;
            output_success(output_format, "Password updated", None)
        }
    }
}
