use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_success, output_value, resolve_password, resolve_secret};
use crate::cli::OutputFormat;
use crate::console::Console;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout from server")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Refresh authentication token")]
    Refresh,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Full name")]
        full_name: Option<String>,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Send a password recovery email")]
    Recover {
        #[arg(help = "Email")]
        email: String,
    },

    #[command(about = "Set a new password using a recovery token")]
    ResetPassword {
        #[arg(help = "Token from the recovery email")]
        token: String,
        #[arg(long, help = "New password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Check the current access token against the server")]
    TestToken,
}

pub async fn handle(console: &Console, cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password } => {
            let password = resolve_password(password)?;
            console.login(&username, &password).await?;
            output_success(
                output_format,
                &format!("Logged in as {}", username),
                Some(json!({ "username": username })),
            )
        }
        AuthCommands::Logout => {
            console.logout();
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let authenticated = console.is_authenticated();
            let message = if authenticated { "Authenticated" } else { "Not authenticated" };
            output_success(
                output_format,
                message,
                Some(json!({
                    "authenticated": authenticated,
                    "server": console.config().api.base_url,
                })),
            )
        }
        AuthCommands::Refresh => {
            console.auth_api().refresh_token().await?;
            output_success(output_format, "Token refreshed", None)
        }
        AuthCommands::Whoami => {
            let profile = console.auth().fetch_user_info().await?;
            match output_format {
                OutputFormat::Json => output_value(output_format, &serde_json::to_value(&profile)?),
                OutputFormat::Text => {
                    println!("User: {} ({})", profile.display_name(), profile.username);
                    if let Some(email) = &profile.email {
                        println!("Email: {}", email);
                    }
                    if let Some(role) = &profile.role {
                        println!("Role: {}", role.name);
                    }
                    println!("Avatar: {}", profile.avatar_url(&console.config().api.base_url));
                    Ok(())
                }
            }
        }
        AuthCommands::Register { email, full_name, password } => {
            let password = resolve_password(password)?;
            let user = console
                .auth_api()
                .register(&email, &password, full_name.as_deref())
                .await?;
            output_success(output_format, &format!("Registered {}", email), Some(json!({ "user": user })))
        }
        AuthCommands::Recover { email } => {
            let reply = console.auth_api().password_recovery(&email).await?;
            output_value(output_format, &reply)
        }
        AuthCommands::ResetPassword { token, password } => {
            let password = resolve_secret(password, "New password")?;
            let reply = console.auth_api().reset_password(&token, &password).await?;
            output_value(output_format, &reply)
        }
        AuthCommands::TestToken => {
            let profile = console.auth_api().test_token().await?;
            output_success(
                output_format,
                &format!("Token valid for {}", profile.username),
                Some(json!({ "username": profile.username })),
            )
        }
    }
}
