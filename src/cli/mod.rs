pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::console::Console;

#[derive(Parser)]
#[command(name = "console")]
#[command(about = "Admin console - session, navigation and CRUD access to the admin backend API")]
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
    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Current user profile and password")]
    Me {
        #[command(subcommand)]
        cmd: commands::me::MeCommands,
    },

    #[command(about = "Menu and route navigation")]
    Nav {
        #[command(subcommand)]
        cmd: commands::nav::NavCommands,
    },

    #[command(about = "CRUD operations on backend resources")]
    Resource {
        #[arg(help = "Resource kind (items, groups, applications, tasks, task-executions, users, roles, permissions, menus, apis, policies)")]
        kind: String,
        #[command(subcommand)]
        cmd: commands::resource::ResourceCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
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
    let console = Console::new(config::config().clone())?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(&console, cmd, output_format).await,
        Commands::Me { cmd } => commands::me::handle(&console, cmd, output_format).await,
        Commands::Nav { cmd } => commands::nav::handle(&console, cmd, output_format).await,
        Commands::Resource { kind, cmd } => {
            let kind: crate::api::ResourceKind = kind.parse()?;
            commands::resource::handle(&console, kind, cmd, output_format).await
        }
    }
}
