use clap::Subcommand;

use crate::api::ResourceKind;
use crate::cli::utils::{output_value, parse_json_arg};
use crate::cli::OutputFormat;
use crate::console::Console;

#[derive(Subcommand)]
pub enum ResourceCommands {
    #[command(about = "List all records")]
    List,

    #[command(about = "Get one record")]
    Get {
        #[arg(help = "Record ID")]
        id: String,
    },

    #[command(about = "Create a record from a JSON object")]
    Create {
        #[arg(help = "JSON body")]
        json: String,
    },

    #[command(about = "Replace a record (PUT)")]
    Update {
        #[arg(help = "Record ID")]
        id: String,
        #[arg(help = "JSON body")]
        json: String,
    },

    #[command(about = "Partially update a record (PATCH)")]
    Patch {
        #[arg(help = "Record ID")]
        id: String,
        #[arg(help = "JSON body")]
        json: String,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(help = "Record ID")]
        id: String,
    },
}

pub async fn handle(
    console: &Console,
    kind: ResourceKind,
    cmd: ResourceCommands,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let resource = console.resource(kind);

    let value = match cmd {
        ResourceCommands::List => resource.list().await?,
        ResourceCommands::Get { id } => resource.get(&id).await?,
        ResourceCommands::Create { json } => resource.create(parse_json_arg(&json)?).await?,
        ResourceCommands::Update { id, json } => resource.update(&id, parse_json_arg(&json)?).await?,
        ResourceCommands::Patch { id, json } => resource.patch(&id, parse_json_arg(&json)?).await?,
        ResourceCommands::Delete { id } => resource.delete(&id).await?,
    };

    output_value(output_format, &value)
}
