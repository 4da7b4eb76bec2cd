use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_value};
use crate::cli::OutputFormat;
use crate::console::Console;
use crate::error::ConsoleError;
use crate::menu;

#[derive(Subcommand)]
pub enum NavCommands {
    #[command(about = "Show the navigation menu for the current user")]
    Menu,

    #[command(about = "List the routes registered for the current user")]
    Routes,

    #[command(about = "Navigate to a path and show where it lands")]
    Goto {
        #[arg(help = "Path, e.g. /items")]
        path: String,
    },
}

pub async fn handle(console: &Console, cmd: NavCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        NavCommands::Menu => {
            if !console.is_authenticated() {
                return Err(ConsoleError::NotAuthenticated.into());
            }
            // Any protected path triggers the menu bootstrap
            let arrival = console.navigate("/").await?;
            if let Some(e) = &arrival.error {
                return output_error(output_format, &e.to_string(), Some(e.error_code()));
            }
            let menus = console.session().menus();
            match output_format {
                OutputFormat::Json => output_value(output_format, &serde_json::to_value(&menus)?),
                OutputFormat::Text => {
                    print!("{}", menu::render_tree(&menus));
                    Ok(())
                }
            }
        }
        NavCommands::Routes => {
            console.navigate("/").await?;
            let routes = console.router().flat_routes();
            match output_format {
                OutputFormat::Json => {
                    let rows: Vec<_> = routes
                        .iter()
                        .map(|(path, name, component)| {
                            json!({
                                "path": path,
                                "name": name,
                                "component": component.map(|c| c.path()),
                            })
                        })
                        .collect();
                    output_value(output_format, &json!(rows))
                }
                OutputFormat::Text => {
                    for (path, name, component) in routes {
                        let component = component.map(|c| c.path()).unwrap_or("-");
                        println!("{:<28} {:<20} {}", path, name, component);
                    }
                    Ok(())
                }
            }
        }
        NavCommands::Goto { path } => {
            let arrival = console.navigate(&path).await?;
            let component = arrival.route.component().map(|c| c.path());
            match output_format {
                OutputFormat::Json => output_value(
                    output_format,
                    &json!({
                        "requested": arrival.requested,
                        "path": arrival.path(),
                        "name": arrival.route.name(),
                        "component": component,
                        "redirected": arrival.redirected(),
                        "error": arrival.error.as_ref().map(|e| e.to_string()),
                    }),
                ),
                OutputFormat::Text => {
                    if arrival.redirected() {
                        println!("{} -> {}", arrival.requested, arrival.path());
                    } else {
                        println!("{}", arrival.path());
                    }
                    println!("Route: {} ({})", arrival.route.name(), component.unwrap_or("-"));
                    if let Some(e) = &arrival.error {
                        eprintln!("Error: {}", e);
                    }
                    Ok(())
                }
            }
        }
    }
}
