use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_environment_config, ping_server, save_environment_config, ServerStatus};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Select the API server")]
    Set {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the selected server")]
    Show,

    #[command(about = "Health check the selected server")]
    Ping,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut env = load_environment_config()?;

    match cmd {
        ServerCommands::Set { url } => {
            url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
            env.server_url = url.trim_end_matches('/').to_string();
            env.status = ServerStatus::Unknown;
            env.last_ping = None;
            save_environment_config(&env)?;
            output_success(
                &output_format,
                &format!("Using server {}", env.server_url),
                Some(json!({ "server_url": env.server_url })),
            )
        }
        ServerCommands::Show => output_value(&output_format, &env),
        ServerCommands::Ping => {
            let status = ping_server(&env).await;
            env.update_ping(status.clone());
            save_environment_config(&env)?;
            match status {
                ServerStatus::Up => output_success(&output_format, &format!("{} is up", env.server_url), None),
                _ => anyhow::bail!("{} is not responding", env.server_url),
            }
        }
    }
}
