use clap::Subcommand;

use crate::cli::config::{load_environment_config, save_environment_config};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Store the access token used for API calls")]
    Token {
        #[arg(help = "Access token issued by the identity provider")]
        token: String,
    },

    #[command(about = "Show the authenticated user and role")]
    Whoami,

    #[command(about = "Change the password of the authenticated user")]
    Password {
        #[arg(help = "New password (at least 8 characters)")]
        password: String,
    },

    #[command(about = "Sign out and forget the stored token")]
    Logout,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut env = load_environment_config()?;

    match cmd {
        AuthCommands::Token { token } => {
            env.access_token = Some(token);
            save_environment_config(&env)?;
            output_success(&output_format, "Access token saved", None)
        }
        AuthCommands::Whoami => {
            let me = env.client()?.me().await?;
            output_value(&output_format, &me)
        }
        AuthCommands::Password { password } => {
            env.client()?.update_password(&password).await?;
            output_success(&output_format, "Password updated", None)
        }
        AuthCommands::Logout => {
            if env.access_token.is_some() {
                if let Err(e) = env.client()?.logout().await {
                    tracing::debug!("Server logout failed: {}", e);
                }
            }
            env.access_token = None;
            save_environment_config(&env)?;
            output_success(&output_format, "Logged out", None)
        }
    }
}
