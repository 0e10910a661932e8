pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use commands::resource::{Resource, ResourceCommands};

#[derive(Parser)]
#[command(name = "daycare")]
#[command(about = "Daycare CLI - command-line client for the daycare booking API")]
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
    #[command(about = "API server selection and health")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Access token, identity and password")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Daycare sites")]
    Sites {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Fields within sites")]
    Fields {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Bookable services")]
    Services {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Pickup vehicles")]
    Vehicles {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Staff members")]
    Staff {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "User profiles (admin)")]
    Users {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Clients")]
    Clients {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Pets")]
    Pets {
        #[command(subcommand)]
        cmd: ResourceCommands,
    },

    #[command(about = "Bookings")]
    Bookings {
        #[command(subcommand)]
        cmd: commands::bookings::BookingCommands,
    },

    #[command(about = "Available slots of a service on a date")]
    Slots {
        #[arg(help = "Service id")]
        service_id: uuid::Uuid,
        #[arg(help = "Date (YYYY-MM-DD)")]
        date: chrono::NaiveDate,
    },
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
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Sites { cmd } => commands::resource::handle(Resource::Sites, cmd, output_format).await,
        Commands::Fields { cmd } => commands::resource::handle(Resource::Fields, cmd, output_format).await,
        Commands::Services { cmd } => commands::resource::handle(Resource::Services, cmd, output_format).await,
        Commands::Vehicles { cmd } => commands::resource::handle(Resource::Vehicles, cmd, output_format).await,
        Commands::Staff { cmd } => commands::resource::handle(Resource::Staff, cmd, output_format).await,
        Commands::Users { cmd } => commands::resource::handle(Resource::Users, cmd, output_format).await,
        Commands::Clients { cmd } => commands::resource::handle(Resource::Clients, cmd, output_format).await,
        Commands::Pets { cmd } => commands::resource::handle(Resource::Pets, cmd, output_format).await,
        Commands::Bookings { cmd } => commands::bookings::handle(cmd, output_format).await,
        Commands::Slots { service_id, date } => commands::slots::handle(service_id, date, output_format).await,
    }
}
