use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use uuid::Uuid;

use crate::cli::config::load_environment_config;
use crate::cli::utils::output_value;
use crate::cli::OutputFormat;
use crate::database::models::{BookingFilter, BookingStatus, CreateBooking, UpdateBooking};

#[derive(Subcommand)]
pub enum BookingCommands {
    #[command(about = "List bookings (staff and admin)")]
    List {
        #[arg(long, help = "Only bookings on this date (YYYY-MM-DD)")]
        date: Option<NaiveDate>,
        #[arg(long, help = "Only bookings with this status")]
        status: Option<BookingStatus>,
    },

    #[command(about = "List bookings linked to the signed-in client")]
    Mine,

    #[command(about = "Show one booking")]
    Get {
        #[arg(help = "Booking id")]
        id: Uuid,
    },

    #[command(about = "Book a slot")]
    Create {
        #[arg(long, help = "Service id")]
        service: Uuid,
        #[arg(long, help = "Date (YYYY-MM-DD)")]
        date: NaiveDate,
        #[arg(long, help = "Slot start time (HH:MM:SS)")]
        start: NaiveTime,
        #[arg(long = "pet", required = true, help = "Pet id; repeat for several pets")]
        pets: Vec<Uuid>,
        #[arg(long = "client", help = "Client id (staff and admin only)")]
        clients: Vec<Uuid>,
        #[arg(long)]
        notes: Option<String>,
    },

    #[command(about = "Cancel a booking")]
    Cancel {
        #[arg(help = "Booking id")]
        id: Uuid,
    },
}

pub async fn handle(cmd: BookingCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_environment_config()?.client()?;

    match cmd {
        BookingCommands::List { date, status } => {
            let bookings = client.bookings(&BookingFilter { date, status }).await?;
            output_value(&output_format, &bookings)
        }
        BookingCommands::Mine => output_value(&output_format, &client.my_bookings().await?),
        BookingCommands::Get { id } => output_value(&output_format, &client.booking(id).await?),
        BookingCommands::Create {
            service,
            date,
            start,
            pets,
            clients,
            notes,
        } => {
            let booking = client
                .create_booking(&CreateBooking {
                    service_id: service,
                    booking_date: date,
                    start_time: start,
                    pet_ids: pets,
                    client_ids: clients,
                    notes,
                })
                .await?;
            output_value(&output_format, &booking)
        }
        BookingCommands::Cancel { id } => {
            let cancel = UpdateBooking {
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            };
            output_value(&output_format, &client.update_booking(id, &cancel).await?)
        }
    }
}
