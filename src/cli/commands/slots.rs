use chrono::NaiveDate;
use uuid::Uuid;

use crate::cli::config::load_environment_config;
use crate::cli::utils::output_value;
use crate::cli::OutputFormat;

pub async fn handle(service_id: Uuid, date: NaiveDate, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_environment_config()?.client()?;
    let slots = client.slots(service_id, date).await?;

    match output_format {
        OutputFormat::Json => output_value(&output_format, &slots),
        OutputFormat::Text if slots.is_empty() => {
            println!("No slots on {}", date);
            Ok(())
        }
        OutputFormat::Text => {
            for slot in slots {
                println!(
                    "{}-{}  {}/{} free{}",
                    slot.start_time.format("%H:%M"),
                    slot.end_time.format("%H:%M"),
                    slot.remaining,
                    slot.capacity,
                    if slot.available { "" } else { "  (full)" }
                );
            }
            Ok(())
        }
    }
}
