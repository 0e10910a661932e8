use clap::Subcommand;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cli::config::load_environment_config;
use crate::cli::utils::{output_success, output_value, read_json_stdin};
use crate::cli::OutputFormat;

/// Collections exposed as plain CRUD under /api/<name>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Sites,
    Fields,
    Services,
    Vehicles,
    Staff,
    Users,
    Clients,
    Pets,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Sites => "/api/sites",
            Resource::Fields => "/api/fields",
            Resource::Services => "/api/services",
            Resource::Vehicles => "/api/vehicles",
            Resource::Staff => "/api/staff",
            Resource::Users => "/api/users",
            Resource::Clients => "/api/clients",
            Resource::Pets => "/api/pets",
        }
    }
}

#[derive(Subcommand)]
pub enum ResourceCommands {
    #[command(about = "List records")]
    List {
        #[arg(long, help = "Query filter as key=value (e.g. site_id=..., client_id=...)")]
        filter: Vec<String>,
    },

    #[command(about = "Show one record")]
    Get {
        #[arg(help = "Record id")]
        id: Uuid,
    },

    #[command(about = "Create a record from a JSON body on stdin")]
    Create,

    #[command(about = "Update a record from a JSON body on stdin")]
    Update {
        #[arg(help = "Record id")]
        id: Uuid,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(help = "Record id")]
        id: Uuid,
    },
}

/// `key=value` pairs to a query string
fn query_string(filters: &[String]) -> anyhow::Result<String> {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for filter in filters {
        let (key, value) = filter
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Filter '{}' must look like key=value", filter))?;
        serializer.append_pair(key, value);
    }
    Ok(serializer.finish())
}

pub async fn handle(resource: Resource, cmd: ResourceCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = load_environment_config()?.client()?;
    let base = resource.path();

    match cmd {
        ResourceCommands::List { filter } => {
            let query = query_string(&filter)?;
            let path = if query.is_empty() {
                base.to_string()
            } else {
                format!("{}?{}", base, query)
            };
            let rows: Value = client.get_json(&path).await?;
            output_value(&output_format, &rows)
        }
        ResourceCommands::Get { id } => {
            let row: Value = client.get_json(&format!("{}/{}", base, id)).await?;
            output_value(&output_format, &row)
        }
        ResourceCommands::Create => {
            let body = read_json_stdin()?;
            let row: Value = client.post_json(base, &body).await?;
            output_value(&output_format, &row)
        }
        ResourceCommands::Update { id } => {
            let body = read_json_stdin()?;
            let row: Value = client.patch_json(&format!("{}/{}", base, id), &body).await?;
            output_value(&output_format, &row)
        }
        ResourceCommands::Delete { id } => {
            client.delete(&format!("{}/{}", base, id)).await?;
            output_success(&output_format, &format!("Deleted {}", id), Some(json!({ "id": id })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_become_encoded_query() {
        let query = query_string(&["site_id=abc".to_string(), "name=North Park".to_string()]).unwrap();
        assert_eq!(query, "site_id=abc&name=North+Park");
        assert!(query_string(&["oops".to_string()]).is_err());
        assert_eq!(query_string(&[]).unwrap(), "");
    }
}
