use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::AdminClient;
use serde_json::Value;
use shared::record::Fields;

#[derive(Parser, Debug)]
#[command(name = "tabula", about = "Command-line client for a Tabula server")]
struct Args {
    #[arg(long, env = "TABULA_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered entity names.
    Entities,
    List {
        entity: String,
    },
    Get {
        entity: String,
        id: i64,
    },
    /// Create a record from `field=value` pairs.
    Create {
        entity: String,
        fields: Vec<String>,
    },
    /// Update the given fields of a record; others are left untouched.
    Update {
        entity: String,
        id: i64,
        fields: Vec<String>,
    },
    Delete {
        entity: String,
        id: i64,
    },
}

fn parse_assignments(pairs: &[String]) -> Result<Fields> {
    let mut fields = Fields::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected field=value, got '{pair}'");
        };
        if key.is_empty() {
            bail!("field name missing in '{pair}'");
        }
        fields.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(fields)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();
    let client = AdminClient::new(args.server_url)?;

    match args.command {
        Command::Entities => print_json(&client.entities().await?)?,
        Command::List { entity } => print_json(&client.list(&entity).await?)?,
        Command::Get { entity, id } => print_json(&client.get(&entity, id).await?)?,
        Command::Create { entity, fields } => {
            let fields = parse_assignments(&fields)?;
            print_json(&client.create(&entity, &fields).await?)?;
        }
        Command::Update { entity, id, fields } => {
            let fields = parse_assignments(&fields)?;
            print_json(&client.update(&entity, id, &fields).await?)?;
        }
        Command::Delete { entity, id } => println!("{}", client.delete(&entity, id).await?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_become_string_fields() {
        let fields = parse_assignments(&["name=Bob".into(), "note=a=b".into(), "empty=".into()])
            .expect("fields");
        assert_eq!(fields["name"], Value::String("Bob".into()));
        assert_eq!(fields["note"], Value::String("a=b".into()));
        assert_eq!(fields["empty"], Value::String(String::new()));
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        assert!(parse_assignments(&["name".into()]).is_err());
        assert!(parse_assignments(&["=value".into()]).is_err());
    }

    #[test]
    fn cli_parses_update_command() {
        let args = Args::try_parse_from(["tabula", "update", "users", "3", "name=Ann"])
            .expect("args");
        assert_eq!(args.server_url, "http://127.0.0.1:8080");
        match args.command {
            Command::Update { entity, id, fields } => {
                assert_eq!(entity, "users");
                assert_eq!(id, 3);
                assert_eq!(fields, vec!["name=Ann".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
