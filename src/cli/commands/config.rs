use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, ConfigFile, Connection, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Show the saved configuration of a profile")]
    Show {
        #[arg(help = "Profile name")]
        profile: String,
    },
    #[command(about = "Show the configuration file path of a profile")]
    Path {
        #[arg(help = "Profile name")]
        profile: String,
    },
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    match cmd {
        ConfigCommand::Show { profile } => handle_show(&ConfigFile::for_profile(&profile), format),
        ConfigCommand::Path { profile } => handle_path(&ConfigFile::for_profile(&profile), format),
    }
}

/// API keys never leave the config file.
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.qdrant_api_key.is_some() {
        config.qdrant_api_key = Some("********".to_string());
    }
    config
}

fn describe_connection(connection: &Connection) -> String {
    match connection {
        Connection::Local(path) => format!("local ({})", path.display()),
        Connection::Remote { .. } => connection.url().unwrap_or_default(),
    }
}

fn handle_show(config_file: &ConfigFile, format: OutputFormat) -> Result<()> {
    let config = config_file
        .load()
        .with_context(|| format!("failed to load {}", config_file.path().display()))?;
    let shown = redacted(&config);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "path": config_file.path(),
                "config": shown,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Markdown => {
            println!("## Profile config\n");
            println!("`{}`\n", config_file.path().display());
            println!("```yaml\n{}```", serde_yaml::to_string(&shown)?);
        }
        OutputFormat::Text => {
            println!("# {}", config_file.path().display());
            println!("# connection: {}", describe_connection(&config.connection()));
            print!("{}", serde_yaml::to_string(&shown)?);
        }
    }
    Ok(())
}

fn handle_path(config_file: &ConfigFile, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "path": config_file.path(),
            "exists": config_file.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let formatter = get_formatter(format);
    let status = if config_file.exists() {
        "exists"
    } else {
        "not created yet"
    };
    print!(
        "{}",
        formatter.format_message(&format!("{} ({status})", config_file.path().display()))
    );
    Ok(())
}
