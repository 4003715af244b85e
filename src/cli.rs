use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::Confirm;

use crate::clients::discord_commands::register_guild_commands;
use crate::clients::schedule_client::{DEFAULT_FETCH_TIMEOUT, ScheduleClient};
use crate::config::{self, AppConfig, ConfigError, RegistrationSettings};
use crate::service::event_cache::{DEFAULT_CACHE_TTL, EventCache};
use crate::service::status_formatter::{RenderMode, format_status};

#[derive(Parser)]
#[command(about = "Arc Raiders map status bot tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the /mapstatus slash command in the configured guild
    Register {
        /// Skip the overwrite confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Fetch the schedule once and print the reply the bot would send
    Status {
        /// Render as an embed instead of plain text
        #[arg(long)]
        embed: bool,
    },
}

pub async fn cli(config: AppConfig) -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Register { yes } => register(&config, yes).await,
        Commands::Status { embed } => {
            let mode = if embed {
                RenderMode::Embed
            } else {
                config::render_mode(&config)?
            };
            status(&config, mode).await
        }
    }
}

async fn register(config: &AppConfig, skip_confirm: bool) -> anyhow::Result<()> {
    let settings = match RegistrationSettings::from_config(config) {
        Ok(settings) => settings,
        Err(ConfigError::Missing(_)) => {
            println!("Error: Missing required environment variables");
            println!("Required: {}", RegistrationSettings::REQUIRED.join(", "));
            bail!("missing registration credentials");
        }
        Err(err) => return Err(err.into()),
    };

    if !skip_confirm {
        let confirmed = Confirm::new(&format!(
            "Replace all commands of application {} in guild {} with /mapstatus?",
            settings.application_id, settings.guild_id
        ))
        .with_default(false)
        .prompt()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let commands = register_guild_commands(&settings)
        .await
        .context("failed to register command")?;
    println!("Successfully registered /mapstatus command");
    for command in commands {
        println!("  {} ({})", command.name, command.id);
    }
    Ok(())
}

async fn status(config: &AppConfig, mode: RenderMode) -> anyhow::Result<()> {
    let timeout = config::seconds(config, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT)?;
    let client = ScheduleClient::new(config::schedule_url(config), timeout)?;
    let cache = EventCache::new(Arc::new(client), DEFAULT_CACHE_TTL);
    let message = format_status(&cache, mode).await;
    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(())
}
