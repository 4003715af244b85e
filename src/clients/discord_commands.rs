use serenity::builder::CreateCommand;
use serenity::http::Http;
use serenity::model::application::{Command, CommandType};
use serenity::model::id::{ApplicationId, GuildId};
use tracing::info;

use crate::config::RegistrationSettings;
use crate::models::interaction::{MAPSTATUS_COMMAND, MAPSTATUS_DESCRIPTION};

pub fn mapstatus_command() -> CreateCommand {
    CreateCommand::new(MAPSTATUS_COMMAND)
        .kind(CommandType::ChatInput)
        .description(MAPSTATUS_DESCRIPTION)
}

/// Bulk-overwrites the guild's application commands with `/mapstatus`.
/// Any other guild command registered for this application is removed.
pub async fn register_guild_commands(
    settings: &RegistrationSettings,
) -> Result<Vec<Command>, serenity::Error> {
    let http = Http::new(&settings.bot_token);
    http.set_application_id(ApplicationId::new(settings.application_id));
    let commands = GuildId::new(settings.guild_id)
        .set_commands(&http, vec![mapstatus_command()])
        .await?;
    for command in &commands {
        info!(name = %command.name, id = %command.id, guild = settings.guild_id, "registered command");
    }
    Ok(commands)
}
