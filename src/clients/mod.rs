pub mod discord_commands;
pub mod schedule_client;
