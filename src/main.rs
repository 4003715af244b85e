#![allow(non_snake_case)]

use std::env;

use anyhow::Context;
use mapStatusBot::cli;
use mapStatusBot::config::{AppConfig, Settings};
use mapStatusBot::runtime;

const DEFAULT_RUN_MODE: &str = "api";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    runtime::init_tracing("info");

    let config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => AppConfig::default(),
    };

    let run_mode = config
        .get("RUN_MODE")
        .unwrap_or_else(|| DEFAULT_RUN_MODE.to_string());
    match run_mode.as_str() {
        "api" => {
            let settings = Settings::from_config(&config)?;
            runtime::run_api(settings).await
        }
        "cli" => cli::cli(config).await,
        other => anyhow::bail!("Invalid run mode {}", other),
    }
}
