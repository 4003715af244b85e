use std::time::Duration;

use serenity::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::event::{Event, ScheduleResponse};
use crate::service::event_cache::ScheduleSource;

pub const DEFAULT_SCHEDULE_URL: &str = "https://metaforge.app/api/arc-raiders/events-schedule";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("schedule response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-only client for the MetaForge events-schedule endpoint.
/// Requests are bounded by the client timeout and never retried.
pub struct ScheduleClient {
    http: reqwest::Client,
    url: String,
}

impl ScheduleClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ScheduleError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Vec<Event>, ScheduleError> {
        let response = self.http.get(&self.url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        let parsed: ScheduleResponse = serde_json::from_slice(&body)?;
        let events = parsed.into_events();
        debug!(count = events.len(), url = %self.url, "fetched schedule");
        Ok(events)
    }
}

#[async_trait]
impl ScheduleSource for ScheduleClient {
    async fn fetch_events(&self) -> Result<Vec<Event>, ScheduleError> {
        self.fetch().await
    }
}
