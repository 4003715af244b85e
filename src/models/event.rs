use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A scheduled map event as published by the MetaForge schedule API.
/// Times are milliseconds since the unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,
    pub map: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Event {
    pub fn is_active_at(&self, now_ms: i64) -> bool {
        self.start_time <= now_ms && now_ms < self.end_time
    }

    pub fn is_upcoming_at(&self, now_ms: i64) -> bool {
        self.start_time > now_ms
    }
}

#[derive(Debug, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub data: Value,
}

impl ScheduleResponse {
    // Entries that don't match the Event shape are dropped one by one so a
    // single bad row can't take the whole schedule down.
    pub fn into_events(self) -> Vec<Event> {
        let Value::Array(entries) = self.data else {
            return Vec::new();
        };
        entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match serde_json::from_value::<Event>(entry) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!(index = idx, error = %err, "dropping malformed schedule entry");
                    None
                }
            })
            .collect()
    }
}
