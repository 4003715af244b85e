use serde::{Deserialize, Serialize};
use serde_json::Value;
use serenity::model::application::InteractionType;

pub const MAPSTATUS_COMMAND: &str = "mapstatus";
pub const MAPSTATUS_DESCRIPTION: &str = "Show current and upcoming Arc Raiders map events";

/// The subset of an inbound Discord interaction this bot cares about.
///
/// `type` is kept as raw JSON so that negative, oversized or non-numeric
/// values route as unknown interactions instead of failing to parse.
#[derive(Debug, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type", default)]
    pub kind: Value,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
}

impl Interaction {
    pub fn interaction_type(&self) -> Option<InteractionType> {
        self.kind
            .as_u64()
            .and_then(|kind| u8::try_from(kind).ok())
            .map(InteractionType::from)
    }

    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.name.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub error: String,
}
