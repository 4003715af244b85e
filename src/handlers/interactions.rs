use std::sync::Arc;

use serde::Serialize;
use serde::de::Error as _;
use serde_json::Value;
use serenity::builder::CreateInteractionResponse;
use serenity::model::application::InteractionType;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::interaction::{ErrorMessage, Interaction, MAPSTATUS_COMMAND};
use crate::service::event_cache::EventCache;
use crate::service::signature::SignatureVerifier;
use crate::service::status_formatter::{format_status, RenderMode};

pub const LIVENESS_MESSAGE: &str = "Discord bot is running";

const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Missing signature headers")]
    MissingSignatureHeaders,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("Unknown interaction type")]
    UnknownInteraction,
}

impl InteractionError {
    pub fn status(&self) -> u16 {
        match self {
            InteractionError::MissingSignatureHeaders | InteractionError::InvalidSignature => 401,
            InteractionError::MalformedBody(_) | InteractionError::UnknownInteraction => 400,
        }
    }

    pub fn into_reply(self) -> HttpReply {
        let status = self.status();
        match self {
            InteractionError::MissingSignatureHeaders | InteractionError::InvalidSignature => {
                HttpReply::text(status, self.to_string())
            }
            InteractionError::MalformedBody(_) => HttpReply::json(
                status,
                &ErrorMessage {
                    error: "Malformed request body".to_string(),
                },
            ),
            InteractionError::UnknownInteraction => HttpReply::json(
                status,
                &ErrorMessage {
                    error: self.to_string(),
                },
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Other(String),
}

impl RequestMethod {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => RequestMethod::Get,
            "POST" => RequestMethod::Post,
            other => RequestMethod::Other(other.to_string()),
        }
    }
}

/// Transport-neutral view of an inbound webhook call. `body` must be the
/// bytes exactly as received, the signature covers them verbatim.
#[derive(Debug)]
pub struct InboundRequest<'a> {
    pub method: RequestMethod,
    pub signature: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub body: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpReply {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: CONTENT_TYPE_TEXT,
            body: body.into(),
        }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: CONTENT_TYPE_JSON,
                body,
            },
            Err(err) => {
                error!(error = %err, "failed to serialize response body");
                Self::text(500, "Internal server error")
            }
        }
    }
}

pub struct InteractionHandler {
    verifier: SignatureVerifier,
    cache: Arc<EventCache>,
    render_mode: RenderMode,
}

impl InteractionHandler {
    pub fn new(verifier: SignatureVerifier, cache: Arc<EventCache>, render_mode: RenderMode) -> Self {
        Self {
            verifier,
            cache,
            render_mode,
        }
    }

    pub fn cache(&self) -> &Arc<EventCache> {
        &self.cache
    }

    pub async fn handle(&self, request: InboundRequest<'_>) -> HttpReply {
        match request.method {
            RequestMethod::Get => HttpReply::text(200, LIVENESS_MESSAGE),
            RequestMethod::Post => {
                match self
                    .handle_post(request.signature, request.timestamp, request.body)
                    .await
                {
                    Ok(reply) => reply,
                    Err(err) => {
                        warn!(status = err.status(), error = %err, "rejected interaction");
                        err.into_reply()
                    }
                }
            }
            RequestMethod::Other(method) => {
                info!(method = %method, "method not allowed");
                HttpReply::text(405, "Method not allowed")
            }
        }
    }

    async fn handle_post(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<HttpReply, InteractionError> {
        let signature = signature.filter(|value| !value.is_empty());
        let timestamp = timestamp.filter(|value| !value.is_empty());
        let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
            return Err(InteractionError::MissingSignatureHeaders);
        };

        if !self.verifier.verify(signature, timestamp, body) {
            return Err(InteractionError::InvalidSignature);
        }

        let payload: Value = serde_json::from_slice(body)?;
        if !payload.is_object() {
            return Err(InteractionError::MalformedBody(serde_json::Error::custom(
                "interaction payload must be a JSON object",
            )));
        }
        let interaction: Interaction = serde_json::from_value(payload)?;

        match (interaction.interaction_type(), interaction.command_name()) {
            (Some(InteractionType::Ping), _) => {
                info!("acknowledged ping");
                Ok(interaction_reply(&CreateInteractionResponse::Pong))
            }
            (Some(InteractionType::Command), Some(MAPSTATUS_COMMAND)) => {
                let message = format_status(&self.cache, self.render_mode).await;
                info!(command = MAPSTATUS_COMMAND, "answered command");
                Ok(interaction_reply(&CreateInteractionResponse::Message(message)))
            }
            (_, name) => {
                info!(
                    kind = %interaction.kind,
                    command = name.unwrap_or_default(),
                    "unhandled interaction"
                );
                Err(InteractionError::UnknownInteraction)
            }
        }
    }
}

// serenity always writes a `data` key; Discord expects a bare `{"type":1}`
// for pongs, so null top-level fields are dropped.
fn interaction_reply(response: &CreateInteractionResponse) -> HttpReply {
    match serde_json::to_value(response) {
        Ok(mut value) => {
            if let Value::Object(fields) = &mut value {
                fields.retain(|_, field| !field.is_null());
            }
            HttpReply::json(200, &value)
        }
        Err(err) => {
            error!(error = %err, "failed to serialize interaction response");
            HttpReply::text(500, "Internal server error")
        }
    }
}
