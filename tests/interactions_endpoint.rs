use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey};
use mapStatusBot::clients::schedule_client::ScheduleError;
use mapStatusBot::handlers::interactions::{
    InboundRequest, InteractionHandler, LIVENESS_MESSAGE, RequestMethod,
};
use mapStatusBot::models::event::Event;
use mapStatusBot::service::event_cache::{EventCache, ScheduleSource};
use mapStatusBot::service::signature::SignatureVerifier;
use mapStatusBot::service::status_formatter::RenderMode;
use serde_json::Value;

const TIMESTAMP: &str = "1735689600";

struct StaticSource {
    events: Vec<Event>,
    calls: AtomicUsize,
}

impl StaticSource {
    fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            calls: AtomicUsize::new(0),
        }
    }
}

#[serenity::async_trait]
impl ScheduleSource for StaticSource {
    async fn fetch_events(&self) -> Result<Vec<Event>, ScheduleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.clone())
    }
}

struct Harness {
    key: SigningKey,
    handler: InteractionHandler,
    source: Arc<StaticSource>,
}

impl Harness {
    fn new(events: Vec<Event>, mode: RenderMode) -> Self {
        let key = SigningKey::from_bytes(&[42u8; 32]);
        let verifier =
            SignatureVerifier::from_hex(&hex::encode(key.verifying_key().to_bytes())).unwrap();
        let source = Arc::new(StaticSource::new(events));
        let cache = Arc::new(EventCache::new(source.clone(), Duration::from_secs(300)));
        Self {
            key,
            handler: InteractionHandler::new(verifier, cache, mode),
            source,
        }
    }

    fn sign(&self, body: &[u8]) -> String {
        let mut message = TIMESTAMP.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(self.key.sign(&message).to_bytes())
    }

    async fn post(&self, body: &str) -> (u16, &'static str, String) {
        let signature = self.sign(body.as_bytes());
        let reply = self
            .handler
            .handle(InboundRequest {
                method: RequestMethod::Post,
                signature: Some(&signature),
                timestamp: Some(TIMESTAMP),
                body: body.as_bytes(),
            })
            .await;
        (reply.status, reply.content_type, reply.body)
    }
}

fn live_event(name: &str, map: &str) -> Event {
    let now = Utc::now().timestamp_millis();
    Event {
        name: name.to_string(),
        map: map.to_string(),
        start_time: now - 60_000,
        end_time: now + 3_600_000,
        icon: None,
    }
}

#[tokio::test]
async fn ping_is_acknowledged() {
    let harness = Harness::new(vec![], RenderMode::Text);

    let (status, content_type, body) = harness.post(r#"{"type":1}"#).await;

    assert_eq!(status, 200);
    assert_eq!(content_type, "application/json");
    assert_eq!(body, r#"{"type":1}"#);
    assert_eq!(harness.source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_signature_is_unauthorized() {
    let harness = Harness::new(vec![], RenderMode::Text);
    let body = r#"{"type":1}"#;
    let signature = harness.sign(br#"{"type":2}"#);

    let reply = harness
        .handler
        .handle(InboundRequest {
            method: RequestMethod::Post,
            signature: Some(&signature),
            timestamp: Some(TIMESTAMP),
            body: body.as_bytes(),
        })
        .await;

    assert_eq!(reply.status, 401);
    assert_eq!(reply.body, "Invalid signature");
}

#[tokio::test]
async fn missing_headers_are_unauthorized() {
    let harness = Harness::new(vec![], RenderMode::Text);

    for (signature, timestamp) in [(None, Some(TIMESTAMP)), (Some("abcd"), None), (Some(""), Some(TIMESTAMP))] {
        let reply = harness
            .handler
            .handle(InboundRequest {
                method: RequestMethod::Post,
                signature,
                timestamp,
                body: br#"{"type":1}"#,
            })
            .await;
        assert_eq!(reply.status, 401);
        assert_eq!(reply.body, "Missing signature headers");
        assert!(reply.content_type.starts_with("text/plain"));
    }
}

#[tokio::test]
async fn mapstatus_without_data_reports_unavailable() {
    let harness = Harness::new(vec![], RenderMode::Text);

    let (status, _, body) = harness
        .post(r#"{"type":2,"data":{"name":"mapstatus"}}"#)
        .await;

    assert_eq!(status, 200);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["type"], 4);
    assert_eq!(
        parsed["data"]["content"],
        "Unable to fetch event data. Please try again later."
    );
    assert!(parsed["data"]["embeds"][0].is_null());
}

#[tokio::test]
async fn mapstatus_lists_active_events() {
    let harness = Harness::new(vec![live_event("Electromagnetic Storm", "Dam")], RenderMode::Text);

    let (status, _, body) = harness
        .post(r#"{"type":2,"data":{"name":"mapstatus"}}"#)
        .await;

    assert_eq!(status, 200);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["type"], 4);
    let content = parsed["data"]["content"].as_str().unwrap();
    assert!(content.starts_with("ACTIVE NOW (ends <t:"));
    assert!(content.contains("> **Electromagnetic Storm** - Dam"));
}

#[tokio::test]
async fn mapstatus_in_embed_mode_returns_embeds() {
    let harness = Harness::new(vec![live_event("Harvester", "Buried City")], RenderMode::Embed);

    let (status, _, body) = harness
        .post(r#"{"type":2,"data":{"name":"mapstatus"}}"#)
        .await;

    assert_eq!(status, 200);
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["data"]["embeds"][0]["fields"][0]["name"], "ACTIVE NOW");
    assert!(parsed["data"]["content"].is_null());
}

#[tokio::test]
async fn repeated_commands_hit_the_cache() {
    let harness = Harness::new(vec![live_event("Storm", "Dam")], RenderMode::Text);

    for _ in 0..3 {
        let (status, _, _) = harness
            .post(r#"{"type":2,"data":{"name":"mapstatus"}}"#)
            .await;
        assert_eq!(status, 200);
    }

    assert_eq!(harness.source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_command_is_bad_request() {
    let harness = Harness::new(vec![], RenderMode::Text);

    for body in [
        r#"{"type":2,"data":{"name":"weather"}}"#,
        r#"{"type":2}"#,
        r#"{"type":3,"data":{"custom_id":"button"}}"#,
    ] {
        let (status, content_type, reply) = harness.post(body).await;
        assert_eq!(status, 400);
        assert_eq!(content_type, "application/json");
        assert_eq!(reply, r#"{"error":"Unknown interaction type"}"#);
    }
}

#[tokio::test]
async fn out_of_range_or_non_numeric_type_is_unknown() {
    let harness = Harness::new(vec![], RenderMode::Text);

    for body in [
        r#"{"type":-1}"#,
        r#"{"type":"x"}"#,
        r#"{"type":1.5}"#,
        r#"{"type":257}"#,
        r#"{"type":null}"#,
        r#"{"data":{"name":"mapstatus"}}"#,
    ] {
        let (status, _, reply) = harness.post(body).await;
        assert_eq!(status, 400, "body {}", body);
        assert_eq!(reply, r#"{"error":"Unknown interaction type"}"#, "body {}", body);
    }
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let harness = Harness::new(vec![], RenderMode::Text);

    for body in ["{not json", "[1]", r#""ping""#, r#"{"type":2,"data":"mapstatus"}"#] {
        let (status, _, reply) = harness.post(body).await;
        assert_eq!(status, 400, "body {}", body);
        assert_eq!(reply, r#"{"error":"Malformed request body"}"#, "body {}", body);
    }
}

#[tokio::test]
async fn get_and_other_methods() {
    let harness = Harness::new(vec![], RenderMode::Text);

    let get = harness
        .handler
        .handle(InboundRequest {
            method: RequestMethod::Get,
            signature: None,
            timestamp: None,
            body: b"",
        })
        .await;
    assert_eq!(get.status, 200);
    assert_eq!(get.body, LIVENESS_MESSAGE);

    let delete = harness
        .handler
        .handle(InboundRequest {
            method: RequestMethod::parse("DELETE"),
            signature: None,
            timestamp: None,
            body: b"",
        })
        .await;
    assert_eq!(delete.status, 405);
}
