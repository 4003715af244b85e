use std::str::FromStr;

use chrono::{DateTime, Utc};
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateInteractionResponseMessage};

use crate::models::event::Event;
use crate::service::event_cache::EventCache;

pub const UNAVAILABLE_MESSAGE: &str = "Unable to fetch event data. Please try again later.";
pub const NOTHING_SCHEDULED_MESSAGE: &str = "No active or upcoming events found.";

pub const EMBED_TITLE: &str = "Arc Raiders Map Status";
pub const EMBED_FOOTER: &str = "Schedule data from metaforge.app";
pub const ACTIVE_FIELD: &str = "ACTIVE NOW";
pub const UPCOMING_FIELD: &str = "UP NEXT";

pub const COLOR_UNAVAILABLE: u32 = 0xED4245;
pub const COLOR_NOTHING_SCHEDULED: u32 = 0x95A5A6;
pub const COLOR_ACTIVE: u32 = 0x57F287;
pub const COLOR_UPCOMING: u32 = 0xFEE75C;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Text,
    Embed,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(RenderMode::Text),
            "embed" | "rich" => Ok(RenderMode::Embed),
            other => Err(format!("unknown render mode '{}', expected text or embed", other)),
        }
    }
}

/// Events split around a point in time. `active` is ordered by end time,
/// `upcoming` by start time; events already over are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub active: Vec<Event>,
    pub upcoming: Vec<Event>,
}

impl Classification {
    pub fn classify(events: &[Event], now_ms: i64) -> Self {
        let mut active = Vec::new();
        let mut upcoming = Vec::new();
        for event in events {
            if event.is_active_at(now_ms) {
                active.push(event.clone());
            } else if event.is_upcoming_at(now_ms) {
                upcoming.push(event.clone());
            }
        }
        active.sort_by_key(|event| event.end_time);
        upcoming.sort_by_key(|event| event.start_time);
        Self { active, upcoming }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.upcoming.is_empty()
    }

    /// The soonest-ending active event plus every active event ending at the
    /// same instant. Later groups are not shown.
    pub fn active_group(&self) -> Vec<&Event> {
        nearest_group(&self.active, |event| event.end_time)
    }

    pub fn upcoming_group(&self) -> Vec<&Event> {
        nearest_group(&self.upcoming, |event| event.start_time)
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.active
            .first()
            .and_then(|event| event.icon.as_deref())
            .or_else(|| self.upcoming.first().and_then(|event| event.icon.as_deref()))
    }
}

fn nearest_group<F>(events: &[Event], boundary: F) -> Vec<&Event>
where
    F: Fn(&Event) -> i64,
{
    let Some((first, rest)) = events.split_first() else {
        return Vec::new();
    };
    let at = boundary(first);
    std::iter::once(first)
        .chain(rest.iter().filter(|event| boundary(*event) == at))
        .collect()
}

pub async fn format_status(cache: &EventCache, mode: RenderMode) -> CreateInteractionResponseMessage {
    let now = Utc::now();
    let events = cache.get_events_at(now).await;
    render_status(&events, now, mode)
}

pub fn render_status(
    events: &[Event],
    now: DateTime<Utc>,
    mode: RenderMode,
) -> CreateInteractionResponseMessage {
    let message = CreateInteractionResponseMessage::new();
    if events.is_empty() {
        return match mode {
            RenderMode::Text => message.content(UNAVAILABLE_MESSAGE),
            RenderMode::Embed => {
                message.embed(notice_embed(UNAVAILABLE_MESSAGE, COLOR_UNAVAILABLE, now))
            }
        };
    }

    let classification = Classification::classify(events, now.timestamp_millis());
    if classification.is_empty() {
        return match mode {
            RenderMode::Text => message.content(NOTHING_SCHEDULED_MESSAGE),
            RenderMode::Embed => message.embed(notice_embed(
                NOTHING_SCHEDULED_MESSAGE,
                COLOR_NOTHING_SCHEDULED,
                now,
            )),
        };
    }

    match mode {
        RenderMode::Text => message.content(render_text(&classification)),
        RenderMode::Embed => message.embed(render_embed(&classification, now)),
    }
}

pub fn render_text(classification: &Classification) -> String {
    let mut lines = Vec::new();

    let active = classification.active_group();
    if let Some(first) = active.first() {
        lines.push(format!("ACTIVE NOW (ends {})", relative_time(first.end_time)));
        lines.extend(active.iter().map(|event| event_line(event)));
        lines.push(String::new());
    }

    let upcoming = classification.upcoming_group();
    if let Some(first) = upcoming.first() {
        lines.push(format!("UP NEXT (starts {})", relative_time(first.start_time)));
        lines.extend(upcoming.iter().map(|event| event_line(event)));
    }

    lines.join("\n")
}

pub fn render_embed(classification: &Classification, now: DateTime<Utc>) -> CreateEmbed {
    let active = classification.active_group();
    let upcoming = classification.upcoming_group();

    let (description, color) = if active.is_empty() {
        ("Nothing is live right now. Here is what starts next.", COLOR_UPCOMING)
    } else {
        ("Events are live right now.", COLOR_ACTIVE)
    };
    let mut embed = base_embed(now).description(description).colour(color);

    if let Some(first) = active.first() {
        embed = embed.field(ACTIVE_FIELD, group_value("Ends", first.end_time, &active), false);
    }
    if let Some(first) = upcoming.first() {
        embed = embed.field(
            UPCOMING_FIELD,
            group_value("Starts", first.start_time, &upcoming),
            false,
        );
    }
    if let Some(url) = classification.thumbnail() {
        embed = embed.thumbnail(url);
    }
    embed
}

fn base_embed(now: DateTime<Utc>) -> CreateEmbed {
    CreateEmbed::new()
        .title(EMBED_TITLE)
        .footer(CreateEmbedFooter::new(EMBED_FOOTER))
        .timestamp(now)
}

fn notice_embed(message: &str, color: u32, now: DateTime<Utc>) -> CreateEmbed {
    base_embed(now).description(message).colour(color)
}

fn group_value(verb: &str, boundary_ms: i64, group: &[&Event]) -> String {
    let mut lines = vec![format!("{} {}", verb, relative_time(boundary_ms))];
    lines.extend(group.iter().map(|event| event_line(event)));
    lines.join("\n")
}

fn event_line(event: &Event) -> String {
    format!("> **{}** - {}", event.name, event.map)
}

// Discord renders <t:SECONDS:R> as "in 5 minutes" / "3 minutes ago" in the
// reader's locale.
fn relative_time(ms: i64) -> String {
    format!("<t:{}:R>", ms.div_euclid(1000))
}
