use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::clients::schedule_client::ScheduleClient;
use crate::config::Settings;
use crate::handlers::http::interactions_route;
use crate::handlers::interactions::InteractionHandler;
use crate::service::event_cache::EventCache;
use crate::service::signature::SignatureVerifier;

pub fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

pub fn build_handler(settings: &Settings) -> anyhow::Result<InteractionHandler> {
    let verifier = SignatureVerifier::from_hex(&settings.public_key)?;
    let client = ScheduleClient::new(settings.schedule_url.clone(), settings.fetch_timeout)?;
    let cache = Arc::new(EventCache::new(Arc::new(client), settings.cache_ttl));
    Ok(InteractionHandler::new(verifier, cache, settings.render_mode))
}

pub async fn run_api(settings: Settings) -> anyhow::Result<()> {
    let handler = Arc::new(build_handler(&settings)?);
    let routes = interactions_route(handler);
    info!(
        addr = %settings.bind_addr,
        upstream = %settings.schedule_url,
        render_mode = ?settings.render_mode,
        "serving interactions"
    );
    warp::serve(routes).run(settings.bind_addr).await;
    Ok(())
}
