use std::sync::Arc;

use bytes::Bytes;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

use crate::handlers::interactions::{HttpReply, InboundRequest, InteractionHandler, RequestMethod};

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Largest interaction body accepted. Discord payloads are a few KB at most.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// warp binding for the interactions endpoint at `/api/interactions`.
///
/// Only POST reads the body, and only once `Content-Length` is known to be
/// within [`MAX_BODY_BYTES`]. Every other method goes to the core handler
/// with an empty body.
pub fn interactions_route(
    handler: Arc<InteractionHandler>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let post = warp::post()
        .and(warp::header::optional::<String>(SIGNATURE_HEADER))
        .and(warp::header::optional::<String>(TIMESTAMP_HEADER))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_handler(handler.clone()))
        .then(
            |signature: Option<String>,
             timestamp: Option<String>,
             body: Bytes,
             handler: Arc<InteractionHandler>| {
                serve_interaction(Method::POST, signature, timestamp, body, handler)
            },
        )
        .recover(reject_body);

    let other = warp::method()
        .and_then(|method: Method| async move {
            if method == Method::POST {
                Err(warp::reject::not_found())
            } else {
                Ok(method)
            }
        })
        .and(with_handler(handler))
        .then(|method: Method, handler: Arc<InteractionHandler>| {
            serve_interaction(method, None, None, Bytes::new(), handler)
        });

    warp::path!("api" / "interactions").and(post.or(other))
}

async fn reject_body(err: Rejection) -> Result<warp::reply::Response, Rejection> {
    let reply = if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        HttpReply::text(413, "Payload too large")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        HttpReply::text(411, "Length required")
    } else {
        return Err(err);
    };
    warn!(status = reply.status, limit = MAX_BODY_BYTES, "rejected interaction body");
    Ok(into_warp_reply(reply).into_response())
}

fn with_handler(
    handler: Arc<InteractionHandler>,
) -> impl Filter<Extract = (Arc<InteractionHandler>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || handler.clone())
}

async fn serve_interaction(
    method: Method,
    signature: Option<String>,
    timestamp: Option<String>,
    body: Bytes,
    handler: Arc<InteractionHandler>,
) -> impl Reply {
    let request_id = Uuid::new_v4();
    let span = info_span!("interaction", %request_id, method = %method);
    async move {
        let request = InboundRequest {
            method: RequestMethod::parse(method.as_str()),
            signature: signature.as_deref(),
            timestamp: timestamp.as_deref(),
            body: &body,
        };
        let reply = handler.handle(request).await;
        info!(status = reply.status, "handled request");
        into_warp_reply(reply)
    }
    .instrument(span)
    .await
}

fn into_warp_reply(reply: HttpReply) -> impl Reply {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warp::reply::with_status(
        warp::reply::with_header(reply.body, "content-type", reply.content_type),
        status,
    )
}
