//! SSE session endpoints
//!
//! `GET /sse` opens the active session: the first event is `endpoint`, whose
//! data is the URL to POST messages to, and every later event is a
//! `message` carrying one JSON-RPC frame. Deliveries POSTed before any
//! session exists are buffered by the [`SessionHub`](crate::transport::SessionHub)
//! and replayed once one opens.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::{stream, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::LighthouseError;
use crate::mcp::protocol;
use crate::server::state::AppState;
use crate::transport::sse::{pump, Delivery, DeliveryOutcome};

/// Outbound frames queued per session before the pump waits on the client
const OUTBOUND_CAPACITY: usize = 100;

pub const ENDPOINT_EVENT: &str = "endpoint";
pub const MESSAGE_EVENT: &str = "message";

/// GET /sse - Open the active session and stream its replies.
pub async fn open(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.sessions.open();
    let endpoint = session.endpoint();

    let (tx, rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);
    tokio::spawn(pump(
        Arc::clone(&state.mcp),
        Arc::clone(&state.sessions),
        session,
        tx,
    ));

    session_stream(endpoint, ReceiverStream::new(rx))
}

/// Create the SSE response for a session: the endpoint event, then one
/// `message` event per outbound frame.
pub fn session_stream<S>(
    endpoint: String,
    frames: S,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = String> + Send + 'static,
{
    let handshake = stream::once(async move {
        Ok(Event::default().event(ENDPOINT_EVENT).data(endpoint))
    });
    let messages = frames.map(|frame| Ok(Event::default().event(MESSAGE_EVENT).data(frame)));

    Sse::new(handshake.chain(messages)).keep_alive(KeepAlive::default())
}

/// POST /messages, /sse, /sse/* - Deliver a message to the active session.
///
/// With a session open the delivery is checked up front and rejected with
/// 400 when it is not JSON. Without one it is buffered as-is. Both cases
/// answer 202.
pub async fn deliver(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(bytes) => bytes,
        Err(e) => {
            return LighthouseError::Transport(format!("Failed to read message body: {e}")).into()
        }
    };
    let body = match String::from_utf8(body.to_vec()) {
        Ok(body) => body,
        Err(_) => {
            return LighthouseError::InvalidRequest("Message body is not UTF-8".to_string()).into()
        }
    };

    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let delivery = Delivery::new(body, path).with_headers(&headers);

    if state.sessions.active_session().is_some() {
        if let Err(reason) = delivery.check_content_type() {
            return LighthouseError::InvalidRequest(reason).into();
        }
        if protocol::decode(&delivery.body).is_err() {
            return LighthouseError::InvalidRequest("Invalid JSON-RPC message".to_string())
                .into();
        }
    }

    match state.sessions.deliver(delivery) {
        DeliveryOutcome::Delivered { session_id } => {
            tracing::debug!(session_id = %session_id, "Delivered message");
        }
        DeliveryOutcome::Buffered { pending } => {
            tracing::info!(pending, "No active SSE session, buffered message");
        }
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
