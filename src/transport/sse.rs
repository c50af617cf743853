//! SSE session hub
//!
//! One process-wide *active session* receives every message delivery POST.
//! A delivery that arrives before any session is open is kept in a pending
//! buffer with its raw body, target path, and headers, and is replayed into
//! the next session that opens, in arrival order. Opening a session never
//! waits on the replay: buffered deliveries are moved onto the session's
//! unbounded inbound queue and processed by the session pump.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use tokio::sync::mpsc;

use crate::mcp::McpServer;

/// Path clients POST messages to once a session is open
pub const MESSAGES_PATH: &str = "/messages";

/// A message delivery POST, as received on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub body: String,
    pub path: String,
    pub headers: HashMap<String, String>,
}

impl Delivery {
    pub fn new(body: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            path: path.into(),
            headers: HashMap::new(),
        }
    }

    /// Capture a request's headers; header names are lowercase.
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        self.headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        self
    }

    /// Reject deliveries that declare a non-JSON body.
    pub fn check_content_type(&self) -> Result<(), String> {
        match self.headers.get("content-type") {
            None => Ok(()),
            Some(ct) if ct.to_ascii_lowercase().starts_with("application/json") => Ok(()),
            Some(ct) => Err(format!("Unsupported content-type: {ct}")),
        }
    }
}

/// Where a delivery went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { session_id: String },
    Buffered { pending: usize },
}

/// Receiving end of an open session
pub struct SessionHandle {
    pub id: String,
    pub inbound: mpsc::UnboundedReceiver<Delivery>,
}

impl SessionHandle {
    /// URL the client should POST its messages to
    pub fn endpoint(&self) -> String {
        format!("{MESSAGES_PATH}?sessionId={}", self.id)
    }
}

struct ActiveSession {
    id: String,
    inbound: mpsc::UnboundedSender<Delivery>,
}

#[derive(Default)]
struct HubState {
    active: Option<ActiveSession>,
    pending: VecDeque<Delivery>,
}

/// Tracks the active SSE session and the pending-delivery buffer
#[derive(Default)]
pub struct SessionHub {
    state: Mutex<HubState>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session, replacing any active one, and replay buffered
    /// deliveries into it.
    pub fn open(&self) -> SessionHandle {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut state = self.lock();
        let replayed = state.pending.len();
        for delivery in state.pending.drain(..) {
            // rx is held right here, so this cannot fail
            let _ = tx.send(delivery);
        }
        if let Some(previous) = state.active.replace(ActiveSession {
            id: id.clone(),
            inbound: tx,
        }) {
            tracing::info!(previous = %previous.id, "Replacing active SSE session");
        }
        drop(state);

        tracing::info!(session_id = %id, replayed, "SSE session opened");
        SessionHandle { id, inbound: rx }
    }

    /// Hand a delivery to the active session, or buffer it until one opens.
    pub fn deliver(&self, delivery: Delivery) -> DeliveryOutcome {
        let mut state = self.lock();

        if let Some(active) = &state.active {
            let session_id = active.id.clone();
            match active.inbound.send(delivery) {
                Ok(()) => return DeliveryOutcome::Delivered { session_id },
                Err(mpsc::error::SendError(delivery)) => {
                    tracing::debug!(session_id = %session_id, "Active session is gone");
                    state.active = None;
                    state.pending.push_back(delivery);
                }
            }
        } else {
            state.pending.push_back(delivery);
        }

        let pending = state.pending.len();
        tracing::debug!(pending, "Buffered delivery until a session opens");
        DeliveryOutcome::Buffered { pending }
    }

    /// Put back deliveries a closed session never processed. They go to the
    /// active session if one exists, otherwise to the front of the pending
    /// buffer, keeping their original order.
    pub fn restore(&self, deliveries: Vec<Delivery>) {
        if deliveries.is_empty() {
            return;
        }
        let mut state = self.lock();
        let mut unsent = Vec::new();

        match &state.active {
            Some(active) => {
                for delivery in deliveries {
                    if let Err(mpsc::error::SendError(delivery)) = active.inbound.send(delivery) {
                        unsent.push(delivery);
                    }
                }
            }
            None => unsent = deliveries,
        }

        if !unsent.is_empty() {
            if state.active.as_ref().is_some_and(|a| a.inbound.is_closed()) {
                state.active = None;
            }
            for delivery in unsent.into_iter().rev() {
                state.pending.push_front(delivery);
            }
        }
    }

    /// Forget session `id` if it is still the active one.
    pub fn close(&self, id: &str) {
        let mut state = self.lock();
        if state.active.as_ref().is_some_and(|a| a.id == id) {
            state.active = None;
            tracing::info!(session_id = %id, "SSE session closed");
        }
    }

    pub fn active_session(&self) -> Option<String> {
        self.lock().active.as_ref().map(|a| a.id.clone())
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Feed a session's deliveries to the MCP server until the client goes
/// away or the session is replaced. Replies go to `outbound`.
pub async fn pump(
    server: Arc<McpServer>,
    hub: Arc<SessionHub>,
    mut session: SessionHandle,
    outbound: mpsc::Sender<String>,
) {
    loop {
        tokio::select! {
            biased;
            _ = outbound.closed() => break,
            delivery = session.inbound.recv() => {
                let Some(delivery) = delivery else { break };
                if let Err(reason) = delivery.check_content_type() {
                    tracing::warn!(path = %delivery.path, "Dropping delivery: {reason}");
                    continue;
                }
                server.dispatch(&delivery.body, &outbound).await;
            }
        }
    }

    hub.close(&session.id);
    session.inbound.close();
    let mut leftover = Vec::new();
    while let Ok(delivery) = session.inbound.try_recv() {
        leftover.push(delivery);
    }
    if !leftover.is_empty() {
        tracing::warn!(
            session_id = %session.id,
            count = leftover.len(),
            "SSE client left with unprocessed deliveries, buffering them again"
        );
        hub.restore(leftover);
    }
}
