pub mod events;

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::error::{ReplayError, ValidationError};
use crate::state::AppState;
use crate::validator;
use events::{ClientFrame, ServerFrame};

pub const PING_INTERVAL: Duration = Duration::from_secs(30);
pub const PONG_TIMEOUT: Duration = Duration::from_secs(75);

pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Bounded delivery queue for this session; the hub enqueues, we drain.
    let (tx, mut rx) = mpsc::channel::<String>(state.limits.session_queue_depth);
    let session_id = state.registry.register(tx, state.hub.head());
    tracing::debug!(session_id = %session_id, "session connected");

    let welcome = ServerFrame::Welcome {
        session_id: session_id.clone(),
        head_sequence: state.hub.head(),
    };
    if send_frame(&mut ws_sink, &welcome).await.is_err() {
        state.registry.unregister(&session_id);
        return;
    }

    let mut last_pong = tokio::time::Instant::now();
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);

    loop {
        tokio::select! {
            // Sequenced broadcasts and replay backfill for this session.
            queued = rx.recv() => {
                match queued {
                    Some(frame) => {
                        if ws_sink.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    // Hub dropped us (queue overflow); tear down.
                    None => break,
                }
            }
            // Liveness: ping on an interval, drop unresponsive sessions.
            _ = ping_interval.tick() => {
                if last_pong.elapsed() > PONG_TIMEOUT {
                    tracing::debug!(session_id = %session_id, "liveness timeout");
                    break;
                }
                if ws_sink.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(frame) = handle_frame(&state, &session_id, &text).await {
                            if send_frame(&mut ws_sink, &frame).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = tokio::time::Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.registry.unregister(&session_id);
    tracing::debug!(session_id = %session_id, "session disconnected");
}

/// Dispatch one inbound frame. Returns the error/expiry frame to echo back,
/// if any; accepted gestures answer through the broadcast path instead.
async fn handle_frame(state: &AppState, session_id: &str, text: &str) -> Option<ServerFrame> {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            let err = ValidationError::Malformed(format!("unrecognized frame: {e}"));
            return Some(ServerFrame::Error {
                code: err.code(),
                message: err.message(),
            });
        }
    };

    match frame {
        ClientFrame::Gesture(raw) => {
            let draft = match validator::validate(raw, text.len(), state.limits.max_frame_bytes) {
                Ok(draft) => draft,
                Err(e) => {
                    return Some(ServerFrame::Error {
                        code: e.code(),
                        message: e.message(),
                    })
                }
            };
            match state.hub.submit(session_id.to_string(), draft).await {
                Ok(_) => None,
                Err(e) => Some(ServerFrame::Error {
                    code: e.code(),
                    message: e.message(),
                }),
            }
        }
        ClientFrame::ReplayRequest { from_sequence } => {
            match state.hub.replay(session_id.to_string(), from_sequence).await {
                Ok(delivered) => {
                    tracing::debug!(session_id = %session_id, from_sequence, delivered, "replay served");
                    None
                }
                Err(ReplayError::RangeExpired { oldest_retained }) => {
                    Some(ServerFrame::ReplayExpired { oldest_retained })
                }
                Err(e @ ReplayError::UnknownSession) => Some(ServerFrame::Error {
                    code: e.code(),
                    message: e.message(),
                }),
            }
        }
    }
}

async fn send_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: &ServerFrame,
) -> Result<(), axum::Error> {
    sink.send(Message::Text(frame.to_json().into())).await
}
