use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::error::{ReplayError, SubmitError};
use crate::gateway::events::ServerFrame;
use crate::registry::{SessionId, SessionRegistry};
use crate::replay::ReplayBuffer;
use crate::validator::{GestureDraft, GestureKind, Hand};

/// A gesture after sequencing. Immutable once created; discarded when it
/// falls out of the replay buffer.
#[derive(Debug, Clone)]
pub struct GestureEvent {
    pub sequence: u64,
    /// Session that submitted the gesture.
    pub session_id: SessionId,
    pub kind: GestureKind,
    pub hand: Option<Hand>,
    pub payload: Value,
    pub client_timestamp: Option<i64>,
    pub server_timestamp: DateTime<Utc>,
}

impl GestureEvent {
    pub fn broadcast_frame(&self) -> ServerFrame {
        ServerFrame::GestureBroadcast {
            sequence: self.sequence,
            session_id: self.session_id.clone(),
            kind: self.kind,
            hand: self.hand,
            payload: self.payload.clone(),
            server_timestamp: self.server_timestamp,
        }
    }
}

enum HubCommand {
    Submit {
        session_id: SessionId,
        draft: GestureDraft,
        reply: oneshot::Sender<u64>,
    },
    Replay {
        session_id: SessionId,
        from_sequence: u64,
        reply: oneshot::Sender<Result<usize, ReplayError>>,
    },
}

/// Cloneable handle to the sequencer task.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
    head: Arc<AtomicU64>,
}

impl HubHandle {
    /// Submit a validated draft for sequencing and broadcast.
    ///
    /// Returns the assigned sequence number once the event is sequenced and
    /// buffered; per-session delivery happens after that and never affects
    /// the result. A full command queue is `Overloaded` backpressure.
    pub async fn submit(
        &self,
        session_id: SessionId,
        draft: GestureDraft,
    ) -> Result<u64, SubmitError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(HubCommand::Submit {
                session_id,
                draft,
                reply,
            })
            .map_err(|_| SubmitError::Overloaded)?;
        rx.await.map_err(|_| SubmitError::Overloaded)
    }

    /// Ask the hub to backfill `session_id` from `from_sequence` through the
    /// current head. Returns the number of events enqueued.
    pub async fn replay(
        &self,
        session_id: SessionId,
        from_sequence: u64,
    ) -> Result<usize, ReplayError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::Replay {
                session_id,
                from_sequence,
                reply,
            })
            .await
            .map_err(|_| ReplayError::UnknownSession)?;
        rx.await.map_err(|_| ReplayError::UnknownSession)?
    }

    /// Sequence number of the most recently accepted event, 0 if none.
    pub fn head(&self) -> u64 {
        self.head.load(Ordering::Acquire)
    }
}

/// Spawn the sequencer task: the single authority that assigns sequence
/// numbers, owns the replay buffer, and fans accepted events out to the
/// registry's live sessions.
pub fn spawn(
    registry: Arc<SessionRegistry>,
    replay_capacity: usize,
    submit_queue_depth: usize,
) -> HubHandle {
    let (tx, rx) = mpsc::channel(submit_queue_depth.max(1));
    let head = Arc::new(AtomicU64::new(0));
    let hub = Hub {
        registry,
        buffer: ReplayBuffer::new(replay_capacity),
        next_sequence: 1,
        head: Arc::clone(&head),
        rx,
    };
    tokio::spawn(hub.run());
    HubHandle { tx, head }
}

struct Hub {
    registry: Arc<SessionRegistry>,
    buffer: ReplayBuffer,
    next_sequence: u64,
    head: Arc<AtomicU64>,
    rx: mpsc::Receiver<HubCommand>,
}

impl Hub {
    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                HubCommand::Submit {
                    session_id,
                    draft,
                    reply,
                } => {
                    let sequence = self.sequence(session_id, draft);
                    // Accepted once sequenced and buffered, regardless of
                    // per-session delivery outcome.
                    let _ = reply.send(sequence);
                }
                HubCommand::Replay {
                    session_id,
                    from_sequence,
                    reply,
                } => {
                    let _ = reply.send(self.replay_to(&session_id, from_sequence));
                }
            }
        }
        tracing::debug!("hub stopped");
    }

    fn sequence(&mut self, session_id: SessionId, draft: GestureDraft) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let event = Arc::new(GestureEvent {
            sequence,
            session_id,
            kind: draft.kind,
            hand: draft.hand,
            payload: draft.payload,
            client_timestamp: draft.client_timestamp,
            server_timestamp: Utc::now(),
        });
        self.buffer.append(Arc::clone(&event));
        self.head.store(sequence, Ordering::Release);
        self.fan_out(&event);
        sequence
    }

    /// Deliver one event to every session live at sequencing time. Each
    /// session's queue is independent: a full or closed queue disconnects
    /// that session and never delays the others.
    fn fan_out(&self, event: &GestureEvent) {
        let frame = event.broadcast_frame().to_json();
        for (session_id, tx) in self.registry.snapshot() {
            match tx.try_send(frame.clone()) {
                Ok(()) => self.registry.advance_cursor(&session_id, event.sequence),
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        session_id = %session_id,
                        sequence = event.sequence,
                        "session delivery queue full, disconnecting"
                    );
                    self.registry.unregister(&session_id);
                }
                Err(TrySendError::Closed(_)) => {
                    // Session went away between snapshot and delivery.
                    self.registry.unregister(&session_id);
                }
            }
        }
    }

    fn replay_to(&self, session_id: &str, from_sequence: u64) -> Result<usize, ReplayError> {
        let tx = self
            .registry
            .sender_for(session_id)
            .ok_or(ReplayError::UnknownSession)?;
        let events = self.buffer.range(from_sequence)?;
        let mut delivered = 0;
        for event in &events {
            if tx.try_send(event.broadcast_frame().to_json()).is_err() {
                tracing::warn!(
                    session_id = %session_id,
                    "session delivery queue full during replay, disconnecting"
                );
                self.registry.unregister(session_id);
                break;
            }
            delivered += 1;
        }
        Ok(delivered)
    }
}
