use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validator::{GestureKind, Hand};

/// Inbound frames, dispatched by the `type` tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientFrame {
    Gesture(RawGesture),
    ReplayRequest { from_sequence: u64 },
}

/// A `gesture` frame before validation. Fields stay loosely typed so the
/// validator can distinguish a missing field from an ill-typed one.
#[derive(Debug, Default, Deserialize)]
pub struct RawGesture {
    #[serde(default)]
    pub kind: Option<Value>,
    #[serde(default)]
    pub hand: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// Outbound frames.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerFrame {
    Welcome {
        session_id: String,
        head_sequence: u64,
    },
    GestureBroadcast {
        sequence: u64,
        session_id: String,
        kind: GestureKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        hand: Option<Hand>,
        payload: Value,
        server_timestamp: DateTime<Utc>,
    },
    ReplayExpired {
        oldest_retained: u64,
    },
    Error {
        code: &'static str,
        message: String,
    },
}

impl ServerFrame {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
