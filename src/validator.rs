use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::gateway::events::RawGesture;

/// The known gesture vocabulary, as produced by the hand-tracking clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    IndexFingerUp,
    Fist,
    Palm,
    Ok,
    Yo,
    ThumbsUp,
    TwoFingers,
    Other,
}

impl GestureKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "index_finger_up" => Some(GestureKind::IndexFingerUp),
            "fist" => Some(GestureKind::Fist),
            "palm" => Some(GestureKind::Palm),
            "ok" => Some(GestureKind::Ok),
            "yo" => Some(GestureKind::Yo),
            "thumbs_up" => Some(GestureKind::ThumbsUp),
            "two_fingers" => Some(GestureKind::TwoFingers),
            "other" => Some(GestureKind::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "left" => Some(Hand::Left),
            "right" => Some(Hand::Right),
            _ => None,
        }
    }
}

/// A validated gesture awaiting sequencing. Produced only by [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct GestureDraft {
    pub kind: GestureKind,
    pub hand: Option<Hand>,
    pub payload: Value,
    pub client_timestamp: Option<i64>,
}

/// Normalize a raw inbound gesture into a draft, or reject it.
///
/// Pure with respect to process state: no side effects, and no allocation
/// beyond the draft itself. `frame_len` is the byte length of the inbound
/// frame as received from the transport.
pub fn validate(
    raw: RawGesture,
    frame_len: usize,
    max_frame_bytes: usize,
) -> Result<GestureDraft, ValidationError> {
    if frame_len > max_frame_bytes {
        return Err(ValidationError::TooLarge {
            size: frame_len,
            limit: max_frame_bytes,
        });
    }

    let kind = match raw.kind {
        None | Some(Value::Null) => {
            return Err(ValidationError::Malformed(
                "missing required field `kind`".to_string(),
            ))
        }
        Some(Value::String(label)) => match GestureKind::from_label(&label) {
            Some(kind) => kind,
            None => return Err(ValidationError::UnknownKind(label)),
        },
        Some(_) => {
            return Err(ValidationError::Malformed(
                "`kind` must be a string".to_string(),
            ))
        }
    };

    let hand = match raw.hand {
        None | Some(Value::Null) => None,
        Some(Value::String(label)) => match Hand::from_label(&label) {
            Some(hand) => Some(hand),
            None => {
                return Err(ValidationError::Malformed(format!(
                    "unrecognized hand `{label}`"
                )))
            }
        },
        Some(_) => {
            return Err(ValidationError::Malformed(
                "`hand` must be a string".to_string(),
            ))
        }
    };

    let client_timestamp = match raw.timestamp {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(ts) => Some(ts),
            None => {
                return Err(ValidationError::Malformed(
                    "`timestamp` must be an integer".to_string(),
                ))
            }
        },
        Some(_) => {
            return Err(ValidationError::Malformed(
                "`timestamp` must be a number".to_string(),
            ))
        }
    };

    Ok(GestureDraft {
        kind,
        hand,
        payload: raw.payload.unwrap_or(Value::Null),
        client_timestamp,
    })
}
