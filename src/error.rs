/// Rejection of an inbound gesture payload before sequencing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Malformed(String),
    TooLarge { size: usize, limit: usize },
    UnknownKind(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Malformed(_) => "malformed",
            ValidationError::TooLarge { .. } => "too_large",
            ValidationError::UnknownKind(_) => "unknown_kind",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ValidationError::Malformed(msg) => msg.clone(),
            ValidationError::TooLarge { size, limit } => {
                format!("frame of {size} bytes exceeds limit of {limit}")
            }
            ValidationError::UnknownKind(kind) => format!("unknown gesture kind `{kind}`"),
        }
    }
}

/// Backpressure from the sequencer: the submission queue is full and the
/// caller should shed load rather than retry immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    Overloaded,
}

impl SubmitError {
    pub fn code(&self) -> &'static str {
        "overloaded"
    }

    pub fn message(&self) -> String {
        "hub is overloaded, retry with delay".to_string()
    }
}

/// Failure of a replay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayError {
    UnknownSession,
    /// The requested start sequence has already been evicted from the buffer.
    RangeExpired { oldest_retained: u64 },
}

impl ReplayError {
    pub fn code(&self) -> &'static str {
        match self {
            ReplayError::UnknownSession => "unknown_session",
            ReplayError::RangeExpired { .. } => "replay_expired",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ReplayError::UnknownSession => "no such session".to_string(),
            ReplayError::RangeExpired { oldest_retained } => {
                format!("requested range no longer retained, oldest is {oldest_retained}")
            }
        }
    }
}
