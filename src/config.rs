use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Number of sequenced events retained for replay.
    pub replay_capacity: usize,
    /// Bound on each session's outbound delivery queue.
    pub session_queue_depth: usize,
    /// Bound on the sequencer's command queue; a full queue is backpressure.
    pub submit_queue_depth: usize,
    /// Upper bound on an inbound gesture frame, in bytes.
    pub max_frame_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 3000),
            replay_capacity: env_or("HUB_REPLAY_CAPACITY", 256),
            session_queue_depth: env_or("HUB_SESSION_QUEUE_DEPTH", 64),
            submit_queue_depth: env_or("HUB_SUBMIT_QUEUE_DEPTH", 1024),
            max_frame_bytes: env_or("HUB_MAX_FRAME_BYTES", 4096),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
