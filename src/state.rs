use std::sync::Arc;

use crate::config::Config;
use crate::hub::{self, HubHandle};
use crate::registry::SessionRegistry;

/// Per-connection limits carried into the gateway.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_frame_bytes: usize,
    pub session_queue_depth: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub hub: HubHandle,
    pub limits: Limits,
}

impl AppState {
    /// Build the process-wide hub context: the session registry and the
    /// sequencer task. Must be called from within a tokio runtime.
    pub fn new(config: &Config) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let hub = hub::spawn(
            Arc::clone(&registry),
            config.replay_capacity,
            config.submit_queue_depth,
        );
        Self {
            registry,
            hub,
            limits: Limits {
                max_frame_bytes: config.max_frame_bytes,
                session_queue_depth: config.session_queue_depth.max(1),
            },
        }
    }
}
