#![allow(dead_code)]

use axum::Router;
use gesturehub::config::Config;
use gesturehub::routes;
use gesturehub::state::AppState;

/// Small limits so tests can exercise eviction and overflow cheaply.
pub fn test_config() -> Config {
    Config {
        port: 0,
        replay_capacity: 8,
        session_queue_depth: 16,
        submit_queue_depth: 64,
        max_frame_bytes: 1024,
    }
}

pub fn test_app() -> Router {
    test_app_with(test_config())
}

/// Each app owns an isolated registry and hub task — safe for parallel tests.
pub fn test_app_with(config: Config) -> Router {
    routes::router(AppState::new(&config))
}
