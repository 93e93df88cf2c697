use tokio::net::TcpListener;

use gesturehub::config::Config;
use gesturehub::routes;
use gesturehub::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesturehub=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let state = AppState::new(&config);
    let app = routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app).await.expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");

    eprintln!();
    eprintln!("  \x1b[1;36mgesturehub\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m            {}", config.port);
    eprintln!(
        "  \x1b[2mreplay buffer\x1b[0m   {} events",
        config.replay_capacity
    );
    eprintln!(
        "  \x1b[2msession queue\x1b[0m   {} frames",
        config.session_queue_depth
    );
    eprintln!(
        "  \x1b[2mframe limit\x1b[0m     {} bytes",
        config.max_frame_bytes
    );
    eprintln!();
}
