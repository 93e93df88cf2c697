mod common;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("ws://127.0.0.1:{}/ws", addr.port())
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

/// Next JSON frame, skipping transport-level ping/pong.
async fn recv_json(ws: &mut Ws) -> Value {
    loop {
        let msg = ws.next().await.expect("stream ended").unwrap();
        match msg {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

fn gesture(kind: &str) -> Value {
    json!({ "type": "gesture", "kind": kind })
}

#[tokio::test]
async fn test_connect_receives_welcome() {
    let url = spawn_server(common::test_app()).await;
    let mut ws = connect(&url).await;
    let welcome = recv_json(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["head_sequence"], 0);
    assert!(welcome["session_id"].is_string());
}

#[tokio::test]
async fn test_gesture_is_broadcast_back_to_sender() {
    let url = spawn_server(common::test_app()).await;
    let mut ws = connect(&url).await;
    let welcome = recv_json(&mut ws).await;
    let session_id = welcome["session_id"].as_str().unwrap().to_string();

    send_json(
        &mut ws,
        json!({ "type": "gesture", "kind": "thumbs_up", "hand": "right", "timestamp": 99 }),
    )
    .await;

    let broadcast = recv_json(&mut ws).await;
    assert_eq!(broadcast["type"], "gesture-broadcast");
    assert_eq!(broadcast["sequence"], 1);
    assert_eq!(broadcast["kind"], "thumbs_up");
    assert_eq!(broadcast["hand"], "right");
    assert_eq!(broadcast["session_id"], session_id.as_str());
    assert!(broadcast["server_timestamp"].is_string());
}

#[tokio::test]
async fn test_fan_out_reaches_all_live_sessions() {
    let url = spawn_server(common::test_app()).await;
    let mut sender = connect(&url).await;
    let mut observer = connect(&url).await;
    let _ = recv_json(&mut sender).await;
    let _ = recv_json(&mut observer).await;

    send_json(&mut sender, gesture("fist")).await;

    let seen_by_sender = recv_json(&mut sender).await;
    let seen_by_observer = recv_json(&mut observer).await;
    assert_eq!(seen_by_sender["sequence"], seen_by_observer["sequence"]);
    assert_eq!(seen_by_observer["kind"], "fist");
}

#[tokio::test]
async fn test_missing_kind_is_rejected_and_never_sequenced() {
    let url = spawn_server(common::test_app()).await;
    let mut ws = connect(&url).await;
    let _ = recv_json(&mut ws).await;

    send_json(&mut ws, json!({ "type": "gesture" })).await;
    let error = recv_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "malformed");

    // The rejected frame consumed no sequence number.
    send_json(&mut ws, gesture("palm")).await;
    let broadcast = recv_json(&mut ws).await;
    assert_eq!(broadcast["type"], "gesture-broadcast");
    assert_eq!(broadcast["sequence"], 1);
}

#[tokio::test]
async fn test_unknown_kind_is_rejected() {
    let url = spawn_server(common::test_app()).await;
    let mut ws = connect(&url).await;
    let _ = recv_json(&mut ws).await;

    send_json(&mut ws, gesture("jazz_hands")).await;
    let error = recv_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "unknown_kind");
}

#[tokio::test]
async fn test_oversized_frame_is_rejected() {
    let url = spawn_server(common::test_app()).await;
    let mut ws = connect(&url).await;
    let _ = recv_json(&mut ws).await;

    let padding = "x".repeat(2000);
    send_json(
        &mut ws,
        json!({ "type": "gesture", "kind": "fist", "payload": padding }),
    )
    .await;
    let error = recv_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "too_large");
}

#[tokio::test]
async fn test_unparseable_frame_is_rejected() {
    let url = spawn_server(common::test_app()).await;
    let mut ws = connect(&url).await;
    let _ = recv_json(&mut ws).await;

    ws.send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();
    let error = recv_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "malformed");
}

#[tokio::test]
async fn test_late_joiner_replays_missed_events_in_order() {
    let url = spawn_server(common::test_app()).await;
    let mut early = connect(&url).await;
    let _ = recv_json(&mut early).await;

    for kind in ["fist", "palm", "ok"] {
        send_json(&mut early, gesture(kind)).await;
        let _ = recv_json(&mut early).await;
    }

    let mut late = connect(&url).await;
    let welcome = recv_json(&mut late).await;
    assert_eq!(welcome["head_sequence"], 3);

    send_json(&mut late, json!({ "type": "replay-request", "from_sequence": 1 })).await;
    for (expected_seq, expected_kind) in [(1, "fist"), (2, "palm"), (3, "ok")] {
        let replayed = recv_json(&mut late).await;
        assert_eq!(replayed["type"], "gesture-broadcast");
        assert_eq!(replayed["sequence"], expected_seq);
        assert_eq!(replayed["kind"], expected_kind);
    }
}

#[tokio::test]
async fn test_replay_below_retained_window_expires() {
    let mut config = common::test_config();
    config.replay_capacity = 3;
    let url = spawn_server(common::test_app_with(config)).await;

    let mut ws = connect(&url).await;
    let _ = recv_json(&mut ws).await;

    // Four submissions with capacity three: sequence 1 is evicted.
    for _ in 0..4 {
        send_json(&mut ws, gesture("two_fingers")).await;
        let _ = recv_json(&mut ws).await;
    }

    send_json(&mut ws, json!({ "type": "replay-request", "from_sequence": 1 })).await;
    let expired = recv_json(&mut ws).await;
    assert_eq!(expired["type"], "replay-expired");
    assert_eq!(expired["oldest_retained"], 2);

    // The oldest retained sequence is still replayable.
    send_json(&mut ws, json!({ "type": "replay-request", "from_sequence": 2 })).await;
    for expected_seq in [2, 3, 4] {
        let replayed = recv_json(&mut ws).await;
        assert_eq!(replayed["sequence"], expected_seq);
    }
}

#[tokio::test]
async fn test_disconnected_session_stops_receiving() {
    let url = spawn_server(common::test_app()).await;
    let mut staying = connect(&url).await;
    let mut leaving = connect(&url).await;
    let _ = recv_json(&mut staying).await;
    let _ = recv_json(&mut leaving).await;

    leaving.close(None).await.unwrap();

    // Delivery to the remaining session is unaffected by the departure.
    send_json(&mut staying, gesture("yo")).await;
    let broadcast = recv_json(&mut staying).await;
    assert_eq!(broadcast["type"], "gesture-broadcast");
    assert_eq!(broadcast["sequence"], 1);
}
