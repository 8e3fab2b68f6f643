//! End-to-end test over a real socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use othello_match::{AppState, MatchCoordinator, ServerConfig, router, server};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Socket closed")
            .expect("Socket read failed");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("Server sent JSON");
        }
    }
}

async fn send(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("Socket write failed");
}

#[tokio::test]
async fn test_health_route() {
    let coordinator = Arc::new(MatchCoordinator::new(8, 8).unwrap());
    let app = router(AppState::new(coordinator, Duration::from_secs(55)));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_full_game_flow_over_websocket() {
    let config = ServerConfig::default().with_port(0);
    let (addr, handle) = server::start(&config).await.expect("Server starts");
    let url = format!("ws://{addr}/ws");

    let (mut a, _) = connect_async(url.as_str()).await.expect("First client connects");
    assert_eq!(next_json(&mut a).await, json!({"waiting": {"true": 0, "false": 0}}));

    let (mut b, _) = connect_async(url.as_str()).await.expect("Second client connects");
    assert_eq!(next_json(&mut b).await, json!({"waiting": {"true": 0, "false": 0}}));

    send(&mut a, json!({"joinAs": true})).await;
    assert_eq!(next_json(&mut a).await, json!({"color": true}));
    assert_eq!(next_json(&mut a).await, json!({"opponentConnected": false}));
    assert_eq!(next_json(&mut a).await, json!({"waiting": {"true": 0, "false": 1}}));
    assert_eq!(next_json(&mut b).await, json!({"waiting": {"true": 0, "false": 1}}));

    send(&mut b, json!({"joinAs": false})).await;
    assert_eq!(next_json(&mut b).await, json!({"color": false}));
    assert_eq!(next_json(&mut b).await, json!({"opponentConnected": true}));
    assert_eq!(next_json(&mut b).await, json!({"waiting": {"true": 0, "false": 0}}));
    // Seating the second side re-announces both colours.
    assert_eq!(next_json(&mut a).await, json!({"color": true}));
    assert_eq!(next_json(&mut a).await, json!({"opponentConnected": true}));
    assert_eq!(next_json(&mut a).await, json!({"waiting": {"true": 0, "false": 0}}));

    // Garbage is ignored and the socket stays usable.
    a.send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();
    send(&mut a, json!({"move": 19})).await;
    assert_eq!(next_json(&mut b).await, json!({"move": 19, "player": true}));

    a.close(None).await.unwrap();
    assert_eq!(next_json(&mut b).await, json!({"opponentConnected": false}));
    assert_eq!(next_json(&mut b).await, json!({"gameEnd": "opponentDisconnect"}));
    assert_eq!(next_json(&mut b).await, json!({"waiting": {"true": 0, "false": 0}}));

    handle.abort();
}
