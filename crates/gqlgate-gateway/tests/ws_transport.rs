#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use gqlgate_gateway::app_state::AppState;
use gqlgate_gateway::config::GatewayConfig;
use gqlgate_gateway::router::build_router;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_gateway(cfg: GatewayConfig) -> SocketAddr {
    spawn_with_state(cfg).await.0
}

async fn spawn_with_state(cfg: GatewayConfig) -> (SocketAddr, AppState) {
    let state = AppState::new(cfg).unwrap();
    let app = build_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, origin: Option<&str>, protocol: &str) -> Result<Client, WsError> {
    let mut req = format!("ws://{addr}/query").into_client_request().unwrap();
    if let Some(o) = origin {
        req.headers_mut().insert("Origin", HeaderValue::from_str(o).unwrap());
    }
    req.headers_mut()
        .insert("Sec-WebSocket-Protocol", HeaderValue::from_str(protocol).unwrap());
    connect_async(req).await.map(|(ws, _)| ws)
}

async fn send(ws: &mut Client, v: Value) {
    ws.send(Message::Text(v.to_string())).await.unwrap();
}

/// Next JSON text frame, skipping keep-alives.
async fn recv(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(s) = msg {
            let v: Value = serde_json::from_str(&s).unwrap();
            if v["type"] == "ping" || v["type"] == "ka" {
                continue;
            }
            return v;
        }
    }
}

/// Code of the close frame the server sends next, skipping text frames.
async fn close_code(ws: &mut Client) -> u16 {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for close")
            .expect("stream ended")
            .unwrap();
        match msg {
            Message::Close(Some(frame)) => return u16::from(frame.code),
            Message::Text(_) => continue,
            other => panic!("expected close, got {other:?}"),
        }
    }
}

async fn init(ws: &mut Client) {
    send(ws, json!({ "type": "connection_init", "payload": {} })).await;
    assert_eq!(recv(ws).await["type"], "connection_ack");
}

#[tokio::test]
async fn denied_origin_never_opens_a_socket() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    match connect(addr, Some("http://evil.example"), "graphql-transport-ws").await {
        Err(WsError::Http(resp)) => assert_eq!(resp.status(), 403),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("upgrade must be refused"),
    }
}

#[tokio::test]
async fn missing_origin_is_admitted() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    init(&mut ws).await;
}

#[tokio::test]
async fn subscription_receives_pings_from_mutations() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut ws = connect(addr, Some("http://localhost:3000"), "graphql-transport-ws")
        .await
        .unwrap();
    init(&mut ws).await;

    send(
        &mut ws,
        json!({ "id": "sub", "type": "subscribe", "payload": { "query": "subscription PingSubscription { ping }" } }),
    )
    .await;
    // Give the subscription task a moment to attach to the fan-out.
    tokio::time::sleep(Duration::from_millis(100)).await;

    send(
        &mut ws,
        json!({ "id": "m1", "type": "subscribe", "payload": { "query": "mutation { ping }" } }),
    )
    .await;

    let mut mutation_value = None;
    let mut subscription_value = None;
    let mut mutation_completed = false;
    while mutation_value.is_none() || subscription_value.is_none() || !mutation_completed {
        let v = recv(&mut ws).await;
        match (v["type"].as_str().unwrap(), v["id"].as_str().unwrap()) {
            ("next", "m1") => mutation_value = Some(v["payload"]["data"]["ping"].clone()),
            ("complete", "m1") => {
                assert!(mutation_value.is_some(), "complete must follow the result");
                mutation_completed = true;
            }
            ("next", "sub") => subscription_value = Some(v["payload"]["data"]["ping"].clone()),
            other => panic!("unexpected frame: {other:?} {v}"),
        }
    }
    assert_eq!(mutation_value, subscription_value);

    // Stopping the subscription is silent.
    send(&mut ws, json!({ "id": "sub", "type": "complete" })).await;
    send(&mut ws, json!({ "id": "q", "type": "subscribe", "payload": { "query": "{ ping }" } })).await;
    let v = recv(&mut ws).await;
    assert_eq!(v["type"], "next");
    assert_eq!(v["id"], "q");
    assert_eq!(v["payload"]["data"]["ping"], mutation_value.unwrap());
}

#[tokio::test]
async fn operation_errors_are_reported_per_id() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    init(&mut ws).await;

    send(&mut ws, json!({ "id": "bad", "type": "subscribe", "payload": { "query": "{ ping" } })).await;
    let v = recv(&mut ws).await;
    assert_eq!(v["type"], "error");
    assert_eq!(v["id"], "bad");
    assert_eq!(v["payload"][0]["extensions"]["code"], "GRAPHQL_PARSE_FAILED");
}

#[tokio::test]
async fn subscribe_before_init_closes_4401() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    send(&mut ws, json!({ "id": "1", "type": "subscribe", "payload": { "query": "{ ping }" } })).await;
    assert_eq!(close_code(&mut ws).await, 4401);
}

#[tokio::test]
async fn malformed_frame_closes_4400() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    init(&mut ws).await;
    ws.send(Message::Text("not json".into())).await.unwrap();
    assert_eq!(close_code(&mut ws).await, 4400);
}

#[tokio::test]
async fn missing_init_times_out_with_4408() {
    let mut cfg = GatewayConfig::default();
    cfg.gateway.init_timeout_ms = 1000;
    let addr = spawn_gateway(cfg).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    assert_eq!(close_code(&mut ws).await, 4408);
}

#[tokio::test]
async fn duplicate_operation_id_closes_4409() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    init(&mut ws).await;

    let sub = json!({ "id": "s", "type": "subscribe", "payload": { "query": "subscription { ping }" } });
    send(&mut ws, sub.clone()).await;
    send(&mut ws, sub).await;
    assert_eq!(close_code(&mut ws).await, 4409);
}

#[tokio::test]
async fn repeated_init_closes_4429() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    init(&mut ws).await;
    send(&mut ws, json!({ "type": "connection_init" })).await;
    assert_eq!(close_code(&mut ws).await, 4429);
}

#[tokio::test]
async fn oversized_message_drops_the_connection() {
    let mut cfg = GatewayConfig::default();
    cfg.limits.max_frame_bytes = 1024;
    let addr = spawn_gateway(cfg).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    init(&mut ws).await;

    let query = format!("{{ ping {} }}", "#".repeat(4096));
    let _ = ws
        .send(Message::Text(json!({ "id": "1", "type": "subscribe", "payload": { "query": query } }).to_string()))
        .await;

    // No result ever comes back; the stream ends or errors instead.
    loop {
        match timeout(Duration::from_secs(5), ws.next()).await.unwrap() {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
            Some(Ok(Message::Text(s))) => {
                let v: Value = serde_json::from_str(&s).unwrap();
                assert_ne!(v["type"], "next", "oversized message must not execute");
            }
            Some(Ok(_)) => {}
        }
    }
}

#[tokio::test]
async fn first_offered_subprotocol_wins() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut req = format!("ws://{addr}/query").into_client_request().unwrap();
    req.headers_mut().insert(
        "Sec-WebSocket-Protocol",
        HeaderValue::from_static("graphql-ws, graphql-transport-ws"),
    );
    let (mut ws, resp) = connect_async(req).await.unwrap();
    assert_eq!(resp.headers()["sec-websocket-protocol"], "graphql-ws");
    init(&mut ws).await;

    send(&mut ws, json!({ "id": "1", "type": "start", "payload": { "query": "{ ping }" } })).await;
    let v = recv(&mut ws).await;
    assert_eq!(v["type"], "data");
    assert_eq!(v["id"], "1");
}

#[tokio::test]
async fn disconnect_releases_subscriptions() {
    let (addr, state) = spawn_with_state(GatewayConfig::default()).await;
    let hub = state.ping_hub();
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    init(&mut ws).await;

    for id in ["a", "b"] {
        send(
            &mut ws,
            json!({ "id": id, "type": "subscribe", "payload": { "query": "subscription { ping }" } }),
        )
        .await;
    }
    wait_for(|| hub.subscriber_count() == 2).await;

    ws.close(None).await.unwrap();
    drop(ws);
    wait_for(|| hub.subscriber_count() == 0).await;
}

async fn wait_for(mut cond: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn keepalive_ticks_after_init() {
    let mut cfg = GatewayConfig::default();
    cfg.gateway.keepalive_interval_ms = 1000;
    let addr = spawn_gateway(cfg).await;
    let mut ws = connect(addr, None, "graphql-transport-ws").await.unwrap();
    init(&mut ws).await;

    let msg = timeout(Duration::from_secs(3), ws.next()).await.unwrap().unwrap().unwrap();
    let Message::Text(s) = msg else { panic!("expected text frame") };
    let v: Value = serde_json::from_str(&s).unwrap();
    assert_eq!(v, json!({ "type": "ping" }));

    // Client answers; the server stays quiet.
    send(&mut ws, json!({ "type": "pong" })).await;
}

#[tokio::test]
async fn legacy_protocol_round_trip() {
    let addr = spawn_gateway(GatewayConfig::default()).await;
    let mut ws = connect(addr, Some("http://localhost:8080"), "graphql-ws").await.unwrap();

    send(&mut ws, json!({ "type": "connection_init", "payload": {} })).await;
    let ack = recv(&mut ws).await;
    assert_eq!(ack["type"], "connection_ack");

    send(&mut ws, json!({ "id": "1", "type": "start", "payload": { "query": "mutation { ping }" } })).await;
    let v = recv(&mut ws).await;
    assert_eq!(v["type"], "data");
    assert!(v["payload"]["data"]["ping"].is_string());
    assert_eq!(recv(&mut ws).await, json!({ "type": "complete", "id": "1" }));

    send(&mut ws, json!({ "type": "connection_terminate" })).await;
}
