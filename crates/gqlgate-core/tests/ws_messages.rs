//! WebSocket subprotocol message tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::{json, Value};

use gqlgate_core::protocol::response::{GraphQLError, GraphQLResponse};
use gqlgate_core::protocol::ws::{ClientMessage, ServerMessage, Subprotocol};

#[test]
fn decode_transport_ws_subscribe() {
    let text = r#"{"id":"1","type":"subscribe","payload":{"query":"subscription { ping }"}}"#;
    let msg = ClientMessage::decode(Subprotocol::GraphqlTransportWs, text).unwrap();
    match msg {
        ClientMessage::Subscribe { id, request } => {
            assert_eq!(id, "1");
            assert_eq!(request.query_text(), Some("subscription { ping }"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn legacy_names_map_to_same_messages() {
    let start = r#"{"id":"a","type":"start","payload":{"query":"{ ping }"}}"#;
    assert!(matches!(
        ClientMessage::decode(Subprotocol::GraphqlWs, start).unwrap(),
        ClientMessage::Subscribe { .. }
    ));
    let stop = r#"{"id":"a","type":"stop"}"#;
    assert_eq!(
        ClientMessage::decode(Subprotocol::GraphqlWs, stop).unwrap(),
        ClientMessage::Complete { id: "a".into() }
    );
    let term = r#"{"type":"connection_terminate"}"#;
    assert_eq!(
        ClientMessage::decode(Subprotocol::GraphqlWs, term).unwrap(),
        ClientMessage::Terminate
    );
}

#[test]
fn cross_protocol_names_are_rejected() {
    let start = r#"{"id":"a","type":"start","payload":{"query":"{ ping }"}}"#;
    assert!(ClientMessage::decode(Subprotocol::GraphqlTransportWs, start).is_err());
    let subscribe = r#"{"id":"a","type":"subscribe","payload":{"query":"{ ping }"}}"#;
    assert!(ClientMessage::decode(Subprotocol::GraphqlWs, subscribe).is_err());
    assert!(ClientMessage::decode(Subprotocol::GraphqlWs, "not json").is_err());
    let no_id = r#"{"type":"subscribe","payload":{"query":"{ ping }"}}"#;
    assert!(ClientMessage::decode(Subprotocol::GraphqlTransportWs, no_id).is_err());
}

#[test]
fn encode_per_protocol() {
    let next = ServerMessage::Next {
        id: "1".into(),
        payload: GraphQLResponse::data(json!({ "ping": null })),
    };
    let v: Value = serde_json::from_str(&next.encode(Subprotocol::GraphqlTransportWs).unwrap()).unwrap();
    assert_eq!(v, json!({ "type": "next", "id": "1", "payload": { "data": { "ping": null } } }));
    let v: Value = serde_json::from_str(&next.encode(Subprotocol::GraphqlWs).unwrap()).unwrap();
    assert_eq!(v["type"], "data");

    let ka: Value = serde_json::from_str(&ServerMessage::KeepAlive.encode(Subprotocol::GraphqlWs).unwrap()).unwrap();
    assert_eq!(ka, json!({ "type": "ka" }));
    let ka: Value =
        serde_json::from_str(&ServerMessage::KeepAlive.encode(Subprotocol::GraphqlTransportWs).unwrap()).unwrap();
    assert_eq!(ka, json!({ "type": "ping" }));

    let err = ServerMessage::Error {
        id: "1".into(),
        errors: vec![GraphQLError::new("boom")],
    };
    let v: Value = serde_json::from_str(&err.encode(Subprotocol::GraphqlTransportWs).unwrap()).unwrap();
    assert!(v["payload"].is_array());
    let v: Value = serde_json::from_str(&err.encode(Subprotocol::GraphqlWs).unwrap()).unwrap();
    assert_eq!(v["payload"]["message"], "boom");

    assert!(ServerMessage::Pong { payload: None }.encode(Subprotocol::GraphqlWs).is_none());
}
