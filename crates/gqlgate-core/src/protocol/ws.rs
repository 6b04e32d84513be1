//! WebSocket subprotocol messages.
//!
//! Two subprotocols are spoken over the duplex transport:
//! - `graphql-transport-ws` (current): `subscribe`/`next`/`complete`, `ping`/`pong`
//! - `graphql-ws` (legacy subscriptions-transport-ws): `start`/`data`/`stop`, `ka`
//!
//! Inbound frames are decoded into a protocol-neutral [`ClientMessage`];
//! outbound [`ServerMessage`]s are encoded per protocol. The raw `payload` is
//! kept as `RawValue` so only messages that carry a request pay for parsing it.

use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{json, Value};

use crate::error::{GqlGateError, Result};
use crate::protocol::request::GraphQLRequest;
use crate::protocol::response::{GraphQLError, GraphQLResponse};

/// Negotiated subprotocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subprotocol {
    GraphqlTransportWs,
    GraphqlWs,
}

impl Subprotocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Subprotocol::GraphqlTransportWs => "graphql-transport-ws",
            Subprotocol::GraphqlWs => "graphql-ws",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim() {
            "graphql-transport-ws" => Some(Subprotocol::GraphqlTransportWs),
            "graphql-ws" => Some(Subprotocol::GraphqlWs),
            _ => None,
        }
    }
}

/// Raw frame envelope (`type` + optional `id`/`payload`).
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    payload: Option<Box<RawValue>>,
}

/// Protocol-neutral inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    ConnectionInit { payload: Option<Value> },
    Subscribe { id: String, request: GraphQLRequest },
    Complete { id: String },
    Ping { payload: Option<Value> },
    Pong,
    Terminate,
}

impl ClientMessage {
    pub fn decode(proto: Subprotocol, text: &str) -> Result<Self> {
        let raw: RawMessage = serde_json::from_str(text)
            .map_err(|e| GqlGateError::BadRequest(format!("invalid message json: {e}")))?;

        let msg = match (proto, raw.msg_type.as_str()) {
            (_, "connection_init") => ClientMessage::ConnectionInit {
                payload: parse_payload(raw.payload.as_deref())?,
            },
            (Subprotocol::GraphqlTransportWs, "subscribe") | (Subprotocol::GraphqlWs, "start") => {
                let id = require_id(raw.id)?;
                let payload = raw
                    .payload
                    .ok_or_else(|| GqlGateError::BadRequest("subscribe requires payload".into()))?;
                let request: GraphQLRequest = serde_json::from_str(payload.get())
                    .map_err(|e| GqlGateError::BadRequest(format!("invalid subscribe payload: {e}")))?;
                ClientMessage::Subscribe { id, request }
            }
            (Subprotocol::GraphqlTransportWs, "complete") | (Subprotocol::GraphqlWs, "stop") => {
                ClientMessage::Complete { id: require_id(raw.id)? }
            }
            (Subprotocol::GraphqlTransportWs, "ping") => ClientMessage::Ping {
                payload: parse_payload(raw.payload.as_deref())?,
            },
            (Subprotocol::GraphqlTransportWs, "pong") => ClientMessage::Pong,
            (Subprotocol::GraphqlWs, "connection_terminate") => ClientMessage::Terminate,
            (_, other) => {
                return Err(GqlGateError::BadRequest(format!(
                    "unexpected message type {other:?} for {}",
                    proto.as_str()
                )))
            }
        };
        Ok(msg)
    }
}

fn require_id(id: Option<String>) -> Result<String> {
    id.filter(|s| !s.is_empty())
        .ok_or_else(|| GqlGateError::BadRequest("message requires id".into()))
}

fn parse_payload(raw: Option<&RawValue>) -> Result<Option<Value>> {
    raw.map(|r| serde_json::from_str(r.get()))
        .transpose()
        .map_err(|e| GqlGateError::BadRequest(format!("invalid payload: {e}")))
}

/// Outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    ConnectionAck,
    Next { id: String, payload: GraphQLResponse },
    Error { id: String, errors: Vec<GraphQLError> },
    Complete { id: String },
    Pong { payload: Option<Value> },
    /// Keep-alive tick.
    KeepAlive,
}

impl ServerMessage {
    /// Encode for the negotiated protocol. `None` means the protocol has no
    /// frame for this message and nothing should be sent.
    pub fn encode(&self, proto: Subprotocol) -> Option<String> {
        let v = match (self, proto) {
            (ServerMessage::ConnectionAck, _) => json!({ "type": "connection_ack" }),
            (ServerMessage::Next { id, payload }, Subprotocol::GraphqlTransportWs) => {
                json!({ "type": "next", "id": id, "payload": payload })
            }
            (ServerMessage::Next { id, payload }, Subprotocol::GraphqlWs) => {
                json!({ "type": "data", "id": id, "payload": payload })
            }
            (ServerMessage::Error { id, errors }, Subprotocol::GraphqlTransportWs) => {
                json!({ "type": "error", "id": id, "payload": errors })
            }
            (ServerMessage::Error { id, errors }, Subprotocol::GraphqlWs) => {
                let first = errors.first().cloned().unwrap_or_else(|| GraphQLError::new("unknown error"));
                json!({ "type": "error", "id": id, "payload": first })
            }
            (ServerMessage::Complete { id }, _) => json!({ "type": "complete", "id": id }),
            (ServerMessage::Pong { payload }, Subprotocol::GraphqlTransportWs) => match payload {
                Some(p) => json!({ "type": "pong", "payload": p }),
                None => json!({ "type": "pong" }),
            },
            (ServerMessage::Pong { .. }, Subprotocol::GraphqlWs) => return None,
            (ServerMessage::KeepAlive, Subprotocol::GraphqlTransportWs) => json!({ "type": "ping" }),
            (ServerMessage::KeepAlive, Subprotocol::GraphqlWs) => json!({ "type": "ka" }),
        };
        Some(v.to_string())
    }
}
