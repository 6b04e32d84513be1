//! Decode-once codec for the WebSocket transport.
//!
//! - Text frames => protocol-neutral `ClientMessage`
//! - Binary frames => same, if the bytes are UTF-8 JSON
//! - Ping/Pong/Close are surfaced for lifecycle management

use std::borrow::Cow;

use axum::extract::ws::{CloseFrame, Message};
use gqlgate_core::{
    error::{GqlGateError, Result},
    protocol::ws::{ClientMessage, ServerMessage, Subprotocol},
};

#[derive(Debug)]
pub enum Inbound {
    Message(ClientMessage),
    Ping(Vec<u8>),
    Pong,
    Close,
}

pub fn decode(proto: Subprotocol, msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => Ok(Inbound::Message(ClientMessage::decode(proto, &s)?)),
        Message::Binary(b) => {
            let s = std::str::from_utf8(&b)
                .map_err(|e| GqlGateError::BadRequest(format!("binary frame is not utf8: {e}")))?;
            Ok(Inbound::Message(ClientMessage::decode(proto, s)?))
        }
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

/// `None` when the protocol has no frame for the message.
pub fn encode(proto: Subprotocol, msg: &ServerMessage) -> Option<Message> {
    msg.encode(proto).map(Message::Text)
}

/// Close codes of the graphql-transport-ws protocol (also used for legacy).
pub mod close_code {
    pub const BAD_REQUEST: u16 = 4400;
    pub const UNAUTHORIZED: u16 = 4401;
    pub const INIT_TIMEOUT: u16 = 4408;
    pub const SUBSCRIBER_EXISTS: u16 = 4409;
    pub const TOO_MANY_INIT: u16 = 4429;
}

const MAX_CLOSE_REASON: usize = 123;

pub fn close(code: u16, reason: impl Into<String>) -> Message {
    let mut reason: String = reason.into();
    // Control frame payloads are capped at 125 bytes, 2 of which are the code.
    if reason.len() > MAX_CLOSE_REASON {
        let mut cut = MAX_CLOSE_REASON;
        while !reason.is_char_boundary(cut) {
            cut -= 1;
        }
        reason.truncate(cut);
    }
    Message::Close(Some(CloseFrame {
        code,
        reason: Cow::Owned(reason),
    }))
}
