//! WebSocket transport.
//!
//! Responsibilities:
//! - Origin admission at upgrade time (denial => 403, no session)
//! - Subprotocol negotiation (graphql-transport-ws, legacy graphql-ws)
//! - Lifecycle: connection_init deadline, keep-alive ticks, close codes
//! - Per-operation tasks whose frames funnel through one outbound queue, so
//!   frames of an operation leave in the order they were produced
//!
//! State machine: Connecting -> (origin check) -> Rejected | Open -> Closed.

use std::collections::HashMap;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Duration, Instant, MissedTickBehavior};

use gqlgate_core::error::{GqlGateError, Result};
use gqlgate_core::protocol::document::OperationKind;
use gqlgate_core::protocol::request::GraphQLRequest;
use gqlgate_core::protocol::response::GraphQLError;
use gqlgate_core::protocol::ws::{ClientMessage, ServerMessage, Subprotocol};

use crate::app_state::AppState;
use crate::policy::{Admission, TransportKind};
use crate::transport::codec::{self, close_code, Inbound};
use crate::transport::header_str;
use crate::transport::http::HttpError;

const OUTBOUND_QUEUE: usize = 256;

/// Whether the request asks to switch to the WebSocket protocol.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    header_str(headers, header::UPGRADE).is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"))
}

/// First client-offered subprotocol we speak. Without one, the legacy
/// protocol is assumed.
pub fn select_subprotocol(headers: &HeaderMap) -> Subprotocol {
    headers
        .get_all(header::SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .find_map(Subprotocol::from_name)
        .unwrap_or(Subprotocol::GraphqlWs)
}

/// Gate and perform the upgrade.
pub fn upgrade(app: AppState, headers: &HeaderMap, ws: Option<WebSocketUpgrade>) -> Response {
    let origin = header_str(headers, header::ORIGIN);
    let admission = app.origin_policy().admit(
        origin,
        header_str(headers, header::HOST),
        TransportKind::Upgrade,
    );
    if admission == Admission::Reject {
        let err = GqlGateError::OriginNotAllowed(origin.unwrap_or_default().to_string());
        return HttpError::new(StatusCode::FORBIDDEN, err).into_response();
    }

    let Some(ws) = ws else {
        let err = GqlGateError::BadRequest("connection is not upgradable".into());
        return HttpError::new(StatusCode::BAD_REQUEST, err).into_response();
    };

    let proto = select_subprotocol(headers);
    let max_frame = app.cfg().limits.max_frame_bytes;
    // Echo only the protocol the session will speak; a client offering none
    // gets no header and the legacy protocol.
    ws.protocols([proto.as_str()])
        .max_message_size(max_frame)
        .max_frame_size(max_frame)
        .on_upgrade(move |socket| async move {
            tracing::debug!(protocol = proto.as_str(), "websocket open");
            if let Err(e) = run_session(app, proto, socket).await {
                tracing::debug!(error = %e, "websocket session ended with error");
            }
            tracing::debug!("websocket closed");
        })
}

/// Produced by operation tasks for the session loop.
enum Outbound {
    Frame(ServerMessage),
    /// Operation finished on its own; forget its handle.
    Finished(String),
}

struct SessionState {
    proto: Subprotocol,
    initialised: bool,
    operations: HashMap<String, JoinHandle<()>>,
}

impl Drop for SessionState {
    fn drop(&mut self) {
        for (_, h) in self.operations.drain() {
            h.abort();
        }
    }
}

enum Flow {
    Continue,
    Close(Message),
    Stop,
}

async fn run_session(app: AppState, proto: Subprotocol, socket: WebSocket) -> Result<()> {
    let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(OUTBOUND_QUEUE);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let gw = &app.cfg().gateway;
    let keepalive_every = Duration::from_millis(gw.keepalive_interval_ms);
    let mut keepalive = interval_at(Instant::now() + keepalive_every, keepalive_every);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let init_deadline = sleep(Duration::from_millis(gw.init_timeout_ms));
    tokio::pin!(init_deadline);

    let mut sess = SessionState {
        proto,
        initialised: false,
        operations: HashMap::new(),
    };

    loop {
        let flow = tokio::select! {
            // outbound writer
            Some(out) = out_rx.recv() => match out {
                Outbound::Frame(m) => {
                    send(&mut ws_tx, proto, &m).await?;
                    Flow::Continue
                }
                Outbound::Finished(id) => {
                    sess.operations.remove(&id);
                    Flow::Continue
                }
            },

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                match codec::decode(proto, msg) {
                    Ok(Inbound::Message(m)) => handle_message(&app, &mut sess, &out_tx, &mut ws_tx, m).await?,
                    Ok(Inbound::Ping(payload)) => {
                        ws_tx
                            .send(Message::Pong(payload))
                            .await
                            .map_err(|e| GqlGateError::Internal(format!("send failed: {e}")))?;
                        Flow::Continue
                    }
                    Ok(Inbound::Pong) => Flow::Continue,
                    Ok(Inbound::Close) => Flow::Stop,
                    Err(e) => Flow::Close(codec::close(close_code::BAD_REQUEST, e.to_string())),
                }
            }

            // keep-alive
            _ = keepalive.tick(), if sess.initialised => {
                send(&mut ws_tx, proto, &ServerMessage::KeepAlive).await?;
                Flow::Continue
            }

            // connection_init deadline
            _ = &mut init_deadline, if !sess.initialised => {
                Flow::Close(codec::close(close_code::INIT_TIMEOUT, "Connection initialisation timeout"))
            }
        };

        match flow {
            Flow::Continue => {}
            Flow::Stop => break,
            Flow::Close(frame) => {
                let _ = ws_tx.send(frame).await;
                break;
            }
        }
    }

    // Dropping the state aborts every in-flight operation.
    drop(sess);
    Ok(())
}

async fn send<S>(ws_tx: &mut S, proto: Subprotocol, msg: &ServerMessage) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let Some(frame) = codec::encode(proto, msg) else { return Ok(()) };
    ws_tx
        .send(frame)
        .await
        .map_err(|e| GqlGateError::Internal(format!("send failed: {e}")))
}

async fn handle_message<S>(
    app: &AppState,
    sess: &mut SessionState,
    out_tx: &mpsc::Sender<Outbound>,
    ws_tx: &mut S,
    msg: ClientMessage,
) -> Result<Flow>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let proto = sess.proto;
    match msg {
        ClientMessage::ConnectionInit { .. } => {
            if sess.initialised {
                return Ok(Flow::Close(codec::close(
                    close_code::TOO_MANY_INIT,
                    "Too many initialisation requests",
                )));
            }
            sess.initialised = true;
            send(ws_tx, proto, &ServerMessage::ConnectionAck).await?;
            if proto == Subprotocol::GraphqlWs {
                send(ws_tx, proto, &ServerMessage::KeepAlive).await?;
            }
            Ok(Flow::Continue)
        }
        ClientMessage::Subscribe { id, request } => {
            if !sess.initialised {
                return Ok(Flow::Close(codec::close(close_code::UNAUTHORIZED, "Unauthorized")));
            }
            if sess.operations.contains_key(&id) {
                return Ok(Flow::Close(codec::close(
                    close_code::SUBSCRIBER_EXISTS,
                    format!("Subscriber for {id} already exists"),
                )));
            }
            let handle = tokio::spawn(run_operation(app.clone(), id.clone(), request, out_tx.clone()));
            sess.operations.insert(id, handle);
            Ok(Flow::Continue)
        }
        ClientMessage::Complete { id } => {
            if let Some(h) = sess.operations.remove(&id) {
                h.abort();
                tracing::debug!(%id, "operation stopped by client");
            }
            Ok(Flow::Continue)
        }
        ClientMessage::Ping { payload } => {
            send(ws_tx, proto, &ServerMessage::Pong { payload }).await?;
            Ok(Flow::Continue)
        }
        ClientMessage::Pong => Ok(Flow::Continue),
        ClientMessage::Terminate => Ok(Flow::Stop),
    }
}

/// One operation's lifetime: results then `complete`, or a single `error`.
async fn run_operation(app: AppState, id: String, request: GraphQLRequest, out_tx: mpsc::Sender<Outbound>) {
    let engine = app.engine();

    let result = match engine.prepare(&request) {
        Ok(op) if op.kind() == OperationKind::Subscription => match engine.subscribe(&op) {
            Ok(mut stream) => {
                while let Some(resp) = stream.next().await {
                    let frame = ServerMessage::Next { id: id.clone(), payload: resp };
                    if out_tx.send(Outbound::Frame(frame)).await.is_err() {
                        return;
                    }
                }
                Ok(())
            }
            Err(e) => Err(e),
        },
        Ok(op) => {
            let resp = engine.execute(&op).await;
            let frame = ServerMessage::Next { id: id.clone(), payload: resp };
            if out_tx.send(Outbound::Frame(frame)).await.is_err() {
                return;
            }
            Ok(())
        }
        Err(e) => Err(e),
    };

    let last = match result {
        Ok(()) => ServerMessage::Complete { id: id.clone() },
        Err(e) => {
            tracing::debug!(%id, error = %e, "operation rejected");
            ServerMessage::Error {
                id: id.clone(),
                errors: vec![GraphQLError::from(&e)],
            }
        }
    };
    let _ = out_tx.send(Outbound::Frame(last)).await;
    let _ = out_tx.send(Outbound::Finished(id)).await;
}
