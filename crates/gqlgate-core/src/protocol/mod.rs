//! Protocol primitives.
//!
//! - `request`/`response`: GraphQL over HTTP bodies
//! - `apq`: automatic persisted query extension (hash + version)
//! - `document`: operation document parser (selection sets only)
//! - `ws`: WebSocket subprotocol messages (graphql-transport-ws, graphql-ws)

pub mod apq;
pub mod document;
pub mod request;
pub mod response;
pub mod ws;
