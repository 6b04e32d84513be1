//! gqlgate core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the wire-level contracts (GraphQL request/response
//! bodies, persisted-query extensions, WebSocket subprotocol messages), the
//! operation document parser and the error surface shared by the gateway. It
//! intentionally carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `GqlGateError`/`Result` so production
//! processes do not crash on malformed input or bad traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{GqlGateError, Result};
