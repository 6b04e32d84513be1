//! Policy layer (origin admission).
//!
//! Compiles the configured origin allow-list into a fast lookup structure and
//! evaluates per-request admission for the transport layer.

pub mod allowlist;
pub mod origin;

pub use allowlist::OriginAllowlist;
pub use origin::{Admission, OriginDecision, OriginPolicy, TransportKind};
