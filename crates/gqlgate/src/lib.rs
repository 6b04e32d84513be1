//! Top-level facade crate for gqlgate.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use gqlgate_core::*;
}

pub mod gateway {
    pub use gqlgate_gateway::*;
}
