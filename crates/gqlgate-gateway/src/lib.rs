//! gqlgate gateway library entry.
//!
//! This crate wires the transport, origin policy, query caches and execution
//! engine into a cohesive gateway stack. It is intended to be consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod cache;
pub mod config;
pub mod engine;
pub mod monitor;
pub mod policy;
pub mod router;
pub mod services;
pub mod transport;
