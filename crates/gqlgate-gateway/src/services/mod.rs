//! Built-in schema services.

pub mod ping;

pub use ping::PingHub;
