//! Process-wide monitoring values shared across request handlers.

pub mod timestamp;

pub use timestamp::SharedTimestamp;
