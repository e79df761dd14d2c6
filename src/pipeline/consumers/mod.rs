//! Built-in consumers
//!
//! - `CollectConsumer` - gather items into a `Vec`, optionally stopping early
//! - `CountConsumer` - count items
//! - `JsonLinesConsumer` - write one JSON line per item

pub mod collect;
pub mod json_lines;

pub use collect::{CollectConsumer, CountConsumer};
pub use json_lines::{JsonLinesConsumer, JsonLinesSummary};
