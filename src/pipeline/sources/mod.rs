//! Built-in producers
//!
//! - `IterSource` / `TrySource` - items from a factory closure, fresh per traversal
//! - `EmptySource` - no items
//! - `ConcatSource` - several producers back to back
//! - `JsonLinesSource` - one JSON value per line of a file

pub mod concat;
pub mod iter;
pub mod json_lines;

pub use concat::ConcatSource;
pub use iter::{EmptySource, IterSource, TrySource};
pub use json_lines::JsonLinesSource;
