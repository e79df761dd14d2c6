//! Built-in pipeline stages
//!
//! General-purpose stages that cover the common shapes of a transformation:
//! 1. MapStage - Replace every item (fallible, 1:1)
//! 2. FilterStage - Drop items that fail a predicate
//! 3. FlatMapStage - Expand every item into zero or more items
//! 4. TakeStage - Pass the first N items of a run, then stop pulling

pub mod filter;
pub mod flat_map;
pub mod map;
pub mod take;

// Re-export stages
pub use filter::FilterStage;
pub use flat_map::FlatMapStage;
pub use map::MapStage;
pub use take::TakeStage;
