//! Tabular plumbing: partitioning inputs and merging chunk results.

pub mod frame;
pub mod merge;
pub mod partition;

pub use frame::records_to_frame;
pub use merge::{column_schema, merge_frames};
pub use partition::{chunk_bounds, partition, KeyBatch};
