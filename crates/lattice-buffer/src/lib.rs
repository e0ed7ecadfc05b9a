//! Buffer pool management for Lattice.
//!
//! This crate provides in-memory page caching with:
//! - Fixed-size buffer pool with configurable page count
//! - Clock eviction policy for cache management
//! - Pin counting for concurrent access
//! - RAII page guards holding the per-frame data lock
//! - Dirty page tracking for write-back

mod frame;
mod page_table;
mod pool;
mod replacer;

pub use frame::{BufferFrame, FrameId};
pub use page_table::PageTable;
pub use pool::{
    BufferPool, BufferPoolConfig, BufferPoolStats, EvictedPage, PageReadGuard, PageWriteGuard,
};
pub use replacer::{ClockReplacer, Replacer};
