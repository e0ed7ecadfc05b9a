//! Index engine for Lattice.
//!
//! This crate provides:
//! - Disk manager for page-level file I/O
//! - Pager combining the buffer pool with the disk manager into the
//!   paging service the tree consumes
//! - A disk-backed B+ tree index over fixed-size keys, with point
//!   lookups, ordered range cursors, and bottom-up split/merge
//!   maintenance

pub mod btree;
mod disk;
mod pager;

pub use btree::{
    internal_capacity, leaf_capacity, BPlusTree, BytewiseComparator, IndexKey, Int64Comparator,
    KeyComparator, RecordId, TreeIterator,
};
pub use disk::{DiskManager, DiskManagerConfig};
pub use pager::Pager;
