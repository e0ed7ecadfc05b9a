//! Disk-backed B+ tree index.
//!
//! The tree maps fixed-size keys to fixed-size record IDs. Every node
//! lives on one buffer-pool page; the tree holds only page identifiers
//! and reaches all state through page guards:
//!
//! ```text
//!            [Header page]  root_pid
//!                  |
//!            [Internal ...]         routing slots (key, child)
//!            /      |     \
//!      [Leaf] -> [Leaf] -> [Leaf]   sorted (key, rid) + next_leaf chain
//! ```
//!
//! Lookups descend with read guards, releasing the parent before taking
//! the child. Inserts and removes record the descent path, then walk it
//! bottom-up under write guards: leaf splits carry a separator up,
//! deletions fold under-full nodes into a sibling and propagate the hole.
//! The leaf chain supports forward range scans via [`TreeIterator`].

pub mod debug;
pub mod iter;
pub mod key;
pub mod node;
pub mod record;
pub mod tree;

pub use iter::TreeIterator;
pub use key::{BytewiseComparator, IndexKey, Int64Comparator, KeyComparator};
pub use node::{internal_capacity, leaf_capacity};
pub use record::RecordId;
pub use tree::BPlusTree;
