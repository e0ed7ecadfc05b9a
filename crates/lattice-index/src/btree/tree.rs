//! The B+ tree operator.
//!
//! A stateless façade over the pager: the tree owns only page identifiers
//! and performs every read and structural modification through page
//! guards. Mutating operations run in two phases — a read-guarded descent
//! that records the root-to-leaf path, then a bottom-up modify phase that
//! re-acquires write guards level by level. The header page's write guard
//! is held across the whole modification so root swaps are atomic with
//! respect to other mutators.

use super::key::{IndexKey, KeyComparator};
use super::node::{
    internal_capacity, leaf_capacity, HeaderNode, HeaderNodeMut, InternalNode, InternalNodeMut,
    LeafNode, LeafNodeMut,
};
use super::record::RecordId;
use crate::pager::Pager;
use lattice_common::page::{PageHeader, PageId, PageType};
use lattice_common::{BTreeConfig, LatticeError, Result};
use log::debug;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use super::iter::TreeIterator;

/// A disk-backed B+ tree index mapping fixed-size keys to record IDs.
///
/// Parameterised by the key width `N` and the comparator `C`. Fan-out
/// limits are fixed at construction; `min` occupancy derives from them.
pub struct BPlusTree<const N: usize, C: KeyComparator<N>> {
    /// Index name, used in log output.
    name: String,
    /// Page holding the root pointer.
    header_pid: PageId,
    /// Paging service all node accesses go through.
    pager: Arc<Pager>,
    /// Total order over keys.
    comparator: C,
    /// Maximum entries per leaf.
    leaf_max: u16,
    /// Maximum child slots per internal node.
    internal_max: u16,
}

impl<const N: usize, C: KeyComparator<N>> BPlusTree<N, C> {
    /// Creates a tree over an existing header page and resets it to the
    /// empty state (`root_pid = INVALID`).
    ///
    /// Fan-outs below 3 cannot satisfy the post-split minimum occupancy,
    /// and fan-outs past the page capacity for this key width cannot be
    /// stored; both are rejected.
    pub fn new(
        name: impl Into<String>,
        header_pid: PageId,
        pager: Arc<Pager>,
        comparator: C,
        leaf_max: u16,
        internal_max: u16,
    ) -> Result<Self> {
        if leaf_max < 3 || leaf_max as usize > leaf_capacity(N) {
            return Err(LatticeError::InvalidParameter {
                name: "leaf_max".to_string(),
                value: leaf_max.to_string(),
            });
        }
        if internal_max < 3 || internal_max as usize > internal_capacity(N) {
            return Err(LatticeError::InvalidParameter {
                name: "internal_max".to_string(),
                value: internal_max.to_string(),
            });
        }

        let mut guard = pager.fetch_write(header_pid)?;
        HeaderNodeMut::init(guard.data_mut(), header_pid);
        drop(guard);

        Ok(Self {
            name: name.into(),
            header_pid,
            pager,
            comparator,
            leaf_max,
            internal_max,
        })
    }

    /// Creates a tree with the fan-outs taken from a [`BTreeConfig`].
    pub fn with_config(
        name: impl Into<String>,
        header_pid: PageId,
        pager: Arc<Pager>,
        comparator: C,
        config: BTreeConfig,
    ) -> Result<Self> {
        Self::new(
            name,
            header_pid,
            pager,
            comparator,
            config.leaf_max,
            config.internal_max,
        )
    }

    /// Returns the index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pager this tree operates against.
    pub fn pager(&self) -> &Arc<Pager> {
        &self.pager
    }

    /// Returns true if the tree holds no keys.
    pub fn is_empty(&self) -> Result<bool> {
        let guard = self.pager.fetch_read(self.header_pid)?;
        let header = HeaderNode::from_page(guard.data())?;
        Ok(!header.root_pid().is_valid())
    }

    /// Returns the current root page id (INVALID for an empty tree).
    pub fn root_page_id(&self) -> Result<PageId> {
        let guard = self.pager.fetch_read(self.header_pid)?;
        let header = HeaderNode::from_page(guard.data())?;
        Ok(header.root_pid())
    }

    // =======================================================================
    // Search
    // =======================================================================

    /// Point lookup. Returns the record ID stored under `key`, if any.
    pub fn get(&self, key: &IndexKey<N>) -> Result<Option<RecordId>> {
        let header_guard = self.pager.fetch_read(self.header_pid)?;
        let root_pid = HeaderNode::from_page(header_guard.data())?.root_pid();
        if !root_pid.is_valid() {
            return Ok(None);
        }

        let mut guard = self.pager.fetch_read(root_pid)?;
        drop(header_guard);

        while PageHeader::page_type_of(guard.data()) == PageType::BTreeInternal {
            let child = {
                let node = InternalNode::<N>::from_page(guard.data())?;
                node.child_at(self.route_slot(&node, key))
            };
            drop(guard);
            guard = self.pager.fetch_read(child)?;
        }

        let leaf = LeafNode::<N>::from_page(guard.data())?;
        let slot = self.find_leaf_slot(&leaf, key);
        if slot >= 0
            && self
                .comparator
                .compare(&leaf.key_at(slot as usize), key)
                == Ordering::Equal
        {
            return Ok(Some(leaf.value_at(slot as usize)));
        }
        Ok(None)
    }

    // =======================================================================
    // Insert
    // =======================================================================

    /// Inserts a key/record pair. Returns false (and changes nothing) if
    /// the key is already present.
    pub fn insert(&self, key: IndexKey<N>, rid: RecordId) -> Result<bool> {
        let mut header_guard = self.pager.fetch_write(self.header_pid)?;
        let mut root_pid = HeaderNode::from_page(header_guard.data())?.root_pid();

        if !root_pid.is_valid() {
            let (pid, mut guard) = self.pager.allocate_page()?;
            LeafNodeMut::<N>::init(guard.data_mut(), pid, self.leaf_max);
            drop(guard);
            HeaderNodeMut::from_page(header_guard.data_mut())?.set_root_pid(pid);
            debug!("{}: bootstrapped root leaf {}", self.name, pid);
            root_pid = pid;
        }

        // Phase 1: record the root-to-leaf path under read guards
        let mut path: Vec<PageId> = vec![root_pid];
        let mut guard = self.pager.fetch_read(root_pid)?;
        while PageHeader::page_type_of(guard.data()) == PageType::BTreeInternal {
            let child = {
                let node = InternalNode::<N>::from_page(guard.data())?;
                node.child_at(self.route_slot(&node, &key))
            };
            path.push(child);
            drop(guard);
            guard = self.pager.fetch_read(child)?;
        }
        {
            let leaf = LeafNode::<N>::from_page(guard.data())?;
            let slot = self.find_leaf_slot(&leaf, &key);
            if slot >= 0
                && self
                    .comparator
                    .compare(&leaf.key_at(slot as usize), &key)
                    == Ordering::Equal
            {
                return Ok(false);
            }
        }
        drop(guard);

        // Phase 2: bottom-up insertion, splits propagate via the carry
        let mut carry_key = key;
        let mut carry_pid = PageId::INVALID;

        for i in (0..path.len()).rev() {
            let pid = path[i];

            if i == path.len() - 1 {
                // Leaf level: insert the user entry
                let mut guard = self.pager.fetch_write(pid)?;
                let mut leaf = LeafNodeMut::<N>::from_page(guard.data_mut())?;

                let size = leaf.size();
                let mut pos = size;
                for j in 0..size {
                    if self.comparator.compare(&leaf.key_at(j), &key) == Ordering::Greater {
                        pos = j;
                        break;
                    }
                }
                leaf.insert_at(pos, &key, rid);
                if leaf.size() <= leaf.max_size() {
                    return Ok(true);
                }

                // Split: new right sibling takes the upper half
                let (new_pid, mut new_guard) = self.pager.allocate_page()?;
                let mut new_leaf = LeafNodeMut::<N>::init(new_guard.data_mut(), new_pid, self.leaf_max);
                new_leaf.set_next_leaf(leaf.next_leaf());
                leaf.set_next_leaf(new_pid);
                leaf.split_into(&mut new_leaf);
                carry_key = new_leaf.key_at(0);
                carry_pid = new_pid;
                debug!("{}: split leaf {} -> {}", self.name, pid, new_pid);

                if i == 0 {
                    // The root leaf split: grow the tree by one level
                    let (new_root_pid, mut root_guard) = self.pager.allocate_page()?;
                    let mut root = InternalNodeMut::<N>::init(
                        root_guard.data_mut(),
                        new_root_pid,
                        self.internal_max,
                    );
                    root.set_slot(0, &leaf.key_at(0), pid);
                    root.set_slot(1, &carry_key, carry_pid);
                    root.set_size(2);
                    drop(root_guard);
                    HeaderNodeMut::from_page(header_guard.data_mut())?.set_root_pid(new_root_pid);
                    debug!("{}: new root {} over split leaf", self.name, new_root_pid);
                    return Ok(true);
                }
            } else {
                // Internal level: insert the carried separator
                let mut guard = self.pager.fetch_write(pid)?;
                let mut node = InternalNodeMut::<N>::from_page(guard.data_mut())?;

                let size = node.size();
                let mut pos = size;
                for j in 0..size {
                    if self.comparator.compare(&node.key_at(j), &carry_key) == Ordering::Greater {
                        pos = j;
                        break;
                    }
                }
                node.insert_at(pos, &carry_key, carry_pid);
                if node.size() <= node.max_size() {
                    return Ok(true);
                }

                let (new_pid, mut new_guard) = self.pager.allocate_page()?;
                let mut new_node =
                    InternalNodeMut::<N>::init(new_guard.data_mut(), new_pid, self.internal_max);
                node.split_into(&mut new_node);
                carry_key = new_node.key_at(0);
                carry_pid = new_pid;
                debug!("{}: split internal {} -> {}", self.name, pid, new_pid);

                if i == 0 {
                    let (new_root_pid, mut root_guard) = self.pager.allocate_page()?;
                    let mut root = InternalNodeMut::<N>::init(
                        root_guard.data_mut(),
                        new_root_pid,
                        self.internal_max,
                    );
                    root.set_slot(0, &node.key_at(0), pid);
                    root.set_slot(1, &carry_key, carry_pid);
                    root.set_size(2);
                    drop(root_guard);
                    HeaderNodeMut::from_page(header_guard.data_mut())?.set_root_pid(new_root_pid);
                    debug!("{}: new root {} over split internal", self.name, new_root_pid);
                    return Ok(true);
                }
            }
        }

        Ok(true)
    }

    // =======================================================================
    // Remove
    // =======================================================================

    /// Removes a key. Absent keys (and the empty tree) are a no-op.
    pub fn remove(&self, key: &IndexKey<N>) -> Result<()> {
        let mut header_guard = self.pager.fetch_write(self.header_pid)?;
        let root_pid = HeaderNode::from_page(header_guard.data())?.root_pid();
        if !root_pid.is_valid() {
            return Ok(());
        }

        // Phase 1: record (pid, routing slot in parent); the leaf entry
        // records the slot of the key itself
        let mut path: Vec<(PageId, usize)> = vec![(root_pid, 0)];
        let mut guard = self.pager.fetch_read(root_pid)?;
        while PageHeader::page_type_of(guard.data()) == PageType::BTreeInternal {
            let (slot, child) = {
                let node = InternalNode::<N>::from_page(guard.data())?;
                let slot = self.route_slot(&node, key);
                (slot, node.child_at(slot))
            };
            if let Some(last) = path.last_mut() {
                last.1 = slot;
            }
            path.push((child, 0));
            drop(guard);
            guard = self.pager.fetch_read(child)?;
        }
        {
            let leaf = LeafNode::<N>::from_page(guard.data())?;
            let slot = self.find_leaf_slot(&leaf, key);
            if slot < 0
                || self
                    .comparator
                    .compare(&leaf.key_at(slot as usize), key)
                    != Ordering::Equal
            {
                return Ok(());
            }
            if let Some(last) = path.last_mut() {
                last.1 = slot as usize;
            }
        }
        drop(guard);

        // Phase 2: bottom-up removal; merges propagate the hole upward
        for i in (0..path.len()).rev() {
            let (pid, slot) = path[i];

            if i == path.len() - 1 {
                // Leaf level
                let mut guard = self.pager.fetch_write(pid)?;
                let mut leaf = LeafNodeMut::<N>::from_page(guard.data_mut())?;
                leaf.remove_at(slot);
                if leaf.size() >= leaf.min_size() {
                    return Ok(());
                }

                if i == 0 {
                    // A root leaf may run under-full; only empty collapses it
                    if leaf.size() == 0 {
                        HeaderNodeMut::from_page(header_guard.data_mut())?
                            .set_root_pid(PageId::INVALID);
                        drop(guard);
                        self.pager.delete_page(pid)?;
                        debug!("{}: tree emptied, root leaf {} freed", self.name, pid);
                    }
                    return Ok(());
                }

                let (parent_pid, pos) = path[i - 1];
                let mut parent_guard = self.pager.fetch_write(parent_pid)?;
                let mut parent = InternalNodeMut::<N>::from_page(parent_guard.data_mut())?;

                if pos > 0 {
                    // Fold this leaf into its left sibling
                    let sib_pid = parent.child_at(pos - 1);
                    let mut sib_guard = self.pager.fetch_write(sib_pid)?;
                    let mut sib = LeafNodeMut::<N>::from_page(sib_guard.data_mut())?;
                    sib.append_from(&leaf.as_ref());

                    if sib.size() <= sib.max_size() {
                        sib.set_next_leaf(leaf.next_leaf());
                        drop(guard);
                        self.pager.delete_page(pid)?;
                        debug!("{}: merged leaf {} into {}", self.name, pid, sib_pid);
                        continue; // the hole is this leaf's slot, already recorded
                    }

                    // The merge overflowed: redistribute instead
                    sib.split_into(&mut leaf);
                    parent.set_key_at(pos, &leaf.key_at(0));
                    return Ok(());
                } else {
                    // Leftmost child: fold the right sibling into this leaf
                    let sib_pid = parent.child_at(1);
                    let mut sib_guard = self.pager.fetch_write(sib_pid)?;
                    let mut sib = LeafNodeMut::<N>::from_page(sib_guard.data_mut())?;
                    leaf.append_from(&sib.as_ref());

                    if leaf.size() <= leaf.max_size() {
                        leaf.set_next_leaf(sib.next_leaf());
                        drop(sib_guard);
                        self.pager.delete_page(sib_pid)?;
                        debug!("{}: merged leaf {} into {}", self.name, sib_pid, pid);
                        path[i - 1].1 = 1; // the hole is the freed right sibling
                        continue;
                    }

                    leaf.split_into(&mut sib);
                    parent.set_key_at(1, &sib.key_at(0));
                    return Ok(());
                }
            } else {
                // Internal level: close the hole left by the freed child
                let mut guard = self.pager.fetch_write(pid)?;
                let mut node = InternalNodeMut::<N>::from_page(guard.data_mut())?;
                node.remove_at(slot);
                if node.size() >= node.min_size() {
                    return Ok(());
                }

                if i == 0 {
                    // A root internal may run under-full; a single child
                    // collapses the level
                    if node.size() == 1 {
                        let only_child = node.child_at(0);
                        HeaderNodeMut::from_page(header_guard.data_mut())?
                            .set_root_pid(only_child);
                        drop(guard);
                        self.pager.delete_page(pid)?;
                        debug!(
                            "{}: collapsed root {} into child {}",
                            self.name, pid, only_child
                        );
                    }
                    return Ok(());
                }

                let (parent_pid, pos) = path[i - 1];
                let mut parent_guard = self.pager.fetch_write(parent_pid)?;
                let mut parent = InternalNodeMut::<N>::from_page(parent_guard.data_mut())?;

                if pos > 0 {
                    // Fold into the left sibling, lifting the separator
                    let sib_pid = parent.child_at(pos - 1);
                    let mut sib_guard = self.pager.fetch_write(sib_pid)?;
                    let mut sib = InternalNodeMut::<N>::from_page(sib_guard.data_mut())?;
                    sib.append_separated(&node.as_ref(), &parent.key_at(pos));

                    if sib.size() <= sib.max_size() {
                        drop(guard);
                        self.pager.delete_page(pid)?;
                        debug!("{}: merged internal {} into {}", self.name, pid, sib_pid);
                        continue;
                    }

                    sib.split_into(&mut node);
                    parent.set_key_at(pos, &node.key_at(0));
                    return Ok(());
                } else {
                    // Leftmost child: fold the right sibling into this node
                    let sib_pid = parent.child_at(1);
                    let mut sib_guard = self.pager.fetch_write(sib_pid)?;
                    let mut sib = InternalNodeMut::<N>::from_page(sib_guard.data_mut())?;
                    node.append_separated(&sib.as_ref(), &parent.key_at(1));

                    if node.size() <= node.max_size() {
                        drop(sib_guard);
                        self.pager.delete_page(sib_pid)?;
                        debug!("{}: merged internal {} into {}", self.name, sib_pid, pid);
                        path[i - 1].1 = 1;
                        continue;
                    }

                    node.split_into(&mut sib);
                    parent.set_key_at(1, &sib.key_at(0));
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    // =======================================================================
    // Cursors
    // =======================================================================

    /// Returns a cursor positioned at the smallest key, or end if the
    /// tree is empty.
    pub fn iter(&self) -> Result<TreeIterator<N>> {
        let header_guard = self.pager.fetch_read(self.header_pid)?;
        let root_pid = HeaderNode::from_page(header_guard.data())?.root_pid();
        if !root_pid.is_valid() {
            return Ok(self.end());
        }

        let mut guard = self.pager.fetch_read(root_pid)?;
        drop(header_guard);
        while PageHeader::page_type_of(guard.data()) == PageType::BTreeInternal {
            let child = {
                let node = InternalNode::<N>::from_page(guard.data())?;
                node.child_at(0)
            };
            drop(guard);
            guard = self.pager.fetch_read(child)?;
        }

        let leaf = LeafNode::<N>::from_page(guard.data())?;
        if leaf.size() == 0 {
            return Ok(self.end());
        }
        Ok(TreeIterator::positioned(
            self.pager.clone(),
            guard.page_id(),
            0,
        ))
    }

    /// Returns a cursor positioned at the first slot whose key is >= `key`
    /// on the reached leaf, or end if that leaf has no such slot.
    pub fn iter_from(&self, key: &IndexKey<N>) -> Result<TreeIterator<N>> {
        let header_guard = self.pager.fetch_read(self.header_pid)?;
        let root_pid = HeaderNode::from_page(header_guard.data())?.root_pid();
        if !root_pid.is_valid() {
            return Ok(self.end());
        }

        let mut guard = self.pager.fetch_read(root_pid)?;
        drop(header_guard);
        while PageHeader::page_type_of(guard.data()) == PageType::BTreeInternal {
            let child = {
                let node = InternalNode::<N>::from_page(guard.data())?;
                node.child_at(self.route_slot(&node, key))
            };
            drop(guard);
            guard = self.pager.fetch_read(child)?;
        }

        let leaf = LeafNode::<N>::from_page(guard.data())?;
        let slot = self.find_leaf_slot(&leaf, key);
        // find_leaf_slot points at the last key <= target; the cursor
        // starts at the first key >= target
        let start = if slot >= 0
            && self
                .comparator
                .compare(&leaf.key_at(slot as usize), key)
                == Ordering::Equal
        {
            slot as usize
        } else {
            (slot + 1) as usize
        };
        if start >= leaf.size() {
            return Ok(self.end());
        }
        Ok(TreeIterator::positioned(
            self.pager.clone(),
            guard.page_id(),
            start as u16,
        ))
    }

    /// Returns the end sentinel cursor.
    pub fn end(&self) -> TreeIterator<N> {
        TreeIterator::end(self.pager.clone())
    }

    // =======================================================================
    // Binary search within nodes
    // =======================================================================

    /// Largest slot whose key is <= `key`, or -1 if every key is greater.
    fn find_leaf_slot(&self, leaf: &LeafNode<'_, N>, key: &IndexKey<N>) -> i32 {
        let mut l: i32 = 0;
        let mut r: i32 = leaf.size() as i32 - 1;
        while l < r {
            let mid = (l + r + 1) >> 1;
            if self.comparator.compare(&leaf.key_at(mid as usize), key) != Ordering::Greater {
                l = mid;
            } else {
                r = mid - 1;
            }
        }
        if r >= 0 && self.comparator.compare(&leaf.key_at(r as usize), key) == Ordering::Greater {
            r = -1;
        }
        r
    }

    /// Routing slot for `key`: largest slot i >= 1 with key[i] <= key, or
    /// 0 for the leftmost child. Slot 0's key is never consulted.
    fn route_slot(&self, node: &InternalNode<'_, N>, key: &IndexKey<N>) -> usize {
        let mut l: i32 = 1;
        let mut r: i32 = node.size() as i32 - 1;
        while l < r {
            let mid = (l + r + 1) >> 1;
            if self.comparator.compare(&node.key_at(mid as usize), key) != Ordering::Greater {
                l = mid;
            } else {
                r = mid - 1;
            }
        }
        if r < 1 || self.comparator.compare(&node.key_at(r as usize), key) == Ordering::Greater {
            return 0;
        }
        r as usize
    }

    // =======================================================================
    // Bulk drivers
    // =======================================================================

    /// Inserts one key per whitespace-separated integer in the file; the
    /// record ID is derived from the key. Returns the number inserted.
    pub fn insert_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let mut inserted = 0;
        for token in content.split_whitespace() {
            if let Ok(value) = token.parse::<i64>() {
                if self.insert(IndexKey::from_integer(value), RecordId::from_integer(value))? {
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }

    /// Removes one key per whitespace-separated integer in the file.
    /// Returns the number of keys processed.
    pub fn remove_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let mut processed = 0;
        for token in content.split_whitespace() {
            if let Ok(value) = token.parse::<i64>() {
                self.remove(&IndexKey::from_integer(value))?;
                processed += 1;
            }
        }
        Ok(processed)
    }

    /// Applies a batch script: each operation is `i <int>` (insert) or
    /// `d <int>` (delete).
    pub fn batch_ops_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let mut tokens = content.split_whitespace();
        while let Some(op) = tokens.next() {
            let Some(value) = tokens.next().and_then(|t| t.parse::<i64>().ok()) else {
                break;
            };
            match op {
                "i" => {
                    self.insert(IndexKey::from_integer(value), RecordId::from_integer(value))?;
                }
                "d" => {
                    self.remove(&IndexKey::from_integer(value))?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
