//! Forward range cursor over the leaf list.

use super::key::IndexKey;
use super::node::LeafNode;
use super::record::RecordId;
use crate::pager::Pager;
use lattice_common::page::PageId;
use lattice_common::{LatticeError, Result};
use std::sync::Arc;

/// Slot sentinel for the end cursor.
const SLOT_END: u16 = u16::MAX;

/// A forward cursor over the tree's entries in key order.
///
/// Holds a (leaf, slot) position and walks the `next_leaf` chain. Each
/// access takes a fresh read guard on the current leaf and copies the
/// entry out, so the cursor itself pins nothing between calls.
pub struct TreeIterator<const N: usize> {
    pager: Arc<Pager>,
    leaf_pid: PageId,
    slot: u16,
}

impl<const N: usize> TreeIterator<N> {
    /// Creates a cursor at the given position.
    pub(crate) fn positioned(pager: Arc<Pager>, leaf_pid: PageId, slot: u16) -> Self {
        Self {
            pager,
            leaf_pid,
            slot,
        }
    }

    /// Creates the end sentinel cursor.
    pub(crate) fn end(pager: Arc<Pager>) -> Self {
        Self {
            pager,
            leaf_pid: PageId::INVALID,
            slot: SLOT_END,
        }
    }

    /// Returns true if the cursor is past the last entry.
    pub fn is_end(&self) -> bool {
        !self.leaf_pid.is_valid()
    }

    /// Returns the entry under the cursor.
    pub fn entry(&self) -> Result<(IndexKey<N>, RecordId)> {
        if self.is_end() {
            return Err(LatticeError::Internal(
                "entry() on end cursor".to_string(),
            ));
        }
        let guard = self.pager.fetch_read(self.leaf_pid)?;
        let leaf = LeafNode::<N>::from_page(guard.data())?;
        let slot = self.slot as usize;
        if slot >= leaf.size() {
            return Err(LatticeError::TreeCorrupted(format!(
                "cursor slot {} past leaf {} size {}",
                slot,
                self.leaf_pid,
                leaf.size()
            )));
        }
        Ok((leaf.key_at(slot), leaf.value_at(slot)))
    }

    /// Advances by one entry, following the leaf chain across page
    /// boundaries. Advancing past the rightmost entry reaches end.
    pub fn advance(&mut self) -> Result<()> {
        if self.is_end() {
            return Ok(());
        }
        let next = {
            let guard = self.pager.fetch_read(self.leaf_pid)?;
            let leaf = LeafNode::<N>::from_page(guard.data())?;
            if (self.slot as usize) + 1 < leaf.size() {
                self.slot += 1;
                return Ok(());
            }
            leaf.next_leaf()
        };
        if next.is_valid() {
            self.leaf_pid = next;
            self.slot = 0;
        } else {
            self.leaf_pid = PageId::INVALID;
            self.slot = SLOT_END;
        }
        Ok(())
    }
}

impl<const N: usize> PartialEq for TreeIterator<N> {
    fn eq(&self, other: &Self) -> bool {
        self.leaf_pid == other.leaf_pid && self.slot == other.slot
    }
}

impl<const N: usize> Eq for TreeIterator<N> {}

impl<const N: usize> Iterator for TreeIterator<N> {
    type Item = Result<(IndexKey<N>, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_end() {
            return None;
        }
        let result = self.entry().and_then(|entry| {
            self.advance()?;
            Ok(entry)
        });
        if result.is_err() {
            // A paging failure ends the iteration
            self.leaf_pid = PageId::INVALID;
            self.slot = SLOT_END;
        }
        Some(result)
    }
}
