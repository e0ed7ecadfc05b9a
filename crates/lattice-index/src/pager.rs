//! Pager: the paging service consumed by the B+ tree.
//!
//! Combines the buffer pool and the disk manager into the contract the
//! tree operates against: fetch a page under a read or write guard,
//! allocate a fresh page under an owning write guard, and return pages
//! that fell out of the tree. Pool misses are satisfied from disk; dirty
//! pages evicted to make room are written back before the caller proceeds.

use crate::disk::{DiskManager, DiskManagerConfig};
use lattice_buffer::{BufferPool, BufferPoolConfig, PageReadGuard, PageWriteGuard};
use lattice_common::page::{PageId, PAGE_SIZE};
use lattice_common::{LatticeError, Result, StorageConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// The paging service backing one index file.
pub struct Pager {
    /// Page cache shared by all fetches.
    pool: BufferPool,
    /// Backing store for pool misses and write-back.
    disk: DiskManager,
    /// File this pager allocates pages in.
    file_id: u32,
    /// Next fresh page number to hand out.
    next_page_num: AtomicU32,
    /// Pages returned by delete_page, reused before extending the file.
    free_pages: Mutex<Vec<PageId>>,
}

impl Pager {
    /// Creates a pager over the given disk manager and pool.
    ///
    /// Fresh page numbers continue from the current end of the file.
    pub fn new(disk: DiskManager, pool: BufferPool, file_id: u32) -> Result<Self> {
        let next_page_num = disk.num_pages(file_id)?;
        Ok(Self {
            pool,
            disk,
            file_id,
            next_page_num: AtomicU32::new(next_page_num),
            free_pages: Mutex::new(Vec::new()),
        })
    }

    /// Opens a pager from a storage configuration, building the disk
    /// manager and buffer pool it describes.
    pub fn open(config: &StorageConfig, file_id: u32) -> Result<Self> {
        if config.page_size != PAGE_SIZE {
            return Err(LatticeError::ConfigError(format!(
                "unsupported page_size {} (built for {})",
                config.page_size, PAGE_SIZE
            )));
        }
        let disk = DiskManager::new(DiskManagerConfig {
            data_dir: config.data_dir.clone(),
            fsync_enabled: config.fsync_enabled,
        })?;
        let pool = BufferPool::new(BufferPoolConfig {
            num_frames: config.buffer_pool_pages,
        });
        Self::new(disk, pool, file_id)
    }

    /// Returns the file ID this pager serves.
    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    /// Returns the underlying buffer pool.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Brings a page into the pool from disk, writing back anything that
    /// was evicted to make room.
    fn ensure_resident(&self, page_id: PageId) -> Result<()> {
        if self.pool.contains(page_id) {
            return Ok(());
        }
        let data = self.disk.read_page(page_id)?;
        let (_, evicted) = self.pool.load_page(page_id, &data)?;
        if let Some(ev) = evicted {
            self.disk.write_page(ev.page_id, &ev.data[..])?;
        }
        // load_page pins; the caller re-pins through a guard
        self.pool.unpin_page(page_id, false);
        Ok(())
    }

    /// Acquires a read guard on a page, fetching it from disk on a miss.
    ///
    /// May block while a conflicting write guard is held.
    pub fn fetch_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        debug_assert!(page_id.is_valid(), "fetch_read of invalid page id");
        loop {
            if let Some(guard) = self.pool.read_page(page_id) {
                return Ok(guard);
            }
            // Lost the page to eviction between lookup and pin; reload
            self.ensure_resident(page_id)?;
        }
    }

    /// Acquires a write guard on a page, fetching it from disk on a miss.
    ///
    /// May block while any other guard on the page is held.
    pub fn fetch_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        debug_assert!(page_id.is_valid(), "fetch_write of invalid page id");
        loop {
            if let Some(guard) = self.pool.write_page(page_id) {
                return Ok(guard);
            }
            self.ensure_resident(page_id)?;
        }
    }

    /// Allocates a new page and returns its id together with an owning
    /// write guard on the zeroed page.
    ///
    /// Freed pages are reused before the file is extended.
    pub fn allocate_page(&self) -> Result<(PageId, PageWriteGuard<'_>)> {
        let page_id = self.free_pages.lock().pop().unwrap_or_else(|| {
            PageId::new(self.file_id, self.next_page_num.fetch_add(1, Ordering::AcqRel))
        });

        let (guard, evicted) = self.pool.new_page_guarded(page_id)?;
        if let Some(ev) = evicted {
            self.disk.write_page(ev.page_id, &ev.data[..])?;
        }
        Ok((page_id, guard))
    }

    /// Returns a page to the pager.
    ///
    /// The caller must have dropped every guard on the page. The page
    /// becomes available for reuse by allocate_page.
    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        if !self.pool.delete_page(page_id) && self.pool.contains(page_id) {
            return Err(LatticeError::Internal(format!(
                "delete_page({}) while page is pinned",
                page_id
            )));
        }
        self.free_pages.lock().push(page_id);
        Ok(())
    }

    /// Writes every dirty page back to disk and syncs the file.
    pub fn flush(&self) -> Result<()> {
        self.pool
            .flush_all(|page_id, data| self.disk.write_page(page_id, data))?;
        self.disk.flush()
    }
}
