//! Configuration structures for Lattice.

use crate::page::PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration for the index engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for data files.
    pub data_dir: PathBuf,
    /// Page size in bytes.
    pub page_size: usize,
    /// Buffer pool size in number of pages.
    pub buffer_pool_pages: usize,
    /// Enable fsync for writes.
    pub fsync_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            page_size: PAGE_SIZE,
            buffer_pool_pages: 8192, // 128 MB with 16 KB pages
            fsync_enabled: true,
        }
    }
}

impl StorageConfig {
    /// Returns the total buffer pool size in bytes.
    pub fn buffer_pool_size_bytes(&self) -> usize {
        self.buffer_pool_pages * self.page_size
    }
}

/// Fan-out configuration for a B+ tree index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BTreeConfig {
    /// Maximum entries per leaf page.
    pub leaf_max: u16,
    /// Maximum child slots per internal page.
    pub internal_max: u16,
}

impl Default for BTreeConfig {
    fn default() -> Self {
        Self {
            leaf_max: 255,
            internal_max: 255,
        }
    }
}
