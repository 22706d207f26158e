//! Buffer pool for KestrelDB.
//!
//! The buffer pool caches fixed-size disk pages in a bounded set of
//! in-memory frames, providing:
//!
//! - **Page caching**: resident pages are served without disk I/O
//! - **Pin/unpin**: reference counting keeps in-use pages resident
//! - **Dirty tracking**: modified pages are written back before reuse
//! - **Eviction policy**: two-queue LRU-K page replacement
//! - **Scoped guards**: pins and latches released on every exit path
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         BufferPool                           │
//! │  ┌────────────────────────── Mutex ───────────────────────┐  │
//! │  │   page_table            free_list        LruKReplacer  │  │
//! │  │ PageId → FrameId      VecDeque<FrameId>  ┌───────────┐ │  │
//! │  │                                          │ new queue │ │  │
//! │  │                                          │ old queue │ │  │
//! │  └──────────────────────────────────────────└───────────┘─┘  │
//! │                              │                               │
//! │                              ▼                               │
//! │  ┌─────────────────────── Frame Array ────────────────────┐  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐     ┌─────────┐   │  │
//! │  │  │ Frame 0 │ │ Frame 1 │ │ Frame 2 │ ... │ Frame N │   │  │
//! │  │  │ page_id │ │ page_id │ │ page_id │     │ page_id │   │  │
//! │  │  │ pin_cnt │ │ pin_cnt │ │ pin_cnt │     │ pin_cnt │   │  │
//! │  │  │ dirty   │ │ dirty   │ │ dirty   │     │ dirty   │   │  │
//! │  │  │ rwlatch │ │ rwlatch │ │ rwlatch │     │ rwlatch │   │  │
//! │  │  └─────────┘ └─────────┘ └─────────┘     └─────────┘   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                              │                               │
//! │                              ▼                               │
//! │                     DiskProvider (I/O)                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use kestrel_storage::buffer::{BufferPool, BufferPoolConfig};
//! use kestrel_storage::disk::MemoryDisk;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BufferPoolConfig::new(64);
//! let pool = BufferPool::new(config, Arc::new(MemoryDisk::default()))?;
//!
//! // Create a page and write to it
//! let page_id = {
//!     let mut guard = pool.new_page()?;
//!     guard.data_mut()[0] = 42;
//!     guard.page_id()
//! }; // pin released here
//!
//! // Read it back under a shared latch
//! let guard = pool.fetch_page_read(page_id)?;
//! assert_eq!(guard.data()[0], 42);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod frame;
mod latch;
mod lru_k;
mod pool;
mod replacer;

pub use config::BufferPoolConfig;
pub use error::{BufferError, BufferResult};
pub use frame::{BufferFrame, FrameId};
pub use latch::{PageGuard, PageReadGuard, PageWriteGuard};
pub use lru_k::LruKReplacer;
pub use pool::BufferPool;
pub use replacer::LruReplacer;

/// Statistics for buffer pool monitoring.
#[derive(Debug, Clone, Default)]
pub struct BufferPoolStats {
    /// Total number of page fetches.
    pub fetches: u64,
    /// Number of fetches served from memory.
    pub hits: u64,
    /// Number of fetches that required a disk read.
    pub misses: u64,
    /// Number of pages evicted.
    pub evictions: u64,
    /// Number of explicit page flushes.
    pub flushes: u64,
    /// Current number of pinned frames.
    pub pinned_frames: usize,
    /// Current number of dirty frames.
    pub dirty_frames: usize,
}

impl BufferPoolStats {
    /// Returns the cache hit ratio (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        if self.fetches == 0 {
            0.0
        } else {
            self.hits as f64 / self.fetches as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio() {
        let mut stats = BufferPoolStats::default();
        assert_eq!(stats.hit_ratio(), 0.0);

        stats.fetches = 10;
        stats.hits = 4;
        assert!((stats.hit_ratio() - 0.4).abs() < f64::EPSILON);
    }
}
