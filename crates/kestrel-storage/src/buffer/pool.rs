//! Buffer pool implementation.
//!
//! The buffer pool mediates all access to disk pages through a bounded set
//! of in-memory frames, handling admission, pinning, eviction and
//! write-back.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kestrel_common::types::PageId;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::frame::{BufferFrame, FrameId};
use super::latch::{PageGuard, PageReadGuard, PageWriteGuard};
use super::lru_k::LruKReplacer;
use super::BufferPoolStats;
use crate::disk::DiskProvider;

/// Mutable pool state behind the single pool mutex.
///
/// The page table, free list, replacer and page id allocator always change
/// together; one mutex keeps every invariant between them inspectable at a
/// glance. Frame metadata transitions also happen under this mutex.
struct PoolState {
    /// Maps resident pages to their frames. An entry's frame always carries
    /// the same page id as the key.
    page_table: HashMap<PageId, FrameId>,
    /// Frames holding no page at all.
    free_list: VecDeque<FrameId>,
    /// Eviction policy over resident, unpinned frames.
    replacer: LruKReplacer,
    /// Next page id to hand out.
    next_page_id: u64,
}

/// The buffer pool: a bounded page cache over a [`DiskProvider`].
///
/// All public operations pin the requested page and return a guard that
/// releases the pin when dropped:
/// - [`new_page`](Self::new_page) / [`fetch_page`](Self::fetch_page) return
///   a basic [`PageGuard`] that latches the frame per data access;
/// - [`fetch_page_read`](Self::fetch_page_read) /
///   [`fetch_page_write`](Self::fetch_page_write) return guards that hold
///   the frame's reader/writer latch for their whole lifetime.
///
/// Frame latches are always acquired *after* the pool mutex has been
/// released, so a thread blocked on page contents never holds up unrelated
/// pool operations, and the unpin a latch holder eventually performs can
/// always get the mutex.
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// Array of buffer frames, allocated once at construction.
    frames: Vec<Arc<BufferFrame>>,
    /// All mutable bookkeeping, behind the pool mutex.
    state: Mutex<PoolState>,
    /// Disk provider for page I/O.
    disk: Arc<dyn DiskProvider>,
    /// Fetch counter for statistics.
    fetch_count: AtomicU64,
    /// Hit counter for statistics.
    hit_count: AtomicU64,
    /// Miss counter for statistics.
    miss_count: AtomicU64,
    /// Eviction counter for statistics.
    eviction_count: AtomicU64,
    /// Flush counter for statistics.
    flush_count: AtomicU64,
}

impl BufferPool {
    /// Creates a buffer pool over `disk` with the given configuration.
    ///
    /// Fails if the configuration is invalid or if the provider's page size
    /// does not match the configured one.
    pub fn new(config: BufferPoolConfig, disk: Arc<dyn DiskProvider>) -> BufferResult<Self> {
        config.validate().map_err(BufferError::config)?;
        if disk.page_size() != config.page_size {
            return Err(BufferError::config(format!(
                "disk provider page size {} does not match configured page size {}",
                disk.page_size(),
                config.page_size
            )));
        }

        let frames: Vec<Arc<BufferFrame>> = (0..config.num_frames)
            .map(|i| Arc::new(BufferFrame::new(FrameId::new(i), config.page_size)))
            .collect();

        let state = PoolState {
            page_table: HashMap::with_capacity(config.num_frames),
            free_list: (0..config.num_frames).map(FrameId::new).collect(),
            replacer: LruKReplacer::new(config.num_frames, config.replacer_k),
            next_page_id: PageId::FIRST.as_u64(),
        };

        Ok(Self {
            config,
            frames,
            state: Mutex::new(state),
            disk,
            fetch_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        })
    }

    /// Allocates a fresh page and pins it into a frame.
    ///
    /// The new page is zero-filled. The page id is only consumed if a frame
    /// could be secured, so exhaustion does not burn ids.
    pub fn new_page(&self) -> BufferResult<PageGuard<'_>> {
        let mut state = self.state.lock();
        let frame_id = self.acquire_frame(&mut state)?;

        let page_id = PageId::new(state.next_page_id);
        state.next_page_id = page_id.next().as_u64();

        let frame = &self.frames[frame_id.index()];
        frame.write_data().fill(0);
        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id);
        state.replacer.set_evictable(frame_id, false);

        trace!(page_id = %page_id, frame_id = frame_id.index(), "admitted new page");
        Ok(PageGuard::new(self, Arc::clone(frame), page_id))
    }

    /// Fetches a page, pinning it into a frame.
    ///
    /// A resident page is returned directly; otherwise a frame is secured
    /// (evicting if necessary) and the page is read from disk.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<PageGuard<'_>> {
        if !page_id.is_valid() {
            return Err(BufferError::InvalidPageId);
        }
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            let frame = &self.frames[frame_id.index()];
            state.replacer.record_access(frame_id);
            state.replacer.set_evictable(frame_id, false);
            frame.pin();
            return Ok(PageGuard::new(self, Arc::clone(frame), page_id));
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let frame_id = self.acquire_frame(&mut state)?;
        let frame = &self.frames[frame_id.index()];

        if let Err(e) = self.disk.read_page(page_id, &mut frame.write_data()) {
            // The frame was not admitted; hand it back
            state.free_list.push_back(frame_id);
            return Err(e.into());
        }
        frame.set_page_id(page_id);
        frame.set_dirty(false);
        frame.pin();

        state.page_table.insert(page_id, frame_id);
        state.replacer.record_access(frame_id);
        state.replacer.set_evictable(frame_id, false);

        trace!(page_id = %page_id, frame_id = frame_id.index(), "fetched page from disk");
        Ok(PageGuard::new(self, Arc::clone(frame), page_id))
    }

    /// Fetches a page and takes its frame latch shared.
    ///
    /// Blocks until any writer releases the latch. The latch is acquired
    /// after the pool mutex has been released.
    pub fn fetch_page_read(&self, page_id: PageId) -> BufferResult<PageReadGuard<'_>> {
        let base = self.fetch_page(page_id)?;
        Ok(PageReadGuard::new(base))
    }

    /// Fetches a page and takes its frame latch exclusive.
    ///
    /// Blocks until all other holders release the latch; a thread must not
    /// already hold a guard on the same page. The latch is acquired after
    /// the pool mutex has been released.
    pub fn fetch_page_write(&self, page_id: PageId) -> BufferResult<PageWriteGuard<'_>> {
        let base = self.fetch_page(page_id)?;
        Ok(PageWriteGuard::new(base))
    }

    /// Releases one pin on a resident page.
    ///
    /// `is_dirty` is OR-ed into the frame's dirty flag: unpinning clean
    /// never clears dirtiness a previous user reported. When the pin count
    /// reaches zero the frame becomes evictable.
    ///
    /// Returns false if the page is not resident or was not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            state.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes a resident page to disk, pinned or not, and clears its dirty
    /// flag. Pin counts are unchanged afterwards.
    ///
    /// The write happens outside the pool mutex; a transient pin keeps the
    /// frame resident meanwhile. Blocks while a writer holds the frame
    /// latch, so a thread must not flush a page it has a write guard on.
    pub fn flush_page(&self, page_id: PageId) -> BufferResult<()> {
        let frame = {
            let mut state = self.state.lock();
            let Some(&frame_id) = state.page_table.get(&page_id) else {
                return Err(BufferError::page_not_found(page_id));
            };
            let frame = Arc::clone(&self.frames[frame_id.index()]);
            frame.pin();
            state.replacer.set_evictable(frame_id, false);
            frame
        };

        let result = {
            let data = frame.read_data();
            self.disk.write_page(page_id, &data)
        };
        if result.is_ok() {
            frame.set_dirty(false);
            self.flush_count.fetch_add(1, Ordering::Relaxed);
            trace!(page_id = %page_id, "flushed page");
        }

        self.unpin_page(page_id, false);
        result.map_err(Into::into)
    }

    /// Flushes every resident page. Returns the number of pages written.
    pub fn flush_all(&self) -> BufferResult<usize> {
        let page_ids: Vec<PageId> = {
            let state = self.state.lock();
            state.page_table.keys().copied().collect()
        };

        let mut flushed = 0;
        for page_id in page_ids {
            match self.flush_page(page_id) {
                Ok(()) => flushed += 1,
                // Evicted or deleted since the snapshot; nothing to write
                Err(BufferError::PageNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(flushed)
    }

    /// Drops a resident page without writing it back.
    ///
    /// The frame is zeroed and returned to the free list; whatever dirty
    /// data it held is discarded. Deleting a page that is not resident
    /// succeeds trivially; deleting a pinned page fails.
    pub fn delete_page(&self, page_id: PageId) -> BufferResult<()> {
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(());
        };
        let frame = &self.frames[frame_id.index()];

        let pin_count = frame.pin_count();
        if pin_count > 0 {
            return Err(BufferError::PagePinned { page_id, pin_count });
        }

        state.page_table.remove(&page_id);
        state.replacer.remove(frame_id);
        // No pins: any guard still touching the latch is mid-drop and
        // releases it without taking the pool mutex
        frame.reset();
        state.free_list.push_back(frame_id);

        debug!(page_id = %page_id, frame_id = frame_id.index(), "deleted page");
        Ok(())
    }

    /// Returns true if a page is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// Returns the pin count of a resident page, or `None` if the page is
    /// not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(self.frames[frame_id.index()].pin_count())
    }

    /// Returns the number of frames currently holding no page.
    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Returns the number of frames in the pool.
    pub fn num_frames(&self) -> usize {
        self.config.num_frames
    }

    /// Returns the page size in bytes.
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            fetches: self.fetch_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Secures a frame for a new occupant: free list first, then eviction.
    ///
    /// A dirty victim is written back before its page-table entry is erased.
    /// The returned frame is empty, clean and unpinned; its buffer contents
    /// are whatever the previous occupant left (the caller overwrites them).
    fn acquire_frame(&self, state: &mut PoolState) -> BufferResult<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let Some(frame_id) = state.replacer.evict() else {
            return Err(BufferError::PoolExhausted);
        };
        let frame = &self.frames[frame_id.index()];
        debug_assert_eq!(frame.pin_count(), 0, "evicted a pinned frame");

        let old_page_id = frame.page_id();
        if frame.is_dirty() {
            // The victim has no pins: any guard still touching its latch is
            // mid-drop and releases it without taking the pool mutex
            let write_back = {
                let data = frame.read_data();
                self.disk.write_page(old_page_id, &data)
            };
            if let Err(e) = write_back {
                // Leave the page resident and evictable again
                state.replacer.set_evictable(frame_id, true);
                return Err(e.into());
            }
            debug!(page_id = %old_page_id, frame_id = frame_id.index(), "evicted dirty page, wrote back");
        } else {
            trace!(page_id = %old_page_id, frame_id = frame_id.index(), "evicted clean page");
        }

        state.page_table.remove(&old_page_id);
        frame.clear_metadata();
        self.eviction_count.fetch_add(1, Ordering::Relaxed);
        Ok(frame_id)
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("num_frames", &self.config.num_frames)
            .field("page_size", &self.config.page_size)
            .field("resident_pages", &self.state.lock().page_table.len())
            .field("stats", &self.stats())
            .finish()
    }
}
