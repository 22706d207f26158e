//! Buffer frame - a slot in the buffer pool that holds one page.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use kestrel_common::types::{Lsn, PageId};
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};

/// Frame identifier - index into the buffer pool's frame array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Creates a new frame ID.
    #[inline]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Returns the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for FrameId {
    fn from(id: usize) -> Self {
        Self::new(id)
    }
}

impl From<FrameId> for usize {
    fn from(id: FrameId) -> Self {
        id.0
    }
}

/// A buffer frame holds a single page in memory.
///
/// Each frame has:
/// - A page-size data buffer behind a reader/writer latch
/// - Metadata (page id, pin count, dirty flag, last-modified LSN)
///
/// Metadata fields are atomics so they can be read without any lock, but
/// every *transition* happens while the pool's mutex is held; the atomics
/// exist for cheap introspection, not for lock-free coordination.
///
/// The data latch is separate from the pool mutex. Guards hold it across
/// their lifetime, and the pool never blocks on it while holding its mutex.
pub struct BufferFrame {
    /// Frame ID (index in the frame array).
    frame_id: FrameId,
    /// Page data buffer behind the frame's reader/writer latch.
    data: Arc<RwLock<Box<[u8]>>>,
    /// Page ID stored in this frame (INVALID if empty).
    page_id: AtomicU64,
    /// Pin count (number of active references).
    pin_count: AtomicU32,
    /// Whether the page was modified since it was loaded or last flushed.
    dirty: AtomicBool,
    /// LSN of the last modification, for write-ahead-log integration.
    lsn: AtomicU64,
}

impl BufferFrame {
    /// Creates a new empty buffer frame.
    pub fn new(frame_id: FrameId, page_size: usize) -> Self {
        Self {
            frame_id,
            data: Arc::new(RwLock::new(vec![0u8; page_size].into_boxed_slice())),
            page_id: AtomicU64::new(PageId::INVALID.as_u64()),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
            lsn: AtomicU64::new(Lsn::INVALID.as_u64()),
        }
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page ID stored in this frame.
    #[inline]
    pub fn page_id(&self) -> PageId {
        PageId::new(self.page_id.load(Ordering::Acquire))
    }

    /// Sets the page ID for this frame.
    #[inline]
    pub fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id.as_u64(), Ordering::Release);
    }

    /// Returns true if this frame holds no page.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.page_id().is_valid()
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the pin count is already 0.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(old > 0, "unpinned frame with pin_count = 0");
        old - 1
    }

    /// Returns true if the frame is pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Returns true if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Sets or clears the dirty flag.
    #[inline]
    pub fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    /// Returns the LSN of the last modification.
    #[inline]
    pub fn lsn(&self) -> Lsn {
        Lsn::new(self.lsn.load(Ordering::Acquire))
    }

    /// Sets the LSN.
    #[inline]
    pub fn set_lsn(&self, lsn: Lsn) {
        self.lsn.store(lsn.as_u64(), Ordering::Release);
    }

    /// Takes the frame latch shared and returns the page data.
    #[inline]
    pub fn read_data(&self) -> parking_lot::RwLockReadGuard<'_, Box<[u8]>> {
        self.data.read()
    }

    /// Takes the frame latch exclusive and returns the page data.
    #[inline]
    pub fn write_data(&self) -> parking_lot::RwLockWriteGuard<'_, Box<[u8]>> {
        self.data.write()
    }

    /// Takes the frame latch shared, keeping it held for as long as the
    /// returned guard lives (not tied to a borrow of the frame).
    #[inline]
    pub fn read_data_owned(&self) -> ArcRwLockReadGuard<RawRwLock, Box<[u8]>> {
        self.data.read_arc()
    }

    /// Exclusive counterpart of [`read_data_owned`](Self::read_data_owned).
    #[inline]
    pub fn write_data_owned(&self) -> ArcRwLockWriteGuard<RawRwLock, Box<[u8]>> {
        self.data.write_arc()
    }

    /// Clears the frame's metadata without touching the buffer contents.
    ///
    /// Used on the eviction path, where the next occupant overwrites the
    /// whole buffer anyway.
    pub fn clear_metadata(&self) {
        self.page_id
            .store(PageId::INVALID.as_u64(), Ordering::Release);
        self.pin_count.store(0, Ordering::Release);
        self.dirty.store(false, Ordering::Release);
        self.lsn.store(Lsn::INVALID.as_u64(), Ordering::Release);
    }

    /// Resets the frame to its initial state: metadata cleared and the whole
    /// buffer zeroed.
    pub fn reset(&self) {
        self.clear_metadata();
        self.write_data().fill(0);
    }
}

impl std::fmt::Debug for BufferFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferFrame")
            .field("frame_id", &self.frame_id)
            .field("page_id", &self.page_id())
            .field("pin_count", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .field("lsn", &self.lsn())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_starts_empty() {
        let frame = BufferFrame::new(FrameId::new(0), 4096);
        assert_eq!(frame.frame_id().index(), 0);
        assert!(frame.is_empty());
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert_eq!(frame.lsn(), Lsn::INVALID);
        assert_eq!(frame.read_data().len(), 4096);
    }

    #[test]
    fn pin_unpin_counting() {
        let frame = BufferFrame::new(FrameId::new(0), 4096);

        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert!(frame.is_pinned());

        assert_eq!(frame.unpin(), 1);
        assert_eq!(frame.unpin(), 0);
        assert!(!frame.is_pinned());
    }

    #[test]
    fn dirty_flag() {
        let frame = BufferFrame::new(FrameId::new(0), 4096);

        frame.set_dirty(true);
        assert!(frame.is_dirty());

        frame.set_dirty(false);
        assert!(!frame.is_dirty());
    }

    #[test]
    fn lsn_stamping() {
        let frame = BufferFrame::new(FrameId::new(0), 4096);
        frame.set_lsn(Lsn::new(1000));
        assert_eq!(frame.lsn(), Lsn::new(1000));
    }

    #[test]
    fn data_access() {
        let frame = BufferFrame::new(FrameId::new(0), 4096);

        frame.write_data()[0..4].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(&frame.read_data()[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn owned_guard_outlives_the_borrow() {
        let frame = BufferFrame::new(FrameId::new(0), 4096);
        frame.write_data()[0] = 7;

        let guard = frame.read_data_owned();
        // Shared latch is held; a second reader still gets through
        assert_eq!(frame.read_data()[0], 7);
        assert_eq!(guard[0], 7);
    }

    #[test]
    fn reset_zeroes_the_whole_buffer() {
        let frame = BufferFrame::new(FrameId::new(0), 4096);
        frame.set_page_id(PageId::new(42));
        frame.pin();
        frame.set_dirty(true);
        frame.set_lsn(Lsn::new(5));
        // A null first byte must not stop the zeroing short
        frame.write_data().fill(0xEE);
        frame.write_data()[0] = 0;

        frame.reset();

        assert!(frame.is_empty());
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert_eq!(frame.lsn(), Lsn::INVALID);
        assert!(frame.read_data().iter().all(|&b| b == 0));
    }
}
