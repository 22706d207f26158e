//! Scoped page guards.
//!
//! Every page handed out by the buffer pool is wrapped in a guard that owns
//! one pin on the page's frame. Dropping the guard releases the pin, so pins
//! stay balanced on every exit path. The read/write variants additionally
//! hold the frame's reader/writer latch for their whole lifetime.
//!
//! Guards are move-only values: moving one transfers the pin, and
//! move-assigning over a live guard drops (and therefore releases) the
//! overwritten one. `drop_guard` releases early and is idempotent.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use kestrel_common::types::PageId;
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::RawRwLock;

use super::frame::BufferFrame;
use super::pool::BufferPool;

/// Basic page guard: owns a pin, takes the frame latch per access.
///
/// Obtained from [`BufferPool::new_page`] and [`BufferPool::fetch_page`].
/// The accumulated dirty flag is reported to the pool when the pin is
/// released.
pub struct PageGuard<'a> {
    pool: &'a BufferPool,
    /// `None` once the guard has been dropped; a dropped guard is inert.
    frame: Option<Arc<BufferFrame>>,
    page_id: PageId,
    is_dirty: bool,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn new(pool: &'a BufferPool, frame: Arc<BufferFrame>, page_id: PageId) -> Self {
        Self {
            pool,
            frame: Some(frame),
            page_id,
            is_dirty: false,
        }
    }

    /// Returns the guarded page's ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns a read view of the page data.
    ///
    /// Takes the frame latch shared for the duration of the borrow.
    ///
    /// # Panics
    ///
    /// Panics if the guard was already dropped.
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame().read_data(),
        }
    }

    /// Returns a write view of the page data and marks the page dirty.
    ///
    /// Takes the frame latch exclusive for the duration of the borrow.
    ///
    /// # Panics
    ///
    /// Panics if the guard was already dropped.
    pub fn data_mut(&mut self) -> impl DerefMut<Target = [u8]> + '_ {
        self.mark_dirty();
        PageDataMut {
            guard: self.frame().write_data(),
        }
    }

    /// Marks the page dirty without touching the data.
    ///
    /// # Panics
    ///
    /// Panics if the guard was already dropped.
    pub fn mark_dirty(&mut self) {
        self.frame().set_dirty(true);
        self.is_dirty = true;
    }

    /// Returns true once the pin has been released.
    #[inline]
    pub fn is_dropped(&self) -> bool {
        self.frame.is_none()
    }

    /// Releases the pin now. Safe to call more than once.
    pub fn drop_guard(&mut self) {
        if self.frame.take().is_some() {
            self.pool.unpin_page(self.page_id, self.is_dirty);
        }
    }

    pub(crate) fn frame(&self) -> &Arc<BufferFrame> {
        self.frame.as_ref().expect("page guard already dropped")
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

impl std::fmt::Debug for PageGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageGuard")
            .field("page_id", &self.page_id)
            .field("dirty", &self.is_dirty)
            .field("dropped", &self.is_dropped())
            .finish()
    }
}

/// Helper struct to provide `Deref` for page data.
struct PageDataRef<'a> {
    guard: parking_lot::RwLockReadGuard<'a, Box<[u8]>>,
}

impl Deref for PageDataRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Helper struct to provide `DerefMut` for page data.
struct PageDataMut<'a> {
    guard: parking_lot::RwLockWriteGuard<'a, Box<[u8]>>,
}

impl Deref for PageDataMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PageDataMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

/// Read guard: owns a pin plus the frame's shared latch.
///
/// Obtained from [`BufferPool::fetch_page_read`]. While this guard lives no
/// writer can touch the page data.
pub struct PageReadGuard<'a> {
    base: PageGuard<'a>,
    latch: Option<ArcRwLockReadGuard<RawRwLock, Box<[u8]>>>,
}

impl<'a> PageReadGuard<'a> {
    /// Wraps a pinned page, taking the frame latch shared.
    ///
    /// The caller must not hold the pool mutex.
    pub(crate) fn new(base: PageGuard<'a>) -> Self {
        let latch = base.frame().read_data_owned();
        Self {
            base,
            latch: Some(latch),
        }
    }

    /// Returns the guarded page's ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.base.page_id()
    }

    /// Returns the page data.
    ///
    /// # Panics
    ///
    /// Panics if the guard was already dropped.
    pub fn data(&self) -> &[u8] {
        self.latch.as_ref().expect("page guard already dropped")
    }

    /// Returns true once the pin and latch have been released.
    #[inline]
    pub fn is_dropped(&self) -> bool {
        self.base.is_dropped()
    }

    /// Releases the pin, then the latch. Safe to call more than once.
    pub fn drop_guard(&mut self) {
        self.base.drop_guard();
        self.latch = None;
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

impl std::fmt::Debug for PageReadGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageReadGuard")
            .field("page_id", &self.page_id())
            .field("dropped", &self.is_dropped())
            .finish()
    }
}

/// Write guard: owns a pin plus the frame's exclusive latch.
///
/// Obtained from [`BufferPool::fetch_page_write`]. Mutating the data marks
/// the page dirty.
pub struct PageWriteGuard<'a> {
    base: PageGuard<'a>,
    latch: Option<ArcRwLockWriteGuard<RawRwLock, Box<[u8]>>>,
}

impl<'a> PageWriteGuard<'a> {
    /// Wraps a pinned page, taking the frame latch exclusive.
    ///
    /// The caller must not hold the pool mutex.
    pub(crate) fn new(base: PageGuard<'a>) -> Self {
        let latch = base.frame().write_data_owned();
        Self {
            base,
            latch: Some(latch),
        }
    }

    /// Returns the guarded page's ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.base.page_id()
    }

    /// Returns the page data.
    ///
    /// # Panics
    ///
    /// Panics if the guard was already dropped.
    pub fn data(&self) -> &[u8] {
        self.latch.as_ref().expect("page guard already dropped")
    }

    /// Returns the page data mutably and marks the page dirty.
    ///
    /// # Panics
    ///
    /// Panics if the guard was already dropped.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.base.mark_dirty();
        self.latch.as_mut().expect("page guard already dropped")
    }

    /// Marks the page dirty without touching the data.
    ///
    /// # Panics
    ///
    /// Panics if the guard was already dropped.
    pub fn mark_dirty(&mut self) {
        self.base.mark_dirty();
    }

    /// Returns true once the pin and latch have been released.
    #[inline]
    pub fn is_dropped(&self) -> bool {
        self.base.is_dropped()
    }

    /// Releases the pin, then the latch. Safe to call more than once.
    pub fn drop_guard(&mut self) {
        self.base.drop_guard();
        self.latch = None;
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

impl std::fmt::Debug for PageWriteGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageWriteGuard")
            .field("page_id", &self.page_id())
            .field("dropped", &self.is_dropped())
            .finish()
    }
}
