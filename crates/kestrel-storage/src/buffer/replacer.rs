//! Plain FIFO-of-use replacement queue.
//!
//! [`LruReplacer`] keeps evictable frames in the order they were last
//! touched: the head is the coldest frame, the tail the warmest. Membership
//! means "evictable"; a frame that is pinned or unknown is simply absent.
//!
//! Lookups are linear scans. The queue never outgrows the pool's frame
//! count, so the scans stay short; the two-queue LRU-K policy composes two
//! of these rather than anything fancier.

use std::collections::VecDeque;

use super::frame::FrameId;

/// Bounded queue of evictable frames, coldest first.
pub struct LruReplacer {
    queue: VecDeque<FrameId>,
    capacity: usize,
}

impl LruReplacer {
    /// Creates a replacer that tracks at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pops and returns the coldest frame, or `None` when nothing is
    /// tracked.
    pub fn victim(&mut self) -> Option<FrameId> {
        self.queue.pop_front()
    }

    /// Removes `frame_id` from the queue if present.
    pub fn pin(&mut self, frame_id: FrameId) {
        if let Some(pos) = self.queue.iter().position(|&f| f == frame_id) {
            self.queue.remove(pos);
        }
    }

    /// Appends `frame_id` as the warmest entry.
    ///
    /// No-op if already tracked. If the queue is full, the coldest entry is
    /// discarded to make room.
    pub fn unpin(&mut self, frame_id: FrameId) {
        if self.queue.contains(&frame_id) {
            return;
        }
        if self.queue.len() >= self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(frame_id);
    }

    /// Moves `frame_id` to the warm end of the queue if present.
    pub fn access(&mut self, frame_id: FrameId) {
        if let Some(pos) = self.queue.iter().position(|&f| f == frame_id) {
            self.queue.remove(pos);
            self.queue.push_back(frame_id);
        }
    }

    /// Number of frames currently tracked.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl std::fmt::Debug for LruReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruReplacer")
            .field("queue", &self.queue)
            .field("capacity", &self.capacity)
            .finish()
    }
}
