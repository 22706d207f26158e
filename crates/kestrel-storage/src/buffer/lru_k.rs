//! Two-queue LRU-K replacement policy.
//!
//! Classical LRU-K evicts the frame whose k-th most recent access is oldest,
//! treating frames with fewer than `k` recorded accesses as having infinite
//! backward distance. This implementation approximates that rule with two
//! FIFO-of-use queues:
//!
//! 1. Frames with fewer than `k` recorded accesses wait in the *new* queue
//!    and are always evicted first.
//! 2. Frames with `k` or more accesses graduate to the *old* queue and are
//!    evicted in least-recently-used order only when the new queue is empty.
//!
//! One-shot scan traffic therefore drains out of the pool before it can
//! displace the established working set.
//!
//! Pinning a frame drops its tracking entry, access history included; a
//! frame starts cold again each time it becomes evictable.

use std::collections::{HashMap, VecDeque};

use super::frame::FrameId;
use super::replacer::LruReplacer;

/// Per-frame tracking state.
struct LruKNode {
    /// Timestamps of the most recent accesses, oldest first, at most `k`.
    history: VecDeque<u64>,
    is_evictable: bool,
}

impl LruKNode {
    fn new() -> Self {
        Self {
            history: VecDeque::new(),
            is_evictable: false,
        }
    }

    fn record(&mut self, timestamp: u64, k: usize) {
        if self.history.len() == k {
            self.history.pop_front();
        }
        self.history.push_back(timestamp);
    }

    /// True once the node has accumulated `k` recorded accesses.
    fn has_full_history(&self, k: usize) -> bool {
        self.history.len() >= k
    }
}

/// LRU-K replacer over the pool's frames.
///
/// Tracks at most `num_frames` evictable frames at a time. The caller (the
/// buffer pool) serializes all calls; there is no interior locking.
pub struct LruKReplacer {
    nodes: HashMap<FrameId, LruKNode>,
    new_queue: LruReplacer,
    old_queue: LruReplacer,
    current_timestamp: u64,
    curr_size: usize,
    num_frames: usize,
    k: usize,
}

impl LruKReplacer {
    /// Creates a replacer for a pool of `num_frames` frames with the given
    /// `k` (must be >= 1).
    pub fn new(num_frames: usize, k: usize) -> Self {
        debug_assert!(k >= 1, "LRU-K requires k >= 1");
        Self {
            nodes: HashMap::with_capacity(num_frames),
            new_queue: LruReplacer::new(num_frames),
            old_queue: LruReplacer::new(num_frames),
            current_timestamp: 0,
            curr_size: 0,
            num_frames,
            k,
        }
    }

    /// Records an access to `frame_id` at the next timestamp.
    ///
    /// An evictable frame whose history fills up during this call graduates
    /// from the new queue to the old queue; one that stays in its queue is
    /// rewarmed there. A non-evictable frame only accumulates history.
    pub fn record_access(&mut self, frame_id: FrameId) {
        self.current_timestamp += 1;
        let timestamp = self.current_timestamp;
        let k = self.k;

        let node = self.nodes.entry(frame_id).or_insert_with(LruKNode::new);
        if !node.is_evictable {
            node.record(timestamp, k);
            return;
        }

        if node.has_full_history(k) {
            node.record(timestamp, k);
            self.old_queue.access(frame_id);
        } else {
            node.record(timestamp, k);
            if node.has_full_history(k) {
                // Graduated on this access
                self.new_queue.pin(frame_id);
                self.old_queue.unpin(frame_id);
            } else {
                self.new_queue.access(frame_id);
            }
        }
    }

    /// Marks `frame_id` evictable or not.
    ///
    /// Making an unknown frame evictable starts it cold in the new queue.
    /// Making a known frame non-evictable removes it from its queue and
    /// drops its node, history included.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if evictable {
            self.make_evictable(frame_id);
        } else {
            self.make_unevictable(frame_id);
        }
    }

    fn make_evictable(&mut self, frame_id: FrameId) {
        match self.nodes.get(&frame_id) {
            None => {
                self.reserve_slot();
                let mut node = LruKNode::new();
                node.is_evictable = true;
                self.nodes.insert(frame_id, node);
                self.new_queue.unpin(frame_id);
            }
            Some(node) => {
                if node.is_evictable {
                    return;
                }
                let graduated = node.has_full_history(self.k);
                self.reserve_slot();
                if let Some(node) = self.nodes.get_mut(&frame_id) {
                    node.is_evictable = true;
                }
                if graduated {
                    self.old_queue.unpin(frame_id);
                } else {
                    self.new_queue.unpin(frame_id);
                }
            }
        }
    }

    fn make_unevictable(&mut self, frame_id: FrameId) {
        let Some(node) = self.nodes.remove(&frame_id) else {
            return;
        };
        if node.has_full_history(self.k) {
            self.old_queue.pin(frame_id);
        } else {
            self.new_queue.pin(frame_id);
        }
        if node.is_evictable {
            self.curr_size -= 1;
        }
    }

    /// Makes room for one more tracked frame.
    ///
    /// Below the bound this just grows `curr_size`; at the bound a victim is
    /// discarded (new queue first) so the tracked count stays put.
    fn reserve_slot(&mut self) {
        if self.curr_size < self.num_frames {
            self.curr_size += 1;
            return;
        }
        let victim = if !self.new_queue.is_empty() {
            self.new_queue.victim()
        } else {
            self.old_queue.victim()
        };
        debug_assert!(
            victim.is_some(),
            "replacer at capacity but neither queue has a victim"
        );
        if let Some(victim) = victim {
            self.nodes.remove(&victim);
        }
    }

    /// Selects and removes the next eviction victim.
    ///
    /// Frames with partial history (new queue) always go before frames with
    /// full history (old queue); within a queue, least recently used wins.
    /// Returns `None` when no frame is evictable.
    pub fn evict(&mut self) -> Option<FrameId> {
        let victim = self.new_queue.victim().or_else(|| self.old_queue.victim())?;
        self.curr_size -= 1;
        self.nodes.remove(&victim);
        Some(victim)
    }

    /// Forgets `frame_id` entirely.
    ///
    /// Called when the page occupying the frame is deleted. Queue membership
    /// and the evictable count are only adjusted if the frame was tracked as
    /// evictable.
    pub fn remove(&mut self, frame_id: FrameId) {
        let Some(node) = self.nodes.remove(&frame_id) else {
            return;
        };
        if node.is_evictable {
            if node.has_full_history(self.k) {
                self.old_queue.pin(frame_id);
            } else {
                self.new_queue.pin(frame_id);
            }
            self.curr_size -= 1;
        }
    }

    /// Number of evictable frames currently tracked.
    pub fn len(&self) -> usize {
        self.curr_size
    }

    /// Returns true when no frame is evictable.
    pub fn is_empty(&self) -> bool {
        self.curr_size == 0
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruKReplacer")
            .field("k", &self.k)
            .field("num_frames", &self.num_frames)
            .field("evictable", &self.curr_size)
            .field("new_queue", &self.new_queue)
            .field("old_queue", &self.old_queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: usize) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn evict_on_empty() {
        let mut replacer = LruKReplacer::new(4, 2);
        assert_eq!(replacer.evict(), None);
        assert!(replacer.is_empty());
    }

    #[test]
    fn partial_history_evicted_before_full_history() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);

        // Two accesses graduate frame 0 to the old queue
        replacer.record_access(fid(0));
        replacer.record_access(fid(0));

        // Frame 1 has partial history and must go first
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(0)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn lru_order_within_a_queue() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);
        replacer.set_evictable(fid(2), true);

        // One access each keeps them in the new queue; frame 0 is rewarmed
        replacer.record_access(fid(0));

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }

    #[test]
    fn graduated_frames_keep_lru_order() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);
        for _ in 0..2 {
            replacer.record_access(fid(0));
            replacer.record_access(fid(1));
        }

        // Both are in the old queue now; rewarm frame 0
        replacer.record_access(fid(0));

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(0)));
    }

    #[test]
    fn pinning_discards_history() {
        let mut replacer = LruKReplacer::new(4, 3);

        // Frame 0 graduates, then gets pinned
        replacer.set_evictable(fid(0), true);
        for _ in 0..3 {
            replacer.record_access(fid(0));
        }
        replacer.set_evictable(fid(0), false);
        assert_eq!(replacer.len(), 0);

        // Two fresh accesses while pinned: fewer than k, so if the old
        // history had survived the pin, frame 0 would re-enter the old queue
        replacer.record_access(fid(0));
        replacer.record_access(fid(0));
        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);

        // Frame 0 is back in the new queue, colder than frame 1
        assert_eq!(replacer.evict(), Some(fid(0)));
        assert_eq!(replacer.evict(), Some(fid(1)));
    }

    #[test]
    fn capacity_bound_discards_a_tracked_frame() {
        let mut replacer = LruKReplacer::new(2, 2);

        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.len(), 2);

        // At capacity: admitting frame 2 pushes out the coldest new-queue entry
        replacer.set_evictable(fid(2), true);
        assert_eq!(replacer.len(), 2);

        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), Some(fid(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn set_evictable_is_idempotent() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(0), true);
        assert_eq!(replacer.len(), 1);

        replacer.set_evictable(fid(1), false);
        assert_eq!(replacer.len(), 1);
    }

    #[test]
    fn access_alone_does_not_make_a_frame_evictable() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.record_access(fid(0));
        replacer.record_access(fid(0));
        assert_eq!(replacer.len(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn remove_forgets_a_frame() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);

        replacer.remove(fid(0));
        assert_eq!(replacer.len(), 1);
        assert_eq!(replacer.evict(), Some(fid(1)));
        assert_eq!(replacer.evict(), None);

        // Unknown and non-evictable removals are no-ops
        replacer.remove(fid(9));
        replacer.record_access(fid(5));
        replacer.remove(fid(5));
        assert_eq!(replacer.len(), 0);
    }

    #[test]
    fn evict_updates_size() {
        let mut replacer = LruKReplacer::new(4, 2);

        replacer.set_evictable(fid(0), true);
        replacer.set_evictable(fid(1), true);
        assert_eq!(replacer.len(), 2);

        replacer.evict();
        assert_eq!(replacer.len(), 1);
        replacer.evict();
        assert!(replacer.is_empty());
    }
}
