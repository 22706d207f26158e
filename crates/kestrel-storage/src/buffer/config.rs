//! Buffer pool configuration.

use kestrel_common::constants::{
    DEFAULT_BUFFER_POOL_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_REPLACER_K, MAX_PAGE_SIZE,
    MIN_BUFFER_POOL_SIZE, MIN_PAGE_SIZE,
};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the pool.
    pub num_frames: usize,
    /// Page size in bytes.
    pub page_size: usize,
    /// The `k` of the LRU-K replacement policy.
    pub replacer_k: usize,
}

impl BufferPoolConfig {
    /// Creates a configuration with the specified number of frames.
    pub fn new(num_frames: usize) -> Self {
        Self {
            num_frames,
            page_size: DEFAULT_PAGE_SIZE,
            replacer_k: DEFAULT_REPLACER_K,
        }
    }

    /// Creates a configuration from a memory budget in bytes.
    pub fn from_memory_size(memory_bytes: usize) -> Self {
        let memory_bytes = memory_bytes.max(MIN_BUFFER_POOL_SIZE);
        Self::new(memory_bytes / DEFAULT_PAGE_SIZE)
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the LRU-K `k` parameter.
    pub fn with_replacer_k(mut self, replacer_k: usize) -> Self {
        self.replacer_k = replacer_k;
        self
    }

    /// Returns the total memory held by the frame buffers.
    pub fn memory_usage(&self) -> usize {
        self.num_frames * self.page_size
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_frames == 0 {
            return Err("num_frames must be > 0");
        }
        if !self.page_size.is_power_of_two() {
            return Err("page_size must be a power of 2");
        }
        if self.page_size < MIN_PAGE_SIZE {
            return Err("page_size is below the minimum");
        }
        if self.page_size > MAX_PAGE_SIZE {
            return Err("page_size is above the maximum");
        }
        if self.replacer_k == 0 {
            return Err("replacer_k must be >= 1");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::from_memory_size(DEFAULT_BUFFER_POOL_SIZE)
    }
}
