//! System-wide constants for KestrelDB.

// =============================================================================
// Page Sizing
// =============================================================================

/// Default page size in bytes (4 KB).
///
/// Matches the common block size of SSDs and the OS page size, so one page
/// read or write maps to one device operation.
pub const DEFAULT_PAGE_SIZE: usize = 4 * 1024;

/// Minimum supported page size in bytes.
pub const MIN_PAGE_SIZE: usize = 512;

/// Maximum supported page size in bytes (64 KB).
pub const MAX_PAGE_SIZE: usize = 64 * 1024;

// =============================================================================
// Buffer Pool
// =============================================================================

/// Default buffer pool memory budget (256 MB).
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 256 * 1024 * 1024;

/// Minimum buffer pool memory budget (1 MB).
pub const MIN_BUFFER_POOL_SIZE: usize = 1024 * 1024;

/// Default `k` for the LRU-K replacement policy.
///
/// With `k = 2` the replacer distinguishes pages touched once (scan traffic,
/// evicted first) from pages touched at least twice (working set).
pub const DEFAULT_REPLACER_K: usize = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_bounds_are_consistent() {
        assert!(MIN_PAGE_SIZE <= DEFAULT_PAGE_SIZE);
        assert!(DEFAULT_PAGE_SIZE <= MAX_PAGE_SIZE);
        assert!(DEFAULT_PAGE_SIZE.is_power_of_two());
    }

    #[test]
    fn pool_defaults_hold_whole_pages() {
        assert!(MIN_BUFFER_POOL_SIZE >= MAX_PAGE_SIZE);
        assert_eq!(DEFAULT_BUFFER_POOL_SIZE % DEFAULT_PAGE_SIZE, 0);
        assert!(DEFAULT_REPLACER_K >= 1);
    }
}
