//! In-memory disk provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use kestrel_common::constants::DEFAULT_PAGE_SIZE;
use kestrel_common::types::PageId;
use parking_lot::Mutex;

use super::{check_request, DiskProvider, DiskResult};

/// Unbounded in-memory page store.
///
/// Behaves like an infinitely large disk: any page id can be written, and
/// reading an unwritten page yields zeroes. Used by the test suite and as a
/// scratch backend; the read/write counters let tests assert exactly how
/// much I/O an operation performed.
pub struct MemoryDisk {
    page_size: usize,
    pages: Mutex<HashMap<PageId, Box<[u8]>>>,
    read_count: AtomicU64,
    write_count: AtomicU64,
}

impl MemoryDisk {
    /// Creates a store with the given page size.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            pages: Mutex::new(HashMap::new()),
            read_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
        }
    }

    /// Number of `read_page` calls served so far.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::Relaxed)
    }

    /// Number of `write_page` calls served so far.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Number of distinct pages that have been written.
    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }
}

impl Default for MemoryDisk {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl DiskProvider for MemoryDisk {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> DiskResult<()> {
        check_request(self.page_size, page_id, buf.len())?;
        self.read_count.fetch_add(1, Ordering::Relaxed);

        match self.pages.lock().get(&page_id) {
            Some(data) => buf.copy_from_slice(data),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> DiskResult<()> {
        check_request(self.page_size, page_id, buf.len())?;
        self.write_count.fetch_add(1, Ordering::Relaxed);

        self.pages.lock().insert(page_id, buf.into());
        Ok(())
    }
}

impl std::fmt::Debug for MemoryDisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDisk")
            .field("page_size", &self.page_size)
            .field("pages", &self.page_count())
            .field("reads", &self.read_count())
            .field("writes", &self.write_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_pages_read_as_zeroes() {
        let disk = MemoryDisk::new(512);
        let mut buf = vec![0xFFu8; 512];

        disk.read_page(PageId::new(3), &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
        assert_eq!(disk.read_count(), 1);
        assert_eq!(disk.page_count(), 0);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let disk = MemoryDisk::new(512);

        let mut page = vec![0u8; 512];
        page[..4].copy_from_slice(b"data");
        disk.write_page(PageId::new(7), &page).unwrap();

        let mut buf = vec![0u8; 512];
        disk.read_page(PageId::new(7), &mut buf).unwrap();
        assert_eq!(buf, page);
        assert_eq!(disk.write_count(), 1);
    }

    #[test]
    fn rejects_bad_requests() {
        let disk = MemoryDisk::new(512);
        let mut small = vec![0u8; 128];

        assert!(disk.read_page(PageId::new(0), &mut small).is_err());
        assert!(disk.write_page(PageId::INVALID, &vec![0u8; 512]).is_err());
        // Failed requests are not counted
        assert_eq!(disk.read_count(), 0);
        assert_eq!(disk.write_count(), 0);
    }
}
