//! Page-granular disk I/O.
//!
//! A [`DiskProvider`] persists fixed-size pages addressed by [`PageId`].
//! Providers are synchronous and internally thread-safe; the buffer pool
//! calls them from whichever thread happens to need the I/O.
//!
//! Reading a page that was never written yields an all-zero buffer, so
//! callers never observe uninitialized storage.

use kestrel_common::types::PageId;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileDisk;
pub use memory::MemoryDisk;

/// Result type for disk operations.
pub type DiskResult<T> = Result<T, DiskError>;

/// Errors raised by disk providers.
#[derive(Debug, Error)]
pub enum DiskError {
    /// The underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The invalid sentinel page id cannot be read or written.
    #[error("cannot address storage with the invalid page id")]
    InvalidPageId,

    /// The caller's buffer does not match the provider's page size.
    #[error("buffer is {actual} bytes but the page size is {expected}")]
    BufferSize {
        /// The provider's page size.
        expected: usize,
        /// The length of the buffer the caller passed.
        actual: usize,
    },
}

/// Synchronous, thread-safe page storage.
///
/// Implementations must tolerate concurrent calls; the buffer pool performs
/// write-backs and reads from multiple threads.
pub trait DiskProvider: Send + Sync {
    /// The fixed page size in bytes.
    fn page_size(&self) -> usize;

    /// Fills `buf` with the last contents written for `page_id`, or zeroes
    /// if the page was never written.
    ///
    /// `buf` must be exactly [`page_size`](DiskProvider::page_size) bytes.
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> DiskResult<()>;

    /// Durably persists `buf` as the contents of `page_id`.
    ///
    /// `buf` must be exactly [`page_size`](DiskProvider::page_size) bytes.
    fn write_page(&self, page_id: PageId, buf: &[u8]) -> DiskResult<()>;

    /// Flushes any buffered writes to durable storage.
    fn sync(&self) -> DiskResult<()> {
        Ok(())
    }
}

/// Validates the `(page_id, buf)` pair every provider call receives.
fn check_request(page_size: usize, page_id: PageId, buf_len: usize) -> DiskResult<()> {
    if !page_id.is_valid() {
        return Err(DiskError::InvalidPageId);
    }
    if buf_len != page_size {
        return Err(DiskError::BufferSize {
            expected: page_size,
            actual: buf_len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation() {
        assert!(check_request(4096, PageId::new(0), 4096).is_ok());
        assert!(matches!(
            check_request(4096, PageId::INVALID, 4096),
            Err(DiskError::InvalidPageId)
        ));
        assert!(matches!(
            check_request(4096, PageId::new(0), 512),
            Err(DiskError::BufferSize {
                expected: 4096,
                actual: 512
            })
        ));
    }
}
