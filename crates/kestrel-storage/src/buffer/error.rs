//! Buffer pool errors.

use kestrel_common::types::PageId;
use thiserror::Error;

use crate::disk::DiskError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Every frame is pinned and nothing can be evicted.
    #[error("buffer pool exhausted: all frames are pinned")]
    PoolExhausted,

    /// The operation needs the page to be resident, and it is not.
    #[error("page {page_id} is not resident in the buffer pool")]
    PageNotFound {
        /// The page that was requested.
        page_id: PageId,
    },

    /// The page is still in use and cannot be deleted.
    #[error("page {page_id} is pinned ({pin_count} pins) and cannot be deleted")]
    PagePinned {
        /// The page that was requested.
        page_id: PageId,
        /// How many pins were outstanding at the time.
        pin_count: u32,
    },

    /// The invalid sentinel page id was passed to an operation.
    #[error("invalid page id")]
    InvalidPageId,

    /// The pool was constructed with an unusable configuration.
    #[error("configuration error: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
    },

    /// The disk provider failed.
    #[error("disk operation failed: {0}")]
    Disk(#[from] DiskError),
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a page-not-resident error.
    pub fn page_not_found(page_id: PageId) -> Self {
        Self::PageNotFound { page_id }
    }

    /// Returns true if retrying after other users unpin can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted | Self::PagePinned { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BufferError::page_not_found(PageId::new(5));
        assert_eq!(err.to_string(), "page 5 is not resident in the buffer pool");
        assert_eq!(
            BufferError::PoolExhausted.to_string(),
            "buffer pool exhausted: all frames are pinned"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(BufferError::PoolExhausted.is_retryable());
        assert!(BufferError::PagePinned {
            page_id: PageId::new(1),
            pin_count: 2
        }
        .is_retryable());
        assert!(!BufferError::page_not_found(PageId::new(1)).is_retryable());
    }
}
