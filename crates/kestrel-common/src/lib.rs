//! # kestrel-common
//!
//! Common types and constants for KestrelDB.
//!
//! This crate provides the foundational vocabulary shared by all KestrelDB
//! components:
//!
//! - **Types**: core identifiers (`PageId`, `Lsn`)
//! - **Constants**: page sizing and buffer pool defaults
//!
//! ## Example
//!
//! ```rust
//! use kestrel_common::types::{Lsn, PageId};
//!
//! let page_id = PageId::new(42);
//! assert!(page_id.is_valid());
//! assert!(!Lsn::INVALID.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{Lsn, PageId};
