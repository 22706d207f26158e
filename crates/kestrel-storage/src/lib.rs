//! # kestrel-storage
//!
//! The storage layer of KestrelDB: synchronous page I/O providers and the
//! buffer pool that caches pages in memory.
//!
//! All access to persisted pages goes through the [`buffer::BufferPool`],
//! which hands out scoped guards that pin a page for the duration of its
//! use. The pool talks to a [`disk::DiskProvider`] for the actual reads and
//! writes; [`disk::FileDisk`] backs the pool with a single file, and
//! [`disk::MemoryDisk`] keeps everything in memory for tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Page caching and replacement
pub mod buffer;

/// Page-granular disk I/O
pub mod disk;
