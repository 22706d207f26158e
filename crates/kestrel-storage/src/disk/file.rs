//! File-backed disk provider.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use kestrel_common::types::PageId;
use parking_lot::Mutex;
use tracing::trace;

use super::{check_request, DiskProvider, DiskResult};

/// Single-file page store.
///
/// Page `n` lives at byte offset `n * page_size`. The file grows on demand;
/// reads past the end of the file return zeroes for the missing tail, which
/// keeps the never-written-reads-as-zero contract without preallocating.
///
/// A single file handle is shared behind a mutex, so concurrent callers are
/// serialized per operation. Seek and transfer happen under the lock to keep
/// the position consistent.
pub struct FileDisk {
    page_size: usize,
    file: Mutex<File>,
    path: PathBuf,
}

impl FileDisk {
    /// Opens (creating if necessary) the file at `path`.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> DiskResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        Ok(Self {
            page_size,
            file: Mutex::new(file),
            path,
        })
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn offset(&self, page_id: PageId) -> u64 {
        page_id.as_u64() * self.page_size as u64
    }
}

impl DiskProvider for FileDisk {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> DiskResult<()> {
        check_request(self.page_size, page_id, buf.len())?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(self.offset(page_id)))?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                // Past end of file: the rest of the page was never written.
                buf[filled..].fill(0);
                break;
            }
            filled += n;
        }

        trace!(page_id = %page_id, "read page from {}", self.path.display());
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> DiskResult<()> {
        check_request(self.page_size, page_id, buf.len())?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(self.offset(page_id)))?;
        file.write_all(buf)?;

        trace!(page_id = %page_id, "wrote page to {}", self.path.display());
        Ok(())
    }

    fn sync(&self) -> DiskResult<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }
}

impl std::fmt::Debug for FileDisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDisk")
            .field("path", &self.path)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PAGE: usize = 512;

    #[test]
    fn roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let disk = FileDisk::open(dir.path().join("pages.db"), PAGE).unwrap();

        let mut page = vec![0u8; PAGE];
        page[0] = 0xAB;
        page[PAGE - 1] = 0xCD;
        disk.write_page(PageId::new(2), &page).unwrap();
        disk.sync().unwrap();

        let mut buf = vec![0u8; PAGE];
        disk.read_page(PageId::new(2), &mut buf).unwrap();
        assert_eq!(buf, page);
    }

    #[test]
    fn unwritten_page_reads_as_zeroes() {
        let dir = tempdir().unwrap();
        let disk = FileDisk::open(dir.path().join("pages.db"), PAGE).unwrap();

        // Page 5 is far past the end of the empty file
        let mut buf = vec![0xFFu8; PAGE];
        disk.read_page(PageId::new(5), &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn gap_between_pages_reads_as_zeroes() {
        let dir = tempdir().unwrap();
        let disk = FileDisk::open(dir.path().join("pages.db"), PAGE).unwrap();

        disk.write_page(PageId::new(4), &vec![1u8; PAGE]).unwrap();

        // Pages 0..4 exist as a hole in the file now
        let mut buf = vec![0xFFu8; PAGE];
        disk.read_page(PageId::new(1), &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.db");

        {
            let disk = FileDisk::open(&path, PAGE).unwrap();
            disk.write_page(PageId::new(0), &vec![9u8; PAGE]).unwrap();
            disk.sync().unwrap();
        }

        let disk = FileDisk::open(&path, PAGE).unwrap();
        let mut buf = vec![0u8; PAGE];
        disk.read_page(PageId::new(0), &mut buf).unwrap();
        assert_eq!(buf, vec![9u8; PAGE]);
    }
}
