//! Append-oriented heap file with soft-deleted, length-prefixed records.
//!
//! On-disk layout (little-endian, packed):
//! ```text
//! header:  u8 crashed | i32 n_live | i32 n_deleted
//! record:  u8 deleted | i32 len    | u8[len] payload
//! ```
//! `row_size(len) = len + 5`. A record with `deleted == 1` is never
//! returned by a read/scan but still occupies its slot.
//!
//! Reads use positional (`pread`/`pwrite`-style) I/O via
//! [`std::os::unix::fs::FileExt`] instead of seek-then-read, so that a
//! reader holding only a shared reference never needs to serialize
//! against another reader's file cursor (readers don't take the
//! share's mutation lock). This ties the crate to Unix; see DESIGN.md.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::error::Result;

pub const HEADER_SIZE: u64 = 1 + 4 + 4;
pub const RECORD_HEADER_SIZE: i64 = 1 + 4;

pub struct HeapFile {
    file: File,
    crashed: bool,
    n_live: i32,
    n_deleted: i32,
}

impl HeapFile {
    /// Truncates or creates the file at `path` and writes a fresh header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path)?;
        let mut heap = Self { file, crashed: false, n_live: 0, n_deleted: 0 };
        heap.write_header()?;
        Ok(heap)
    }

    /// Opens an existing heap file and reads its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact_at(&mut header, 0)?;
        Ok(Self {
            file,
            crashed: header[0] != 0,
            n_live: i32::from_le_bytes(header[1..5].try_into().unwrap()),
            n_deleted: i32::from_le_bytes(header[5..9].try_into().unwrap()),
        })
    }

    fn write_header(&mut self) -> Result<()> {
        let mut header = [0u8; HEADER_SIZE as usize];
        header[0] = self.crashed as u8;
        header[1..5].copy_from_slice(&self.n_live.to_le_bytes());
        header[5..9].copy_from_slice(&self.n_deleted.to_le_bytes());
        self.file.write_all_at(&header, 0)?;
        Ok(())
    }

    pub fn n_live(&self) -> i32 {
        self.n_live
    }

    pub fn n_deleted(&self) -> i32 {
        self.n_deleted
    }

    pub fn crashed(&self) -> bool {
        self.crashed
    }

    pub fn row_size(len: i32) -> i64 {
        len as i64 + RECORD_HEADER_SIZE
    }

    /// Appends `[0][len][payload]` at EOF. Returns the offset of the
    /// record's `deleted` byte, which is what every other operation's
    /// `pos` argument refers to.
    pub fn write_row(&mut self, payload: &[u8]) -> Result<i64> {
        let offset = self.file.metadata()?.len().max(HEADER_SIZE);
        let mut record = Vec::with_capacity(RECORD_HEADER_SIZE as usize + payload.len());
        record.push(0u8);
        record.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        record.extend_from_slice(payload);
        self.file.write_all_at(&record, offset)?;
        self.n_live += 1;
        self.write_header()?;
        Ok(offset as i64)
    }

    /// Reads the record-header + payload at `pos`, skipping forward over
    /// any deleted slots. Returns `(payload, pos_of_next_record)` or
    /// `None` at EOF.
    pub fn read_at(&self, pos: i64) -> Result<Option<(Vec<u8>, i64)>> {
        let mut cursor = pos.max(HEADER_SIZE as i64);
        loop {
            let mut rec_header = [0u8; RECORD_HEADER_SIZE as usize];
            if self.file.read_exact_at(&mut rec_header, cursor as u64).is_err() {
                return Ok(None);
            }
            let deleted = rec_header[0];
            let len = i32::from_le_bytes(rec_header[1..5].try_into().unwrap());
            let next = cursor + Self::row_size(len);
            if deleted != 0 {
                cursor = next;
                continue;
            }
            let mut payload = vec![0u8; len as usize];
            self.file.read_exact_at(&mut payload, cursor as u64 + RECORD_HEADER_SIZE as u64)?;
            return Ok(Some((payload, next)));
        }
    }

    /// Scans from the header forward, comparing each live payload against
    /// `needle` byte-for-byte, returning the position of the first match.
    fn find_by_value(&self, needle: &[u8]) -> Result<Option<i64>> {
        let mut cursor = HEADER_SIZE as i64;
        loop {
            match self.read_at(cursor)? {
                None => return Ok(None),
                Some((payload, next)) => {
                    if payload == needle {
                        // `next` is this live record's start plus its row size,
                        // regardless of how many deleted slots were skipped
                        // getting here, so this recovers the record's start.
                        return Ok(Some(next - Self::row_size(payload.len() as i32)));
                    }
                    cursor = next;
                }
            }
        }
    }

    /// Overwrites the payload in place at `pos`, or at the first live row
    /// byte-equal to `old` when `pos` is `None`. `new` must be the same
    /// length as the catalog row length.
    pub fn update_row(&mut self, old: &[u8], new: &[u8], pos: Option<i64>) -> Result<bool> {
        let target = match pos {
            Some(p) => Some(p),
            None => self.find_by_value(old)?,
        };
        let Some(record_start) = target else { return Ok(false) };
        self.file.write_all_at(new, record_start as u64 + RECORD_HEADER_SIZE as u64)?;
        Ok(true)
    }

    /// Marks the record at `pos` (or the first live row byte-equal to
    /// `old` when `pos` is `None`) deleted.
    pub fn delete_row(&mut self, old: &[u8], pos: Option<i64>) -> Result<bool> {
        let target = match pos {
            Some(p) => Some(p),
            None => self.find_by_value(old)?,
        };
        let Some(record_start) = target else { return Ok(false) };
        self.file.write_all_at(&[1u8], record_start as u64)?;
        self.n_live -= 1;
        self.n_deleted += 1;
        self.write_header()?;
        Ok(true)
    }

    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.n_live = 0;
        self.n_deleted = 0;
        self.crashed = false;
        self.write_header()?;
        Ok(())
    }

    /// Convenience traversal over every live payload, front to back.
    pub fn iter_live(&self) -> Result<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        let mut cursor = HEADER_SIZE as i64;
        while let Some((payload, next)) = self.read_at(cursor)? {
            out.push(payload);
            cursor = next;
        }
        Ok(out)
    }

    pub fn mark_crashed(&mut self, crashed: bool) -> Result<()> {
        self.crashed = crashed;
        self.write_header()
    }
}

impl std::fmt::Debug for HeapFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFile")
            .field("n_live", &self.n_live)
            .field("n_deleted", &self.n_deleted)
            .field("crashed", &self.crashed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn temp_path() -> std::path::PathBuf {
        NamedTempFile::new().unwrap().into_temp_path().keep().unwrap()
    }

    #[test]
    fn write_then_read_round_trips() -> Result<()> {
        let path = temp_path();
        let mut heap = HeapFile::create(&path)?;
        let pos = heap.write_row(b"hello")?;
        let (payload, _next) = heap.read_at(pos)?.expect("row present");
        assert_eq!(payload, b"hello");
        assert_eq!(heap.n_live(), 1);
        Ok(())
    }

    #[test]
    fn delete_then_scan_skips_it() -> Result<()> {
        let path = temp_path();
        let mut heap = HeapFile::create(&path)?;
        heap.write_row(b"row1")?;
        heap.write_row(b"row2")?;
        assert!(heap.delete_row(b"row1", None)?);
        let rows = heap.iter_live()?;
        assert_eq!(rows, vec![b"row2".to_vec()]);
        assert_eq!(heap.n_live(), 1);
        assert_eq!(heap.n_deleted(), 1);
        Ok(())
    }

    #[test]
    fn update_row_by_value_overwrites_in_place() -> Result<()> {
        let path = temp_path();
        let mut heap = HeapFile::create(&path)?;
        heap.write_row(b"aaaa")?;
        assert!(heap.update_row(b"aaaa", b"bbbb", None)?);
        let rows = heap.iter_live()?;
        assert_eq!(rows, vec![b"bbbb".to_vec()]);
        Ok(())
    }

    #[test]
    fn ten_rows_delete_two_scan_compacts() -> Result<()> {
        let path = temp_path();
        let mut heap = HeapFile::create(&path)?;
        let mut positions = Vec::new();
        for i in 0..10u8 {
            positions.push(heap.write_row(&[i])?);
        }
        heap.delete_row(&[], Some(positions[2]))?;
        heap.delete_row(&[], Some(positions[6]))?;
        let rows = heap.iter_live()?;
        let expected: Vec<Vec<u8>> =
            [0u8, 1, 3, 4, 5, 7, 8, 9].iter().map(|&b| vec![b]).collect();
        assert_eq!(rows, expected);
        Ok(())
    }

    #[test]
    fn truncate_resets_to_empty() -> Result<()> {
        let path = temp_path();
        let mut heap = HeapFile::create(&path)?;
        heap.write_row(b"x")?;
        heap.truncate()?;
        assert_eq!(heap.n_live(), 0);
        assert_eq!(heap.n_deleted(), 0);
        assert!(heap.iter_live()?.is_empty());
        Ok(())
    }
}
