//! Table handler: couples a heap file and its indexes under a per-table
//! share guarded by a lock, exposing the row-level API the executor and
//! SQL layer need.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{Error, Result};
use crate::storage::heap::HeapFile;
use crate::storage::index::Index;

/// Minimum `records` ever reported by [`TableHandler::info`], so the
/// planner never specializes for a single-row table (grounded on
/// `ha_spartan.cc`'s hard-coded `records = 2`).
pub const MIN_REPORTED_RECORDS: i64 = 2;

/// Fixed small estimate `records_in_range` returns, biasing the planner
/// toward index use (grounded on `HA_SPARTAN_RECORDS_IN_RANGE` in
/// `ha_spartan.cc`).
pub const RECORDS_IN_RANGE_ESTIMATE: i64 = 10;

struct TableShareInner {
    heap: HeapFile,
    indexes: HashMap<String, Index>,
    heap_path: PathBuf,
    index_paths: HashMap<String, PathBuf>,
}

/// Process-wide per-table state: the heap file, its indexes, and the lock
/// that serializes mutations. Every open handle to a table borrows the
/// same share.
#[derive(Clone)]
pub struct TableShare {
    inner: Arc<RwLock<TableShareInner>>,
}

/// Registry of open table shares, created on first open and kept alive
/// until explicitly dropped.
#[derive(Default)]
pub struct TableRegistry {
    shares: Mutex<HashMap<String, TableShare>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn open_share(&self, name: &str, heap_path: &Path) -> Result<TableShare> {
        let mut shares = self.shares.lock()?;
        if let Some(share) = shares.get(name) {
            return Ok(share.clone());
        }
        let heap = HeapFile::open(heap_path)?;
        let share = TableShare {
            inner: Arc::new(RwLock::new(TableShareInner {
                heap,
                indexes: HashMap::new(),
                heap_path: heap_path.to_path_buf(),
                index_paths: HashMap::new(),
            })),
        };
        shares.insert(name.to_string(), share.clone());
        Ok(share)
    }

    fn create_share(&self, name: &str, heap_path: &Path) -> Result<TableShare> {
        let mut shares = self.shares.lock()?;
        let heap = HeapFile::create(heap_path)?;
        let share = TableShare {
            inner: Arc::new(RwLock::new(TableShareInner {
                heap,
                indexes: HashMap::new(),
                heap_path: heap_path.to_path_buf(),
                index_paths: HashMap::new(),
            })),
        };
        shares.insert(name.to_string(), share.clone());
        Ok(share)
    }

    /// Drops the registry's handle on a table's share. The share itself
    /// (and its underlying file handles) stays alive until every
    /// [`TableHandler`] referencing it is also dropped.
    pub fn forget(&self, name: &str) -> Result<()> {
        self.shares.lock()?.remove(name);
        Ok(())
    }

    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        let mut shares = self.shares.lock()?;
        if let Some(share) = shares.remove(old) {
            shares.insert(new.to_string(), share);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Unlocked,
    Read,
    Write,
}

/// Statistics reported by [`TableHandler::info`].
pub struct TableInfo {
    pub records: i64,
    pub records_in_range: i64,
}

/// A single open handle onto a table. Multiple handlers (from concurrent
/// queries) may share the same [`TableShare`]; only mutation operations
/// take the share's lock for their full duration.
pub struct TableHandler {
    name: String,
    share: TableShare,
    rec_buff_length: usize,
    current_position: i64,
    lock_mode: LockMode,
}

const REF_LENGTH: usize = std::mem::size_of::<i64>();

impl TableHandler {
    /// Creates a brand-new table: a fresh heap file and (initially empty)
    /// index set.
    pub fn create(registry: &TableRegistry, name: &str, heap_path: impl AsRef<Path>) -> Result<()> {
        registry.create_share(name, heap_path.as_ref())?;
        Ok(())
    }

    pub fn open(registry: &TableRegistry, name: &str, heap_path: impl AsRef<Path>, rec_buff_length: usize, mode: LockMode) -> Result<Self> {
        let share = registry.open_share(name, heap_path.as_ref())?;
        Ok(Self {
            name: name.to_string(),
            share,
            rec_buff_length,
            current_position: 0,
            lock_mode: mode,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens (or creates, lazily on first use) a named index over this
    /// table sharing the same on-disk directory as the heap file.
    pub fn open_index(&self, index_name: &str, max_key_len: usize) -> Result<()> {
        let mut inner = self.share.inner.write()?;
        if inner.indexes.contains_key(index_name) {
            return Ok(());
        }
        let mut index_path = inner.heap_path.clone();
        index_path.set_extension(format!("{index_name}.sdi"));
        let index = crate::storage::index::open_or_create(&index_path, max_key_len)?;
        inner.index_paths.insert(index_name.to_string(), index_path);
        inner.indexes.insert(index_name.to_string(), index);
        Ok(())
    }

    pub fn close_index(&self, index_name: &str) -> Result<()> {
        let mut inner = self.share.inner.write()?;
        if let (Some(mut index), Some(path)) =
            (inner.indexes.remove(index_name), inner.index_paths.get(index_name).cloned())
        {
            index.save(&path)?;
        }
        Ok(())
    }

    pub fn index_insert(&self, index_name: &str, key: &[u8], pos: i64, length: i32, allow_dupes: bool) -> Result<()> {
        let mut inner = self.share.inner.write()?;
        inner
            .indexes
            .get_mut(index_name)
            .ok_or_else(|| Error::NotFound(format!("index {index_name}")))?
            .insert(key, pos, length, allow_dupes)
    }

    /// Atomically appends a row. Row-size validation against the catalog
    /// is the caller's responsibility; this layer only moves bytes.
    pub fn write_row(&mut self, buf: &[u8]) -> Result<i64> {
        let mut inner = self.share.inner.write()?;
        inner.heap.write_row(buf)
    }

    /// Overwrites the row immediately before `current_position`, i.e. the
    /// last row returned by [`Self::rnd_next`]. This offset convention is
    /// only valid directly after `rnd_next`; an interleaved `rnd_pos` call
    /// invalidates it, and this implementation keeps that constraint
    /// rather than adding bookkeeping to paper over it.
    pub fn update_row(&mut self, old: &[u8], new: &[u8]) -> Result<()> {
        let mut inner = self.share.inner.write()?;
        let offset = self.current_position - HeapFile::row_size(self.rec_buff_length as i32);
        inner.heap.update_row(old, new, Some(offset.max(0)))?;
        Ok(())
    }

    /// Deletes the row immediately before `current_position`. When
    /// `current_position == 0` the computed offset is also `0` (the
    /// header), which is a no-op in practice rather than a guessed fix.
    pub fn delete_row(&mut self, old: &[u8]) -> Result<()> {
        let mut inner = self.share.inner.write()?;
        let offset = self.current_position - HeapFile::row_size(self.rec_buff_length as i32);
        inner.heap.delete_row(old, Some(offset.max(0)))?;
        Ok(())
    }

    pub fn rnd_init(&mut self) -> Result<()> {
        self.current_position = 0;
        Ok(())
    }

    /// Reads the row at `current_position`, advancing it to the position
    /// following the record on success. Returns `false` at EOF.
    pub fn rnd_next(&mut self, buf: &mut [u8]) -> Result<bool> {
        let inner = self.share.inner.read()?;
        match inner.heap.read_at(self.current_position)? {
            Some((payload, next)) => {
                let n = payload.len().min(buf.len());
                buf[..n].copy_from_slice(&payload[..n]);
                self.current_position = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Serializes `current_position` into an opaque reference the caller
    /// can later replay via [`Self::rnd_pos`].
    pub fn position(&self) -> [u8; REF_LENGTH] {
        self.current_position.to_le_bytes()
    }

    pub fn rnd_pos(&mut self, buf: &mut [u8], pos_ref: &[u8; REF_LENGTH]) -> Result<bool> {
        let pos = i64::from_le_bytes(*pos_ref);
        let inner = self.share.inner.read()?;
        match inner.heap.read_at(pos)? {
            Some((payload, next)) => {
                let n = payload.len().min(buf.len());
                buf[..n].copy_from_slice(&payload[..n]);
                self.current_position = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn extra(&self) {}

    pub fn external_lock(&self, _mode: LockMode) -> Result<()> {
        Ok(())
    }

    pub fn store_lock(&mut self, requested: LockMode) -> LockMode {
        if requested != LockMode::Unlocked {
            self.lock_mode = requested;
        }
        self.lock_mode
    }

    pub fn delete_all_rows(&mut self) -> Result<()> {
        let mut inner = self.share.inner.write()?;
        inner.heap.truncate()
    }

    pub fn truncate(&mut self) -> Result<()> {
        self.delete_all_rows()
    }

    pub fn info(&self) -> Result<TableInfo> {
        let inner = self.share.inner.read()?;
        let live = inner.heap.n_live() as i64;
        Ok(TableInfo {
            records: live.max(MIN_REPORTED_RECORDS),
            records_in_range: RECORDS_IN_RANGE_ESTIMATE,
        })
    }

    /// Secondary index-backed access. Declared but unimplemented; kept
    /// unimplemented rather than silently falling back to a heap scan.
    pub fn index_read_map(&self) -> Result<()> {
        Err(Error::Unsupported("wrong command".into()))
    }

    pub fn index_next(&self) -> Result<()> {
        Err(Error::Unsupported("wrong command".into()))
    }

    pub fn index_prev(&self) -> Result<()> {
        Err(Error::Unsupported("wrong command".into()))
    }

    pub fn index_first(&self) -> Result<()> {
        Err(Error::Unsupported("wrong command".into()))
    }

    pub fn index_last(&self) -> Result<()> {
        Err(Error::Unsupported("wrong command".into()))
    }
}

pub fn rename_table(registry: &TableRegistry, old_heap_path: impl AsRef<Path>, new_heap_path: impl AsRef<Path>, old_name: &str, new_name: &str) -> Result<()> {
    registry.forget(old_name)?;
    std::fs::rename(old_heap_path, new_heap_path)?;
    registry.rename(old_name, new_name)
}

pub fn drop_table(registry: &TableRegistry, name: &str, heap_path: impl AsRef<Path>) -> Result<()> {
    registry.forget(name)?;
    if heap_path.as_ref().exists() {
        std::fs::remove_file(heap_path)?;
    }
    Ok(())
}
