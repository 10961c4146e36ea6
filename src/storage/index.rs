//! In-memory sorted doubly linked list keyed by a fixed-width key,
//! persisted as a flat packed array.
//!
//! Explicitly not a B-tree. This is testing-grade by design: a balanced
//! ordered map could back the same `seek`-then-`first`/`last`/`next`/`prev`
//! protocol. We keep the linked-list shape here (as an arena of nodes
//! addressed by index rather than raw pointers) because `update`-in-place
//! and duplicate-insertion-order are defined directly in terms of list
//! position.
//!
//! On-disk layout (little-endian, packed):
//! ```text
//! header:  i32 max_key_len | u8 crashed
//! record:  u8[max_key_len] key | i64 pos | i32 length
//! ```

use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

struct IndexNode {
    key: Vec<u8>, // padded to max_key_len
    pos: i64,
    length: i32,
    prev: Option<usize>,
    next: Option<usize>,
}

/// One entry as handed back by `seek`/`first`/`last`/`next`/`prev`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: Vec<u8>,
    pub pos: i64,
    pub length: i32,
}

pub struct Index {
    max_key_len: usize,
    crashed: bool,
    nodes: Vec<Option<IndexNode>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    cursor: Option<usize>,
}

fn cmp_keys(a: &[u8], a_len: usize, b: &[u8], b_len: usize) -> Ordering {
    let n = a_len.max(b_len).min(a.len()).min(b.len());
    a[..n].cmp(&b[..n])
}

impl Index {
    pub fn new(max_key_len: usize) -> Self {
        Self {
            max_key_len,
            crashed: false,
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            cursor: None,
        }
    }

    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    pub fn crashed(&self) -> bool {
        self.crashed
    }

    fn pad(&self, key: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; self.max_key_len];
        let n = key.len().min(self.max_key_len);
        buf[..n].copy_from_slice(&key[..n]);
        buf
    }

    fn alloc(&mut self, key: Vec<u8>, pos: i64, length: i32) -> usize {
        let node = IndexNode { key, pos, length, prev: None, next: None };
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = Some(node);
            slot
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn node(&self, idx: usize) -> &IndexNode {
        self.nodes[idx].as_ref().expect("dangling index node")
    }

    fn node_mut(&mut self, idx: usize) -> &mut IndexNode {
        self.nodes[idx].as_mut().expect("dangling index node")
    }

    /// Splices in before `before` (or at the tail when `before` is `None`).
    fn link_before(&mut self, new_idx: usize, before: Option<usize>) {
        match before {
            Some(b) => {
                let prev = self.node(b).prev;
                self.node_mut(new_idx).prev = prev;
                self.node_mut(new_idx).next = Some(b);
                match prev {
                    Some(p) => self.node_mut(p).next = Some(new_idx),
                    None => self.head = Some(new_idx),
                }
                self.node_mut(b).prev = Some(new_idx);
            }
            None => {
                self.node_mut(new_idx).prev = self.tail;
                self.node_mut(new_idx).next = None;
                match self.tail {
                    Some(t) => self.node_mut(t).next = Some(new_idx),
                    None => self.head = Some(new_idx),
                }
                self.tail = Some(new_idx);
            }
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let n = self.node(idx);
            (n.prev, n.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx] = None;
        self.free.push(idx);
        if self.cursor == Some(idx) {
            self.cursor = None;
        }
    }

    /// Walks from `head` until a strictly-greater key is found and splices
    /// the new entry in before it. If an equal key is encountered and
    /// `allow_dupes` is false, nothing is inserted and `Error::Duplicate`
    /// is returned. When duplicates are allowed, the new entry lands after
    /// every existing equal entry, preserving insertion order among ties.
    pub fn insert(&mut self, key: &[u8], pos: i64, length: i32, allow_dupes: bool) -> Result<()> {
        let padded = self.pad(key);
        let mut cur = self.head;
        while let Some(idx) = cur {
            let ord = {
                let n = self.node(idx);
                cmp_keys(&padded, length as usize, &n.key, n.length as usize)
            };
            match ord {
                Ordering::Less => break,
                Ordering::Equal if !allow_dupes => {
                    return Err(Error::Duplicate(format!("key already present at pos {}", self.node(idx).pos)));
                }
                _ => cur = self.node(idx).next,
            }
        }
        let new_idx = self.alloc(padded, pos, length);
        self.link_before(new_idx, cur);
        Ok(())
    }

    /// Deletes the first node whose key matches; if `pos` is `Some`, the
    /// position must also match (duplicate discrimination).
    pub fn delete(&mut self, key: &[u8], length: i32, pos: Option<i64>) -> Result<bool> {
        let padded = self.pad(key);
        let mut cur = self.head;
        while let Some(idx) = cur {
            let n = self.node(idx);
            let ord = cmp_keys(&padded, length as usize, &n.key, n.length as usize);
            if ord == Ordering::Less {
                return Ok(false);
            }
            if ord == Ordering::Equal && pos.is_none_or(|p| p == n.pos) {
                self.unlink(idx);
                return Ok(true);
            }
            cur = n.next;
        }
        Ok(false)
    }

    /// Overwrites the key (and length) of the first node whose `pos`
    /// matches, without re-linking it into sorted position. A caller
    /// that changes a key's sort order must delete and reinsert instead.
    pub fn update(&mut self, pos: i64, new_key: &[u8], new_length: i32) -> Result<bool> {
        let mut cur = self.head;
        while let Some(idx) = cur {
            if self.node(idx).pos == pos {
                let padded = self.pad(new_key);
                let n = self.node_mut(idx);
                n.key = padded;
                n.length = new_length;
                return Ok(true);
            }
            cur = self.node(idx).next;
        }
        Ok(false)
    }

    /// Sets the cursor to the first node whose key equals `key`.
    pub fn seek(&mut self, key: &[u8], length: i32) -> Option<IndexEntry> {
        let padded = self.pad(key);
        let mut cur = self.head;
        while let Some(idx) = cur {
            let n = self.node(idx);
            match cmp_keys(&padded, length as usize, &n.key, n.length as usize) {
                Ordering::Equal => {
                    self.cursor = Some(idx);
                    return Some(self.entry_at(idx));
                }
                Ordering::Less => return None,
                Ordering::Greater => cur = n.next,
            }
        }
        None
    }

    pub fn get_index_pos(&mut self, key: &[u8], length: i32) -> Option<i64> {
        self.seek(key, length).map(|e| e.pos)
    }

    fn entry_at(&self, idx: usize) -> IndexEntry {
        let n = self.node(idx);
        IndexEntry { key: n.key[..n.length as usize].to_vec(), pos: n.pos, length: n.length }
    }

    pub fn first(&mut self) -> Option<IndexEntry> {
        self.cursor = self.head;
        self.head.map(|idx| self.entry_at(idx))
    }

    pub fn last(&mut self) -> Option<IndexEntry> {
        self.cursor = self.tail;
        self.tail.map(|idx| self.entry_at(idx))
    }

    /// Returns the entry at the cursor, then advances it forward.
    pub fn next(&mut self) -> Option<IndexEntry> {
        let idx = self.cursor?;
        let entry = self.entry_at(idx);
        self.cursor = self.node(idx).next;
        Some(entry)
    }

    /// Returns the entry at the cursor, then advances it backward.
    pub fn prev(&mut self) -> Option<IndexEntry> {
        let idx = self.cursor?;
        let entry = self.entry_at(idx);
        self.cursor = self.node(idx).prev;
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the header then loops over fixed `(key, pos, length)` triples
    /// until EOF, inserting each with duplicates allowed (rebuilds the
    /// ordered list from an unordered append log).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).open(path)?;
        let mut len_bytes = [0u8; 4];
        file.read_exact(&mut len_bytes)?;
        let max_key_len = i32::from_le_bytes(len_bytes) as usize;
        let mut crashed_byte = [0u8; 1];
        file.read_exact(&mut crashed_byte)?;

        let mut index = Self::new(max_key_len);
        index.crashed = crashed_byte[0] != 0;

        let mut key = vec![0u8; max_key_len];
        loop {
            if file.read_exact(&mut key).is_err() {
                break;
            }
            let mut pos_bytes = [0u8; 8];
            file.read_exact(&mut pos_bytes)?;
            let mut length_bytes = [0u8; 4];
            file.read_exact(&mut length_bytes)?;
            let pos = i64::from_le_bytes(pos_bytes);
            let length = i32::from_le_bytes(length_bytes);
            index.insert(&key, pos, length, true)?;
        }
        Ok(index)
    }

    /// Truncates the file, rewrites the header, then traverses the list
    /// front to back emitting triples.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path)?;
        file.write_all(&(self.max_key_len as i32).to_le_bytes())?;
        file.write_all(&[self.crashed as u8])?;

        let mut cur = self.head;
        while let Some(idx) = cur {
            let n = self.node(idx);
            file.write_all(&n.key)?;
            file.write_all(&n.pos.to_le_bytes())?;
            file.write_all(&n.length.to_le_bytes())?;
            cur = n.next;
        }
        Ok(())
    }

    pub fn mark_crashed(&mut self, crashed: bool) {
        self.crashed = crashed;
    }
}

/// Opens (or creates) an index file at `path` keyed by `max_key_len` bytes.
pub fn open_or_create(path: impl AsRef<Path>, max_key_len: usize) -> Result<Index> {
    let path = path.as_ref();
    if path.exists() {
        Index::load(path)
    } else {
        let mut index = Index::new(max_key_len);
        index.save(path)?;
        Ok(index)
    }
}
