//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Line storage strategies.
//!
//! A store is a flat array of slots. Slot 0 is the sentinel. The buffer
//! decides which slots are live; the store only holds text and marks and
//! swaps slots on request.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Transient per-line tag.
pub type Mark = Option<char>;

/// Storage behind a [`crate::buffer::Buffer`].
pub trait LineStore: fmt::Debug {
    /// Number of physical slots, sentinel included.
    fn slots(&self) -> usize;

    fn get_text(&self, idx: usize) -> io::Result<String>;

    /// Replace the text of slot `idx`, or grow by one slot when
    /// `idx == slots()`. A replaced slot keeps its mark; a new one is unmarked.
    fn put_text(&mut self, idx: usize, text: &str) -> io::Result<()>;

    fn get_mark(&self, idx: usize) -> Mark;

    fn put_mark(&mut self, idx: usize, mark: Mark);

    /// Exchange two slots, text and mark together.
    fn swap(&mut self, a: usize, b: usize);
}

/// Which store a buffer is built on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageKind {
    #[default]
    Memory,
    Scratch,
}

impl StorageKind {
    pub fn open(self) -> io::Result<Box<dyn LineStore>> {
        log::debug!("opening {:?} line store", self);
        Ok(match self {
            StorageKind::Memory => Box::new(MemoryStore::new()),
            StorageKind::Scratch => Box::new(ScratchStore::new()?),
        })
    }
}

#[derive(Clone, Debug, Default)]
struct Line {
    text: String,
    mark: Mark,
}

/// Lines held by value; reordering moves the values.
#[derive(Debug)]
pub struct MemoryStore {
    lines: Vec<Line>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            lines: vec![Line::default()],
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LineStore for MemoryStore {
    fn slots(&self) -> usize {
        self.lines.len()
    }

    fn get_text(&self, idx: usize) -> io::Result<String> {
        Ok(self.lines[idx].text.clone())
    }

    fn put_text(&mut self, idx: usize, text: &str) -> io::Result<()> {
        if idx == self.lines.len() {
            self.lines.push(Line {
                text: text.to_string(),
                mark: None,
            });
        } else {
            self.lines[idx].text = text.to_string();
        }
        Ok(())
    }

    fn get_mark(&self, idx: usize) -> Mark {
        self.lines[idx].mark
    }

    fn put_mark(&mut self, idx: usize, mark: Mark) {
        self.lines[idx].mark = mark;
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.lines.swap(a, b);
    }
}

/// Index entry of the scratch store.
#[derive(Clone, Copy, Debug, Default)]
struct Entry {
    offset: u64,
    len: usize,
    mark: Mark,
}

/// Append-only scratch file plus an index of `(offset, length)` entries.
///
/// Text is never rewritten in place: every `put_text` appends, so the
/// arena only grows while the logical buffer may shrink. Reordering swaps
/// index entries and leaves the file alone.
pub struct ScratchStore {
    file: File,
    arena_len: u64,
    index: Vec<Entry>,
}

impl ScratchStore {
    /// Create a store on an anonymous temporary file, removed on drop.
    pub fn new() -> io::Result<Self> {
        Ok(Self::with_file(tempfile::tempfile()?))
    }

    /// Create a store on an already-open, empty file.
    pub fn with_file(file: File) -> Self {
        ScratchStore {
            file,
            arena_len: 0,
            index: vec![Entry::default()],
        }
    }

    /// Bytes appended to the scratch file so far.
    pub fn arena_len(&self) -> u64 {
        self.arena_len
    }
}

impl fmt::Debug for ScratchStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchStore")
            .field("arena_len", &self.arena_len)
            .field("slots", &self.index.len())
            .finish()
    }
}

impl LineStore for ScratchStore {
    fn slots(&self) -> usize {
        self.index.len()
    }

    fn get_text(&self, idx: usize) -> io::Result<String> {
        let entry = self.index[idx];
        if entry.len == 0 {
            return Ok(String::new());
        }
        let mut file = &self.file;
        file.seek(SeekFrom::Start(entry.offset))?;
        let mut bytes = vec![0; entry.len];
        file.read_exact(&mut bytes)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn put_text(&mut self, idx: usize, text: &str) -> io::Result<()> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(self.arena_len))?;
        file.write_all(text.as_bytes())?;

        let offset = self.arena_len;
        self.arena_len += text.len() as u64;
        if idx == self.index.len() {
            self.index.push(Entry {
                offset,
                len: text.len(),
                mark: None,
            });
        } else {
            let entry = &mut self.index[idx];
            entry.offset = offset;
            entry.len = text.len();
        }
        Ok(())
    }

    fn get_mark(&self, idx: usize) -> Mark {
        self.index[idx].mark
    }

    fn put_mark(&mut self, idx: usize, mark: Mark) {
        self.index[idx].mark = mark;
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.index.swap(a, b);
    }
}
