//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Buffer management for the ed editor.
//!
//! Lines are numbered from 1; slot 0 is a sentinel that is never addressed
//! or marked. Every reorder is built from block reversals, so the same code
//! drives delete, move, copy, mirror and insertion on either store.

use crate::error::{EdError, EdResult};
use crate::store::{LineStore, Mark, MemoryStore, StorageKind};
use std::io::{self, BufRead, Write};

/// The ed buffer holding all lines.
#[derive(Debug)]
pub struct Buffer {
    store: Box<dyn LineStore>,
    /// The remembered filename
    pub pathname: String,
    /// Current line number (0 means before the first line)
    cur_line: usize,
    /// Highest valid line; slots past it are stale
    last_line: usize,
    /// Whether the buffer has been modified since last write
    modified: bool,
    revision: u64,
}

impl Buffer {
    /// Create an empty buffer on the given storage strategy.
    pub fn new(kind: StorageKind) -> io::Result<Buffer> {
        Ok(Buffer::with_store(kind.open()?))
    }

    pub fn with_store(store: Box<dyn LineStore>) -> Buffer {
        Buffer {
            store,
            pathname: String::new(),
            cur_line: 0,
            last_line: 0,
            modified: false,
            revision: 0,
        }
    }

    /// Number of addressable lines.
    pub fn num_lines(&self) -> usize {
        self.last_line
    }

    pub fn last_line(&self) -> usize {
        self.last_line
    }

    pub fn cur_line(&self) -> usize {
        self.cur_line
    }

    /// Set the current line.
    pub fn set_cur_line(&mut self, line: usize) -> EdResult<()> {
        if line > self.last_line {
            return Err(EdError::InvalidAddress(line.to_string()));
        }
        self.cur_line = line;
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Forget unsaved changes, e.g. after the whole buffer was written.
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    /// Mutation counter; bumped by every change to text or order.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.modified = true;
        self.revision += 1;
    }

    fn check_line(&self, idx: usize) -> EdResult<()> {
        if idx > self.last_line {
            return Err(EdError::InvalidAddress(idx.to_string()));
        }
        Ok(())
    }

    /// Text of line `idx`; line 0 reads as empty.
    pub fn get_text(&self, idx: usize) -> EdResult<String> {
        self.check_line(idx)?;
        Ok(self.store.get_text(idx)?)
    }

    /// Replace the text of line `idx`.
    pub fn put_text(&mut self, idx: usize, text: &str) -> EdResult<()> {
        if idx == 0 {
            return Err(EdError::InvalidRange);
        }
        self.check_line(idx)?;
        self.store.put_text(idx, text)?;
        self.touch();
        Ok(())
    }

    /// Insert the lines produced by `supplier` after line `idx`, until it
    /// yields `None`. Returns the number of lines inserted.
    ///
    /// New lines are first written past the last line and then rotated into
    /// place. If the supplier fails, nothing becomes visible.
    pub fn insert_after<F>(&mut self, idx: usize, mut supplier: F) -> EdResult<usize>
    where
        F: FnMut() -> EdResult<Option<String>>,
    {
        self.check_line(idx)?;

        let mut count = 0;
        while let Some(text) = supplier()? {
            let slot = self.last_line + count + 1;
            let stale = slot < self.store.slots();
            self.store.put_text(slot, &text)?;
            if stale {
                self.store.put_mark(slot, None);
            }
            count += 1;
        }
        if count == 0 {
            return Ok(0);
        }

        let from = self.last_line + 1;
        self.last_line += count;
        self.bulk_move(from, self.last_line, idx)?;
        self.touch();
        Ok(count)
    }

    /// Append lines past the end, growing the buffer.
    pub fn append_lines<I, S>(&mut self, lines: I) -> EdResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines = lines.into_iter();
        let last = self.last_line;
        self.insert_after(last, || Ok(lines.next().map(|s| s.as_ref().to_string())))
    }

    /// Drop lines past `last`, which must not exceed the current last line.
    pub fn truncate(&mut self, last: usize) {
        if last < self.last_line {
            self.last_line = last;
            self.cur_line = self.cur_line.min(last);
            self.touch();
        }
    }

    /// Relocate lines `[from, to]` to follow line `dest` using three block
    /// reversals. A destination inside or just before the block is a no-op.
    pub fn bulk_move(&mut self, from: usize, to: usize, dest: usize) -> EdResult<()> {
        if from == 0 || from > to {
            return Err(EdError::InvalidRange);
        }
        self.check_line(to)?;
        self.check_line(dest)?;

        if dest + 1 < from {
            self.flip(dest + 1, from - 1);
            self.flip(from, to);
            self.flip(dest + 1, to);
        } else if dest > to {
            self.flip(from, to);
            self.flip(to + 1, dest);
            self.flip(from, dest);
        } else {
            return Ok(());
        }
        self.touch();
        Ok(())
    }

    /// Reverse the order of lines `[lo, hi]`.
    pub fn reverse(&mut self, lo: usize, hi: usize) -> EdResult<()> {
        if lo == 0 || lo > hi {
            return Err(EdError::InvalidRange);
        }
        self.check_line(hi)?;
        if lo < hi {
            self.flip(lo, hi);
            self.touch();
        }
        Ok(())
    }

    fn flip(&mut self, lo: usize, hi: usize) {
        log::trace!("reverse [{}, {}]", lo, hi);
        let (mut lo, mut hi) = (lo, hi);
        while lo < hi {
            self.store.swap(lo, hi);
            lo += 1;
            hi -= 1;
        }
    }

    pub fn get_mark(&self, idx: usize) -> Mark {
        if idx == 0 || idx > self.last_line {
            return None;
        }
        self.store.get_mark(idx)
    }

    /// Set or clear the mark of a line; the sentinel is never marked.
    pub fn put_mark(&mut self, idx: usize, mark: Mark) {
        if idx == 0 || idx > self.last_line {
            return;
        }
        self.store.put_mark(idx, mark);
    }

    /// Following line, wrapping from the last line to the sentinel.
    pub fn next_line(&self, idx: usize) -> usize {
        if idx >= self.last_line {
            0
        } else {
            idx + 1
        }
    }

    /// Preceding line, wrapping from the sentinel to the last line.
    pub fn prev_line(&self, idx: usize) -> usize {
        if idx == 0 {
            self.last_line
        } else {
            idx - 1
        }
    }

    /// `count` indices from `start` onward, wrapping through the sentinel.
    pub fn scan_forward(&self, start: usize, count: usize) -> Scan {
        Scan {
            idx: start,
            remaining: count,
            last: self.last_line,
            forward: true,
        }
    }

    /// `count` indices from `start` backward, wrapping through the sentinel.
    pub fn scan_reverse(&self, start: usize, count: usize) -> Scan {
        Scan {
            idx: start,
            remaining: count,
            last: self.last_line,
            forward: false,
        }
    }

    /// Replace the contents with lines read from `reader`; returns bytes read.
    ///
    /// The new lines are read past the end first, so a read error leaves
    /// the old contents in place.
    pub fn load<R: BufRead>(&mut self, reader: R) -> EdResult<usize> {
        let old = self.last_line;
        let bytes = self.read_after(old, reader)?;
        let count = self.last_line - old;
        if old > 0 && count > 0 {
            self.bulk_move(old + 1, self.last_line, 0)?;
        }
        self.truncate(count);
        self.cur_line = count;
        self.modified = false;
        Ok(bytes)
    }

    /// Insert lines read from `reader` after line `idx`; returns bytes read.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD.
    pub fn read_after<R: BufRead>(&mut self, idx: usize, mut reader: R) -> EdResult<usize> {
        let mut bytes = 0;
        let mut raw = Vec::new();
        self.insert_after(idx, || {
            raw.clear();
            let rc = reader.read_until(b'\n', &mut raw)?;
            if rc == 0 {
                return Ok(None);
            }
            bytes += rc;
            if raw.last() == Some(&b'\n') {
                raw.pop();
            }
            Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
        })?;
        Ok(bytes)
    }

    /// Write lines `[start, end]` to `writer`, newline terminated; returns
    /// bytes written.
    pub fn write_lines<W: Write>(
        &self,
        start: usize,
        end: usize,
        writer: &mut W,
    ) -> EdResult<usize> {
        if end == 0 {
            return Ok(0);
        }
        if start == 0 || start > end {
            return Err(EdError::InvalidRange);
        }
        self.check_line(end)?;

        let mut bytes = 0;
        for idx in start..=end {
            let text = self.store.get_text(idx)?;
            writeln!(writer, "{}", text)?;
            bytes += text.len() + 1;
        }
        Ok(bytes)
    }

    /// All lines, in order.
    pub fn lines(&self) -> EdResult<Vec<String>> {
        (1..=self.last_line).map(|idx| self.get_text(idx)).collect()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::with_store(Box::new(MemoryStore::new()))
    }
}

/// Lazy sequence of line indices produced by [`Buffer::scan_forward`] and
/// [`Buffer::scan_reverse`]. Cloning restarts from the same point.
#[derive(Clone, Debug)]
pub struct Scan {
    idx: usize,
    remaining: usize,
    last: usize,
    forward: bool,
}

impl Iterator for Scan {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let idx = self.idx;
        self.idx = if self.forward {
            if idx >= self.last {
                0
            } else {
                idx + 1
            }
        } else if idx == 0 {
            self.last
        } else {
            idx - 1
        };
        Some(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ScratchStore;
    use proptest::prelude::*;

    fn numbered(store: Box<dyn LineStore>, n: usize) -> Buffer {
        let mut buf = Buffer::with_store(store);
        buf.append_lines((1..=n).map(|i| format!("L{}", i))).unwrap();
        buf
    }

    fn memory(n: usize) -> Buffer {
        numbered(Box::new(MemoryStore::new()), n)
    }

    fn scratch(n: usize) -> Buffer {
        numbered(Box::new(ScratchStore::new().unwrap()), n)
    }

    fn names(buf: &Buffer) -> Vec<String> {
        buf.lines().unwrap()
    }

    #[test]
    fn test_new_buffer() {
        let buf = Buffer::new(StorageKind::Memory).unwrap();
        assert_eq!(buf.num_lines(), 0);
        assert_eq!(buf.cur_line(), 0);
        assert!(!buf.is_modified());
        assert_eq!(buf.get_text(0).unwrap(), "");
    }

    #[test]
    fn test_append_lines() {
        let buf = memory(3);
        assert_eq!(names(&buf), ["L1", "L2", "L3"]);
        assert!(buf.is_modified());
    }

    #[test]
    fn test_insert_after_middle() {
        for mut buf in [memory(3), scratch(3)] {
            let mut new = vec!["b", "a"];
            let count = buf
                .insert_after(1, || Ok(new.pop().map(String::from)))
                .unwrap();
            assert_eq!(count, 2);
            assert_eq!(names(&buf), ["L1", "a", "b", "L2", "L3"]);
        }
    }

    #[test]
    fn test_insert_after_sentinel() {
        let mut buf = memory(2);
        let mut once = Some("top".to_string());
        buf.insert_after(0, || Ok(once.take())).unwrap();
        assert_eq!(names(&buf), ["top", "L1", "L2"]);
    }

    #[test]
    fn test_insert_failure_leaves_buffer() {
        let mut buf = memory(2);
        let rev = buf.revision();
        let mut calls = 0;
        let res = buf.insert_after(1, || {
            calls += 1;
            if calls == 1 {
                Ok(Some("x".to_string()))
            } else {
                Err(EdError::Break)
            }
        });
        assert!(matches!(res, Err(EdError::Break)));
        assert_eq!(names(&buf), ["L1", "L2"]);
        assert_eq!(buf.revision(), rev);
    }

    #[test]
    fn test_stale_slot_reused_unmarked() {
        let mut buf = memory(3);
        buf.put_mark(3, Some('a'));
        buf.truncate(2);
        buf.append_lines(["new"]).unwrap();
        assert_eq!(buf.get_text(3).unwrap(), "new");
        assert_eq!(buf.get_mark(3), None);
    }

    #[test]
    fn test_bulk_move_backward() {
        let mut buf = memory(5);
        buf.bulk_move(4, 5, 0).unwrap();
        assert_eq!(names(&buf), ["L4", "L5", "L1", "L2", "L3"]);
    }

    #[test]
    fn test_bulk_move_forward() {
        let mut buf = scratch(5);
        buf.bulk_move(1, 2, 4).unwrap();
        assert_eq!(names(&buf), ["L3", "L4", "L1", "L2", "L5"]);
    }

    #[test]
    fn test_bulk_move_adjacent_is_noop() {
        let mut buf = memory(5);
        let rev = buf.revision();
        buf.bulk_move(2, 3, 1).unwrap();
        buf.bulk_move(2, 3, 2).unwrap();
        buf.bulk_move(2, 3, 3).unwrap();
        assert_eq!(names(&buf), ["L1", "L2", "L3", "L4", "L5"]);
        assert_eq!(buf.revision(), rev);
    }

    #[test]
    fn test_marks_travel_with_lines() {
        let mut buf = memory(4);
        buf.put_mark(1, Some('x'));
        buf.bulk_move(1, 1, 4).unwrap();
        assert_eq!(buf.get_mark(4), Some('x'));
        assert_eq!(buf.get_text(4).unwrap(), "L1");
        buf.put_mark(0, Some('x'));
        assert_eq!(buf.get_mark(0), None);
    }

    #[test]
    fn test_circular_neighbours() {
        let buf = memory(3);
        assert_eq!(buf.next_line(2), 3);
        assert_eq!(buf.next_line(3), 0);
        assert_eq!(buf.prev_line(1), 0);
        assert_eq!(buf.prev_line(0), 3);
    }

    #[test]
    fn test_scans() {
        let buf = memory(3);
        let scan = buf.scan_forward(2, 5);
        assert_eq!(scan.clone().collect::<Vec<_>>(), [2, 3, 0, 1, 2]);
        assert_eq!(scan.collect::<Vec<_>>(), [2, 3, 0, 1, 2]);
        assert_eq!(buf.scan_reverse(1, 4).collect::<Vec<_>>(), [1, 0, 3, 2]);
        assert_eq!(buf.scan_forward(1, 0).count(), 0);
    }

    #[test]
    fn test_load_and_write() {
        let mut buf = Buffer::default();
        let bytes = buf.load(io::Cursor::new("one\ntwo\nthree")).unwrap();
        assert_eq!(bytes, 13);
        assert_eq!(names(&buf), ["one", "two", "three"]);
        assert_eq!(buf.cur_line(), 3);
        assert!(!buf.is_modified());

        let mut out = Vec::new();
        let written = buf.write_lines(2, 3, &mut out).unwrap();
        assert_eq!(out, b"two\nthree\n");
        assert_eq!(written, 10);
    }

    #[test]
    fn test_load_replaces_contents() {
        for mut buf in [memory(3), scratch(3)] {
            buf.put_mark(1, Some('a'));
            let bytes = buf.load(io::Cursor::new("x\ny\n")).unwrap();
            assert_eq!(bytes, 4);
            assert_eq!(names(&buf), ["x", "y"]);
            assert_eq!(buf.cur_line(), 2);
            assert_eq!(buf.get_mark(1), None);
            assert!(!buf.is_modified());

            buf.load(io::Cursor::new("")).unwrap();
            assert_eq!(buf.num_lines(), 0);
            assert_eq!(buf.cur_line(), 0);
        }
    }

    struct Broken;

    impl io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "broken"))
        }
    }

    #[test]
    fn test_load_failure_keeps_contents() {
        use std::io::Read;

        let mut buf = memory(2);
        buf.set_cur_line(1).unwrap();
        let reader = io::BufReader::new(io::Cursor::new("a\nb\n").chain(Broken));
        assert!(matches!(buf.load(reader), Err(EdError::Io(_))));
        assert_eq!(names(&buf), ["L1", "L2"]);
        assert_eq!(buf.cur_line(), 1);
    }

    #[test]
    fn test_load_invalid_utf8() {
        let mut buf = memory(2);
        let bytes = buf.load(io::Cursor::new(b"ok\n\xff\xfeend\n".to_vec())).unwrap();
        assert_eq!(bytes, 9);
        assert_eq!(names(&buf), ["ok", "\u{fffd}\u{fffd}end"]);
    }

    #[test]
    fn test_put_text_bounds() {
        let mut buf = memory(2);
        buf.put_text(2, "changed").unwrap();
        assert_eq!(buf.get_text(2).unwrap(), "changed");
        assert!(matches!(buf.put_text(0, "x"), Err(EdError::InvalidRange)));
        assert!(matches!(
            buf.put_text(3, "x"),
            Err(EdError::InvalidAddress(_))
        ));
    }

    fn move_case() -> impl Strategy<Value = (usize, usize, usize, usize)> {
        (2usize..12, any::<usize>(), any::<usize>(), any::<usize>()).prop_map(|(n, a, b, c)| {
            let len = 1 + a % (n - 1);
            let from = 1 + b % (n - len + 1);
            let to = from + len - 1;
            // valid destinations: 0..=from-2 and to+1..=n
            let k = c % (n - len);
            let dest = if k + 1 < from { k } else { to + 1 + (k + 1 - from) };
            (n, from, to, dest)
        })
    }

    proptest! {
        #[test]
        fn bulk_move_round_trip(
            (n, from, to, dest) in move_case(),
            scratch_store in any::<bool>(),
        ) {
            let mut buf = if scratch_store { scratch(n) } else { memory(n) };
            let before = names(&buf);
            let len = to - from + 1;

            buf.bulk_move(from, to, dest).unwrap();
            prop_assert_eq!(buf.num_lines(), n);
            if dest < from {
                prop_assert_eq!(buf.get_text(dest + 1).unwrap(), before[from - 1].clone());
                buf.bulk_move(dest + 1, dest + len, to).unwrap();
            } else {
                prop_assert_eq!(buf.get_text(dest - len + 1).unwrap(), before[from - 1].clone());
                buf.bulk_move(dest - len + 1, dest, from - 1).unwrap();
            }
            prop_assert_eq!(names(&buf), before);
        }
    }
}
