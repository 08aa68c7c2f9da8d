//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Global command engine.
//!
//! A glob runs in two passes. The mark pass tags every line of a range
//! that matches (or, inverted, fails) a pattern. The map pass then visits
//! tagged lines one at a time, clearing each tag before handing the line
//! to a callback that may freely insert, delete or reorder lines.
//!
//! Marks travel with their lines through every reorder, so a line is found
//! wherever the callback moved it. A line rotated into a slot that is still
//! marked may be visited again; the pass is bounded by the number of marks
//! present when it started.

use crate::buffer::Buffer;
use crate::error::EdResult;
use crate::pattern::Matcher;

/// Mark used by `g`, `v`, `G` and `V`. Never a valid user label.
pub const GLOB_MARK: char = '\0';

/// Receiver of the map pass.
pub trait MarkVisitor {
    fn buffer(&mut self) -> &mut Buffer;

    /// Called once per marked line, after its mark was cleared.
    fn visit(&mut self, line: usize) -> EdResult<()>;
}

/// Mark the lines of `[l1, l2]` whose match result differs from `invert`.
///
/// Glob marks left on any other line are cleared. Returns the number of
/// lines marked.
pub fn mark_matching(
    buf: &mut Buffer,
    l1: usize,
    l2: usize,
    matcher: &Matcher,
    invert: bool,
) -> EdResult<usize> {
    let l1 = l1.max(1);
    let mut count = 0;
    for idx in 1..=buf.last_line() {
        let hit = (l1..=l2).contains(&idx) && matcher.is_match(&buf.get_text(idx)?) != invert;
        if hit {
            buf.put_mark(idx, Some(GLOB_MARK));
            count += 1;
        } else if buf.get_mark(idx) == Some(GLOB_MARK) {
            buf.put_mark(idx, None);
        }
    }
    log::debug!("glob marked {} of lines {}..={}", count, l1, l2);
    Ok(count)
}

/// Number of lines carrying `label`.
pub fn count_marked(buf: &Buffer, label: char) -> usize {
    (1..=buf.last_line())
        .filter(|&idx| buf.get_mark(idx) == Some(label))
        .count()
}

/// Visit every line carrying `label`, starting after the current line and
/// wrapping around. Afterwards the line following the starting current
/// line (at most the last line) becomes current.
///
/// Returns the number of lines visited.
pub fn for_each_marked<V: MarkVisitor + ?Sized>(visitor: &mut V, label: char) -> EdResult<usize> {
    let buf = visitor.buffer();
    let saved = buf.cur_line();
    let total = count_marked(buf, label);
    let mut from = buf.next_line(saved);

    let mut visited = 0;
    while visited < total {
        let buf = visitor.buffer();
        if from > buf.last_line() {
            from = 0;
        }
        let span = buf.last_line() + 1;
        let next = buf
            .scan_forward(from, span)
            .find(|&idx| idx != 0 && buf.get_mark(idx) == Some(label));
        let Some(line) = next else { break };

        buf.put_mark(line, None);
        visited += 1;
        visitor.visit(line)?;
        from = line;
    }

    let buf = visitor.buffer();
    let cur = (saved + 1).min(buf.last_line());
    buf.set_cur_line(cur)?;
    log::debug!("glob visited {} of {} marked lines", visited, total);
    Ok(visited)
}
