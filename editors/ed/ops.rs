//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Edit operations.
//!
//! Each operation takes resolved line numbers, works through the buffer
//! primitives and leaves the current line where ed users expect it.
//! Failures part-way through keep whatever the last completed step did.

use crate::buffer::Buffer;
use crate::error::{EdError, EdResult};
use crate::pattern::Matcher;
use std::io::Write;

/// Fold width of `l` output.
const FOLD_WIDTH: usize = 72;

/// Print mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrintMode {
    Normal,
    Numbered,
    List,
}

/// Print lines `[l1, l2]`; the last printed line becomes current.
pub fn print<W: Write>(
    buf: &mut Buffer,
    l1: usize,
    l2: usize,
    mode: PrintMode,
    out: &mut W,
) -> EdResult<()> {
    if l1 == 0 {
        return Err(EdError::InvalidRange);
    }
    let end = l2.min(buf.last_line());
    for idx in l1..=end {
        let text = buf.get_text(idx)?;
        match mode {
            PrintMode::Normal => writeln!(out, "{}", text)?,
            PrintMode::Numbered => writeln!(out, "{:6}\t{}", idx, text)?,
            PrintMode::List => write_list(&text, out)?,
        }
    }
    buf.set_cur_line(end)
}

/// Unambiguous form: escapes for control characters, octal for other
/// non-printables, folding at [`FOLD_WIDTH`] and a closing `$`.
fn write_list<W: Write>(text: &str, out: &mut W) -> EdResult<()> {
    let mut col = 0;
    for ch in text.chars() {
        let escaped = match ch {
            '\\' => "\\\\".to_string(),
            '\x07' => "\\a".to_string(),
            '\x08' => "\\b".to_string(),
            '\x0c' => "\\f".to_string(),
            '\r' => "\\r".to_string(),
            '\t' => "\\t".to_string(),
            '\x0b' => "\\v".to_string(),
            '$' => "\\$".to_string(),
            c if c.is_control() || !c.is_ascii() => {
                let mut bytes = [0; 4];
                c.encode_utf8(&mut bytes)
                    .bytes()
                    .map(|b| format!("\\{:03o}", b))
                    .collect()
            }
            c => c.to_string(),
        };
        if col + escaped.len() > FOLD_WIDTH {
            writeln!(out, "\\")?;
            col = 0;
        }
        write!(out, "{}", escaped)?;
        col += escaped.len();
    }
    writeln!(out, "$")?;
    Ok(())
}

/// Append lines after `l1`. The last inserted line becomes current.
pub fn append<F>(buf: &mut Buffer, l1: usize, supplier: F) -> EdResult<usize>
where
    F: FnMut() -> EdResult<Option<String>>,
{
    let count = buf.insert_after(l1, supplier)?;
    buf.set_cur_line(l1 + count)?;
    Ok(count)
}

/// Insert lines before `l1`; line 0 and 1 both insert at the top.
pub fn insert<F>(buf: &mut Buffer, l1: usize, supplier: F) -> EdResult<usize>
where
    F: FnMut() -> EdResult<Option<String>>,
{
    let after = l1.saturating_sub(1);
    let count = buf.insert_after(after, supplier)?;
    buf.set_cur_line(if count == 0 { l1 } else { after + count })?;
    Ok(count)
}

/// Delete lines `[l1, l2]` by rotating them past the end and shrinking.
pub fn delete(buf: &mut Buffer, l1: usize, l2: usize) -> EdResult<()> {
    if l1 == 0 || l1 > l2 {
        return Err(EdError::InvalidRange);
    }
    let last = buf.last_line();
    if l2 > last {
        return Err(EdError::InvalidAddress(l2.to_string()));
    }
    buf.bulk_move(l1, l2, last)?;
    buf.truncate(last - (l2 - l1 + 1));
    let cur = buf.prev_line(l1);
    buf.set_cur_line(cur)
}

/// Replace lines `[l1, l2]` with the supplied ones.
pub fn change<F>(buf: &mut Buffer, l1: usize, l2: usize, supplier: F) -> EdResult<usize>
where
    F: FnMut() -> EdResult<Option<String>>,
{
    delete(buf, l1, l2)?;
    let after = buf.cur_line();
    let count = buf.insert_after(after, supplier)?;
    buf.set_cur_line(after + count)?;
    Ok(count)
}

/// Move lines `[l1, l2]` after `dest`.
pub fn move_lines(buf: &mut Buffer, l1: usize, l2: usize, dest: usize) -> EdResult<()> {
    if l1 == 0 || l1 > l2 {
        return Err(EdError::InvalidRange);
    }
    if dest + 1 >= l1 && dest <= l2 {
        return Err(EdError::DestinationInRange);
    }
    buf.bulk_move(l1, l2, dest)?;
    let len = l2 - l1 + 1;
    buf.set_cur_line(if dest > l1 { dest } else { dest + len })
}

/// Copy lines `[l1, l2]` after `dest`.
pub fn copy_lines(buf: &mut Buffer, l1: usize, l2: usize, dest: usize) -> EdResult<()> {
    if l1 == 0 || l1 > l2 {
        return Err(EdError::InvalidRange);
    }
    let last = buf.last_line();
    if dest > last {
        return Err(EdError::InvalidAddress(dest.to_string()));
    }
    let texts = (l1..=l2)
        .map(|idx| buf.get_text(idx))
        .collect::<EdResult<Vec<_>>>()?;
    let len = buf.append_lines(texts)?;
    if dest != last {
        buf.bulk_move(last + 1, last + len, dest)?;
    }
    buf.set_cur_line(dest + len)
}

/// Reverse the order of lines `[l1, l2]`.
pub fn mirror(buf: &mut Buffer, l1: usize, l2: usize) -> EdResult<()> {
    buf.reverse(l1, l2)?;
    buf.set_cur_line(l2)
}

/// Which occurrences a count selects: none means the first, `0` all,
/// `n` only the nth.
fn selected(count: Option<usize>, occurrence: usize) -> bool {
    match count {
        None => occurrence == 1,
        Some(0) => true,
        Some(n) => occurrence == n,
    }
}

/// Result of an operation that changes some lines of a range.
fn finish(
    buf: &mut Buffer,
    changed: Option<usize>,
    found: bool,
    count: Option<usize>,
) -> EdResult<()> {
    match changed {
        Some(line) => buf.set_cur_line(line),
        None if found && count.is_some_and(|n| n > 1) => Err(EdError::CountExceedsMatches),
        None => Err(EdError::NoMatch),
    }
}

/// Replace matches of `matcher` with `repl` on lines `[l1, l2]`.
///
/// The last changed line becomes current.
pub fn substitute(
    buf: &mut Buffer,
    l1: usize,
    l2: usize,
    matcher: &Matcher,
    repl: &str,
    count: Option<usize>,
) -> EdResult<()> {
    if l1 == 0 || l1 > l2 {
        return Err(EdError::InvalidRange);
    }

    let mut changed = None;
    let mut found = false;
    for idx in l1..=l2 {
        let text = buf.get_text(idx)?;
        let matches = matcher.find_all(&text);
        found |= !matches.is_empty();

        let mut result = String::with_capacity(text.len());
        let mut pos = 0;
        let mut replaced = false;
        for (n, range) in matches.into_iter().enumerate() {
            if !selected(count, n + 1) {
                continue;
            }
            result.push_str(&text[pos..range.0]);
            result.push_str(&matcher.expand(&text, range, repl));
            pos = range.1;
            replaced = true;
        }
        if replaced {
            result.push_str(&text[pos..]);
            buf.put_text(idx, &result)?;
            changed = Some(idx);
        }
    }

    finish(buf, changed, found, count)
}

/// Map characters of `set` to the same position in `repl` on lines
/// `[l1, l2]`. A short `repl` repeats its last character; an empty one
/// deletes. With no count every occurrence is mapped.
pub fn transliterate(
    buf: &mut Buffer,
    l1: usize,
    l2: usize,
    set: &str,
    repl: &str,
    count: Option<usize>,
) -> EdResult<()> {
    if l1 == 0 || l1 > l2 {
        return Err(EdError::InvalidRange);
    }
    let from: Vec<char> = set.chars().collect();
    let to: Vec<char> = repl.chars().collect();
    let count = count.or(Some(0));

    let mut changed = None;
    let mut found = false;
    for idx in l1..=l2 {
        let text = buf.get_text(idx)?;
        let mut result = String::with_capacity(text.len());
        let mut occurrence = 0;
        let mut replaced = false;
        for ch in text.chars() {
            let Some(pos) = from.iter().position(|&c| c == ch) else {
                result.push(ch);
                continue;
            };
            found = true;
            occurrence += 1;
            if !selected(count, occurrence) {
                result.push(ch);
                continue;
            }
            replaced = true;
            if let Some(&c) = to.get(pos).or(to.last()) {
                result.push(c);
            }
        }
        if replaced {
            buf.put_text(idx, &result)?;
            changed = Some(idx);
        }
    }

    finish(buf, changed, found, count)
}

/// Join lines `[l1, l2]` into one, separated by `sep`.
pub fn join(buf: &mut Buffer, l1: usize, l2: usize, sep: &str) -> EdResult<()> {
    if l1 == 0 || l1 > l2 {
        return Err(EdError::InvalidRange);
    }
    if l1 < l2 {
        let texts = (l1..=l2)
            .map(|idx| buf.get_text(idx))
            .collect::<EdResult<Vec<_>>>()?;
        buf.put_text(l1, &texts.join(sep))?;
        delete(buf, l1 + 1, l2)?;
    }
    buf.set_cur_line(l1)
}

/// Split each line of `[l1, l2]` at the non-empty matches of `matcher`,
/// dropping the matched text. With a count only the nth match splits.
/// The last piece becomes current.
pub fn break_lines(
    buf: &mut Buffer,
    l1: usize,
    l2: usize,
    matcher: &Matcher,
    count: Option<usize>,
) -> EdResult<()> {
    if l1 == 0 || l1 > l2 {
        return Err(EdError::InvalidRange);
    }
    let count = count.or(Some(0));

    let mut added = 0;
    let mut found = false;
    for idx in (l1..=l2).rev() {
        let text = buf.get_text(idx)?;
        let mut pieces = Vec::new();
        let mut pos = 0;
        let matches = matcher.find_all(&text).into_iter().filter(|(s, e)| s < e);
        for (n, (start, end)) in matches.enumerate() {
            found = true;
            if selected(count, n + 1) {
                pieces.push(text[pos..start].to_string());
                pos = end;
            }
        }
        if pieces.is_empty() {
            continue;
        }
        pieces.push(text[pos..].to_string());

        let mut rest = pieces.split_off(1).into_iter();
        buf.put_text(idx, &pieces[0])?;
        added += buf.insert_after(idx, || Ok(rest.next()))?;
    }

    let changed = (added > 0).then_some(l2 + added);
    finish(buf, changed, found, count)
}

/// Put `label` on every line of `[l1, l2]`.
pub fn put_mark(buf: &mut Buffer, l1: usize, l2: usize, label: &str) -> EdResult<()> {
    let mut chars = label.chars();
    let mark = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => c,
        _ => return Err(EdError::InvalidMark),
    };
    if l1 == 0 || l1 > l2 {
        return Err(EdError::InvalidRange);
    }
    for idx in l1..=l2 {
        buf.put_mark(idx, Some(mark));
    }
    Ok(())
}
