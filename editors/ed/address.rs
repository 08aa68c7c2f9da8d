//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Address resolution.
//!
//! Turns address text into line numbers against the current and last
//! line of the buffer. Every resolved line lies in `[0, last]`.

use crate::commands::DefaultAddressing;
use crate::error::{EdError, EdResult};
use crate::parser::AddressRange;

/// Resolve one address.
///
/// Empty text and `.` name the current line, `$` the last line; anything
/// else must be a signed integer within `[0, last]`.
pub fn resolve(text: &str, cur: usize, last: usize) -> EdResult<usize> {
    let body = text.trim_start_matches(&['+', '-'][..]);
    match body {
        "" if text.is_empty() => return Ok(cur),
        "." => return Ok(cur),
        "$" => return Ok(last),
        _ => {}
    }

    let n: i64 = text
        .parse()
        .map_err(|_| EdError::InvalidAddress(text.to_string()))?;
    match usize::try_from(n) {
        Ok(line) if line <= last => Ok(line),
        _ => Err(EdError::InvalidAddress(text.to_string())),
    }
}

/// Resolve a two-address range, requiring `start <= end`.
pub fn resolve_pair(start: &str, end: &str, cur: usize, last: usize) -> EdResult<(usize, usize)> {
    let l1 = resolve(start, cur, last)?;
    let l2 = resolve(end, cur, last)?;
    if l1 > l2 {
        return Err(EdError::InvalidRange);
    }
    Ok((l1, l2))
}

/// Amount of a pager increment; no digits means the pager width.
pub fn increment(text: &str, pager: usize) -> EdResult<usize> {
    if text.is_empty() {
        return Ok(pager);
    }
    text.parse()
        .map_err(|_| EdError::InvalidAddress(text.to_string()))
}

/// Widen a resolved range: the start moves back by `lt` (not below line 1),
/// the end forward by `gt` (not past `last`).
pub fn widen(range: (usize, usize), lt: usize, gt: usize, last: usize) -> (usize, usize) {
    let (l1, l2) = range;
    let l1 = if l1 == 0 { 0 } else { l1.saturating_sub(lt).max(1) };
    let l2 = l2.saturating_add(gt).min(last);
    (l1, l2)
}

/// Resolve the address text of a command, falling back to `default`
/// when none was given, then apply any pager increments.
pub fn resolve_range(
    range: &AddressRange,
    default: DefaultAddressing,
    cur: usize,
    last: usize,
    pager: usize,
) -> EdResult<(usize, usize)> {
    let resolved = match (&range.start, &range.end) {
        (None, None) => match default {
            DefaultAddressing::Current | DefaultAddressing::None => (cur, cur),
            DefaultAddressing::CurrentPlusOne => (cur, (cur + 1).min(last)),
            DefaultAddressing::Full => (last.min(1), last),
            DefaultAddressing::Last => (last, last),
        },
        (Some(start), None) | (None, Some(start)) => {
            let line = resolve(start, cur, last)?;
            (line, line)
        }
        (Some(start), Some(end)) => resolve_pair(start, end, cur, last)?,
    };

    if !range.has_increment() {
        return Ok(resolved);
    }
    let lt = match &range.lt {
        Some(text) => increment(text, pager)?,
        None => 0,
    };
    let gt = match &range.gt {
        Some(text) => increment(text, pager)?,
        None => 0,
    };
    Ok(widen(resolved, lt, gt, last))
}
