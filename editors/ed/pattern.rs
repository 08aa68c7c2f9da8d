//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Pattern matching over line text.

use crate::error::{EdError, EdResult};
use regex::Regex;

/// A compiled pattern: literal text or a regular expression.
#[derive(Clone, Debug)]
pub enum Matcher {
    Literal(String),
    Regex(Regex),
}

impl Matcher {
    pub fn literal(text: &str) -> Matcher {
        Matcher::Literal(text.to_string())
    }

    /// Compile a regular expression.
    pub fn regex(pattern: &str) -> EdResult<Matcher> {
        Regex::new(pattern)
            .map(Matcher::Regex)
            .map_err(|e| EdError::InvalidPattern(e.to_string()))
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Literal(lit) => !lit.is_empty() && text.contains(lit.as_str()),
            Matcher::Regex(re) => re.is_match(text),
        }
    }

    /// Byte ranges of non-overlapping matches, left to right.
    pub fn find_all(&self, text: &str) -> Vec<(usize, usize)> {
        match self {
            Matcher::Literal(lit) if lit.is_empty() => Vec::new(),
            Matcher::Literal(lit) => text
                .match_indices(lit.as_str())
                .map(|(pos, m)| (pos, pos + m.len()))
                .collect(),
            Matcher::Regex(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
        }
    }

    /// Expansion of `repl` for the match at `range` within `text`.
    ///
    /// Literal patterns insert `repl` as-is. Regular expressions expand `&`
    /// to the whole match and `\1`..`\9` to capture groups.
    pub fn expand(&self, text: &str, range: (usize, usize), repl: &str) -> String {
        match self {
            Matcher::Literal(_) => repl.to_string(),
            Matcher::Regex(re) => {
                let mut out = String::new();
                if let Some(caps) = re.captures_at(text, range.0) {
                    caps.expand(&convert_replacement(repl), &mut out);
                }
                out
            }
        }
    }
}

/// Convert ed replacement syntax to the regex crate's: `&` becomes `$0`,
/// `\N` becomes `${N}`, `\&` a literal `&` and a bare `$` is escaped.
fn convert_replacement(repl: &str) -> String {
    let mut result = String::new();
    let mut chars = repl.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek().copied() {
                Some('&') => {
                    result.push('&');
                    chars.next();
                }
                Some(d @ '1'..='9') => {
                    result.push_str("${");
                    result.push(d);
                    result.push('}');
                    chars.next();
                }
                Some('\\') => {
                    result.push('\\');
                    chars.next();
                }
                _ => result.push('\\'),
            },
            '&' => result.push_str("${0}"),
            '$' => result.push_str("$$"),
            _ => result.push(ch),
        }
    }

    result
}
