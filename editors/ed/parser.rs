//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Command parsing for the ed editor.
//!
//! The parser only accumulates: it fills a [`Command`] from the token
//! stream and leaves numeric and range validation to the address resolver.

use crate::error::{EdError, EdResult};
use crate::lexer::{Item, ItemType, Lexer};
use std::iter::Peekable;

/// Unresolved address text for a command or a glob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressRange {
    pub start: Option<String>,
    pub end: Option<String>,
    /// A `,` separator was seen
    pub separated: bool,
    /// `<n` pager increment
    pub lt: Option<String>,
    /// `>n` pager increment
    pub gt: Option<String>,
}

impl AddressRange {
    /// True when no address, separator or increment was given.
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && !self.separated
            && self.lt.is_none()
            && self.gt.is_none()
    }

    /// True when an explicit increment was given.
    pub fn has_increment(&self) -> bool {
        self.lt.is_some() || self.gt.is_some()
    }

    /// A lone `,` means `1,$`; a missing side of a range defaults likewise.
    fn close(&mut self) {
        if self.separated {
            if self.start.is_none() {
                self.start = Some("1".to_string());
            }
            if self.end.is_none() {
                self.end = Some("$".to_string());
            }
        }
    }

    fn push(&mut self, addr: String) {
        if self.start.is_none() && !self.separated {
            self.start = Some(addr);
        } else {
            self.end = Some(addr);
        }
    }
}

/// Glob prefix of a command: `g`, `v`, `G`, `V` or `"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glob {
    pub prefix: char,
    /// Regular expression, or the mark label for `"`
    pub pattern: String,
    /// Lines the glob scans
    pub range: AddressRange,
}

impl Glob {
    /// `G` and `V` read their commands from input.
    pub fn is_interactive(&self) -> bool {
        matches!(self.prefix, 'G' | 'V')
    }

    /// `v` and `V` select lines that do not match.
    pub fn is_inverted(&self) -> bool {
        matches!(self.prefix, 'v' | 'V')
    }

    pub fn is_bulk_mark(&self) -> bool {
        self.prefix == '"'
    }
}

/// Parsed ed command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Command {
    pub range: AddressRange,
    /// `None` for bare addresses or an empty line
    pub action: Option<char>,
    pub pattern: Option<String>,
    pub substitution: Option<String>,
    /// Replace count; `Some(0)` means every occurrence
    pub count: Option<usize>,
    pub destination: Option<String>,
    pub argument: Option<String>,
    pub glob: Option<Glob>,
    /// Command chained after the action, run once it completes
    pub sub: Option<Box<Command>>,
}

impl Command {
    /// True if this command or any chained one is glob-prefixed or sets the pager.
    pub fn is_glob_or_pager(&self) -> bool {
        self.glob.is_some()
            || self.action == Some('z')
            || self.sub.as_ref().is_some_and(|sub| sub.is_glob_or_pager())
    }
}

/// Parse a command line into a Command.
pub fn parse(line: &str) -> EdResult<Command> {
    let cmd = parse_items(&mut Lexer::new(line).peekable())?;
    log::debug!("parsed {:?}", cmd);
    Ok(cmd)
}

/// Does `typ` begin a new, chained command?
fn begins_sub_command(cmd: &Command, glob_pending: bool, typ: ItemType) -> bool {
    let leading = matches!(
        typ,
        ItemType::Address
            | ItemType::Range
            | ItemType::Increment
            | ItemType::Action
            | ItemType::GlobalPrefix
    );
    (cmd.action.is_some() && leading)
        || (cmd.glob.is_some() && !glob_pending && typ == ItemType::GlobalPrefix)
}

fn parse_count(val: &str) -> EdResult<usize> {
    if val == "g" {
        return Ok(0);
    }
    val.parse()
        .map_err(|_| EdError::Lexical(format!("invalid count '{}'", val)))
}

/// Parse items up to the end of one command; chained commands recurse.
pub fn parse_items<I: Iterator<Item = Item>>(items: &mut Peekable<I>) -> EdResult<Command> {
    let mut cmd = Command::default();
    let mut increment: Option<String> = None;
    let mut glob_pending = false;

    loop {
        if let Some(next) = items.peek() {
            if begins_sub_command(&cmd, glob_pending, next.typ) {
                cmd.sub = Some(Box::new(parse_items(items)?));
                break;
            }
        }
        let Some(item) = items.next() else { break };

        match item.typ {
            ItemType::Error => return Err(EdError::Lexical(item.val)),
            ItemType::Eof => break,
            ItemType::Address => match increment.take() {
                Some(kind) if kind == "<" => cmd.range.lt = Some(item.val),
                Some(_) => cmd.range.gt = Some(item.val),
                None => cmd.range.push(item.val),
            },
            ItemType::Range => cmd.range.separated = true,
            ItemType::Increment => increment = Some(item.val),
            ItemType::GlobalPrefix => {
                let mut range = std::mem::take(&mut cmd.range);
                range.close();
                cmd.glob = Some(Glob {
                    prefix: item.val.chars().next().unwrap_or('g'),
                    pattern: String::new(),
                    range,
                });
                glob_pending = true;
            }
            ItemType::Action => cmd.action = item.val.chars().next(),
            ItemType::Pattern => match cmd.glob.as_mut() {
                Some(glob) if glob_pending => {
                    glob.pattern = item.val;
                    glob_pending = false;
                }
                _ => cmd.pattern = Some(item.val),
            },
            ItemType::Substitution => cmd.substitution = Some(item.val),
            ItemType::ReplaceCount => cmd.count = Some(parse_count(&item.val)?),
            ItemType::Destination => cmd.destination = Some(item.val),
            ItemType::Argument => cmd.argument = Some(item.val),
        }
    }

    cmd.range.close();
    Ok(cmd)
}
