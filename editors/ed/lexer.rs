//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Command tokenizer for the ed editor.
//!
//! The lexer is a pull-based state machine: every call to `next` runs
//! states until one of them produces an item, so the parser never sees
//! more than one token of lookahead. The stream always ends with either
//! an `Eof` or an `Error` item, after which it is exhausted.

use crate::commands::{self, Grammar};

/// Kind of a lexical item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemType {
    /// Line address: `.`, `$`, signed or unsigned digits, or empty
    Address,
    /// The `,` range separator
    Range,
    /// Pager increment `<` or `>`; an `Address` item follows
    Increment,
    Action,
    /// A delimiter-bounded pattern, separator or mark label
    Pattern,
    /// The replacement field of `s`, `S`, `t`
    Substitution,
    /// Digits or `g` after a delimited field
    ReplaceCount,
    /// Target address of `m`, `k`, `z`
    Destination,
    /// Free-form text up to the end of the line
    Argument,
    /// `g`, `v`, `G`, `V` or `"`
    GlobalPrefix,
    Error,
    Eof,
}

/// A lexical item: its type and the literal text it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub typ: ItemType,
    pub val: String,
}

impl Item {
    pub fn new(typ: ItemType, val: impl Into<String>) -> Self {
        Item {
            typ,
            val: val.into(),
        }
    }
}

/// Scanner states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Default,
    /// Address following a pager increment
    IncrementAddress,
    Destination,
    /// Pattern after a glob prefix; delimiter not yet read
    GlobPattern,
    MarkLabel,
    /// Pattern bounded by the search action character
    Search(char),
    Separator,
    SubstPattern,
    SubstReplacement(char),
    Count,
    /// Plain action: an argument follows only after whitespace or `!`
    AfterAction,
    Argument,
    Done,
}

/// Tokenizer over a single command line.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    state: State,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.trim_end_matches(&['\n', '\r'][..]).chars().collect(),
            pos: 0,
            state: State::Default,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn rest(&mut self) -> String {
        let rest: String = self.chars[self.pos..].iter().collect();
        self.pos = self.chars.len();
        rest
    }

    fn error(&mut self, msg: String) -> Item {
        self.state = State::Done;
        Item::new(ItemType::Error, msg)
    }

    /// Optional sign, then `$`, `.` or a run of digits.
    fn scan_address(&mut self) -> String {
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.pos += 1;
        }
        match self.peek() {
            Some(ch @ ('$' | '.')) => {
                text.push(ch);
                self.pos += 1;
            }
            _ => {
                while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                    text.push(ch);
                    self.pos += 1;
                }
            }
        }
        text
    }

    /// Read the opening delimiter of a pattern field.
    fn scan_delimiter(&mut self) -> Result<char, String> {
        match self.bump() {
            None => Err("missing delimiter".to_string()),
            Some(ch) if ch.is_alphanumeric() || ch.is_whitespace() => {
                Err(format!("invalid delimiter '{}'", ch))
            }
            Some(ch) => Ok(ch),
        }
    }

    /// Scan up to and including the closing `delim`.
    ///
    /// A backslash before the delimiter yields the delimiter itself; any
    /// other escape is kept as written for the pattern engine.
    fn scan_delimited(&mut self, delim: char) -> Result<String, String> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(format!("unterminated pattern, expected '{}'", delim)),
                Some(ch) if ch == delim => return Ok(text),
                Some('\\') => match self.bump() {
                    None => return Err(format!("unterminated pattern, expected '{}'", delim)),
                    Some(ch) if ch == delim => text.push(ch),
                    Some(ch) => {
                        text.push('\\');
                        text.push(ch);
                    }
                },
                Some(ch) => text.push(ch),
            }
        }
    }

    fn lex_default(&mut self) -> Option<Item> {
        self.skip_whitespace();
        let ch = match self.peek() {
            None => {
                self.state = State::Done;
                return Some(Item::new(ItemType::Eof, ""));
            }
            Some(ch) => ch,
        };

        match ch {
            '+' | '-' | '.' | '$' | '0'..='9' => {
                let addr = self.scan_address();
                Some(Item::new(ItemType::Address, addr))
            }
            ',' => {
                self.pos += 1;
                Some(Item::new(ItemType::Range, ","))
            }
            '<' | '>' => {
                self.pos += 1;
                self.state = State::IncrementAddress;
                Some(Item::new(ItemType::Increment, ch))
            }
            _ => match commands::lookup(ch) {
                None => Some(self.error(format!("unrecognized character '{}'", ch))),
                Some(info) => {
                    self.pos += 1;
                    Some(self.lex_action(ch, info.grammar))
                }
            },
        }
    }

    fn lex_action(&mut self, ch: char, grammar: Grammar) -> Item {
        let (typ, next) = match grammar {
            Grammar::GlobPrefix => (ItemType::GlobalPrefix, State::GlobPattern),
            Grammar::BulkMark => (ItemType::GlobalPrefix, State::MarkLabel),
            Grammar::Destination => (ItemType::Action, State::Destination),
            Grammar::Search => (ItemType::Action, State::Search(ch)),
            Grammar::Separator => (ItemType::Action, State::Separator),
            Grammar::PutMark | Grammar::Shell => (ItemType::Action, State::Argument),
            Grammar::Substitute => (ItemType::Action, State::SubstPattern),
            Grammar::Plain => (ItemType::Action, State::AfterAction),
        };
        self.state = next;
        Item::new(typ, ch)
    }

    /// Run one state; `None` means the state moved on without output.
    fn step(&mut self) -> Option<Item> {
        match self.state {
            State::Done => None,
            State::Default => self.lex_default(),
            State::IncrementAddress => {
                self.state = State::Default;
                let addr = self.scan_address();
                Some(Item::new(ItemType::Address, addr))
            }
            State::Destination => {
                self.state = State::Default;
                self.skip_whitespace();
                let addr = self.scan_address();
                Some(Item::new(ItemType::Destination, addr))
            }
            State::GlobPattern => {
                self.state = State::Default;
                let pattern = self
                    .scan_delimiter()
                    .and_then(|delim| self.scan_delimited(delim));
                Some(match pattern {
                    Ok(pattern) => Item::new(ItemType::Pattern, pattern),
                    Err(msg) => self.error(msg),
                })
            }
            State::MarkLabel => {
                self.state = State::Default;
                Some(match self.bump() {
                    Some(label) => Item::new(ItemType::Pattern, label),
                    None => self.error("missing mark label".to_string()),
                })
            }
            State::Search(delim) => {
                self.state = State::Default;
                Some(match self.scan_delimited(delim) {
                    Ok(pattern) => Item::new(ItemType::Pattern, pattern),
                    Err(msg) => self.error(msg),
                })
            }
            State::Separator => {
                // the separator field is optional: `j` alone joins with nothing
                match self.peek() {
                    Some(ch) if !ch.is_alphanumeric() && !ch.is_whitespace() => {
                        self.pos += 1;
                        self.state = State::Count;
                        Some(match self.scan_delimited(ch) {
                            Ok(pattern) => Item::new(ItemType::Pattern, pattern),
                            Err(msg) => self.error(msg),
                        })
                    }
                    _ => {
                        self.state = State::Default;
                        None
                    }
                }
            }
            State::SubstPattern => {
                let field = self
                    .scan_delimiter()
                    .and_then(|delim| Ok((delim, self.scan_delimited(delim)?)));
                Some(match field {
                    Ok((delim, pattern)) => {
                        self.state = State::SubstReplacement(delim);
                        Item::new(ItemType::Pattern, pattern)
                    }
                    Err(msg) => self.error(msg),
                })
            }
            State::SubstReplacement(delim) => {
                self.state = State::Count;
                Some(match self.scan_delimited(delim) {
                    Ok(repl) => Item::new(ItemType::Substitution, repl),
                    Err(msg) => self.error(msg),
                })
            }
            State::Count => {
                self.state = State::Default;
                match self.peek() {
                    Some('g') => {
                        self.pos += 1;
                        Some(Item::new(ItemType::ReplaceCount, "g"))
                    }
                    Some(ch) if ch.is_ascii_digit() => {
                        let mut digits = String::new();
                        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
                            digits.push(ch);
                            self.pos += 1;
                        }
                        Some(Item::new(ItemType::ReplaceCount, digits))
                    }
                    _ => None,
                }
            }
            State::AfterAction => {
                self.state = match self.peek() {
                    Some(ch) if ch.is_whitespace() || ch == '!' => State::Argument,
                    _ => State::Default,
                };
                None
            }
            State::Argument => {
                self.state = State::Default;
                self.skip_whitespace();
                let arg = self.rest();
                if arg.is_empty() {
                    None
                } else {
                    Some(Item::new(ItemType::Argument, arg))
                }
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Item;

    fn next(&mut self) -> Option<Item> {
        while self.state != State::Done {
            if let Some(item) = self.step() {
                log::trace!("lex {:?} {:?}", item.typ, item.val);
                return Some(item);
            }
        }
        None
    }
}

/// Tokenize a whole command line.
pub fn tokenize(input: &str) -> Vec<Item> {
    Lexer::new(input).collect()
}
