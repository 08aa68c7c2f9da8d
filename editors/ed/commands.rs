//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Static table of ed actions.
//!
//! Every action character the lexer accepts has exactly one entry here.
//! The entry decides what the lexer scans after the action, which lines
//! the command addresses when none are given, and what `h` prints.

/// What follows an action character on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grammar {
    /// Nothing, or a free-form argument after whitespace / `!`
    Plain,
    /// A destination address (`m`, `k`, `z`)
    Destination,
    /// A pattern delimited by the action character itself
    Search,
    /// One delimited field plus an optional count (`j`, `b`)
    Separator,
    /// The remainder of the line is the mark label
    PutMark,
    /// Two delimited fields plus an optional count (`s`, `S`, `t`)
    Substitute,
    /// The remainder of the line is a shell command
    Shell,
    /// `g`, `v`, `G`, `V`: a delimited pattern, then the command to run
    GlobPrefix,
    /// `"`: a single mark label, then the command to run
    BulkMark,
}

/// Lines addressed when a command carries no addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultAddressing {
    Current,        // .,.
    CurrentPlusOne, // .,.+1 (for join)
    Full,           // 1,$
    Last,           // $
    None,           // no addresses used
}

/// One row of the action table.
#[derive(Debug)]
pub struct ActionInfo {
    pub action: char,
    pub grammar: Grammar,
    pub default: DefaultAddressing,
    pub syntax: &'static str,
    pub description: &'static str,
}

const fn entry(
    action: char,
    grammar: Grammar,
    default: DefaultAddressing,
    syntax: &'static str,
    description: &'static str,
) -> ActionInfo {
    ActionInfo {
        action,
        grammar,
        default,
        syntax,
        description,
    }
}

use DefaultAddressing as D;
use Grammar as G;

/// All actions, in the order `h` lists them.
pub static ACTIONS: &[ActionInfo] = &[
    entry('p', G::Plain, D::Current, "(.,.)p", "print lines"),
    entry('n', G::Plain, D::Current, "(.,.)n", "print lines with numbers"),
    entry('l', G::Plain, D::Current, "(.,.)l", "print lines unambiguously"),
    entry('a', G::Plain, D::Current, "(.)a [text]", "append text after line"),
    entry('i', G::Plain, D::Current, "(.)i [text]", "insert text before line"),
    entry('c', G::Plain, D::Current, "(.,.)c [text]", "change lines"),
    entry('d', G::Plain, D::Current, "(.,.)d", "delete lines"),
    entry('m', G::Destination, D::Current, "(.,.)m addr", "move lines after addr"),
    entry('k', G::Destination, D::Current, "(.,.)k addr", "copy lines after addr"),
    entry('z', G::Destination, D::None, "z [n]", "set or show the pager width"),
    entry('M', G::Plain, D::Full, "(1,$)M", "mirror (reverse) lines"),
    entry('s', G::Substitute, D::Current, "(.,.)s/text/repl/[n|g]", "substitute literal text"),
    entry('S', G::Substitute, D::Current, "(.,.)S/re/repl/[n|g]", "substitute regular expression"),
    entry('t', G::Substitute, D::Current, "(.,.)t/set/repl/[n]", "transliterate characters"),
    entry('j', G::Separator, D::CurrentPlusOne, "(.,.+1)j[/sep/]", "join lines with separator"),
    entry('b', G::Separator, D::Current, "(.)b/re/[n|g]", "break line at matches"),
    entry('\'', G::PutMark, D::Current, "(.,.)'x", "put mark x on lines"),
    entry('"', G::BulkMark, D::Full, "\"x command", "run command on lines marked x"),
    entry('/', G::Search, D::Current, "/re/", "search forward"),
    entry('\\', G::Search, D::Current, "\\re\\", "search backward"),
    entry('g', G::GlobPrefix, D::Full, "(1,$)g/re/command", "run command on matching lines"),
    entry('v', G::GlobPrefix, D::Full, "(1,$)v/re/command", "run command on non-matching lines"),
    entry('G', G::GlobPrefix, D::Full, "(1,$)G/re/", "interactive command on matching lines"),
    entry('V', G::GlobPrefix, D::Full, "(1,$)V/re/", "interactive command on non-matching lines"),
    entry('=', G::Plain, D::Current, "(.)=", "print line number"),
    entry('e', G::Plain, D::None, "e file", "edit file"),
    entry('r', G::Plain, D::Last, "($)r file", "read file after line"),
    entry('w', G::Plain, D::Full, "(1,$)w [file]", "write lines to file"),
    entry('f', G::Plain, D::None, "f [file]", "set or print filename"),
    entry('h', G::Plain, D::None, "h [action]", "explain last error or an action"),
    entry('H', G::Plain, D::None, "H", "toggle verbose errors"),
    entry('!', G::Shell, D::None, "!command", "run shell command"),
    entry('q', G::Plain, D::None, "q", "quit"),
    entry('Q', G::Plain, D::None, "Q", "quit without checking"),
];

/// Look up an action character.
pub fn lookup(action: char) -> Option<&'static ActionInfo> {
    ACTIONS.iter().find(|info| info.action == action)
}

/// Default addressing for an action; unknown actions address nothing.
pub fn default_addressing(action: char) -> DefaultAddressing {
    lookup(action).map_or(DefaultAddressing::None, |info| info.default)
}
