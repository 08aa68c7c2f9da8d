//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Error types for the ed editor.

use std::io;

/// Errors that can occur while lexing, parsing or executing a command.
///
/// The last four variants are control sentinels rather than failures;
/// see [`EdError::is_control`].
#[derive(thiserror::Error, Debug)]
pub enum EdError {
    /// Malformed command text (unterminated delimiter, stray character)
    #[error("{0}")]
    Lexical(String),
    /// Non-numeric address, or one outside `[0, lastline]`
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Start after end, or a zero start where a line is required
    #[error("invalid range")]
    InvalidRange,
    #[error("unknown command: {0}")]
    UnknownCommand(char),
    #[error("missing destination")]
    MissingDestination,
    #[error("missing pattern")]
    MissingPattern,
    #[error("invalid mark")]
    InvalidMark,
    /// Glob-prefixed and pager-setting commands cannot run inside a glob
    #[error("command not allowed in glob")]
    NotInGlob,
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("destination inside source range")]
    DestinationInRange,
    #[error("replace count exceeds matches")]
    CountExceedsMatches,
    #[error("no match")]
    NoMatch,
    #[error("no previous pattern")]
    NoPreviousPattern,
    #[error("no current filename")]
    NoFilename,
    #[error("warning: buffer modified")]
    BufferModified,
    #[error("{0}")]
    Io(#[from] io::Error),
    /// `q`: leave the session, or advance to the next line of an interactive glob
    #[error("quit")]
    Quit,
    /// `Q`: leave the session, or abort an interactive glob
    #[error("really quit")]
    ReallyQuit,
    /// Input exhausted
    #[error("break")]
    Break,
    /// An interactive glob was aborted
    #[error("stop")]
    Stop,
}

impl EdError {
    /// True for the sentinels that end a loop rather than report a failure.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            EdError::Quit | EdError::ReallyQuit | EdError::Break | EdError::Stop
        )
    }
}

/// Result type for ed operations.
pub type EdResult<T> = Result<T, EdError>;
