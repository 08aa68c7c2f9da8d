//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! ed-core: the command interpreter and buffer engine of the ed line editor.
//!
//! A command line flows through the [`lexer`] and [`parser`] into a
//! [`Command`], has its addresses resolved by [`address`], and is applied
//! to a [`Buffer`] by the edit operations in [`ops`] or the global engine
//! in [`glob`]. [`Session`] ties these to an input and output stream.

pub mod address;
pub mod buffer;
pub mod commands;
pub mod editor;
pub mod error;
pub mod glob;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod pattern;
pub mod store;

pub use buffer::{Buffer, Scan};
pub use commands::{lookup, ActionInfo, DefaultAddressing, Grammar, ACTIONS};
pub use editor::{Session, SessionConfig};
pub use error::{EdError, EdResult};
pub use glob::{for_each_marked, mark_matching, MarkVisitor, GLOB_MARK};
pub use lexer::{tokenize, Item, ItemType, Lexer};
pub use ops::PrintMode;
pub use parser::{parse, AddressRange, Command, Glob};
pub use pattern::Matcher;
pub use store::{LineStore, MemoryStore, ScratchStore, StorageKind};
