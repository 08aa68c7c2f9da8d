//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! ed - edit text

use clap::Parser;
use ed_core::{Session, SessionConfig, StorageKind};
use std::io::{self, BufReader, BufWriter};

/// ed - edit text
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use string as the prompt when in command mode
    #[arg(short, long, default_value = "")]
    prompt: String,

    /// Suppress the writing of byte counts by e, r, and w commands
    /// and the '!' prompt after !command
    #[arg(short, long)]
    silent: bool,

    /// Keep line text in a scratch file instead of memory
    #[arg(long)]
    scratch: bool,

    /// Pager width used to widen plain print commands
    #[arg(short = 'z', long, default_value_t = 0)]
    pager: usize,

    /// File to edit
    file: Option<String>,
}

impl Args {
    fn config(&self) -> SessionConfig {
        SessionConfig {
            prompt: self.prompt.clone(),
            silent: self.silent,
            storage: if self.scratch {
                StorageKind::Scratch
            } else {
                StorageKind::Memory
            },
            pager: self.pager,
        }
    }
}

/// Set up signal handlers per POSIX requirements for ed.
fn setup_signals() {
    unsafe {
        // SIGQUIT: Ignore (POSIX requirement)
        libc::signal(libc::SIGQUIT, libc::SIG_IGN);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    setup_signals();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = BufReader::new(stdin.lock());
    let writer = BufWriter::new(stdout.lock());

    let mut session = Session::new(reader, writer, args.config())?;

    if let Some(ref path) = args.file {
        match session.load_file(path) {
            Ok(bytes) => {
                if !args.silent {
                    println!("{}", bytes);
                }
            }
            Err(e) => {
                session.buf.pathname = path.clone();
                if !args.silent {
                    eprintln!("{}: {}", path, e);
                }
            }
        }
    }

    if let Err(e) = session.run() {
        eprintln!("ed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
