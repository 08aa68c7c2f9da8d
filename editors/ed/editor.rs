//
// Copyright (c) 2024 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Main editor logic for ed.

use crate::address::{self, resolve_range, widen};
use crate::buffer::Buffer;
use crate::commands::{self, DefaultAddressing};
use crate::error::{EdError, EdResult};
use crate::glob::{for_each_marked, mark_matching, MarkVisitor, GLOB_MARK};
use crate::ops::{self, PrintMode};
use crate::parser::{parse, Command, Glob};
use crate::pattern::Matcher;
use crate::store::StorageKind;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Write};
use std::process::{self, Stdio};
use std::thread;

/// Session settings taken from the command line.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Prompt shown before each command; empty disables prompting
    pub prompt: String,
    /// Suppress byte counts and the `!` shell acknowledgement
    pub silent: bool,
    pub storage: StorageKind,
    /// Pager width used to widen plain prints
    pub pager: usize,
}

/// An ed editing session: a buffer plus the command loop around it.
pub struct Session<R: BufRead, W: Write> {
    /// The text buffer
    pub buf: Buffer,
    /// Input reader, for commands and text
    reader: R,
    /// Output writer
    writer: W,
    prompt: String,
    silent: bool,
    pager: usize,
    /// Show error messages, not just `?`
    verbose: bool,
    last_error: Option<String>,
    last_pattern: Option<String>,
    /// A modified-buffer warning was just given
    warned: bool,
    in_glob: bool,
    /// Running a command typed during `G` or `V`
    interactive: bool,
}

/// Lines for `a`, `i` and `c`: the inline argument when there is one,
/// otherwise input up to a line holding only `.`.
fn text_input<'a, R: BufRead>(
    reader: &'a mut R,
    argument: Option<&str>,
) -> impl FnMut() -> EdResult<Option<String>> + 'a {
    let inline = argument.is_some();
    let mut argument = argument.map(str::to_string);
    move || {
        if inline {
            return Ok(argument.take());
        }
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        Ok((line != ".").then_some(line))
    }
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(reader: R, writer: W, config: SessionConfig) -> io::Result<Self> {
        Ok(Session {
            buf: Buffer::new(config.storage)?,
            reader,
            writer,
            prompt: config.prompt,
            silent: config.silent,
            pager: config.pager,
            verbose: false,
            last_error: None,
            last_pattern: None,
            warned: false,
            in_glob: false,
            interactive: false,
        })
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn pager(&self) -> usize {
        self.pager
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn print_prompt(&mut self) -> io::Result<()> {
        if !self.prompt.is_empty() {
            write!(self.writer, "{}", self.prompt)?;
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Print an error.
    fn print_error(&mut self, err: &EdError) -> io::Result<()> {
        writeln!(self.writer, "?")?;
        if self.verbose {
            writeln!(self.writer, "{}", err)?;
        }
        self.last_error = Some(err.to_string());
        Ok(())
    }

    /// Print bytes read or written (if not silent).
    fn print_bytes(&mut self, bytes: usize) -> io::Result<()> {
        if !self.silent {
            writeln!(self.writer, "{}", bytes)?;
        }
        Ok(())
    }

    fn print_line(&mut self, idx: usize) -> EdResult<()> {
        let text = self.buf.get_text(idx)?;
        writeln!(self.writer, "{}", text)?;
        Ok(())
    }

    /// Read a line from input, without its newline.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Run the command loop until quit or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_prompt()?;
            let Some(line) = self.read_line()? else { break };
            if !self.process_line(&line)? {
                break;
            }
        }
        if self.buf.is_modified() {
            log::warn!("session ended with unsaved changes");
        }
        self.writer.flush()
    }

    /// Process one command line. Returns false when the session should end.
    pub fn process_line(&mut self, line: &str) -> io::Result<bool> {
        match self.execute_line(line) {
            Ok(()) => Ok(true),
            Err(EdError::Quit | EdError::ReallyQuit | EdError::Break) => Ok(false),
            Err(EdError::Stop) => Ok(true),
            Err(e) => {
                self.print_error(&e)?;
                Ok(true)
            }
        }
    }

    fn execute_line(&mut self, line: &str) -> EdResult<()> {
        let warned = std::mem::take(&mut self.warned);
        let cmd = parse(line)?;
        if warned && matches!(cmd.action, Some('q' | 'e')) && cmd.glob.is_none() {
            self.warned = true;
        }
        self.execute(&cmd)
    }

    /// Load a file into the buffer, remembering its name.
    pub fn load_file(&mut self, path: &str) -> EdResult<usize> {
        let file = File::open(path)?;
        let bytes = self.buf.load(BufReader::new(file))?;
        self.buf.pathname = path.to_string();
        Ok(bytes)
    }

    /// Refuse once when unsaved changes would be lost.
    fn check_modified(&mut self) -> EdResult<()> {
        if self.buf.is_modified() && !self.warned {
            self.warned = true;
            return Err(EdError::BufferModified);
        }
        Ok(())
    }

    /// Use `pattern`, or the last one when it is empty.
    fn pattern_or_last(&mut self, pattern: Option<&str>) -> EdResult<String> {
        match pattern {
            None => Err(EdError::MissingPattern),
            Some("") => self.last_pattern.clone().ok_or(EdError::NoPreviousPattern),
            Some(p) => {
                self.last_pattern = Some(p.to_string());
                Ok(p.to_string())
            }
        }
    }

    fn filename(&self, argument: Option<&str>) -> EdResult<String> {
        match argument {
            Some(name) => Ok(name.to_string()),
            None if !self.buf.pathname.is_empty() => Ok(self.buf.pathname.clone()),
            None => Err(EdError::NoFilename),
        }
    }

    fn resolve(&self, cmd: &Command, default: DefaultAddressing) -> EdResult<(usize, usize)> {
        resolve_range(
            &cmd.range,
            default,
            self.buf.cur_line(),
            self.buf.last_line(),
            self.pager,
        )
    }

    fn destination(&self, cmd: &Command) -> EdResult<usize> {
        match cmd.destination.as_deref() {
            None | Some("") => Err(EdError::MissingDestination),
            Some(dest) => address::resolve(dest, self.buf.cur_line(), self.buf.last_line()),
        }
    }

    /// Execute a parsed command and its chained sub-commands.
    pub fn execute(&mut self, cmd: &Command) -> EdResult<()> {
        if let Some(glob) = &cmd.glob {
            if self.in_glob {
                return Err(EdError::NotInGlob);
            }
            return self.execute_glob(glob, cmd);
        }

        self.execute_action(cmd)?;
        if let Some(sub) = &cmd.sub {
            self.execute(sub)?;
        }
        Ok(())
    }

    /// Input with no action: an address prints that line, an empty line
    /// prints the next one.
    fn execute_address_only(&mut self, cmd: &Command) -> EdResult<()> {
        if cmd.range.is_empty() {
            let next = self.buf.cur_line() + 1;
            if next > self.buf.last_line() {
                return Err(EdError::InvalidAddress(next.to_string()));
            }
            self.buf.set_cur_line(next)?;
            return self.print_line(next);
        }

        let (l1, l2) = self.resolve(cmd, DefaultAddressing::Current)?;
        if cmd.range.has_increment() {
            return ops::print(&mut self.buf, l1, l2, PrintMode::Normal, &mut self.writer);
        }
        if l2 == 0 {
            return Err(EdError::InvalidRange);
        }
        self.buf.set_cur_line(l2)?;
        self.print_line(l2)
    }

    fn execute_action(&mut self, cmd: &Command) -> EdResult<()> {
        let Some(action) = cmd.action else {
            return self.execute_address_only(cmd);
        };
        let info = commands::lookup(action).ok_or(EdError::UnknownCommand(action))?;
        let (l1, l2) = self.resolve(cmd, info.default)?;

        match action {
            'p' | 'n' | 'l' => {
                let mode = match action {
                    'n' => PrintMode::Numbered,
                    'l' => PrintMode::List,
                    _ => PrintMode::Normal,
                };
                let (l1, l2) = if action == 'p' && !cmd.range.has_increment() && self.pager > 0 {
                    widen((l1, l2), self.pager, self.pager, self.buf.last_line())
                } else {
                    (l1, l2)
                };
                ops::print(&mut self.buf, l1, l2, mode, &mut self.writer)
            }
            'a' => {
                let input = text_input(&mut self.reader, cmd.argument.as_deref());
                ops::append(&mut self.buf, l2, input).map(|_| ())
            }
            'i' => {
                let input = text_input(&mut self.reader, cmd.argument.as_deref());
                ops::insert(&mut self.buf, l1, input).map(|_| ())
            }
            'c' => {
                let input = text_input(&mut self.reader, cmd.argument.as_deref());
                ops::change(&mut self.buf, l1, l2, input).map(|_| ())
            }
            'd' => ops::delete(&mut self.buf, l1, l2),
            'm' => {
                let dest = self.destination(cmd)?;
                ops::move_lines(&mut self.buf, l1, l2, dest)
            }
            'k' => {
                let dest = self.destination(cmd)?;
                ops::copy_lines(&mut self.buf, l1, l2, dest)
            }
            'z' => self.set_pager(cmd.destination.as_deref()),
            'M' => ops::mirror(&mut self.buf, l1, l2),
            's' | 'S' | 't' => {
                let pattern = self.pattern_or_last(cmd.pattern.as_deref())?;
                let repl = cmd.substitution.as_deref().unwrap_or("");
                match action {
                    't' => ops::transliterate(&mut self.buf, l1, l2, &pattern, repl, cmd.count),
                    's' => {
                        let matcher = Matcher::literal(&pattern);
                        ops::substitute(&mut self.buf, l1, l2, &matcher, repl, cmd.count)
                    }
                    _ => {
                        let matcher = Matcher::regex(&pattern)?;
                        ops::substitute(&mut self.buf, l1, l2, &matcher, repl, cmd.count)
                    }
                }
            }
            'j' => {
                let sep = cmd.pattern.as_deref().unwrap_or("");
                ops::join(&mut self.buf, l1, l2, sep)
            }
            'b' => {
                let pattern = self.pattern_or_last(cmd.pattern.as_deref())?;
                let matcher = Matcher::regex(&pattern)?;
                ops::break_lines(&mut self.buf, l1, l2, &matcher, cmd.count)
            }
            '\'' => {
                let label = cmd.argument.as_deref().unwrap_or("");
                ops::put_mark(&mut self.buf, l1, l2, label)
            }
            '/' | '\\' => self.search(cmd.pattern.as_deref(), action == '/'),
            '=' => {
                writeln!(self.writer, "{}", l2)?;
                Ok(())
            }
            'e' => {
                let path = self.filename(cmd.argument.as_deref())?;
                self.check_modified()?;
                let bytes = self.load_file(&path)?;
                self.print_bytes(bytes)?;
                Ok(())
            }
            'r' => self.read_file(l2, cmd.argument.as_deref()),
            'w' => self.write_file(l1, l2, cmd.argument.as_deref()),
            'f' => {
                if let Some(name) = &cmd.argument {
                    self.buf.pathname = name.clone();
                }
                if self.buf.pathname.is_empty() {
                    return Err(EdError::NoFilename);
                }
                writeln!(self.writer, "{}", self.buf.pathname)?;
                Ok(())
            }
            'h' => self.help(cmd.argument.as_deref()),
            'H' => {
                self.verbose = !self.verbose;
                if self.verbose {
                    if let Some(msg) = self.last_error.clone() {
                        writeln!(self.writer, "{}", msg)?;
                    }
                }
                Ok(())
            }
            '!' => self.shell(cmd.argument.as_deref().unwrap_or("")),
            'q' => {
                if !self.interactive {
                    self.check_modified()?;
                }
                Err(EdError::Quit)
            }
            'Q' => Err(EdError::ReallyQuit),
            _ => Err(EdError::UnknownCommand(action)),
        }
    }

    /// `z n` sets the pager width; `z` alone shows it.
    fn set_pager(&mut self, width: Option<&str>) -> EdResult<()> {
        if self.in_glob {
            return Err(EdError::NotInGlob);
        }
        match width {
            None | Some("") => {
                writeln!(self.writer, "{}", self.pager)?;
            }
            Some(text) => {
                self.pager = text
                    .parse()
                    .map_err(|_| EdError::InvalidAddress(text.to_string()))?;
            }
        }
        Ok(())
    }

    /// Circular search from the line after (or before) the current one.
    fn search(&mut self, pattern: Option<&str>, forward: bool) -> EdResult<()> {
        let pattern = self.pattern_or_last(pattern)?;
        let matcher = Matcher::regex(&pattern)?;

        let buf = &self.buf;
        let (cur, span) = (buf.cur_line(), buf.last_line() + 1);
        let scan = if forward {
            buf.scan_forward(buf.next_line(cur), span)
        } else {
            buf.scan_reverse(buf.prev_line(cur), span)
        };
        let mut found = None;
        for idx in scan.filter(|&idx| idx != 0) {
            if matcher.is_match(&buf.get_text(idx)?) {
                found = Some(idx);
                break;
            }
        }

        let line = found.ok_or(EdError::NoMatch)?;
        self.buf.set_cur_line(line)?;
        self.print_line(line)
    }

    fn read_file(&mut self, after: usize, argument: Option<&str>) -> EdResult<()> {
        let before = self.buf.last_line();
        let bytes = match argument.and_then(|arg| arg.strip_prefix('!')) {
            Some(command) => {
                let output = process::Command::new("sh").arg("-c").arg(command).output()?;
                self.buf.read_after(after, Cursor::new(output.stdout))?
            }
            None => {
                let path = self.filename(argument)?;
                let file = File::open(&path)?;
                if self.buf.pathname.is_empty() {
                    self.buf.pathname = path;
                }
                self.buf.read_after(after, BufReader::new(file))?
            }
        };
        let added = self.buf.last_line() - before;
        if added > 0 {
            self.buf.set_cur_line(after + added)?;
        }
        self.print_bytes(bytes)?;
        Ok(())
    }

    fn write_file(&mut self, l1: usize, l2: usize, argument: Option<&str>) -> EdResult<()> {
        let bytes = match argument.and_then(|arg| arg.strip_prefix('!')) {
            Some(command) => {
                let mut child = process::Command::new("sh")
                    .arg("-c")
                    .arg(command)
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .spawn()?;
                let mut input = Vec::new();
                let bytes = self.buf.write_lines(l1, l2, &mut input)?;
                // stdin is fed on its own thread while stdout drains here
                let feeder = child
                    .stdin
                    .take()
                    .map(|mut stdin| thread::spawn(move || stdin.write_all(&input)));
                let output = child.wait_with_output()?;
                if let Some(feeder) = feeder {
                    let written = feeder
                        .join()
                        .unwrap_or_else(|_| Err(io::Error::other("shell input writer panicked")));
                    if let Err(e) = written {
                        if e.kind() != io::ErrorKind::BrokenPipe {
                            return Err(e.into());
                        }
                    }
                }
                self.writer.write_all(&output.stdout)?;
                bytes
            }
            None => {
                let path = self.filename(argument)?;
                let mut file = File::create(&path)?;
                let bytes = self.buf.write_lines(l1, l2, &mut file)?;
                if self.buf.pathname.is_empty() {
                    self.buf.pathname = path;
                }
                if l1 <= 1 && l2 == self.buf.last_line() {
                    self.buf.clear_modified();
                }
                bytes
            }
        };
        self.print_bytes(bytes)?;
        Ok(())
    }

    fn help(&mut self, argument: Option<&str>) -> EdResult<()> {
        match argument.and_then(|arg| arg.chars().next()) {
            Some(action) => {
                let info = commands::lookup(action).ok_or(EdError::UnknownCommand(action))?;
                writeln!(self.writer, "{}\t{}", info.syntax, info.description)?;
            }
            None => {
                if let Some(msg) = self.last_error.clone() {
                    writeln!(self.writer, "{}", msg)?;
                }
            }
        }
        Ok(())
    }

    /// Execute a shell command and copy its output.
    fn shell(&mut self, command: &str) -> EdResult<()> {
        let output = process::Command::new("sh").arg("-c").arg(command).output()?;
        self.writer.write_all(&output.stdout)?;
        if !self.silent {
            writeln!(self.writer, "!")?;
        }
        Ok(())
    }

    /// Mark the lines a glob selects, then run the command over each.
    fn execute_glob(&mut self, glob: &Glob, cmd: &Command) -> EdResult<()> {
        let (l1, l2) = self.resolve_glob_range(glob)?;

        let mut inner = cmd.clone();
        inner.glob = None;
        if inner.is_glob_or_pager() {
            return Err(EdError::NotInGlob);
        }
        if inner.action.is_none() && inner.range.is_empty() {
            inner.action = Some('p');
        }

        let label = if glob.is_bulk_mark() {
            match glob.pattern.chars().next() {
                Some(c) if c.is_ascii_alphanumeric() => c,
                _ => return Err(EdError::InvalidMark),
            }
        } else {
            let pattern = self.pattern_or_last(Some(glob.pattern.as_str()))?;
            let matcher = Matcher::regex(&pattern)?;
            mark_matching(&mut self.buf, l1, l2, &matcher, glob.is_inverted())?;
            GLOB_MARK
        };

        self.in_glob = true;
        let result = if glob.is_interactive() {
            for_each_marked(&mut InteractiveRunner { session: self }, label)
        } else {
            for_each_marked(
                &mut GlobRunner {
                    session: self,
                    cmd: &inner,
                },
                label,
            )
        };
        self.in_glob = false;
        result.map(|_| ())
    }

    fn resolve_glob_range(&self, glob: &Glob) -> EdResult<(usize, usize)> {
        resolve_range(
            &glob.range,
            DefaultAddressing::Full,
            self.buf.cur_line(),
            self.buf.last_line(),
            self.pager,
        )
    }

    /// Nested command loop of `G` and `V` for one matched line.
    fn interactive_visit(&mut self, line: usize) -> EdResult<()> {
        self.buf.set_cur_line(line)?;
        self.print_line(line)?;
        loop {
            let Some(input) = self.read_line()? else {
                return Err(EdError::Break);
            };
            if input.trim().is_empty() {
                return Ok(());
            }
            self.interactive = true;
            let result = self.execute_line(&input);
            self.interactive = false;
            match result {
                Ok(()) => {}
                Err(EdError::Quit) => return Ok(()),
                Err(EdError::ReallyQuit) => return Err(EdError::Stop),
                Err(e) if e.is_control() => return Err(e),
                Err(e) => self.print_error(&e)?,
            }
        }
    }
}

/// Map-pass receiver for `g`, `v` and `"`.
struct GlobRunner<'a, R: BufRead, W: Write> {
    session: &'a mut Session<R, W>,
    cmd: &'a Command,
}

impl<R: BufRead, W: Write> MarkVisitor for GlobRunner<'_, R, W> {
    fn buffer(&mut self) -> &mut Buffer {
        &mut self.session.buf
    }

    fn visit(&mut self, line: usize) -> EdResult<()> {
        self.session.buf.set_cur_line(line)?;
        self.session.execute(self.cmd)
    }
}

/// Map-pass receiver for `G` and `V`.
struct InteractiveRunner<'a, R: BufRead, W: Write> {
    session: &'a mut Session<R, W>,
}

impl<R: BufRead, W: Write> MarkVisitor for InteractiveRunner<'_, R, W> {
    fn buffer(&mut self) -> &mut Buffer {
        &mut self.session.buf
    }

    fn visit(&mut self, line: usize) -> EdResult<()> {
        self.session.interactive_visit(line)
    }
}
