use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers as Mod},
    terminal,
};

use crate::device::Input;

/// Exit status after `Ctrl+C`, as if killed by `SIGINT`.
pub const INTERRUPT_EXIT_CODE: i32 = 130;

/// Keeps the terminal in raw mode until dropped.
///
/// Keys are delivered one at a time without line buffering or echo, and
/// `Ctrl+C` no longer raises a signal; [`TerminalInput`] handles it instead.
#[derive(Debug)]
pub struct RawMode {
    _private: (),
}

impl RawMode {
    /// Must only be called if terminal is NOT in raw mode.
    pub fn enable() -> io::Result<Self> {
        debug_assert!(
            !terminal::is_raw_mode_enabled().is_ok_and(|is| is),
            "terminal should not be in raw mode to enable raw mode",
        );
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        // Nothing sensible to do if this fails during unwinding
        let _ = terminal::disable_raw_mode();
    }
}

/// Keyboard of an interactive terminal.
///
/// Caller must keep a [`RawMode`] alive while this is used.
#[derive(Debug, Default)]
pub struct TerminalInput {
    /// Remaining UTF-8 bytes of keys already read
    buffer: VecDeque<u8>,
    /// `Ctrl+C` was pressed
    interrupted: bool,
}

/// Key press relevant to a running program.
#[derive(Debug, PartialEq)]
enum Key {
    Char(char),
    Interrupt,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume pending terminal events without blocking.
    ///
    /// Returns whether `Ctrl+C` has been pressed. Any other keys are kept for
    /// the program to read.
    pub fn check_interrupt(&mut self) -> bool {
        // Errors are treated the same as no event being pending
        while !self.interrupted && matches!(event::poll(Duration::ZERO), Ok(true)) {
            match event::read() {
                Ok(event) => self.handle_event(event),
                Err(_) => break,
            }
        }
        self.interrupted
    }

    /// Consume one terminal event, buffering the bytes of any key press.
    fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        match read_key(key) {
            Some(Key::Char(ch)) => {
                // Multi-byte characters are read over successive calls
                let mut bytes = [0u8; 4];
                self.buffer
                    .extend(ch.encode_utf8(&mut bytes).as_bytes().iter().copied());
            }
            Some(Key::Interrupt) => self.interrupted = true,
            None => (),
        }
    }

    fn exit_if_interrupted(&self) {
        if self.interrupted {
            exit_interrupted();
        }
    }
}

impl Input for TerminalInput {
    fn poll(&mut self) -> bool {
        while self.buffer.is_empty() {
            // Errors are treated the same as no key being pressed
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(event) => self.handle_event(event),
                    Err(_) => return false,
                },
                Ok(false) | Err(_) => return false,
            }
            self.exit_if_interrupted();
        }
        true
    }

    fn read_char(&mut self) -> io::Result<u8> {
        loop {
            if let Some(byte) = self.buffer.pop_front() {
                return Ok(byte);
            }
            let event = event::read()?;
            self.handle_event(event);
            self.exit_if_interrupted();
        }
    }

    fn interrupted(&mut self) -> bool {
        self.check_interrupt()
    }
}

/// Return the terminal to normal state and exit, as `Ctrl+C` would normally.
pub fn exit_interrupted() -> ! {
    let _ = terminal::disable_raw_mode();
    println!();
    std::process::exit(INTERRUPT_EXIT_CODE);
}

fn read_key(event: KeyEvent) -> Option<Key> {
    if matches!(event.kind, KeyEventKind::Release) {
        return None;
    }
    let ch = match (event.modifiers, event.code) {
        (Mod::CONTROL, KeyCode::Char('c')) => return Some(Key::Interrupt),

        (_, KeyCode::Enter) => '\n',
        (_, KeyCode::Backspace) => '\x08',
        (_, KeyCode::Tab) => '\t',
        (_, KeyCode::Esc) => '\x1b',
        (_, KeyCode::Delete) => '\x7f',

        // Normal character
        (Mod::NONE | Mod::SHIFT, KeyCode::Char(ch)) => ch,

        _ => return None,
    };
    Some(Key::Char(ch))
}

/// Writer for a terminal in raw mode, where `\n` no longer returns the cursor.
#[derive(Debug)]
pub struct CrlfWriter<W> {
    inner: W,
    /// Off when output is redirected away from the terminal
    translate: bool,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W, translate: bool) -> Self {
        Self { inner, translate }
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.translate {
            return self.inner.write(buf);
        }
        for line in buf.split_inclusive(|&byte| byte == b'\n') {
            match line.strip_suffix(b"\n") {
                Some(line) => {
                    self.inner.write_all(line)?;
                    self.inner.write_all(b"\r\n")?;
                }
                None => self.inner.write_all(line)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
