use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// Keyboard-like source of single bytes.
pub trait Input {
    /// Whether a byte can be read without blocking.
    ///
    /// Must never wait for input.
    fn poll(&mut self) -> bool;

    /// Read the next byte, blocking until one is available.
    fn read_char(&mut self) -> io::Result<u8>;

    /// Whether the user asked to stop the program, e.g. with `Ctrl+C`.
    ///
    /// Must never wait for input.
    fn interrupted(&mut self) -> bool {
        false
    }
}

impl<T: Input + ?Sized> Input for &mut T {
    fn poll(&mut self) -> bool {
        (**self).poll()
    }
    fn read_char(&mut self) -> io::Result<u8> {
        (**self).read_char()
    }
    fn interrupted(&mut self) -> bool {
        (**self).interrupted()
    }
}

fn input_closed() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "input closed")
}

/// Input with a fixed set of bytes, available immediately.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    bytes: VecDeque<u8>,
}

impl ScriptedInput {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self {
            bytes: bytes.as_ref().iter().copied().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl Input for ScriptedInput {
    fn poll(&mut self) -> bool {
        !self.bytes.is_empty()
    }

    fn read_char(&mut self) -> io::Result<u8> {
        self.bytes.pop_front().ok_or_else(input_closed)
    }
}

/// Stdin which is not attached to a terminal, i.e. piped.
///
/// Bytes are read on a separate thread so that polling never blocks.
#[derive(Debug)]
pub struct PipedInput {
    bytes: Receiver<u8>,
    /// Byte taken off the channel by `poll`, not yet read
    pending: Option<u8>,
}

impl PipedInput {
    pub fn new() -> Self {
        Self::from_reader(io::stdin())
    }

    pub fn from_reader<R>(mut reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        let (sender, bytes) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0; 1];
            // Stops on EOF, read error, or receiver dropped
            while let Ok(1) = reader.read(&mut buf) {
                if sender.send(buf[0]).is_err() {
                    break;
                }
            }
        });
        Self {
            bytes,
            pending: None,
        }
    }
}

impl Default for PipedInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Input for PipedInput {
    fn poll(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        match self.bytes.try_recv() {
            Ok(byte) => {
                self.pending = Some(byte);
                true
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => false,
        }
    }

    fn read_char(&mut self) -> io::Result<u8> {
        if let Some(byte) = self.pending.take() {
            return Ok(byte);
        }
        self.bytes.recv().map_err(|_| input_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_input() {
        let mut input = ScriptedInput::new("ab");
        assert!(input.poll());
        assert_eq!(input.read_char().unwrap(), b'a');
        assert_eq!(input.read_char().unwrap(), b'b');
        assert!(!input.poll());
        let err = input.read_char().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn piped_input_reads_then_closes() {
        let mut input = PipedInput::from_reader(io::Cursor::new(b"xy".to_vec()));
        assert_eq!(input.read_char().unwrap(), b'x');
        // Wait for the reader thread to deliver the next byte
        while !input.poll() {
            thread::yield_now();
        }
        assert_eq!(input.read_char().unwrap(), b'y');
        assert!(input.read_char().is_err());
        assert!(!input.poll());
    }
}
