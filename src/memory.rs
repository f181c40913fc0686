use std::io;

use crate::device::Input;

/// LC3 can address 128KB of memory.
pub const MEMORY_MAX: usize = 0x10000;

/// Keyboard status register. Bit 15 is set when a character is ready.
pub const KBSR: u16 = 0xFE00;
/// Keyboard data register. Holds the last character latched by a `KBSR` read.
pub const KBDR: u16 = 0xFE02;

/// Flat address space of 16-bit words.
pub struct Memory {
    /// Always `MEMORY_MAX` words, so any `u16` index is in bounds
    words: Box<[u16]>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            words: vec![0; MEMORY_MAX].into_boxed_slice(),
        }
    }

    /// Read a word as an instruction would, polling the keyboard on `KBSR`.
    pub fn read(&mut self, addr: u16, input: &mut impl Input) -> io::Result<u16> {
        if addr == KBSR {
            if input.poll() {
                let ch = input.read_char()?;
                self.write(KBSR, 1 << 15);
                self.write(KBDR, ch as u16);
            } else {
                self.write(KBSR, 0);
            }
        }
        Ok(self.peek(addr))
    }

    /// Read a word without any device side effects.
    #[inline]
    pub fn peek(&self, addr: u16) -> u16 {
        self.words[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, val: u16) {
        self.words[addr as usize] = val;
    }

    /// Copy `words` into memory starting at `orig`.
    ///
    /// Caller must ensure the words fit before the end of memory.
    pub(crate) fn load(&mut self, orig: u16, words: &[u16]) {
        let start = orig as usize;
        self.words[start..start + words.len()].copy_from_slice(words);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ScriptedInput;

    #[test]
    fn plain_read_write() {
        let mut mem = Memory::new();
        let mut input = ScriptedInput::new("");
        assert_eq!(mem.read(0xFFFF, &mut input).unwrap(), 0);
        mem.write(0xFFFF, 0xBEEF);
        assert_eq!(mem.read(0xFFFF, &mut input).unwrap(), 0xBEEF);
        // KBDR is not intercepted on its own
        mem.write(KBDR, 0x41);
        assert_eq!(mem.read(KBDR, &mut input).unwrap(), 0x41);
    }

    #[test]
    fn status_read_latches_character() {
        let mut mem = Memory::new();
        let mut input = ScriptedInput::new("k");
        assert_eq!(mem.read(KBSR, &mut input).unwrap(), 0x8000);
        assert_eq!(mem.peek(KBDR), b'k' as u16);
        assert_eq!(input.remaining(), 0);
        // Polled again on every read
        assert_eq!(mem.read(KBSR, &mut input).unwrap(), 0x0000);
        assert_eq!(mem.peek(KBDR), b'k' as u16);
    }

    #[test]
    fn status_write_is_plain() {
        let mut mem = Memory::new();
        mem.write(KBSR, 0x1234);
        assert_eq!(mem.peek(KBSR), 0x1234);
        let mut input = ScriptedInput::new("");
        assert_eq!(mem.read(KBSR, &mut input).unwrap(), 0);
    }
}
