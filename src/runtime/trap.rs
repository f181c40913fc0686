use std::io::Write;

use colored::Colorize;

use super::{RunState, Status};
use crate::decode;
use crate::device::Input;
use crate::error::RuntimeError;

/// Emulated operating system services, selected by the low byte of `TRAP`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapVect {
    /// Read one character, no echo
    Getc = 0x20,
    /// Write the character in R0
    Out = 0x21,
    /// Write a string of one character per word
    Puts = 0x22,
    /// Read one character, with echo
    In = 0x23,
    /// Write a string of two characters per word
    Putsp = 0x24,
    Halt = 0x25,
}

impl TryFrom<u8> for TrapVect {
    type Error = ();
    fn try_from(vect: u8) -> Result<Self, Self::Error> {
        match vect {
            0x20 => Ok(TrapVect::Getc),
            0x21 => Ok(TrapVect::Out),
            0x22 => Ok(TrapVect::Puts),
            0x23 => Ok(TrapVect::In),
            0x24 => Ok(TrapVect::Putsp),
            0x25 => Ok(TrapVect::Halt),
            _ => Err(()),
        }
    }
}

impl<I, W> RunState<I, W>
where
    I: Input,
    W: Write,
{
    pub(super) fn trap(&mut self, addr: u16, instr: u16) -> Result<(), RuntimeError> {
        let vector = decode::trap_vect(instr);
        let Ok(service) = TrapVect::try_from(vector) else {
            return Err(RuntimeError::UnknownTrap {
                address: addr,
                vector,
            });
        };

        match service {
            TrapVect::Getc => {
                let ch = self.read_char()?;
                self.reg.set(0, ch as u16);
            }
            TrapVect::Out => {
                let ch = (self.reg.get(0) & 0xFF) as u8;
                self.put_bytes(&[ch])?;
            }
            TrapVect::Puts => {
                let mut string = Vec::new();
                // Stop at the end of memory rather than wrapping
                for addr in self.reg.get(0)..=u16::MAX {
                    let word = self.mem.peek(addr);
                    if word == 0 {
                        break;
                    }
                    string.push((word & 0xFF) as u8);
                }
                self.put_bytes(&string)?;
            }
            TrapVect::In => {
                let ch = self.read_char()?;
                self.put_bytes(&[ch])?;
                self.reg.set(0, ch as u16);
            }
            TrapVect::Putsp => {
                let mut string = Vec::new();
                'string: for addr in self.reg.get(0)..=u16::MAX {
                    let word = self.mem.peek(addr);
                    // Low byte first
                    for byte in [word & 0xFF, word >> 8] {
                        if byte == 0 {
                            break 'string;
                        }
                        string.push(byte as u8);
                    }
                }
                self.put_bytes(&string)?;
            }
            TrapVect::Halt => {
                self.status = Status::Halted;
                writeln!(self.output, "\n{:>12}", "Halted".cyan())
                    .map_err(RuntimeError::Output)?;
                self.output.flush().map_err(RuntimeError::Output)?;
            }
        }
        Ok(())
    }

    fn read_char(&mut self) -> Result<u8, RuntimeError> {
        self.input.read_char().map_err(RuntimeError::Input)
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), RuntimeError> {
        self.output
            .write_all(bytes)
            .and_then(|()| self.output.flush())
            .map_err(RuntimeError::Output)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::device::ScriptedInput;
    use crate::image::Image;
    use crate::register::Flag;

    /// Run `words` at 0x3000 with R0 pointing at `data`, placed at 0x4000.
    fn run_with_data(
        words: &[u16],
        data: &[u16],
        input: &str,
    ) -> RunState<ScriptedInput, Vec<u8>> {
        let mut raw = vec![0x3000];
        raw.extend_from_slice(words);
        let image = Image::from_raw(&raw).unwrap();
        let mut state = RunState::new(&image, ScriptedInput::new(input), Vec::new());
        state.mem.load(0x4000, data);
        state.reg.set(0, 0x4000);
        state.run().unwrap();
        state
    }

    fn printed(state: &RunState<ScriptedInput, Vec<u8>>) -> String {
        let output = String::from_utf8_lossy(state.output());
        // Strip halt notice, which may be coloured
        let notice = output.rfind("Halted").unwrap();
        let start = output[..notice].rfind('\n').unwrap();
        output[..start].to_string()
    }

    #[test]
    fn vector_lookup() {
        assert_eq!(TrapVect::try_from(0x22), Ok(TrapVect::Puts));
        assert_eq!(TrapVect::try_from(0x25), Ok(TrapVect::Halt));
        assert!(TrapVect::try_from(0x1F).is_err());
        assert!(TrapVect::try_from(0x26).is_err());
    }

    #[test]
    fn halt_notice() {
        let state = run_with_data(&[0xF025], &[], "");
        assert_eq!(state.status(), Status::Halted);
        let output = String::from_utf8_lossy(state.output());
        assert!(output.starts_with('\n'));
        assert!(output.contains("Halted"));
    }

    #[test]
    fn puts() {
        let data: Vec<u16> = "Hi!".bytes().map(u16::from).chain([0, 0x41]).collect();
        let state = run_with_data(&[0xF022, 0xF025], &data, "");
        assert_eq!(printed(&state), "Hi!");
    }

    #[test]
    fn puts_empty_string() {
        let state = run_with_data(&[0xF022, 0xF025], &[0x0000, 0x0041], "");
        assert_eq!(printed(&state), "");
    }

    #[test]
    fn puts_uses_low_byte() {
        let state = run_with_data(&[0xF022, 0xF025], &[0x1241, 0x0042, 0], "");
        assert_eq!(printed(&state), "AB");
    }

    #[test]
    fn puts_stops_at_end_of_memory() {
        let image = Image::from_raw(&[0x3000, 0xF022]).unwrap();
        let mut state = RunState::new(&image, ScriptedInput::new(""), Vec::new());
        state.mem.write(0xFFFE, b'o' as u16);
        state.mem.write(0xFFFF, b'k' as u16);
        state.mem.write(0x0000, b'!' as u16);
        state.reg.set(0, 0xFFFE);
        state.step().unwrap();
        assert_eq!(state.output().as_slice(), b"ok");
    }

    #[test]
    fn putsp_low_byte_first() {
        // "Hello" packed: "eH", "ll", "\0o"
        let state = run_with_data(&[0xF024, 0xF025], &[0x6548, 0x6C6C, 0x006F, 0], "");
        assert_eq!(printed(&state), "Hello");
    }

    #[test]
    fn putsp_stops_on_zero_low_byte() {
        let state = run_with_data(&[0xF024, 0xF025], &[0x6948, 0x4100, 0x4242, 0], "");
        assert_eq!(printed(&state), "Hi");
    }

    #[test]
    fn out() {
        let image = Image::from_raw(&[0x3000, 0xF021]).unwrap();
        let mut state = RunState::new(&image, ScriptedInput::new(""), Vec::new());
        state.reg.set(0, 0x1F00 | b'x' as u16);
        state.step().unwrap();
        assert_eq!(state.output().as_slice(), b"x");
    }

    #[test]
    fn getc_does_not_echo() {
        let image = Image::from_raw(&[0x3000, 0xF020]).unwrap();
        let mut state = RunState::new(&image, ScriptedInput::new("q"), Vec::new());
        state.step().unwrap();
        assert_eq!(state.reg(0), b'q' as u16);
        assert!(state.output().is_empty());
        // Trap results do not set condition codes
        assert_eq!(state.flag(), Flag::Z);
    }

    #[test]
    fn in_echoes() {
        let image = Image::from_raw(&[0x3000, 0xF023]).unwrap();
        let mut state = RunState::new(&image, ScriptedInput::new("q"), Vec::new());
        state.step().unwrap();
        assert_eq!(state.reg(0), b'q' as u16);
        assert_eq!(state.output().as_slice(), b"q");
    }

    #[test]
    fn getc_without_input() {
        let image = Image::from_raw(&[0x3000, 0xF020]).unwrap();
        let mut state = RunState::new(&image, ScriptedInput::new(""), Vec::new());
        let err = state.run().unwrap_err();
        match err {
            RuntimeError::Input(err) => assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_vector() {
        let image = Image::from_raw(&[0x3000, 0x1021, 0xF0FF]).unwrap();
        let mut state = RunState::new(&image, ScriptedInput::new(""), Vec::new());
        let err = state.run().unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UnknownTrap {
                address: 0x3001,
                vector: 0xFF
            }
        ));
        assert_eq!(state.reg(0), 1);
    }
}
