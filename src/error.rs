use std::fmt::{self, Display};
use std::{error::Error, io};

use miette::Diagnostic;

/// Error reading a program image into memory.
#[derive(Debug)]
pub enum LoadError {
    /// File could not be read.
    Unreadable(io::Error),
    /// Image does not contain an origin word.
    Empty,
    /// Image is not a whole number of 16-bit words.
    Misaligned { len: usize },
    /// Payload runs past the end of memory.
    TooLarge { orig: u16, len: usize },
}

/// Fatal error raised while executing a program.
#[derive(Debug)]
pub enum RuntimeError {
    /// Reserved opcode (`RTI` or `0xD`).
    IllegalOpcode { address: u16, instr: u16 },
    /// `TRAP` with a vector that has no service.
    UnknownTrap { address: u16, vector: u8 },
    /// Keyboard could not provide a character.
    Input(io::Error),
    /// Console output failed.
    Output(io::Error),
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unreadable(error) => Some(error),
            _ => None,
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Input(error) | Self::Output(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(error) => write!(f, "Could not read program image: {}", error),
            Self::Empty => write!(f, "Program image is empty"),
            Self::Misaligned { len } => {
                write!(f, "Program image is not aligned to 16 bits ({} bytes)", len)
            }
            Self::TooLarge { orig, len } => write!(
                f,
                "Program of {} words at origin 0x{:04x} does not fit in memory",
                len, orig
            ),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalOpcode { address, instr } => write!(
                f,
                "Illegal opcode 0x{:x} in instruction 0x{:04x} at 0x{:04x}",
                instr >> 12,
                instr,
                address
            ),
            Self::UnknownTrap { address, vector } => write!(
                f,
                "You called a trap with an unknown vector of 0x{:02x} at 0x{:04x}",
                vector, address
            ),
            Self::Input(error) => write!(f, "Failed to read input: {}", error),
            Self::Output(error) => write!(f, "Failed to write output: {}", error),
        }
    }
}

impl Diagnostic for LoadError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        let code = match self {
            Self::Unreadable(_) => "load::unreadable",
            Self::Empty => "load::empty",
            Self::Misaligned { .. } => "load::misaligned",
            Self::TooLarge { .. } => "load::too_large",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        let help = match self {
            Self::Unreadable(_) => "check that the path exists and is readable",
            Self::Empty | Self::Misaligned { .. } => {
                "images are big-endian 16-bit words, starting with the origin address"
            }
            Self::TooLarge { .. } => "move the origin lower or shorten the program",
        };
        Some(Box::new(help))
    }
}

impl Diagnostic for RuntimeError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        let code = match self {
            Self::IllegalOpcode { .. } => "run::illegal_opcode",
            Self::UnknownTrap { .. } => "run::unknown_trap",
            Self::Input(_) => "run::input",
            Self::Output(_) => "run::output",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match self {
            Self::IllegalOpcode { .. } => Some(Box::new(
                "`RTI` and opcode 0xD are not supported; the program may have jumped into data",
            )),
            Self::UnknownTrap { .. } => Some(Box::new(
                "available vectors are GETC (0x20), OUT, PUTS, IN, PUTSP and HALT (0x25)",
            )),
            Self::Input(_) => Some(Box::new(
                "the program asked for more input than was provided",
            )),
            Self::Output(_) => None,
        }
    }
}
