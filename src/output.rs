use std::cell::RefCell;
use std::fmt::Display;

use colored::Colorize;
use crossterm::terminal;

use crate::decode::Opcode;
use crate::register::Registers;

#[derive(Clone, Copy, Debug)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

/// Returns the previous value.
///
/// Minimal output also disables colour everywhere, including the halt notice.
pub fn set_minimal(new_value: bool) -> bool {
    if new_value {
        colored::control::set_override(false);
    }
    IS_MINIMAL.with(|value| value.replace(new_value))
}

pub fn is_minimal() -> bool {
    IS_MINIMAL.with(|value| *value.borrow())
}

/// Print a status line to stderr, unless `--minimal`.
///
/// Stdout is reserved for the running program.
pub fn message(color: MsgColor, left: &str, right: impl Display) {
    if is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    eprintln!("{left:>12} {right}");
}

/// Print one executed instruction to stderr.
pub fn trace(addr: u16, instr: u16) {
    let line = format!("0x{:04x}  0x{:04x}  {}", addr, instr, Opcode::decode(instr));
    // Raw terminal does not return the cursor on `\n`
    let end = if terminal::is_raw_mode_enabled().unwrap_or(false) {
        "\r\n"
    } else {
        "\n"
    };
    eprint!("{}{}", line.blue(), end);
}

pub fn print_registers(regs: &Registers) {
    if is_minimal() {
        for (i, val) in regs.iter().enumerate() {
            eprintln!("R{} {}", i, val);
        }
        eprintln!("PC {}", regs.pc);
        eprintln!("CC {}", regs.flag);
        return;
    }

    eprintln!("\x1b[2m┌────────────────────────────────────┐\x1b[0m");
    eprintln!("\x1b[2m│        \x1b[3mhex     int    uint    char\x1b[0m\x1b[2m │\x1b[0m");
    for (i, val) in regs.iter().enumerate() {
        eprintln!(
            "\x1b[2m│\x1b[0m \x1b[1mR{}\x1b[0m  0x{:04x}  {:-6}  {:-6}   {} \x1b[2m│\x1b[0m",
            i,
            val,
            val as i16,
            val,
            char_display(val)
        );
    }
    eprintln!(
        "\x1b[2m│\x1b[0m \x1b[1mPC\x1b[0m  0x{:04x}                 \x1b[1mCC\x1b[0m  {} \x1b[2m│\x1b[0m",
        regs.pc, regs.flag
    );
    eprintln!("\x1b[2m└────────────────────────────────────┘\x1b[0m");
}

/// Three columns wide.
fn char_display(value: u16) -> String {
    match value {
        // ASCII control characters which are arbitrarily considered significant
        0x00 => "NUL".into(),
        0x08 => "BS ".into(),
        0x09 => "HT ".into(),
        0x0a => "LF ".into(),
        0x0d => "CR ".into(),
        0x1b => "ESC".into(),
        0x7f => "DEL".into(),

        // Space
        0x20 => "[_]".into(),

        // Printable ASCII characters
        0x21..=0x7e => format!("{:<3}", value as u8 as char),

        // Any ASCII character not already matched (unimportant control characters)
        0x00..=0x7f => "\x1b[2m───\x1b[0m".into(),
        // Any non-ASCII character
        0x0080.. => "\x1b[2m┄┄┄\x1b[0m".into(),
    }
}
