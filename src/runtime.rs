mod trap;

use std::io::Write;

use crate::decode::{self, sign_extend, Opcode};
use crate::device::Input;
use crate::error::RuntimeError;
use crate::image::Image;
use crate::memory::Memory;
use crate::output;
use crate::register::{Flag, Registers};

pub use self::trap::TrapVect;

/// Execution loop state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    /// Entered only by the `HALT` trap.
    Halted,
    /// Input device asked to stop, e.g. `Ctrl+C` in a terminal.
    Interrupted,
}

/// Instructions executed between checks for an interrupt from the input device.
pub const INTERRUPT_INTERVAL: u64 = 0x1000;

/// Represents complete program state during runtime.
///
/// Generic over the keyboard and console, so that several machines can exist
/// side by side.
pub struct RunState<I, W> {
    /// System memory - 128KB in size.
    mem: Memory,
    reg: Registers,
    status: Status,
    input: I,
    output: W,
    /// Instructions fetched since load
    instr_count: u64,
    trace: bool,
}

impl<I, W> RunState<I, W>
where
    I: Input,
    W: Write,
{
    /// Load `image` into fresh memory, with the program counter at its origin.
    pub fn new(image: &Image, input: I, output: W) -> Self {
        let mut mem = Memory::new();
        mem.load(image.orig(), image.words());
        Self {
            mem,
            reg: Registers::new(image.orig()),
            status: Status::Running,
            input,
            output,
            instr_count: 0,
            trace: false,
        }
    }

    /// Print every instruction to stderr as it is executed.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    /// Run until `HALT`, an interrupt, or a fatal error.
    ///
    /// The input device is asked for an interrupt every
    /// [`INTERRUPT_INTERVAL`] instructions, so that programs which never read
    /// the keyboard can still be stopped.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        while self.status == Status::Running {
            self.step()?;
            if self.status == Status::Running
                && self.instr_count % INTERRUPT_INTERVAL == 0
                && self.input.interrupted()
            {
                self.status = Status::Interrupted;
            }
        }
        Ok(())
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// Does nothing once stopped.
    pub fn step(&mut self) -> Result<(), RuntimeError> {
        if self.status != Status::Running {
            return Ok(());
        }
        let addr = self.reg.pc;
        let instr = self.mem.peek(addr);
        // PC incremented before instruction is performed
        self.reg.pc = addr.wrapping_add(1);
        self.instr_count += 1;
        if self.trace {
            output::trace(addr, instr);
        }

        match Opcode::decode(instr) {
            Opcode::BR => self.br(instr),
            Opcode::ADD => self.add(instr),
            Opcode::LD => self.ld(instr)?,
            Opcode::ST => self.st(instr),
            Opcode::JSR => self.jsr(instr),
            Opcode::AND => self.and(instr),
            Opcode::LDR => self.ldr(instr)?,
            Opcode::STR => self.str(instr),
            Opcode::NOT => self.not(instr),
            Opcode::LDI => self.ldi(instr)?,
            Opcode::STI => self.sti(instr)?,
            Opcode::JMP => self.jmp(instr),
            Opcode::LEA => self.lea(instr),
            Opcode::TRAP => self.trap(addr, instr)?,
            Opcode::RTI | Opcode::RES => {
                return Err(RuntimeError::IllegalOpcode {
                    address: addr,
                    instr,
                })
            }
        }
        Ok(())
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn pc(&self) -> u16 {
        self.reg.pc
    }

    pub fn reg(&self, reg: u16) -> u16 {
        self.reg.get(reg)
    }

    pub fn flag(&self) -> Flag {
        self.reg.flag
    }

    pub fn registers(&self) -> &Registers {
        &self.reg
    }

    /// Read memory without triggering the keyboard.
    pub fn mem(&self, addr: u16) -> u16 {
        self.mem.peek(addr)
    }

    pub fn instruction_count(&self) -> u64 {
        self.instr_count
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    fn mem_read(&mut self, addr: u16) -> Result<u16, RuntimeError> {
        self.mem
            .read(addr, &mut self.input)
            .map_err(RuntimeError::Input)
    }

    /// Address relative to the incremented program counter.
    #[inline]
    fn pc_offset(&self, instr: u16, bits: u32) -> u16 {
        self.reg.pc.wrapping_add(sign_extend(instr, bits))
    }

    fn add(&mut self, instr: u16) {
        let dr = decode::dr(instr);
        let val1 = self.reg.get(decode::sr1(instr));
        let val2 = if decode::is_imm(instr) {
            sign_extend(instr, 5)
        } else {
            self.reg.get(decode::sr2(instr))
        };
        self.reg.set(dr, val1.wrapping_add(val2));
        self.reg.update_flags(dr);
    }

    fn and(&mut self, instr: u16) {
        let dr = decode::dr(instr);
        let val1 = self.reg.get(decode::sr1(instr));
        let val2 = if decode::is_imm(instr) {
            sign_extend(instr, 5)
        } else {
            self.reg.get(decode::sr2(instr))
        };
        self.reg.set(dr, val1 & val2);
        self.reg.update_flags(dr);
    }

    fn not(&mut self, instr: u16) {
        let dr = decode::dr(instr);
        let val = !self.reg.get(decode::sr1(instr));
        self.reg.set(dr, val);
        self.reg.update_flags(dr);
    }

    fn br(&mut self, instr: u16) {
        if self.reg.flag.matches(decode::nzp(instr)) {
            self.reg.pc = self.pc_offset(instr, 9);
        }
    }

    fn jmp(&mut self, instr: u16) {
        self.reg.pc = self.reg.get(decode::sr1(instr));
    }

    fn jsr(&mut self, instr: u16) {
        // Read base first, `JSRR R7` jumps to the old R7
        let target = if instr & 0x800 == 0 {
            self.reg.get(decode::sr1(instr))
        } else {
            self.pc_offset(instr, 11)
        };
        self.reg.set(7, self.reg.pc);
        self.reg.pc = target;
    }

    fn ld(&mut self, instr: u16) -> Result<(), RuntimeError> {
        let dr = decode::dr(instr);
        let val = self.mem_read(self.pc_offset(instr, 9))?;
        self.reg.set(dr, val);
        self.reg.update_flags(dr);
        Ok(())
    }

    fn ldi(&mut self, instr: u16) -> Result<(), RuntimeError> {
        let dr = decode::dr(instr);
        let ptr = self.mem_read(self.pc_offset(instr, 9))?;
        let val = self.mem_read(ptr)?;
        self.reg.set(dr, val);
        self.reg.update_flags(dr);
        Ok(())
    }

    fn ldr(&mut self, instr: u16) -> Result<(), RuntimeError> {
        let dr = decode::dr(instr);
        let base = self.reg.get(decode::sr1(instr));
        let val = self.mem_read(base.wrapping_add(sign_extend(instr, 6)))?;
        self.reg.set(dr, val);
        self.reg.update_flags(dr);
        Ok(())
    }

    fn lea(&mut self, instr: u16) {
        let dr = decode::dr(instr);
        let val = self.pc_offset(instr, 9);
        self.reg.set(dr, val);
        self.reg.update_flags(dr);
    }

    fn st(&mut self, instr: u16) {
        let val = self.reg.get(decode::dr(instr));
        let addr = self.pc_offset(instr, 9);
        self.mem.write(addr, val);
    }

    fn sti(&mut self, instr: u16) -> Result<(), RuntimeError> {
        let val = self.reg.get(decode::dr(instr));
        let ptr = self.mem_read(self.pc_offset(instr, 9))?;
        self.mem.write(ptr, val);
        Ok(())
    }

    fn str(&mut self, instr: u16) {
        let val = self.reg.get(decode::dr(instr));
        let base = self.reg.get(decode::sr1(instr));
        self.mem.write(base.wrapping_add(sign_extend(instr, 6)), val);
    }
}
