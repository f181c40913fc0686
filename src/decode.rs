use std::fmt;

/// Operation selected by bits 15-12 of an instruction word.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    BR,
    ADD,
    LD,
    ST,
    JSR,
    AND,
    LDR,
    STR,
    /// Unused, no supervisor mode
    RTI,
    NOT,
    LDI,
    STI,
    JMP,
    /// Reserved
    RES,
    LEA,
    TRAP,
}

impl Opcode {
    const TABLE: [Opcode; 16] = [
        Opcode::BR,   // 0x0
        Opcode::ADD,  // 0x1
        Opcode::LD,   // 0x2
        Opcode::ST,   // 0x3
        Opcode::JSR,  // 0x4
        Opcode::AND,  // 0x5
        Opcode::LDR,  // 0x6
        Opcode::STR,  // 0x7
        Opcode::RTI,  // 0x8
        Opcode::NOT,  // 0x9
        Opcode::LDI,  // 0xA
        Opcode::STI,  // 0xB
        Opcode::JMP,  // 0xC
        Opcode::RES,  // 0xD
        Opcode::LEA,  // 0xE
        Opcode::TRAP, // 0xF
    ];

    #[inline]
    pub fn decode(instr: u16) -> Self {
        Self::TABLE[(instr >> 12) as usize]
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Destination register, or source register of a store.
#[inline]
pub fn dr(instr: u16) -> u16 {
    (instr >> 9) & 0b111
}

/// First source register, or base register.
#[inline]
pub fn sr1(instr: u16) -> u16 {
    (instr >> 6) & 0b111
}

#[inline]
pub fn sr2(instr: u16) -> u16 {
    instr & 0b111
}

/// Bit 5 of `ADD`/`AND`.
#[inline]
pub fn is_imm(instr: u16) -> bool {
    instr & 0b10_0000 != 0
}

/// Bits 11-9 of `BR`.
#[inline]
pub fn nzp(instr: u16) -> u16 {
    (instr >> 9) & 0b111
}

#[inline]
pub fn trap_vect(instr: u16) -> u8 {
    (instr & 0xFF) as u8
}

/// Treat bit `bits - 1` as a sign bit and extend it over the rest of the word.
///
/// Higher bits of `val` are ignored, so a whole instruction word can be passed.
#[inline]
pub fn sign_extend(val: u16, bits: u32) -> u16 {
    debug_assert!(bits > 0 && bits < 16);
    // Sign bit
    let sign = val & (1u16 << (bits - 1));
    // Bits lower than sign bit
    let magnitude = val & ((1u16 << bits) - 1);
    // Positive input: all bits unset; 0x0000
    // Negative input: sign bit and above will be set, lower bits will be reset
    //      Eg. bits=14 -> 0xE000
    let sign_extension = (!sign).wrapping_add(1); // sign * -1
    magnitude | sign_extension
}
