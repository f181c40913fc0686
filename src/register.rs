use std::cmp::Ordering;
use std::fmt;

/// Condition code, set using result from previous register write.
///
/// Discriminants match the `nzp` bits of a `BR` instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    N = 0b100,
    Z = 0b010,
    P = 0b001,
}

impl Flag {
    pub fn from_value(val: u16) -> Self {
        match (val as i16).cmp(&0) {
            Ordering::Less => Flag::N,
            Ordering::Equal => Flag::Z,
            Ordering::Greater => Flag::P,
        }
    }

    /// Whether any of the `nzp` bits select this flag.
    pub fn matches(self, nzp: u16) -> bool {
        self as u16 & nzp != 0
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03b}", *self as u8)
    }
}

/// General purpose registers, program counter and condition code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    /// 8x 16-bit registers
    reg: [u16; 8],
    /// Program counter
    pub pc: u16,
    /// Condition code
    pub flag: Flag,
}

impl Registers {
    pub fn new(pc: u16) -> Self {
        Self {
            reg: [0; 8],
            pc,
            flag: Flag::Z,
        }
    }

    /// Indexes with the low three bits of `reg`, so any decoded field is valid.
    #[inline]
    pub fn get(&self, reg: u16) -> u16 {
        self.reg[(reg & 0b111) as usize]
    }

    #[inline]
    pub fn set(&mut self, reg: u16, val: u16) {
        self.reg[(reg & 0b111) as usize] = val;
    }

    /// Recompute the condition code from the current value of `reg`.
    #[inline]
    pub fn update_flags(&mut self, reg: u16) {
        self.flag = Flag::from_value(self.get(reg));
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.reg.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_cover_every_value() {
        let mut regs = Registers::new(0x3000);
        for val in 0..=u16::MAX {
            regs.set(3, val);
            regs.update_flags(3);
            let expected = if val & 0x8000 != 0 {
                Flag::N
            } else if val == 0 {
                Flag::Z
            } else {
                Flag::P
            };
            assert_eq!(regs.flag, expected, "value 0x{val:04x}");
        }
    }

    #[test]
    fn flag_matches_nzp_bits() {
        assert!(Flag::N.matches(0b100));
        assert!(!Flag::N.matches(0b011));
        assert!(Flag::Z.matches(0b111));
        assert!(!Flag::P.matches(0b000));
    }

    #[test]
    fn register_index_is_masked() {
        let mut regs = Registers::new(0);
        regs.set(0b1010, 7);
        assert_eq!(regs.get(2), 7);
        assert_eq!(regs.flag, Flag::Z);
    }
}
