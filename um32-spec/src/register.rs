//! Register definitions for UM32

use crate::error::SpecError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of registers
pub const NUM_REGISTERS: usize = 8;

/// Register (r0-r7)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl Register {
    pub const ALL: [Register; NUM_REGISTERS] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Build a register from a 3-bit operand field (upper bits ignored)
    #[inline]
    pub const fn from_field(field: u32) -> Self {
        match field & 0x7 {
            0 => Register::R0,
            1 => Register::R1,
            2 => Register::R2,
            3 => Register::R3,
            4 => Register::R4,
            5 => Register::R5,
            6 => Register::R6,
            _ => Register::R7,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn field(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::R0 => "r0",
            Self::R1 => "r1",
            Self::R2 => "r2",
            Self::R3 => "r3",
            Self::R4 => "r4",
            Self::R5 => "r5",
            Self::R6 => "r6",
            Self::R7 => "r7",
        }
    }
}

impl TryFrom<usize> for Register {
    type Error = SpecError;

    fn try_from(index: usize) -> Result<Self, SpecError> {
        Register::from_index(index).ok_or(SpecError::InvalidRegister(index))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index() {
        assert_eq!(Register::from_index(0), Some(Register::R0));
        assert_eq!(Register::from_index(7), Some(Register::R7));
        assert_eq!(Register::from_index(8), None);
    }

    #[test]
    fn test_from_field_masks() {
        assert_eq!(Register::from_field(3), Register::R3);
        assert_eq!(Register::from_field(0b1011), Register::R3);
    }

    #[test]
    fn test_try_from() {
        assert_eq!(Register::try_from(4usize).unwrap(), Register::R4);
        assert!(matches!(Register::try_from(9usize), Err(SpecError::InvalidRegister(9))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Register::R5.to_string(), "r5");
    }
}
