use std::{
    ops::Sub,
    fmt::{self, Debug, Display},
};

use derive_more::{From, Into};


/// This represents a byte on the cartridge bus.
#[derive(Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct Byte(u8);

impl Byte {
    pub const fn new(val: u8) -> Self {
        Byte(val)
    }

    pub const fn zero() -> Self {
        Self::new(0)
    }

    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Returns the lower four bits.
    pub fn low_nibble(&self) -> u8 {
        self.0 & 0x0F
    }
}

impl Debug for Byte {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl Display for Byte {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl PartialEq<u8> for Byte {
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}


/// This represents a 16 bit address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct Word(u16);

impl Word {
    pub const fn new(val: u16) -> Self {
        Word(val)
    }

    pub const fn get(&self) -> u16 {
        self.0
    }
}

impl Sub<u16> for Word {
    type Output = usize;

    /// Returns the distance to a window base as an index into a bank.
    fn sub(self, rhs: u16) -> Self::Output {
        self.0.wrapping_sub(rhs) as usize
    }
}

impl Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(self, f)
    }
}
