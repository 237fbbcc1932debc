//! Backing storage for cartridge ROM and RAM.
//!
//! Both images are organized as equally sized banks. The images are owned by
//! the session (usually a [`Cartridge`](crate::cartridge::Cartridge)); the
//! bank controller only borrows them.

use std::fmt;

use derive_more::Display;

use crate::primitives::Byte;


/// Size of one ROM bank: 16 KiB.
pub const ROM_BANK_SIZE: usize = 0x4000;

/// Size of one RAM bank: 8 KiB.
pub const RAM_BANK_SIZE: usize = 0x2000;

/// Number of (possibly partial) banks of `bank_size` bytes needed for `len`
/// bytes. A `bank_size` of 0 is treated like 1.
pub fn bank_count(len: usize, bank_size: usize) -> usize {
    let bank_size = bank_size.max(1);
    (len + bank_size - 1) / bank_size
}

/// Problems with raw image data handed to [`RomImage::new`].
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ImageError {
    #[display(fmt = "bank size must not be 0")]
    ZeroBankSize,

    #[display(fmt = "ROM image is empty")]
    EmptyRom,

    #[display(
        fmt = "ROM image length {} is not a multiple of the bank size {}",
        len,
        bank_size
    )]
    PartialRomBank { len: usize, bank_size: usize },
}

impl std::error::Error for ImageError {}


/// Read-only cartridge ROM. Its length is always a non-zero multiple of the
/// bank size, so bank 0 always exists.
#[derive(Clone)]
pub struct RomImage {
    data: Box<[Byte]>,
    bank_size: usize,
}

impl RomImage {
    pub fn new(data: &[u8], bank_size: usize) -> Result<Self, ImageError> {
        if bank_size == 0 {
            return Err(ImageError::ZeroBankSize);
        }
        if data.is_empty() {
            return Err(ImageError::EmptyRom);
        }
        if data.len() % bank_size != 0 {
            return Err(ImageError::PartialRomBank { len: data.len(), bank_size });
        }

        let data: Vec<_> = data.iter().cloned().map(Byte::new).collect();
        Ok(Self {
            data: data.into_boxed_slice(),
            bank_size,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn bank_size(&self) -> usize {
        self.bank_size
    }

    /// Number of physical banks. Never 0.
    pub fn bank_count(&self) -> usize {
        self.data.len() / self.bank_size
    }

    /// Returns the byte at `offset` relative to the start of `bank`. The bank
    /// index is reduced modulo the number of banks. An offset larger than the
    /// bank size continues into the following banks, wrapping at the end of
    /// the image.
    pub fn get(&self, bank: usize, offset: usize) -> Byte {
        self.get_banked(self.bank_size, bank, offset)
    }

    /// Like [`get`](Self::get), but splits the image into banks of
    /// `bank_size` bytes instead of the size it was loaded with.
    pub fn get_banked(&self, bank_size: usize, bank: usize, offset: usize) -> Byte {
        let bank_size = bank_size.max(1);
        let start = (bank % bank_count(self.data.len(), bank_size)) * bank_size;
        self.data[(start + offset) % self.data.len()]
    }
}

// Manual implementation to omit printing the full memory.
impl fmt::Debug for RomImage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RomImage")
            .field("len", &self.len())
            .field("bank_size", &self.bank_size)
            .field("bank_count", &self.bank_count())
            .finish()
    }
}


/// Cartridge RAM (often battery-backed).
///
/// The length doesn't need to be a multiple of the bank size: some carts only
/// have 2 KiB, in which case only the first part of the single bank exists.
/// A zero-length image has no banks at all and behaves like absent RAM.
#[derive(Clone)]
pub struct RamImage {
    data: Box<[Byte]>,
    bank_size: usize,
}

impl RamImage {
    /// Creates a zeroed RAM of `len` bytes. A `bank_size` of 0 is treated
    /// like [`RAM_BANK_SIZE`].
    pub fn zeroed(len: usize, bank_size: usize) -> Self {
        let bank_size = if bank_size == 0 { RAM_BANK_SIZE } else { bank_size };
        Self {
            data: vec![Byte::zero(); len].into_boxed_slice(),
            bank_size,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bank_size(&self) -> usize {
        self.bank_size
    }

    /// Number of (possibly partial) banks.
    pub fn bank_count(&self) -> usize {
        bank_count(self.data.len(), self.bank_size)
    }

    /// Returns the byte at `offset` inside `bank` (modulo the bank count) or
    /// `None` if that location doesn't physically exist.
    pub fn get(&self, bank: usize, offset: usize) -> Option<Byte> {
        self.get_banked(self.bank_size, bank, offset)
    }

    /// Like [`get`](Self::get), but with banks of `bank_size` bytes.
    pub fn get_banked(&self, bank_size: usize, bank: usize, offset: usize) -> Option<Byte> {
        let idx = self.index(bank_size, bank, offset)?;
        Some(self.data[idx])
    }

    /// Stores `byte` at `offset` inside `bank` (modulo the bank count).
    /// Returns `false` if the location doesn't physically exist.
    pub fn set(&mut self, bank: usize, offset: usize, byte: Byte) -> bool {
        self.set_banked(self.bank_size, bank, offset, byte)
    }

    /// Like [`set`](Self::set), but with banks of `bank_size` bytes.
    pub fn set_banked(&mut self, bank_size: usize, bank: usize, offset: usize, byte: Byte) -> bool {
        match self.index(bank_size, bank, offset) {
            Some(idx) => {
                self.data[idx] = byte;
                true
            }
            None => false,
        }
    }

    fn index(&self, bank_size: usize, bank: usize, offset: usize) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        let bank_size = bank_size.max(1);
        let idx = (bank % bank_count(self.data.len(), bank_size)) * bank_size + offset;
        if idx < self.data.len() {
            Some(idx)
        } else {
            None
        }
    }

    /// Replaces the contents with previously persisted data. Excess input is
    /// ignored, missing bytes are zeroed. Returns the number of bytes copied.
    pub fn load(&mut self, bytes: &[u8]) -> usize {
        let copied = bytes.len().min(self.data.len());
        for (dst, &src) in self.data.iter_mut().zip(bytes) {
            *dst = Byte::new(src);
        }
        for dst in &mut self.data[copied..] {
            *dst = Byte::zero();
        }
        copied
    }

    /// Returns the raw contents, e.g. for writing a save file.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.data.iter().map(|b| b.get()).collect()
    }
}

// Manual implementation to omit printing the full memory.
impl fmt::Debug for RamImage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RamImage")
            .field("len", &self.len())
            .field("bank_size", &self.bank_size)
            .field("bank_count", &self.bank_count())
            .finish()
    }
}
