//! Memory bank controller for Game Boy cartridges.
//!
//! The CPU can only see 32 KiB of cartridge ROM (`0x0000..0x8000`) and 8 KiB
//! of cartridge RAM (`0xA000..0xC000`). Larger images are split into banks
//! and a controller chip on the cartridge decides which bank is visible. This
//! crate emulates that chip:
//!
//! - [`mbc::BankController`] decodes all bus accesses to the cartridge,
//! - [`mbc::MbcConfig`] describes the differences between chip variants,
//! - [`image`] contains the ROM and RAM storage,
//! - [`cartridge::Cartridge`] parses the header and owns the images.
//!
//! ```
//! use cartbank::{
//!     image::{RomImage, ROM_BANK_SIZE},
//!     mbc::{BankController, MbcConfig},
//!     primitives::{Byte, Word},
//! };
//!
//! let mut data = vec![0; 4 * ROM_BANK_SIZE];
//! data[2 * ROM_BANK_SIZE] = 0x42;
//! let rom = RomImage::new(&data, ROM_BANK_SIZE).unwrap();
//!
//! let mut mbc = BankController::new(&rom, None, MbcConfig::huc1());
//! mbc.write(Word::new(0x2000), Byte::new(2));
//! assert_eq!(mbc.read(Word::new(0x4000)), Byte::new(0x42));
//! ```

pub mod cartridge;
pub mod image;
pub mod log;
pub mod mbc;
pub mod primitives;
