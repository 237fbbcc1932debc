//! Everything related to the cartridge and its header.
//!
//! A [`Cartridge`] is the emulation session's owner of ROM and RAM. It reads
//! the header, picks the matching [`MbcConfig`] and hands out a
//! [`BankController`] that borrows the images.

use std::{
    fmt,
    cmp::{PartialOrd, Ord, Ordering},
};

use derive_more::Display;

use crate::{
    log::*,
    image::{ImageError, RamImage, RomImage, ROM_BANK_SIZE},
    mbc::{BankController, MbcConfig},
};


/// Everything below this address belongs to the interrupt vectors and the
/// header, so shorter files can't be cartridges.
const HEADER_END: usize = 0x0150;

/// Errors when loading a cartridge from a ROM file.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LoadError {
    #[display(fmt = "file too short to contain a cartridge header ({} bytes)", _0)]
    MissingHeader(usize),

    #[display(fmt = "unknown cartridge type 0x{:02x}", _0)]
    UnknownType(u8),

    #[display(fmt = "cartridge type {:?} is not supported", _0)]
    UnsupportedType(CartridgeType),

    #[display(fmt = "invalid ROM size in cartridge header: 0x{:02x}", _0)]
    InvalidRomSize(u8),

    #[display(fmt = "invalid RAM size in cartridge header: 0x{:02x}", _0)]
    InvalidRamSize(u8),

    #[display(
        fmt = "length of cartridge ({} bytes) doesn't match ROM size in header ({} bytes)",
        actual,
        expected
    )]
    RomLengthMismatch { expected: usize, actual: usize },

    #[display(fmt = "invalid ROM image: {}", _0)]
    Image(ImageError),
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ImageError> for LoadError {
    fn from(e: ImageError) -> Self {
        LoadError::Image(e)
    }
}


/// Specifies how this ROM works with the CGB. Stored at `0x0143`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgbMode {
    /// Only CGB is supported. Value `0xC0`.
    CgbOnly,

    /// DMG and CGB are supported. Value `0x80` (and every other value with
    /// bit 7 set that isn't covered by `NonCgbSpecial`).
    BothSupported,

    /// CGB features are not supported, but the CGB uses a special non-CGB
    /// mode. Value: bit 7 and at least one of bit 2 or bit 3 is set.
    NonCgbSpecial,

    /// CGB features are not supported. Value: bit 7 is not set.
    NonCgb,
}

impl CgbMode {
    /// Parses the CGB mode from the given byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            // Bit 7 not set
            0x00..=0x7F => CgbMode::NonCgb,
            0xC0 => CgbMode::CgbOnly,
            0x80 => CgbMode::BothSupported,

            // Bit 7 and bit 2 or 3 set
            b if (b & 0b0000_1100) != 0 => CgbMode::NonCgbSpecial,
            _ => CgbMode::BothSupported,
        }
    }
}

/// The type of a cartridge. This defines whether a cartridge has a memory bank
/// controller, a battery, external ram or anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeType {
    RomOnly,
    Mbc1,
    Mbc1Ram,
    Mbc1RamBattery,
    Mbc2,
    Mbc2Battery,
    RomRam,
    RomRamBattery,
    Mmm01,
    Mmm01Ram,
    Mmm01RamBattery,
    Mbc3TimerBattery,
    Mbc3TimerRamBattery,
    Mbc3,
    Mbc3Ram,
    Mbc3RamBattery,
    Mbc5,
    Mbc5Ram,
    Mbc5RamBattery,
    Mbc5Rumble,
    Mbc5RumbleRam,
    Mbc5RumbleRamBattery,
    Mbc6,
    Mbc7SensorRumbleRamBattery,
    PocketCamera,
    BandaiTama5,
    HuC3,
    HuC1RamBattery,
}

impl CartridgeType {
    /// Parses the cartridge type from the given byte.
    pub fn from_byte(byte: u8) -> Result<Self, LoadError> {
        use self::CartridgeType::*;

        let ty = match byte {
            0x00 => RomOnly,
            0x01 => Mbc1,
            0x02 => Mbc1Ram,
            0x03 => Mbc1RamBattery,
            0x05 => Mbc2,
            0x06 => Mbc2Battery,
            0x08 => RomRam,
            0x09 => RomRamBattery,
            0x0B => Mmm01,
            0x0C => Mmm01Ram,
            0x0D => Mmm01RamBattery,
            0x0F => Mbc3TimerBattery,
            0x10 => Mbc3TimerRamBattery,
            0x11 => Mbc3,
            0x12 => Mbc3Ram,
            0x13 => Mbc3RamBattery,
            0x19 => Mbc5,
            0x1A => Mbc5Ram,
            0x1B => Mbc5RamBattery,
            0x1C => Mbc5Rumble,
            0x1D => Mbc5RumbleRam,
            0x1E => Mbc5RumbleRamBattery,
            0x20 => Mbc6,
            0x22 => Mbc7SensorRumbleRamBattery,
            0xFC => PocketCamera,
            0xFD => BandaiTama5,
            0xFE => HuC3,
            0xFF => HuC1RamBattery,
            _ => return Err(LoadError::UnknownType(byte)),
        };

        Ok(ty)
    }

    /// Returns the controller configuration for this cartridge type or `None`
    /// if the type needs a controller with a different register layout.
    pub fn mbc_config(&self) -> Option<MbcConfig> {
        use self::CartridgeType::*;

        match self {
            RomOnly | RomRam | RomRamBattery => Some(MbcConfig::rom_only()),
            Mbc1 | Mbc1Ram | Mbc1RamBattery => Some(MbcConfig::mbc1()),
            Mbc3TimerBattery | Mbc3TimerRamBattery | Mbc3 | Mbc3Ram | Mbc3RamBattery => {
                Some(MbcConfig::mbc3())
            }
            Mbc5 | Mbc5Ram | Mbc5RamBattery | Mbc5Rumble | Mbc5RumbleRam
            | Mbc5RumbleRamBattery => Some(MbcConfig::mbc5()),
            HuC1RamBattery => Some(MbcConfig::huc1()),

            Mbc2 | Mbc2Battery | Mmm01 | Mmm01Ram | Mmm01RamBattery | Mbc6
            | Mbc7SensorRumbleRamBattery | PocketCamera | BandaiTama5 | HuC3 => None,
        }
    }

    /// Whether the cartridge RAM keeps its contents when the power is off.
    pub fn has_battery(&self) -> bool {
        use self::CartridgeType::*;

        match self {
            Mbc1RamBattery | Mbc2Battery | RomRamBattery | Mmm01RamBattery
            | Mbc3TimerBattery | Mbc3TimerRamBattery | Mbc3RamBattery | Mbc5RamBattery
            | Mbc5RumbleRamBattery | Mbc7SensorRumbleRamBattery | HuC3 | HuC1RamBattery => true,
            _ => false,
        }
    }

    /// Whether the type says that there is cartridge RAM. The actual amount
    /// is stored in a separate header field.
    fn has_ram(&self) -> bool {
        use self::CartridgeType::*;

        match self {
            RomOnly | Mbc1 | Mbc2 | Mbc2Battery | Mmm01 | Mbc3TimerBattery | Mbc3 | Mbc5
            | Mbc5Rumble => false,
            _ => true,
        }
    }
}

/// Size of cartridge's ROM. Defined by the number of banks (each 16 KiB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomSize {
    NoBanking,
    Banks4,
    Banks8,
    Banks16,
    Banks32,
    Banks64,
    Banks128,
    Banks256,
    Banks512,
    Banks72,
    Banks80,
    Banks96,
}

impl RomSize {
    /// Parses the ROM size from the given byte.
    pub fn from_byte(byte: u8) -> Result<Self, LoadError> {
        let size = match byte {
            0x00 => RomSize::NoBanking,
            0x01 => RomSize::Banks4,
            0x02 => RomSize::Banks8,
            0x03 => RomSize::Banks16,
            0x04 => RomSize::Banks32,
            0x05 => RomSize::Banks64,
            0x06 => RomSize::Banks128,
            0x07 => RomSize::Banks256,
            0x08 => RomSize::Banks512,
            0x52 => RomSize::Banks72,
            0x53 => RomSize::Banks80,
            0x54 => RomSize::Banks96,
            _ => return Err(LoadError::InvalidRomSize(byte)),
        };

        Ok(size)
    }

    /// Returns the number of 16 KiB banks.
    pub fn bank_count(&self) -> usize {
        match self {
            RomSize::NoBanking => 2,
            RomSize::Banks4 => 4,
            RomSize::Banks8 => 8,
            RomSize::Banks16 => 16,
            RomSize::Banks32 => 32,
            RomSize::Banks64 => 64,
            RomSize::Banks128 => 128,
            RomSize::Banks256 => 256,
            RomSize::Banks512 => 512,
            RomSize::Banks72 => 72,
            RomSize::Banks80 => 80,
            RomSize::Banks96 => 96,
        }
    }

    /// Returns the number of bytes of the ROM.
    pub fn len(&self) -> usize {
        self.bank_count() * ROM_BANK_SIZE
    }
}

impl Ord for RomSize {
    fn cmp(&self, other: &RomSize) -> Ordering {
        self.len().cmp(&other.len())
    }
}

impl PartialOrd for RomSize {
    fn partial_cmp(&self, other: &RomSize) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Size of a cartridge's RAM. Specified in KiB. Each RAM bank can hold 8KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamSize {
    None,

    /// Only the first quarter of the RAM address space (0xA000 - 0xA7FF) is
    /// valid RAM.
    Kb2,

    /// One bank, full address space used.
    Kb8,

    /// 4 banks.
    Kb32,

    /// 16 banks.
    Kb128,

    /// 8 banks.
    Kb64,
}

impl RamSize {
    /// Parses the RAM size from the given byte.
    pub fn from_byte(byte: u8) -> Result<Self, LoadError> {
        let size = match byte {
            0x00 => RamSize::None,
            0x01 => RamSize::Kb2,
            0x02 => RamSize::Kb8,
            0x03 => RamSize::Kb32,
            0x04 => RamSize::Kb128,
            0x05 => RamSize::Kb64,
            _ => return Err(LoadError::InvalidRamSize(byte)),
        };

        Ok(size)
    }

    /// Returns the number of bytes of the RAM.
    pub fn len(&self) -> usize {
        match self {
            RamSize::None => 0,
            RamSize::Kb2 => 2 * 1024,
            RamSize::Kb8 => 8 * 1024,
            RamSize::Kb32 => 32 * 1024,
            RamSize::Kb128 => 128 * 1024,
            RamSize::Kb64 => 64 * 1024,
        }
    }
}

impl Ord for RamSize {
    fn cmp(&self, other: &RamSize) -> Ordering {
        self.len().cmp(&other.len())
    }
}

impl PartialOrd for RamSize {
    fn partial_cmp(&self, other: &RamSize) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A loaded cartridge.
///
/// This owns the ROM and RAM images and a number of fields for specific
/// header values. The RAM outlives every controller created with
/// [`controller`](Cartridge::controller), so it can be persisted afterwards.
pub struct Cartridge {
    title: String,
    cgb_mode: CgbMode,
    cartridge_type: CartridgeType,
    rom_size: RomSize,
    ram_size: RamSize,
    config: MbcConfig,
    rom: RomImage,
    ram: Option<RamImage>,
}

impl Cartridge {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() < HEADER_END {
            return Err(LoadError::MissingHeader(bytes.len()));
        }

        // Detect the name length by testing if the last 4 bytes contain a 0
        let man_code = &bytes[0x013F..=0x0142];
        let max_title_len = if man_code.iter().any(|b| *b == 0x00) {
            15
        } else {
            11
        };

        // Get title
        let title_len = bytes[0x0134..0x0134 + max_title_len]
            .iter()
            .position(|b| *b == 0x00)
            .unwrap_or(max_title_len);
        let title = String::from_utf8_lossy(&bytes[0x0134..0x0134 + title_len]);

        // Read a couple of one byte values
        let cgb_mode = CgbMode::from_byte(bytes[0x0143]);
        let cartridge_type = CartridgeType::from_byte(bytes[0x0147])?;
        let rom_size = RomSize::from_byte(bytes[0x0148])?;
        let ram_size = RamSize::from_byte(bytes[0x0149])?;
        info!("{:?}, {:?}, {:?}", cartridge_type, rom_size, ram_size);

        let config = cartridge_type.mbc_config()
            .ok_or(LoadError::UnsupportedType(cartridge_type))?;

        if rom_size.len() != bytes.len() {
            return Err(LoadError::RomLengthMismatch {
                expected: rom_size.len(),
                actual: bytes.len(),
            });
        }
        if rom_size.bank_count() > config.max_rom_banks() {
            warn!(
                "{:?} has more ROM banks than the controller can select ({:?})",
                cartridge_type,
                rom_size,
            );
        }
        match cartridge_type {
            CartridgeType::Mbc3TimerBattery | CartridgeType::Mbc3TimerRamBattery => {
                warn!("the real time clock of MBC3 cartridges is not emulated");
            }
            _ => {}
        }

        // Some cartridges declare RAM in the size field although their type
        // says otherwise. We trust the type.
        let ram = if cartridge_type.has_ram() && ram_size != RamSize::None {
            Some(RamImage::zeroed(ram_size.len(), config.ram_bank_size))
        } else {
            if ram_size != RamSize::None {
                warn!("{:?} has no RAM, ignoring RAM size {:?}", cartridge_type, ram_size);
            }
            None
        };

        let rom = RomImage::new(bytes, config.rom_bank_size)?;

        Ok(Self {
            title: title.into_owned(),
            cgb_mode,
            cartridge_type,
            rom_size,
            ram_size,
            config,
            rom,
            ram,
        })
    }

    /// Creates a bank controller in power-on state that works on this
    /// cartridge's ROM and RAM.
    pub fn controller(&mut self) -> BankController<'_> {
        BankController::new(&self.rom, self.ram.as_mut(), self.config)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn cgb_mode(&self) -> CgbMode {
        self.cgb_mode
    }

    pub fn cartridge_type(&self) -> CartridgeType {
        self.cartridge_type
    }

    pub fn rom_size(&self) -> RomSize {
        self.rom_size
    }

    pub fn ram_size(&self) -> RamSize {
        self.ram_size
    }

    pub fn config(&self) -> &MbcConfig {
        &self.config
    }

    /// Whether the RAM should be persisted between sessions.
    pub fn has_battery(&self) -> bool {
        self.ram.is_some() && self.cartridge_type.has_battery()
    }

    pub fn rom(&self) -> &RomImage {
        &self.rom
    }

    pub fn ram(&self) -> Option<&RamImage> {
        self.ram.as_ref()
    }

    /// Mutable access to the RAM, e.g. to load a save file before the
    /// emulation starts.
    pub fn ram_mut(&mut self) -> Option<&mut RamImage> {
        self.ram.as_mut()
    }
}

// Manual implementation to omit printing the full memory.
impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cartridge")
            .field("title", &self.title)
            .field("cgb_mode", &self.cgb_mode)
            .field("cartridge_type", &self.cartridge_type)
            .field("rom_size", &self.rom_size)
            .field("ram_size", &self.ram_size)
            .field("battery", &self.has_battery())
            .finish()
    }
}
