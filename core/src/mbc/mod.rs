//! The memory bank controller and its chip configuration.
//!
//! Several historical mapper chips share the same register layout and only
//! differ in a handful of details: which value enables the RAM, whether ROM
//! bank 0 can be selected in the switchable window, how many bits the select
//! registers have and what the RAM select register is used for. Instead of
//! one type per chip, those details are collected in [`MbcConfig`] which is
//! passed to [`BankController::new`].

use crate::{
    image::{RAM_BANK_SIZE, ROM_BANK_SIZE},
    primitives::Byte,
};
pub use self::controller::{BankController, ControllerState};

mod controller;


/// Value returned when nothing drives the data lines.
pub const OPEN_BUS: Byte = Byte::new(0xFF);

/// How the RAM is gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamGate {
    /// RAM is enabled by writing a byte whose lower nibble equals the given
    /// value into the RAM-enable window. Every other value disables it.
    Nibble(u8),

    /// There is no enable register; RAM is always accessible (cartridges
    /// without an MBC).
    Always,
}

/// What the register at `0x4000..0x6000` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamSelectMode {
    /// The register selects the RAM bank.
    RamBank,

    /// The register supplies the high bits of the ROM bank number (placed
    /// right above the bits of the ROM select register). The RAM is fixed to
    /// bank 0 in this mode.
    RomHighBits,
}

/// Chip variant parameters. Fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbcConfig {
    /// Size of one ROM bank in bytes.
    pub rom_bank_size: usize,

    /// Size of one RAM bank in bytes.
    pub ram_bank_size: usize,

    pub ram_gate: RamGate,

    /// If `true`, writing 0 (after masking) to the ROM select register
    /// selects bank 1 instead.
    pub zero_remap: bool,

    /// Number of bits of the ROM select register (0 to 8).
    pub rom_select_bits: u32,

    /// Number of bits of the RAM select register (0 to 8).
    pub ram_select_bits: u32,

    pub ram_select_mode: RamSelectMode,

    /// Returned for reads of disabled or missing RAM.
    pub open_bus: Byte,
}

impl MbcConfig {
    /// Hudson's HuC1: 6 bit ROM select, 2 bit RAM select, bank 0 is remapped
    /// to bank 1.
    pub fn huc1() -> Self {
        Self {
            rom_bank_size: ROM_BANK_SIZE,
            ram_bank_size: RAM_BANK_SIZE,
            ram_gate: RamGate::Nibble(0x0A),
            zero_remap: true,
            rom_select_bits: 6,
            ram_select_bits: 2,
            ram_select_mode: RamSelectMode::RamBank,
            open_bus: OPEN_BUS,
        }
    }

    /// MBC1 in its default banking mode: the lower 5 bits of the ROM bank
    /// come from the ROM select register, bits 5 and 6 from the second
    /// register. Remapping only looks at the lower 5 bits, so banks 0x20,
    /// 0x40 and 0x60 cannot be selected.
    pub fn mbc1() -> Self {
        Self {
            rom_select_bits: 5,
            ram_select_bits: 2,
            ram_select_mode: RamSelectMode::RomHighBits,
            ..Self::huc1()
        }
    }

    /// MBC1 wired for RAM banking: the second register selects one of four
    /// RAM banks and only ROM banks 1 to 0x1F are reachable.
    pub fn mbc1_ram_banking() -> Self {
        Self {
            ram_select_mode: RamSelectMode::RamBank,
            ..Self::mbc1()
        }
    }

    /// MBC3 without the real time clock: 7 bit ROM select, 2 bit RAM select.
    pub fn mbc3() -> Self {
        Self {
            rom_select_bits: 7,
            ram_select_bits: 2,
            ..Self::huc1()
        }
    }

    /// MBC5 (only the lower 8 bits of the ROM bank). Bank 0 can be mapped
    /// into the switchable window.
    pub fn mbc5() -> Self {
        Self {
            zero_remap: false,
            rom_select_bits: 8,
            ram_select_bits: 4,
            ..Self::huc1()
        }
    }

    /// No MBC at all: a fixed 32 KiB ROM and at most one RAM bank that is
    /// always accessible.
    pub fn rom_only() -> Self {
        Self {
            ram_gate: RamGate::Always,
            zero_remap: true,
            rom_select_bits: 0,
            ram_select_bits: 0,
            ..Self::huc1()
        }
    }

    /// Number of ROM banks software can reach with this chip (at least the
    /// two banks of a cartridge without banking).
    pub fn max_rom_banks(&self) -> usize {
        let bits = match self.ram_select_mode {
            RamSelectMode::RamBank => self.rom_select_bits.min(8),
            RamSelectMode::RomHighBits => {
                self.rom_select_bits.min(8) + self.ram_select_bits.min(8)
            }
        };

        (1usize << bits).max(2)
    }

    /// Returns a copy with every field in its valid range: bit widths are
    /// capped at 8 (the registers are 8 bits wide) and a bank size of 0 is
    /// replaced by the default size.
    pub fn normalized(self) -> Self {
        Self {
            rom_bank_size: if self.rom_bank_size == 0 { ROM_BANK_SIZE } else { self.rom_bank_size },
            ram_bank_size: if self.ram_bank_size == 0 { RAM_BANK_SIZE } else { self.ram_bank_size },
            rom_select_bits: self.rom_select_bits.min(8),
            ram_select_bits: self.ram_select_bits.min(8),
            ..self
        }
    }

    pub(crate) fn rom_mask(&self) -> u8 {
        bit_mask(self.rom_select_bits)
    }

    pub(crate) fn ram_mask(&self) -> u8 {
        bit_mask(self.ram_select_bits)
    }
}

impl Default for MbcConfig {
    fn default() -> Self {
        Self::huc1()
    }
}

fn bit_mask(bits: u32) -> u8 {
    if bits >= 8 {
        0xFF
    } else {
        ((1u16 << bits) - 1) as u8
    }
}
