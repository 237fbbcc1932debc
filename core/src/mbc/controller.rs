use crate::{
    log::*,
    image::{self, RamImage, RomImage},
    primitives::{Byte, Word},
};
use super::{MbcConfig, RamGate, RamSelectMode};


/// The three MBC registers.
///
/// Values can only be created by a [`BankController`], so they are always
/// masked according to the controller's configuration. A copy can be taken
/// with [`BankController::state`] and put back with
/// [`BankController::restore`] (e.g. for save states).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    /// Written via `0x0000..0x2000`.
    ram_enabled: bool,

    /// Written via `0x2000..0x4000`. Already masked and remapped.
    rom_select: u8,

    /// Written via `0x4000..0x6000`. Already masked.
    ram_select: u8,
}

impl ControllerState {
    fn power_on(config: &MbcConfig) -> Self {
        Self {
            ram_enabled: config.ram_gate == RamGate::Always,
            rom_select: select_rom(config, 1),
            ram_select: 0,
        }
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    /// Value of the ROM select register.
    pub fn rom_select(&self) -> u8 {
        self.rom_select
    }

    /// Value of the RAM select register. Depending on the configuration this
    /// is either the RAM bank or the upper bits of the ROM bank.
    pub fn ram_select(&self) -> u8 {
        self.ram_select
    }
}

/// Applies mask and zero remapping to a value written to the ROM select
/// register.
fn select_rom(config: &MbcConfig, value: u8) -> u8 {
    let v = value & config.rom_mask();
    if v == 0 && config.zero_remap {
        1
    } else {
        v
    }
}


/// Memory bank controller.
///
/// Handles all CPU accesses to `0x0000..0x8000` (ROM and MBC registers) and
/// `0xA000..0xC000` (cartridge RAM). ROM and RAM are borrowed from the
/// session, which stays responsible for loading and persisting them.
///
/// The controller never reports errors: just like real hardware, invalid
/// bank numbers wrap around and accesses to disabled RAM read the open bus
/// value.
pub struct BankController<'a> {
    rom: &'a RomImage,
    ram: Option<&'a mut RamImage>,
    config: MbcConfig,
    state: ControllerState,
}

impl<'a> BankController<'a> {
    /// Creates a controller in its power-on state. A zero-length RAM is
    /// treated exactly like a missing one.
    ///
    /// The bank geometry is taken from `config`, not from the images. Fields
    /// of `config` outside their valid range are clamped (see
    /// [`MbcConfig::normalized`]).
    pub fn new(rom: &'a RomImage, ram: Option<&'a mut RamImage>, config: MbcConfig) -> Self {
        let ram = ram.filter(|ram| !ram.is_empty());
        let config = config.normalized();

        debug!(
            "[mbc] new controller: {} ROM banks, {} RAM banks, {:?}",
            image::bank_count(rom.len(), config.rom_bank_size),
            ram.as_ref().map(|ram| image::bank_count(ram.len(), config.ram_bank_size)).unwrap_or(0),
            config,
        );

        Self {
            rom,
            ram,
            state: ControllerState::power_on(&config),
            config,
        }
    }

    /// Resets all registers to their power-on values. Afterwards, the RAM is
    /// disabled (unless the chip has no RAM gate at all).
    pub fn power(&mut self) {
        self.state = ControllerState::power_on(&self.config);
    }

    /// Loads one byte from the cartridge.
    pub fn read(&self, addr: Word) -> Byte {
        match addr.get() {
            // Always bank 0
            0x0000..0x4000 => self.rom.get_banked(self.config.rom_bank_size, 0, addr - 0x0000),

            // Switchable bank
            0x4000..0x8000 => {
                self.rom.get_banked(self.config.rom_bank_size, self.rom_bank(), addr - 0x4000)
            }

            0xA000..0xC000 => self.load_ram_byte(addr - 0xA000),

            _ => {
                self.foreign_access(addr);
                self.config.open_bus
            }
        }
    }

    /// Stores one byte to the cartridge. Writes into the ROM area go to the
    /// MBC registers.
    pub fn write(&mut self, addr: Word, byte: Byte) {
        match addr.get() {
            // RAM enable
            0x0000..0x2000 => match self.config.ram_gate {
                RamGate::Nibble(nibble) => {
                    let enabled = byte.low_nibble() == nibble & 0x0F;
                    if enabled != self.state.ram_enabled {
                        debug!(
                            "[mbc] RAM {} (wrote {} to {})",
                            if enabled { "enabled" } else { "disabled" },
                            byte,
                            addr,
                        );
                    }
                    self.state.ram_enabled = enabled;
                }
                RamGate::Always => trace!("[mbc] ignored RAM enable write {}", byte),
            },

            // ROM bank (lower bits)
            0x2000..0x4000 => {
                self.state.rom_select = select_rom(&self.config, byte.get());
                trace!("[mbc] ROM select {} -> bank {}", byte, self.rom_bank());
            }

            // RAM bank or upper ROM bits
            0x4000..0x6000 => {
                self.state.ram_select = byte.get() & self.config.ram_mask();
                trace!("[mbc] RAM select {} ({:?})", byte, self.config.ram_select_mode);
            }

            // No register here.
            0x6000..0x8000 => trace!("[mbc] ignored write {} to {}", byte, addr),

            0xA000..0xC000 => self.store_ram_byte(addr - 0xA000, byte),

            _ => self.foreign_access(addr),
        }
    }

    /// Returns a copy of the current register values.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Puts back registers previously obtained from [`state`](Self::state).
    /// The values are masked again, so a snapshot from a controller with a
    /// different configuration can't produce invalid register values.
    pub fn restore(&mut self, state: ControllerState) {
        self.state = ControllerState {
            ram_enabled: match self.config.ram_gate {
                RamGate::Nibble(_) => state.ram_enabled,
                RamGate::Always => true,
            },
            rom_select: select_rom(&self.config, state.rom_select),
            ram_select: state.ram_select & self.config.ram_mask(),
        };
    }

    pub fn config(&self) -> &MbcConfig {
        &self.config
    }

    /// Borrows the cartridge RAM, e.g. to take a snapshot between two bus
    /// cycles. Returns `None` if there is no RAM.
    pub fn ram(&self) -> Option<&RamImage> {
        self.ram.as_deref()
    }

    /// The physical ROM bank currently mapped to `0x4000..0x8000`.
    pub fn rom_bank(&self) -> usize {
        let bank = match self.config.ram_select_mode {
            RamSelectMode::RamBank => self.state.rom_select as usize,
            RamSelectMode::RomHighBits => {
                ((self.state.ram_select as usize) << self.config.rom_select_bits)
                    | self.state.rom_select as usize
            }
        };

        bank % image::bank_count(self.rom.len(), self.config.rom_bank_size)
    }

    /// The physical RAM bank currently mapped to `0xA000..0xC000` or `None` if
    /// there is no RAM.
    pub fn ram_bank(&self) -> Option<usize> {
        let ram = self.ram.as_ref()?;
        let bank = match self.config.ram_select_mode {
            RamSelectMode::RamBank => self.state.ram_select as usize,
            RamSelectMode::RomHighBits => 0,
        };

        Some(bank % image::bank_count(ram.len(), self.config.ram_bank_size))
    }

    fn load_ram_byte(&self, offset: usize) -> Byte {
        if !self.state.ram_enabled {
            return self.config.open_bus;
        }

        match (&self.ram, self.ram_bank()) {
            // Locations past the end of a partial bank aren't connected.
            (Some(ram), Some(bank)) => {
                ram.get_banked(self.config.ram_bank_size, bank, offset)
                    .unwrap_or(self.config.open_bus)
            }
            _ => self.config.open_bus,
        }
    }

    fn store_ram_byte(&mut self, offset: usize, byte: Byte) {
        if !self.state.ram_enabled {
            trace!("[mbc] write {} to disabled RAM discarded", byte);
            return;
        }

        let bank = match self.ram_bank() {
            Some(bank) => bank,
            None => return,
        };
        let bank_size = self.config.ram_bank_size;
        if let Some(ram) = &mut self.ram {
            if !ram.set_banked(bank_size, bank, offset, byte) {
                warn!(
                    "[mbc] write outside of valid RAM (bank {}, offset 0x{:04x})",
                    bank,
                    offset,
                );
            }
        }
    }

    /// The bus dispatcher routed an address here that doesn't belong to the
    /// cartridge.
    fn foreign_access(&self, addr: Word) {
        if cfg!(debug_assertions) {
            panic!("[mbc] address {} is not handled by the cartridge", addr);
        }

        warn!("[mbc] address {} is not handled by the cartridge, ignored", addr);
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::image::{RAM_BANK_SIZE, ROM_BANK_SIZE};

    /// Every byte in the image is unique enough to tell banks and offsets
    /// apart.
    fn pattern(idx: usize) -> u8 {
        ((idx / ROM_BANK_SIZE) as u8).wrapping_mul(31) ^ (idx as u8)
    }

    fn rom_data(banks: usize) -> Vec<u8> {
        (0..banks * ROM_BANK_SIZE).map(pattern).collect()
    }

    fn rom(banks: usize) -> RomImage {
        RomImage::new(&rom_data(banks), ROM_BANK_SIZE).unwrap()
    }

    fn w(mbc: &mut BankController, addr: u16, byte: u8) {
        mbc.write(Word::new(addr), Byte::new(byte));
    }

    fn r(mbc: &BankController, addr: u16) -> u8 {
        mbc.read(Word::new(addr)).get()
    }

    #[test]
    fn switch_rom_bank_with_remap() {
        let data = rom_data(4);
        let rom = rom(4);
        let mut mbc = BankController::new(&rom, None, MbcConfig::huc1());

        w(&mut mbc, 0x2000, 0x02);
        assert_eq!(r(&mbc, 0x4000), data[0x8000]);

        w(&mut mbc, 0x2000, 0x00);
        assert_eq!(r(&mbc, 0x4000), data[0x4000]);
        assert_eq!(mbc.rom_bank(), 1);
    }

    #[test]
    fn rom_select_wraps_around_bank_count() {
        let data = rom_data(4);
        let rom = rom(4);

        let mut mbc = BankController::new(&rom, None, MbcConfig::mbc5());
        for v in 0..=255u8 {
            w(&mut mbc, 0x2000, v);
            let bank = v as usize % 4;
            assert_eq!(mbc.rom_bank(), bank);
            assert_eq!(r(&mbc, 0x4000), data[bank * ROM_BANK_SIZE]);
            assert_eq!(r(&mbc, 0x7FFF), data[bank * ROM_BANK_SIZE + 0x3FFF]);
        }

        let mut mbc = BankController::new(&rom, None, MbcConfig::huc1());
        for v in 0..=255u8 {
            w(&mut mbc, 0x2000, v);
            let masked = (v & 0x3F) as usize;
            let bank = if masked == 0 { 1 } else { masked % 4 };
            assert_eq!(mbc.rom_bank(), bank, "value {:02x}", v);
            assert_eq!(r(&mbc, 0x4ABC), data[bank * ROM_BANK_SIZE + 0xABC]);
        }
    }

    #[test]
    fn zero_remap_disabled_maps_bank_zero_twice() {
        let data = rom_data(4);
        let rom = rom(4);
        let mut mbc = BankController::new(&rom, None, MbcConfig::mbc5());

        w(&mut mbc, 0x2000, 0x00);
        assert_eq!(mbc.rom_bank(), 0);
        assert_eq!(r(&mbc, 0x4123), data[0x0123]);
        assert_eq!(r(&mbc, 0x0123), data[0x0123]);
    }

    #[test]
    fn fixed_window_ignores_rom_select() {
        let data = rom_data(8);
        let rom = rom(8);
        let mut mbc = BankController::new(&rom, None, MbcConfig::huc1());

        for v in 0..8 {
            w(&mut mbc, 0x2000, v);
            for &addr in &[0x0000, 0x0100, 0x0147, 0x2FFF, 0x3FFF] {
                assert_eq!(r(&mbc, addr), data[addr as usize]);
            }
        }
    }

    #[test]
    fn ram_gate() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());

        assert_eq!(r(&mbc, 0xA000), 0xFF);

        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0xA010, 0x42);
        assert_eq!(r(&mbc, 0xA010), 0x42);

        w(&mut mbc, 0x0000, 0x00);
        assert_eq!(r(&mbc, 0xA010), 0xFF);

        // The data is still there.
        drop(mbc);
        assert_eq!(ram.get(0, 0x10), Some(Byte::new(0x42)));
    }

    #[test]
    fn only_low_nibble_enables_ram() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(RAM_BANK_SIZE, RAM_BANK_SIZE);
        ram.load(&[0x11; RAM_BANK_SIZE]);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());

        let writes = [0x0A, 0x1A, 0x0B, 0xFA, 0xA0, 0x00, 0x5A, 0x0F, 0xEA];
        for (i, &v) in writes.iter().enumerate() {
            // The whole window acts as the enable register.
            let addr = 0x0000 + (i as u16) * 0x0123;
            w(&mut mbc, addr, v);

            let expected = if v & 0x0F == 0x0A { 0x11 } else { 0xFF };
            assert_eq!(r(&mbc, 0xA000), expected, "after writing {:02x}", v);
            assert_eq!(mbc.state().ram_enabled(), v & 0x0F == 0x0A);
        }
    }

    #[test]
    fn disabled_ram_discards_writes() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());

        w(&mut mbc, 0xA000, 0x99);
        w(&mut mbc, 0x0000, 0x0A);
        assert_eq!(r(&mbc, 0xA000), 0x00);
    }

    #[test]
    fn ram_round_trip_in_every_bank() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(4 * RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());
        w(&mut mbc, 0x0000, 0x0A);

        for bank in 0..4u8 {
            w(&mut mbc, 0x4000, bank);
            w(&mut mbc, 0xA000, 0xB0 | bank);
            w(&mut mbc, 0xBFFF, 0xC0 | bank);
        }
        for bank in 0..4u8 {
            w(&mut mbc, 0x4000, bank);
            assert_eq!(mbc.ram_bank(), Some(bank as usize));
            assert_eq!(r(&mbc, 0xA000), 0xB0 | bank);
            assert_eq!(r(&mbc, 0xBFFF), 0xC0 | bank);
        }

        drop(mbc);
        assert_eq!(ram.get(2, 0), Some(Byte::new(0xB2)));
        assert_eq!(ram.get(3, 0x1FFF), Some(Byte::new(0xC3)));
    }

    #[test]
    fn ram_select_wraps_around_bank_count() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(2 * RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::mbc5());
        w(&mut mbc, 0x0000, 0x0A);

        w(&mut mbc, 0x4000, 0x01);
        w(&mut mbc, 0xA005, 0x55);

        // Bank 3 is bank 1 again, 0xF3 is masked to 3.
        w(&mut mbc, 0x4000, 0x03);
        assert_eq!(mbc.ram_bank(), Some(1));
        assert_eq!(r(&mbc, 0xA005), 0x55);
        w(&mut mbc, 0x4000, 0xF3);
        assert_eq!(mbc.state().ram_select(), 0x03);
        assert_eq!(r(&mbc, 0xA005), 0x55);
    }

    #[test]
    fn small_ram_reads_open_bus_past_the_end() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(2 * 1024, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());
        w(&mut mbc, 0x0000, 0x0A);

        w(&mut mbc, 0xA7FF, 0x12);
        w(&mut mbc, 0xA800, 0x34);
        assert_eq!(r(&mbc, 0xA7FF), 0x12);
        assert_eq!(r(&mbc, 0xA800), 0xFF);
    }

    #[test]
    fn missing_and_empty_ram() {
        let rom = rom(2);
        let mut mbc = BankController::new(&rom, None, MbcConfig::huc1());
        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0xA000, 0x12);
        assert_eq!(r(&mbc, 0xA000), 0xFF);
        assert_eq!(mbc.ram_bank(), None);
        assert!(mbc.ram().is_none());

        let mut ram = RamImage::zeroed(0, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());
        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0xA000, 0x12);
        assert_eq!(r(&mbc, 0xA000), 0xFF);
        assert!(mbc.ram().is_none());
    }

    #[test]
    fn custom_open_bus_and_enable_nibble() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(RAM_BANK_SIZE, RAM_BANK_SIZE);
        let config = MbcConfig {
            ram_gate: RamGate::Nibble(0x0F),
            open_bus: Byte::new(0x00),
            ..MbcConfig::huc1()
        };
        let mut mbc = BankController::new(&rom, Some(&mut ram), config);

        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0xA000, 0x77);
        assert_eq!(r(&mbc, 0xA000), 0x00);

        w(&mut mbc, 0x1FFF, 0x0F);
        w(&mut mbc, 0xA000, 0x77);
        assert_eq!(r(&mbc, 0xA000), 0x77);
    }

    #[test]
    fn rom_high_bits_mode() {
        let data = rom_data(64);
        let rom = rom(64);
        let mut ram = RamImage::zeroed(4 * RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::mbc1());

        w(&mut mbc, 0x2000, 0x01);
        w(&mut mbc, 0x4000, 0x01);
        assert_eq!(mbc.rom_bank(), 0x21);
        assert_eq!(r(&mbc, 0x4000), data[0x21 * ROM_BANK_SIZE]);

        // Only the lower five bits are remapped: 0x20 becomes 0x21.
        w(&mut mbc, 0x2000, 0x20);
        assert_eq!(mbc.state().rom_select(), 0x01);
        assert_eq!(mbc.rom_bank(), 0x21);

        // 0x41 wraps around the 64 banks.
        w(&mut mbc, 0x4000, 0x02);
        assert_eq!(mbc.rom_bank(), 0x01);

        // RAM stays at bank 0.
        assert_eq!(mbc.ram_bank(), Some(0));
        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0xA000, 0x66);
        drop(mbc);
        assert_eq!(ram.get(0, 0), Some(Byte::new(0x66)));
    }

    #[test]
    fn rom_only_ignores_registers() {
        let data = rom_data(2);
        let rom = rom(2);
        let mut ram = RamImage::zeroed(RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::rom_only());

        // RAM doesn't need to be enabled.
        w(&mut mbc, 0xA123, 0x31);
        assert_eq!(r(&mbc, 0xA123), 0x31);
        w(&mut mbc, 0x0000, 0x00);
        assert_eq!(r(&mbc, 0xA123), 0x31);

        for v in 0..=255u8 {
            w(&mut mbc, 0x2000, v);
            w(&mut mbc, 0x4000, v);
            assert_eq!(r(&mbc, 0x4000), data[0x4000]);
        }
    }

    #[test]
    fn registers_are_independent() {
        let rom = rom(4);
        let mut ram = RamImage::zeroed(4 * RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());

        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0x2000, 0x03);
        w(&mut mbc, 0x4000, 0x02);
        let before = mbc.state();

        w(&mut mbc, 0x6000, 0x01);
        w(&mut mbc, 0x7FFF, 0xFF);
        assert_eq!(mbc.state(), before);

        w(&mut mbc, 0x2000, 0x01);
        assert!(mbc.state().ram_enabled());
        assert_eq!(mbc.state().ram_select(), 0x02);

        w(&mut mbc, 0x0000, 0x00);
        assert_eq!(mbc.state().rom_select(), 0x01);
        assert_eq!(mbc.state().ram_select(), 0x02);
    }

    #[test]
    fn power_resets_registers() {
        let rom = rom(4);
        let mut ram = RamImage::zeroed(4 * RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());
        let initial = mbc.state();

        assert!(!initial.ram_enabled());
        assert_eq!(initial.rom_select(), 1);
        assert_eq!(initial.ram_select(), 0);

        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0x2000, 0x03);
        w(&mut mbc, 0x4000, 0x02);
        w(&mut mbc, 0xA000, 0x42);

        mbc.power();
        assert_eq!(mbc.state(), initial);
        assert_eq!(r(&mbc, 0xA000), 0xFF);

        mbc.power();
        mbc.power();
        assert_eq!(mbc.state(), initial);

        // RAM contents survive a reset.
        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0x4000, 0x02);
        assert_eq!(r(&mbc, 0xA000), 0x42);
    }

    #[test]
    fn power_on_bank_without_remap() {
        let rom = rom(4);
        let mbc = BankController::new(&rom, None, MbcConfig::mbc5());
        assert_eq!(mbc.rom_bank(), 1);
    }

    #[test]
    fn restore_state() {
        let rom = rom(4);
        let mut ram = RamImage::zeroed(4 * RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::mbc5());

        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0x2000, 0xF0);
        w(&mut mbc, 0x4000, 0x0C);
        let snapshot = mbc.state();

        mbc.power();
        mbc.restore(snapshot);
        assert_eq!(mbc.state(), snapshot);

        // Restoring into a narrower chip masks the registers again.
        let mut huc1 = BankController::new(&rom, None, MbcConfig::huc1());
        huc1.restore(snapshot);
        assert_eq!(huc1.state().rom_select(), 0x30);
        assert_eq!(huc1.state().ram_select(), 0x00);
        assert!(huc1.state().ram_enabled());
    }

    #[test]
    fn ram_snapshot_between_cycles() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(RAM_BANK_SIZE, RAM_BANK_SIZE);
        let mut mbc = BankController::new(&rom, Some(&mut ram), MbcConfig::huc1());

        w(&mut mbc, 0x0000, 0x0A);
        w(&mut mbc, 0xA001, 0xAB);
        let snapshot = mbc.ram().unwrap().as_bytes();
        assert_eq!(snapshot[1], 0xAB);
        assert_eq!(snapshot.len(), RAM_BANK_SIZE);
    }

    #[test]
    fn oversized_bit_widths_are_clamped() {
        let data = rom_data(4);
        let rom = rom(4);
        let config = MbcConfig {
            rom_select_bits: 64,
            ram_select_bits: 64,
            ram_select_mode: RamSelectMode::RomHighBits,
            ..MbcConfig::huc1()
        };
        let mut mbc = BankController::new(&rom, None, config);
        assert_eq!(mbc.config().rom_select_bits, 8);

        assert_eq!(r(&mbc, 0x4000), data[ROM_BANK_SIZE]);
        w(&mut mbc, 0x2000, 0xFF);
        w(&mut mbc, 0x4000, 0xFF);
        assert_eq!(mbc.state().rom_select(), 0xFF);
        assert_eq!(mbc.rom_bank(), 0xFFFF % 4);
        assert_eq!(r(&mbc, 0x4000), data[3 * ROM_BANK_SIZE]);
    }

    #[test]
    fn rom_bank_size_comes_from_config() {
        let mut data = vec![0; 2 * ROM_BANK_SIZE];
        data[0x2000] = 0x99;
        data[0x6000] = 0x77;
        let rom = RomImage::new(&data, ROM_BANK_SIZE).unwrap();
        let config = MbcConfig {
            rom_bank_size: 0x2000,
            ..MbcConfig::huc1()
        };
        let mut mbc = BankController::new(&rom, None, config);

        w(&mut mbc, 0x2000, 0x01);
        assert_eq!(r(&mbc, 0x4000), 0x99);
        w(&mut mbc, 0x2000, 0x03);
        assert_eq!(r(&mbc, 0x4000), 0x77);

        // Four banks of 8 KiB: bank 5 is bank 1.
        w(&mut mbc, 0x2000, 0x05);
        assert_eq!(mbc.rom_bank(), 1);
        assert_eq!(r(&mbc, 0x4000), 0x99);

        // The fixed window still starts at the beginning of the image.
        assert_eq!(r(&mbc, 0x2000), 0x99);
    }

    #[test]
    fn ram_bank_size_comes_from_config() {
        let rom = rom(2);
        let mut ram = RamImage::zeroed(2 * RAM_BANK_SIZE, RAM_BANK_SIZE);
        let config = MbcConfig {
            ram_bank_size: 0x1000,
            ..MbcConfig::mbc5()
        };
        let mut mbc = BankController::new(&rom, Some(&mut ram), config);
        w(&mut mbc, 0x0000, 0x0A);

        w(&mut mbc, 0x4000, 0x03);
        assert_eq!(mbc.ram_bank(), Some(3));
        w(&mut mbc, 0xA004, 0x44);

        // Offsets past the configured bank size continue into the next bank.
        w(&mut mbc, 0x4000, 0x02);
        assert_eq!(r(&mbc, 0xB004), 0x44);

        drop(mbc);
        assert_eq!(ram.get(1, 0x1004), Some(Byte::new(0x44)));
    }

    #[test]
    fn zero_bank_sizes_use_defaults() {
        let data = rom_data(4);
        let rom = rom(4);
        let config = MbcConfig {
            rom_bank_size: 0,
            ram_bank_size: 0,
            ..MbcConfig::huc1()
        };
        let mut mbc = BankController::new(&rom, None, config);
        assert_eq!(mbc.config().rom_bank_size, ROM_BANK_SIZE);

        w(&mut mbc, 0x2000, 0x02);
        assert_eq!(r(&mbc, 0x4000), data[2 * ROM_BANK_SIZE]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn foreign_address_fails_fast() {
        let rom = rom(2);
        let mbc = BankController::new(&rom, None, MbcConfig::huc1());
        mbc.read(Word::new(0xC000));
    }
}
