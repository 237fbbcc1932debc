//! Everything around the cartridge that isn't bus traffic: the save file
//! for battery-backed RAM and the header summary printed with `--info`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use failure::{Error, ResultExt};

use cartbank::{
    cartridge::{Cartridge, CgbMode},
    log::*,
};
use crate::args::Args;


/// The file battery-backed RAM is restored from and persisted to.
#[derive(Debug, Clone)]
pub(crate) struct SaveFile {
    path: PathBuf,

    /// `false` with `--no-save`: the file is still read, but never written.
    write_back: bool,
}

impl SaveFile {
    pub(crate) fn new(path: PathBuf, write_back: bool) -> Self {
        Self { path, write_back }
    }

    pub(crate) fn from_args(args: &Args) -> Self {
        Self::new(args.save_path(), !args.no_save)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Copies the contents of an existing save file into the cartridge RAM.
    ///
    /// Returns `false` if nothing was loaded: the cartridge has no battery
    /// or there is no save file yet. A file with the wrong length is loaded
    /// anyway (truncated or zero-padded) with a warning.
    pub(crate) fn load_into(&self, cartridge: &mut Cartridge) -> Result<bool, Error> {
        if !cartridge.has_battery() {
            return Ok(false);
        }

        if !self.path.exists() {
            info!("no save file at '{}', starting with empty RAM", self.path.display());
            return Ok(false);
        }

        let data = fs::read(&self.path)
            .with_context(|_| format!("failed to load save file '{}'", self.path.display()))?;

        match cartridge.ram_mut() {
            Some(ram) => {
                if data.len() != ram.len() {
                    warn!(
                        "save file '{}' has {} bytes, but the cartridge has {} bytes of RAM",
                        self.path.display(),
                        data.len(),
                        ram.len(),
                    );
                }
                ram.load(&data);
                info!("loaded save file '{}'", self.path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes the cartridge RAM to the save file. Returns whether the file
    /// was written.
    pub(crate) fn store(&self, cartridge: &Cartridge) -> Result<bool, Error> {
        if !self.write_back || !cartridge.has_battery() {
            return Ok(false);
        }

        match cartridge.ram() {
            Some(ram) => {
                fs::write(&self.path, ram.as_bytes()).with_context(|_| {
                    format!("failed to write save file '{}'", self.path.display())
                })?;
                info!("wrote save file '{}'", self.path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Human readable description of the cartridge header.
pub(crate) fn summary(cartridge: &Cartridge) -> String {
    let cgb = match cartridge.cgb_mode() {
        CgbMode::CgbOnly => "CGB only",
        CgbMode::BothSupported => "DMG and CGB",
        CgbMode::NonCgbSpecial => "DMG (special CGB mode)",
        CgbMode::NonCgb => "DMG only",
    };

    let rom = cartridge.rom_size();
    let ram = match cartridge.ram() {
        Some(ram) => format!(
            "{} KiB{}",
            ram.len() / 1024,
            if cartridge.has_battery() { ", battery" } else { "" },
        ),
        None => "none".to_string(),
    };

    format!(
        "title: {}\ntype:  {:?}\ncgb:   {}\nrom:   {} banks ({} KiB)\nram:   {}\n",
        cartridge.title(),
        cartridge.cartridge_type(),
        cgb,
        rom.bank_count(),
        rom.len() / 1024,
        ram,
    )
}
