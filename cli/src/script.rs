//! Parsing and executing bus commands.

use std::io::{self, Write};

use failure::{Error, bail, format_err};

use cartbank::{
    log::*,
    mbc::BankController,
    primitives::{Byte, Word},
};


/// One access to the cartridge bus (or to the controller itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Read(Word),
    Write(Word, Byte),
    Dump { start: Word, len: u16 },
    Power,
    State,
}

/// We play the role of the bus dispatcher, so we have to make sure that only
/// cartridge addresses reach the controller.
fn is_cartridge_addr(addr: u16) -> bool {
    match addr {
        0x0000..=0x7FFF | 0xA000..=0xBFFF => true,
        _ => false,
    }
}

fn parse_addr(src: &str) -> Result<Word, Error> {
    let addr = u16::from_str_radix(src, 16)
        .map_err(|e| format_err!("invalid address '{}': {}", src, e))?;
    if !is_cartridge_addr(addr) {
        bail!("address {} is not a cartridge address", Word::new(addr));
    }

    Ok(Word::new(addr))
}

fn parse_byte(src: &str) -> Result<Byte, Error> {
    u8::from_str_radix(src, 16)
        .map(Byte::new)
        .map_err(|e| format_err!("invalid byte '{}': {}", src, e))
}

impl Command {
    /// Parses one line. Returns `None` for empty lines and comments.
    pub(crate) fn parse(line: &str) -> Result<Option<Self>, Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let parts: Vec<_> = line.split_whitespace().collect();
        let cmd = match parts.as_slice() {
            ["r", addr] => Command::Read(parse_addr(addr)?),
            ["w", addr, value] => Command::Write(parse_addr(addr)?, parse_byte(value)?),
            ["dump", addr, len] => {
                let start = parse_addr(addr)?;
                let len = u16::from_str_radix(len, 16)
                    .map_err(|e| format_err!("invalid length '{}': {}", len, e))?;

                // Every address of the range has to be valid.
                if len > 0 {
                    let last = start.get() as u32 + len as u32 - 1;
                    if last > 0xFFFF || !(start.get()..=last as u16).all(is_cartridge_addr) {
                        bail!("range {} + 0x{:x} leaves the cartridge windows", start, len);
                    }
                }

                Command::Dump { start, len }
            }
            ["power"] => Command::Power,
            ["state"] => Command::State,
            _ => bail!("invalid command '{}'", line),
        };

        Ok(Some(cmd))
    }
}

/// Parses a whole script. Errors mention the line number.
pub(crate) fn parse_script(src: &str) -> Result<Vec<Command>, Error> {
    let mut out = Vec::new();
    for (i, line) in src.lines().enumerate() {
        let cmd = Command::parse(line)
            .map_err(|e| format_err!("line {}: {}", i + 1, e))?;
        out.extend(cmd);
    }

    Ok(out)
}

/// Runs a single command against the controller and prints the result.
pub(crate) fn execute(
    cmd: &Command,
    mbc: &mut BankController,
    out: &mut impl Write,
) -> io::Result<()> {
    trace!("[cli] executing {:?}", cmd);

    match *cmd {
        Command::Read(addr) => writeln!(out, "[{}] -> {}", addr, mbc.read(addr)),
        Command::Write(addr, byte) => {
            mbc.write(addr, byte);
            writeln!(out, "[{}] <- {}", addr, byte)
        }
        Command::Dump { start, len } => {
            let addrs: Vec<_> = (0..len).map(|i| start.get() + i).collect();
            for line in addrs.chunks(16) {
                write!(out, "{:04x}:", line[0])?;
                for &addr in line {
                    write!(out, " {:02x}", mbc.read(Word::new(addr)).get())?;
                }
                writeln!(out)?;
            }
            Ok(())
        }
        Command::Power => {
            mbc.power();
            writeln!(out, "power cycle")
        }
        Command::State => {
            let state = mbc.state();
            let ram_bank = match mbc.ram_bank() {
                Some(bank) => bank.to_string(),
                None => "-".into(),
            };
            writeln!(
                out,
                "ram_enabled={} rom_select={} ram_select={} rom_bank={} ram_bank={}",
                state.ram_enabled(),
                Byte::new(state.rom_select()),
                Byte::new(state.ram_select()),
                mbc.rom_bank(),
                ram_bank,
            )
        }
    }
}
