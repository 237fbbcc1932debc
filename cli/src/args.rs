use std::path::PathBuf;

use log::LevelFilter;
use structopt::StructOpt;


/// Loads a Game Boy cartridge and runs bus commands against its memory bank
/// controller.
///
/// Commands are read from `--script` first and then from every `-c` flag,
/// one command per line. Addresses and values are hexadecimal without a
/// leading `0x`:
///
///   r ADDR          read one byte
///   w ADDR VALUE    write one byte
///   dump ADDR LEN   print LEN bytes starting at ADDR
///   state           print the controller registers
///   power           reset the controller
///
/// Battery-backed RAM is loaded from the save file before the first command
/// and written back after the last one.
#[derive(Debug, StructOpt)]
pub(crate) struct Args {
    #[structopt(
        parse(from_os_str),
        help = "Path to the ROM that should be loaded.",
    )]
    pub(crate) path_to_rom: PathBuf,

    #[structopt(
        long = "save",
        parse(from_os_str),
        help = "Save file for battery-backed cartridge RAM. [default: the ROM path with the \
            extension '.sav']",
    )]
    pub(crate) save: Option<PathBuf>,

    #[structopt(
        long = "no-save",
        conflicts_with = "save",
        help = "Don't write the cartridge RAM back to the save file on exit. An existing save \
            file is still loaded.",
    )]
    pub(crate) no_save: bool,

    #[structopt(
        long = "info",
        help = "Print a summary of the cartridge header before running the commands.",
    )]
    pub(crate) info: bool,

    #[structopt(
        long = "script",
        parse(from_os_str),
        help = "File with one bus command per line. Empty lines and lines starting with '#' \
            are skipped.",
    )]
    pub(crate) script: Option<PathBuf>,

    #[structopt(
        long = "command",
        short = "c",
        number_of_values = 1,
        help = "Bus command that is executed after the script. Can be specified multiple \
            times. Example: `-c 'w 2000 02' -c 'r 4000'`.",
    )]
    pub(crate) commands: Vec<String>,

    #[structopt(
        long = "log-level",
        short = "l",
        default_value = "warn",
        parse(try_from_str = parse_log_level),
        help = "Specifies which log messages to display and which to supress. The specified \
            value will show all log messages with the same level or any higher level. So \
            `-l warn` will print errors and warnings and `-l debug` also shows bank \
            switches. Valid values: 'off', 'error', 'warn', 'info', 'debug' and 'trace'. \
            Note that `trace` messages are statically disabled in release builds.",
    )]
    pub(crate) log_level: LevelFilter,
}

impl Args {
    /// Path of the save file for battery-backed RAM.
    pub(crate) fn save_path(&self) -> PathBuf {
        match &self.save {
            Some(path) => path.clone(),
            None => self.path_to_rom.with_extension("sav"),
        }
    }
}

fn parse_log_level(src: &str) -> Result<LevelFilter, &'static str> {
    match src {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        _ => Err(
            "invalid log level (valid values: 'off', 'error', 'warn', 'info', 'debug' \
                and 'trace'"
        ),
    }
}
