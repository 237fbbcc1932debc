use std::{
    fs,
    io::{self, Write},
};

use failure::{Error, ResultExt};
use structopt::StructOpt;

use cartbank::{
    cartridge::Cartridge,
    log::*,
};
use crate::{
    args::Args,
    script::Command,
    session::SaveFile,
};


mod args;
mod script;
mod session;


fn main() {
    // We just catch potential errors here and pretty print them.
    if let Err(e) = run() {
        println!("ERROR: {}", e);

        for cause in e.iter_causes() {
            println!("  ... caused by: {}", cause);
        }

        std::process::exit(1);
    }
}

/// The actual main function.
fn run() -> Result<(), Error> {
    // Parse CLI arguments
    let args = Args::from_args();

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_module("cartbank", args.log_level);
    builder.init();

    // Prepare everything. Commands are parsed first so that a typo doesn't
    // touch the save file.
    let commands = load_commands(&args)?;
    let mut cartridge = load_cartridge(&args)?;
    let save = SaveFile::from_args(&args);
    if cartridge.has_battery() {
        debug!("battery-backed RAM, save file: '{}'", save.path().display());
    }
    save.load_into(&mut cartridge)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.info {
        out.write_all(session::summary(&cartridge).as_bytes())
            .context("failed to write output")?;
    }

    // The controller borrows the cartridge RAM until all commands ran.
    {
        let mut mbc = cartridge.controller();
        for cmd in &commands {
            script::execute(cmd, &mut mbc, &mut out).context("failed to write output")?;
        }
    }

    save.store(&cartridge)?;

    Ok(())
}

/// Collects the commands from the script file and the command line.
fn load_commands(args: &Args) -> Result<Vec<Command>, Error> {
    let mut commands = Vec::new();
    if let Some(path) = &args.script {
        let src = fs::read_to_string(path).context("failed to load script file")?;
        commands = script::parse_script(&src)
            .with_context(|_| format!("invalid script '{}'", path.display()))?;
    }

    for line in &args.commands {
        let cmd = Command::parse(line)
            .with_context(|_| format!("invalid command '{}'", line))?;
        commands.extend(cmd);
    }

    Ok(commands)
}

/// Loads the ROM and parses the cartridge header.
fn load_cartridge(args: &Args) -> Result<Cartridge, Error> {
    let rom = fs::read(&args.path_to_rom).context("failed to load ROM file")?;
    let cartridge = Cartridge::from_bytes(&rom).context("failed to load cartridge")?;
    info!("Loaded: {:#?}", cartridge);

    Ok(cartridge)
}
