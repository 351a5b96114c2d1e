mod logging;

use std::{fmt::Display, path::PathBuf, process::ExitCode};

use clap::Parser;
use crossterm::style::Stylize;
use lazy_static::lazy_static;
use rv32sim::{
    Emulator, EmulatorConfig, EmulatorError,
    config::arch_config::{RegisterNaming, WordType},
};

use crate::logging::LogLevel;

/// Flags that used to be spelled with a single dash (`-dump=out.txt`).
const LEGACY_LONG_FLAGS: [&str; 3] = ["dump", "from", "to"];

lazy_static! {
    static ref cli_args: Args = Args::parse_from(normalize_args(std::env::args()));
}

#[derive(Parser, Debug)]
#[command(version, about = "RV32IM instruction-level emulator", long_about = None)]
struct Args {
    /// Flat binary image, loaded at the start of RAM.
    image: PathBuf,

    /// Write a memory dump to this file after the run.
    #[arg(long)]
    dump: Option<PathBuf>,

    /// First dumped address.
    #[arg(long, value_parser = parse_hex, default_value = "0")]
    from: WordType,

    /// End of the dumped range, exclusive. Nothing is dumped unless it is above `from`.
    #[arg(long, value_parser = parse_hex, default_value = "0")]
    to: WordType,

    /// Stop on the first illegal instruction instead of trapping.
    #[arg(long, default_value_t = false)]
    abort_on_illegal: bool,

    /// Use ABI register names (`a0`, `sp`, ...) in traces.
    #[arg(long, default_value_t = false)]
    abi_names: bool,

    /// Switch log level.
    #[arg(value_enum, long = "loglevel", default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

fn parse_hex(s: &str) -> Result<WordType, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    WordType::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}

/// Rewrite `-dump=x` style flags to `--dump=x` so clap accepts both.
fn normalize_args(args: impl Iterator<Item = String>) -> Vec<String> {
    args.map(|arg| {
        let is_legacy = arg
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .and_then(|rest| rest.split('=').next())
            .is_some_and(|name| LEGACY_LONG_FLAGS.contains(&name));

        if is_legacy { format!("-{arg}") } else { arg }
    })
    .collect()
}

fn report(err: impl Display) -> ExitCode {
    eprintln!("{} {}", "error:".red().bold(), err);
    ExitCode::FAILURE
}

fn run() -> Result<WordType, EmulatorError> {
    let naming = if cli_args.abi_names {
        RegisterNaming::Abi
    } else {
        RegisterNaming::Numeric
    };
    let config = EmulatorConfig::new()
        .register_naming(naming)
        .abort_on_illegal(cli_args.abort_on_illegal);

    let mut emulator = Emulator::from_binary(&cli_args.image, config)?;
    let exit_code = emulator.run()?;

    if let Some(path) = &cli_args.dump {
        if cli_args.to > cli_args.from {
            emulator.dump_to_file(path, cli_args.from, cli_args.to)?;
        }
    }

    Ok(exit_code)
}

fn main() -> ExitCode {
    let _logger_handle = match logging::init(cli_args.log_level) {
        Ok(handle) => handle,
        Err(err) => return report(err),
    };

    match run() {
        Ok(exit_code) => ExitCode::from(exit_code as u8),
        Err(err) => report(err),
    }
}
