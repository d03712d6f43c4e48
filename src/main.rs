//! Retro Disassembler CLI
//!
//! Command-line front end for the disassembly engine: parses flags,
//! reads the input binary and optional hint file, and writes the
//! rendered listing to stdout or a file.

use clap::Parser;
use retro_disasm::isa::IsaKind;
use retro_disasm::{disassemble, DisassembleOptions};
use std::path::PathBuf;
use std::process::ExitCode;

/// Disassembler for classic 8/16-bit microprocessors.
#[derive(Parser, Debug)]
#[command(name = "retro-disasm")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input binary file.
    file: Option<PathBuf>,

    /// Target instruction set (mcs6502, mc6801, mc6805, mc6809, z80, mc68000).
    #[arg(long = "isa", default_value = "mcs6502")]
    isa: String,

    /// Add a code-entry seed. Repeatable.
    #[arg(short = 'e', value_parser = parse_address)]
    entries: Vec<usize>,

    /// Force mode: continue the code sweep past absolute terminators.
    #[arg(short = 'f')]
    force: bool,

    /// Listing mode: prefix each line with an address and raw-byte column.
    #[arg(short = 'l')]
    listing: bool,

    /// Output file (default stdout).
    #[arg(short = 'o')]
    output: Option<PathBuf>,

    /// Base address the input is loaded at.
    #[arg(short = 's', default_value = "0", value_parser = parse_address)]
    start: usize,

    /// Hint-file path.
    #[arg(short = 't')]
    hints: Option<PathBuf>,

    /// Verbose logging to stderr.
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Parse a CLI address argument: decimal, `0x` hex, or `0`-prefixed octal.
fn parse_address(text: &str) -> Result<usize, String> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        usize::from_str_radix(&text[1..], 8)
    } else {
        text.parse::<usize>()
    };
    parsed.map_err(|_| format!("invalid address {text:?}"))
}

fn main() -> ExitCode {
    use clap::CommandFactory;

    let args = match Args::try_parse() {
        Ok(args) => args,
        // clap already picks the right stream and the right exit code:
        // 0 for --help/--version, non-zero for an unknown option.
        Err(e) => e.exit(),
    };

    let Some(file) = args.file.as_ref() else {
        Args::command().print_help().ok();
        println!();
        return ExitCode::SUCCESS;
    };

    if args.verbose {
        tracing_subscriber::fmt().with_env_filter("retro_disasm=debug").init();
    }

    match run(&args, file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("retro-disasm: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, file: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let Some(isa) = IsaKind::parse(&args.isa) else {
        return Err(format!("unknown ISA {:?}", args.isa).into());
    };

    let data = std::fs::read(file)?;
    let hint_text = match &args.hints {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };

    let options = DisassembleOptions {
        isa,
        start: args.start,
        entries: args.entries.clone(),
        force: args.force,
        listing: args.listing,
        hint_text,
    };

    let listing = disassemble(&data, &file.display().to_string(), &options)?;

    match &args.output {
        Some(path) => std::fs::write(path, listing)?,
        None => print!("{listing}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_hex_and_octal_addresses() {
        assert_eq!(parse_address("1234").unwrap(), 1234);
        assert_eq!(parse_address("0x1f").unwrap(), 0x1f);
        assert_eq!(parse_address("010").unwrap(), 8);
        assert!(parse_address("nope").is_err());
    }

    #[test]
    fn args_parse_with_only_a_file() {
        let args = Args::try_parse_from(["retro-disasm", "test.bin"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("test.bin")));
        assert!(!args.force);
        assert!(!args.listing);
    }

    #[test]
    fn repeated_entry_flags_accumulate() {
        let args = Args::try_parse_from(["retro-disasm", "-e", "0x100", "-e", "200", "test.bin"]).unwrap();
        assert_eq!(args.entries, vec![0x100, 200]);
    }

    #[test]
    fn missing_file_argument_is_not_a_parse_error() {
        let result = Args::try_parse_from(["retro-disasm"]);
        assert!(result.is_ok());
        assert!(result.unwrap().file.is_none());
    }

    #[test]
    fn run_reads_input_and_writes_listing_to_an_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.bin");
        let output_path = dir.path().join("out.asm");
        std::fs::write(&input_path, [0xea, 0x60]).unwrap();

        let args = Args::try_parse_from([
            "retro-disasm",
            "-o",
            output_path.to_str().unwrap(),
            input_path.to_str().unwrap(),
        ])
        .unwrap();
        run(&args, &input_path).unwrap();

        let listing = std::fs::read_to_string(&output_path).unwrap();
        assert!(listing.contains("nop"));
        assert!(listing.contains("rts"));
    }

    #[test]
    fn run_rejects_an_unknown_isa() {
        let mut args = Args::try_parse_from(["retro-disasm", "test.bin"]).unwrap();
        args.isa = "vax".to_string();
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("in.bin");
        std::fs::write(&input_path, [0x00]).unwrap();
        assert!(run(&args, &input_path).is_err());
    }
}
