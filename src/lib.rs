//! Retro Disassembler - disassembly engine for classic 8/16-bit microprocessors
//!
//! This crate disassembles raw binary images for six processor families
//! into traditional assembler-source listings: MCS6502, MC6801/HD63701,
//! MC6805, MC6809, Z80, and MC68000.
//!
//! # Pipeline
//!
//! Disassembly runs in three sequential passes over a shared
//! [`attr::AttributeMap`]:
//!
//! 1. [`hints::HintStore::load`] parses a `-t` label/annotation file and
//!    pins whatever classifications and labels it names; hints always win.
//! 2. [`discovery::run`] sweeps straight-line code outward from the
//!    seeded entry points, classifying bytes as [`attr::ByteClass::Code`]
//!    until it meets a terminator, a hinted byte, or the end of the image.
//! 3. [`emitter::run`] walks the address space once more, low to high,
//!    rendering one assembly record per run of same-classified bytes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use retro_disasm::{disassemble, DisassembleOptions};
//! use retro_disasm::isa::IsaKind;
//!
//! fn main() -> retro_disasm::Result<()> {
//!     let data = std::fs::read("game.bin")?;
//!     let options = DisassembleOptions::new(IsaKind::Mcs6502);
//!     let listing = disassemble(&data, "game.bin", &options)?;
//!     print!("{listing}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]

pub mod attr;
pub mod decoder;
pub mod discovery;
pub mod emitter;
pub mod error;
pub mod hints;
pub mod image;
pub mod isa;

pub use error::{DisasmError, Result};

use attr::AttributeMap;
use hints::HintStore;
use image::Image;
use isa::IsaKind;

/// Options controlling a single disassembly run, mirroring the CLI's
/// flag set.
#[derive(Debug, Clone)]
pub struct DisassembleOptions {
    /// Target instruction set.
    pub isa: IsaKind,
    /// Base address the input is loaded at (`-s`).
    pub start: usize,
    /// Extra entry points beyond whatever the hint file or architecture
    /// default seeds (`-e`, repeatable).
    pub entries: Vec<usize>,
    /// Disable the absolute-terminator stop during discovery (`-f`).
    pub force: bool,
    /// Prefix every line with an address and raw-byte column (`-l`).
    pub listing: bool,
    /// Contents of a `-t` hint file, if any.
    pub hint_text: String,
}

impl DisassembleOptions {
    /// Default options for `isa`: load at address 0, no extra entries, no
    /// forcing, no listing columns, no hints.
    pub fn new(isa: IsaKind) -> Self {
        DisassembleOptions {
            isa,
            start: 0,
            entries: Vec::new(),
            force: false,
            listing: false,
            hint_text: String::new(),
        }
    }
}

/// Run the full hint/discovery/emit pipeline over `data` and return the
/// rendered listing text.
pub fn disassemble(data: &[u8], input_name: &str, options: &DisassembleOptions) -> Result<String> {
    let capacity = options.isa.address_space();
    let mut image = Image::new(capacity);
    image.load(options.start, data)?;

    let mut attr = AttributeMap::new(capacity);
    let hints = HintStore::load(&options.hint_text, &image, &mut attr, options.isa.pointer_format())?;

    discovery::seed_entries(&image, &mut attr, options.isa, &options.entries, hints.entry_seeded);
    discovery::run(&mut image, &mut attr, options.isa, options.force);

    Ok(emitter::run(&mut image, &mut attr, &hints, options.isa, options.listing, input_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembles_a_trivial_z80_self_jump() {
        let options = DisassembleOptions::new(IsaKind::Z80);
        let out = disassemble(&[0xc3, 0x00, 0x00], "test.bin", &options).unwrap();
        assert!(out.contains("jp"));
    }

    #[test]
    fn empty_input_still_produces_a_valid_listing() {
        let options = DisassembleOptions::new(IsaKind::Mcs6502);
        let out = disassemble(&[], "empty.bin", &options).unwrap();
        assert!(out.trim_end().ends_with("end"));
    }

    #[test]
    fn start_out_of_range_is_an_error() {
        let mut options = DisassembleOptions::new(IsaKind::Mcs6502);
        options.start = 0x20000;
        let result = disassemble(&[1, 2, 3], "test.bin", &options);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_hint_file_is_an_error() {
        let mut options = DisassembleOptions::new(IsaKind::Mcs6502);
        options.hint_text = "c zz\n".to_string();
        let result = disassemble(&[0xea], "test.bin", &options);
        assert!(result.is_err());
    }
}
