//! Shared decoder context and the per-ISA decoder contract.
//!
//! Every opcode handler takes its cursor, output flags, and attribute
//! arrays through an explicit [`DecodeCtx`] passed by reference: no
//! decoder function reaches for ambient state.

pub mod mc6801;
pub mod mc6805;
pub mod mc6809;
pub mod mc68000;
pub mod mcs6502;
pub mod z80;

use crate::attr::AttributeMap;
use crate::image::Image;
use bitflags::bitflags;

bitflags! {
    /// Control-flow classification of a decoded instruction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlFlags: u8 {
        /// Absolute terminator: control never falls through (RTS, RTI,
        /// unconditional JMP/BRA, ...).
        const ABSOLUTE = 0b0000_0001;
        /// The instruction's operand names a branch/call target, not a
        /// data reference.
        const BRANCH = 0b0000_0010;
        /// 68000 only: a 32-bit immediate that, inside the loaded image,
        /// should seed a data label rather than render as a bare literal.
        const IMMEDIATE_ADDR = 0b0000_0100;
    }
}

/// The mutable state a decode step needs: the fetch cursor (via `image`),
/// the attribute map to record label side effects into, and the loaded
/// range against which operand addresses are checked.
pub struct DecodeCtx<'a> {
    pub image: &'a mut Image,
    pub attr: &'a mut AttributeMap,
    pub start: usize,
    pub end: usize,
}

impl<'a> DecodeCtx<'a> {
    pub fn new(image: &'a mut Image, attr: &'a mut AttributeMap, start: usize, end: usize) -> Self {
        DecodeCtx { image, attr, start, end }
    }

    /// Whether `addr` falls inside the loaded input range `[start, end)`.
    pub fn in_range(&self, addr: usize) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Record a branch/call target. Always marked, even outside the
    /// loaded range (a jump label is always set, regardless of range).
    pub fn mark_jump(&mut self, addr: usize) {
        self.attr.mark_jump_label(addr);
    }

    /// Record a data reference target, but only when it falls inside the
    /// loaded image.
    pub fn mark_data(&mut self, addr: usize) {
        if self.in_range(addr) {
            self.attr.mark_data_label(addr);
        }
    }

    /// Format a branch/call target: always marked and always rendered as
    /// a label, regardless of whether it falls inside the loaded range
    /// (matches the reference's unconditional jumpLabel marking).
    pub fn branch_operand(&mut self, addr: usize, digits: usize) -> String {
        self.mark_jump(addr);
        format!("L{addr:0digits$x}")
    }

    /// Format a data/memory-reference operand address. Marked and
    /// rendered as a label only when inside `[start, end)`; otherwise a
    /// plain hex literal, since no label will ever be emitted for it.
    pub fn data_operand(&mut self, addr: usize, digits: usize) -> String {
        self.mark_data(addr);
        if self.in_range(addr) {
            format!("L{addr:0digits$x}")
        } else {
            format!("${addr:0digits$x}")
        }
    }
}

/// A bare byte/word literal with no label side effect (zero-page
/// addresses, immediates): `$xx` / `$xxxx`.
pub fn hex_literal(value: usize, digits: usize) -> String {
    format!("${value:0digits$x}")
}

/// Substitute `{}` placeholders in `template`, left to right, with
/// `operands`. Templates may have zero, one, or two placeholders (the
/// 6801 HD63701 bit-memory opcodes take two).
pub fn render(template: &str, operands: &[String]) -> String {
    let mut out = String::new();
    let mut rest = template;
    for operand in operands {
        match rest.find("{}") {
            Some(idx) => {
                out.push_str(&rest[..idx]);
                out.push_str(operand);
                rest = &rest[idx + 2..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Result of a single decode step.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// Formatted instruction text, lower-cased mnemonic plus operands.
    /// Empty signals "undecodable": treat the consumed bytes as data.
    pub text: String,
    pub flags: ControlFlags,
}

impl Decoded {
    pub fn undecodable() -> Self {
        Decoded {
            text: String::new(),
            flags: ControlFlags::empty(),
        }
    }

    pub fn is_undecodable(&self) -> bool {
        self.text.is_empty()
    }

    pub fn new(text: impl Into<String>, flags: ControlFlags) -> Self {
        Decoded { text: text.into(), flags }
    }
}

/// A per-architecture instruction decoder.
///
/// `decode` seeks `ctx.image` to `base`, consumes 1 or more bytes, and
/// returns the decoded text and flags. The caller recovers the number of
/// bytes consumed as `ctx.image.tell() - base`, which holds even when
/// decoding fails partway through a multi-byte prefix (the bytes fetched
/// before giving up are still "consumed" for the fallback data directive).
pub trait InstructionDecoder {
    fn decode(ctx: &mut DecodeCtx, base: usize) -> Decoded;
}

/// Dispatch to the decoder for `isa`. The only place that needs to know
/// all six decoder types exist; everything else programs against
/// [`InstructionDecoder`].
pub fn decode_at(isa: crate::isa::IsaKind, ctx: &mut DecodeCtx, base: usize) -> Decoded {
    use crate::isa::IsaKind;
    match isa {
        IsaKind::Mcs6502 => mcs6502::Mcs6502::decode(ctx, base),
        IsaKind::Mc6801 => mc6801::Mc6801::decode(ctx, base),
        IsaKind::Mc6805 => mc6805::Mc6805::decode(ctx, base),
        IsaKind::Mc6809 => mc6809::Mc6809::decode(ctx, base),
        IsaKind::Z80 => z80::Z80::decode(ctx, base),
        IsaKind::Mc68000 => mc68000::Mc68000::decode(ctx, base),
    }
}
