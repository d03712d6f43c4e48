//! Recursive linear-sweep code discovery.
//!
//! Seeds a work set of jump-label addresses (from `-e`, hints, or the
//! architecture's default entry-point policy), then repeatedly sweeps
//! straight-line code from the smallest unresolved seed until a
//! terminator, a pre-classified byte, or the end of the image is hit.
//! Bytes discovered along the way that the decoder can't make sense of
//! are left `Unknown` rather than marked `Code`: an empty decode is a
//! hard terminator for the sweep, not a one-byte code record.

use crate::attr::{AttributeMap, ByteClass};
use crate::decoder::{decode_at, ControlFlags, DecodeCtx};
use crate::image::Image;
use crate::isa::IsaKind;
use tracing::{debug, trace};

fn read_u32_be(image: &Image, addr: usize) -> u32 {
    (image.peek8(addr) as u32) << 24
        | (image.peek8(addr + 1) as u32) << 16
        | (image.peek8(addr + 2) as u32) << 8
        | image.peek8(addr + 3) as u32
}

/// Seeds the reset stack pointer as a data label, the initial PC as a
/// jump label, and scans the rest of the exception-vector table for
/// plausible code addresses. Only applies when the image is loaded at
/// address 0 — a nonzero base means the loaded bytes aren't actually the
/// 68000's vector table.
fn seed_68000_reset_vectors(image: &Image, attr: &mut AttributeMap) {
    let start = image.start();
    let end = image.end();
    attr.mark_data_label(start);
    let reset = read_u32_be(image, 4) as usize;
    attr.mark_jump_label(reset);
    let scan_end = reset.min(0x400);
    let mut addr = 8;
    while addr < scan_end {
        let target = read_u32_be(image, addr) as usize;
        if target >= start && target % 2 == 0 && target < end {
            attr.mark_jump_label(target);
        }
        addr += 4;
    }
}

/// Seed jump-label entry points in priority order: `explicit_entries` is
/// the CLI `-e` list; `hint_seeded` reports whether any `c`/`t` hint in
/// the table file already seeded one (tracked by [`crate::hints::HintStore`]).
/// Only when neither fired does the architecture-specific default apply:
/// the 68000 reset-vector scan when loaded at address 0, otherwise
/// `jumpLabel[start]`.
pub fn seed_entries(
    image: &Image,
    attr: &mut AttributeMap,
    isa: IsaKind,
    explicit_entries: &[usize],
    hint_seeded: bool,
) {
    for &e in explicit_entries {
        attr.mark_jump_label(e);
    }
    if hint_seeded || !explicit_entries.is_empty() {
        return;
    }
    if isa == IsaKind::Mc68000 && image.start() == 0 {
        seed_68000_reset_vectors(image, attr);
    } else {
        attr.mark_jump_label(image.start());
    }
}

/// Run the discovery pass to a fixpoint over `(AttributeMap, jumpLabel)`.
///
/// `force` disables the absolute-terminator stop (`-f`), letting a sweep
/// run past RTS/JMP/etc. until it meets a pre-classified byte or `end`.
///
/// A seed whose very first instruction collides with an already-hinted
/// region is left `Unknown` rather than marked `Code`, so the sweep stops
/// short of the pre-classified region without overwriting it. Such a seed
/// is remembered as attempted so the outer loop doesn't repick it
/// forever: plain re-scanning for `jumpLabel ∧ Unknown` doesn't terminate
/// once a pick can fail without changing any classification.
pub fn run(image: &mut Image, attr: &mut AttributeMap, isa: IsaKind, force: bool) {
    let start = image.start();
    let end = image.end();
    let mut attempted: std::collections::HashSet<usize> = std::collections::HashSet::new();
    loop {
        let seed = (start..end)
            .find(|a| attr.is_jump_label(*a) && attr.class_at(*a) == ByteClass::Unknown && !attempted.contains(a));
        let Some(seed_addr) = seed else {
            break;
        };
        attempted.insert(seed_addr);
        debug!(address = format!("{seed_addr:#x}"), "discovery sweep start");
        let mut cursor = seed_addr;
        loop {
            let base = cursor;
            let decoded = {
                let mut ctx = DecodeCtx::new(image, attr, start, end);
                decode_at(isa, &mut ctx, base)
            };
            if decoded.is_undecodable() {
                trace!(address = format!("{base:#x}"), "undecodable byte, sweep terminates");
                break;
            }
            let consumed_end = image.tell();
            let blocked = (base..consumed_end).any(|a| attr.class_at(a) != ByteClass::Unknown);
            if blocked {
                trace!(
                    address = format!("{base:#x}"),
                    "decode collides with a pre-classified byte, sweep stops short"
                );
                break;
            }
            attr.set_range(base, consumed_end - base, ByteClass::Code);
            cursor = consumed_end;
            let absolute_stop = decoded.flags.contains(ControlFlags::ABSOLUTE) && !force;
            if absolute_stop || cursor >= end || attr.class_at(cursor) != ByteClass::Unknown {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(capacity: usize, start: usize, data: &[u8]) -> (Image, AttributeMap) {
        let mut image = Image::new(capacity);
        image.load(start, data).unwrap();
        let attr = AttributeMap::new(capacity);
        (image, attr)
    }

    #[test]
    fn z80_self_reference_terminates() {
        // JP $0000 at address 0: an unconditional jump back to itself.
        let (mut image, mut attr) = fresh(0x10000, 0, &[0xc3, 0x00, 0x00]);
        seed_entries(&image, &mut attr, IsaKind::Z80, &[], false);
        run(&mut image, &mut attr, IsaKind::Z80, false);
        assert_eq!(attr.class_at(0), ByteClass::Code);
        assert_eq!(attr.class_at(1), ByteClass::Code);
        assert_eq!(attr.class_at(2), ByteClass::Code);
        assert!(attr.is_jump_label(0));
    }

    #[test]
    fn hint_blocked_byte_stops_the_sweep_short() {
        // LDA #$05 ; RTS, but a `b 0001 1` hint pins address 1 as data,
        // so the sweep can only cover the first byte before it meets the
        // pre-classified region and stops without touching address 2.
        let (mut image, mut attr) = fresh(0x10000, 0, &[0xa9, 0x05, 0x60]);
        attr.set_hinted_range(1, 1, ByteClass::ByteData);
        seed_entries(&image, &mut attr, IsaKind::Mcs6502, &[], false);
        run(&mut image, &mut attr, IsaKind::Mcs6502, false);
        assert_eq!(attr.class_at(0), ByteClass::Unknown);
        assert_eq!(attr.class_at(1), ByteClass::ByteData);
        assert_eq!(attr.class_at(2), ByteClass::Unknown);
    }

    #[test]
    fn mc68000_reset_vector_seeds_entry() {
        let (mut image, mut attr) =
            fresh(0x1000000, 0, &[0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x08]);
        seed_entries(&image, &mut attr, IsaKind::Mc68000, &[], false);
        assert!(attr.is_jump_label(8));
        assert!(attr.is_data_label(0));
        run(&mut image, &mut attr, IsaKind::Mc68000, false);
        assert_eq!(attr.class_at(8), ByteClass::Code);
    }

    #[test]
    fn force_mode_continues_past_absolute_terminator() {
        // RTS ; NOP at addresses 0,1 on the 6502: without -f the sweep
        // stops after RTS; with -f it continues onto the NOP.
        let (mut image, mut attr) = fresh(0x10000, 0, &[0x60, 0xea]);
        seed_entries(&image, &mut attr, IsaKind::Mcs6502, &[0], false);
        run(&mut image, &mut attr, IsaKind::Mcs6502, true);
        assert_eq!(attr.class_at(0), ByteClass::Code);
        assert_eq!(attr.class_at(1), ByteClass::Code);
    }

    #[test]
    fn without_force_sweep_stops_after_absolute_terminator() {
        let (mut image, mut attr) = fresh(0x10000, 0, &[0x60, 0xea]);
        seed_entries(&image, &mut attr, IsaKind::Mcs6502, &[0], false);
        run(&mut image, &mut attr, IsaKind::Mcs6502, false);
        assert_eq!(attr.class_at(0), ByteClass::Code);
        assert_eq!(attr.class_at(1), ByteClass::Unknown);
    }

    #[test]
    fn discovery_never_exceeds_end_minus_start_steps() {
        let (mut image, mut attr) = fresh(0x10000, 0, &[0xea; 16]);
        seed_entries(&image, &mut attr, IsaKind::Mcs6502, &[0], false);
        run(&mut image, &mut attr, IsaKind::Mcs6502, false);
        for a in 0..16 {
            assert_eq!(attr.class_at(a), ByteClass::Code);
        }
    }
}
