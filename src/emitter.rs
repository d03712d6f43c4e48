//! Listing emission.
//!
//! Walks the address space once, low to high, switching on each address's
//! attribute class and rendering one assembly record per run of bytes.
//! Every address in `[start, end)` ends up covered by exactly one emitted
//! record.

use crate::attr::{AttributeMap, ByteClass};
use crate::decoder::{decode_at, DecodeCtx};
use crate::hints::HintStore;
use crate::image::Image;
use crate::isa::IsaKind;

/// Per-architecture traditional-assembler syntax: directive names and
/// column widths. The 68000 prints labels on their own line and uses the
/// dotted Motorola directive set; the 8-bit ISAs share the classic
/// `fcb`/`fdb`/`org`/`end` mnemonics.
struct Syntax {
    digits: usize,
    raw_width: usize,
    byte_dir: &'static str,
    word_dir: &'static str,
    long_dir: Option<&'static str>,
    string_dir: &'static str,
    org_dir: &'static str,
    end_dir: &'static str,
    label_on_own_line: bool,
    cpu_directive: Option<&'static str>,
}

fn syntax_for(isa: IsaKind) -> Syntax {
    match isa {
        IsaKind::Mc68000 => Syntax {
            digits: 6,
            raw_width: 6,
            byte_dir: ".dc.b",
            word_dir: ".dc.w",
            long_dir: Some(".dc.l"),
            string_dir: ".dc.b",
            org_dir: ".org",
            end_dir: ".end",
            label_on_own_line: true,
            cpu_directive: Some(".cpu\t68000"),
        },
        _ => Syntax {
            digits: 4,
            raw_width: 4,
            byte_dir: "fcb",
            word_dir: "fdb",
            long_dir: None,
            string_dir: "fcc",
            org_dir: "org",
            end_dir: "end",
            label_on_own_line: false,
            cpu_directive: None,
        },
    }
}

fn is_ascii_printable(b: u8) -> bool {
    (0x20..=0x7e).contains(&b)
}

/// Length of a maximal run starting at `addr` of bytes sharing `class`,
/// capped at `max` records, stopping before any interior label.
fn run_length(attr: &AttributeMap, addr: usize, end: usize, class: ByteClass, max: usize, record_width: usize) -> usize {
    let mut records = 0;
    let mut a = addr;
    while records < max && a < end && attr.class_at(a) == class {
        if records > 0 && attr.is_label(a) {
            break;
        }
        records += 1;
        a += record_width;
    }
    records.max(1)
}

fn read_pointer(image: &Image, addr: usize, isa: IsaKind) -> (usize, usize) {
    match isa {
        IsaKind::Mc68000 => {
            let target = (image.peek8(addr + 1) as usize) << 16
                | (image.peek8(addr + 2) as usize) << 8
                | image.peek8(addr + 3) as usize;
            (target, 4)
        }
        _ => {
            let (hi, lo) = match isa.endian() {
                crate::hints::Endian::Big => (image.peek8(addr), image.peek8(addr + 1)),
                crate::hints::Endian::Little => (image.peek8(addr + 1), image.peek8(addr)),
            };
            (((hi as usize) << 8) | lo as usize, 2)
        }
    }
}

fn hex_bytes(image: &Image, addr: usize, len: usize) -> Vec<u8> {
    (0..len).map(|i| image.peek8(addr + i)).collect()
}

fn listing_prefix(syntax: &Syntax, addr: usize, bytes: &[u8]) -> String {
    let mut hex = String::new();
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            hex.push(' ');
        }
        hex.push_str(&format!("{b:02x}"));
    }
    let column_width = syntax.raw_width * 3 - 1;
    while hex.len() < column_width {
        hex.push(' ');
    }
    format!("{:0digits$x} {hex} ", addr, digits = syntax.digits)
}

/// Render the complete listing for `[image.start(), image.end())` into a
/// single string, ready to be written to the output file or stdout.
pub fn run(image: &mut Image, attr: &mut AttributeMap, hints: &HintStore, isa: IsaKind, listing: bool, input_name: &str) -> String {
    let syntax = syntax_for(isa);
    let start = image.start();
    let end = image.end();
    let mut out = String::new();

    out.push_str(&format!("; {} disassembly of {input_name}\n", isa.name()));
    if let Some(cpu) = syntax.cpu_directive {
        out.push_str(cpu);
        out.push('\n');
    }
    out.push_str(&format!("{}\t${:0digits$x}\n", syntax.org_dir, start, digits = syntax.digits));

    let entry_label = (start..end).find(|a| attr.is_jump_label(*a)).unwrap_or(start);

    let mut addr = start;
    while addr < end {
        for remark in hints.remarks_at(addr) {
            out.push_str(&format!("; {remark}\n"));
        }

        let has_label = attr.is_jump_label(addr) || attr.is_data_label(addr);
        if has_label && syntax.label_on_own_line {
            out.push_str(&format!("L{:0digits$x}:\n", addr, digits = syntax.digits));
        }
        let label_prefix = if has_label && !syntax.label_on_own_line {
            format!("L{:0digits$x}:\t", addr, digits = syntax.digits)
        } else {
            String::new()
        };

        match attr.class_at(addr) {
            ByteClass::Code => {
                let decoded = {
                    let mut ctx = DecodeCtx::new(image, attr, start, end);
                    decode_at(isa, &mut ctx, addr)
                };
                let consumed = (image.tell() - addr).max(1);
                if decoded.is_undecodable() {
                    let b = image.peek8(addr);
                    emit_line(&mut out, listing, &syntax, addr, &[b], &label_prefix, &format!("{}\t${b:02x}", syntax.byte_dir));
                } else {
                    let bytes = hex_bytes(image, addr, consumed);
                    emit_line(&mut out, listing, &syntax, addr, &bytes, &label_prefix, &decoded.text);
                }
                addr += consumed;
            }
            ByteClass::String => {
                let n = run_length(attr, addr, end, ByteClass::String, usize::MAX, 1);
                let bytes = hex_bytes(image, addr, n);
                let text: String = bytes.iter().map(|&b| if is_ascii_printable(b) { b as char } else { '.' }).collect();
                emit_line(&mut out, listing, &syntax, addr, &bytes, &label_prefix, &format!("{}\t\"{text}\"", syntax.string_dir));
                addr += n;
            }
            ByteClass::ByteData => {
                let n = run_length(attr, addr, end, ByteClass::ByteData, 8, 1);
                let bytes = hex_bytes(image, addr, n);
                let list = bytes.iter().map(|b| format!("${b:02x}")).collect::<Vec<_>>().join(",");
                emit_line(&mut out, listing, &syntax, addr, &bytes, &label_prefix, &format!("{}\t{list}", syntax.byte_dir));
                addr += n;
            }
            ByteClass::Pointer => {
                let (_, width) = read_pointer(image, addr, isa);
                let n = run_length(attr, addr, end, ByteClass::Pointer, 4, width);
                let mut labels = Vec::with_capacity(n);
                for i in 0..n {
                    let (target, _) = read_pointer(image, addr + i * width, isa);
                    labels.push(format!("L{:0digits$x}", target, digits = syntax.digits));
                }
                let bytes = hex_bytes(image, addr, n * width);
                let dir = syntax.long_dir.unwrap_or(syntax.word_dir);
                emit_line(&mut out, listing, &syntax, addr, &bytes, &label_prefix, &format!("{dir}\t{}", labels.join(",")));
                addr += n * width;
            }
            ByteClass::Unknown => {
                let b = image.peek8(addr);
                let mut text = format!("{}\t${b:02x}", syntax.byte_dir);
                if is_ascii_printable(b) {
                    text.push_str(&format!("\t; '{}'", b as char));
                }
                emit_line(&mut out, listing, &syntax, addr, &[b], &label_prefix, &text);
                addr += 1;
            }
        }
    }

    if isa == IsaKind::Mc68000 {
        out.push_str(&format!("{}\tL{:0digits$x}\n", syntax.end_dir, entry_label, digits = syntax.digits));
    } else {
        out.push_str(syntax.end_dir);
        out.push('\n');
    }
    out
}

fn emit_line(out: &mut String, listing: bool, syntax: &Syntax, addr: usize, bytes: &[u8], label_prefix: &str, body: &str) {
    if listing {
        out.push_str(&listing_prefix(syntax, addr, bytes));
    }
    out.push_str(label_prefix);
    out.push_str(body);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::PointerFormat;
    use pretty_assertions::assert_eq;

    fn render(isa: IsaKind, bytes: &[u8], listing: bool) -> String {
        let capacity = isa.address_space();
        let mut image = Image::new(capacity);
        image.load(0, bytes).unwrap();
        let mut attr = AttributeMap::new(capacity);
        crate::discovery::seed_entries(&image, &mut attr, isa, &[], false);
        crate::discovery::run(&mut image, &mut attr, isa, false);
        let hints = HintStore::load("", &image, &mut attr, isa.pointer_format()).unwrap();
        run(&mut image, &mut attr, &hints, isa, listing, "test.bin")
    }

    #[test]
    fn empty_input_prints_only_header_and_end() {
        let out = render(IsaKind::Mcs6502, &[], false);
        assert!(out.contains("org"));
        assert!(out.trim_end().ends_with("end"));
        assert!(!out.contains("fcb"));
    }

    #[test]
    fn z80_self_jump_prints_single_line_with_label() {
        let out = render(IsaKind::Z80, &[0xc3, 0x00, 0x00], false);
        let expected = "; z80 disassembly of test.bin\norg\t$0000\nL0000:\tjp\tL0000\nend\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn unknown_byte_gets_ascii_comment() {
        let isa = IsaKind::Mcs6502;
        let capacity = isa.address_space();
        let mut image = Image::new(capacity);
        image.load(0, b"A").unwrap();
        let mut attr = AttributeMap::new(capacity);
        let hints = HintStore::load("", &image, &mut attr, isa.pointer_format()).unwrap();
        let out = run(&mut image, &mut attr, &hints, isa, false, "test.bin");
        assert!(out.contains("; 'A'"));
    }

    #[test]
    fn byte_data_hint_groups_up_to_eight_bytes() {
        let isa = IsaKind::Mcs6502;
        let capacity = isa.address_space();
        let mut image = Image::new(capacity);
        image.load(0, &[0u8; 10]).unwrap();
        let mut attr = AttributeMap::new(capacity);
        attr.set_hinted_range(0, 10, ByteClass::ByteData);
        let hints = HintStore::load("", &image, &mut attr, isa.pointer_format()).unwrap();
        let out = run(&mut image, &mut attr, &hints, isa, false, "test.bin");
        let fcb_lines: Vec<&str> = out.lines().filter(|l| l.starts_with("fcb")).collect();
        assert_eq!(fcb_lines.len(), 2);
        assert_eq!(fcb_lines[0].matches('$').count(), 8);
        assert_eq!(fcb_lines[1].matches('$').count(), 2);
    }

    #[test]
    fn mc68000_label_renders_on_its_own_line() {
        let out = render(IsaKind::Mc68000, &[0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x08, 0x4e, 0x71], false);
        assert!(out.contains("L000008:\nnop"));
    }

    #[test]
    fn remark_hint_is_emitted_before_its_address() {
        let isa = IsaKind::Mcs6502;
        let capacity = isa.address_space();
        let mut image = Image::new(capacity);
        image.load(0, &[0xea]).unwrap();
        let mut attr = AttributeMap::new(capacity);
        crate::discovery::seed_entries(&image, &mut attr, isa, &[0], false);
        crate::discovery::run(&mut image, &mut attr, isa, false);
        let hints = HintStore::load("r 0 boot entry\n", &image, &mut attr, isa.pointer_format()).unwrap();
        let out = run(&mut image, &mut attr, &hints, isa, false, "test.bin");
        let lines: Vec<&str> = out.lines().collect();
        let remark_idx = lines.iter().position(|l| l.contains("boot entry")).unwrap();
        let nop_idx = lines.iter().position(|l| l.contains("nop")).unwrap();
        assert!(remark_idx < nop_idx);
        let _ = PointerFormat::ThreeOfFour;
    }
}
