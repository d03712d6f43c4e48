//! MCS6502 instruction decoder.
//!
//! One table lookup per opcode; no prefix layers. Zero-page and immediate
//! operands never create labels (the reference's `byte()` never touches
//! the label arrays); absolute operands and relative branches do.

use super::{hex_literal, ControlFlags, DecodeCtx, Decoded, InstructionDecoder};

#[derive(Clone, Copy)]
enum Mode {
    Implied,
    Imm,
    Zp,
    ZpX,
    ZpY,
    IndZpX,
    IndZpY,
    Abs,
    AbsX,
    AbsY,
    Ind,
    Rel,
}

struct Op {
    template: &'static str,
    mode: Mode,
    flags: ControlFlags,
}

const fn op(template: &'static str, mode: Mode, flags: ControlFlags) -> Op {
    Op { template, mode, flags }
}

fn lookup(opcode: u8) -> Option<Op> {
    use ControlFlags as F;
    use Mode::*;
    Some(match opcode {
        0x00 => op("brk\t{}", Imm, F::empty()),
        0x01 => op("ora\t({},x)", IndZpX, F::empty()),
        0x05 => op("ora\t{}", Zp, F::empty()),
        0x06 => op("asl\t{}", Zp, F::empty()),
        0x08 => op("php", Implied, F::empty()),
        0x09 => op("ora\t#{}", Imm, F::empty()),
        0x0a => op("asla", Implied, F::empty()),
        0x0d => op("ora\t{}", Abs, F::empty()),
        0x0e => op("asl\t{}", Abs, F::empty()),
        0x10 => op("bpl\t{}", Rel, F::BRANCH),
        0x11 => op("ora\t({}),y", IndZpY, F::empty()),
        0x15 => op("ora\t{},x", ZpX, F::empty()),
        0x16 => op("asl\t{},x", ZpX, F::empty()),
        0x18 => op("clc", Implied, F::empty()),
        0x19 => op("ora\t{},y", AbsY, F::empty()),
        0x1d => op("ora\t{},x", AbsX, F::empty()),
        0x1e => op("asl\t{},x", AbsX, F::empty()),
        0x20 => op("jsr\t{}", Abs, F::BRANCH),
        0x21 => op("and\t({},x)", IndZpX, F::empty()),
        0x24 => op("bit\t{}", Zp, F::empty()),
        0x25 => op("and\t{}", Zp, F::empty()),
        0x26 => op("rol\t{}", Zp, F::empty()),
        0x28 => op("plp", Implied, F::empty()),
        0x29 => op("and\t#{}", Imm, F::empty()),
        0x2a => op("rola", Implied, F::empty()),
        0x2c => op("bit\t{}", Abs, F::empty()),
        0x2d => op("and\t{}", Abs, F::empty()),
        0x2e => op("rol\t{}", Abs, F::empty()),
        0x30 => op("bmi\t{}", Rel, F::BRANCH),
        0x31 => op("and\t({}),y", IndZpY, F::empty()),
        0x35 => op("and\t{},x", ZpX, F::empty()),
        0x36 => op("rol\t{},x", ZpX, F::empty()),
        0x38 => op("sec", Implied, F::empty()),
        0x39 => op("and\t{},y", AbsY, F::empty()),
        0x3d => op("and\t{},x", AbsX, F::empty()),
        0x3e => op("rol\t{},x", AbsX, F::empty()),
        0x40 => op("rti", Implied, F::ABSOLUTE),
        0x41 => op("eor\t({},x)", IndZpX, F::empty()),
        0x45 => op("eor\t{}", Zp, F::empty()),
        0x46 => op("lsr\t{}", Zp, F::empty()),
        0x48 => op("pha", Implied, F::empty()),
        0x49 => op("eor\t#{}", Imm, F::empty()),
        0x4a => op("lsra", Implied, F::empty()),
        0x4c => op("jmp\t{}", Abs, F::ABSOLUTE.union(F::BRANCH)),
        0x4d => op("eor\t{}", Abs, F::empty()),
        0x4e => op("lsr\t{}", Abs, F::empty()),
        0x50 => op("bvc\t{}", Rel, F::BRANCH),
        0x51 => op("eor\t({}),y", IndZpY, F::empty()),
        0x55 => op("eor\t{},x", ZpX, F::empty()),
        0x56 => op("lsr\t{},x", ZpX, F::empty()),
        0x58 => op("cli", Implied, F::empty()),
        0x59 => op("eor\t{},y", AbsY, F::empty()),
        0x5d => op("eor\t{},x", AbsX, F::empty()),
        0x5e => op("lsr\t{},x", AbsX, F::empty()),
        0x60 => op("rts", Implied, F::ABSOLUTE),
        0x61 => op("adc\t({},x)", IndZpX, F::empty()),
        0x65 => op("adc\t{}", Zp, F::empty()),
        0x66 => op("ror\t{}", Zp, F::empty()),
        0x68 => op("pla", Implied, F::empty()),
        0x69 => op("adc\t#{}", Imm, F::empty()),
        0x6a => op("rora", Implied, F::empty()),
        0x6c => op("jmp\t({})", Ind, F::ABSOLUTE),
        0x6d => op("adc\t{}", Abs, F::empty()),
        0x6e => op("ror\t{}", Abs, F::empty()),
        0x70 => op("bvs\t{}", Rel, F::BRANCH),
        0x71 => op("adc\t({}),y", IndZpY, F::empty()),
        0x75 => op("adc\t{},x", ZpX, F::empty()),
        0x76 => op("ror\t{},x", ZpX, F::empty()),
        0x78 => op("sei", Implied, F::empty()),
        0x79 => op("adc\t{},y", AbsY, F::empty()),
        0x7d => op("adc\t{},x", AbsX, F::empty()),
        0x7e => op("ror\t{},x", AbsX, F::empty()),
        0x81 => op("sta\t({},x)", IndZpX, F::empty()),
        0x84 => op("sty\t{}", Zp, F::empty()),
        0x85 => op("sta\t{}", Zp, F::empty()),
        0x86 => op("stx\t{}", Zp, F::empty()),
        0x88 => op("dey", Implied, F::empty()),
        0x8a => op("txa", Implied, F::empty()),
        0x8c => op("sty\t{}", Abs, F::empty()),
        0x8d => op("sta\t{}", Abs, F::empty()),
        0x8e => op("stx\t{}", Abs, F::empty()),
        0x90 => op("bcc\t{}", Rel, F::BRANCH),
        0x91 => op("sta\t({}),y", IndZpY, F::empty()),
        0x94 => op("sty\t{},x", ZpX, F::empty()),
        0x95 => op("sta\t{},x", ZpX, F::empty()),
        0x96 => op("stx\t{},y", ZpY, F::empty()),
        0x98 => op("tya", Implied, F::empty()),
        0x99 => op("sta\t{},y", AbsY, F::empty()),
        0x9a => op("txs", Implied, F::empty()),
        0x9d => op("sta\t{},x", AbsX, F::empty()),
        0xa0 => op("ldy\t#{}", Imm, F::empty()),
        0xa1 => op("lda\t({},x)", IndZpX, F::empty()),
        0xa2 => op("ldx\t#{}", Imm, F::empty()),
        0xa4 => op("ldy\t{}", Zp, F::empty()),
        0xa5 => op("lda\t{}", Zp, F::empty()),
        0xa6 => op("ldx\t{}", Zp, F::empty()),
        0xa8 => op("tay", Implied, F::empty()),
        0xa9 => op("lda\t#{}", Imm, F::empty()),
        0xaa => op("tax", Implied, F::empty()),
        0xac => op("ldy\t{}", Abs, F::empty()),
        0xad => op("lda\t{}", Abs, F::empty()),
        0xae => op("ldx\t{}", Abs, F::empty()),
        0xb0 => op("bcs\t{}", Rel, F::BRANCH),
        0xb1 => op("lda\t({}),y", IndZpY, F::empty()),
        0xb4 => op("ldy\t{},x", ZpX, F::empty()),
        0xb5 => op("lda\t{},x", ZpX, F::empty()),
        0xb6 => op("ldx\t{},y", ZpY, F::empty()),
        0xb8 => op("clv", Implied, F::empty()),
        0xb9 => op("lda\t{},y", AbsY, F::empty()),
        0xba => op("tsx", Implied, F::empty()),
        0xbc => op("ldy\t{},x", AbsX, F::empty()),
        0xbd => op("lda\t{},x", AbsX, F::empty()),
        0xbe => op("ldx\t{},y", AbsY, F::empty()),
        0xc0 => op("cpy\t#{}", Imm, F::empty()),
        0xc1 => op("cmp\t({},x)", IndZpX, F::empty()),
        0xc4 => op("cpy\t{}", Zp, F::empty()),
        0xc5 => op("cmp\t{}", Zp, F::empty()),
        0xc6 => op("dec\t{}", Zp, F::empty()),
        0xc8 => op("iny", Implied, F::empty()),
        0xc9 => op("cmp\t#{}", Imm, F::empty()),
        0xca => op("dex", Implied, F::empty()),
        0xcc => op("cpy\t{}", Abs, F::empty()),
        0xcd => op("cmp\t{}", Abs, F::empty()),
        0xce => op("dec\t{}", Abs, F::empty()),
        0xd0 => op("bne\t{}", Rel, F::BRANCH),
        0xd1 => op("cmp\t({}),y", IndZpY, F::empty()),
        0xd5 => op("cmp\t{},x", ZpX, F::empty()),
        0xd6 => op("dec\t{},x", ZpX, F::empty()),
        0xd8 => op("cld", Implied, F::empty()),
        0xd9 => op("cmp\t{},y", AbsY, F::empty()),
        0xdd => op("cmp\t{},x", AbsX, F::empty()),
        0xde => op("dec\t{},x", AbsX, F::empty()),
        0xe0 => op("cpx\t#{}", Imm, F::empty()),
        0xe1 => op("sbc\t({},x)", IndZpX, F::empty()),
        0xe4 => op("cpx\t{}", Zp, F::empty()),
        0xe5 => op("sbc\t{}", Zp, F::empty()),
        0xe6 => op("inc\t{}", Zp, F::empty()),
        0xe8 => op("inx", Implied, F::empty()),
        0xe9 => op("sbc\t#{}", Imm, F::empty()),
        0xea => op("nop", Implied, F::empty()),
        0xec => op("cpx\t{}", Abs, F::empty()),
        0xed => op("sbc\t{}", Abs, F::empty()),
        0xee => op("inc\t{}", Abs, F::empty()),
        0xf0 => op("beq\t{}", Rel, F::BRANCH),
        0xf1 => op("sbc\t({}),y", IndZpY, F::empty()),
        0xf5 => op("sbc\t{},x", ZpX, F::empty()),
        0xf6 => op("inc\t{},x", ZpX, F::empty()),
        0xf8 => op("sed", Implied, F::empty()),
        0xf9 => op("sbc\t{},y", AbsY, F::empty()),
        0xfd => op("sbc\t{},x", AbsX, F::empty()),
        0xfe => op("inc\t{},x", AbsX, F::empty()),
        _ => return None,
    })
}

pub struct Mcs6502;

impl InstructionDecoder for Mcs6502 {
    fn decode(ctx: &mut DecodeCtx, base: usize) -> Decoded {
        ctx.image.seek(base);
        let opcode = ctx.image.fetch8();
        let Some(entry) = lookup(opcode) else {
            return Decoded::undecodable();
        };
        let branch = entry.flags.contains(ControlFlags::BRANCH);
        let operand = match entry.mode {
            Mode::Implied => None,
            Mode::Imm | Mode::Zp | Mode::ZpX | Mode::ZpY | Mode::IndZpX | Mode::IndZpY => {
                Some(hex_literal(ctx.image.fetch8() as usize, 2))
            }
            Mode::Abs | Mode::AbsX | Mode::AbsY | Mode::Ind => {
                let addr = ctx.image.fetch16_le() as usize;
                Some(if branch {
                    ctx.branch_operand(addr, 4)
                } else {
                    ctx.data_operand(addr, 4)
                })
            }
            Mode::Rel => {
                let disp = ctx.image.fetch8() as i8;
                let target = (ctx.image.tell() as i64 + disp as i64) as usize & 0xffff;
                Some(ctx.branch_operand(target, 4))
            }
        };
        let text = match operand {
            Some(o) => entry.template.replacen("{}", &o, 1),
            None => entry.template.to_string(),
        };
        Decoded::new(text, entry.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttributeMap;
    use crate::image::Image;

    fn decode_at(bytes: &[u8], base: usize, start: usize, end: usize) -> (Decoded, usize) {
        let mut image = Image::new(0x10000);
        image.load(start, bytes).unwrap();
        let mut attr = AttributeMap::new(0x10000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, start, end);
        let d = Mcs6502::decode(&mut ctx, base);
        let len = ctx.image.tell() - base;
        (d, len)
    }

    #[test]
    fn nop_is_one_byte_implied() {
        let (d, len) = decode_at(&[0xea], 0, 0, 1);
        assert_eq!(d.text, "nop");
        assert_eq!(len, 1);
        assert!(d.flags.is_empty());
    }

    #[test]
    fn lda_immediate_no_label() {
        let (d, len) = decode_at(&[0xa9, 0x05], 0, 0, 2);
        assert_eq!(d.text, "lda\t#$05");
        assert_eq!(len, 2);
    }

    #[test]
    fn jmp_absolute_sets_jump_label_and_terminates() {
        let mut image = Image::new(0x10000);
        image.load(0, &[0x4c, 0x00, 0x00]).unwrap();
        let mut attr = AttributeMap::new(0x10000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, 0, 3);
        let d = Mcs6502::decode(&mut ctx, 0);
        assert_eq!(d.text, "jmp\tL0000");
        assert!(d.flags.contains(ControlFlags::ABSOLUTE));
        assert!(d.flags.contains(ControlFlags::BRANCH));
        assert!(ctx.attr.is_jump_label(0x0000));
    }

    #[test]
    fn branch_relative_wraps_and_marks_jump_label() {
        // BPL with displacement -2 at address 0 -> targets 0 (self-loop)
        let (d, _) = decode_at(&[0x10, 0xfe], 0, 0, 2);
        assert_eq!(d.text, "bpl\tL0000");
    }

    #[test]
    fn absolute_operand_outside_range_renders_as_literal() {
        let (d, _) = decode_at(&[0xad, 0x00, 0x90], 0, 0, 3);
        assert_eq!(d.text, "lda\t$9000");
    }

    #[test]
    fn undecodable_opcode_returns_empty() {
        let (d, len) = decode_at(&[0x02], 0, 0, 1);
        assert!(d.is_undecodable());
        assert_eq!(len, 1);
    }

    #[test]
    fn rts_is_absolute_terminator() {
        let (d, _) = decode_at(&[0x60], 0, 0, 1);
        assert!(d.flags.contains(ControlFlags::ABSOLUTE));
    }
}
