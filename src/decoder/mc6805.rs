//! MC6805 instruction decoder.
//!
//! Adds the bit-test-and-branch family (`BRSET`/`BRCLR`) and bit-set/clear
//! (`BSET`/`BCLR`) on top of the 6801 decoder's shape: both encode the bit
//! number directly in the opcode nibble, so the table has one row per bit
//! rather than a sub-decode step.

use super::{hex_literal, render, ControlFlags, DecodeCtx, Decoded, InstructionDecoder};

#[derive(Clone, Copy)]
enum Mode {
    Implied,
    Byte,
    Word,
    Rel,
    ByteThenRel,
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
        0x00 => op("brset\t0,<{},{}", ByteThenRel, F::BRANCH),
        0x01 => op("brclr\t0,<{},{}", ByteThenRel, F::BRANCH),
        0x02 => op("brset\t1,<{},{}", ByteThenRel, F::BRANCH),
        0x03 => op("brclr\t1,<{},{}", ByteThenRel, F::BRANCH),
        0x04 => op("brset\t2,<{},{}", ByteThenRel, F::BRANCH),
        0x05 => op("brclr\t2,<{},{}", ByteThenRel, F::BRANCH),
        0x06 => op("brset\t3,<{},{}", ByteThenRel, F::BRANCH),
        0x07 => op("brclr\t3,<{},{}", ByteThenRel, F::BRANCH),
        0x08 => op("brset\t4,<{},{}", ByteThenRel, F::BRANCH),
        0x09 => op("brclr\t4,<{},{}", ByteThenRel, F::BRANCH),
        0x0a => op("brset\t5,<{},{}", ByteThenRel, F::BRANCH),
        0x0b => op("brclr\t5,<{},{}", ByteThenRel, F::BRANCH),
        0x0c => op("brset\t6,<{},{}", ByteThenRel, F::BRANCH),
        0x0d => op("brclr\t6,<{},{}", ByteThenRel, F::BRANCH),
        0x0e => op("brset\t7,<{},{}", ByteThenRel, F::BRANCH),
        0x0f => op("brclr\t7,<{},{}", ByteThenRel, F::BRANCH),
        0x10 => op("bset\t0,<{}", Byte, F::empty()),
        0x11 => op("bclr\t0,<{}", Byte, F::empty()),
        0x12 => op("bset\t1,<{}", Byte, F::empty()),
        0x13 => op("bclr\t1,<{}", Byte, F::empty()),
        0x14 => op("bset\t2,<{}", Byte, F::empty()),
        0x15 => op("bclr\t2,<{}", Byte, F::empty()),
        0x16 => op("bset\t3,<{}", Byte, F::empty()),
        0x17 => op("bclr\t3,<{}", Byte, F::empty()),
        0x18 => op("bset\t4,<{}", Byte, F::empty()),
        0x19 => op("bclr\t4,<{}", Byte, F::empty()),
        0x1a => op("bset\t5,<{}", Byte, F::empty()),
        0x1b => op("bclr\t5,<{}", Byte, F::empty()),
        0x1c => op("bset\t6,<{}", Byte, F::empty()),
        0x1d => op("bclr\t6,<{}", Byte, F::empty()),
        0x1e => op("bset\t7,<{}", Byte, F::empty()),
        0x1f => op("bclr\t7,<{}", Byte, F::empty()),
        0x20 => op("bra\t{}", Rel, F::ABSOLUTE | F::BRANCH),
        0x21 => op("brn\t{}", Rel, F::BRANCH),
        0x22 => op("bhi\t{}", Rel, F::BRANCH),
        0x23 => op("bls\t{}", Rel, F::BRANCH),
        0x24 => op("bcc\t{}", Rel, F::BRANCH),
        0x25 => op("bcs\t{}", Rel, F::BRANCH),
        0x26 => op("bne\t{}", Rel, F::BRANCH),
        0x27 => op("beq\t{}", Rel, F::BRANCH),
        0x28 => op("bhcc\t{}", Rel, F::BRANCH),
        0x29 => op("bhcs\t{}", Rel, F::BRANCH),
        0x2a => op("bpl\t{}", Rel, F::BRANCH),
        0x2b => op("bmi\t{}", Rel, F::BRANCH),
        0x2c => op("bmc\t{}", Rel, F::BRANCH),
        0x2d => op("bms\t{}", Rel, F::BRANCH),
        0x2e => op("bil\t{}", Rel, F::BRANCH),
        0x2f => op("bih\t{}", Rel, F::BRANCH),
        0x30 => op("neg\t<{}", Byte, F::empty()),
        0x33 => op("com\t<{}", Byte, F::empty()),
        0x34 => op("lsr\t<{}", Byte, F::empty()),
        0x36 => op("ror\t<{}", Byte, F::empty()),
        0x37 => op("asr\t<{}", Byte, F::empty()),
        0x38 => op("asl\t<{}", Byte, F::empty()),
        0x39 => op("rol\t<{}", Byte, F::empty()),
        0x3a => op("dec\t<{}", Byte, F::empty()),
        0x3c => op("inc\t<{}", Byte, F::empty()),
        0x3d => op("tst\t<{}", Byte, F::empty()),
        0x3f => op("clr\t<{}", Byte, F::empty()),
        0x40 => op("nega", Implied, F::empty()),
        0x42 => op("mul", Implied, F::empty()),
        0x43 => op("coma", Implied, F::empty()),
        0x44 => op("lsra", Implied, F::empty()),
        0x46 => op("rora", Implied, F::empty()),
        0x47 => op("asra", Implied, F::empty()),
        0x48 => op("asla", Implied, F::empty()),
        0x49 => op("rola", Implied, F::empty()),
        0x4a => op("deca", Implied, F::empty()),
        0x4c => op("inca", Implied, F::empty()),
        0x4d => op("tsta", Implied, F::empty()),
        0x4f => op("clra", Implied, F::empty()),
        0x50 => op("negx", Implied, F::empty()),
        0x53 => op("comx", Implied, F::empty()),
        0x54 => op("lsrx", Implied, F::empty()),
        0x56 => op("rorx", Implied, F::empty()),
        0x57 => op("asrx", Implied, F::empty()),
        0x58 => op("aslx", Implied, F::empty()),
        0x59 => op("rolx", Implied, F::empty()),
        0x5a => op("decx", Implied, F::empty()),
        0x5c => op("incx", Implied, F::empty()),
        0x5d => op("tstx", Implied, F::empty()),
        0x5f => op("clrx", Implied, F::empty()),
        0x60 => op("neg\t{},x", Byte, F::empty()),
        0x63 => op("com\t{},x", Byte, F::empty()),
        0x64 => op("lsr\t{},x", Byte, F::empty()),
        0x66 => op("ror\t{},x", Byte, F::empty()),
        0x67 => op("asr\t{},x", Byte, F::empty()),
        0x68 => op("asl\t{},x", Byte, F::empty()),
        0x69 => op("rol\t{},x", Byte, F::empty()),
        0x6a => op("dec\t{},x", Byte, F::empty()),
        0x6c => op("inc\t{},x", Byte, F::empty()),
        0x6d => op("tst\t{},x", Byte, F::empty()),
        0x6f => op("clr\t{},x", Byte, F::empty()),
        0x70 => op("neg\t,x", Implied, F::empty()),
        0x73 => op("com\t,x", Implied, F::empty()),
        0x74 => op("lsr\t,x", Implied, F::empty()),
        0x76 => op("ror\t,x", Implied, F::empty()),
        0x77 => op("asr\t,x", Implied, F::empty()),
        0x78 => op("asl\t,x", Implied, F::empty()),
        0x79 => op("rol\t,x", Implied, F::empty()),
        0x7a => op("dec\t,x", Implied, F::empty()),
        0x7c => op("inc\t,x", Implied, F::empty()),
        0x7d => op("tst\t,x", Implied, F::empty()),
        0x7f => op("clr\t,x", Implied, F::empty()),
        0x80 => op("rti", Implied, F::ABSOLUTE),
        0x81 => op("rts", Implied, F::ABSOLUTE),
        0x83 => op("swi", Implied, F::empty()),
        0x8e => op("stop", Implied, F::empty()),
        0x8f => op("wait", Implied, F::empty()),
        0x97 => op("tax", Implied, F::empty()),
        0x98 => op("clc", Implied, F::empty()),
        0x99 => op("sec", Implied, F::empty()),
        0x9a => op("cli", Implied, F::empty()),
        0x9b => op("sei", Implied, F::empty()),
        0x9c => op("rsp", Implied, F::empty()),
        0x9d => op("nop", Implied, F::empty()),
        0x9f => op("txa", Implied, F::empty()),
        0xa0 => op("sub\t#{}", Byte, F::empty()),
        0xa1 => op("cmp\t#{}", Byte, F::empty()),
        0xa2 => op("sbc\t#{}", Byte, F::empty()),
        0xa3 => op("cpx\t#{}", Byte, F::empty()),
        0xa4 => op("and\t#{}", Byte, F::empty()),
        0xa5 => op("bit\t#{}", Byte, F::empty()),
        0xa6 => op("lda\t#{}", Byte, F::empty()),
        0xa8 => op("eor\t#{}", Byte, F::empty()),
        0xa9 => op("adc\t#{}", Byte, F::empty()),
        0xaa => op("ora\t#{}", Byte, F::empty()),
        0xab => op("add\t#{}", Byte, F::empty()),
        0xad => op("bsr\t{}", Rel, F::BRANCH),
        0xae => op("ldx\t#{}", Byte, F::empty()),
        0xb0 => op("sub\t<{}", Byte, F::empty()),
        0xb1 => op("cmp\t<{}", Byte, F::empty()),
        0xb2 => op("sbc\t<{}", Byte, F::empty()),
        0xb3 => op("cpx\t<{}", Byte, F::empty()),
        0xb4 => op("and\t<{}", Byte, F::empty()),
        0xb5 => op("bit\t<{}", Byte, F::empty()),
        0xb6 => op("lda\t<{}", Byte, F::empty()),
        0xb7 => op("sta\t<{}", Byte, F::empty()),
        0xb8 => op("eor\t<{}", Byte, F::empty()),
        0xb9 => op("adc\t<{}", Byte, F::empty()),
        0xba => op("ora\t<{}", Byte, F::empty()),
        0xbb => op("add\t<{}", Byte, F::empty()),
        0xbc => op("jmp\t<{}", Byte, F::ABSOLUTE),
        0xbd => op("jsr\t<{}", Byte, F::empty()),
        0xbe => op("ldx\t<{}", Byte, F::empty()),
        0xbf => op("stx\t<{}", Byte, F::empty()),
        0xc0 => op("sub\t{}", Word, F::empty()),
        0xc1 => op("cmp\t{}", Word, F::empty()),
        0xc2 => op("sbc\t{}", Word, F::empty()),
        0xc3 => op("cpx\t{}", Word, F::empty()),
        0xc4 => op("and\t{}", Word, F::empty()),
        0xc5 => op("bit\t{}", Word, F::empty()),
        0xc6 => op("lda\t{}", Word, F::empty()),
        0xc7 => op("sta\t{}", Word, F::empty()),
        0xc8 => op("eor\t{}", Word, F::empty()),
        0xc9 => op("adc\t{}", Word, F::empty()),
        0xca => op("ora\t{}", Word, F::empty()),
        0xcb => op("add\t{}", Word, F::empty()),
        0xcc => op("jmp\t{}", Word, F::ABSOLUTE | F::BRANCH),
        0xcd => op("jsr\t{}", Word, F::BRANCH),
        0xce => op("ldx\t{}", Word, F::empty()),
        0xcf => op("stx\t{}", Word, F::empty()),
        0xd0 => op("sub\t{},x", Word, F::empty()),
        0xd1 => op("cmp\t{},x", Word, F::empty()),
        0xd2 => op("sbc\t{},x", Word, F::empty()),
        0xd3 => op("cpx\t{},x", Word, F::empty()),
        0xd4 => op("and\t{},x", Word, F::empty()),
        0xd5 => op("bit\t{},x", Word, F::empty()),
        0xd6 => op("lda\t{},x", Word, F::empty()),
        0xd7 => op("sta\t{},x", Word, F::empty()),
        0xd8 => op("eor\t{},x", Word, F::empty()),
        0xd9 => op("adc\t{},x", Word, F::empty()),
        0xda => op("ora\t{},x", Word, F::empty()),
        0xdb => op("add\t{},x", Word, F::empty()),
        0xdc => op("jmp\t{},x", Word, F::ABSOLUTE | F::BRANCH),
        0xdd => op("jsr\t{},x", Word, F::BRANCH),
        0xde => op("ldx\t{},x", Word, F::empty()),
        0xdf => op("stx\t{},x", Word, F::empty()),
        0xe0 => op("sub\t{},x", Byte, F::empty()),
        0xe1 => op("cmp\t{},x", Byte, F::empty()),
        0xe2 => op("sbc\t{},x", Byte, F::empty()),
        0xe3 => op("cpx\t{},x", Byte, F::empty()),
        0xe4 => op("and\t{},x", Byte, F::empty()),
        0xe5 => op("bit\t{},x", Byte, F::empty()),
        0xe6 => op("lda\t{},x", Byte, F::empty()),
        0xe7 => op("sta\t{},x", Byte, F::empty()),
        0xe8 => op("eor\t{},x", Byte, F::empty()),
        0xe9 => op("adc\t{},x", Byte, F::empty()),
        0xea => op("ora\t{},x", Byte, F::empty()),
        0xeb => op("add\t{},x", Byte, F::empty()),
        0xec => op("jmp\t{},x", Byte, F::ABSOLUTE),
        0xed => op("jsr\t{},x", Byte, F::empty()),
        0xee => op("ldx\t{},x", Byte, F::empty()),
        0xef => op("stx\t{},x", Byte, F::empty()),
        0xf0 => op("sub\t,x", Implied, F::empty()),
        0xf1 => op("cmp\t,x", Implied, F::empty()),
        0xf2 => op("sbc\t,x", Implied, F::empty()),
        0xf3 => op("cpx\t,x", Implied, F::empty()),
        0xf4 => op("and\t,x", Implied, F::empty()),
        0xf5 => op("bit\t,x", Implied, F::empty()),
        0xf6 => op("lda\t,x", Implied, F::empty()),
        0xf7 => op("sta\t,x", Implied, F::empty()),
        0xf8 => op("eor\t,x", Implied, F::empty()),
        0xf9 => op("adc\t,x", Implied, F::empty()),
        0xfa => op("ora\t,x", Implied, F::empty()),
        0xfb => op("add\t,x", Implied, F::empty()),
        0xfc => op("jmp\t,x", Implied, F::ABSOLUTE),
        0xfd => op("jsr\t,x", Implied, F::empty()),
        0xfe => op("ldx\t,x", Implied, F::empty()),
        0xff => op("stx\t,x", Implied, F::empty()),
        _ => return None,
    })
}

pub struct Mc6805;

impl InstructionDecoder for Mc6805 {
    fn decode(ctx: &mut DecodeCtx, base: usize) -> Decoded {
        ctx.image.seek(base);
        let opcode = ctx.image.fetch8();
        let Some(entry) = lookup(opcode) else {
            return Decoded::undecodable();
        };
        let branch = entry.flags.contains(ControlFlags::BRANCH);
        let operands: Vec<String> = match entry.mode {
            Mode::Implied => Vec::new(),
            Mode::Byte => vec![hex_literal(ctx.image.fetch8() as usize, 2)],
            Mode::Word => {
                let addr = ctx.image.fetch16_be() as usize;
                vec![if branch {
                    ctx.branch_operand(addr, 4)
                } else {
                    ctx.data_operand(addr, 4)
                }]
            }
            Mode::Rel => {
                let disp = ctx.image.fetch8() as i8;
                let target = (ctx.image.tell() as i64 + disp as i64) as usize & 0xffff;
                vec![ctx.branch_operand(target, 4)]
            }
            Mode::ByteThenRel => {
                let addr_byte = hex_literal(ctx.image.fetch8() as usize, 2);
                let disp = ctx.image.fetch8() as i8;
                let target = (ctx.image.tell() as i64 + disp as i64) as usize & 0xffff;
                vec![addr_byte, ctx.branch_operand(target, 4)]
            }
        };
        let text = render(entry.template, &operands);
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
        let d = Mc6805::decode(&mut ctx, base);
        let len = ctx.image.tell() - base;
        (d, len)
    }

    #[test]
    fn implied_nop() {
        let (d, len) = decode_at(&[0x9d], 0, 0, 1);
        assert_eq!(d.text, "nop");
        assert_eq!(len, 1);
    }

    #[test]
    fn brset_has_bit_literal_and_branch_operand() {
        let (d, len) = decode_at(&[0x00, 0x10, 0x00], 0, 0, 3);
        assert_eq!(d.text, "brset\t0,<$10,L0003");
        assert_eq!(len, 3);
    }

    #[test]
    fn bset_bit_constant_and_direct_address_no_label() {
        let (d, _) = decode_at(&[0x12, 0x20], 0, 0, 2);
        assert_eq!(d.text, "bset\t1,<$20");
    }

    #[test]
    fn jmp_extended_sets_jump_label() {
        let mut image = Image::new(0x10000);
        image.load(0, &[0xcc, 0x00, 0x10]).unwrap();
        let mut attr = AttributeMap::new(0x10000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, 0, 3);
        let d = Mc6805::decode(&mut ctx, 0);
        assert_eq!(d.text, "jmp\tL0010");
        assert!(ctx.attr.is_jump_label(0x0010));
    }

    #[test]
    fn rts_is_absolute_terminator() {
        let (d, _) = decode_at(&[0x81], 0, 0, 1);
        assert!(d.flags.contains(ControlFlags::ABSOLUTE));
    }

    #[test]
    fn reserved_opcode_is_undecodable() {
        let (d, len) = decode_at(&[0x31], 0, 0, 1);
        assert!(d.is_undecodable());
        assert_eq!(len, 1);
    }
}
