//! MC6801/HD63701 instruction decoder.
//!
//! Table-driven like the 6502 decoder, but with Motorola big-endian
//! extended addresses, a dedicated direct-page (`<`) addressing mode, and
//! the HD63701 bit-memory extensions (`AIM`/`OIM`/`EIM`/`TIM`), which take
//! two immediate-style byte operands and never touch the label arrays.

use super::{hex_literal, render, ControlFlags, DecodeCtx, Decoded, InstructionDecoder};

#[derive(Clone, Copy)]
enum Mode {
    Implied,
    Byte,
    Word,
    TwoByte,
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
        0x01 => op("nop", Implied, F::empty()),
        0x04 => op("lsrd", Implied, F::empty()),
        0x05 => op("asld", Implied, F::empty()),
        0x06 => op("tap", Implied, F::empty()),
        0x07 => op("tpa", Implied, F::empty()),
        0x08 => op("inx", Implied, F::empty()),
        0x09 => op("dex", Implied, F::empty()),
        0x0a => op("clv", Implied, F::empty()),
        0x0b => op("sev", Implied, F::empty()),
        0x0c => op("clc", Implied, F::empty()),
        0x0d => op("sec", Implied, F::empty()),
        0x0e => op("cli", Implied, F::empty()),
        0x0f => op("sei", Implied, F::empty()),
        0x10 => op("sba", Implied, F::empty()),
        0x11 => op("cba", Implied, F::empty()),
        0x16 => op("tab", Implied, F::empty()),
        0x17 => op("tba", Implied, F::empty()),
        0x18 => op("xgdx", Implied, F::empty()),
        0x19 => op("daa", Implied, F::empty()),
        0x1a => op("slp", Implied, F::empty()),
        0x1b => op("aba", Implied, F::empty()),
        0x20 => op("bra\t{}", Rel, F::ABSOLUTE | F::BRANCH),
        0x21 => op("brn\t{}", Rel, F::BRANCH),
        0x22 => op("bhi\t{}", Rel, F::BRANCH),
        0x23 => op("bls\t{}", Rel, F::BRANCH),
        0x24 => op("bcc\t{}", Rel, F::BRANCH),
        0x25 => op("bcs\t{}", Rel, F::BRANCH),
        0x26 => op("bne\t{}", Rel, F::BRANCH),
        0x27 => op("beq\t{}", Rel, F::BRANCH),
        0x28 => op("bvc\t{}", Rel, F::BRANCH),
        0x29 => op("bvs\t{}", Rel, F::BRANCH),
        0x2a => op("bpl\t{}", Rel, F::BRANCH),
        0x2b => op("bmi\t{}", Rel, F::BRANCH),
        0x2c => op("bge\t{}", Rel, F::BRANCH),
        0x2d => op("blt\t{}", Rel, F::BRANCH),
        0x2e => op("bgt\t{}", Rel, F::BRANCH),
        0x2f => op("ble\t{}", Rel, F::BRANCH),
        0x30 => op("tsx", Implied, F::empty()),
        0x31 => op("ins", Implied, F::empty()),
        0x32 => op("pula", Implied, F::empty()),
        0x33 => op("pulb", Implied, F::empty()),
        0x34 => op("des", Implied, F::empty()),
        0x35 => op("txs", Implied, F::empty()),
        0x36 => op("psha", Implied, F::empty()),
        0x37 => op("pshb", Implied, F::empty()),
        0x38 => op("pulx", Implied, F::empty()),
        0x39 => op("rts", Implied, F::ABSOLUTE),
        0x3a => op("abx", Implied, F::empty()),
        0x3b => op("rti", Implied, F::ABSOLUTE),
        0x3c => op("pshx", Implied, F::empty()),
        0x3d => op("mul", Implied, F::empty()),
        0x3e => op("wai", Implied, F::empty()),
        0x3f => op("swi", Implied, F::empty()),
        0x40 => op("nega", Implied, F::empty()),
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
        0x50 => op("negb", Implied, F::empty()),
        0x53 => op("comb", Implied, F::empty()),
        0x54 => op("lsrb", Implied, F::empty()),
        0x56 => op("rorb", Implied, F::empty()),
        0x57 => op("asrb", Implied, F::empty()),
        0x58 => op("aslb", Implied, F::empty()),
        0x59 => op("rolb", Implied, F::empty()),
        0x5a => op("decb", Implied, F::empty()),
        0x5c => op("incb", Implied, F::empty()),
        0x5d => op("tstb", Implied, F::empty()),
        0x5f => op("clrb", Implied, F::empty()),
        0x60 => op("neg\t{},x", Byte, F::empty()),
        0x61 => op("aim\t#{},[{},x]", TwoByte, F::empty()),
        0x62 => op("oim\t#{},[{},x]", TwoByte, F::empty()),
        0x63 => op("com\t{},x", Byte, F::empty()),
        0x64 => op("lsr\t{},x", Byte, F::empty()),
        0x65 => op("eim\t#{},[{},x]", TwoByte, F::empty()),
        0x66 => op("ror\t{},x", Byte, F::empty()),
        0x67 => op("asr\t{},x", Byte, F::empty()),
        0x68 => op("lsl\t{},x", Byte, F::empty()),
        0x69 => op("rol\t{},x", Byte, F::empty()),
        0x6a => op("dec\t{},x", Byte, F::empty()),
        0x6b => op("tim\t#{},[{},x]", TwoByte, F::empty()),
        0x6c => op("inc\t{},x", Byte, F::empty()),
        0x6d => op("tst\t{},x", Byte, F::empty()),
        0x6e => op("jmp\t{},x", Byte, F::ABSOLUTE),
        0x6f => op("clr\t{},x", Byte, F::empty()),
        0x70 => op("neg\t{}", Word, F::empty()),
        0x71 => op("aim\t#{},<{}", TwoByte, F::empty()),
        0x72 => op("oim\t#{},<{}", TwoByte, F::empty()),
        0x73 => op("com\t{}", Word, F::empty()),
        0x74 => op("lsr\t{}", Word, F::empty()),
        0x75 => op("eim\t#{},<{}", TwoByte, F::empty()),
        0x76 => op("ror\t{}", Word, F::empty()),
        0x77 => op("asr\t{}", Word, F::empty()),
        0x78 => op("lsl\t{}", Word, F::empty()),
        0x79 => op("rol\t{}", Word, F::empty()),
        0x7a => op("dec\t{}", Word, F::empty()),
        0x7b => op("tim\t#{},<{}", TwoByte, F::empty()),
        0x7c => op("inc\t{}", Word, F::empty()),
        0x7d => op("tst\t{}", Word, F::empty()),
        0x7e => op("jmp\t{}", Word, F::ABSOLUTE | F::BRANCH),
        0x7f => op("clr\t{}", Word, F::empty()),
        0x80 => op("suba\t#{}", Byte, F::empty()),
        0x81 => op("cmpa\t#{}", Byte, F::empty()),
        0x82 => op("sbca\t#{}", Byte, F::empty()),
        0x83 => op("subd\t#{}", Word, F::empty()),
        0x84 => op("anda\t#{}", Byte, F::empty()),
        0x85 => op("bita\t#{}", Byte, F::empty()),
        0x86 => op("ldaa\t#{}", Byte, F::empty()),
        0x88 => op("eora\t#{}", Byte, F::empty()),
        0x89 => op("adca\t#{}", Byte, F::empty()),
        0x8a => op("oraa\t#{}", Byte, F::empty()),
        0x8b => op("adda\t#{}", Byte, F::empty()),
        0x8c => op("cpx\t#{}", Word, F::empty()),
        0x8d => op("bsr\t{}", Rel, F::BRANCH),
        0x8e => op("lds\t#{}", Word, F::empty()),
        0x90 => op("suba\t<{}", Byte, F::empty()),
        0x91 => op("cmpa\t<{}", Byte, F::empty()),
        0x92 => op("sbca\t<{}", Byte, F::empty()),
        0x93 => op("subd\t<{}", Byte, F::empty()),
        0x94 => op("anda\t<{}", Byte, F::empty()),
        0x95 => op("bita\t<{}", Byte, F::empty()),
        0x96 => op("ldaa\t<{}", Byte, F::empty()),
        0x97 => op("staa\t<{}", Byte, F::empty()),
        0x98 => op("eora\t<{}", Byte, F::empty()),
        0x99 => op("adca\t<{}", Byte, F::empty()),
        0x9a => op("oraa\t<{}", Byte, F::empty()),
        0x9b => op("adda\t<{}", Byte, F::empty()),
        0x9c => op("cpx\t<{}", Byte, F::empty()),
        0x9d => op("jsr\t<{}", Byte, F::empty()),
        0x9e => op("lds\t<{}", Byte, F::empty()),
        0x9f => op("sts\t<{}", Byte, F::empty()),
        0xa0 => op("suba\t{},x", Byte, F::empty()),
        0xa1 => op("cmpa\t{},x", Byte, F::empty()),
        0xa2 => op("sbca\t{},x", Byte, F::empty()),
        0xa3 => op("subd\t{},x", Byte, F::empty()),
        0xa4 => op("anda\t{},x", Byte, F::empty()),
        0xa5 => op("bita\t{},x", Byte, F::empty()),
        0xa6 => op("ldaa\t{},x", Byte, F::empty()),
        0xa7 => op("staa\t{},x", Byte, F::empty()),
        0xa8 => op("eora\t{},x", Byte, F::empty()),
        0xa9 => op("adca\t{},x", Byte, F::empty()),
        0xaa => op("oraa\t{},x", Byte, F::empty()),
        0xab => op("adda\t{},x", Byte, F::empty()),
        0xac => op("cpx\t{},x", Byte, F::empty()),
        0xad => op("jsr\t{},x", Byte, F::empty()),
        0xae => op("lds\t{},x", Byte, F::empty()),
        0xaf => op("sts\t{},x", Byte, F::empty()),
        0xb0 => op("suba\t{}", Word, F::empty()),
        0xb1 => op("cmpa\t{}", Word, F::empty()),
        0xb2 => op("sbca\t{}", Word, F::empty()),
        0xb3 => op("subd\t{}", Word, F::empty()),
        0xb4 => op("anda\t{}", Word, F::empty()),
        0xb5 => op("bita\t{}", Word, F::empty()),
        0xb6 => op("ldaa\t{}", Word, F::empty()),
        0xb7 => op("staa\t{}", Word, F::empty()),
        0xb8 => op("eora\t{}", Word, F::empty()),
        0xb9 => op("adca\t{}", Word, F::empty()),
        0xba => op("oraa\t{}", Word, F::empty()),
        0xbb => op("adda\t{}", Word, F::empty()),
        0xbc => op("cpx\t{}", Word, F::empty()),
        0xbd => op("jsr\t{}", Word, F::BRANCH),
        0xbe => op("lds\t{}", Word, F::empty()),
        0xbf => op("sts\t{}", Word, F::empty()),
        0xc0 => op("subb\t#{}", Byte, F::empty()),
        0xc1 => op("cmpb\t#{}", Byte, F::empty()),
        0xc2 => op("sbcb\t#{}", Byte, F::empty()),
        0xc3 => op("addd\t#{}", Word, F::empty()),
        0xc4 => op("andb\t#{}", Byte, F::empty()),
        0xc5 => op("bitb\t#{}", Byte, F::empty()),
        0xc6 => op("ldab\t#{}", Byte, F::empty()),
        0xc8 => op("eorb\t#{}", Byte, F::empty()),
        0xc9 => op("adcb\t#{}", Byte, F::empty()),
        0xca => op("orab\t#{}", Byte, F::empty()),
        0xcb => op("addb\t#{}", Byte, F::empty()),
        0xcc => op("ldd\t#{}", Word, F::empty()),
        0xce => op("ldx\t#{}", Word, F::empty()),
        0xd0 => op("subb\t<{}", Byte, F::empty()),
        0xd1 => op("cmpb\t<{}", Byte, F::empty()),
        0xd2 => op("sbcb\t<{}", Byte, F::empty()),
        0xd3 => op("addd\t<{}", Byte, F::empty()),
        0xd4 => op("andb\t<{}", Byte, F::empty()),
        0xd5 => op("bitb\t<{}", Byte, F::empty()),
        0xd6 => op("ldab\t<{}", Byte, F::empty()),
        0xd7 => op("stab\t<{}", Byte, F::empty()),
        0xd8 => op("eorb\t<{}", Byte, F::empty()),
        0xd9 => op("adcb\t<{}", Byte, F::empty()),
        0xda => op("orab\t<{}", Byte, F::empty()),
        0xdb => op("addb\t<{}", Byte, F::empty()),
        0xdc => op("ldd\t<{}", Byte, F::empty()),
        0xdd => op("std\t<{}", Byte, F::empty()),
        0xde => op("ldx\t<{}", Byte, F::empty()),
        0xdf => op("stx\t<{}", Byte, F::empty()),
        0xe0 => op("subb\t{},x", Byte, F::empty()),
        0xe1 => op("cmpb\t{},x", Byte, F::empty()),
        0xe2 => op("sbcb\t{},x", Byte, F::empty()),
        0xe3 => op("addd\t{},x", Byte, F::empty()),
        0xe4 => op("andb\t{},x", Byte, F::empty()),
        0xe5 => op("bitb\t{},x", Byte, F::empty()),
        0xe6 => op("ldab\t{},x", Byte, F::empty()),
        0xe7 => op("stab\t{},x", Byte, F::empty()),
        0xe8 => op("eorb\t{},x", Byte, F::empty()),
        0xe9 => op("adcb\t{},x", Byte, F::empty()),
        0xea => op("orab\t{},x", Byte, F::empty()),
        0xeb => op("addb\t{},x", Byte, F::empty()),
        0xec => op("ldd\t{},x", Byte, F::empty()),
        0xed => op("std\t{},x", Byte, F::empty()),
        0xee => op("ldx\t{},x", Byte, F::empty()),
        0xef => op("stx\t{},x", Byte, F::empty()),
        0xf0 => op("subb\t{}", Word, F::empty()),
        0xf1 => op("cmpb\t{}", Word, F::empty()),
        0xf2 => op("sbcb\t{}", Word, F::empty()),
        0xf3 => op("addd\t{}", Word, F::empty()),
        0xf4 => op("andb\t{}", Word, F::empty()),
        0xf5 => op("bitb\t{}", Word, F::empty()),
        0xf6 => op("ldab\t{}", Word, F::empty()),
        0xf7 => op("stab\t{}", Word, F::empty()),
        0xf8 => op("eorb\t{}", Word, F::empty()),
        0xf9 => op("adcb\t{}", Word, F::empty()),
        0xfa => op("orab\t{}", Word, F::empty()),
        0xfb => op("addb\t{}", Word, F::empty()),
        0xfc => op("ldd\t{}", Word, F::empty()),
        0xfd => op("std\t{}", Word, F::empty()),
        0xfe => op("ldx\t{}", Word, F::empty()),
        0xff => op("stx\t{}", Word, F::empty()),
        _ => return None,
    })
}

pub struct Mc6801;

impl InstructionDecoder for Mc6801 {
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
            Mode::TwoByte => vec![
                hex_literal(ctx.image.fetch8() as usize, 2),
                hex_literal(ctx.image.fetch8() as usize, 2),
            ],
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
        let d = Mc6801::decode(&mut ctx, base);
        let len = ctx.image.tell() - base;
        (d, len)
    }

    #[test]
    fn implied_nop() {
        let (d, len) = decode_at(&[0x01], 0, 0, 1);
        assert_eq!(d.text, "nop");
        assert_eq!(len, 1);
    }

    #[test]
    fn direct_page_operand_has_no_label() {
        let (d, _) = decode_at(&[0x96, 0x10], 0, 0, 2);
        assert_eq!(d.text, "ldaa\t<$10");
    }

    #[test]
    fn extended_jmp_sets_jump_label() {
        let mut image = Image::new(0x10000);
        image.load(0, &[0x7e, 0x12, 0x34]).unwrap();
        let mut attr = AttributeMap::new(0x10000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, 0, 3);
        let d = Mc6801::decode(&mut ctx, 0);
        assert_eq!(d.text, "jmp\tL1234");
        assert!(ctx.attr.is_jump_label(0x1234));
        assert!(d.flags.contains(ControlFlags::ABSOLUTE));
        assert!(d.flags.contains(ControlFlags::BRANCH));
    }

    #[test]
    fn bra_is_relative_branch_big_endian_style() {
        let (d, _) = decode_at(&[0x20, 0x00], 0, 0, 2);
        assert_eq!(d.text, "bra\tL0002");
    }

    #[test]
    fn hd63701_aim_indexed_two_operands_no_label() {
        let (d, len) = decode_at(&[0x61, 0x0f, 0x04], 0, 0, 3);
        assert_eq!(d.text, "aim\t#$0f,[$04,x]");
        assert_eq!(len, 3);
    }

    #[test]
    fn extended_non_branch_marks_data_label_in_range() {
        let mut image = Image::new(0x10000);
        image.load(0, &[0xb6, 0x00, 0x02]).unwrap();
        let mut attr = AttributeMap::new(0x10000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, 0, 3);
        let d = Mc6801::decode(&mut ctx, 0);
        assert_eq!(d.text, "ldaa\tL0002");
        assert!(ctx.attr.is_data_label(0x0002));
    }

    #[test]
    fn unassigned_opcode_is_undecodable() {
        let (d, len) = decode_at(&[0x00], 0, 0, 1);
        assert!(d.is_undecodable());
        assert_eq!(len, 1);
    }
}
