//! MC6809 instruction decoder.
//!
//! Three opcode spaces: the base table, and two escape pages reached via
//! the `0x10`/`0x11` prefix bytes. Indexed addressing uses a postbyte with
//! sixteen addressing-mode variants plus a handful of reserved encodings
//! that are undecodable; `EXG`/`TFR` and `PSHS`/`PULS`/`PSHU`/`PULU` each
//! decode their own postbyte shape rather than fitting the byte/word mold.

use super::{hex_literal, render, ControlFlags, DecodeCtx, Decoded, InstructionDecoder};

#[derive(Clone, Copy)]
enum Mode {
    Implied,
    Byte,
    Word,
    Rel,
    LRel,
    Index,
    ExgTfr,
    PshPul(&'static str),
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
        0x00 => op("neg\t<{}", Byte, F::empty()),
        0x03 => op("com\t<{}", Byte, F::empty()),
        0x04 => op("lsr\t<{}", Byte, F::empty()),
        0x06 => op("ror\t<{}", Byte, F::empty()),
        0x07 => op("asr\t<{}", Byte, F::empty()),
        0x08 => op("lsl\t<{}", Byte, F::empty()),
        0x09 => op("rol\t<{}", Byte, F::empty()),
        0x0a => op("dec\t<{}", Byte, F::empty()),
        0x0c => op("inc\t<{}", Byte, F::empty()),
        0x0d => op("tst\t<{}", Byte, F::empty()),
        0x0e => op("jmp\t{}", Byte, F::ABSOLUTE),
        0x0f => op("clr\t<{}", Byte, F::empty()),
        0x12 => op("nop", Implied, F::empty()),
        0x13 => op("sync", Implied, F::empty()),
        0x16 => op("lbra\t{}", LRel, F::ABSOLUTE | F::BRANCH),
        0x17 => op("lbsr\t{}", LRel, F::BRANCH),
        0x19 => op("daa", Implied, F::empty()),
        0x1a => op("orcc\t#{}", Byte, F::empty()),
        0x1c => op("andcc\t#{}", Byte, F::empty()),
        0x1d => op("sex", Implied, F::empty()),
        0x1e => op("exg\t{}", ExgTfr, F::empty()),
        0x1f => op("tfr\t{}", ExgTfr, F::empty()),
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
        0x30 => op("leax\t{}", Index, F::empty()),
        0x31 => op("leay\t{}", Index, F::empty()),
        0x32 => op("leas\t{}", Index, F::empty()),
        0x33 => op("leau\t{}", Index, F::empty()),
        0x34 => op("pshs\t{}", PshPul("u"), F::empty()),
        0x35 => op("puls\t{}", PshPul("u"), F::empty()),
        0x36 => op("pshu\t{}", PshPul("s"), F::empty()),
        0x37 => op("pulu\t{}", PshPul("s"), F::empty()),
        0x39 => op("rts", Implied, F::ABSOLUTE),
        0x3a => op("abx", Implied, F::empty()),
        0x3b => op("rti", Implied, F::ABSOLUTE),
        0x3c => op("cwai\t#{}", Byte, F::empty()),
        0x3d => op("mul", Implied, F::empty()),
        0x3f => op("swi", Implied, F::empty()),
        0x40 => op("nega", Implied, F::empty()),
        0x43 => op("coma", Implied, F::empty()),
        0x44 => op("lsra", Implied, F::empty()),
        0x46 => op("rora", Implied, F::empty()),
        0x47 => op("asra", Implied, F::empty()),
        0x48 => op("lsla", Implied, F::empty()),
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
        0x58 => op("lslb", Implied, F::empty()),
        0x59 => op("rolb", Implied, F::empty()),
        0x5a => op("decb", Implied, F::empty()),
        0x5c => op("incb", Implied, F::empty()),
        0x5d => op("tstb", Implied, F::empty()),
        0x5f => op("clrb", Implied, F::empty()),
        0x60 => op("neg\t{}", Index, F::empty()),
        0x63 => op("com\t{}", Index, F::empty()),
        0x64 => op("lsr\t{}", Index, F::empty()),
        0x66 => op("ror\t{}", Index, F::empty()),
        0x67 => op("asr\t{}", Index, F::empty()),
        0x68 => op("lsl\t{}", Index, F::empty()),
        0x69 => op("rol\t{}", Index, F::empty()),
        0x6a => op("dec\t{}", Index, F::empty()),
        0x6c => op("inc\t{}", Index, F::empty()),
        0x6d => op("tst\t{}", Index, F::empty()),
        0x6e => op("jmp\t{}", Index, F::ABSOLUTE),
        0x6f => op("clr\t{}", Index, F::empty()),
        0x70 => op("neg\t{}", Word, F::empty()),
        0x73 => op("com\t{}", Word, F::empty()),
        0x74 => op("lsr\t{}", Word, F::empty()),
        0x76 => op("ror\t{}", Word, F::empty()),
        0x77 => op("asr\t{}", Word, F::empty()),
        0x78 => op("lsl\t{}", Word, F::empty()),
        0x79 => op("rol\t{}", Word, F::empty()),
        0x7a => op("dec\t{}", Word, F::empty()),
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
        0x86 => op("lda\t#{}", Byte, F::empty()),
        0x88 => op("eora\t#{}", Byte, F::empty()),
        0x89 => op("adca\t#{}", Byte, F::empty()),
        0x8a => op("ora\t#{}", Byte, F::empty()),
        0x8b => op("adda\t#{}", Byte, F::empty()),
        0x8c => op("cmpx\t#{}", Word, F::empty()),
        0x8d => op("bsr\t{}", Rel, F::BRANCH),
        0x8e => op("ldx\t#{}", Word, F::empty()),
        0x90 => op("suba\t<{}", Byte, F::empty()),
        0x91 => op("cmpa\t<{}", Byte, F::empty()),
        0x92 => op("sbca\t<{}", Byte, F::empty()),
        0x93 => op("subd\t<{}", Byte, F::empty()),
        0x94 => op("anda\t<{}", Byte, F::empty()),
        0x95 => op("bita\t<{}", Byte, F::empty()),
        0x96 => op("lda\t<{}", Byte, F::empty()),
        0x97 => op("sta\t<{}", Byte, F::empty()),
        0x98 => op("eora\t<{}", Byte, F::empty()),
        0x99 => op("adca\t<{}", Byte, F::empty()),
        0x9a => op("ora\t<{}", Byte, F::empty()),
        0x9b => op("adda\t<{}", Byte, F::empty()),
        0x9c => op("cmpx\t<{}", Byte, F::empty()),
        0x9d => op("jsr\t<{}", Byte, F::BRANCH),
        0x9e => op("ldx\t<{}", Byte, F::empty()),
        0x9f => op("stx\t<{}", Byte, F::empty()),
        0xa0 => op("suba\t{}", Index, F::empty()),
        0xa1 => op("cmpa\t{}", Index, F::empty()),
        0xa2 => op("sbca\t{}", Index, F::empty()),
        0xa3 => op("subd\t{}", Index, F::empty()),
        0xa4 => op("anda\t{}", Index, F::empty()),
        0xa5 => op("bita\t{}", Index, F::empty()),
        0xa6 => op("lda\t{}", Index, F::empty()),
        0xa7 => op("sta\t{}", Index, F::empty()),
        0xa8 => op("eora\t{}", Index, F::empty()),
        0xa9 => op("adca\t{}", Index, F::empty()),
        0xaa => op("ora\t{}", Index, F::empty()),
        0xab => op("adda\t{}", Index, F::empty()),
        0xac => op("cmpx\t{}", Index, F::empty()),
        0xad => op("jsr\t{}", Index, F::BRANCH),
        0xae => op("ldx\t{}", Index, F::empty()),
        0xaf => op("stx\t{}", Index, F::empty()),
        0xb0 => op("suba\t{}", Word, F::empty()),
        0xb1 => op("cmpa\t{}", Word, F::empty()),
        0xb2 => op("sbca\t{}", Word, F::empty()),
        0xb3 => op("subd\t{}", Word, F::empty()),
        0xb4 => op("anda\t{}", Word, F::empty()),
        0xb5 => op("bita\t{}", Word, F::empty()),
        0xb6 => op("lda\t{}", Word, F::empty()),
        0xb7 => op("sta\t{}", Word, F::empty()),
        0xb8 => op("eora\t{}", Word, F::empty()),
        0xb9 => op("adca\t{}", Word, F::empty()),
        0xba => op("ora\t{}", Word, F::empty()),
        0xbb => op("adda\t{}", Word, F::empty()),
        0xbc => op("cmpx\t{}", Word, F::empty()),
        0xbd => op("jsr\t{}", Word, F::BRANCH),
        0xbe => op("ldx\t{}", Word, F::empty()),
        0xbf => op("stx\t{}", Word, F::empty()),
        0xc0 => op("subb\t#{}", Byte, F::empty()),
        0xc1 => op("cmpb\t#{}", Byte, F::empty()),
        0xc2 => op("sbcb\t#{}", Byte, F::empty()),
        0xc3 => op("addd\t#{}", Word, F::empty()),
        0xc4 => op("andb\t#{}", Byte, F::empty()),
        0xc5 => op("bitb\t#{}", Byte, F::empty()),
        0xc6 => op("ldb\t#{}", Byte, F::empty()),
        0xc8 => op("eorb\t#{}", Byte, F::empty()),
        0xc9 => op("adcb\t#{}", Byte, F::empty()),
        0xca => op("orb\t#{}", Byte, F::empty()),
        0xcb => op("addb\t#{}", Byte, F::empty()),
        0xcc => op("ldd\t#{}", Word, F::empty()),
        0xce => op("ldu\t#{}", Word, F::empty()),
        0xd0 => op("subb\t<{}", Byte, F::empty()),
        0xd1 => op("cmpb\t<{}", Byte, F::empty()),
        0xd2 => op("sbcb\t<{}", Byte, F::empty()),
        0xd3 => op("addd\t<{}", Byte, F::empty()),
        0xd4 => op("andb\t<{}", Byte, F::empty()),
        0xd5 => op("bitb\t<{}", Byte, F::empty()),
        0xd6 => op("ldb\t<{}", Byte, F::empty()),
        0xd7 => op("stb\t<{}", Byte, F::empty()),
        0xd8 => op("eorb\t<{}", Byte, F::empty()),
        0xd9 => op("adcb\t<{}", Byte, F::empty()),
        0xda => op("orb\t<{}", Byte, F::empty()),
        0xdb => op("addb\t<{}", Byte, F::empty()),
        0xdc => op("ldd\t<{}", Byte, F::empty()),
        0xdd => op("std\t<{}", Byte, F::empty()),
        0xde => op("ldu\t<{}", Byte, F::empty()),
        0xdf => op("stu\t<{}", Byte, F::empty()),
        0xe0 => op("subb\t{}", Index, F::empty()),
        0xe1 => op("cmpb\t{}", Index, F::empty()),
        0xe2 => op("sbcb\t{}", Index, F::empty()),
        0xe3 => op("addd\t{}", Index, F::empty()),
        0xe4 => op("andb\t{}", Index, F::empty()),
        0xe5 => op("bitb\t{}", Index, F::empty()),
        0xe6 => op("ldb\t{}", Index, F::empty()),
        0xe7 => op("stb\t{}", Index, F::empty()),
        0xe8 => op("eorb\t{}", Index, F::empty()),
        0xe9 => op("adcb\t{}", Index, F::empty()),
        0xea => op("orb\t{}", Index, F::empty()),
        0xeb => op("addb\t{}", Index, F::empty()),
        0xec => op("ldd\t{}", Index, F::empty()),
        0xed => op("std\t{}", Index, F::empty()),
        0xee => op("ldu\t{}", Index, F::empty()),
        0xef => op("stu\t{}", Index, F::empty()),
        0xf0 => op("subb\t{}", Word, F::empty()),
        0xf1 => op("cmpb\t{}", Word, F::empty()),
        0xf2 => op("sbcb\t{}", Word, F::empty()),
        0xf3 => op("addd\t{}", Word, F::empty()),
        0xf4 => op("andb\t{}", Word, F::empty()),
        0xf5 => op("bitb\t{}", Word, F::empty()),
        0xf6 => op("ldb\t{}", Word, F::empty()),
        0xf7 => op("stb\t{}", Word, F::empty()),
        0xf8 => op("eorb\t{}", Word, F::empty()),
        0xf9 => op("adcb\t{}", Word, F::empty()),
        0xfa => op("orb\t{}", Word, F::empty()),
        0xfb => op("addb\t{}", Word, F::empty()),
        0xfc => op("ldd\t{}", Word, F::empty()),
        0xfd => op("std\t{}", Word, F::empty()),
        0xfe => op("ldu\t{}", Word, F::empty()),
        0xff => op("stu\t{}", Word, F::empty()),
        _ => return None,
    })
}

fn lookup_10(opcode: u8) -> Option<Op> {
    use ControlFlags as F;
    use Mode::*;
    Some(match opcode {
        0x21 => op("lbrn\t{}", LRel, F::BRANCH),
        0x22 => op("lbhi\t{}", LRel, F::BRANCH),
        0x23 => op("lbls\t{}", LRel, F::BRANCH),
        0x24 => op("lbcc\t{}", LRel, F::BRANCH),
        0x25 => op("lbcs\t{}", LRel, F::BRANCH),
        0x26 => op("lbne\t{}", LRel, F::BRANCH),
        0x27 => op("lbeq\t{}", LRel, F::BRANCH),
        0x28 => op("lbvc\t{}", LRel, F::BRANCH),
        0x29 => op("lbvs\t{}", LRel, F::BRANCH),
        0x2a => op("lbpl\t{}", LRel, F::BRANCH),
        0x2b => op("lbmi\t{}", LRel, F::BRANCH),
        0x2c => op("lbge\t{}", LRel, F::BRANCH),
        0x2d => op("lblt\t{}", LRel, F::BRANCH),
        0x2e => op("lbgt\t{}", LRel, F::BRANCH),
        0x2f => op("lble\t{}", LRel, F::BRANCH),
        0x3f => op("swi2", Implied, F::empty()),
        0x83 => op("cmpd\t#{}", Word, F::empty()),
        0x8c => op("cmpy\t#{}", Word, F::empty()),
        0x8e => op("ldy\t#{}", Word, F::empty()),
        0x93 => op("cmpd\t<{}", Byte, F::empty()),
        0x9c => op("cmpy\t<{}", Byte, F::empty()),
        0x9e => op("ldy\t<{}", Byte, F::empty()),
        0x9f => op("sty\t<{}", Byte, F::empty()),
        0xa3 => op("cmpd\t{}", Index, F::empty()),
        0xac => op("cmpy\t{}", Index, F::empty()),
        0xae => op("ldy\t{}", Index, F::empty()),
        0xaf => op("sty\t{}", Index, F::empty()),
        0xb3 => op("cmpd\t{}", Word, F::empty()),
        0xbc => op("cmpy\t{}", Word, F::empty()),
        0xbe => op("ldy\t{}", Word, F::empty()),
        0xbf => op("sty\t{}", Word, F::empty()),
        0xce => op("lds\t#{}", Word, F::empty()),
        0xde => op("lds\t<{}", Byte, F::empty()),
        0xdf => op("sts\t<{}", Byte, F::empty()),
        0xee => op("lds\t{}", Index, F::empty()),
        0xef => op("sts\t{}", Index, F::empty()),
        0xfe => op("lds\t{}", Word, F::empty()),
        0xff => op("sts\t{}", Word, F::empty()),
        _ => return None,
    })
}

fn lookup_11(opcode: u8) -> Option<Op> {
    use ControlFlags as F;
    use Mode::*;
    Some(match opcode {
        0x3f => op("swi3", Implied, F::empty()),
        0x83 => op("cmpu\t#{}", Word, F::empty()),
        0x8c => op("cmps\t#{}", Word, F::empty()),
        0x93 => op("cmpu\t<{}", Byte, F::empty()),
        0x9c => op("cmps\t<{}", Byte, F::empty()),
        0xa3 => op("cmpu\t{}", Index, F::empty()),
        0xac => op("cmps\t{}", Index, F::empty()),
        0xb3 => op("cmpu\t{}", Word, F::empty()),
        0xbc => op("cmps\t{}", Word, F::empty()),
        _ => return None,
    })
}

/// Decode the postbyte-indexed addressing mode. Returns `None` for the
/// reserved postbyte encodings, which makes the whole instruction
/// undecodable (mirrors the reference's `return ''`).
fn am_index(ctx: &mut DecodeCtx) -> Option<String> {
    let post = ctx.image.fetch8();
    let extended = post & 0x80 != 0;
    if extended && matches!(post & 0x1f, 0x07 | 0x0a | 0x0e | 0x0f | 0x10 | 0x12 | 0x17 | 0x1a | 0x1e) {
        return None;
    }
    let pl = post & 0x0f;
    let offset = if !extended {
        let d = (post & 0x0f) as i8 | -((post & 0x10) as i8);
        signed_hex(d as i32)
    } else {
        match pl {
            5 => "b".to_string(),
            6 => "a".to_string(),
            8 => {
                let raw = ctx.image.fetch8();
                let d = (raw & 0x7f) as i8 | -((raw & 0x80) as i8);
                signed_hex(d as i32)
            }
            9 | 15 => {
                let addr = ctx.image.fetch16_be() as usize;
                ctx.data_operand(addr, 4)
            }
            11 => "d".to_string(),
            12 => {
                let disp = ctx.image.fetch8() as i8;
                let target = (ctx.image.tell() as i64 + disp as i64) as usize & 0xffff;
                ctx.branch_operand(target, 4)
            }
            13 => {
                let disp = ctx.image.fetch16_be() as i16;
                let target = (ctx.image.tell() as i64 + disp as i64) as usize & 0xffff;
                ctx.branch_operand(target, 4)
            }
            _ => String::new(),
        }
    };
    let dec = if post & 0x8e == 0x82 {
        if post & 1 == 0 { "-" } else { "--" }
    } else {
        ""
    };
    let reg = if post & 0x8e == 0x8c {
        "pc"
    } else {
        ["x", "y", "u", "s"][(post >> 5 & 3) as usize]
    };
    let inc = if post & 0x8e == 0x80 {
        if post & 1 == 0 { "+" } else { "++" }
    } else {
        ""
    };
    Some(if !extended || post & 0x10 == 0 {
        format!("{offset},{dec}{reg}{inc}")
    } else if pl != 0x0f {
        format!("[{offset},{dec}{reg}{inc}]")
    } else {
        format!("[{offset}]")
    })
}

fn signed_hex(d: i32) -> String {
    if d < 0 {
        format!("-${:02x}", -d)
    } else {
        format!("${d:02x}")
    }
}

const EXG_TFR_REGS: [(u8, &str); 10] = [
    (0x0, "d"),
    (0x1, "x"),
    (0x2, "y"),
    (0x3, "u"),
    (0x4, "s"),
    (0x5, "pc"),
    (0x8, "a"),
    (0x9, "b"),
    (0xa, "cc"),
    (0xb, "dp"),
];

fn reg_name(nibble: u8) -> Option<&'static str> {
    EXG_TFR_REGS.iter().find(|(n, _)| *n == nibble).map(|(_, name)| *name)
}

/// `EXG`/`TFR` postbyte: high nibble source, low nibble destination. An
/// unassigned nibble value makes the instruction undecodable.
fn exg_tfr(post: u8) -> Option<String> {
    let src = reg_name(post >> 4)?;
    let dst = reg_name(post & 0x0f)?;
    Some(format!("{src},{dst}"))
}

/// `PSHS`/`PULS`/`PSHU`/`PULU` postbyte: one bit per register, low to
/// high. `other` names the register the 7th bit selects (the S-stack ops
/// can't push S, so that bit means U, and vice versa).
fn psh_pul(post: u8, other: &str) -> String {
    const NAMES: [&str; 6] = ["cc", "a", "b", "dp", "x", "y"];
    let mut regs = Vec::new();
    for (i, name) in NAMES.iter().enumerate() {
        if post & (1 << i) != 0 {
            regs.push(name.to_string());
        }
    }
    if post & (1 << 6) != 0 {
        regs.push(other.to_string());
    }
    if post & (1 << 7) != 0 {
        regs.push("pc".to_string());
    }
    regs.join(",")
}

pub struct Mc6809;

impl Mc6809 {
    fn decode_entry(ctx: &mut DecodeCtx, entry: Op) -> Decoded {
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
            Mode::LRel => {
                let disp = ctx.image.fetch16_be() as i16;
                let target = (ctx.image.tell() as i64 + disp as i64) as usize & 0xffff;
                vec![ctx.branch_operand(target, 4)]
            }
            Mode::Index => match am_index(ctx) {
                Some(s) => vec![s],
                None => return Decoded::undecodable(),
            },
            Mode::ExgTfr => {
                let post = ctx.image.fetch8();
                match exg_tfr(post) {
                    Some(s) => vec![s],
                    None => return Decoded::undecodable(),
                }
            }
            Mode::PshPul(other) => {
                let post = ctx.image.fetch8();
                vec![psh_pul(post, other)]
            }
        };
        let text = render(entry.template, &operands);
        Decoded::new(text, entry.flags)
    }

    fn decode_page(ctx: &mut DecodeCtx, table: fn(u8) -> Option<Op>) -> Decoded {
        let opcode = ctx.image.fetch8();
        match table(opcode) {
            Some(entry) => Self::decode_entry(ctx, entry),
            None => Decoded::undecodable(),
        }
    }
}

impl InstructionDecoder for Mc6809 {
    fn decode(ctx: &mut DecodeCtx, base: usize) -> Decoded {
        ctx.image.seek(base);
        let opcode = ctx.image.fetch8();
        match opcode {
            0x10 => Self::decode_page(ctx, lookup_10),
            0x11 => Self::decode_page(ctx, lookup_11),
            _ => match lookup(opcode) {
                Some(entry) => Self::decode_entry(ctx, entry),
                None => Decoded::undecodable(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttributeMap;
    use crate::image::Image;

    fn decode_at(bytes: &[u8], start: usize, end: usize) -> (Decoded, usize) {
        let mut image = Image::new(0x10000);
        image.load(start, bytes).unwrap();
        let mut attr = AttributeMap::new(0x10000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, start, end);
        let d = Mc6809::decode(&mut ctx, start);
        let len = ctx.image.tell() - start;
        (d, len)
    }

    #[test]
    fn implied_nop() {
        let (d, len) = decode_at(&[0x12], 0, 1);
        assert_eq!(d.text, "nop");
        assert_eq!(len, 1);
    }

    #[test]
    fn direct_byte_operand_has_no_label() {
        let (d, len) = decode_at(&[0x96, 0x20], 0, 2);
        assert_eq!(d.text, "lda\t<$20");
        assert_eq!(len, 2);
    }

    #[test]
    fn extended_jmp_marks_jump_label() {
        let mut image = Image::new(0x10000);
        image.load(0, &[0x7e, 0x00, 0x10]).unwrap();
        let mut attr = AttributeMap::new(0x10000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, 0, 3);
        let d = Mc6809::decode(&mut ctx, 0);
        assert_eq!(d.text, "jmp\tL0010");
        assert!(ctx.attr.is_jump_label(0x0010));
    }

    #[test]
    fn indexed_no_offset_mode() {
        // post=0x84: indirect bit clear, pl=4 (,r), reg bits=00 -> x
        let (d, _) = decode_at(&[0x30, 0x84], 0, 2);
        assert_eq!(d.text, "leax\t,x");
    }

    #[test]
    fn indexed_postinc_and_predec() {
        // post=0x80: ,x+ ; post=0xa2: ,--y (reg bits 01=y)
        let (d, _) = decode_at(&[0x30, 0x80], 0, 2);
        assert_eq!(d.text, "leax\t,x+");
        let (d2, _) = decode_at(&[0x31, 0xa3], 0, 2);
        assert_eq!(d2.text, "leay\t,--y");
    }

    #[test]
    fn indexed_reserved_postbyte_is_undecodable() {
        let (d, len) = decode_at(&[0x30, 0x90], 0, 2);
        assert!(d.is_undecodable());
        assert_eq!(len, 2);
    }

    #[test]
    fn indexed_8bit_offset_pcr() {
        // post=0x8c: 8-bit offset, pc-relative
        let (d, len) = decode_at(&[0x30, 0x8c, 0x05], 0, 3);
        assert_eq!(d.text, "leax\tL0008,pc");
        assert_eq!(len, 3);
    }

    #[test]
    fn exg_valid_registers() {
        let (d, _) = decode_at(&[0x1e, 0x01], 0, 2);
        assert_eq!(d.text, "exg\td,x");
    }

    #[test]
    fn exg_unassigned_nibble_is_undecodable() {
        let (d, len) = decode_at(&[0x1e, 0x06], 0, 2);
        assert!(d.is_undecodable());
        assert_eq!(len, 2);
    }

    #[test]
    fn pshs_seventh_bit_means_u() {
        let (d, _) = decode_at(&[0x34, 0b0100_0001], 0, 2);
        assert_eq!(d.text, "pshs\tcc,u");
    }

    #[test]
    fn pshu_seventh_bit_means_s() {
        let (d, _) = decode_at(&[0x36, 0b0100_0001], 0, 2);
        assert_eq!(d.text, "pshu\tcc,s");
    }

    #[test]
    fn page_10_escape_ldy_immediate() {
        let (d, len) = decode_at(&[0x10, 0x8e, 0x12, 0x34], 0, 4);
        assert_eq!(d.text, "ldy\t#$1234");
        assert_eq!(len, 4);
    }

    #[test]
    fn page_11_escape_swi3() {
        let (d, len) = decode_at(&[0x11, 0x3f], 0, 2);
        assert_eq!(d.text, "swi3");
        assert_eq!(len, 2);
    }

    #[test]
    fn page_10_unassigned_opcode_is_undecodable() {
        let (d, len) = decode_at(&[0x10, 0x00], 0, 2);
        assert!(d.is_undecodable());
        assert_eq!(len, 2);
    }

    #[test]
    fn long_relative_branch_wraps() {
        let (d, len) = decode_at(&[0x16, 0xff, 0xfc], 0, 3);
        assert_eq!(len, 3);
        assert!(d.flags.contains(ControlFlags::ABSOLUTE));
    }

    #[test]
    fn rts_is_absolute_terminator() {
        let (d, _) = decode_at(&[0x39], 0, 1);
        assert!(d.flags.contains(ControlFlags::ABSOLUTE));
    }
}
