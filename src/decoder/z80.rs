//! Z80 instruction decoder.
//!
//! Five opcode spaces: the base table and four escape pages (`CB`, `ED`,
//! `DD`, `FD`), plus two doubly-escaped pages (`DDCB`, `FDCB`) reached
//! through `DD`/`FD` whose quirk is that the displacement byte is fetched
//! *before* the suffix opcode that selects the operation. Numeric
//! literals follow Z80 assembler convention (`nnh`, not `$nn`), with a
//! leading zero forced when the hex digits would otherwise start with a
//! letter.

use super::{render, ControlFlags, DecodeCtx, Decoded, InstructionDecoder};

#[derive(Clone, Copy)]
enum Mode {
    Implied,
    Byte,
    Word,
    Rel,
    Disp,
    DispThenByte,
}

struct Op {
    template: &'static str,
    mode: Mode,
    flags: ControlFlags,
}

const fn op(template: &'static str, mode: Mode, flags: ControlFlags) -> Op {
    Op { template, mode, flags }
}

/// Byte literal in Z80 style: `{:02x}h`, with a forced leading `0` when
/// the value's top nibble would read as a letter (`a0` -> `0a0h`).
fn hex_byte(v: u8) -> String {
    if v >= 0xa0 {
        format!("0{v:02x}h")
    } else {
        format!("{v:02x}h")
    }
}

fn hex_word(v: u16) -> String {
    if v >= 0xa000 {
        format!("0{v:04x}h")
    } else {
        format!("{v:04x}h")
    }
}

/// Signed displacement: always-signed, zero-padded 2-digit hex magnitude.
fn signed_byte(v: i8) -> String {
    let sign = if v < 0 { '-' } else { '+' };
    format!("{sign}{:02x}h", (v as i32).unsigned_abs())
}

fn word_operand(ctx: &mut DecodeCtx, addr: usize, branch: bool) -> String {
    if branch {
        ctx.mark_jump(addr);
        format!("L{addr:04x}")
    } else {
        ctx.mark_data(addr);
        if ctx.in_range(addr) {
            format!("L{addr:04x}")
        } else {
            hex_word(addr as u16)
        }
    }
}

fn relative_operand(ctx: &mut DecodeCtx, disp: i8) -> String {
    let target = (ctx.image.tell() as i64 + disp as i64) as usize & 0xffff;
    ctx.mark_jump(target);
    format!("L{target:04x}")
}

fn lookup(opcode: u8) -> Option<Op> {
    use ControlFlags as F;
    use Mode::*;
    Some(match opcode {
        0x00 => op("nop", Implied, F::empty()),
        0x01 => op("ld\tbc,{}", Word, F::empty()),
        0x02 => op("ld\t(bc),a", Implied, F::empty()),
        0x03 => op("inc\tbc", Implied, F::empty()),
        0x04 => op("inc\tb", Implied, F::empty()),
        0x05 => op("dec\tb", Implied, F::empty()),
        0x06 => op("ld\tb,{}", Byte, F::empty()),
        0x07 => op("rlca", Implied, F::empty()),
        0x08 => op("ex\taf,af\'", Implied, F::empty()),
        0x09 => op("add\thl,bc", Implied, F::empty()),
        0x0a => op("ld\ta,(bc)", Implied, F::empty()),
        0x0b => op("dec\tbc", Implied, F::empty()),
        0x0c => op("inc\tc", Implied, F::empty()),
        0x0d => op("dec\tc", Implied, F::empty()),
        0x0e => op("ld\tc,{}", Byte, F::empty()),
        0x0f => op("rrca", Implied, F::empty()),
        0x10 => op("djnz\t{}", Rel, F::BRANCH),
        0x11 => op("ld\tde,{}", Word, F::empty()),
        0x12 => op("ld\t(de),a", Implied, F::empty()),
        0x13 => op("inc\tde", Implied, F::empty()),
        0x14 => op("inc\td", Implied, F::empty()),
        0x15 => op("dec\td", Implied, F::empty()),
        0x16 => op("ld\td,{}", Byte, F::empty()),
        0x17 => op("rla", Implied, F::empty()),
        0x18 => op("jr\t{}", Rel, F::ABSOLUTE | F::BRANCH),
        0x19 => op("add\thl,de", Implied, F::empty()),
        0x1a => op("ld\ta,(de)", Implied, F::empty()),
        0x1b => op("dec\tde", Implied, F::empty()),
        0x1c => op("inc\te", Implied, F::empty()),
        0x1d => op("dec\te", Implied, F::empty()),
        0x1e => op("ld\te,{}", Byte, F::empty()),
        0x1f => op("rra", Implied, F::empty()),
        0x20 => op("jr\tnz,{}", Rel, F::BRANCH),
        0x21 => op("ld\thl,{}", Word, F::empty()),
        0x22 => op("ld\t({}),hl", Word, F::empty()),
        0x23 => op("inc\thl", Implied, F::empty()),
        0x24 => op("inc\th", Implied, F::empty()),
        0x25 => op("dec\th", Implied, F::empty()),
        0x26 => op("ld\th,{}", Byte, F::empty()),
        0x27 => op("daa", Implied, F::empty()),
        0x28 => op("jr\tz,{}", Rel, F::BRANCH),
        0x29 => op("add\thl,hl", Implied, F::empty()),
        0x2a => op("ld\thl,({})", Word, F::empty()),
        0x2b => op("dec\thl", Implied, F::empty()),
        0x2c => op("inc\tl", Implied, F::empty()),
        0x2d => op("dec\tl", Implied, F::empty()),
        0x2e => op("ld\tl,{}", Byte, F::empty()),
        0x2f => op("cpl", Implied, F::empty()),
        0x30 => op("jr\tnc,{}", Rel, F::BRANCH),
        0x31 => op("ld\tsp,{}", Word, F::empty()),
        0x32 => op("ld\t({}),a", Word, F::empty()),
        0x33 => op("inc\tsp", Implied, F::empty()),
        0x34 => op("inc\t(hl)", Implied, F::empty()),
        0x35 => op("dec\t(hl)", Implied, F::empty()),
        0x36 => op("ld\t(hl),{}", Byte, F::empty()),
        0x37 => op("scf", Implied, F::empty()),
        0x38 => op("jr\tc,{}", Rel, F::BRANCH),
        0x39 => op("add\thl,sp", Implied, F::empty()),
        0x3a => op("ld\ta,({})", Word, F::empty()),
        0x3b => op("dec\tsp", Implied, F::empty()),
        0x3c => op("inc\ta", Implied, F::empty()),
        0x3d => op("dec\ta", Implied, F::empty()),
        0x3e => op("ld\ta,{}", Byte, F::empty()),
        0x3f => op("ccf", Implied, F::empty()),
        0x40 => op("ld\tb,b", Implied, F::empty()),
        0x41 => op("ld\tb,c", Implied, F::empty()),
        0x42 => op("ld\tb,d", Implied, F::empty()),
        0x43 => op("ld\tb,e", Implied, F::empty()),
        0x44 => op("ld\tb,h", Implied, F::empty()),
        0x45 => op("ld\tb,l", Implied, F::empty()),
        0x46 => op("ld\tb,(hl)", Implied, F::empty()),
        0x47 => op("ld\tb,a", Implied, F::empty()),
        0x48 => op("ld\tc,b", Implied, F::empty()),
        0x49 => op("ld\tc,c", Implied, F::empty()),
        0x4a => op("ld\tc,d", Implied, F::empty()),
        0x4b => op("ld\tc,e", Implied, F::empty()),
        0x4c => op("ld\tc,h", Implied, F::empty()),
        0x4d => op("ld\tc,l", Implied, F::empty()),
        0x4e => op("ld\tc,(hl)", Implied, F::empty()),
        0x4f => op("ld\tc,a", Implied, F::empty()),
        0x50 => op("ld\td,b", Implied, F::empty()),
        0x51 => op("ld\td,c", Implied, F::empty()),
        0x52 => op("ld\td,d", Implied, F::empty()),
        0x53 => op("ld\td,e", Implied, F::empty()),
        0x54 => op("ld\td,h", Implied, F::empty()),
        0x55 => op("ld\td,l", Implied, F::empty()),
        0x56 => op("ld\td,(hl)", Implied, F::empty()),
        0x57 => op("ld\td,a", Implied, F::empty()),
        0x58 => op("ld\te,b", Implied, F::empty()),
        0x59 => op("ld\te,c", Implied, F::empty()),
        0x5a => op("ld\te,d", Implied, F::empty()),
        0x5b => op("ld\te,e", Implied, F::empty()),
        0x5c => op("ld\te,h", Implied, F::empty()),
        0x5d => op("ld\te,l", Implied, F::empty()),
        0x5e => op("ld\te,(hl)", Implied, F::empty()),
        0x5f => op("ld\te,a", Implied, F::empty()),
        0x60 => op("ld\th,b", Implied, F::empty()),
        0x61 => op("ld\th,c", Implied, F::empty()),
        0x62 => op("ld\th,d", Implied, F::empty()),
        0x63 => op("ld\th,e", Implied, F::empty()),
        0x64 => op("ld\th,h", Implied, F::empty()),
        0x65 => op("ld\th,l", Implied, F::empty()),
        0x66 => op("ld\th,(hl)", Implied, F::empty()),
        0x67 => op("ld\th,a", Implied, F::empty()),
        0x68 => op("ld\tl,b", Implied, F::empty()),
        0x69 => op("ld\tl,c", Implied, F::empty()),
        0x6a => op("ld\tl,d", Implied, F::empty()),
        0x6b => op("ld\tl,e", Implied, F::empty()),
        0x6c => op("ld\tl,h", Implied, F::empty()),
        0x6d => op("ld\tl,l", Implied, F::empty()),
        0x6e => op("ld\tl,(hl)", Implied, F::empty()),
        0x6f => op("ld\tl,a", Implied, F::empty()),
        0x70 => op("ld\t(hl),b", Implied, F::empty()),
        0x71 => op("ld\t(hl),c", Implied, F::empty()),
        0x72 => op("ld\t(hl),d", Implied, F::empty()),
        0x73 => op("ld\t(hl),e", Implied, F::empty()),
        0x74 => op("ld\t(hl),h", Implied, F::empty()),
        0x75 => op("ld\t(hl),l", Implied, F::empty()),
        0x76 => op("halt", Implied, F::empty()),
        0x77 => op("ld\t(hl),a", Implied, F::empty()),
        0x78 => op("ld\ta,b", Implied, F::empty()),
        0x79 => op("ld\ta,c", Implied, F::empty()),
        0x7a => op("ld\ta,d", Implied, F::empty()),
        0x7b => op("ld\ta,e", Implied, F::empty()),
        0x7c => op("ld\ta,h", Implied, F::empty()),
        0x7d => op("ld\ta,l", Implied, F::empty()),
        0x7e => op("ld\ta,(hl)", Implied, F::empty()),
        0x7f => op("ld\ta,a", Implied, F::empty()),
        0x80 => op("add\ta,b", Implied, F::empty()),
        0x81 => op("add\ta,c", Implied, F::empty()),
        0x82 => op("add\ta,d", Implied, F::empty()),
        0x83 => op("add\ta,e", Implied, F::empty()),
        0x84 => op("add\ta,h", Implied, F::empty()),
        0x85 => op("add\ta,l", Implied, F::empty()),
        0x86 => op("add\ta,(hl)", Implied, F::empty()),
        0x87 => op("add\ta,a", Implied, F::empty()),
        0x88 => op("adc\ta,b", Implied, F::empty()),
        0x89 => op("adc\ta,c", Implied, F::empty()),
        0x8a => op("adc\ta,d", Implied, F::empty()),
        0x8b => op("adc\ta,e", Implied, F::empty()),
        0x8c => op("adc\ta,h", Implied, F::empty()),
        0x8d => op("adc\ta,l", Implied, F::empty()),
        0x8e => op("adc\ta,(hl)", Implied, F::empty()),
        0x8f => op("adc\ta,a", Implied, F::empty()),
        0x90 => op("sub\tb", Implied, F::empty()),
        0x91 => op("sub\tc", Implied, F::empty()),
        0x92 => op("sub\td", Implied, F::empty()),
        0x93 => op("sub\te", Implied, F::empty()),
        0x94 => op("sub\th", Implied, F::empty()),
        0x95 => op("sub\tl", Implied, F::empty()),
        0x96 => op("sub\t(hl)", Implied, F::empty()),
        0x97 => op("sub\ta", Implied, F::empty()),
        0x98 => op("sbc\ta,b", Implied, F::empty()),
        0x99 => op("sbc\ta,c", Implied, F::empty()),
        0x9a => op("sbc\ta,d", Implied, F::empty()),
        0x9b => op("sbc\ta,e", Implied, F::empty()),
        0x9c => op("sbc\ta,h", Implied, F::empty()),
        0x9d => op("sbc\ta,l", Implied, F::empty()),
        0x9e => op("sbc\ta,(hl)", Implied, F::empty()),
        0x9f => op("sbc\ta,a", Implied, F::empty()),
        0xa0 => op("and\tb", Implied, F::empty()),
        0xa1 => op("and\tc", Implied, F::empty()),
        0xa2 => op("and\td", Implied, F::empty()),
        0xa3 => op("and\te", Implied, F::empty()),
        0xa4 => op("and\th", Implied, F::empty()),
        0xa5 => op("and\tl", Implied, F::empty()),
        0xa6 => op("and\t(hl)", Implied, F::empty()),
        0xa7 => op("and\ta", Implied, F::empty()),
        0xa8 => op("xor\tb", Implied, F::empty()),
        0xa9 => op("xor\tc", Implied, F::empty()),
        0xaa => op("xor\td", Implied, F::empty()),
        0xab => op("xor\te", Implied, F::empty()),
        0xac => op("xor\th", Implied, F::empty()),
        0xad => op("xor\tl", Implied, F::empty()),
        0xae => op("xor\t(hl)", Implied, F::empty()),
        0xaf => op("xor\ta", Implied, F::empty()),
        0xb0 => op("or\tb", Implied, F::empty()),
        0xb1 => op("or\tc", Implied, F::empty()),
        0xb2 => op("or\td", Implied, F::empty()),
        0xb3 => op("or\te", Implied, F::empty()),
        0xb4 => op("or\th", Implied, F::empty()),
        0xb5 => op("or\tl", Implied, F::empty()),
        0xb6 => op("or\t(hl)", Implied, F::empty()),
        0xb7 => op("or\ta", Implied, F::empty()),
        0xb8 => op("cp\tb", Implied, F::empty()),
        0xb9 => op("cp\tc", Implied, F::empty()),
        0xba => op("cp\td", Implied, F::empty()),
        0xbb => op("cp\te", Implied, F::empty()),
        0xbc => op("cp\th", Implied, F::empty()),
        0xbd => op("cp\tl", Implied, F::empty()),
        0xbe => op("cp\t(hl)", Implied, F::empty()),
        0xbf => op("cp\ta", Implied, F::empty()),
        0xc0 => op("ret\tnz", Implied, F::empty()),
        0xc1 => op("pop\tbc", Implied, F::empty()),
        0xc2 => op("jp\tnz,{}", Word, F::BRANCH),
        0xc3 => op("jp\t{}", Word, F::ABSOLUTE | F::BRANCH),
        0xc4 => op("call\tnz,{}", Word, F::BRANCH),
        0xc5 => op("push\tbc", Implied, F::empty()),
        0xc6 => op("add\ta,{}", Byte, F::empty()),
        0xc7 => op("rst\t00h", Implied, F::empty()),
        0xc8 => op("ret\tz", Implied, F::empty()),
        0xc9 => op("ret", Implied, F::ABSOLUTE),
        0xca => op("jp\tz,{}", Word, F::BRANCH),
        0xcc => op("call\tz,{}", Word, F::BRANCH),
        0xcd => op("call\t{}", Word, F::BRANCH),
        0xce => op("adc\ta,{}", Byte, F::empty()),
        0xcf => op("rst\t08h", Implied, F::empty()),
        0xd0 => op("ret\tnc", Implied, F::empty()),
        0xd1 => op("pop\tde", Implied, F::empty()),
        0xd2 => op("jp\tnc,{}", Word, F::BRANCH),
        0xd3 => op("out\t{},a", Byte, F::BRANCH),
        0xd4 => op("call\tnc,{}", Word, F::BRANCH),
        0xd5 => op("push\tde", Implied, F::empty()),
        0xd6 => op("sub\t{}", Byte, F::empty()),
        0xd7 => op("rst\t10h", Implied, F::empty()),
        0xd8 => op("ret\tc", Implied, F::empty()),
        0xd9 => op("exx", Implied, F::empty()),
        0xda => op("jp\tc,{}", Word, F::BRANCH),
        0xdb => op("in\ta,{}", Byte, F::empty()),
        0xdc => op("call\tc,{}", Word, F::BRANCH),
        0xde => op("sbc\ta,{}", Byte, F::empty()),
        0xdf => op("rst\t18h", Implied, F::empty()),
        0xe0 => op("ret\tpo", Implied, F::empty()),
        0xe1 => op("pop\thl", Implied, F::empty()),
        0xe2 => op("jp\tpo,{}", Word, F::BRANCH),
        0xe3 => op("ex\t(sp),hl", Implied, F::empty()),
        0xe4 => op("call\tpo,{}", Word, F::BRANCH),
        0xe5 => op("push\thl", Implied, F::empty()),
        0xe6 => op("and\t{}", Byte, F::empty()),
        0xe7 => op("rst\t20h", Implied, F::empty()),
        0xe8 => op("ret\tpe", Implied, F::empty()),
        0xe9 => op("jp\t(hl)", Implied, F::ABSOLUTE),
        0xea => op("jp\tpe,{}", Word, F::BRANCH),
        0xeb => op("ex\tde,hl", Implied, F::empty()),
        0xec => op("call\tpe,{}", Word, F::BRANCH),
        0xee => op("xor\t{}", Byte, F::empty()),
        0xef => op("rst\t28h", Implied, F::empty()),
        0xf0 => op("ret\tp", Implied, F::empty()),
        0xf1 => op("pop\taf", Implied, F::empty()),
        0xf2 => op("jp\tp,{}", Word, F::BRANCH),
        0xf3 => op("di", Implied, F::empty()),
        0xf4 => op("call\tp,{}", Word, F::BRANCH),
        0xf5 => op("push\taf", Implied, F::empty()),
        0xf6 => op("or\t{}", Byte, F::empty()),
        0xf7 => op("rst\t30h", Implied, F::empty()),
        0xf8 => op("ret\tm", Implied, F::empty()),
        0xf9 => op("ld\tsp,hl", Implied, F::empty()),
        0xfa => op("jp\tm,{}", Word, F::BRANCH),
        0xfb => op("ei", Implied, F::empty()),
        0xfc => op("call\tm,{}", Word, F::BRANCH),
        0xfe => op("cp\t{}", Byte, F::empty()),
        0xff => op("rst\t38h", Implied, F::empty()),
        _ => return None,
    })
}

fn lookup_cb(opcode: u8) -> Option<Op> {
    use ControlFlags as F;
    use Mode::*;
    Some(match opcode {
        0x00 => op("rlc\tb", Implied, F::empty()),
        0x01 => op("rlc\tc", Implied, F::empty()),
        0x02 => op("rlc\td", Implied, F::empty()),
        0x03 => op("rlc\te", Implied, F::empty()),
        0x04 => op("rlc\th", Implied, F::empty()),
        0x05 => op("rlc\tl", Implied, F::empty()),
        0x06 => op("rlc\t(hl)", Implied, F::empty()),
        0x07 => op("rlc\ta", Implied, F::empty()),
        0x08 => op("rrc\tb", Implied, F::empty()),
        0x09 => op("rrc\tc", Implied, F::empty()),
        0x0a => op("rrc\td", Implied, F::empty()),
        0x0b => op("rrc\te", Implied, F::empty()),
        0x0c => op("rrc\th", Implied, F::empty()),
        0x0d => op("rrc\tl", Implied, F::empty()),
        0x0e => op("rrc\t(hl)", Implied, F::empty()),
        0x0f => op("rrc\ta", Implied, F::empty()),
        0x10 => op("rl\tb", Implied, F::empty()),
        0x11 => op("rl\tc", Implied, F::empty()),
        0x12 => op("rl\td", Implied, F::empty()),
        0x13 => op("rl\te", Implied, F::empty()),
        0x14 => op("rl\th", Implied, F::empty()),
        0x15 => op("rl\tl", Implied, F::empty()),
        0x16 => op("rl\t(hl)", Implied, F::empty()),
        0x17 => op("rl\ta", Implied, F::empty()),
        0x18 => op("rr\tb", Implied, F::empty()),
        0x19 => op("rr\tc", Implied, F::empty()),
        0x1a => op("rr\td", Implied, F::empty()),
        0x1b => op("rr\te", Implied, F::empty()),
        0x1c => op("rr\th", Implied, F::empty()),
        0x1d => op("rr\tl", Implied, F::empty()),
        0x1e => op("rr\t(hl)", Implied, F::empty()),
        0x1f => op("rr\ta", Implied, F::empty()),
        0x20 => op("sla\tb", Implied, F::empty()),
        0x21 => op("sla\tc", Implied, F::empty()),
        0x22 => op("sla\td", Implied, F::empty()),
        0x23 => op("sla\te", Implied, F::empty()),
        0x24 => op("sla\th", Implied, F::empty()),
        0x25 => op("sla\tl", Implied, F::empty()),
        0x26 => op("sla\t(hl)", Implied, F::empty()),
        0x27 => op("sla\ta", Implied, F::empty()),
        0x28 => op("sra\tb", Implied, F::empty()),
        0x29 => op("sra\tc", Implied, F::empty()),
        0x2a => op("sra\td", Implied, F::empty()),
        0x2b => op("sra\te", Implied, F::empty()),
        0x2c => op("sra\th", Implied, F::empty()),
        0x2d => op("sra\tl", Implied, F::empty()),
        0x2e => op("sra\t(hl)", Implied, F::empty()),
        0x2f => op("sra\ta", Implied, F::empty()),
        0x38 => op("srl\tb", Implied, F::empty()),
        0x39 => op("srl\tc", Implied, F::empty()),
        0x3a => op("srl\td", Implied, F::empty()),
        0x3b => op("srl\te", Implied, F::empty()),
        0x3c => op("srl\th", Implied, F::empty()),
        0x3d => op("srl\tl", Implied, F::empty()),
        0x3e => op("srl\t(hl)", Implied, F::empty()),
        0x3f => op("srl\ta", Implied, F::empty()),
        0x40 => op("bit\t0,b", Implied, F::empty()),
        0x41 => op("bit\t0,c", Implied, F::empty()),
        0x42 => op("bit\t0,d", Implied, F::empty()),
        0x43 => op("bit\t0,e", Implied, F::empty()),
        0x44 => op("bit\t0,h", Implied, F::empty()),
        0x45 => op("bit\t0,l", Implied, F::empty()),
        0x46 => op("bit\t0,(hl)", Implied, F::empty()),
        0x47 => op("bit\t0,a", Implied, F::empty()),
        0x48 => op("bit\t1,b", Implied, F::empty()),
        0x49 => op("bit\t1,c", Implied, F::empty()),
        0x4a => op("bit\t1,d", Implied, F::empty()),
        0x4b => op("bit\t1,e", Implied, F::empty()),
        0x4c => op("bit\t1,h", Implied, F::empty()),
        0x4d => op("bit\t1,l", Implied, F::empty()),
        0x4e => op("bit\t1,(hl)", Implied, F::empty()),
        0x4f => op("bit\t1,a", Implied, F::empty()),
        0x50 => op("bit\t2,b", Implied, F::empty()),
        0x51 => op("bit\t2,c", Implied, F::empty()),
        0x52 => op("bit\t2,d", Implied, F::empty()),
        0x53 => op("bit\t2,e", Implied, F::empty()),
        0x54 => op("bit\t2,h", Implied, F::empty()),
        0x55 => op("bit\t2,l", Implied, F::empty()),
        0x56 => op("bit\t2,(hl)", Implied, F::empty()),
        0x57 => op("bit\t2,a", Implied, F::empty()),
        0x58 => op("bit\t3,b", Implied, F::empty()),
        0x59 => op("bit\t3,c", Implied, F::empty()),
        0x5a => op("bit\t3,d", Implied, F::empty()),
        0x5b => op("bit\t3,e", Implied, F::empty()),
        0x5c => op("bit\t3,h", Implied, F::empty()),
        0x5d => op("bit\t3,l", Implied, F::empty()),
        0x5e => op("bit\t3,(hl)", Implied, F::empty()),
        0x5f => op("bit\t3,a", Implied, F::empty()),
        0x60 => op("bit\t4,b", Implied, F::empty()),
        0x61 => op("bit\t4,c", Implied, F::empty()),
        0x62 => op("bit\t4,d", Implied, F::empty()),
        0x63 => op("bit\t4,e", Implied, F::empty()),
        0x64 => op("bit\t4,h", Implied, F::empty()),
        0x65 => op("bit\t4,l", Implied, F::empty()),
        0x66 => op("bit\t4,(hl)", Implied, F::empty()),
        0x67 => op("bit\t4,a", Implied, F::empty()),
        0x68 => op("bit\t5,b", Implied, F::empty()),
        0x69 => op("bit\t5,c", Implied, F::empty()),
        0x6a => op("bit\t5,d", Implied, F::empty()),
        0x6b => op("bit\t5,e", Implied, F::empty()),
        0x6c => op("bit\t5,h", Implied, F::empty()),
        0x6d => op("bit\t5,l", Implied, F::empty()),
        0x6e => op("bit\t5,(hl)", Implied, F::empty()),
        0x6f => op("bit\t5,a", Implied, F::empty()),
        0x70 => op("bit\t6,b", Implied, F::empty()),
        0x71 => op("bit\t6,c", Implied, F::empty()),
        0x72 => op("bit\t6,d", Implied, F::empty()),
        0x73 => op("bit\t6,e", Implied, F::empty()),
        0x74 => op("bit\t6,h", Implied, F::empty()),
        0x75 => op("bit\t6,l", Implied, F::empty()),
        0x76 => op("bit\t6,(hl)", Implied, F::empty()),
        0x77 => op("bit\t6,a", Implied, F::empty()),
        0x78 => op("bit\t7,b", Implied, F::empty()),
        0x79 => op("bit\t7,c", Implied, F::empty()),
        0x7a => op("bit\t7,d", Implied, F::empty()),
        0x7b => op("bit\t7,e", Implied, F::empty()),
        0x7c => op("bit\t7,h", Implied, F::empty()),
        0x7d => op("bit\t7,l", Implied, F::empty()),
        0x7e => op("bit\t7,(hl)", Implied, F::empty()),
        0x7f => op("bit\t7,a", Implied, F::empty()),
        0x80 => op("res\t0,b", Implied, F::empty()),
        0x81 => op("res\t0,c", Implied, F::empty()),
        0x82 => op("res\t0,d", Implied, F::empty()),
        0x83 => op("res\t0,e", Implied, F::empty()),
        0x84 => op("res\t0,h", Implied, F::empty()),
        0x85 => op("res\t0,l", Implied, F::empty()),
        0x86 => op("res\t0,(hl)", Implied, F::empty()),
        0x87 => op("res\t0,a", Implied, F::empty()),
        0x88 => op("res\t1,b", Implied, F::empty()),
        0x89 => op("res\t1,c", Implied, F::empty()),
        0x8a => op("res\t1,d", Implied, F::empty()),
        0x8b => op("res\t1,e", Implied, F::empty()),
        0x8c => op("res\t1,h", Implied, F::empty()),
        0x8d => op("res\t1,l", Implied, F::empty()),
        0x8e => op("res\t1,(hl)", Implied, F::empty()),
        0x8f => op("res\t1,a", Implied, F::empty()),
        0x90 => op("res\t2,b", Implied, F::empty()),
        0x91 => op("res\t2,c", Implied, F::empty()),
        0x92 => op("res\t2,d", Implied, F::empty()),
        0x93 => op("res\t2,e", Implied, F::empty()),
        0x94 => op("res\t2,h", Implied, F::empty()),
        0x95 => op("res\t2,l", Implied, F::empty()),
        0x96 => op("res\t2,(hl)", Implied, F::empty()),
        0x97 => op("res\t2,a", Implied, F::empty()),
        0x98 => op("res\t3,b", Implied, F::empty()),
        0x99 => op("res\t3,c", Implied, F::empty()),
        0x9a => op("res\t3,d", Implied, F::empty()),
        0x9b => op("res\t3,e", Implied, F::empty()),
        0x9c => op("res\t3,h", Implied, F::empty()),
        0x9d => op("res\t3,l", Implied, F::empty()),
        0x9e => op("res\t3,(hl)", Implied, F::empty()),
        0x9f => op("res\t3,a", Implied, F::empty()),
        0xa0 => op("res\t4,b", Implied, F::empty()),
        0xa1 => op("res\t4,c", Implied, F::empty()),
        0xa2 => op("res\t4,d", Implied, F::empty()),
        0xa3 => op("res\t4,e", Implied, F::empty()),
        0xa4 => op("res\t4,h", Implied, F::empty()),
        0xa5 => op("res\t4,l", Implied, F::empty()),
        0xa6 => op("res\t4,(hl)", Implied, F::empty()),
        0xa7 => op("res\t4,a", Implied, F::empty()),
        0xa8 => op("res\t5,b", Implied, F::empty()),
        0xa9 => op("res\t5,c", Implied, F::empty()),
        0xaa => op("res\t5,d", Implied, F::empty()),
        0xab => op("res\t5,e", Implied, F::empty()),
        0xac => op("res\t5,h", Implied, F::empty()),
        0xad => op("res\t5,l", Implied, F::empty()),
        0xae => op("res\t5,(hl)", Implied, F::empty()),
        0xaf => op("res\t5,a", Implied, F::empty()),
        0xb0 => op("res\t6,b", Implied, F::empty()),
        0xb1 => op("res\t6,c", Implied, F::empty()),
        0xb2 => op("res\t6,d", Implied, F::empty()),
        0xb3 => op("res\t6,e", Implied, F::empty()),
        0xb4 => op("res\t6,h", Implied, F::empty()),
        0xb5 => op("res\t6,l", Implied, F::empty()),
        0xb6 => op("res\t6,(hl)", Implied, F::empty()),
        0xb7 => op("res\t6,a", Implied, F::empty()),
        0xb8 => op("res\t7,b", Implied, F::empty()),
        0xb9 => op("res\t7,c", Implied, F::empty()),
        0xba => op("res\t7,d", Implied, F::empty()),
        0xbb => op("res\t7,e", Implied, F::empty()),
        0xbc => op("res\t7,h", Implied, F::empty()),
        0xbd => op("res\t7,l", Implied, F::empty()),
        0xbe => op("res\t7,(hl)", Implied, F::empty()),
        0xbf => op("res\t7,a", Implied, F::empty()),
        0xc0 => op("set\t0,b", Implied, F::empty()),
        0xc1 => op("set\t0,c", Implied, F::empty()),
        0xc2 => op("set\t0,d", Implied, F::empty()),
        0xc3 => op("set\t0,e", Implied, F::empty()),
        0xc4 => op("set\t0,h", Implied, F::empty()),
        0xc5 => op("set\t0,l", Implied, F::empty()),
        0xc6 => op("set\t0,(hl)", Implied, F::empty()),
        0xc7 => op("set\t0,a", Implied, F::empty()),
        0xc8 => op("set\t1,b", Implied, F::empty()),
        0xc9 => op("set\t1,c", Implied, F::empty()),
        0xca => op("set\t1,d", Implied, F::empty()),
        0xcb => op("set\t1,e", Implied, F::empty()),
        0xcc => op("set\t1,h", Implied, F::empty()),
        0xcd => op("set\t1,l", Implied, F::empty()),
        0xce => op("set\t1,(hl)", Implied, F::empty()),
        0xcf => op("set\t1,a", Implied, F::empty()),
        0xd0 => op("set\t2,b", Implied, F::empty()),
        0xd1 => op("set\t2,c", Implied, F::empty()),
        0xd2 => op("set\t2,d", Implied, F::empty()),
        0xd3 => op("set\t2,e", Implied, F::empty()),
        0xd4 => op("set\t2,h", Implied, F::empty()),
        0xd5 => op("set\t2,l", Implied, F::empty()),
        0xd6 => op("set\t2,(hl)", Implied, F::empty()),
        0xd7 => op("set\t2,a", Implied, F::empty()),
        0xd8 => op("set\t3,b", Implied, F::empty()),
        0xd9 => op("set\t3,c", Implied, F::empty()),
        0xda => op("set\t3,d", Implied, F::empty()),
        0xdb => op("set\t3,e", Implied, F::empty()),
        0xdc => op("set\t3,h", Implied, F::empty()),
        0xdd => op("set\t3,l", Implied, F::empty()),
        0xde => op("set\t3,(hl)", Implied, F::empty()),
        0xdf => op("set\t3,a", Implied, F::empty()),
        0xe0 => op("set\t4,b", Implied, F::empty()),
        0xe1 => op("set\t4,c", Implied, F::empty()),
        0xe2 => op("set\t4,d", Implied, F::empty()),
        0xe3 => op("set\t4,e", Implied, F::empty()),
        0xe4 => op("set\t4,h", Implied, F::empty()),
        0xe5 => op("set\t4,l", Implied, F::empty()),
        0xe6 => op("set\t4,(hl)", Implied, F::empty()),
        0xe7 => op("set\t4,a", Implied, F::empty()),
        0xe8 => op("set\t5,b", Implied, F::empty()),
        0xe9 => op("set\t5,c", Implied, F::empty()),
        0xea => op("set\t5,d", Implied, F::empty()),
        0xeb => op("set\t5,e", Implied, F::empty()),
        0xec => op("set\t5,h", Implied, F::empty()),
        0xed => op("set\t5,l", Implied, F::empty()),
        0xee => op("set\t5,(hl)", Implied, F::empty()),
        0xef => op("set\t5,a", Implied, F::empty()),
        0xf0 => op("set\t6,b", Implied, F::empty()),
        0xf1 => op("set\t6,c", Implied, F::empty()),
        0xf2 => op("set\t6,d", Implied, F::empty()),
        0xf3 => op("set\t6,e", Implied, F::empty()),
        0xf4 => op("set\t6,h", Implied, F::empty()),
        0xf5 => op("set\t6,l", Implied, F::empty()),
        0xf6 => op("set\t6,(hl)", Implied, F::empty()),
        0xf7 => op("set\t6,a", Implied, F::empty()),
        0xf8 => op("set\t7,b", Implied, F::empty()),
        0xf9 => op("set\t7,c", Implied, F::empty()),
        0xfa => op("set\t7,d", Implied, F::empty()),
        0xfb => op("set\t7,e", Implied, F::empty()),
        0xfc => op("set\t7,h", Implied, F::empty()),
        0xfd => op("set\t7,l", Implied, F::empty()),
        0xfe => op("set\t7,(hl)", Implied, F::empty()),
        0xff => op("set\t7,a", Implied, F::empty()),
        _ => return None,
    })
}

fn lookup_ed(opcode: u8) -> Option<Op> {
    use ControlFlags as F;
    use Mode::*;
    Some(match opcode {
        0x40 => op("in\tb,(c)", Implied, F::empty()),
        0x41 => op("out\t(c),b", Implied, F::empty()),
        0x42 => op("sbc\thl,bc", Implied, F::empty()),
        0x43 => op("ld\t({}),bc", Word, F::empty()),
        0x44 => op("neg", Implied, F::empty()),
        0x45 => op("retn", Implied, F::ABSOLUTE),
        0x46 => op("im\t0", Implied, F::empty()),
        0x47 => op("ld\ti,a", Implied, F::empty()),
        0x48 => op("in\tc,(c)", Implied, F::empty()),
        0x49 => op("out\t(c),c", Implied, F::empty()),
        0x4a => op("adc\thl,bc", Implied, F::empty()),
        0x4b => op("ld\tbc,({})", Word, F::empty()),
        0x4d => op("reti", Implied, F::ABSOLUTE),
        0x4f => op("ld\tr,a", Implied, F::empty()),
        0x50 => op("in\td,(c)", Implied, F::empty()),
        0x51 => op("out\t(c),d", Implied, F::empty()),
        0x52 => op("sbc\thl,de", Implied, F::empty()),
        0x53 => op("ld\t({}),de", Word, F::empty()),
        0x56 => op("im\t1", Implied, F::empty()),
        0x57 => op("ld\ta,i", Implied, F::empty()),
        0x58 => op("in\te,(c)", Implied, F::empty()),
        0x59 => op("out\t(c),e", Implied, F::empty()),
        0x5a => op("adc\thl,de", Implied, F::empty()),
        0x5b => op("ld\tde,({})", Word, F::empty()),
        0x5e => op("im\t2", Implied, F::empty()),
        0x5f => op("ld\ta,r", Implied, F::empty()),
        0x60 => op("in\th,(c)", Implied, F::empty()),
        0x61 => op("out\t(c),h", Implied, F::empty()),
        0x62 => op("sbc\thl,hl", Implied, F::empty()),
        0x67 => op("rrd", Implied, F::empty()),
        0x68 => op("in\tl,(c)", Implied, F::empty()),
        0x69 => op("out\t(c),l", Implied, F::empty()),
        0x6a => op("adc\thl,hl", Implied, F::empty()),
        0x6f => op("rld", Implied, F::empty()),
        0x72 => op("sbc\thl,sp", Implied, F::empty()),
        0x73 => op("ld\t({}),sp", Word, F::empty()),
        0x78 => op("in\ta,(c)", Implied, F::empty()),
        0x79 => op("out\t(c),a", Implied, F::empty()),
        0x7a => op("adc\thl,sp", Implied, F::empty()),
        0x7b => op("ld\tsp,({})", Word, F::empty()),
        0xa0 => op("ldi", Implied, F::empty()),
        0xa1 => op("cpi", Implied, F::empty()),
        0xa2 => op("ini", Implied, F::empty()),
        0xa3 => op("outi", Implied, F::empty()),
        0xa8 => op("ldd", Implied, F::empty()),
        0xa9 => op("cpd", Implied, F::empty()),
        0xaa => op("ind", Implied, F::empty()),
        0xab => op("outd", Implied, F::empty()),
        0xb0 => op("ldir", Implied, F::empty()),
        0xb1 => op("cpir", Implied, F::empty()),
        0xb2 => op("inir", Implied, F::empty()),
        0xb3 => op("otir", Implied, F::empty()),
        0xb8 => op("lddr", Implied, F::empty()),
        0xb9 => op("cpdr", Implied, F::empty()),
        0xba => op("indr", Implied, F::empty()),
        0xbb => op("otdr", Implied, F::empty()),
        _ => return None,
    })
}

fn lookup_dd(opcode: u8) -> Option<Op> {
    use ControlFlags as F;
    use Mode::*;
    Some(match opcode {
        0x09 => op("add\tix,bc", Implied, F::empty()),
        0x19 => op("add\tix,de", Implied, F::empty()),
        0x21 => op("ld\tix,{}", Word, F::empty()),
        0x22 => op("ld\t({}),ix", Word, F::empty()),
        0x23 => op("inc\tix", Implied, F::empty()),
        0x24 => op("inc\tixh", Implied, F::empty()),
        0x25 => op("dec\tixh", Implied, F::empty()),
        0x26 => op("ld\tixh,{}", Byte, F::empty()),
        0x29 => op("add\tix,ix", Implied, F::empty()),
        0x2a => op("ld\tix,({})", Word, F::empty()),
        0x2b => op("dec\tix", Implied, F::empty()),
        0x2c => op("inc\tixl", Implied, F::empty()),
        0x2d => op("dec\tixl", Implied, F::empty()),
        0x2e => op("ld\tixl,{}", Byte, F::empty()),
        0x34 => op("inc\t(ix{})", Disp, F::empty()),
        0x35 => op("dec\t(ix{})", Disp, F::empty()),
        0x36 => op("ld\t(ix{}),{}", DispThenByte, F::empty()),
        0x39 => op("add\tix,sp", Implied, F::empty()),
        0x44 => op("ld\tb,ixh", Implied, F::empty()),
        0x45 => op("ld\tb,ixl", Implied, F::empty()),
        0x46 => op("ld\tb,(ix{})", Disp, F::empty()),
        0x4c => op("ld\tc,ixh", Implied, F::empty()),
        0x4d => op("ld\tc,ixl", Implied, F::empty()),
        0x4e => op("ld\tc,(ix{})", Disp, F::empty()),
        0x54 => op("ld\td,ixh", Implied, F::empty()),
        0x55 => op("ld\td,ixl", Implied, F::empty()),
        0x56 => op("ld\td,(ix{})", Disp, F::empty()),
        0x5c => op("ld\te,ixh", Implied, F::empty()),
        0x5d => op("ld\te,ixl", Implied, F::empty()),
        0x5e => op("ld\te,(ix{})", Disp, F::empty()),
        0x60 => op("ld\tixh,b", Implied, F::empty()),
        0x61 => op("ld\tixh,c", Implied, F::empty()),
        0x62 => op("ld\tixh,d", Implied, F::empty()),
        0x63 => op("ld\tixh,e", Implied, F::empty()),
        0x66 => op("ld\th,(ix{})", Disp, F::empty()),
        0x67 => op("ld\tixh,a", Implied, F::empty()),
        0x68 => op("ld\tixl,b", Implied, F::empty()),
        0x69 => op("ld\tixl,c", Implied, F::empty()),
        0x6a => op("ld\tixl,d", Implied, F::empty()),
        0x6b => op("ld\tixl,e", Implied, F::empty()),
        0x6e => op("ld\tl,(ix{})", Disp, F::empty()),
        0x6f => op("ld\tixl,a", Implied, F::empty()),
        0x70 => op("ld\t(ix{}),b", Disp, F::empty()),
        0x71 => op("ld\t(ix{}),c", Disp, F::empty()),
        0x72 => op("ld\t(ix{}),d", Disp, F::empty()),
        0x73 => op("ld\t(ix{}),e", Disp, F::empty()),
        0x74 => op("ld\t(ix{}),h", Disp, F::empty()),
        0x75 => op("ld\t(ix{}),l", Disp, F::empty()),
        0x77 => op("ld\t(ix{}),a", Disp, F::empty()),
        0x7c => op("ld\ta,ixh", Implied, F::empty()),
        0x7d => op("ld\ta,ixl", Implied, F::empty()),
        0x7e => op("ld\ta,(ix{})", Disp, F::empty()),
        0x84 => op("add\ta,ixh", Implied, F::empty()),
        0x85 => op("add\ta,ixl", Implied, F::empty()),
        0x86 => op("add\ta,(ix{})", Disp, F::empty()),
        0x8c => op("adc\ta,ixh", Implied, F::empty()),
        0x8d => op("adc\ta,ixl", Implied, F::empty()),
        0x8e => op("adc\ta,(ix{})", Disp, F::empty()),
        0x94 => op("sub\tixh", Implied, F::empty()),
        0x95 => op("sub\tixl", Implied, F::empty()),
        0x96 => op("sub\t(ix{})", Disp, F::empty()),
        0x9c => op("sbc\ta,ixh", Implied, F::empty()),
        0x9d => op("sbc\ta,ixl", Implied, F::empty()),
        0x9e => op("sbc\ta,(ix{})", Disp, F::empty()),
        0xa4 => op("and\tixh", Implied, F::empty()),
        0xa5 => op("and\tixl", Implied, F::empty()),
        0xa6 => op("and\t(ix{})", Disp, F::empty()),
        0xac => op("xor\tixh", Implied, F::empty()),
        0xad => op("xor\tixl", Implied, F::empty()),
        0xae => op("xor\t(ix{})", Disp, F::empty()),
        0xb4 => op("or\tixh", Implied, F::empty()),
        0xb5 => op("or\tixl", Implied, F::empty()),
        0xb6 => op("or\t(ix{})", Disp, F::empty()),
        0xbc => op("cp\tixh", Implied, F::empty()),
        0xbd => op("cp\tixl", Implied, F::empty()),
        0xbe => op("cp\t(ix{})", Disp, F::empty()),
        0xe1 => op("pop\tix", Implied, F::empty()),
        0xe3 => op("ex\t(sp),ix", Implied, F::empty()),
        0xe5 => op("push\tix", Implied, F::empty()),
        0xe9 => op("jp\t(ix)", Implied, F::ABSOLUTE),
        0xf9 => op("ld\tsp,ix", Implied, F::empty()),
        _ => return None,
    })
}

fn lookup_fd(opcode: u8) -> Option<Op> {
    use ControlFlags as F;
    use Mode::*;
    Some(match opcode {
        0x09 => op("add\tiy,bc", Implied, F::empty()),
        0x19 => op("add\tiy,de", Implied, F::empty()),
        0x21 => op("ld\tiy,{}", Word, F::empty()),
        0x22 => op("ld\t({}),iy", Word, F::empty()),
        0x23 => op("inc\tiy", Implied, F::empty()),
        0x24 => op("inc\tiyh", Implied, F::empty()),
        0x25 => op("dec\tiyh", Implied, F::empty()),
        0x26 => op("ld\tiyh,{}", Byte, F::empty()),
        0x29 => op("add\tiy,iy", Implied, F::empty()),
        0x2a => op("ld\tiy,({})", Word, F::empty()),
        0x2b => op("dec\tiy", Implied, F::empty()),
        0x2c => op("inc\tiyl", Implied, F::empty()),
        0x2d => op("dec\tiyl", Implied, F::empty()),
        0x2e => op("ld\tiyl,{}", Byte, F::empty()),
        0x34 => op("inc\t(iy{})", Disp, F::empty()),
        0x35 => op("dec\t(iy{})", Disp, F::empty()),
        0x36 => op("ld\t(iy{}),{}", DispThenByte, F::empty()),
        0x39 => op("add\tiy,sp", Implied, F::empty()),
        0x44 => op("ld\tb,iyh", Implied, F::empty()),
        0x45 => op("ld\tb,iyl", Implied, F::empty()),
        0x46 => op("ld\tb,(iy{})", Disp, F::empty()),
        0x4c => op("ld\tc,iyh", Implied, F::empty()),
        0x4d => op("ld\tc,iyl", Implied, F::empty()),
        0x4e => op("ld\tc,(iy{})", Disp, F::empty()),
        0x54 => op("ld\td,iyh", Implied, F::empty()),
        0x55 => op("ld\td,iyl", Implied, F::empty()),
        0x56 => op("ld\td,(iy{})", Disp, F::empty()),
        0x5c => op("ld\te,iyh", Implied, F::empty()),
        0x5d => op("ld\te,iyl", Implied, F::empty()),
        0x5e => op("ld\te,(iy{})", Disp, F::empty()),
        0x60 => op("ld\tiyh,b", Implied, F::empty()),
        0x61 => op("ld\tiyh,c", Implied, F::empty()),
        0x62 => op("ld\tiyh,d", Implied, F::empty()),
        0x63 => op("ld\tiyh,e", Implied, F::empty()),
        0x66 => op("ld\th,(iy{})", Disp, F::empty()),
        0x67 => op("ld\tiyh,a", Implied, F::empty()),
        0x68 => op("ld\tiyl,b", Implied, F::empty()),
        0x69 => op("ld\tiyl,c", Implied, F::empty()),
        0x6a => op("ld\tiyl,d", Implied, F::empty()),
        0x6b => op("ld\tiyl,e", Implied, F::empty()),
        0x6e => op("ld\tl,(iy{})", Disp, F::empty()),
        0x6f => op("ld\tiyl,a", Implied, F::empty()),
        0x70 => op("ld\t(iy{}),b", Disp, F::empty()),
        0x71 => op("ld\t(iy{}),c", Disp, F::empty()),
        0x72 => op("ld\t(iy{}),d", Disp, F::empty()),
        0x73 => op("ld\t(iy{}),e", Disp, F::empty()),
        0x74 => op("ld\t(iy{}),h", Disp, F::empty()),
        0x75 => op("ld\t(iy{}),l", Disp, F::empty()),
        0x77 => op("ld\t(iy{}),a", Disp, F::empty()),
        0x7c => op("ld\ta,iyh", Implied, F::empty()),
        0x7d => op("ld\ta,iyl", Implied, F::empty()),
        0x7e => op("ld\ta,(iy{})", Disp, F::empty()),
        0x84 => op("add\ta,iyh", Implied, F::empty()),
        0x85 => op("add\ta,iyl", Implied, F::empty()),
        0x86 => op("add\ta,(iy{})", Disp, F::empty()),
        0x8c => op("adc\ta,iyh", Implied, F::empty()),
        0x8d => op("adc\ta,iyl", Implied, F::empty()),
        0x8e => op("adc\ta,(iy{})", Disp, F::empty()),
        0x94 => op("sub\tiyh", Implied, F::empty()),
        0x95 => op("sub\tiyl", Implied, F::empty()),
        0x96 => op("sub\t(iy{})", Disp, F::empty()),
        0x9c => op("sbc\ta,iyh", Implied, F::empty()),
        0x9d => op("sbc\ta,iyl", Implied, F::empty()),
        0x9e => op("sbc\ta,(iy{})", Disp, F::empty()),
        0xa4 => op("and\tiyh", Implied, F::empty()),
        0xa5 => op("and\tiyl", Implied, F::empty()),
        0xa6 => op("and\t(iy{})", Disp, F::empty()),
        0xac => op("xor\tiyh", Implied, F::empty()),
        0xad => op("xor\tiyl", Implied, F::empty()),
        0xae => op("xor\t(iy{})", Disp, F::empty()),
        0xb4 => op("or\tiyh", Implied, F::empty()),
        0xb5 => op("or\tiyl", Implied, F::empty()),
        0xb6 => op("or\t(iy{})", Disp, F::empty()),
        0xbc => op("cp\tiyh", Implied, F::empty()),
        0xbd => op("cp\tiyl", Implied, F::empty()),
        0xbe => op("cp\t(iy{})", Disp, F::empty()),
        0xe1 => op("pop\tiy", Implied, F::empty()),
        0xe3 => op("ex\t(sp),iy", Implied, F::empty()),
        0xe5 => op("push\tiy", Implied, F::empty()),
        0xe9 => op("jp\t(iy)", Implied, F::ABSOLUTE),
        0xf9 => op("ld\tsp,iy", Implied, F::empty()),
        _ => return None,
    })
}

/// The `DDCB`/`FDCB` pages: opcode -> template. Unlike every other page
/// the displacement byte is fetched before this opcode, so there is no
/// `Mode` here, just a template with the one placeholder for it.
fn lookup_ddcb(opcode: u8) -> Option<&'static str> {
    Some(match opcode {
        0x06 => "rlc\t(ix{})",
        0x0e => "rrc\t(ix{})",
        0x16 => "rl\t(ix{})",
        0x1e => "rr\t(ix{})",
        0x26 => "sla\t(ix{})",
        0x2e => "sra\t(ix{})",
        0x3e => "srl\t(ix{})",
        0x46 => "bit\t0,(ix{})",
        0x4e => "bit\t1,(ix{})",
        0x56 => "bit\t2,(ix{})",
        0x5e => "bit\t3,(ix{})",
        0x66 => "bit\t4,(ix{})",
        0x6e => "bit\t5,(ix{})",
        0x76 => "bit\t6,(ix{})",
        0x7e => "bit\t7,(ix{})",
        0x86 => "res\t0,(ix{})",
        0x8e => "res\t1,(ix{})",
        0x96 => "res\t2,(ix{})",
        0x9e => "res\t3,(ix{})",
        0xa6 => "res\t4,(ix{})",
        0xae => "res\t5,(ix{})",
        0xb6 => "res\t6,(ix{})",
        0xbe => "res\t7,(ix{})",
        0xc6 => "set\t0,(ix{})",
        0xce => "set\t1,(ix{})",
        0xd6 => "set\t2,(ix{})",
        0xde => "set\t3,(ix{})",
        0xe6 => "set\t4,(ix{})",
        0xee => "set\t5,(ix{})",
        0xf6 => "set\t6,(ix{})",
        0xfe => "set\t7,(ix{})",
        _ => return None,
    })
}

fn lookup_fdcb(opcode: u8) -> Option<&'static str> {
    Some(match opcode {
        0x06 => "rlc\t(iy{})",
        0x0e => "rrc\t(iy{})",
        0x16 => "rl\t(iy{})",
        0x1e => "rr\t(iy{})",
        0x26 => "sla\t(iy{})",
        0x2e => "sra\t(iy{})",
        0x3e => "srl\t(iy{})",
        0x46 => "bit\t0,(iy{})",
        0x4e => "bit\t1,(iy{})",
        0x56 => "bit\t2,(iy{})",
        0x5e => "bit\t3,(iy{})",
        0x66 => "bit\t4,(iy{})",
        0x6e => "bit\t5,(iy{})",
        0x76 => "bit\t6,(iy{})",
        0x7e => "bit\t7,(iy{})",
        0x86 => "res\t0,(iy{})",
        0x8e => "res\t1,(iy{})",
        0x96 => "res\t2,(iy{})",
        0x9e => "res\t3,(iy{})",
        0xa6 => "res\t4,(iy{})",
        0xae => "res\t5,(iy{})",
        0xb6 => "res\t6,(iy{})",
        0xbe => "res\t7,(iy{})",
        0xc6 => "set\t0,(iy{})",
        0xce => "set\t1,(iy{})",
        0xd6 => "set\t2,(iy{})",
        0xde => "set\t3,(iy{})",
        0xe6 => "set\t4,(iy{})",
        0xee => "set\t5,(iy{})",
        0xf6 => "set\t6,(iy{})",
        0xfe => "set\t7,(iy{})",
        _ => return None,
    })
}

pub struct Z80;

impl Z80 {
    fn decode_entry(ctx: &mut DecodeCtx, entry: Op) -> Decoded {
        let branch = entry.flags.contains(ControlFlags::BRANCH);
        let operands: Vec<String> = match entry.mode {
            Mode::Implied => Vec::new(),
            Mode::Byte => vec![hex_byte(ctx.image.fetch8())],
            Mode::Word => {
                let addr = ctx.image.fetch16_le() as usize;
                vec![word_operand(ctx, addr, branch)]
            }
            Mode::Rel => {
                let disp = ctx.image.fetch8() as i8;
                vec![relative_operand(ctx, disp)]
            }
            Mode::Disp => {
                let disp = ctx.image.fetch8() as i8;
                vec![signed_byte(disp)]
            }
            Mode::DispThenByte => {
                let disp = ctx.image.fetch8() as i8;
                let n = ctx.image.fetch8();
                vec![signed_byte(disp), hex_byte(n)]
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

    fn decode_xdcb(ctx: &mut DecodeCtx, table: fn(u8) -> Option<&'static str>) -> Decoded {
        let disp = ctx.image.fetch8() as i8;
        let opcode = ctx.image.fetch8();
        match table(opcode) {
            Some(tmpl) => Decoded::new(render(tmpl, &[signed_byte(disp)]), ControlFlags::empty()),
            None => Decoded::undecodable(),
        }
    }
}

impl InstructionDecoder for Z80 {
    fn decode(ctx: &mut DecodeCtx, base: usize) -> Decoded {
        ctx.image.seek(base);
        let opcode = ctx.image.fetch8();
        match opcode {
            0xcb => Self::decode_page(ctx, lookup_cb),
            0xed => Self::decode_page(ctx, lookup_ed),
            0xdd => {
                if ctx.image.peek8(ctx.image.tell()) == 0xcb {
                    ctx.image.fetch8();
                    Self::decode_xdcb(ctx, lookup_ddcb)
                } else {
                    Self::decode_page(ctx, lookup_dd)
                }
            }
            0xfd => {
                if ctx.image.peek8(ctx.image.tell()) == 0xcb {
                    ctx.image.fetch8();
                    Self::decode_xdcb(ctx, lookup_fdcb)
                } else {
                    Self::decode_page(ctx, lookup_fd)
                }
            }
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
        let d = Z80::decode(&mut ctx, start);
        let len = ctx.image.tell() - start;
        (d, len)
    }

    #[test]
    fn implied_nop() {
        let (d, len) = decode_at(&[0x00], 0, 1);
        assert_eq!(d.text, "nop");
        assert_eq!(len, 1);
    }

    #[test]
    fn byte_literal_forces_leading_zero_above_9f() {
        let (d, _) = decode_at(&[0xc6, 0xaf], 0, 2);
        assert_eq!(d.text, "add\ta,0afh");
        let (d2, _) = decode_at(&[0xc6, 0x05], 0, 2);
        assert_eq!(d2.text, "add\ta,05h");
    }

    #[test]
    fn jp_nn_is_absolute_and_marks_jump_label() {
        let mut image = Image::new(0x10000);
        image.load(0, &[0xc3, 0x00, 0x10]).unwrap();
        let mut attr = AttributeMap::new(0x10000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, 0, 3);
        let d = Z80::decode(&mut ctx, 0);
        assert_eq!(d.text, "jp\tL0010");
        assert!(ctx.attr.is_jump_label(0x0010));
    }

    #[test]
    fn relative_jr_wraps_and_marks_jump_label() {
        let (d, len) = decode_at(&[0x18, 0xfe], 0, 2);
        assert_eq!(d.text, "jr\tL0000");
        assert_eq!(len, 2);
        assert!(d.flags.contains(ControlFlags::ABSOLUTE));
    }

    #[test]
    fn dd_prefix_indexed_with_displacement() {
        let (d, len) = decode_at(&[0xdd, 0x34, 0x05], 0, 3);
        assert_eq!(d.text, "inc\t(ix+05h)");
        assert_eq!(len, 3);
    }

    #[test]
    fn dd_prefix_negative_displacement() {
        let (d, _) = decode_at(&[0xdd, 0x34, 0xfb], 0, 3);
        assert_eq!(d.text, "inc\t(ix-05h)");
    }

    #[test]
    fn undocumented_ixh_half_register_op() {
        let (d, _) = decode_at(&[0xdd, 0x24], 0, 2);
        assert_eq!(d.text, "inc\tixh");
    }

    #[test]
    fn ddcb_displacement_is_fetched_before_suffix_opcode() {
        // DD CB <disp> <suffix-opcode>: RLC (IX+d)
        let (d, len) = decode_at(&[0xdd, 0xcb, 0x02, 0x06], 0, 4);
        assert_eq!(d.text, "rlc\t(ix+02h)");
        assert_eq!(len, 4);
    }

    #[test]
    fn fdcb_bit_test_on_iy_displacement() {
        let (d, len) = decode_at(&[0xfd, 0xcb, 0x00, 0x46], 0, 4);
        assert_eq!(d.text, "bit\t0,(iy+00h)");
        assert_eq!(len, 4);
    }

    #[test]
    fn ddcb_undefined_suffix_opcode_is_undecodable() {
        let (d, len) = decode_at(&[0xdd, 0xcb, 0x00, 0x00], 0, 4);
        assert!(d.is_undecodable());
        assert_eq!(len, 4);
    }

    #[test]
    fn cb_prefix_bit_test() {
        let (d, len) = decode_at(&[0xcb, 0x41], 0, 2);
        assert_eq!(d.text, "bit\t0,c");
        assert_eq!(len, 2);
    }

    #[test]
    fn ed_prefix_block_instruction() {
        let (d, len) = decode_at(&[0xed, 0xb0], 0, 2);
        assert_eq!(d.text, "ldir");
        assert_eq!(len, 2);
    }

    #[test]
    fn unassigned_opcode_is_undecodable() {
        let (d, len) = decode_at(&[0xed, 0xff], 0, 2);
        assert!(d.is_undecodable());
        assert_eq!(len, 2);
    }
}
