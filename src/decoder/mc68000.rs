//! MC68000 instruction decoder.
//!
//! Unlike the 8-bit ISAs this crate otherwise supports, the 68000's
//! opcode map is not practically enumerable as a flat dispatch table:
//! its ~64K opcode words resolve through a handful of overlapping
//! bitfields (mode/register effective-address pairs, size, condition
//! code) that recur across dozens of instruction families. Decoding
//! here mirrors that structure directly: each family is a function that
//! extracts its own fields from the opcode and either matches or
//! declines, tried in the same precedence the reference table
//! construction resolves collisions (later-registered families shadow
//! earlier ones on any shared encoding, so the ambiguous families are
//! tried first here).
//!
//! Effective-address text shares one decoder (`decode_ea`) across every
//! family that takes a standard 12-mode operand; only the immediate
//! mode (mode 7, register 4) is excluded since its size varies by
//! instruction and is handled by the caller.

use super::{ControlFlags, DecodeCtx, Decoded, InstructionDecoder};

const BCC_NAMES: [&str; 16] = [
    "bra", "bsr", "bhi", "bls", "bcc", "bcs", "bne", "beq", "bvc", "bvs", "bpl", "bmi", "bge",
    "blt", "bgt", "ble",
];
const SCC_NAMES: [&str; 16] = [
    "st", "sf", "shi", "sls", "scc", "scs", "sne", "seq", "svc", "svs", "spl", "smi", "sge",
    "slt", "sgt", "sle",
];
const DBCC_NAMES: [&str; 16] = [
    "dbt", "dbra", "dbhi", "dbls", "dbcc", "dbcs", "dbne", "dbeq", "dbvc", "dbvs", "dbpl", "dbmi",
    "dbge", "dblt", "dbgt", "dble",
];

/// Abort the enclosing family with an undecodable result once a reserved
/// sub-encoding (a brief extension word with full-extension bits set, a
/// register-list mode with no valid effective address) surfaces after
/// the family has already committed to owning this opcode.
macro_rules! require {
    ($e:expr) => {
        match $e {
            Some(v) => v,
            None => return Some(Decoded::undecodable()),
        }
    };
}

/// Fold mode 7's register field into the addressing-mode family's own
/// `ea` numbering (7=abs.w, 8=abs.l, 9=pc-disp, 10=pc-index, 11=immediate).
fn resolve_ea(mode: u8, reg: u8) -> u8 {
    if mode == 7 {
        7 + reg
    } else {
        mode
    }
}

fn displacement_text(ctx: &mut DecodeCtx) -> String {
    let raw = ctx.image.fetch16_be() as i16;
    if raw < 0 {
        format!("-${:04x}", -(raw as i32))
    } else {
        format!("${raw:04x}")
    }
}

/// Short branch displacement: the low byte of the opcode word itself,
/// already consumed by the caller's opcode fetch.
fn relative8_text(ctx: &mut DecodeCtx, opcode: u16) -> String {
    let disp = (opcode & 0xff) as u8 as i8 as i64;
    let ea = ((ctx.image.tell() as i64 + disp) & 0xffffff) as usize;
    ctx.attr.mark_jump_label(ea);
    format!("L{ea:06x}")
}

fn relative16_text(ctx: &mut DecodeCtx, is_branch: bool) -> String {
    let raw = ctx.image.fetch16_be() as i16;
    let base = ctx.image.tell() as i64;
    let ea = ((base + raw as i64) & 0xffffff) as usize;
    if is_branch {
        ctx.attr.mark_jump_label(ea);
    } else {
        ctx.attr.mark_data_label(ea);
    }
    format!("L{ea:06x}")
}

/// Long branch: base is the address of the displacement word itself
/// (captured before the fetch), not the address past it.
fn branch16_text(ctx: &mut DecodeCtx) -> String {
    let base = ctx.image.tell() as i64;
    let raw = ctx.image.fetch16_be() as i16;
    let ea = ((base + raw as i64) & 0xffffff) as usize;
    ctx.attr.mark_jump_label(ea);
    let suffix = if (-0x80..0x80).contains(&raw) { ".w" } else { "" };
    format!("{suffix}\tL{ea:06x}")
}

/// Brief-extension-word indexed addressing. Returns `None` when the
/// full-extension-word bits are set, a reserved encoding this
/// disassembler does not decode.
fn index_operand(ctx: &mut DecodeCtx, base: &str) -> Option<String> {
    let operand = ctx.image.fetch16_be();
    if operand & 0x700 != 0 {
        return None;
    }
    let disp = operand as u8 as i8 as i32;
    let reg_letter = if operand & 0x8000 != 0 { 'a' } else { 'd' };
    let reg_num = (operand >> 12) & 7;
    let size_suffix = if operand & 0x0800 != 0 { ".l" } else { ".w" };
    let reg = format!("{reg_letter}{reg_num}{size_suffix}");
    Some(if disp != 0 {
        if disp < 0 {
            format!("(-${:02x},{base},{reg})", -disp)
        } else {
            format!("(${disp:02x},{base},{reg})")
        }
    } else {
        format!("({base},{reg})")
    })
}

fn in_loaded_range(ctx: &DecodeCtx, addr: usize) -> bool {
    addr >= ctx.start && addr <= ctx.end
}

fn absolute16_text(ctx: &mut DecodeCtx, is_branch: bool) -> String {
    let raw = ctx.image.fetch16_be() as i16 as i32;
    let ea = (raw & 0xffffff) as usize;
    if !in_loaded_range(ctx, ea) {
        return if raw < 0 {
            format!("(-${:04x})", -raw)
        } else {
            format!("(${raw:04x})")
        };
    }
    if is_branch {
        ctx.attr.mark_jump_label(ea);
    } else {
        ctx.attr.mark_data_label(ea);
    }
    format!("(L{ea:06x}).w")
}

fn absolute32_text(ctx: &mut DecodeCtx, is_branch: bool) -> String {
    let operand = ctx.image.fetch32_be();
    let ea = (operand & 0xffffff) as usize;
    if !in_loaded_range(ctx, ea) {
        let suffix = if ea < 0x8000 || ea >= 0xff8000 { ".l" } else { "" };
        return format!("(${operand:08x}){suffix}");
    }
    if is_branch {
        ctx.attr.mark_jump_label(ea);
    } else {
        ctx.attr.mark_data_label(ea);
    }
    format!("(L{ea:06x})")
}

fn immediate8_text(ctx: &mut DecodeCtx) -> String {
    format!("#${:02x}", ctx.image.fetch16_be() & 0xff)
}

/// `pflag` marks a 16-bit immediate loaded into an address register as a
/// plausible pointer, so when it lands inside the loaded image it's
/// rendered (and marked) as a data label instead of a bare literal. The
/// candidate address clears bit 15 and sign-extends only into bits
/// 16-23, not true two's-complement sign extension (that's what
/// `absolute16_text`/`absolute32_text` use instead).
fn immediate16_text(ctx: &mut DecodeCtx, pflag: bool) -> String {
    let operand = ctx.image.fetch16_be();
    let signed = operand as i32;
    let address = (((operand as u32) & 0x7fff) | ((-(signed & 0x8000)) as u32 & 0xff0000)) as usize;
    if pflag && address >= ctx.start && address <= ctx.end {
        ctx.attr.mark_data_label(address);
        return format!("#L{address:06x}");
    }
    format!("#${operand:04x}")
}

fn immediate32_text(ctx: &mut DecodeCtx, pflag: bool) -> String {
    let operand = ctx.image.fetch32_be();
    let address = (operand & 0xffffff) as usize;
    if pflag && address >= ctx.start && address <= ctx.end {
        ctx.attr.mark_data_label(address);
        return format!("#L{address:06x}");
    }
    format!("#${operand:08x}")
}

/// Decode a standard 12-mode effective address. `ea` 11 (immediate) is
/// not handled here since its fetch width depends on the instruction;
/// callers resolve it themselves before falling back to this.
fn decode_ea(ctx: &mut DecodeCtx, mode: u8, reg: u8, is_branch: bool) -> Option<String> {
    match resolve_ea(mode, reg) {
        0 => Some(format!("d{reg}")),
        1 => Some(format!("a{reg}")),
        2 => Some(format!("(a{reg})")),
        3 => Some(format!("(a{reg})+")),
        4 => Some(format!("-(a{reg})")),
        5 => Some(format!("({},a{reg})", displacement_text(ctx))),
        6 => index_operand(ctx, &format!("a{reg}")),
        7 => Some(absolute16_text(ctx, is_branch)),
        8 => Some(absolute32_text(ctx, is_branch)),
        9 => Some(format!("({},pc)", relative16_text(ctx, is_branch))),
        10 => index_operand(ctx, "pc"),
        _ => None,
    }
}

/// Register-list text for MOVEM. The bit-to-register mapping is
/// reversed for every addressing mode except predecrement, where the
/// mask already reads MSB-first.
fn register_list_text(ctx: &mut DecodeCtx, raw_mode: u8) -> String {
    let mask = ctx.image.fetch16_be();
    let bit = |i: usize| -> bool {
        if raw_mode == 4 {
            (mask >> (15 - i)) & 1 != 0
        } else {
            (mask >> i) & 1 != 0
        }
    };
    let mut regs = Vec::new();
    let mut prev = false;
    let mut start = 0usize;
    for i in 0..=8 {
        let c = i < 8 && bit(i);
        if c && !prev {
            start = i;
        }
        if !c && prev {
            if i - start > 1 {
                regs.push(format!("d{start}-d{}", i - 1));
            } else {
                regs.push(format!("d{start}"));
            }
        }
        prev = c;
    }
    prev = false;
    for j in 0..=8 {
        let i = 8 + j;
        let c = j < 8 && bit(i);
        if c && !prev {
            start = j;
        }
        if !c && prev {
            if j - start > 1 {
                regs.push(format!("a{start}-a{}", j - 1));
            } else {
                regs.push(format!("a{start}"));
            }
        }
        prev = c;
    }
    regs.join("/")
}

/// The combined MOVEM form (memory-to-register-list): the register
/// mask is fetched before the effective address's own extension words,
/// but the effective address renders first in the output text.
fn movem_combined_text(ctx: &mut DecodeCtx, ea_raw: u8, n: u8) -> Option<String> {
    let regs = register_list_text(ctx, ea_raw);
    let ea_str = decode_ea(ctx, ea_raw, n, false)?;
    Some(format!("{ea_str},{regs}"))
}

#[derive(Clone, Copy)]
enum ImmKind {
    B,
    W,
    L,
}

fn ea_or_immediate(
    ctx: &mut DecodeCtx,
    ea_mode: u8,
    y: u8,
    ea: u8,
    imm: Option<ImmKind>,
) -> Option<String> {
    if ea == 11 {
        let kind = imm?;
        Some(match kind {
            ImmKind::B => immediate8_text(ctx),
            ImmKind::W => immediate16_text(ctx, false),
            ImmKind::L => immediate32_text(ctx, false),
        })
    } else {
        decode_ea(ctx, ea_mode, y, false)
    }
}

fn standard_text(
    ctx: &mut DecodeCtx,
    mnemonic: &str,
    op: u8,
    x: u16,
    ea_mode: u8,
    y: u8,
    ea: u8,
    imm: Option<ImmKind>,
) -> Option<String> {
    let ea_str = ea_or_immediate(ctx, ea_mode, y, ea, imm)?;
    Some(match op {
        0 => format!("{mnemonic}.b\t{ea_str},d{x}"),
        1 => format!("{mnemonic}.w\t{ea_str},d{x}"),
        2 => format!("{mnemonic}.l\t{ea_str},d{x}"),
        3 => format!("{mnemonic}a.w\t{ea_str},a{x}"),
        4 => format!("{mnemonic}.b\td{x},{ea_str}"),
        5 => format!("{mnemonic}.w\td{x},{ea_str}"),
        6 => format!("{mnemonic}.l\td{x},{ea_str}"),
        7 => format!("{mnemonic}a.l\t{ea_str},a{x}"),
        _ => unreachable!(),
    })
}

fn try_fixed(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    match opcode {
        0x003c => Some(Decoded::new(
            format!("ori.b\t{},ccr", immediate8_text(ctx)),
            ControlFlags::empty(),
        )),
        0x007c => Some(Decoded::new(
            format!("ori.w\t{},sr", immediate16_text(ctx, false)),
            ControlFlags::empty(),
        )),
        0x023c => Some(Decoded::new(
            format!("andi.b\t{},ccr", immediate8_text(ctx)),
            ControlFlags::empty(),
        )),
        0x027c => Some(Decoded::new(
            format!("andi.w\t{},sr", immediate16_text(ctx, false)),
            ControlFlags::empty(),
        )),
        0x0a3c => Some(Decoded::new(
            format!("eori.b\t{},ccr", immediate8_text(ctx)),
            ControlFlags::empty(),
        )),
        0x0a7c => Some(Decoded::new(
            format!("eori.w\t{},sr", immediate16_text(ctx, false)),
            ControlFlags::empty(),
        )),
        0x4afc => Some(Decoded::new("illegal", ControlFlags::empty())),
        0x4e70 => Some(Decoded::new("reset", ControlFlags::empty())),
        0x4e71 => Some(Decoded::new("nop", ControlFlags::empty())),
        0x4e72 => Some(Decoded::new(
            format!("stop\t{}", immediate16_text(ctx, false)),
            ControlFlags::empty(),
        )),
        0x4e73 => Some(Decoded::new("rte", ControlFlags::ABSOLUTE)),
        0x4e75 => Some(Decoded::new("rts", ControlFlags::ABSOLUTE)),
        0x4e76 => Some(Decoded::new("trapv", ControlFlags::empty())),
        0x4e77 => Some(Decoded::new("rtr", ControlFlags::ABSOLUTE)),
        _ if opcode & 0xf000 == 0x6000 && opcode & 0xff == 0 => {
            let cc = ((opcode >> 8) & 0xf) as usize;
            let flags = if cc == 0 {
                ControlFlags::ABSOLUTE | ControlFlags::BRANCH
            } else {
                ControlFlags::BRANCH
            };
            Some(Decoded::new(
                format!("{}{}", BCC_NAMES[cc], branch16_text(ctx)),
                flags,
            ))
        }
        _ => None,
    }
}

fn try_move(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    let top = (opcode >> 12) & 0xf;
    if top != 1 && top != 2 && top != 3 {
        return None;
    }
    let i = opcode & 0xfff;
    let x = (i >> 9) & 7;
    let dst_mode = ((i >> 6) & 7) as u8;
    let src_mode = ((i >> 3) & 7) as u8;
    let y = (i & 7) as u8;
    let dst_ea = resolve_ea(dst_mode, x as u8);
    let src_ea = resolve_ea(src_mode, y);
    if dst_ea >= 9 || src_ea >= 12 {
        return None;
    }
    if top == 1 && (dst_ea == 1 || src_ea == 1) {
        return None;
    }
    let size_text = match top {
        1 => "b",
        3 => "w",
        2 => "l",
        _ => unreachable!(),
    };
    let is_movea = dst_ea == 1;
    let src_text = if src_ea == 11 {
        match size_text {
            "b" => immediate8_text(ctx),
            "w" => immediate16_text(ctx, is_movea),
            "l" => immediate32_text(ctx, is_movea),
            _ => unreachable!(),
        }
    } else {
        require!(decode_ea(ctx, src_mode, y, false))
    };
    let dst_text = require!(decode_ea(ctx, dst_mode, x as u8, false));
    let mnemonic = if is_movea {
        format!("movea.{size_text}")
    } else {
        format!("move.{size_text}")
    };
    let mut flags = ControlFlags::empty();
    if is_movea && src_ea == 11 {
        flags |= ControlFlags::IMMEDIATE_ADDR;
    }
    Some(Decoded::new(format!("{mnemonic}\t{src_text},{dst_text}"), flags))
}

fn try_standard(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    let top = opcode & 0xf000;
    if !matches!(top, 0x8000 | 0x9000 | 0xb000 | 0xc000 | 0xd000) {
        return None;
    }
    let i = opcode & 0xfff;
    let x = (i >> 9) & 7;
    let op = ((i >> 6) & 7) as u8;
    let ea_mode = ((i >> 3) & 7) as u8;
    let y = (i & 7) as u8;
    let ea = resolve_ea(ea_mode, y);
    let limit = [12u8, 12, 12, 12, 9, 9, 9, 12][op as usize];
    if ea >= limit {
        return None;
    }
    let imm_kind = match op {
        0 | 4 => Some(ImmKind::B),
        1 | 3 | 5 => Some(ImmKind::W),
        2 | 6 | 7 => Some(ImmKind::L),
        _ => None,
    };
    match top {
        0x8000 => {
            if op != 3 && op != 7 && ea != 1 && !(op >= 4 && op < 7 && ea == 0) {
                let text = require!(standard_text(ctx, "or", op, x, ea_mode, y, ea, imm_kind));
                return Some(Decoded::new(text, ControlFlags::empty()));
            }
            if op == 3 || op == 7 {
                let ea_str = require!(ea_or_immediate(ctx, ea_mode, y, ea, Some(ImmKind::W)));
                let text = if op == 3 {
                    format!("divu.w\t{ea_str},d{x}")
                } else {
                    format!("divs.w\t{ea_str},d{x}")
                };
                return Some(Decoded::new(text, ControlFlags::empty()));
            }
            None
        }
        0x9000 => {
            if (op == 0 && ea == 1) || (op >= 4 && op < 7 && ea < 2) {
                return None;
            }
            let text = require!(standard_text(ctx, "sub", op, x, ea_mode, y, ea, imm_kind));
            Some(Decoded::new(text, ControlFlags::empty()))
        }
        0xb000 => {
            if !(op == 0 && ea == 1) && !(op >= 4 && op < 7) {
                let text = require!(standard_text(ctx, "cmp", op, x, ea_mode, y, ea, imm_kind));
                return Some(Decoded::new(text, ControlFlags::empty()));
            }
            if op >= 4 && op < 7 && ea != 1 {
                let text = require!(standard_text(ctx, "eor", op, x, ea_mode, y, ea, imm_kind));
                return Some(Decoded::new(text, ControlFlags::empty()));
            }
            None
        }
        0xc000 => {
            if op != 3 && op != 7 && ea != 1 && !(op >= 4 && op < 7 && ea == 0) {
                let text = require!(standard_text(ctx, "and", op, x, ea_mode, y, ea, imm_kind));
                return Some(Decoded::new(text, ControlFlags::empty()));
            }
            if op == 3 || op == 7 {
                let ea_str = require!(ea_or_immediate(ctx, ea_mode, y, ea, Some(ImmKind::W)));
                let text = if op == 3 {
                    format!("mulu.w\t{ea_str},d{x}")
                } else {
                    format!("muls.w\t{ea_str},d{x}")
                };
                return Some(Decoded::new(text, ControlFlags::empty()));
            }
            None
        }
        0xd000 => {
            if (op == 0 && ea == 1) || (op >= 4 && op < 7 && ea < 2) {
                return None;
            }
            let text = require!(standard_text(ctx, "add", op, x, ea_mode, y, ea, imm_kind));
            Some(Decoded::new(text, ControlFlags::empty()))
        }
        _ => unreachable!(),
    }
}

fn try_immediate_mem(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    let top = opcode & 0xff00;
    if !matches!(top, 0x0000 | 0x0200 | 0x0400 | 0x0600 | 0x0a00 | 0x0c00) {
        return None;
    }
    let i = opcode & 0xff;
    let size = (i >> 6) & 3;
    let ea_mode = ((i >> 3) & 7) as u8;
    let n = (i & 7) as u8;
    let ea = resolve_ea(ea_mode, n);
    if size == 3 || ea == 1 || ea >= 9 {
        return None;
    }
    let imm_text = match size {
        0 => immediate8_text(ctx),
        1 => immediate16_text(ctx, false),
        2 => immediate32_text(ctx, false),
        _ => unreachable!(),
    };
    let ea_str = require!(decode_ea(ctx, ea_mode, n, false));
    let size_letter = ['b', 'w', 'l'][size as usize];
    let mnemonic = match top {
        0x0000 => "ori",
        0x0200 => "andi",
        0x0400 => "subi",
        0x0600 => "addi",
        0x0a00 => "eori",
        0x0c00 => "cmpi",
        _ => unreachable!(),
    };
    Some(Decoded::new(
        format!("{mnemonic}.{size_letter}\t{imm_text},{ea_str}"),
        ControlFlags::empty(),
    ))
}

fn try_addq_subq(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    if opcode & 0xf000 != 0x5000 {
        return None;
    }
    let i = opcode & 0xfff;
    let data_raw = (i >> 9) & 7;
    let size = (i >> 6) & 3;
    let ea_mode = ((i >> 3) & 7) as u8;
    let n = (i & 7) as u8;
    let ea = resolve_ea(ea_mode, n);
    if size == 3 || ea >= 9 {
        return None;
    }
    if size == 0 && ea == 1 {
        return None;
    }
    let is_sub = (i >> 8) & 1 != 0;
    let data = if data_raw == 0 { 8 } else { data_raw };
    let ea_str = require!(decode_ea(ctx, ea_mode, n, false));
    let size_letter = ['b', 'w', 'l'][size as usize];
    let mnemonic = if is_sub { "subq" } else { "addq" };
    Some(Decoded::new(
        format!("{mnemonic}.{size_letter}\t#{data},{ea_str}"),
        ControlFlags::empty(),
    ))
}

fn try_moveq(opcode: u16) -> Option<Decoded> {
    if opcode & 0xf000 != 0x7000 {
        return None;
    }
    let data = (opcode & 0xff) as u8 as i8 as i32;
    let reg = (opcode >> 9) & 7;
    let text = if data >= 0 {
        format!("moveq.l\t#${data:02x},d{reg}")
    } else {
        format!("moveq.l\t#-${:02x},d{reg}", -data)
    };
    Some(Decoded::new(text, ControlFlags::empty()))
}

fn try_single_operand(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    let base = opcode & 0xff00;
    if !matches!(base & 0xfe00, 0x4000 | 0x4200 | 0x4400 | 0x4600 | 0x4800 | 0x4a00)
        && !(0x5000..=0x5f00).contains(&base)
    {
        return None;
    }
    let i = opcode & 0xff;
    let size = (i >> 6) & 3;
    let ea_mode = ((i >> 3) & 7) as u8;
    let n = (i & 7) as u8;
    let ea = resolve_ea(ea_mode, n);
    if ea == 1 || ea >= 9 {
        return None;
    }
    let size_letter = |s: u16| ['b', 'w', 'l'][s as usize];
    match base {
        0x4000 if size < 3 => {
            let t = require!(decode_ea(ctx, ea_mode, n, false));
            Some(Decoded::new(format!("negx.{}\t{t}", size_letter(size)), ControlFlags::empty()))
        }
        0x4200 if size < 3 => {
            let t = require!(decode_ea(ctx, ea_mode, n, false));
            Some(Decoded::new(format!("clr.{}\t{t}", size_letter(size)), ControlFlags::empty()))
        }
        0x4400 if size < 3 => {
            let t = require!(decode_ea(ctx, ea_mode, n, false));
            Some(Decoded::new(format!("neg.{}\t{t}", size_letter(size)), ControlFlags::empty()))
        }
        0x4600 if size < 3 => {
            let t = require!(decode_ea(ctx, ea_mode, n, false));
            Some(Decoded::new(format!("not.{}\t{t}", size_letter(size)), ControlFlags::empty()))
        }
        0x4800 if size == 0 => {
            let t = require!(decode_ea(ctx, ea_mode, n, false));
            Some(Decoded::new(format!("nbcd.b\t{t}"), ControlFlags::empty()))
        }
        0x4a00 if size < 3 => {
            let t = require!(decode_ea(ctx, ea_mode, n, false));
            Some(Decoded::new(format!("tst.{}\t{t}", size_letter(size)), ControlFlags::empty()))
        }
        0x4a00 if size == 3 => {
            let t = require!(decode_ea(ctx, ea_mode, n, false));
            Some(Decoded::new(format!("tas.b\t{t}"), ControlFlags::empty()))
        }
        _ if (0x5000..=0x5f00).contains(&base) && size == 3 => {
            let cc = ((base >> 8) & 0xf) as usize;
            let t = require!(decode_ea(ctx, ea_mode, n, false));
            Some(Decoded::new(format!("{}.b\t{t}", SCC_NAMES[cc]), ControlFlags::empty()))
        }
        _ => None,
    }
}

fn try_shift_rotate(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    if opcode & 0xf000 != 0xe000 {
        return None;
    }
    let i = opcode & 0xfff;
    let y = (i >> 9) & 7;
    let dr = (i >> 8) & 1;
    let size = (i >> 6) & 3;
    let n = (i & 7) as u8;
    let str_dr_size = ["r.b", "r.w", "r.l", "r.w", "l.b", "l.w", "l.l", "l.w"][(dr * 4 + size) as usize];
    if size < 3 {
        let is_reg_count = (i >> 5) & 1 != 0;
        let src = if is_reg_count {
            format!("d{y}")
        } else {
            format!("#{}", if y == 0 { 8 } else { y })
        };
        let variant = (i >> 3) & 3;
        let mnemonic = ["as", "ls", "rox", "ro"][variant as usize];
        Some(Decoded::new(format!("{mnemonic}{str_dr_size}\t{src},d{n}"), ControlFlags::empty()))
    } else {
        if y >= 4 {
            return None;
        }
        let ea_mode = ((i >> 3) & 7) as u8;
        let ea = resolve_ea(ea_mode, n);
        if ea < 2 || ea >= 9 {
            return None;
        }
        let mnemonic = ["as", "ls", "rox", "ro"][y as usize];
        let t = require!(decode_ea(ctx, ea_mode, n, false));
        Some(Decoded::new(format!("{mnemonic}{str_dr_size}\t{t}"), ControlFlags::empty()))
    }
}

fn try_bit_manip(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    if opcode & 0xf000 != 0 {
        return None;
    }
    let i = opcode & 0xfff;
    let y = (i >> 9) & 7;
    let dyn_ = (i >> 8) & 1 != 0;
    let op = (i >> 6) & 3;
    let ea_mode = ((i >> 3) & 7) as u8;
    let n = (i & 7) as u8;
    let ea = resolve_ea(ea_mode, n);
    if (!dyn_ && y != 4) || ea == 1 || ea >= 9 {
        return None;
    }
    let mnemonic = ["btst", "bchg", "bclr", "bset"][op as usize];
    let size_letter = if ea == 0 { 'l' } else { 'b' };
    let src = if dyn_ { format!("d{y}") } else { immediate8_text(ctx) };
    let ea_str = require!(decode_ea(ctx, ea_mode, n, false));
    Some(Decoded::new(
        format!("{mnemonic}.{size_letter}\t{src},{ea_str}"),
        ControlFlags::empty(),
    ))
}

fn try_branch(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    let top_nibble = opcode & 0xf000;
    let i = opcode & 0xff;
    if top_nibble == 0x6000 && i != 0 {
        let cc = ((opcode >> 8) & 0xf) as usize;
        let text = relative8_text(ctx, opcode);
        let flags = if cc == 0 {
            ControlFlags::ABSOLUTE | ControlFlags::BRANCH
        } else {
            ControlFlags::BRANCH
        };
        return Some(Decoded::new(format!("{}\t{text}", BCC_NAMES[cc]), flags));
    }
    if top_nibble == 0x5000 && (i >> 3) & 0x1f == 0x19 {
        let n = i & 7;
        let cc = ((opcode >> 8) & 0xf) as usize;
        let text = relative16_text(ctx, true);
        return Some(Decoded::new(
            format!("{}\td{n},{text}", DBCC_NAMES[cc]),
            ControlFlags::BRANCH,
        ));
    }
    None
}

fn try_jmp_jsr_lea_pea_movem(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    let base = opcode & 0xffc0;
    let i = opcode & 0x3f;
    let ea_raw = ((i >> 3) & 7) as u8;
    let n = (i & 7) as u8;
    let ea = resolve_ea(ea_raw, n);
    if ea < 2 || ea >= 11 {
        return None;
    }
    match base {
        0x41c0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("lea.l\t{t},a0"), ControlFlags::empty()))
        }
        0x43c0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("lea.l\t{t},a1"), ControlFlags::empty()))
        }
        0x45c0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("lea.l\t{t},a2"), ControlFlags::empty()))
        }
        0x47c0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("lea.l\t{t},a3"), ControlFlags::empty()))
        }
        0x4840 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("pea.l\t{t}"), ControlFlags::empty()))
        }
        0x4880 if ea != 3 && ea < 9 => {
            let regs = register_list_text(ctx, ea_raw);
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("movem.w\t{regs},{t}"), ControlFlags::empty()))
        }
        0x48c0 if ea != 3 && ea < 9 => {
            let regs = register_list_text(ctx, ea_raw);
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("movem.l\t{regs},{t}"), ControlFlags::empty()))
        }
        0x49c0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("lea.l\t{t},a4"), ControlFlags::empty()))
        }
        0x4bc0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("lea.l\t{t},a5"), ControlFlags::empty()))
        }
        0x4c80 if ea != 4 => {
            let t = require!(movem_combined_text(ctx, ea_raw, n));
            Some(Decoded::new(format!("movem.w\t{t}"), ControlFlags::empty()))
        }
        0x4cc0 if ea != 4 => {
            let t = require!(movem_combined_text(ctx, ea_raw, n));
            Some(Decoded::new(format!("movem.l\t{t}"), ControlFlags::empty()))
        }
        0x4dc0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("lea.l\t{t},a6"), ControlFlags::empty()))
        }
        0x4fc0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("lea.l\t{t},a7"), ControlFlags::empty()))
        }
        0x4e80 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("jsr\t{t}"), ControlFlags::BRANCH))
        }
        0x4ec0 if ea != 3 && ea != 4 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("jmp\t{t}"), ControlFlags::ABSOLUTE | ControlFlags::BRANCH))
        }
        _ => None,
    }
}

fn try_addx_group(opcode: u16) -> Option<Decoded> {
    let top = opcode & 0xf000;
    if !matches!(top, 0x8000 | 0x9000 | 0xb000 | 0xc000 | 0xd000) {
        return None;
    }
    let i = opcode & 0xfff;
    if i & 0x130 != 0x100 {
        return None;
    }
    let x = (i >> 9) & 7;
    let size = (i >> 6) & 3;
    let rm = (i >> 3) & 1 != 0;
    let y = i & 7;
    let str_rm = if rm {
        format!("-(a{y}),-(a{x})")
    } else {
        format!("d{y},d{x}")
    };
    match top {
        0x8000 if size == 0 => Some(Decoded::new(format!("sbcd.b\t{str_rm}"), ControlFlags::empty())),
        0x9000 if size < 3 => Some(Decoded::new(
            format!("subx.{}\t{str_rm}", ['b', 'w', 'l'][size as usize]),
            ControlFlags::empty(),
        )),
        0xb000 if size < 3 && rm => Some(Decoded::new(
            format!("cmpm.{}\t(a{y})+,(a{x})+", ['b', 'w', 'l'][size as usize]),
            ControlFlags::empty(),
        )),
        0xc000 if size == 0 => Some(Decoded::new(format!("abcd.b\t{str_rm}"), ControlFlags::empty())),
        0xd000 if size < 3 => Some(Decoded::new(
            format!("addx.{}\t{str_rm}", ['b', 'w', 'l'][size as usize]),
            ControlFlags::empty(),
        )),
        _ => None,
    }
}

fn match_low3(opcode: u16, base: u16) -> Option<u8> {
    if opcode & !0x7 == base {
        Some((opcode & 7) as u8)
    } else {
        None
    }
}

fn try_misc_loop1(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    let top = opcode & 0xf000;
    let i = opcode & 0xfff;
    let x = (i >> 9) & 7;
    let ea_raw = ((i >> 3) & 7) as u8;
    let y = (i & 7) as u8;
    let ea = resolve_ea(ea_raw, y);
    if top == 0x0000 {
        let sub6 = (i >> 3) & 0x3f;
        return match sub6 {
            0x21 => {
                let d = displacement_text(ctx);
                Some(Decoded::new(format!("movep.w\t({d},a{y}),d{x}"), ControlFlags::empty()))
            }
            0x29 => {
                let d = displacement_text(ctx);
                Some(Decoded::new(format!("movep.l\t({d},a{y}),d{x}"), ControlFlags::empty()))
            }
            0x31 => {
                let d = displacement_text(ctx);
                Some(Decoded::new(format!("movep.w\td{x},({d},a{y})"), ControlFlags::empty()))
            }
            0x39 => {
                let d = displacement_text(ctx);
                Some(Decoded::new(format!("movep.l\td{x},({d},a{y})"), ControlFlags::empty()))
            }
            _ => None,
        };
    }
    if top == 0x4000 {
        if (i >> 6) & 7 == 6 && ea != 1 && ea < 12 {
            let t = if ea == 11 {
                immediate16_text(ctx, false)
            } else {
                require!(decode_ea(ctx, ea_raw, y, false))
            };
            return Some(Decoded::new(format!("chk.w\t{t},d{x}"), ControlFlags::empty()));
        }
        return None;
    }
    if top == 0xc000 {
        let sub6 = (i >> 3) & 0x3f;
        return match sub6 {
            0x28 => Some(Decoded::new(format!("exg.l\td{x},d{y}"), ControlFlags::empty())),
            0x29 => Some(Decoded::new(format!("exg.l\ta{x},a{y}"), ControlFlags::empty())),
            0x31 => Some(Decoded::new(format!("exg.l\td{x},a{y}"), ControlFlags::empty())),
            _ => None,
        };
    }
    None
}

fn try_misc_loop2(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    let base = opcode & 0xffc0;
    let i = opcode & 0x3f;
    let ea_raw = ((i >> 3) & 7) as u8;
    let n = (i & 7) as u8;
    let ea = resolve_ea(ea_raw, n);
    if ea == 1 || ea >= 12 {
        return None;
    }
    match base {
        0x40c0 if ea < 9 => {
            let t = require!(decode_ea(ctx, ea_raw, n, false));
            Some(Decoded::new(format!("move.w\tsr,{t}"), ControlFlags::empty()))
        }
        0x44c0 => {
            let t = if ea == 11 { immediate8_text(ctx) } else { require!(decode_ea(ctx, ea_raw, n, false)) };
            Some(Decoded::new(format!("move.b\t{t},ccr"), ControlFlags::empty()))
        }
        0x46c0 => {
            let t = if ea == 11 { immediate16_text(ctx, false) } else { require!(decode_ea(ctx, ea_raw, n, false)) };
            Some(Decoded::new(format!("move.w\t{t},sr"), ControlFlags::empty()))
        }
        _ => None,
    }
}

fn try_misc(ctx: &mut DecodeCtx, opcode: u16) -> Option<Decoded> {
    if let Some(n) = match_low3(opcode, 0x4840) {
        return Some(Decoded::new(format!("swap.w\td{n}"), ControlFlags::empty()));
    }
    if let Some(n) = match_low3(opcode, 0x4880) {
        return Some(Decoded::new(format!("ext.w\td{n}"), ControlFlags::empty()));
    }
    if let Some(n) = match_low3(opcode, 0x48c0) {
        return Some(Decoded::new(format!("ext.l\td{n}"), ControlFlags::empty()));
    }
    if let Some(n) = match_low3(opcode, 0x4e50) {
        let d = displacement_text(ctx);
        return Some(Decoded::new(format!("link.w\ta{n},#{d}"), ControlFlags::empty()));
    }
    if let Some(n) = match_low3(opcode, 0x4e58) {
        return Some(Decoded::new(format!("unlk\ta{n}"), ControlFlags::empty()));
    }
    if let Some(n) = match_low3(opcode, 0x4e60) {
        return Some(Decoded::new(format!("move.l\ta{n},usp"), ControlFlags::empty()));
    }
    if let Some(n) = match_low3(opcode, 0x4e68) {
        return Some(Decoded::new(format!("move.l\tusp,a{n}"), ControlFlags::empty()));
    }
    if let Some(d) = try_misc_loop2(ctx, opcode) {
        return Some(d);
    }
    if let Some(d) = try_misc_loop1(ctx, opcode) {
        return Some(d);
    }
    None
}

pub struct Mc68000;

impl InstructionDecoder for Mc68000 {
    fn decode(ctx: &mut DecodeCtx, base: usize) -> Decoded {
        ctx.image.seek(base);
        let opcode = ctx.image.fetch16_be();
        if let Some(d) = try_misc(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_addx_group(opcode) {
            return d;
        }
        if let Some(d) = try_jmp_jsr_lea_pea_movem(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_branch(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_bit_manip(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_shift_rotate(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_single_operand(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_moveq(opcode) {
            return d;
        }
        if let Some(d) = try_addq_subq(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_immediate_mem(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_standard(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_move(ctx, opcode) {
            return d;
        }
        if let Some(d) = try_fixed(ctx, opcode) {
            return d;
        }
        Decoded::undecodable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttributeMap;
    use crate::image::Image;

    fn ctx_decode(bytes: &[u8]) -> Decoded {
        let mut image = Image::new(0x1000000);
        image.load(0, bytes).unwrap();
        let mut attr = AttributeMap::new(0x1000000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, 0, bytes.len());
        Mc68000::decode(&mut ctx, 0)
    }

    #[test]
    fn nop_is_implied() {
        let d = ctx_decode(&[0x4e, 0x71]);
        assert_eq!(d.text, "nop");
        assert!(d.flags.is_empty());
    }

    #[test]
    fn rts_is_absolute_terminator() {
        let d = ctx_decode(&[0x4e, 0x75]);
        assert_eq!(d.text, "rts");
        assert_eq!(d.flags, ControlFlags::ABSOLUTE);
    }

    #[test]
    fn move_l_d0_to_d1() {
        // MOVE.L D0,D1: 0010 001 000 000 000 = 0x2200
        let d = ctx_decode(&[0x22, 0x00]);
        assert_eq!(d.text, "move.l\td0,d1");
    }

    #[test]
    fn movea_marks_immediate_as_pointer_when_in_range() {
        // MOVEA.L #$00000004,A0: 0x207c 0000 0004
        let d = ctx_decode(&[0x20, 0x7c, 0x00, 0x00, 0x00, 0x04]);
        assert_eq!(d.text, "movea.l\t#L000004,a0");
        assert_eq!(d.flags, ControlFlags::IMMEDIATE_ADDR);
    }

    #[test]
    fn movea_word_immediate_clears_bit15_instead_of_sign_extending() {
        // MOVEA.W #$8004,A0: 0x307c 8004. The candidate address clears bit
        // 15 and sign-extends only into bits 16-23, so $8004 lands at
        // $ff0004, not the two's-complement $ff8004.
        let bytes = [0x30, 0x7c, 0x80, 0x04];
        let mut image = Image::new(0x1000000);
        image.load(0, &bytes).unwrap();
        let mut attr = AttributeMap::new(0x1000000);
        let mut ctx = DecodeCtx::new(&mut image, &mut attr, 0, 0xff0010);
        let d = Mc68000::decode(&mut ctx, 0);
        assert_eq!(d.text, "movea.w\t#Lff0004,a0");
        assert_eq!(d.flags, ControlFlags::IMMEDIATE_ADDR);
    }

    #[test]
    fn bra_short_marks_jump_label() {
        // BRA +4 (skip 4 bytes past the branch opcode): 0x6004
        let d = ctx_decode(&[0x60, 0x04]);
        assert_eq!(d.text, "bra\tL000006");
        assert_eq!(d.flags, ControlFlags::ABSOLUTE | ControlFlags::BRANCH);
    }

    #[test]
    fn bra_long_form_uses_branch16() {
        // BRA.W +0: 0x6000 0000 (0 displacement, base after word = tell; 0+base=base, i.e. points at the extension word itself)
        let d = ctx_decode(&[0x60, 0x00, 0x00, 0x00]);
        assert_eq!(d.text, "bra.w\tL000002");
        assert_eq!(d.flags, ControlFlags::ABSOLUTE | ControlFlags::BRANCH);
    }

    #[test]
    fn jmp_absolute_long_is_absolute_terminator() {
        // JMP ($000004).L: mode=111,reg=001 -> ea=8 ; opcode base 0x4ec0|i, i = (7<<3)|1 = 0x39
        // target chosen inside the loaded range so it renders as a label
        let d = ctx_decode(&[0x4e, 0xf9, 0x00, 0x00, 0x00, 0x04]);
        assert_eq!(d.text, "jmp\t(L000004)");
        assert_eq!(d.flags, ControlFlags::ABSOLUTE | ControlFlags::BRANCH);
    }

    #[test]
    fn lea_indexed_reserved_extension_is_undecodable() {
        // LEA (d8,A0,D0.w),A0 but with full-extension bit set -> undecodable
        // opcode 0x41f0 (ea_raw=6,n=0) then extension word with bit8 (0x100) set
        let d = ctx_decode(&[0x41, 0xf0, 0x01, 0x00]);
        assert!(d.is_undecodable());
    }

    #[test]
    fn dbra_decrements_and_branches() {
        // DBRA D0,*+4 : 0x51c8 0002 (disp 2, base after fetch = tell=4, target=6)
        let d = ctx_decode(&[0x51, 0xc8, 0x00, 0x02]);
        assert_eq!(d.text, "dbra\td0,L000006");
        assert_eq!(d.flags, ControlFlags::BRANCH);
    }

    #[test]
    fn movem_registers_to_memory_reverses_mask() {
        // MOVEM.L D0/D1,-(A7): ea_raw=4 (predecrement), n=7 -> opcode 0x48c0|(4<<3|7)=0x48ff? compute: i=(4<<3)|7=0x27
        let d = ctx_decode(&[0x48, 0xe7, 0x80, 0x00]);
        // predecrement: mask read MSB-first (not reversed), bit15=D0,bit14=D1 -> 0x8000 selects D0
        assert_eq!(d.text, "movem.l\td0,-(a7)");
    }

    #[test]
    fn movem_registers_from_memory_combined_form() {
        // MOVEM.L (A0),D0/D1: opcode 0x4cc0|i, ea_raw=2 (indirect), n=0 -> i=0x10
        let d = ctx_decode(&[0x4c, 0xd0, 0x00, 0x03]);
        assert_eq!(d.text, "movem.l\t(a0),d0-d1");
    }

    #[test]
    fn btst_dynamic_bit_number() {
        // BTST D1,D2: dyn=1,op=0,ea=D2 -> opcode 0000 001 1 00 000 010 = 0x0302
        let d = ctx_decode(&[0x03, 0x02]);
        assert_eq!(d.text, "btst.l\td1,d2");
    }

    #[test]
    fn addq_to_address_register_has_no_size_restriction() {
        // ADDQ.L #1,A0: data=1,size=2(L),ea=1(An) -> i=(1<<9)|(2<<6)|(1<<3)|0 = 0x0288; opcode 0x5000|i
        let d = ctx_decode(&[0x52, 0x88]);
        assert_eq!(d.text, "addq.l\t#1,a0");
    }

    #[test]
    fn exg_data_registers() {
        // EXG D3,D5: opcode 1100 011 1 01000 101 = 0xc745
        let d = ctx_decode(&[0xc7, 0x45]);
        assert_eq!(d.text, "exg.l\td3,d5");
    }

    #[test]
    fn unassigned_opcode_is_undecodable() {
        let d = ctx_decode(&[0x4a, 0xfb]);
        assert!(d.is_undecodable());
    }
}
