//! Hint-file parsing and application.
//!
//! Hints come from a `-t` label/annotation file and always take precedence
//! over whatever the discovery pass would otherwise conclude. Each
//! non-empty line starts with a one-letter kind followed by space-
//! separated fields: `b`/`s` classify a byte range, `c` seeds a code
//! entry point, `d` marks a data label, `r` attaches a remark comment,
//! and `t`/`u`/`v` walk a table of pointers, classifying the table bytes
//! and marking what they point to.

use crate::attr::{AttributeMap, ByteClass};
use crate::error::{DisasmError, Result};
use crate::image::Image;
use std::collections::BTreeMap;

/// Byte order used when a hint's pointer table is read back out of the
/// image (the table format is architecture-neutral; the endianness and
/// entry width are not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// How `t`/`u`/`v` entries are laid out for a given architecture.
#[derive(Debug, Clone, Copy)]
pub enum PointerFormat {
    /// Two-byte pointer, `stride` bytes between successive entries (2 for
    /// `t`/`u`, 3 for `v`, where the third byte of each `v` entry is left
    /// unclassified).
    TwoByte { endian: Endian, stride: usize },
    /// 68000 form: 4-byte entries, the low 3 bytes of which are a 24-bit
    /// big-endian address; all 4 bytes are classified as pointer data.
    ThreeOfFour,
}

/// Parsed hints: per-address remarks, plus whether any hint seeded a code
/// entry point (so the discovery pass's default-seed rule knows to stand
/// down).
#[derive(Debug, Default)]
pub struct HintStore {
    remarks: BTreeMap<usize, Vec<String>>,
    pub entry_seeded: bool,
    /// Unrecognized hint kinds, recorded instead of failing the whole
    /// file; the CLI layer logs these as warnings.
    pub unrecognized: Vec<(usize, String)>,
}

impl HintStore {
    pub fn remarks_at(&self, addr: usize) -> &[String] {
        self.remarks.get(&addr).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Parse `text` and apply every hint directly to `attr` (and `image`,
    /// for pointer-table dereferencing).
    pub fn load(
        text: &str,
        image: &Image,
        attr: &mut AttributeMap,
        fmt: PointerFormat,
    ) -> Result<Self> {
        let mut store = HintStore::default();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let words: Vec<&str> = line.split(' ').collect();
            match words[0] {
                "b" => {
                    let (base, size) = parse_base_size(&words, line_no)?;
                    attr.set_hinted_range(base, size, ByteClass::ByteData);
                }
                "s" => {
                    let (base, size) = parse_base_size(&words, line_no)?;
                    attr.set_hinted_range(base, size, ByteClass::String);
                }
                "c" => {
                    let addr = parse_hex_field(&words, 1, line_no)?;
                    attr.mark_jump_label(addr);
                    store.entry_seeded = true;
                }
                "d" => {
                    let addr = parse_hex_field(&words, 1, line_no)?;
                    attr.mark_data_label(addr);
                }
                "r" => {
                    let addr = parse_hex_field(&words, 1, line_no)?;
                    let prefix: usize = words[0].len() + 1 + words.get(1).map_or(0, |w| w.len()) + 1;
                    let text = line.get(prefix..).unwrap_or("").trim_end().to_string();
                    store.remarks.entry(addr).or_default().push(text);
                }
                "t" => {
                    let (base, count) = parse_base_size(&words, line_no)?;
                    apply_pointer_table(image, attr, base, count, fmt, true, &mut store);
                }
                "u" => {
                    let (base, count) = parse_base_size(&words, line_no)?;
                    apply_pointer_table(image, attr, base, count, fmt, false, &mut store);
                }
                "v" => {
                    let (base, count) = parse_base_size(&words, line_no)?;
                    apply_v_table(image, attr, base, count, fmt);
                }
                other => {
                    store.unrecognized.push((line_no + 1, other.to_string()));
                }
            }
        }
        Ok(store)
    }
}

fn parse_hex_field(words: &[&str], idx: usize, line_no: usize) -> Result<usize> {
    let w = words
        .get(idx)
        .ok_or_else(|| DisasmError::MalformedHint {
            line_no: line_no + 1,
            text: words.join(" "),
        })?;
    usize::from_str_radix(w, 16).map_err(|_| DisasmError::InvalidHintField {
        line_no: line_no + 1,
        field: (*w).to_string(),
    })
}

fn parse_base_size(words: &[&str], line_no: usize) -> Result<(usize, usize)> {
    let base = parse_hex_field(words, 1, line_no)?;
    let size = match words.get(2) {
        Some(s) => s.parse::<usize>().map_err(|_| DisasmError::InvalidHintField {
            line_no: line_no + 1,
            field: (*s).to_string(),
        })?,
        None => 1,
    };
    Ok((base, size))
}

fn endian_of(fmt: PointerFormat) -> Endian {
    match fmt {
        PointerFormat::TwoByte { endian, .. } => endian,
        PointerFormat::ThreeOfFour => Endian::Big,
    }
}

fn read_u16(image: &Image, addr: usize, endian: Endian) -> usize {
    let a = image.peek8(addr) as usize;
    let b = image.peek8(addr + 1) as usize;
    match endian {
        Endian::Big => (a << 8) | b,
        Endian::Little => (b << 8) | a,
    }
}

fn read_u24_be(image: &Image, addr: usize) -> usize {
    (image.peek8(addr) as usize) << 16 | (image.peek8(addr + 1) as usize) << 8 | image.peek8(addr + 2) as usize
}

fn apply_pointer_table(
    image: &Image,
    attr: &mut AttributeMap,
    base: usize,
    count: usize,
    fmt: PointerFormat,
    is_jump: bool,
    store: &mut HintStore,
) {
    match fmt {
        PointerFormat::TwoByte { endian, stride } => {
            for n in 0..count {
                let i = base + n * stride;
                attr.set_hinted_range(i, 2, ByteClass::Pointer);
                let target = read_u16(image, i, endian);
                if is_jump {
                    attr.mark_jump_label(target);
                    store.entry_seeded = true;
                } else {
                    attr.mark_data_label(target);
                }
            }
        }
        PointerFormat::ThreeOfFour => {
            for n in 0..count {
                let i = base + n * 4;
                attr.set_hinted_range(i, 4, ByteClass::Pointer);
                let target = read_u24_be(image, i + 1);
                if is_jump {
                    attr.mark_jump_label(target);
                    store.entry_seeded = true;
                } else {
                    attr.mark_data_label(target);
                }
            }
        }
    }
}

fn apply_v_table(image: &Image, attr: &mut AttributeMap, base: usize, count: usize, fmt: PointerFormat) {
    let endian = endian_of(fmt);
    for n in 0..count {
        let i = base + n * 3;
        attr.set_hinted_range(i, 2, ByteClass::Pointer);
        let target = read_u16(image, i, endian);
        attr.mark_data_label(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt_8bit(endian: Endian) -> PointerFormat {
        PointerFormat::TwoByte { endian, stride: 2 }
    }

    #[test]
    fn byte_and_string_hints_classify_range() {
        let mut img = Image::new(0x100);
        img.load(0, &[0u8; 0x20]).unwrap();
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("b 10 4\ns 20 3\n", &img, &mut attr, fmt_8bit(Endian::Big)).unwrap();
        assert!(store.unrecognized.is_empty());
        assert_eq!(attr.class_at(0x10), ByteClass::ByteData);
        assert_eq!(attr.class_at(0x13), ByteClass::ByteData);
        assert_eq!(attr.class_at(0x20), ByteClass::String);
        assert_eq!(attr.class_at(0x22), ByteClass::String);
    }

    #[test]
    fn c_hint_seeds_jump_label() {
        let img = Image::new(0x100);
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("c 1234\n", &img, &mut attr, fmt_8bit(Endian::Big)).unwrap();
        assert!(store.entry_seeded);
        assert!(attr.is_jump_label(0x1234));
    }

    #[test]
    fn d_hint_marks_data_label_only() {
        let img = Image::new(0x100);
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("d 50\n", &img, &mut attr, fmt_8bit(Endian::Big)).unwrap();
        assert!(!store.entry_seeded);
        assert!(attr.is_data_label(0x50));
        assert!(!attr.is_jump_label(0x50));
    }

    #[test]
    fn remark_text_is_recovered_verbatim() {
        let img = Image::new(0x100);
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("r 10 initialize stack\n", &img, &mut attr, fmt_8bit(Endian::Big)).unwrap();
        assert_eq!(store.remarks_at(0x10), &["initialize stack".to_string()]);
    }

    #[test]
    fn t_hint_big_endian_pointer_seeds_jump_label() {
        let mut img = Image::new(0x100);
        img.load(0x10, &[0x12, 0x34]).unwrap();
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("t 10 1\n", &img, &mut attr, fmt_8bit(Endian::Big)).unwrap();
        assert!(store.entry_seeded);
        assert!(attr.is_jump_label(0x1234));
        assert_eq!(attr.class_at(0x10), ByteClass::Pointer);
    }

    #[test]
    fn t_hint_little_endian_pointer() {
        let mut img = Image::new(0x100);
        img.load(0x10, &[0x34, 0x12]).unwrap();
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("t 10 1\n", &img, &mut attr, fmt_8bit(Endian::Little)).unwrap();
        assert!(attr.is_jump_label(0x1234));
    }

    #[test]
    fn u_hint_marks_data_label_not_jump() {
        let mut img = Image::new(0x100);
        img.load(0x10, &[0x00, 0x50]).unwrap();
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("u 10 1\n", &img, &mut attr, fmt_8bit(Endian::Big)).unwrap();
        assert!(!store.entry_seeded);
        assert!(attr.is_data_label(0x50));
    }

    #[test]
    fn v_hint_skips_third_byte_classification() {
        let mut img = Image::new(0x100);
        img.load(0x10, &[0x00, 0x40, 0xff]).unwrap();
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("v 10 1\n", &img, &mut attr, fmt_8bit(Endian::Big)).unwrap();
        assert!(!store.entry_seeded);
        assert!(attr.is_data_label(0x40));
        assert_eq!(attr.class_at(0x10), ByteClass::Pointer);
        assert_eq!(attr.class_at(0x11), ByteClass::Pointer);
        assert_eq!(attr.class_at(0x12), ByteClass::Unknown);
    }

    #[test]
    fn three_of_four_pointer_format_for_68000() {
        let mut img = Image::new(0x1000);
        img.load(0x10, &[0x00, 0x00, 0x04, 0x00]).unwrap();
        let mut attr = AttributeMap::new(0x1000);
        let store = HintStore::load("t 10 1\n", &img, &mut attr, PointerFormat::ThreeOfFour).unwrap();
        assert!(attr.is_jump_label(0x000400));
        assert_eq!(attr.class_at(0x10), ByteClass::Pointer);
        assert_eq!(attr.class_at(0x13), ByteClass::Pointer);
        let _ = store;
    }

    #[test]
    fn unrecognized_kind_is_recorded_not_fatal() {
        let img = Image::new(0x100);
        let mut attr = AttributeMap::new(0x100);
        let store = HintStore::load("q 10\n", &img, &mut attr, fmt_8bit(Endian::Big)).unwrap();
        assert_eq!(store.unrecognized, vec![(1, "q".to_string())]);
    }

    #[test]
    fn malformed_line_errors() {
        let img = Image::new(0x100);
        let mut attr = AttributeMap::new(0x100);
        let result = HintStore::load("c zz\n", &img, &mut attr, fmt_8bit(Endian::Big));
        assert!(result.is_err());
    }
}
