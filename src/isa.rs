//! Selectable instruction sets and their address-space parameters.

use crate::hints::{Endian, PointerFormat};

/// The six supported microprocessor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsaKind {
    Mcs6502,
    Mc6801,
    Mc6805,
    Mc6809,
    Z80,
    Mc68000,
}

impl IsaKind {
    /// Parse a CLI `--isa` selector value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mcs6502" | "6502" => Some(IsaKind::Mcs6502),
            "mc6801" | "6801" | "63701" | "hd63701" => Some(IsaKind::Mc6801),
            "mc6805" | "6805" => Some(IsaKind::Mc6805),
            "mc6809" | "6809" => Some(IsaKind::Mc6809),
            "z80" => Some(IsaKind::Z80),
            "mc68000" | "68000" | "68k" => Some(IsaKind::Mc68000),
            _ => None,
        }
    }

    /// Total address-space size this architecture's [`Image`](crate::image::Image)
    /// should be sized to.
    pub fn address_space(self) -> usize {
        match self {
            IsaKind::Mc68000 => 0x1000000,
            _ => 0x10000,
        }
    }

    /// Byte order the architecture's multi-byte pointers use in memory.
    pub fn endian(self) -> Endian {
        match self {
            IsaKind::Mcs6502 | IsaKind::Z80 => Endian::Little,
            IsaKind::Mc6801 | IsaKind::Mc6805 | IsaKind::Mc6809 | IsaKind::Mc68000 => Endian::Big,
        }
    }

    /// Layout of `t`/`u`/`v` hint-file pointer-table entries.
    pub fn pointer_format(self) -> PointerFormat {
        match self {
            IsaKind::Mc68000 => PointerFormat::ThreeOfFour,
            other => PointerFormat::TwoByte {
                endian: other.endian(),
                stride: 2,
            },
        }
    }

    /// Name used in the listing header and as the `--isa` value.
    pub fn name(self) -> &'static str {
        match self {
            IsaKind::Mcs6502 => "mcs6502",
            IsaKind::Mc6801 => "mc6801",
            IsaKind::Mc6805 => "mc6805",
            IsaKind::Mc6809 => "mc6809",
            IsaKind::Z80 => "z80",
            IsaKind::Mc68000 => "mc68000",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_and_alias_names() {
        assert_eq!(IsaKind::parse("z80"), Some(IsaKind::Z80));
        assert_eq!(IsaKind::parse("68000"), Some(IsaKind::Mc68000));
        assert_eq!(IsaKind::parse("HD63701"), Some(IsaKind::Mc6801));
        assert_eq!(IsaKind::parse("bogus"), None);
    }

    #[test]
    fn address_space_matches_word_width() {
        assert_eq!(IsaKind::Mcs6502.address_space(), 0x10000);
        assert_eq!(IsaKind::Mc68000.address_space(), 0x1000000);
    }

    #[test]
    fn endianness_matches_reference_disassemblers() {
        assert_eq!(IsaKind::Mcs6502.endian(), Endian::Little);
        assert_eq!(IsaKind::Z80.endian(), Endian::Little);
        assert_eq!(IsaKind::Mc6809.endian(), Endian::Big);
        assert_eq!(IsaKind::Mc68000.endian(), Endian::Big);
    }
}
