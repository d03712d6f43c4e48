//! Error types for the disassembler engine.
//!
//! Mirrors the failure taxonomy from the design notes: usage errors are
//! handled by the CLI layer directly (it prints usage and exits 0), so this
//! enum covers I/O and malformed-input failures only.

use thiserror::Error;

/// Primary error type for the disassembler engine.
#[derive(Debug, Error)]
pub enum DisasmError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested load address leaves no room in the address space.
    #[error("start address ${start:x} leaves no room in a {capacity:#x}-byte address space")]
    StartOutOfRange { start: usize, capacity: usize },

    /// A hint-file line didn't match any recognised `KIND ADDR ...` form.
    #[error("malformed hint line {line_no}: {text:?}")]
    MalformedHint { line_no: usize, text: String },

    /// A hint referenced an address or size field that failed to parse.
    #[error("hint line {line_no}: invalid field {field:?}")]
    InvalidHintField { line_no: usize, field: String },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, DisasmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_out_of_range_message() {
        let err = DisasmError::StartOutOfRange {
            start: 0x20000,
            capacity: 0x10000,
        };
        assert!(err.to_string().contains("20000"));
    }

    #[test]
    fn malformed_hint_message() {
        let err = DisasmError::MalformedHint {
            line_no: 3,
            text: "zz 100".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains("zz 100"));
    }
}
