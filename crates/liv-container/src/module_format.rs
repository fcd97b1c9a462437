//! WebAssembly module header check.
//!
//! Only the 8-byte preamble is inspected. A module with a valid header and a
//! corrupt body passes here; section parsing belongs to the execution engine.

use crate::error::ModuleFormatError;

/// `\0asm`
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];

/// Binary format version 1.
pub const WASM_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// File extension used for module entries.
pub const WASM_EXTENSION: &str = "wasm";

/// Check magic then version.
pub fn sniff(bytes: &[u8]) -> Result<(), ModuleFormatError> {
    match bytes.get(..4) {
        Some(magic) if magic == WASM_MAGIC => {}
        _ => return Err(ModuleFormatError::InvalidMagic),
    }

    match bytes.get(4..8) {
        Some(version) if version == WASM_VERSION => Ok(()),
        _ => Err(ModuleFormatError::UnsupportedVersion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<u8> {
        let mut h = WASM_MAGIC.to_vec();
        h.extend_from_slice(&WASM_VERSION);
        h
    }

    #[test]
    fn short_inputs_are_invalid_magic() {
        for len in 0..4 {
            let bytes = &WASM_MAGIC[..len];
            assert_eq!(sniff(bytes), Err(ModuleFormatError::InvalidMagic), "len {len}");
        }
    }

    #[test]
    fn wrong_magic() {
        assert_eq!(
            sniff(b"\x7fELF\x01\x00\x00\x00"),
            Err(ModuleFormatError::InvalidMagic)
        );
    }

    #[test]
    fn correct_magic_bad_or_missing_version() {
        assert_eq!(sniff(&WASM_MAGIC), Err(ModuleFormatError::UnsupportedVersion));
        assert_eq!(
            sniff(&[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00]),
            Err(ModuleFormatError::UnsupportedVersion)
        );
        assert_eq!(
            sniff(&[0x00, 0x61, 0x73, 0x6D, 0x02, 0x00, 0x00, 0x00]),
            Err(ModuleFormatError::UnsupportedVersion)
        );
    }

    #[test]
    fn exact_header_passes() {
        assert_eq!(sniff(&header()), Ok(()));
    }

    #[test]
    fn corrupt_body_after_valid_header_passes() {
        let mut bytes = header();
        bytes.extend_from_slice(&[0xFF; 64]);
        assert_eq!(sniff(&bytes), Ok(()));
    }
}
