// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF text strings: UTF-16BE with a byte-order mark, UTF-8 with a BOM
// (PDF 2.0), or PDFDocEncoding.

/// Decode the bytes of a PDF text string.
///
/// PDFDocEncoding is approximated as Latin-1, which agrees with it on every
/// printable ASCII byte and on the accented letters producers actually emit.
pub fn decode_text_string(bytes: &[u8]) -> String {
    let decoded = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        char::decode_utf16(units)
            .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(utf8).into_owned()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect::<String>()
    };
    decoded.trim_end_matches('\0').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii() {
        assert_eq!(decode_text_string(b"Adobe Photoshop 2023"), "Adobe Photoshop 2023");
    }

    #[test]
    fn utf16_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, b'G', 0x00, b'I', 0x00, b'M', 0x00, b'P'];
        assert_eq!(decode_text_string(&bytes), "GIMP");
    }

    #[test]
    fn utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("Sejda – online".as_bytes());
        assert_eq!(decode_text_string(&bytes), "Sejda – online");
    }

    #[test]
    fn latin1_fallback_and_trailing_nul() {
        assert_eq!(decode_text_string(b"Caf\xe9\0"), "Café");
    }
}
