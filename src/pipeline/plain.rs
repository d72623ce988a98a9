//! Plain-text extraction: a UTF-8 decode.

use crate::error::IngestError;

const UTF8_BOM: char = '\u{FEFF}';

/// Decode `bytes` as UTF-8, dropping a leading byte-order mark.
pub fn extract_plain(bytes: Vec<u8>, file_name: &str) -> Result<String, IngestError> {
    let text = String::from_utf8(bytes).map_err(|e| IngestError::InvalidUtf8 {
        file_name: file_name.to_string(),
        detail: e.utf8_error().to_string(),
    })?;
    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn decodes_utf8() {
        let out = extract_plain("Zoë — Ingénieure".as_bytes().to_vec(), "cv.txt").unwrap();
        assert_eq!(out, "Zoë — Ingénieure");
    }

    #[test]
    fn drops_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"hello");
        assert_eq!(extract_plain(bytes, "cv.txt").unwrap(), "hello");
    }

    #[test]
    fn malformed_utf8_is_extraction_error() {
        let err = extract_plain(vec![b'a', 0xFF, 0xFE], "cv.txt").unwrap_err();
        assert!(matches!(err, IngestError::InvalidUtf8 { .. }));
        assert_eq!(err.category(), ErrorCategory::Extraction);
    }
}
