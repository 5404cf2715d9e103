// ============================================================
// CSV UPLOAD INPUT
// ============================================================
// Upload validation, encoding detection and file reads

use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::domain::error::{AppError, Result};

pub const CSV_MIME_TYPE: &str = "text/csv";

/// Accept a file when it declares the CSV MIME type or carries a `.csv` name
pub fn validate_upload(file_name: &str, content_type: Option<&str>) -> Result<()> {
    let declared_csv = content_type
        .map(|mime| {
            mime.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .eq_ignore_ascii_case(CSV_MIME_TYPE)
        })
        .unwrap_or(false);

    if declared_csv || file_name.to_ascii_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "Please upload a valid CSV file.".to_string(),
        ))
    }
}

/// Decode uploaded bytes to text.
///
/// A byte-order mark selects its encoding. Otherwise UTF-8 is tried first and
/// Windows-1252 (a superset of Latin-1) is the fallback.
pub fn decode_csv_bytes(bytes: &[u8]) -> String {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return text.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Read a CSV file from disk with encoding detection
pub fn read_csv_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        AppError::IoError(format!("Failed to read file {}: {}", path.display(), e))
    })?;

    Ok(decode_csv_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload("sales.csv", None).is_ok());
        assert!(validate_upload("SALES.CSV", None).is_ok());
        assert!(validate_upload("export", Some("text/csv; charset=utf-8")).is_ok());
        assert_eq!(
            validate_upload("report.xlsx", Some("application/octet-stream")),
            Err(AppError::ValidationError(
                "Please upload a valid CSV file.".to_string()
            ))
        );
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFname\nAl";
        assert_eq!(decode_csv_bytes(bytes), "name\nAl");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let bytes = b"city\nM\xFCnchen";
        assert_eq!(decode_csv_bytes(bytes), "city\nMünchen");
    }

    #[test]
    fn test_decode_utf16le_bom() {
        let bytes = [0xFF, 0xFE, b'a', 0, b',', 0, b'b', 0];
        assert_eq!(decode_csv_bytes(&bytes), "a,b");
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_csv_file(Path::new("/nonexistent/datainsight/missing.csv"));
        assert!(matches!(result, Err(AppError::IoError(_))));
    }
}
