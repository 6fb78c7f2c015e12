//! Attachment upload rules.

use crate::error::CoreError;

/// Multipart field carrying the uploaded file.
pub const ATTACHMENT_FIELD: &str = "attachment";

/// Default upload size cap in bytes (10 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10_000_000;

/// Accepted file extensions, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "pdf", "doc", "docx", "txt"];

/// Validate the extension of an uploaded file name and return it lowercased.
pub fn validate_extension(file_name: &str) -> Result<String, CoreError> {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid file type. Allowed types are: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Reduce a client-supplied file stem to `[A-Za-z0-9._-]`.
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn allowed_extensions_pass_case_insensitively() {
        assert_eq!(validate_extension("scan.PDF").unwrap(), "pdf");
        assert_eq!(validate_extension("notes.txt").unwrap(), "txt");
        assert_eq!(validate_extension("photo.final.jpeg").unwrap(), "jpeg");
    }

    #[test]
    fn other_extensions_are_rejected() {
        assert_matches!(validate_extension("run.exe"), Err(CoreError::Validation(_)));
        assert_matches!(validate_extension("README"), Err(CoreError::Validation(_)));
        assert_matches!(validate_extension("archive.tar.gz"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn stems_are_sanitized() {
        assert_eq!(sanitize_stem("my report (v2)"), "my_report__v2_");
        assert_eq!(sanitize_stem("../../etc"), ".._.._etc");
        assert_eq!(sanitize_stem(""), "file");
    }
}
