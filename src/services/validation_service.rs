//! src/services/validation_service.rs
//!
//! Request Validator: the only gate between a client-supplied filename and
//! an object key handed to the signer. A filename is accepted exactly when
//! it is `stem.extension`, where the stem is word characters or hyphens and
//! the extension is ASCII alphanumeric, and the whole name fits in
//! `MAX_FILENAME_CHARS`. Everything else is rejected with a single reason;
//! validation never raises and never rewrites the name.

use crate::models::upload::ValidatedUpload;
use thiserror::Error;

/// Upper bound on filename length, in characters.
pub const MAX_FILENAME_CHARS: usize = 255;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("filename must not be empty")]
    EmptyFilename,
    #[error("filename exceeds {MAX_FILENAME_CHARS} characters")]
    FilenameTooLong,
    #[error("filename must look like `name.extension` (word characters or hyphens, one dot)")]
    InvalidFormat,
}

/// Validate a client-supplied filename and infer its content type.
///
/// On success the returned key is the filename unchanged. The checks run in
/// a fixed order (empty, length, format) so a given input always maps to
/// the same single rejection reason.
pub fn validate_filename(filename: &str) -> Result<ValidatedUpload, ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }
    if filename.chars().count() > MAX_FILENAME_CHARS {
        return Err(ValidationError::FilenameTooLong);
    }

    // `stem.extension` with exactly one dot: a dot in the stem fails the
    // word-character check below.
    let Some((stem, extension)) = filename.rsplit_once('.') else {
        return Err(ValidationError::InvalidFormat);
    };
    if stem.is_empty() || extension.is_empty() {
        return Err(ValidationError::InvalidFormat);
    }
    if !stem.chars().all(is_word_char) {
        return Err(ValidationError::InvalidFormat);
    }
    if !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat);
    }

    Ok(ValidatedUpload {
        object_key: filename.to_string(),
        content_type: content_type_for(extension),
    })
}

/// Map a file extension to its MIME type.
///
/// The table is deliberately small and fixed; anything unknown is treated
/// as opaque binary rather than rejected.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Word characters as the stem allows them: alphanumerics (any script),
/// underscore, hyphen.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-')
}
