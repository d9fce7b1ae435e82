//! # Input Validation
//!
//! Allow-list checks that run before any file or network access.
//!
//! ## Allow-lists:
//! - **Formats**: audio/video container extensions the provider accepts
//! - **Languages**: ISO 639-1 codes the provider can transcribe
//!
//! Both lists are fixed at compile time and backed by hash sets built once
//! on first use, so membership checks are O(1).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Language used when a request does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Supported file extensions, lower-case and without the leading dot.
pub const SUPPORTED_FORMATS: [&str; 7] = ["mp3", "mp4", "wav", "ogg", "flac", "m4a", "webm"];

/// Supported language codes paired with their display names.
pub const SUPPORTED_LANGUAGES: [(&str, &str); 11] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("nl", "Dutch"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ru", "Russian"),
];

static FORMAT_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| SUPPORTED_FORMATS.into_iter().collect());

static LANGUAGE_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SUPPORTED_LANGUAGES.into_iter().collect());

/// Why a request was rejected before reaching the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The path has no extension at all.
    MissingExtension { path: String },

    /// The extension is not in the supported set.
    UnsupportedFormat { extension: String },

    /// The language code is not in the supported set.
    UnsupportedLanguage { code: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingExtension { path } => write!(
                f,
                "File has no extension: {}. Supported formats: {}",
                path,
                supported_formats_list()
            ),
            ValidationError::UnsupportedFormat { extension } => write!(
                f,
                "Unsupported audio format: .{}. Supported formats: {}",
                extension,
                supported_formats_list()
            ),
            ValidationError::UnsupportedLanguage { code } => write!(
                f,
                "Unsupported language code: '{}'. Supported languages: {}",
                code,
                supported_languages_list()
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check that `path` ends in a supported extension (case-insensitive).
pub fn validate_format(path: impl AsRef<Path>) -> Result<(), ValidationError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| ValidationError::MissingExtension {
            path: path.display().to_string(),
        })?
        .to_string_lossy()
        .to_lowercase();

    if FORMAT_SET.contains(extension.as_str()) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedFormat { extension })
    }
}

/// Check that `code` is one of the supported language codes.
pub fn validate_language(code: &str) -> Result<(), ValidationError> {
    if LANGUAGE_MAP.contains_key(code) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedLanguage {
            code: code.to_string(),
        })
    }
}

/// Display name for a supported language code.
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGE_MAP.get(code).copied()
}

/// `".mp3, .mp4, ..."` in declaration order.
pub fn supported_formats_list() -> String {
    SUPPORTED_FORMATS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"en (English), es (Spanish), ..."` in declaration order.
pub fn supported_languages_list() -> String {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| format!("{} ({})", code, name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_formats_any_case() {
        for ext in SUPPORTED_FORMATS {
            assert!(validate_format(format!("clip.{}", ext)).is_ok());
            assert!(validate_format(format!("clip.{}", ext.to_uppercase())).is_ok());
        }
        assert!(validate_format("/tmp/Meeting.Notes.WaV").is_ok());
    }

    #[test]
    fn test_unsupported_formats() {
        assert_eq!(
            validate_format("sample.txt"),
            Err(ValidationError::UnsupportedFormat {
                extension: "txt".to_string()
            })
        );
        assert!(validate_format("video.mov").is_err());
        assert!(validate_format("archive.mp3.zip").is_err());
    }

    #[test]
    fn test_missing_extension() {
        assert!(matches!(
            validate_format("recording"),
            Err(ValidationError::MissingExtension { .. })
        ));
        assert!(matches!(
            validate_format("dir/trailing."),
            Err(ValidationError::MissingExtension { .. })
        ));
        // A leading dot is a hidden file, not an extension
        assert!(validate_format(".mp3").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_extension_is_unsupported() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"clip.m\xffp3"));
        assert!(matches!(
            validate_format(path),
            Err(ValidationError::UnsupportedFormat { extension }) if extension == "m\u{fffd}p3"
        ));
    }

    #[test]
    fn test_supported_languages() {
        for (code, _) in SUPPORTED_LANGUAGES {
            assert!(validate_language(code).is_ok());
        }
    }

    #[test]
    fn test_unsupported_languages() {
        for code in ["", "xx", "EN", "en-US", "english", " en"] {
            assert_eq!(
                validate_language(code),
                Err(ValidationError::UnsupportedLanguage {
                    code: code.to_string()
                })
            );
        }
    }

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("ja"), Some("Japanese"));
        assert_eq!(language_name("xx"), None);
        assert!(supported_languages_list().starts_with("en (English), es (Spanish)"));
        assert!(supported_formats_list().contains(".webm"));
    }

    #[test]
    fn test_error_messages() {
        let err = validate_format("notes.txt").unwrap_err();
        assert!(err.to_string().contains("Unsupported audio format: .txt"));

        let err = validate_language("xx").unwrap_err();
        assert!(err.to_string().contains("'xx'"));
    }
}
