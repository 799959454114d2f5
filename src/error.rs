//! Error types for the unopc library.

use std::io;
use thiserror::Error;

/// Result type alias for unopc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed manifest, archive or part name.
    Format,
    /// Something the package should contain could not be found.
    NotFound,
    /// The caller asked for something that cannot exist.
    Logic,
    /// Underlying I/O failure.
    Io,
    /// A configured read limit was exceeded.
    Limit,
}

/// Errors that can occur while reading a package.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The package file or directory does not exist.
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// The input is neither a zip archive nor a package directory.
    #[error("Unknown package format")]
    UnknownFormat,

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// A content-type or relationship manifest is malformed.
    #[error("Malformed manifest {name}: {message}")]
    Manifest { name: String, message: String },

    /// A part name without the leading slash.
    #[error("Invalid part name: {0}")]
    InvalidPartName(String),

    /// No override or default content type matches the part.
    #[error("Content type not found for part name: {0}")]
    ContentTypeNotFound(String),

    /// A required package member is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// Asked for the in-package target of an external relationship.
    #[error("Relationship {r_id} is external and has no target part name")]
    ExternalTarget { r_id: String },

    /// A configured read limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// The package manifest could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::PackageNotFound(_)
            | Error::ContentTypeNotFound(_)
            | Error::MissingComponent(_) => ErrorKind::NotFound,
            Error::UnknownFormat
            | Error::ZipArchive(_)
            | Error::XmlParse(_)
            | Error::Manifest { .. }
            | Error::InvalidPartName(_)
            | Error::Json(_) => ErrorKind::Format,
            Error::ExternalTarget { .. } => ErrorKind::Logic,
            Error::LimitExceeded(_) => ErrorKind::Limit,
        }
    }

    /// Attach the manifest name to a format error raised while parsing it.
    ///
    /// Errors of other kinds pass through unchanged.
    pub(crate) fn in_manifest(self, name: impl Into<String>) -> Self {
        match self {
            Error::XmlParse(message) | Error::InvalidPartName(message) => Error::Manifest {
                name: name.into(),
                message,
            },
            other => other,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(err.to_string(), "Unknown package format");

        let err = Error::ContentTypeNotFound("/foo.bin".to_string());
        assert_eq!(
            err.to_string(),
            "Content type not found for part name: /foo.bin"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::ExternalTarget {
                r_id: "rId1".into()
            }
            .kind(),
            ErrorKind::Logic
        );
        assert_eq!(
            Error::ContentTypeNotFound("/a".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(Error::InvalidPartName("a".into()).kind(), ErrorKind::Format);
    }

    #[test]
    fn test_in_manifest_wraps_format_errors_only() {
        let err = Error::XmlParse("unexpected end".into()).in_manifest("/_rels/.rels");
        match err {
            Error::Manifest { name, message } => {
                assert_eq!(name, "/_rels/.rels");
                assert_eq!(message, "unexpected end");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = Error::MissingComponent("x".into()).in_manifest("/_rels/.rels");
        assert!(matches!(err, Error::MissingComponent(_)));
    }
}
