//! Package kind detection from the resolved part graph.

use crate::constants::content_type as CT;
use crate::error::{Error, Result};
use crate::pkgreader::PackageReader;
use serde::Serialize;
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Kind of Office document a package holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    /// Microsoft Word document (.docx)
    Docx,
    /// Microsoft Excel workbook (.xlsx)
    Xlsx,
    /// Microsoft PowerPoint presentation (.pptx)
    Pptx,
}

impl FormatType {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Docx => "docx",
            FormatType::Xlsx => "xlsx",
            FormatType::Pptx => "pptx",
        }
    }

    /// Returns a human-readable name for this format.
    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Docx => "Word Document",
            FormatType::Xlsx => "Excel Workbook",
            FormatType::Pptx => "PowerPoint Presentation",
        }
    }

    /// Format whose main document part has `content_type`.
    pub fn from_main_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            CT::WML_DOCUMENT_MAIN | CT::WML_DOCUMENT_MACRO | CT::WML_TEMPLATE_MAIN => {
                Some(FormatType::Docx)
            }
            CT::SML_SHEET_MAIN | CT::SML_SHEET_MACRO | CT::SML_TEMPLATE_MAIN => {
                Some(FormatType::Xlsx)
            }
            CT::PML_PRESENTATION_MAIN
            | CT::PML_PRESENTATION_MACRO
            | CT::PML_SLIDESHOW_MAIN
            | CT::PML_TEMPLATE_MAIN => Some(FormatType::Pptx),
            _ => None,
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Format of an already-read package.
///
/// Looks at the content type of the part targeted by the package's
/// `officeDocument` relationship.
pub fn detect_format(package: &PackageReader) -> Result<FormatType> {
    let main = package
        .main_document_part()
        .ok_or_else(|| Error::MissingComponent("officeDocument relationship".to_string()))?;
    FormatType::from_main_content_type(&main.content_type).ok_or(Error::UnknownFormat)
}

/// Detect the format type from a file path.
///
/// # Example
///
/// ```no_run
/// use unopc::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("document.docx")?;
/// println!("Detected format: {}", format);
/// # Ok::<(), unopc::Error>(())
/// ```
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    detect_format(&PackageReader::open(path)?)
}

/// Detect the format type from the bytes of a zip package.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if !is_zip_file(data) {
        return Err(Error::UnknownFormat);
    }
    detect_format(&PackageReader::from_bytes(data.to_vec())?)
}

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_type_display() {
        assert_eq!(FormatType::Docx.to_string(), "Word Document");
        assert_eq!(FormatType::Xlsx.to_string(), "Excel Workbook");
        assert_eq!(FormatType::Pptx.to_string(), "PowerPoint Presentation");
    }

    #[test]
    fn test_format_type_extension() {
        assert_eq!(FormatType::Docx.extension(), "docx");
        assert_eq!(FormatType::Xlsx.extension(), "xlsx");
        assert_eq!(FormatType::Pptx.extension(), "pptx");
    }

    #[test]
    fn test_from_main_content_type() {
        assert_eq!(
            FormatType::from_main_content_type(CT::PML_PRESENTATION_MAIN),
            Some(FormatType::Pptx)
        );
        assert_eq!(
            FormatType::from_main_content_type(CT::SML_SHEET_MACRO),
            Some(FormatType::Xlsx)
        );
        assert_eq!(FormatType::from_main_content_type(CT::XML), None);
    }

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file(&[0x50, 0x4B, 0x03, 0x04, 0x00]));
        assert!(!is_zip_file(&[0x00, 0x00, 0x00, 0x00]));
        assert!(!is_zip_file(&[0x50, 0x4B])); // Too short
    }

    #[test]
    fn test_detect_invalid_data() {
        let result = detect_format_from_bytes(&[0x00, 0x00, 0x00, 0x00]);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }
}
