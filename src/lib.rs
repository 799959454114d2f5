//! # unopc
//!
//! Reader for Open Packaging Conventions (OPC) containers: the zip-based
//! packages behind DOCX, XLSX and PPTX files.
//!
//! Opening a package resolves its content types and walks the relationship
//! graph from the package root, loading every reachable part exactly once.
//! The result is an immutable [`PackageReader`] listing each part with its
//! content type and payload, and each relationship with its source.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unopc::PackageReader;
//!
//! let package = PackageReader::open("presentation.pptx")?;
//!
//! for (partname, content_type, blob) in package.iter_sparts() {
//!     println!("{} [{}] {} bytes", partname, content_type, blob.len());
//! }
//!
//! for (source, srel) in package.iter_srels() {
//!     println!("{} {} -> {}", source, srel.r_id(), srel.target_ref());
//! }
//! # Ok::<(), unopc::Error>(())
//! ```
//!
//! ## Physical Readers
//!
//! The walk reads members through the [`PhysPkgReader`] trait:
//!
//! - [`ZipPkgReader`] for zip archives, from a path or from bytes
//! - [`DirPkgReader`] for packages unzipped into a directory
//! - [`MemPkgReader`] for members held in memory
//!
//! ```no_run
//! use unopc::{PackageReader, ReadOptions, ZipPkgReader};
//!
//! let data = std::fs::read("report.docx")?;
//! let options = ReadOptions::new().with_max_parts(10_000);
//! let package = PackageReader::from_phys_reader_with_options(
//!     ZipPkgReader::from_bytes(data)?,
//!     &options,
//! )?;
//! # Ok::<(), unopc::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: [`open_async`] with Tokio

pub mod constants;
pub mod content_types;
pub mod detect;
pub mod error;
pub mod manifest;
pub mod options;
pub mod partname;
pub mod phys;
pub mod pkgreader;
pub mod rels;
pub mod xml;

// Re-exports
pub use content_types::ContentTypeMap;
pub use detect::{detect_format, detect_format_from_bytes, detect_format_from_path, FormatType};
pub use error::{Error, ErrorKind, Result};
pub use manifest::{JsonFormat, PackageManifest};
pub use options::ReadOptions;
pub use partname::PartName;
pub use phys::{open_phys_reader, DirPkgReader, MemPkgReader, PhysPkgReader, ZipPkgReader};
pub use pkgreader::{PackageReader, SerializedPart};
pub use rels::{SerializedRelationship, SerializedRelationshipCollection, TargetMode};

use std::path::Path;

/// Read the package at `path`, a zip file or an unzipped directory.
///
/// # Example
///
/// ```no_run
/// let package = unopc::open("workbook.xlsx")?;
/// println!("{} parts", package.len());
/// # Ok::<(), unopc::Error>(())
/// ```
pub fn open(path: impl AsRef<Path>) -> Result<PackageReader> {
    PackageReader::open(path)
}

/// Read a zip package held in memory.
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("document.docx")?;
/// let package = unopc::from_bytes(data)?;
/// # Ok::<(), unopc::Error>(())
/// ```
pub fn from_bytes(data: Vec<u8>) -> Result<PackageReader> {
    PackageReader::from_bytes(data)
}

/// Read the package at `path` without blocking the async runtime.
///
/// The file is read with `tokio::fs`; the graph walk then runs on the
/// blocking thread pool.
#[cfg(feature = "async")]
pub async fn open_async(path: impl AsRef<Path>) -> Result<PackageReader> {
    let path = path.as_ref().to_path_buf();

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::PackageNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let task = if metadata.is_dir() {
        tokio::task::spawn_blocking(move || PackageReader::open(path))
    } else {
        let data = tokio::fs::read(&path).await?;
        if !detect::is_zip_file(&data) {
            return Err(Error::UnknownFormat);
        }
        tokio::task::spawn_blocking(move || PackageReader::from_bytes(data))
    };

    task.await.map_err(|e| Error::Io(std::io::Error::other(e)))?
}
