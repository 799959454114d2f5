//! Physical package access: the byte-level view of a package.
//!
//! [`PhysPkgReader`] is the only thing the graph walk needs from the storage
//! layer, so a zip archive, an unzipped directory and an in-memory map are
//! interchangeable.

use crate::detect::is_zip_file;
use crate::error::{Error, Result};
use crate::partname::{PartName, CONTENT_TYPES_URI};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

/// Read access to the members of a physical package.
///
/// Implementors supply [`read_member`](PhysPkgReader::read_member) and
/// [`close`](PhysPkgReader::close); the part-level accessors are derived
/// from them but may be overridden.
pub trait PhysPkgReader {
    /// Raw bytes of the member `membername` (no leading slash), or `None` if
    /// the package has no such member.
    fn read_member(&mut self, membername: &str) -> Result<Option<Vec<u8>>>;

    /// Release the underlying resources. Calling it again has no effect.
    fn close(&mut self);

    /// Raw `[Content_Types].xml`.
    fn content_types_xml(&mut self) -> Result<Vec<u8>> {
        let membername = &CONTENT_TYPES_URI[1..];
        self.read_member(membername)?
            .ok_or_else(|| Error::MissingComponent(CONTENT_TYPES_URI.to_string()))
    }

    /// Raw relationships manifest owned by `source_uri`, `None` when the
    /// source has no relationships.
    fn rels_xml_for(&mut self, source_uri: &PartName) -> Result<Option<Vec<u8>>> {
        self.read_member(source_uri.rels_uri().membername())
    }

    /// Raw payload of `partname`.
    fn blob_for(&mut self, partname: &PartName) -> Result<Vec<u8>> {
        self.read_member(partname.membername())?
            .ok_or_else(|| Error::MissingComponent(partname.to_string()))
    }
}

impl<R: PhysPkgReader + ?Sized> PhysPkgReader for Box<R> {
    fn read_member(&mut self, membername: &str) -> Result<Option<Vec<u8>>> {
        (**self).read_member(membername)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn content_types_xml(&mut self) -> Result<Vec<u8>> {
        (**self).content_types_xml()
    }

    fn rels_xml_for(&mut self, source_uri: &PartName) -> Result<Option<Vec<u8>>> {
        (**self).rels_xml_for(source_uri)
    }

    fn blob_for(&mut self, partname: &PartName) -> Result<Vec<u8>> {
        (**self).blob_for(partname)
    }
}

impl<R: PhysPkgReader + ?Sized> PhysPkgReader for &mut R {
    fn read_member(&mut self, membername: &str) -> Result<Option<Vec<u8>>> {
        (**self).read_member(membername)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn content_types_xml(&mut self) -> Result<Vec<u8>> {
        (**self).content_types_xml()
    }

    fn rels_xml_for(&mut self, source_uri: &PartName) -> Result<Option<Vec<u8>>> {
        (**self).rels_xml_for(source_uri)
    }

    fn blob_for(&mut self, partname: &PartName) -> Result<Vec<u8>> {
        (**self).blob_for(partname)
    }
}

fn closed_error() -> Error {
    Error::Io(io::Error::other("package reader is closed"))
}

/// Open the physical reader that suits `path`.
///
/// A directory is read as an unzipped package; a file must be a zip archive.
pub fn open_phys_reader(path: impl AsRef<Path>) -> Result<Box<dyn PhysPkgReader>> {
    let path = path.as_ref();

    if path.is_dir() {
        return Ok(Box::new(DirPkgReader::new(path)?));
    }
    if !path.exists() {
        return Err(Error::PackageNotFound(path.display().to_string()));
    }

    let mut magic = [0u8; 4];
    let read = File::open(path)?.read(&mut magic)?;
    if !is_zip_file(&magic[..read]) {
        return Err(Error::UnknownFormat);
    }

    Ok(Box::new(ZipPkgReader::open(path)?))
}

/// Reader over a zip archive.
///
/// Member lookup ignores case, matching how part names compare.
pub struct ZipPkgReader<R: Read + Seek = Cursor<Vec<u8>>> {
    archive: Option<zip::ZipArchive<R>>,
    /// Lowercased member name to archive index.
    index: HashMap<String, usize>,
}

impl ZipPkgReader<BufReader<File>> {
    /// Open a zip package from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use unopc::phys::{PhysPkgReader, ZipPkgReader};
    ///
    /// let mut reader = ZipPkgReader::open("presentation.pptx")?;
    /// let content_types = reader.content_types_xml()?;
    /// reader.close();
    /// # Ok::<(), unopc::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::PackageNotFound(path.display().to_string()));
        }
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl ZipPkgReader<Cursor<Vec<u8>>> {
    /// Create a reader over an in-memory zip archive.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(data))
    }
}

impl<R: Read + Seek> ZipPkgReader<R> {
    /// Create a reader over any seekable zip stream.
    pub fn new(reader: R) -> Result<Self> {
        let archive = zip::ZipArchive::new(reader)?;

        let mut index = HashMap::with_capacity(archive.len());
        for name in archive.file_names() {
            if name.ends_with('/') {
                continue;
            }
            if let Some(i) = archive.index_for_name(name) {
                index.entry(name.to_lowercase()).or_insert(i);
            }
        }

        Ok(Self {
            archive: Some(archive),
            index,
        })
    }

    /// Member names in the archive, directories excluded.
    pub fn member_names(&self) -> Vec<String> {
        match &self.archive {
            Some(archive) => archive
                .file_names()
                .filter(|n| !n.ends_with('/'))
                .map(String::from)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether [`close`](PhysPkgReader::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.archive.is_none()
    }
}

impl<R: Read + Seek> PhysPkgReader for ZipPkgReader<R> {
    fn read_member(&mut self, membername: &str) -> Result<Option<Vec<u8>>> {
        let archive = self.archive.as_mut().ok_or_else(closed_error)?;
        let Some(&i) = self.index.get(&membername.to_lowercase()) else {
            return Ok(None);
        };

        let mut file = archive.by_index(i)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    fn close(&mut self) {
        self.archive = None;
    }
}

impl<R: Read + Seek> std::fmt::Debug for ZipPkgReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipPkgReader")
            .field("members", &self.index.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Reader over a package that has been unzipped into a directory.
#[derive(Debug, Clone)]
pub struct DirPkgReader {
    root: PathBuf,
    closed: bool,
}

impl DirPkgReader {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::PackageNotFound(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            closed: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `membername` one segment at a time, comparing names without
    /// regard to case.
    fn find_ignoring_case(&self, membername: &str) -> Result<Option<PathBuf>> {
        let mut path = self.root.clone();
        for segment in membername.split('/').filter(|s| !s.is_empty()) {
            let wanted = segment.to_lowercase();
            let entries = match fs::read_dir(&path) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let mut found = None;
            for entry in entries {
                let entry = entry?;
                if entry.file_name().to_string_lossy().to_lowercase() == wanted {
                    found = Some(entry.path());
                    break;
                }
            }
            match found {
                Some(next) => path = next,
                None => return Ok(None),
            }
        }
        Ok(path.is_file().then_some(path))
    }
}

impl PhysPkgReader for DirPkgReader {
    fn read_member(&mut self, membername: &str) -> Result<Option<Vec<u8>>> {
        if self.closed {
            return Err(closed_error());
        }
        let path = membername
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment));
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                match self.find_ignoring_case(membername)? {
                    Some(path) => Ok(Some(fs::read(path)?)),
                    None => Ok(None),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Reader over members held in memory, keyed by member name.
#[derive(Debug, Clone, Default)]
pub struct MemPkgReader {
    members: HashMap<String, Vec<u8>>,
    closed: bool,
}

impl MemPkgReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. A leading slash is accepted and ignored.
    pub fn insert(&mut self, membername: &str, data: impl Into<Vec<u8>>) {
        let key = membername.trim_start_matches('/').to_lowercase();
        self.members.insert(key, data.into());
    }

    /// Builder form of [`insert`](MemPkgReader::insert).
    pub fn with_member(mut self, membername: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(membername, data);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl PhysPkgReader for MemPkgReader {
    fn read_member(&mut self, membername: &str) -> Result<Option<Vec<u8>>> {
        if self.closed {
            return Err(closed_error());
        }
        Ok(self.members.get(&membername.to_lowercase()).cloned())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
