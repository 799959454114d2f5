//! Read-only access to a serialized package.
//!
//! [`PackageReader`] resolves everything reachable from the package root in a
//! single pass:
//!
//! 1. `[Content_Types].xml` becomes a [`ContentTypeMap`].
//! 2. `/_rels/.rels` becomes the package-level relationships.
//! 3. A breadth-first walk follows internal relationships, loading each part
//!    exactly once along with its own relationships.
//!
//! Parts that nothing reaches are never read from the physical package.

use crate::constants::relationship_type as RT;
use crate::content_types::ContentTypeMap;
use crate::error::{Error, Result};
use crate::options::ReadOptions;
use crate::partname::{PartName, CONTENT_TYPES_URI};
use crate::phys::{open_phys_reader, PhysPkgReader, ZipPkgReader};
use crate::rels::{SerializedRelationship, SerializedRelationshipCollection};
use log::{debug, trace};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

/// A part as loaded from the physical package.
#[derive(Debug, Clone)]
pub struct SerializedPart {
    /// Name of the part.
    pub partname: PartName,
    /// Content type resolved through the package's content-type map.
    pub content_type: String,
    /// Type of the relationship through which the part was first reached.
    pub reltype: String,
    /// Raw payload.
    pub blob: Vec<u8>,
    /// Relationships owned by this part.
    pub srels: SerializedRelationshipCollection,
}

/// The fully resolved contents of a package.
///
/// Built once by one of the constructors and never modified afterwards.
#[derive(Debug)]
pub struct PackageReader {
    package_uri: PartName,
    content_types: ContentTypeMap,
    pkg_srels: SerializedRelationshipCollection,
    /// Parts in discovery order.
    sparts: Vec<SerializedPart>,
    index: HashMap<PartName, usize>,
}

/// Closes the physical reader however construction ends.
struct CloseGuard<R: PhysPkgReader>(R);

impl<R: PhysPkgReader> Drop for CloseGuard<R> {
    fn drop(&mut self) {
        self.0.close();
    }
}

type WorkQueue = VecDeque<(PartName, String)>;

impl PackageReader {
    /// Read the package at `path`, a zip file or an unzipped directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use unopc::PackageReader;
    ///
    /// let package = PackageReader::open("presentation.pptx")?;
    /// for (partname, content_type, blob) in package.iter_sparts() {
    ///     println!("{} {} ({} bytes)", partname, content_type, blob.len());
    /// }
    /// # Ok::<(), unopc::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &ReadOptions::default())
    }

    /// Read the package at `path` with explicit options.
    pub fn open_with_options(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening package: {}", path.display());
        Self::from_phys_reader_with_options(open_phys_reader(path)?, options)
    }

    /// Read a zip package held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_phys_reader(ZipPkgReader::from_bytes(data)?)
    }

    /// Read the package behind `phys_reader`, then close it.
    pub fn from_phys_reader<R: PhysPkgReader>(phys_reader: R) -> Result<Self> {
        Self::from_phys_reader_with_options(phys_reader, &ReadOptions::default())
    }

    /// Read the package behind `phys_reader` with explicit options.
    ///
    /// The reader is closed exactly once, whether or not reading succeeds.
    pub fn from_phys_reader_with_options<R: PhysPkgReader>(
        phys_reader: R,
        options: &ReadOptions,
    ) -> Result<Self> {
        let mut guard = CloseGuard(phys_reader);
        Self::load(&mut guard.0, options)
    }

    fn load<R: PhysPkgReader + ?Sized>(phys_reader: &mut R, options: &ReadOptions) -> Result<Self> {
        let content_types = ContentTypeMap::from_xml(&phys_reader.content_types_xml()?)
            .map_err(|e| e.in_manifest(CONTENT_TYPES_URI))?;

        let package_uri = PartName::package();
        let pkg_srels = Self::srels_for(phys_reader, &package_uri)?;
        let sparts = Self::load_serialized_parts(phys_reader, &pkg_srels, &content_types, options)?;

        let index: HashMap<PartName, usize> = sparts
            .iter()
            .enumerate()
            .map(|(i, spart)| (spart.partname.clone(), i))
            .collect();

        debug!(
            "Package resolved: {} parts, {} relationships",
            sparts.len(),
            pkg_srels.len() + sparts.iter().map(|s| s.srels.len()).sum::<usize>()
        );

        Ok(Self {
            package_uri,
            content_types,
            pkg_srels,
            sparts,
            index,
        })
    }

    /// Relationships owned by `source_uri`.
    fn srels_for<R: PhysPkgReader + ?Sized>(
        phys_reader: &mut R,
        source_uri: &PartName,
    ) -> Result<SerializedRelationshipCollection> {
        let rels_xml = phys_reader.rels_xml_for(source_uri)?;
        SerializedRelationshipCollection::load_from_xml(source_uri.base_uri(), rels_xml.as_deref())
            .map_err(|e| e.in_manifest(source_uri.rels_uri().as_str()))
    }

    /// Walk the relationship graph breadth-first from the package
    /// relationships, loading each reachable part once.
    fn load_serialized_parts<R: PhysPkgReader + ?Sized>(
        phys_reader: &mut R,
        pkg_srels: &SerializedRelationshipCollection,
        content_types: &ContentTypeMap,
        options: &ReadOptions,
    ) -> Result<Vec<SerializedPart>> {
        let mut sparts = Vec::new();
        // Holds every part name ever enqueued, so each is loaded at most once.
        let mut visited = HashSet::new();
        let mut queue = WorkQueue::new();

        Self::enqueue_targets(pkg_srels, &mut visited, &mut queue, options)?;

        while let Some((partname, reltype)) = queue.pop_front() {
            trace!("Loading part {}", partname);

            let blob = phys_reader.blob_for(&partname)?;
            let srels = Self::srels_for(phys_reader, &partname)?;
            let content_type = content_types.get(&partname)?.to_string();

            Self::enqueue_targets(&srels, &mut visited, &mut queue, options)?;

            sparts.push(SerializedPart {
                partname,
                content_type,
                reltype,
                blob,
                srels,
            });
        }

        Ok(sparts)
    }

    /// Queue the not-yet-visited internal targets of `srels`, in order.
    fn enqueue_targets(
        srels: &SerializedRelationshipCollection,
        visited: &mut HashSet<PartName>,
        queue: &mut WorkQueue,
        options: &ReadOptions,
    ) -> Result<()> {
        for srel in srels.iter().filter(|srel| !srel.is_external()) {
            let target = srel.target_partname()?;
            if visited.contains(&target) {
                trace!("Already visited {}", target);
                continue;
            }
            if let Some(max_parts) = options.max_parts {
                if visited.len() >= max_parts {
                    return Err(Error::LimitExceeded(format!(
                        "package reaches more than {} parts",
                        max_parts
                    )));
                }
            }
            visited.insert(target.clone());
            queue.push_back((target, srel.reltype().to_string()));
        }
        Ok(())
    }

    /// `(partname, content_type, blob)` for every part, in discovery order.
    pub fn iter_sparts(&self) -> impl Iterator<Item = (&PartName, &str, &[u8])> + '_ {
        self.sparts
            .iter()
            .map(|spart| (&spart.partname, spart.content_type.as_str(), spart.blob.as_slice()))
    }

    /// `(source, relationship)` for every relationship in the package.
    ///
    /// Package relationships come first, with the package pseudo-partname
    /// `/` as source; then each part's relationships in discovery order.
    /// External relationships are included.
    pub fn iter_srels(&self) -> impl Iterator<Item = (&PartName, &SerializedRelationship)> + '_ {
        let package = self.pkg_srels.iter().map(|srel| (&self.package_uri, srel));
        let parts = self
            .sparts
            .iter()
            .flat_map(|spart| spart.srels.iter().map(move |srel| (&spart.partname, srel)));
        package.chain(parts)
    }

    pub fn content_types(&self) -> &ContentTypeMap {
        &self.content_types
    }

    /// Package-level relationships.
    pub fn pkg_srels(&self) -> &SerializedRelationshipCollection {
        &self.pkg_srels
    }

    /// All parts, in discovery order.
    pub fn sparts(&self) -> &[SerializedPart] {
        &self.sparts
    }

    /// The part named `partname`, if it was reached.
    pub fn spart(&self, partname: &PartName) -> Option<&SerializedPart> {
        self.index.get(partname).map(|&i| &self.sparts[i])
    }

    /// The part targeted by the package's `officeDocument` relationship.
    pub fn main_document_part(&self) -> Option<&SerializedPart> {
        self.pkg_srels
            .iter()
            .filter(|srel| srel.reltype() == RT::OFFICE_DOCUMENT && !srel.is_external())
            .find_map(|srel| srel.target_partname().ok())
            .and_then(|partname| self.spart(&partname))
    }

    /// Number of parts reached.
    pub fn len(&self) -> usize {
        self.sparts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sparts.is_empty()
    }

    /// Take ownership of the parts.
    pub fn into_sparts(self) -> Vec<SerializedPart> {
        self.sparts
    }
}
