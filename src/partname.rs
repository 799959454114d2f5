//! Part names: absolute, case-insensitive paths of parts inside a package.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The package pseudo-partname, the source of package-level relationships.
pub const PACKAGE_URI: &str = "/";

/// The part name of the content-types manifest.
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

/// Name of a part within a package, e.g. `/ppt/slides/slide1.xml`.
///
/// Always begins with a forward slash. Equality, ordering and hashing ignore
/// case, so `/PPT/Slides/Slide1.XML` and `/ppt/slides/slide1.xml` are the same
/// key; the original spelling is kept for display and archive lookups.
#[derive(Clone)]
pub struct PartName {
    uri: String,
    key: String,
}

impl PartName {
    /// Create a part name, failing if `uri` does not begin with `/`.
    pub fn new(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(Error::InvalidPartName(format!(
                "part name must begin with slash, got '{}'",
                uri
            )));
        }
        let key = uri.to_lowercase();
        Ok(Self { uri, key })
    }

    /// The package pseudo-partname `/`.
    pub fn package() -> Self {
        Self {
            uri: PACKAGE_URI.to_string(),
            key: PACKAGE_URI.to_string(),
        }
    }

    /// Resolve `relative_ref` against the directory `base_uri`.
    ///
    /// Works like URL path resolution: an absolute reference replaces the
    /// base, `.` segments are dropped and `..` removes the previous segment
    /// without climbing above the root.
    ///
    /// ```
    /// use unopc::PartName;
    ///
    /// let pn = PartName::from_rel_ref("/ppt/slides", "../slideLayouts/slideLayout1.xml")?;
    /// assert_eq!(pn.as_str(), "/ppt/slideLayouts/slideLayout1.xml");
    /// # Ok::<(), unopc::Error>(())
    /// ```
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(normalize_path(&joined))
    }

    /// Directory portion, e.g. `/ppt/slides` for `/ppt/slides/slide1.xml`.
    ///
    /// Top-level parts and the package pseudo-partname return `/`.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Final path segment, e.g. `slide1.xml`. Empty for `/`.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Extension without the leading period, e.g. `xml`. Empty when absent.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Index of a tuple part name, e.g. `21` for `/ppt/slides/slide21.xml`.
    pub fn idx(&self) -> Option<u32> {
        let filename = self.filename();
        let stem = match filename.rfind('.') {
            Some(pos) => &filename[..pos],
            None => filename,
        };
        let digits = stem.len() - stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 || digits == stem.len() {
            return None;
        }
        stem[stem.len() - digits..].parse().ok()
    }

    /// Archive member name: the part name without its leading slash.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part name.
    ///
    /// The inverse of [`PartName::from_rel_ref`].
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a.eq_ignore_ascii_case(b))
            .count();

        let mut segments: Vec<&str> = vec![".."; from.len() - common];
        segments.extend_from_slice(&to[common..]);
        segments.join("/")
    }

    /// Part name of the relationships manifest owned by this part.
    ///
    /// `/word/_rels/document.xml.rels` for `/word/document.xml`, and
    /// `/_rels/.rels` for the package itself.
    pub fn rels_uri(&self) -> PartName {
        let base_uri = self.base_uri();
        let uri = if base_uri == "/" {
            format!("/_rels/{}.rels", self.filename())
        } else {
            format!("{}/_rels/{}.rels", base_uri, self.filename())
        };
        let key = uri.to_lowercase();
        PartName { uri, key }
    }

    /// Whether this is the package pseudo-partname.
    pub fn is_package(&self) -> bool {
        self.uri == PACKAGE_URI
    }

    /// The part name as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

/// Collapse `.`, `..` and empty segments of an absolute path.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

impl PartialEq for PartName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PartName {}

impl Hash for PartName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for PartName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PartName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PartName").field(&self.uri).finish()
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PartName {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

impl std::str::FromStr for PartName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PartName::new(s)
    }
}
