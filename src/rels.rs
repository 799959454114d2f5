//! Relationships as read from `.rels` manifests.

use crate::constants::target_mode;
use crate::error::{Error, Result};
use crate::partname::PartName;
use crate::xml::{attr_value, decode_xml_bytes, required_attr};
use quick_xml::events::Event;
use serde::Serialize;
use std::fmt;

/// Whether a relationship points inside the package or outside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TargetMode {
    /// Target is a part in the same package.
    #[default]
    Internal,
    /// Target is an opaque URI, such as a web link.
    External,
}

impl TargetMode {
    /// Interpret a `TargetMode` attribute value.
    ///
    /// Only the exact value `External` selects [`TargetMode::External`]; any
    /// other value, like an absent attribute, means internal.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some(target_mode::EXTERNAL) => TargetMode::External,
            _ => TargetMode::Internal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetMode::Internal => target_mode::INTERNAL,
            TargetMode::External => target_mode::EXTERNAL,
        }
    }
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One relationship entry, with its target still in serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedRelationship {
    base_uri: String,
    r_id: String,
    reltype: String,
    target_ref: String,
    target_mode: TargetMode,
}

impl SerializedRelationship {
    /// Create a relationship owned by the source whose directory is `base_uri`.
    pub fn new(
        base_uri: impl Into<String>,
        r_id: impl Into<String>,
        reltype: impl Into<String>,
        target_ref: impl Into<String>,
        target_mode: TargetMode,
    ) -> Self {
        Self {
            base_uri: base_uri.into(),
            r_id: r_id.into(),
            reltype: reltype.into(),
            target_ref: target_ref.into(),
            target_mode,
        }
    }

    /// Directory of the owning source.
    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Relationship id, e.g. `rId1`. Unique within its collection only.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Relationship type URI.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Target exactly as written in the manifest.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn target_mode(&self) -> TargetMode {
        self.target_mode
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_mode == TargetMode::External
    }

    /// Absolute part name of the target.
    ///
    /// Fails with [`Error::ExternalTarget`] for external relationships, whose
    /// target is not a part of this package.
    pub fn target_partname(&self) -> Result<PartName> {
        if self.is_external() {
            return Err(Error::ExternalTarget {
                r_id: self.r_id.clone(),
            });
        }
        PartName::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// The ordered relationships of one source (a part or the package).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializedRelationshipCollection {
    base_uri: String,
    srels: Vec<SerializedRelationship>,
}

impl SerializedRelationshipCollection {
    /// Create an empty collection for the source directory `base_uri`.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            srels: Vec::new(),
        }
    }

    /// Parse a `.rels` document.
    ///
    /// `None` or a blank document yields an empty collection; a source
    /// without relationships simply has no manifest.
    pub fn load_from_xml(base_uri: &str, rels_xml: Option<&[u8]>) -> Result<Self> {
        let mut srels = Self::new(base_uri);

        let content = match rels_xml {
            Some(bytes) => decode_xml_bytes(bytes)?,
            None => return Ok(srels),
        };
        if content.trim().is_empty() {
            return Ok(srels);
        }

        let mut reader = quick_xml::Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let r_id = required_attr(e, b"Id")?;
                    let reltype = required_attr(e, b"Type")?;
                    let target_ref = required_attr(e, b"Target")?;
                    let mode = TargetMode::from_attr(attr_value(e, b"TargetMode")?.as_deref());
                    srels.push(SerializedRelationship::new(
                        base_uri, r_id, reltype, target_ref, mode,
                    ));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(srels)
    }

    /// Append a relationship, rebasing it onto this collection's source.
    pub fn push(&mut self, mut srel: SerializedRelationship) {
        srel.base_uri.clone_from(&self.base_uri);
        self.srels.push(srel);
    }

    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Relationship with id `r_id`, if any.
    pub fn get(&self, r_id: &str) -> Option<&SerializedRelationship> {
        self.srels.iter().find(|srel| srel.r_id == r_id)
    }

    /// Relationships in manifest order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, SerializedRelationship> {
        self.srels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.srels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.srels.is_empty()
    }
}

impl<'a> IntoIterator for &'a SerializedRelationshipCollection {
    type Item = &'a SerializedRelationship;
    type IntoIter = std::slice::Iter<'a, SerializedRelationship>;

    fn into_iter(self) -> Self::IntoIter {
        self.srels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::relationship_type as RT;

    const RELS_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="http://example.com/a?b=1&amp;c=2" TargetMode="External"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png" TargetMode="Internal"/>
</Relationships>"#;

    #[test]
    fn test_load_from_xml_keeps_manifest_order() {
        let srels = SerializedRelationshipCollection::load_from_xml("/ppt/slides", Some(RELS_XML))
            .unwrap();
        let ids: Vec<&str> = srels.iter().map(|r| r.r_id()).collect();
        assert_eq!(ids, ["rId2", "rId1", "rId3"]);
        assert_eq!(srels.base_uri(), "/ppt/slides");

        let hyperlink = srels.get("rId1").unwrap();
        assert!(hyperlink.is_external());
        assert_eq!(hyperlink.reltype(), RT::HYPERLINK);
        assert_eq!(hyperlink.target_ref(), "http://example.com/a?b=1&c=2");

        let layout = srels.get("rId2").unwrap();
        assert_eq!(layout.reltype(), RT::SLIDE_LAYOUT);
        assert_eq!(
            layout.target_partname().unwrap().as_str(),
            "/ppt/slideLayouts/slideLayout1.xml"
        );
    }

    #[test]
    fn test_empty_sources() {
        let none = SerializedRelationshipCollection::load_from_xml("/", None).unwrap();
        assert!(none.is_empty());
        assert_eq!(none.iter().count(), 0);

        let blank = SerializedRelationshipCollection::load_from_xml("/", Some(b"  \n")).unwrap();
        assert!(blank.is_empty());

        let bare = SerializedRelationshipCollection::load_from_xml("/", Some(b"<Relationships/>"))
            .unwrap();
        assert_eq!(bare.len(), 0);
    }

    #[test]
    fn test_target_mode_from_attr() {
        assert_eq!(TargetMode::from_attr(None), TargetMode::Internal);
        assert_eq!(TargetMode::from_attr(Some("Internal")), TargetMode::Internal);
        assert_eq!(TargetMode::from_attr(Some("External")), TargetMode::External);
        assert_eq!(TargetMode::from_attr(Some("FOOBAR")), TargetMode::Internal);
    }

    #[test]
    fn test_target_partname() {
        let cases = [
            ("/", "docProps/core.xml", "/docProps/core.xml"),
            ("/ppt", "viewProps.xml", "/ppt/viewProps.xml"),
            (
                "/ppt/slides",
                "../slideLayouts/slideLayout1.xml",
                "/ppt/slideLayouts/slideLayout1.xml",
            ),
        ];
        for (base_uri, target_ref, expected) in cases {
            let srel =
                SerializedRelationship::new(base_uri, "rId1", "t", target_ref, TargetMode::Internal);
            assert_eq!(srel.target_partname().unwrap().as_str(), expected);
        }
    }

    #[test]
    fn test_target_partname_fails_when_external() {
        let srel = SerializedRelationship::new(
            "/",
            "rId9",
            "ReLtYpE",
            "docProps/core.xml",
            TargetMode::External,
        );
        let err = srel.target_partname().unwrap_err();
        assert!(matches!(err, Error::ExternalTarget { ref r_id } if r_id == "rId9"));
    }

    #[test]
    fn test_missing_required_attribute_is_rejected() {
        let xml = br#"<Relationships><Relationship Id="rId1" Type="t"/></Relationships>"#;
        let err = SerializedRelationshipCollection::load_from_xml("/", Some(xml)).unwrap_err();
        assert!(matches!(err, Error::XmlParse(ref m) if m.contains("Target")));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let xml = br#"<Relationships><Relationship Id="rId1" Type="t" Target="a.xml"></Relationships>"#;
        assert!(SerializedRelationshipCollection::load_from_xml("/", Some(xml)).is_err());
    }

    #[test]
    fn test_push_rebases_onto_collection() {
        let mut srels = SerializedRelationshipCollection::new("/word");
        srels.push(SerializedRelationship::new(
            "/elsewhere",
            "rId1",
            "t",
            "styles.xml",
            TargetMode::Internal,
        ));
        let srel = srels.get("rId1").unwrap();
        assert_eq!(srel.target_partname().unwrap().as_str(), "/word/styles.xml");
        assert_eq!((&srels).into_iter().count(), 1);
    }
}
