//! Content-type resolution from the `[Content_Types].xml` manifest.

use crate::error::{Error, Result};
use crate::partname::PartName;
use crate::xml::{decode_xml_bytes, required_attr};
use quick_xml::events::Event;
use std::collections::HashMap;

/// Maps part names to content types.
///
/// An `Override` entry for the exact part name wins; otherwise the `Default`
/// entry for the part name's extension applies. Both lookups ignore case.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeMap {
    overrides: HashMap<PartName, String>,
    defaults: HashMap<String, String>,
}

impl ContentTypeMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `[Content_Types].xml` document.
    ///
    /// Later entries with the same key replace earlier ones.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let content = decode_xml_bytes(xml)?;
        let mut map = Self::new();

        let mut reader = quick_xml::Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match e.local_name().as_ref() {
                        b"Default" => {
                            let extension = required_attr(e, b"Extension")?;
                            let content_type = required_attr(e, b"ContentType")?;
                            map.add_default(&extension, content_type);
                        }
                        b"Override" => {
                            let partname = PartName::new(required_attr(e, b"PartName")?)?;
                            let content_type = required_attr(e, b"ContentType")?;
                            map.add_override(partname, content_type);
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Register the content type for an extension, e.g. `xml` or `.PNG`.
    pub fn add_default(&mut self, extension: &str, content_type: impl Into<String>) {
        let ext = extension.trim_start_matches('.').to_lowercase();
        self.defaults.insert(ext, content_type.into());
    }

    /// Register the content type for one specific part.
    pub fn add_override(&mut self, partname: PartName, content_type: impl Into<String>) {
        self.overrides.insert(partname, content_type.into());
    }

    /// Content type of `partname`.
    pub fn get(&self, partname: &PartName) -> Result<&str> {
        if let Some(ct) = self.overrides.get(partname) {
            return Ok(ct);
        }

        let ext = partname.ext().to_lowercase();
        if let Some(ct) = self.defaults.get(&ext) {
            return Ok(ct);
        }

        Err(Error::ContentTypeNotFound(partname.to_string()))
    }

    /// Extension defaults, keyed by lowercased extension.
    pub fn defaults(&self) -> &HashMap<String, String> {
        &self.defaults
    }

    /// Per-part overrides.
    pub fn overrides(&self) -> &HashMap<PartName, String> {
        &self.overrides
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.defaults.len() + self.overrides.len()
    }

    /// Whether the manifest declared nothing.
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::content_type as CT;

    fn pn(s: &str) -> PartName {
        PartName::new(s).unwrap()
    }

    #[test]
    fn test_from_xml() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="PNG" ContentType="image/png"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#;

        let map = ContentTypeMap::from_xml(xml).unwrap();
        assert_eq!(map.defaults().len(), 2);
        assert_eq!(map.defaults().get("png").map(String::as_str), Some(CT::PNG));
        assert_eq!(map.overrides().len(), 1);
        assert_eq!(map.get(&pn("/media/image1.png")).unwrap(), CT::PNG);
        assert_eq!(
            map.get(&pn("/ppt/presentation.xml")).unwrap(),
            CT::PML_PRESENTATION_MAIN
        );
    }

    #[test]
    fn test_override_takes_precedence_over_default() {
        let mut map = ContentTypeMap::new();
        map.add_default("xml", CT::XML);
        map.add_override(pn("/a/b.xml"), "app/vnd.override");
        assert_eq!(map.get(&pn("/a/b.xml")).unwrap(), "app/vnd.override");
        assert_eq!(map.get(&pn("/a/c.xml")).unwrap(), CT::XML);
    }

    #[test]
    fn test_override_matches_case_insensitively() {
        let cases = [
            ("/foo/bar.xml", "/foo/bar.xml"),
            ("/foo/bar.xml", "/FOO/Bar.XML"),
            ("/FoO/bAr.XmL", "/foo/bar.xml"),
        ];
        for (registered, looked_up) in cases {
            let mut map = ContentTypeMap::new();
            map.add_override(pn(registered), "appl/vnd-foobar");
            assert_eq!(map.get(&pn(looked_up)).unwrap(), "appl/vnd-foobar");
        }
    }

    #[test]
    fn test_default_matches_extension_case_insensitively() {
        let mut map = ContentTypeMap::new();
        map.add_default(".xml", CT::XML);
        assert_eq!(map.get(&pn("/A/B.XML")).unwrap(), CT::XML);
        assert_eq!(map.get(&pn("/a/b.xml")).unwrap(), CT::XML);
    }

    #[test]
    fn test_last_entry_wins() {
        let xml = br#"<Types>
  <Default Extension="xml" ContentType="first"/>
  <Default Extension="XML" ContentType="second"/>
  <Override PartName="/a.bin" ContentType="one"/>
  <Override PartName="/A.bin" ContentType="two"/>
</Types>"#;
        let map = ContentTypeMap::from_xml(xml).unwrap();
        assert_eq!(map.get(&pn("/x.xml")).unwrap(), "second");
        assert_eq!(map.get(&pn("/a.bin")).unwrap(), "two");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_not_found() {
        let map = ContentTypeMap::new();
        let err = map.get(&pn("/!blat/rhumba.1x&")).unwrap_err();
        assert!(matches!(err, Error::ContentTypeNotFound(ref p) if p == "/!blat/rhumba.1x&"));
    }

    #[test]
    fn test_malformed_manifest() {
        assert!(ContentTypeMap::from_xml(b"<Types><Default Extension=\"xml\"/></Types>").is_err());
        assert!(matches!(
            ContentTypeMap::from_xml(b"<Types><Override PartName=\"a.xml\" ContentType=\"x\"/></Types>"),
            Err(Error::InvalidPartName(_))
        ));
        assert!(matches!(
            ContentTypeMap::from_xml(b"<Types><Default Extension=\"xml\" ContentType=\"x\"></Oops>"),
            Err(Error::XmlParse(_))
        ));
    }

    #[test]
    fn test_empty_manifest() {
        let map = ContentTypeMap::from_xml(b"<Types/>").unwrap();
        assert!(map.is_empty());
    }
}
