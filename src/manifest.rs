//! Serializable summary of a resolved package.

use crate::detect::{detect_format, FormatType};
use crate::error::Result;
use crate::pkgreader::PackageReader;
use crate::rels::TargetMode;
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

/// Everything the graph walk resolved, minus the part payloads.
#[derive(Debug, Clone, Serialize)]
pub struct PackageManifest {
    /// Office document kind, when the main part identifies one.
    pub kind: Option<FormatType>,
    pub content_types: ContentTypesEntry,
    /// Parts in discovery order.
    pub parts: Vec<PartEntry>,
    /// Relationships, package-level first.
    pub relationships: Vec<RelationshipEntry>,
}

/// The content-type map, sorted for stable output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentTypesEntry {
    pub defaults: BTreeMap<String, String>,
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartEntry {
    pub partname: String,
    pub content_type: String,
    pub reltype: String,
    /// Payload size in bytes.
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipEntry {
    /// Part name of the source, `/` for the package.
    pub source: String,
    pub r_id: String,
    pub reltype: String,
    pub target_ref: String,
    pub target_mode: TargetMode,
    /// Resolved target; absent for external relationships.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_partname: Option<String>,
}

impl PackageManifest {
    /// Summarize `package`.
    pub fn from_package(package: &PackageReader) -> Self {
        let content_types = ContentTypesEntry {
            defaults: package
                .content_types()
                .defaults()
                .iter()
                .map(|(ext, ct)| (ext.clone(), ct.clone()))
                .collect(),
            overrides: package
                .content_types()
                .overrides()
                .iter()
                .map(|(pn, ct)| (pn.to_string(), ct.clone()))
                .collect(),
        };

        let parts = package
            .sparts()
            .iter()
            .map(|spart| PartEntry {
                partname: spart.partname.to_string(),
                content_type: spart.content_type.clone(),
                reltype: spart.reltype.clone(),
                size: spart.blob.len(),
            })
            .collect();

        let relationships = package
            .iter_srels()
            .map(|(source, srel)| RelationshipEntry {
                source: source.to_string(),
                r_id: srel.r_id().to_string(),
                reltype: srel.reltype().to_string(),
                target_ref: srel.target_ref().to_string(),
                target_mode: srel.target_mode(),
                target_partname: srel.target_partname().ok().map(|pn| pn.to_string()),
            })
            .collect();

        Self {
            kind: detect_format(package).ok(),
            content_types,
            parts,
            relationships,
        }
    }

    /// Number of external relationships.
    pub fn external_count(&self) -> usize {
        self.relationships
            .iter()
            .filter(|r| r.target_mode == TargetMode::External)
            .count()
    }
}

/// Serialize the manifest of `package` to JSON.
pub fn to_json(package: &PackageReader, format: JsonFormat) -> Result<String> {
    let manifest = PackageManifest::from_package(package);
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(&manifest)?,
        JsonFormat::Pretty => serde_json::to_string_pretty(&manifest)?,
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{content_type as CT, relationship_type as RT};
    use crate::phys::MemPkgReader;

    fn sample_package() -> PackageReader {
        let phys = MemPkgReader::new()
            .with_member(
                "[Content_Types].xml",
                format!(
                    r#"<Types><Default Extension="xml" ContentType="{}"/><Default Extension="rels" ContentType="{}"/><Override PartName="/word/document.xml" ContentType="{}"/></Types>"#,
                    CT::XML,
                    CT::OPC_RELATIONSHIPS,
                    CT::WML_DOCUMENT_MAIN
                ),
            )
            .with_member(
                "_rels/.rels",
                format!(
                    r#"<Relationships><Relationship Id="rId1" Type="{}" Target="word/document.xml"/></Relationships>"#,
                    RT::OFFICE_DOCUMENT
                ),
            )
            .with_member("word/document.xml", "<w:document/>")
            .with_member(
                "word/_rels/document.xml.rels",
                format!(
                    r#"<Relationships><Relationship Id="rId7" Type="{}" Target="https://example.com" TargetMode="External"/></Relationships>"#,
                    RT::HYPERLINK
                ),
            );
        PackageReader::from_phys_reader(phys).unwrap()
    }

    #[test]
    fn test_manifest_from_package() {
        let manifest = PackageManifest::from_package(&sample_package());

        assert_eq!(manifest.kind, Some(FormatType::Docx));
        assert_eq!(manifest.parts.len(), 1);
        assert_eq!(manifest.parts[0].partname, "/word/document.xml");
        assert_eq!(manifest.parts[0].size, "<w:document/>".len());
        assert_eq!(manifest.relationships.len(), 2);
        assert_eq!(manifest.relationships[0].source, "/");
        assert_eq!(
            manifest.relationships[0].target_partname.as_deref(),
            Some("/word/document.xml")
        );
        assert_eq!(manifest.external_count(), 1);
        assert_eq!(manifest.content_types.defaults.len(), 2);
    }

    #[test]
    fn test_to_json_includes_external_relationships() {
        let json = to_json(&sample_package(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"kind\": \"docx\""));
        assert!(json.contains("\"target_mode\": \"External\""));
        assert!(json.contains("https://example.com"));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample_package(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["parts"][0]["content_type"], CT::WML_DOCUMENT_MAIN);
    }
}
