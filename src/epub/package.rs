//! OPF package document.
//!
//! The package is kept as a parsed [`Document`] so edits (a new manifest
//! item, title and identifier markers) touch only the nodes they change and
//! everything else is written back as it was read.

use crate::document::node::{Attribute, QualifiedName};
use crate::document::{Document, NodeId, parser, serializer};
use crate::error::{BionicError, Result};

pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";
pub const HTML_MEDIA_TYPE: &str = "text/html";
pub const CSS_MEDIA_TYPE: &str = "text/css";
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// One `<item>` of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Location relative to the package document.
    pub href: String,
    pub media_type: String,
}

impl ManifestItem {
    pub fn new<I: Into<String>, H: Into<String>, M: Into<String>>(
        id: I,
        href: H,
        media_type: M,
    ) -> Self {
        ManifestItem {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
        }
    }

    /// Whether the item is an (X)HTML content document.
    pub fn is_content_document(&self) -> bool {
        let media_type = self.media_type.trim();
        media_type.eq_ignore_ascii_case(XHTML_MEDIA_TYPE)
            || media_type.eq_ignore_ascii_case(HTML_MEDIA_TYPE)
    }
}

/// A parsed package document.
#[derive(Debug, Clone)]
pub struct Package {
    document: Document,
    manifest: Vec<ManifestItem>,
    spine: Vec<String>,
    toc: Option<String>,
}

impl Package {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let document = parser::parse_bytes(bytes)?;

        let package = document
            .first_element("package")
            .ok_or_else(|| BionicError::package("package document has no <package> element"))?;
        let manifest_node = document
            .child_element(package, "manifest")
            .ok_or_else(|| BionicError::package("package document has no <manifest>"))?;
        let spine_node = document
            .child_element(package, "spine")
            .ok_or_else(|| BionicError::package("package document has no <spine>"))?;

        let mut manifest = Vec::new();
        for item in element_children(&document, manifest_node, "item") {
            let (Some(id), Some(href)) = (document.attribute(item, "id"), document.attribute(item, "href"))
            else {
                log::warn!("Skipping manifest item without id or href");
                continue;
            };
            manifest.push(ManifestItem::new(
                id,
                href,
                document.attribute(item, "media-type").unwrap_or_default(),
            ));
        }

        let spine = element_children(&document, spine_node, "itemref")
            .into_iter()
            .filter_map(|itemref| document.attribute(itemref, "idref").map(str::to_string))
            .collect();
        let toc = document.attribute(spine_node, "toc").map(str::to_string);

        Ok(Package {
            document,
            manifest,
            spine,
            toc,
        })
    }

    pub fn manifest(&self) -> &[ManifestItem] {
        &self.manifest
    }

    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// Spine idrefs in reading order.
    pub fn spine(&self) -> &[String] {
        &self.spine
    }

    /// Manifest items in spine order. Unknown idrefs are skipped.
    pub fn spine_items(&self) -> Vec<&ManifestItem> {
        self.spine
            .iter()
            .filter_map(|idref| {
                let item = self.item(idref);
                if item.is_none() {
                    log::warn!("Spine references unknown manifest item '{idref}'");
                }
                item
            })
            .collect()
    }

    /// The NCX table of contents, if the book has one.
    pub fn ncx_item(&self) -> Option<&ManifestItem> {
        self.toc
            .as_deref()
            .and_then(|id| self.item(id))
            .or_else(|| {
                self.manifest
                    .iter()
                    .find(|item| item.media_type.eq_ignore_ascii_case(NCX_MEDIA_TYPE))
            })
    }

    pub fn title(&self) -> Option<String> {
        self.title_node().map(|id| self.document.text_content(id))
    }

    /// The identifier named by `unique-identifier`, or the first one.
    pub fn identifier(&self) -> Option<String> {
        self.identifier_node()
            .map(|id| self.document.text_content(id).trim().to_string())
    }

    /// Add an item to the manifest.
    ///
    /// An item with the same id and href is already there and is left as it
    /// is; the same id with another href is an error.
    pub fn add_item(&mut self, item: ManifestItem) -> Result<()> {
        if let Some(existing) = self.item(&item.id) {
            if existing.href == item.href {
                return Ok(());
            }
            return Err(BionicError::package(format!(
                "manifest id '{}' is already used by '{}'",
                item.id, existing.href
            )));
        }

        let manifest = self
            .document
            .first_element("manifest")
            .ok_or_else(|| BionicError::package("package document has no <manifest>"))?;
        let name = self.sibling_name(manifest, "item");
        let element = self.document.create_element(
            name,
            vec![
                Attribute::new("id", item.id.as_str()),
                Attribute::new("href", item.href.as_str()),
                Attribute::new("media-type", item.media_type.as_str()),
            ],
        );
        self.document.append_child(manifest, element)?;
        self.manifest.push(item);
        Ok(())
    }

    /// Append `suffix` to the title unless it already ends with it.
    ///
    /// Returns whether the title changed.
    pub fn mark_title(&mut self, suffix: &str) -> Result<bool> {
        let Some(node) = self.title_node() else {
            log::warn!("Package has no dc:title; title left unmarked");
            return Ok(false);
        };
        let title = self.document.text_content(node);
        if suffix.is_empty() || title.ends_with(suffix) {
            return Ok(false);
        }
        self.document
            .set_text_content(node, format!("{}{suffix}", title.trim_end()))?;
        Ok(true)
    }

    /// Append `suffix` to the unique identifier unless it already ends with
    /// it. Returns the identifier after the edit.
    pub fn mark_identifier(&mut self, suffix: &str) -> Result<Option<String>> {
        let Some(node) = self.identifier_node() else {
            log::warn!("Package has no dc:identifier; identifier left unmarked");
            return Ok(None);
        };
        let identifier = self.document.text_content(node).trim().to_string();
        if suffix.is_empty() || identifier.ends_with(suffix) {
            return Ok(Some(identifier));
        }
        let marked = format!("{identifier}{suffix}");
        self.document.set_text_content(node, marked.as_str())?;
        Ok(Some(marked))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serializer::to_bytes(&self.document)
    }

    fn dc_element(&self, local: &str) -> Vec<NodeId> {
        self.document
            .find_elements(local)
            .into_iter()
            .filter(|id| {
                self.document
                    .element(*id)
                    .is_some_and(|e| e.name.namespace == DC_NAMESPACE)
            })
            .collect()
    }

    fn title_node(&self) -> Option<NodeId> {
        self.dc_element("title").into_iter().next()
    }

    fn identifier_node(&self) -> Option<NodeId> {
        let identifiers = self.dc_element("identifier");
        let unique = self
            .document
            .first_element("package")
            .and_then(|p| self.document.attribute(p, "unique-identifier"));

        unique
            .and_then(|unique| {
                identifiers
                    .iter()
                    .copied()
                    .find(|id| self.document.attribute(*id, "id") == Some(unique))
            })
            .or_else(|| identifiers.first().copied())
    }

    /// A name in the same namespace (and prefix) as `parent`.
    fn sibling_name(&self, parent: NodeId, local: &str) -> QualifiedName {
        match self.document.element(parent) {
            Some(element) => QualifiedName {
                prefix: element.name.prefix.clone(),
                namespace: element.name.namespace.clone(),
                local: local.to_string(),
            },
            None => QualifiedName::local(local),
        }
    }
}

fn element_children(document: &Document, parent: NodeId, local: &str) -> Vec<NodeId> {
    document
        .children(parent)
        .iter()
        .copied()
        .filter(|id| document.element(*id).is_some_and(|e| e.name.is(local)))
        .collect()
}

/// Point `dtb:uid` of an NCX document at `identifier`.
///
/// Returns the rewritten NCX, or `None` when it has no `dtb:uid` entry.
pub fn mark_ncx_identifier(ncx: &[u8], identifier: &str) -> Result<Option<Vec<u8>>> {
    let mut document = parser::parse_bytes(ncx)?;
    let meta = document
        .find_elements("meta")
        .into_iter()
        .find(|id| document.attribute(*id, "name") == Some("dtb:uid"));

    match meta {
        Some(meta) => {
            document.set_attribute(meta, "content", identifier)?;
            Ok(Some(serializer::to_bytes(&document)))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="isbn">978-7-000-00000-0</dc:identifier>
    <dc:identifier id="bookid">urn:uuid:1234</dc:identifier>
    <dc:title>示例</dc:title>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="c1" href="text/c1.xhtml" media-type="application/xhtml+xml"/>
    <item id="cover" href="images/cover.jpg" media-type="image/jpeg"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="c1"/>
    <itemref idref="missing"/>
  </spine>
</package>"#;

    #[test]
    fn test_parse_manifest_and_spine() {
        let package = Package::parse(OPF.as_bytes()).unwrap();
        assert_eq!(package.manifest().len(), 3);
        assert_eq!(package.spine(), ["c1".to_string(), "missing".to_string()]);

        let spine: Vec<&str> = package.spine_items().iter().map(|i| i.href.as_str()).collect();
        assert_eq!(spine, vec!["text/c1.xhtml"]);
        assert!(package.item("c1").unwrap().is_content_document());
        assert!(!package.item("cover").unwrap().is_content_document());
        assert_eq!(package.ncx_item().unwrap().href, "toc.ncx");
        assert_eq!(package.title().as_deref(), Some("示例"));
        assert_eq!(package.identifier().as_deref(), Some("urn:uuid:1234"));
    }

    #[test]
    fn test_mark_metadata() {
        let mut package = Package::parse(OPF.as_bytes()).unwrap();
        assert!(package.mark_title(" (Bionic)").unwrap());
        assert!(!package.mark_title(" (Bionic)").unwrap());
        assert_eq!(
            package.mark_identifier("-bionic").unwrap().as_deref(),
            Some("urn:uuid:1234-bionic")
        );

        let out = String::from_utf8(package.to_bytes()).unwrap();
        assert!(out.contains("<dc:title>示例 (Bionic)</dc:title>"));
        assert!(out.contains("978-7-000-00000-0</dc:identifier>"));
        assert!(out.contains("urn:uuid:1234-bionic"));
    }

    #[test]
    fn test_add_item() {
        let mut package = Package::parse(OPF.as_bytes()).unwrap();
        let css = ManifestItem::new("bionic-styles", "style/bionic-styles.css", CSS_MEDIA_TYPE);
        package.add_item(css.clone()).unwrap();
        package.add_item(css).unwrap();
        assert_eq!(package.manifest().len(), 4);

        let clash = ManifestItem::new("bionic-styles", "other.css", CSS_MEDIA_TYPE);
        assert!(package.add_item(clash).is_err());

        let reparsed = Package::parse(&package.to_bytes()).unwrap();
        assert_eq!(
            reparsed.item("bionic-styles").unwrap().href,
            "style/bionic-styles.css"
        );
    }

    #[test]
    fn test_missing_manifest() {
        let err = Package::parse(b"<package xmlns=\"http://www.idpf.org/2007/opf\"><spine/></package>")
            .unwrap_err();
        assert!(matches!(err, BionicError::Package(_)));
    }

    #[test]
    fn test_mark_ncx_identifier() {
        let ncx = r#"<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/"><head><meta name="dtb:uid" content="urn:uuid:1234"/></head></ncx>"#;
        let out = mark_ncx_identifier(ncx.as_bytes(), "urn:uuid:1234-bionic")
            .unwrap()
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("content=\"urn:uuid:1234-bionic\""));

        assert!(mark_ncx_identifier(b"<ncx/>", "x").unwrap().is_none());
    }
}
