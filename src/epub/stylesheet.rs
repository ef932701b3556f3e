//! The stylesheet referenced by annotation classes.

use std::fs;
use std::path::{Component, Path};

use crate::annotation::RoleClasses;
use crate::document::node::{Attribute, QualifiedName};
use crate::document::{Document, NodeId};
use crate::error::{BionicError, Result};

/// Manifest id of the injected stylesheet.
pub const STYLESHEET_ID: &str = "bionic-styles";

/// Location of the injected stylesheet, relative to the package document.
pub const STYLESHEET_HREF: &str = "style/bionic-styles.css";

/// CSS text added to the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    content: String,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::for_classes(&RoleClasses::default())
    }
}

impl Stylesheet {
    /// The built-in stylesheet for the given classes.
    pub fn for_classes(classes: &RoleClasses) -> Self {
        let content = format!(
            "/* Bionic reading annotations */\n\
             .{} {{\n    color: #D95F02;\n    font-weight: bold;\n}}\n\n\
             .{} {{\n    color: #1B9E77;\n    font-weight: bold;\n}}\n\n\
             .{} {{\n    color: #7570B3;\n    font-weight: bold;\n}}\n\n\
             .{} {{\n    font-weight: bold;\n}}\n",
            classes.subject, classes.predicate, classes.object, classes.emphasis
        );
        Stylesheet { content }
    }

    /// User CSS, used as given.
    pub fn from_string<S: Into<String>>(content: S) -> Self {
        Stylesheet {
            content: content.into(),
        }
    }

    /// Load a custom stylesheet.
    ///
    /// Classes the file never mentions are reported as warnings; the spans
    /// still carry them, they just render unstyled.
    pub fn from_file<P: AsRef<Path>>(path: P, classes: &RoleClasses) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BionicError::input(format!(
                "stylesheet does not exist: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).map_err(|e| {
            BionicError::input(format!("cannot read stylesheet {}: {e}", path.display()))
        })?;

        let stylesheet = Stylesheet { content };
        for class in stylesheet.missing_classes(classes) {
            log::warn!(
                "Stylesheet {} has no rule for class '{class}'",
                path.display()
            );
        }
        Ok(stylesheet)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    /// Annotation classes that never appear as `.class` selectors.
    pub fn missing_classes<'c>(&self, classes: &'c RoleClasses) -> Vec<&'c str> {
        classes
            .iter()
            .map(|(_, class)| class)
            .filter(|class| !self.mentions(class))
            .collect()
    }

    fn mentions(&self, class: &str) -> bool {
        let selector = format!(".{class}");
        self.content.match_indices(&selector).any(|(start, _)| {
            let next = self.content[start + selector.len()..].chars().next();
            !next.is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
        })
    }
}

/// Add `<link rel="stylesheet">` for `href` to the document head.
///
/// Returns `false` when the document has no head or already links `href`.
pub fn link_stylesheet(document: &mut Document, href: &str) -> Result<bool> {
    let Some(head) = document.first_element("head") else {
        return Ok(false);
    };

    let linked = document.children(head).iter().any(|id| {
        document
            .element(*id)
            .is_some_and(|e| e.name.is("link") && e.attr("href") == Some(href))
    });
    if linked {
        return Ok(false);
    }

    let name = match document.element(head) {
        Some(element) => QualifiedName {
            prefix: element.name.prefix.clone(),
            namespace: element.name.namespace.clone(),
            local: "link".to_string(),
        },
        None => QualifiedName::local("link"),
    };
    let link: NodeId = document.create_element(
        name,
        vec![
            Attribute::new("rel", "stylesheet"),
            Attribute::new("type", "text/css"),
            Attribute::new("href", href),
        ],
    );
    document.append_child(head, link)?;
    Ok(true)
}

/// Href of `target` as seen from the document at `document_path`.
///
/// Both paths are archive entry names (`/`-separated).
pub fn relative_href(document_path: &str, target: &str) -> String {
    let base = Path::new(document_path)
        .parent()
        .unwrap_or_else(|| Path::new(""));
    match pathdiff::diff_paths(target, base) {
        Some(relative) => relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        None => target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::document::parser::parse_str;
    use crate::document::serializer::to_string;

    #[test]
    fn test_default_covers_all_classes() {
        let classes = RoleClasses::default();
        let stylesheet = Stylesheet::for_classes(&classes);
        assert!(stylesheet.missing_classes(&classes).is_empty());
        assert!(stylesheet.content().contains(".svo-subject {"));
        assert!(stylesheet.content().contains(".bionic-emphasis {"));
    }

    #[test]
    fn test_missing_classes() {
        let classes = RoleClasses::default();
        let stylesheet = Stylesheet::from_string(".svo-subject-x { color: red } .svo-object{}");
        assert_eq!(
            stylesheet.missing_classes(&classes),
            vec!["svo-subject", "svo-predicate", "bionic-emphasis"]
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, ".svo-subject {{ color: blue; }}").unwrap();
        let stylesheet = Stylesheet::from_file(file.path(), &RoleClasses::default()).unwrap();
        assert_eq!(stylesheet.content(), ".svo-subject { color: blue; }");

        let err = Stylesheet::from_file("/nonexistent/style.css", &RoleClasses::default())
            .unwrap_err();
        assert!(matches!(err, BionicError::Input(_)));
    }

    #[test]
    fn test_link_stylesheet() {
        let mut doc = parse_str(
            r#"<html xmlns="http://www.w3.org/1999/xhtml"><head><title>T</title></head><body/></html>"#,
        )
        .unwrap();
        assert!(link_stylesheet(&mut doc, "../style/bionic-styles.css").unwrap());
        assert!(!link_stylesheet(&mut doc, "../style/bionic-styles.css").unwrap());

        let out = to_string(&doc);
        assert!(out.contains(
            "<link rel=\"stylesheet\" type=\"text/css\" href=\"../style/bionic-styles.css\"/></head>"
        ));
        assert_eq!(out.matches("<link").count(), 1);

        let mut headless = parse_str("<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();
        assert!(!link_stylesheet(&mut headless, "a.css").unwrap());
    }

    #[test]
    fn test_relative_href() {
        assert_eq!(
            relative_href("OEBPS/text/c1.xhtml", "OEBPS/style/bionic-styles.css"),
            "../style/bionic-styles.css"
        );
        assert_eq!(
            relative_href("OEBPS/c1.xhtml", "OEBPS/style/bionic-styles.css"),
            "style/bionic-styles.css"
        );
        assert_eq!(relative_href("c1.xhtml", "style/a.css"), "style/a.css");
    }
}
