//! Content documents.
//!
//! XHTML content documents are parsed into an arena ([`Document`]) of nodes
//! addressed by [`NodeId`]. The arena supports exactly what annotation needs:
//!
//! - [`TextExtractor`] walks the tree in document order and yields eligible
//!   text runs;
//! - [`DocumentRewriter`] splices annotated fragments back in place of their
//!   text leaves;
//! - [`serializer`] writes the tree back out as well-formed XML.
//!
//! # Examples
//!
//! ```
//! use bionic_epub::document::{ExtractionConfig, TextExtractor, parser, serializer};
//!
//! let doc = parser::parse_str(
//!     r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p>Hello</p></body></html>"#,
//! ).unwrap();
//!
//! let config = ExtractionConfig::default();
//! let runs: Vec<_> = TextExtractor::new(&doc, &config).collect();
//! assert_eq!(runs[0].text, "Hello");
//!
//! assert!(serializer::to_string(&doc).contains("<p>Hello</p>"));
//! ```

#[allow(clippy::module_inception)]
pub mod document;
pub mod extractor;
pub mod node;
pub mod parser;
pub mod rewriter;
pub mod serializer;

pub use document::{Descendants, Document};
pub use extractor::{ExtractionConfig, TextExtractor, TextRun};
pub use node::{Attribute, ElementData, Node, NodeData, NodeId, QualifiedName, XHTML_NAMESPACE};
pub use rewriter::DocumentRewriter;
