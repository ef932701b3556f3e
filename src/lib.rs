//! # bionic-epub
//!
//! Bionic reading annotations for EPUB books.
//!
//! ## Features
//!
//! - Subject / predicate / object marking for Chinese text from a dependency
//!   parse (UDPipe service or precomputed CoNLL-U)
//! - Prefix emphasis ("bionic reading") for Latin-script text
//! - Lossless, in-place rewriting of XHTML content documents
//! - Parallel, all-or-nothing processing of whole books

pub mod analysis;
pub mod annotation;
pub mod cli;
pub mod document;
pub mod epub;
pub mod error;
pub mod pipeline;

pub mod prelude {
    pub use crate::analysis::{AnalysisMode, AnalysisResult, Analyzer, SemanticRole};
    pub use crate::annotation::{AnnotatedFragment, AnnotationConfig, Annotator};
    pub use crate::document::{Document, DocumentRewriter, TextExtractor};
    pub use crate::epub::{EpubBook, Stylesheet};
    pub use crate::error::{BionicError, Result};
    pub use crate::pipeline::{BionicConfig, BionicProcessor};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
