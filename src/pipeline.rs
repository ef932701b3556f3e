//! The processing pipeline.
//!
//! For every spine document: extract text runs, analyze each run, annotate
//! it, splice the fragments back and serialize the tree. Documents run in
//! parallel on a bounded thread pool; the book is only modified once every
//! document has succeeded.
//!
//! # Examples
//!
//! ```
//! use bionic_epub::analysis::AnalysisMode;
//! use bionic_epub::pipeline::{BionicConfig, BionicProcessor};
//!
//! let config = BionicConfig::default()
//!     .with_mode(AnalysisMode::Prefix)
//!     .with_threads(1);
//! let processor = BionicProcessor::new(config).unwrap();
//!
//! let fragment = processor.process_text("reading").unwrap();
//! assert_eq!(fragment.segments[0].text, "rea");
//! ```

pub mod config;
pub mod processor;

pub use config::BionicConfig;
pub use processor::{BionicProcessor, DocumentStats, ProcessingSummary, RoleCounts};
