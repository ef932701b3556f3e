//! Configuration for a processing run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::AnalysisMode;
use crate::analysis::analyzer::dependency::ArgumentSpan;
#[cfg(feature = "udpipe")]
use crate::analysis::parser::UdpipeConfig;
use crate::analysis::relation::RelationScheme;
use crate::annotation::AnnotationConfig;
use crate::document::ExtractionConfig;
use crate::error::{BionicError, Result};

/// Everything a [`BionicProcessor`](crate::pipeline::BionicProcessor) needs.
///
/// Every field has a default, so a JSON config file only lists what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BionicConfig {
    /// Which analyzer annotates text.
    pub mode: AnalysisMode,

    /// Inline element and classes of the annotations.
    pub annotation: AnnotationConfig,

    /// Which text is annotated.
    pub extraction: ExtractionConfig,

    /// Relation labels and POS tags driving role assignment.
    pub relations: RelationScheme,

    /// Whether whole argument phrases or only their heads are marked.
    pub argument_span: ArgumentSpan,

    /// Dependency parsing service.
    #[cfg(feature = "udpipe")]
    pub udpipe: UdpipeConfig,

    /// CoNLL-U file with precomputed parses, used instead of the service.
    pub conllu: Option<PathBuf>,

    /// Worker threads. If None, uses the number of CPU cores.
    pub threads: Option<usize>,

    /// Appended to the book title.
    pub title_suffix: String,

    /// Appended to the unique identifier.
    pub identifier_suffix: String,
}

impl Default for BionicConfig {
    fn default() -> Self {
        BionicConfig {
            mode: AnalysisMode::default(),
            annotation: AnnotationConfig::default(),
            extraction: ExtractionConfig::default(),
            relations: RelationScheme::default(),
            argument_span: ArgumentSpan::default(),
            #[cfg(feature = "udpipe")]
            udpipe: UdpipeConfig::default(),
            conllu: None,
            threads: None,
            title_suffix: " (Bionic)".to_string(),
            identifier_suffix: "-bionic".to_string(),
        }
    }
}

impl BionicConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            BionicError::input(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: BionicConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationConfig) -> Self {
        self.annotation = annotation;
        self
    }

    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_relations(mut self, relations: RelationScheme) -> Self {
        self.relations = relations;
        self
    }

    pub fn with_argument_span(mut self, argument_span: ArgumentSpan) -> Self {
        self.argument_span = argument_span;
        self
    }

    #[cfg(feature = "udpipe")]
    pub fn with_udpipe(mut self, udpipe: UdpipeConfig) -> Self {
        self.udpipe = udpipe;
        self
    }

    pub fn with_conllu<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.conllu = Some(path.into());
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Number of worker threads to start.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    /// Check the configuration before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.annotation.validate()?;
        if self.threads == Some(0) {
            return Err(BionicError::invalid_config("threads must be at least 1"));
        }
        Ok(())
    }
}
