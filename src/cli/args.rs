//! Command line argument parsing for the bionic-epub CLI using clap.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisMode;
use crate::analysis::analyzer::ArgumentSpan;
use crate::error::{BionicError, Result};
use crate::pipeline::BionicConfig;

/// bionic-epub - bionic reading annotations for EPUB books
#[derive(Parser, Debug, Clone)]
#[command(name = "bionic-epub")]
#[command(about = "Mark subjects, predicates and objects (or word prefixes) in EPUB books")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct BionicArgs {
    /// EPUB file to process
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the result (default: <INPUT stem>_bionic.epub next to INPUT)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Annotation mode (default: svo, or the config file's mode)
    #[arg(short, long, value_enum)]
    pub mode: Option<AnalysisMode>,

    /// Custom stylesheet replacing the built-in one
    #[arg(long, value_name = "CSS_FILE")]
    pub css: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// UDPipe REST endpoint
    #[cfg(feature = "udpipe")]
    #[arg(long, value_name = "URL", env = "BIONIC_UDPIPE_URL")]
    pub udpipe_url: Option<String>,

    /// UDPipe model name or prefix
    #[cfg(feature = "udpipe")]
    #[arg(long, value_name = "MODEL")]
    pub udpipe_model: Option<String>,

    /// Precomputed CoNLL-U parses to use instead of the parsing service
    #[arg(long, value_name = "CONLLU_FILE")]
    pub conllu: Option<PathBuf>,

    /// Mark whole argument phrases instead of their head words
    #[arg(long)]
    pub subtree: bool,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl BionicArgs {
    /// Get the effective verbosity level (0 quiet, 1 normal, 2 info, 3+ debug)
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }

    /// Check that INPUT is an existing `.epub` file.
    pub fn validate_input(&self) -> Result<()> {
        let input = &self.input;
        if !input.exists() {
            return Err(BionicError::input(format!(
                "EPUB file does not exist: {}",
                input.display()
            )));
        }
        if !input.is_file() {
            return Err(BionicError::input(format!(
                "Path is not a file: {}",
                input.display()
            )));
        }
        let is_epub = input
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("epub"));
        if !is_epub {
            return Err(BionicError::input(format!(
                "File must be an EPUB: {}",
                input.display()
            )));
        }
        Ok(())
    }

    /// The output path, explicit or derived from INPUT.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => default_output_path(&self.input),
        }
    }

    /// The configuration file (if any) with command line overrides applied.
    pub fn load_config(&self) -> Result<BionicConfig> {
        let mut config = match &self.config {
            Some(path) => BionicConfig::from_file(path)?,
            None => BionicConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        #[cfg(feature = "udpipe")]
        {
            if let Some(url) = &self.udpipe_url {
                config.udpipe.url = url.clone();
            }
            if let Some(model) = &self.udpipe_model {
                config.udpipe.model = model.clone();
            }
        }
        if let Some(conllu) = &self.conllu {
            config.conllu = Some(conllu.clone());
        }
        if self.subtree {
            config.argument_span = ArgumentSpan::Subtree;
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }

        config.validate()?;
        Ok(config)
    }
}

/// `<stem>_bionic.epub` in the directory of `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());
    input.with_file_name(format!("{stem}_bionic.epub"))
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
