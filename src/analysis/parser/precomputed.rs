//! Parser backed by a pre-computed CoNLL-U file.
//!
//! Useful when the book has already been parsed offline (by any tool that
//! emits CoNLL-U) or when no parsing service is reachable. Sentences are looked
//! up by their text with all whitespace removed; a sentence that was not
//! parsed ahead of time is an analysis error.
//!
//! The lookup key of a parse is its `# text =` comment, or the concatenation of
//! its forms when the comment is missing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::analysis::parser::{DependencyParser, ParsedSentence, parse_conllu};
use crate::error::{BionicError, Result};

/// A parser that answers from a table of pre-computed parses.
///
/// # Examples
///
/// ```
/// use bionic_epub::analysis::parser::{DependencyParser, PrecomputedParser};
///
/// let parser = PrecomputedParser::from_conllu(
///     "# text = 走\n1\t走\t走\tVERB\t_\t_\t0\troot\t_\t_\n",
/// ).unwrap();
/// assert_eq!(parser.parse(" 走 ").unwrap().tokens[0].relation, "root");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrecomputedParser {
    sentences: HashMap<String, ParsedSentence>,
}

fn lookup_key(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

impl PrecomputedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from CoNLL-U text.
    pub fn from_conllu(input: &str) -> Result<Self> {
        let mut parser = Self::new();
        for sentence in parse_conllu(input)? {
            parser.insert(sentence);
        }
        Ok(parser)
    }

    /// Load a CoNLL-U file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|e| {
            BionicError::input(format!("cannot read CoNLL-U file {}: {e}", path.display()))
        })?;
        let parser = Self::from_conllu(&input)?;
        log::info!(
            "Loaded {} pre-computed parses from {}",
            parser.len(),
            path.display()
        );
        Ok(parser)
    }

    /// Register a parse. A later parse of the same text replaces the earlier one.
    pub fn insert(&mut self, sentence: ParsedSentence) {
        let key = match &sentence.text {
            Some(text) => lookup_key(text),
            None => sentence
                .tokens
                .iter()
                .map(|t| lookup_key(&t.form))
                .collect(),
        };
        self.sentences.insert(key, sentence);
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

impl DependencyParser for PrecomputedParser {
    fn parse(&self, sentence: &str) -> Result<ParsedSentence> {
        self.sentences
            .get(&lookup_key(sentence))
            .cloned()
            .ok_or_else(|| {
                BionicError::analysis(format!("no pre-computed parse for sentence '{sentence}'"))
            })
    }

    fn name(&self) -> &'static str {
        "precomputed"
    }
}
