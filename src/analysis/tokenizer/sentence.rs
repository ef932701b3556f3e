//! Sentence tokenizer.
//!
//! Cuts a text run into sentence-equivalent units for the dependency parser.
//! A unit ends after a run of terminal punctuation (Chinese and Latin) plus
//! any closing quotes or brackets, or after a line break. A Latin full stop
//! only ends a unit when followed by blanks or the end of the run, so
//! decimals like "3.5" stay whole. Units are contiguous: every byte of the
//! input belongs to exactly one unit.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(concat!(
        r#"[。！？!?；;…]+[”’」』）)\]"'》〉]*"#,
        r#"|\.+[”’」』）)\]"'》〉]*(?:[ \t]+|$)"#,
        r#"|\n+"#,
    ))
    .expect("sentence boundary pattern is valid");
}

/// A tokenizer that emits one token per sentence.
///
/// # Examples
///
/// ```
/// use bionic_epub::analysis::tokenizer::Tokenizer;
/// use bionic_epub::analysis::tokenizer::sentence::SentenceTokenizer;
///
/// let sentences: Vec<_> = SentenceTokenizer::new()
///     .tokenize("他吃了苹果。她喝了水！")
///     .unwrap()
///     .map(|t| t.text)
///     .collect();
/// assert_eq!(sentences, vec!["他吃了苹果。", "她喝了水！"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SentenceTokenizer;

impl SentenceTokenizer {
    /// Create a new sentence tokenizer.
    pub fn new() -> Self {
        SentenceTokenizer
    }
}

impl Tokenizer for SentenceTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut start = 0;

        for mat in SENTENCE_END.find_iter(text) {
            if mat.end() > start {
                tokens.push(Token::with_offsets(
                    &text[start..mat.end()],
                    tokens.len(),
                    start,
                    mat.end(),
                ));
                start = mat.end();
            }
        }

        if start < text.len() {
            tokens.push(Token::with_offsets(
                &text[start..],
                tokens.len(),
                start,
                text.len(),
            ));
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "sentence"
    }
}
