//! Word / non-word tokenizer.
//!
//! Splits text into alternating runs of word graphemes (first character
//! alphanumeric) and everything else (punctuation, whitespace, symbols).
//! Boundaries come from character classes only; no dictionary is involved.
//! Grapheme clusters keep combining marks attached to their base letter, so
//! a decomposed "café" is still one word.

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that emits alternating word and non-word tokens.
///
/// # Examples
///
/// ```
/// use bionic_epub::analysis::tokenizer::Tokenizer;
/// use bionic_epub::analysis::tokenizer::word::WordTokenizer;
///
/// let tokens: Vec<_> = WordTokenizer::new().tokenize("fast  reading!").unwrap().collect();
/// let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
/// assert_eq!(texts, vec!["fast", "  ", "reading", "!"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    /// Create a new word tokenizer.
    pub fn new() -> Self {
        WordTokenizer
    }

    /// Whether a grapheme cluster belongs to a word.
    pub fn is_word_grapheme(grapheme: &str) -> bool {
        grapheme.chars().next().is_some_and(char::is_alphanumeric)
    }

    fn make_token(text: &str, position: usize, start: usize, end: usize) -> Token {
        Token::with_offsets(&text[start..end], position, start, end)
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut run_start = 0;
        let mut run_is_word: Option<bool> = None;

        for (offset, grapheme) in text.grapheme_indices(true) {
            let is_word = Self::is_word_grapheme(grapheme);
            if let Some(previous) = run_is_word {
                if previous != is_word {
                    tokens.push(Self::make_token(text, tokens.len(), run_start, offset));
                    run_start = offset;
                }
            }
            run_is_word = Some(is_word);
        }

        if run_start < text.len() {
            tokens.push(Self::make_token(text, tokens.len(), run_start, text.len()));
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "word"
    }
}
