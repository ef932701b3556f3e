//! Token types and utilities for text analysis.
//!
//! A [`Token`] is a contiguous span of a text run. Offsets are byte offsets
//! into the run the token was cut from, so `&text[token.start_offset..token.end_offset]`
//! always yields the token's surface text.
//!
//! # Examples
//!
//! ```
//! use bionic_epub::analysis::token::Token;
//!
//! let token = Token::with_offsets("World", 1, 6, 11);
//! assert_eq!(token.text, "World");
//! assert_eq!(token.normalized, "world");
//! assert_eq!(token.start_offset, 6);
//! assert_eq!(token.end_offset, 11);
//! ```

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A token represents a single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The surface text, exactly as it appears in the source run
    pub text: String,

    /// Normalized form (lowercased surface text)
    pub normalized: String,

    /// The position of the token in the token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the original text
    pub start_offset: usize,

    /// The byte offset where this token ends in the original text
    pub end_offset: usize,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        let text = text.into();
        Token {
            normalized: text.to_lowercase(),
            end_offset: text.len(),
            text,
            position,
            start_offset: 0,
        }
    }

    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        let text = text.into();
        Token {
            normalized: text.to_lowercase(),
            text,
            position,
            start_offset,
            end_offset,
        }
    }

    /// Get the byte length of the token text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the token is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The byte range this token covers in its source text.
    pub fn range(&self) -> Range<usize> {
        self.start_offset..self.end_offset
    }

    /// Clone this token with updated position.
    pub fn with_position(&self, position: usize) -> Self {
        let mut token = self.clone();
        token.position = position;
        token
    }

    /// Move the token's offsets forward by `delta` bytes.
    ///
    /// Used when a token cut from a sentence is mapped back onto the whole run.
    pub fn shifted(mut self, delta: usize) -> Self {
        self.start_offset += delta;
        self.end_offset += delta;
        self
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A token stream represents a sequence of tokens from a tokenizer.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;
