//! Tokenizer implementations for text analysis.
//!
//! Tokenizers cut a text run into contiguous tokens carrying byte offsets into
//! that run. Unlike search-oriented tokenizers they never drop input: the
//! concatenation of the emitted tokens is the input itself.
//!
//! # Available Tokenizers
//!
//! - [`word::WordTokenizer`] - Alternating word / non-word runs
//! - [`sentence::SentenceTokenizer`] - Sentence (or sentence-equivalent) units
//!
//! # Examples
//!
//! ```
//! use bionic_epub::analysis::tokenizer::Tokenizer;
//! use bionic_epub::analysis::tokenizer::word::WordTokenizer;
//!
//! let tokenizer = WordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, world").unwrap().collect();
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[1].text, ", ");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so tokenizers can be shared by the
/// document workers.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod sentence;
pub mod word;

pub use sentence::SentenceTokenizer;
pub use word::WordTokenizer;
