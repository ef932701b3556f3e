//! Prefix (bionic reading) analyzer.
//!
//! Every word containing a letter has its leading third, counted in grapheme
//! clusters and rounded up, marked as [`SemanticRole::Emphasis`]. A word always
//! gets at least one emphasized grapheme. Numbers, punctuation and whitespace
//! stay unmarked.
//!
//! The analyzer is pure and total: it has no external collaborator and never
//! fails.

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::analyzer::{AnalysisResult, Analyzer};
use crate::analysis::role::SemanticRole;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{Tokenizer, WordTokenizer};
use crate::error::Result;

/// Number of leading graphemes to emphasize in a word of `len` graphemes.
pub fn emphasis_len(len: usize) -> usize {
    len.div_ceil(3).max(1)
}

/// Marks the leading fraction of each word.
#[derive(Clone, Debug, Default)]
pub struct PrefixAnalyzer {
    tokenizer: WordTokenizer,
}

impl PrefixAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn split_word(token: Token, result: &mut AnalysisResult) {
        let bold = emphasis_len(token.text.graphemes(true).count());
        let split = token
            .text
            .grapheme_indices(true)
            .nth(bold)
            .map(|(offset, _)| offset)
            .unwrap_or(token.text.len());

        let start = token.start_offset;
        let head = Token::with_offsets(&token.text[..split], result.len(), start, start + split);
        result.push(head, SemanticRole::Emphasis);

        if split < token.text.len() {
            let tail = Token::with_offsets(
                &token.text[split..],
                result.len(),
                start + split,
                token.end_offset,
            );
            result.push(tail, SemanticRole::Other);
        }
    }
}

impl Analyzer for PrefixAnalyzer {
    fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new();

        for token in self.tokenizer.tokenize(text)? {
            if token.text.chars().any(char::is_alphabetic) {
                Self::split_word(token, &mut result);
            } else {
                let position = result.len();
                result.push(token.with_position(position), SemanticRole::Other);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "prefix"
    }
}
