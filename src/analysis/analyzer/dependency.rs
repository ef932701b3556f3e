//! Dependency-based role analyzer.
//!
//! The run is cut into sentences, each sentence is sent to a
//! [`DependencyParser`], and roles are read off the returned tree:
//!
//! 1. **Clause heads.** A root whose part-of-speech may head a clause, and any
//!    predicate-tagged token attached to a clause head by a clause-linking
//!    relation (`conj`, `parataxis`, `xcomp`, ...). Clause heads become
//!    [`SemanticRole::Predicate`].
//! 2. **Arguments.** A token bearing a subject-type or object-type relation to
//!    a clause head becomes [`SemanticRole::Subject`] or
//!    [`SemanticRole::Object`]. Relations come from the basic tree and from
//!    any enhanced dependencies the parser reports.
//! 3. **Tie-break.** When a token qualifies through several relations (a
//!    pivot that is the object of one verb and the subject of the next), the
//!    relation whose head is the fewest hops away in the basic tree wins; ties
//!    go to the basic edge, then to the lower head index.
//!
//! Everything else is [`SemanticRole::Other`]. In [`ArgumentSpan::Subtree`]
//! mode, unmarked tokens inside an argument's subtree take the argument's
//! role, so whole noun phrases are marked.
//!
//! Parser output is aligned against the sentence text: each form must appear
//! at the cursor after optional whitespace. A parser that rewrites its input
//! (normalizes punctuation, drops characters) fails the alignment and the run.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{AnalysisResult, Analyzer};
use crate::analysis::parser::{DependencyParser, LazyParser, ParsedSentence};
use crate::analysis::relation::RelationScheme;
use crate::analysis::role::SemanticRole;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{SentenceTokenizer, Tokenizer};
use crate::error::{BionicError, Result};

/// How much of an argument is marked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentSpan {
    /// Only the token bearing the subject/object relation.
    #[default]
    Head,
    /// The token and the unmarked tokens of its subtree.
    Subtree,
}

/// A candidate argument relation: (hops, is_enhanced, head index, role).
type Candidate = (usize, bool, usize, SemanticRole);

/// Role analyzer driven by a dependency parse.
#[derive(Debug)]
pub struct DependencyAnalyzer {
    parser: LazyParser,
    scheme: RelationScheme,
    argument_span: ArgumentSpan,
    sentences: SentenceTokenizer,
}

impl DependencyAnalyzer {
    /// Create an analyzer over a lazily loaded parser.
    pub fn new(parser: LazyParser) -> Self {
        DependencyAnalyzer {
            parser,
            scheme: RelationScheme::default(),
            argument_span: ArgumentSpan::default(),
            sentences: SentenceTokenizer::new(),
        }
    }

    /// Create an analyzer over a parser that is already loaded.
    pub fn with_parser(parser: Arc<dyn DependencyParser>) -> Self {
        Self::new(LazyParser::loaded(parser))
    }

    pub fn with_scheme(mut self, scheme: RelationScheme) -> Self {
        self.scheme = scheme.normalized();
        self
    }

    pub fn with_argument_span(mut self, argument_span: ArgumentSpan) -> Self {
        self.argument_span = argument_span;
        self
    }

    pub fn scheme(&self) -> &RelationScheme {
        &self.scheme
    }

    pub fn argument_span(&self) -> ArgumentSpan {
        self.argument_span
    }

    pub fn parser(&self) -> &LazyParser {
        &self.parser
    }

    /// Assign a role to every token of a validated parse.
    fn assign_roles(&self, parsed: &ParsedSentence) -> Vec<SemanticRole> {
        let tree = Tree::new(parsed);
        let clause_heads = self.clause_heads(parsed);

        let mut roles: Vec<Option<SemanticRole>> = (0..parsed.len())
            .map(|i| {
                if clause_heads[i] {
                    Some(SemanticRole::Predicate)
                } else {
                    self.best_argument(parsed, &tree, &clause_heads, i)
                }
            })
            .collect();

        if self.argument_span == ArgumentSpan::Subtree {
            let inherited: Vec<Option<SemanticRole>> = (0..parsed.len())
                .map(|i| match roles[i] {
                    Some(role) => Some(role),
                    None => inherited_role(parsed, &clause_heads, &roles, i),
                })
                .collect();
            roles = inherited;
        }

        roles
            .into_iter()
            .map(|r| r.unwrap_or(SemanticRole::Other))
            .collect()
    }

    /// Mark clause heads: predicate roots, then predicates linked to a clause
    /// head until nothing changes.
    fn clause_heads(&self, parsed: &ParsedSentence) -> Vec<bool> {
        let tokens = &parsed.tokens;
        let mut heads: Vec<bool> = tokens
            .iter()
            .map(|t| t.is_root() && self.scheme.is_predicate_pos(&t.pos))
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for (i, token) in tokens.iter().enumerate() {
                if heads[i] || token.is_root() {
                    continue;
                }
                if heads[token.head - 1]
                    && self.scheme.links_clause(&token.relation)
                    && self.scheme.is_predicate_pos(&token.pos)
                {
                    heads[i] = true;
                    changed = true;
                }
            }
        }

        heads
    }

    fn best_argument(
        &self,
        parsed: &ParsedSentence,
        tree: &Tree,
        clause_heads: &[bool],
        index: usize,
    ) -> Option<SemanticRole> {
        let token = &parsed.tokens[index];
        let basic = std::iter::once((token.head, token.relation.as_str(), false));
        let enhanced = token
            .extra
            .iter()
            .map(|(head, relation)| (*head, relation.as_str(), true));

        basic
            .chain(enhanced)
            .filter(|(head, _, _)| *head != 0 && clause_heads[*head - 1])
            .filter_map(|(head, relation, is_enhanced)| {
                let role = self.scheme.argument_role(relation)?;
                let candidate: Candidate = (tree.hops(index, head - 1), is_enhanced, head, role);
                Some(candidate)
            })
            .min_by_key(|(hops, is_enhanced, head, _)| (*hops, *is_enhanced, *head))
            .map(|(_, _, _, role)| role)
    }

    fn analyze_sentence(&self, sentence: &str) -> Result<AnalysisResult> {
        let parser = self.parser.get()?;
        let request = sentence.replace(['\n', '\r'], " ");
        let parsed = parser.parse(&request)?;
        if let Err(e) = parsed.validate() {
            log::warn!("Rejected parse of '{}'", request.trim());
            return Err(e);
        }

        let tokens = align_tokens(sentence, &parsed)?;
        let roles = self.assign_roles(&parsed);
        log::debug!(
            "Parsed sentence '{}' into {} tokens ({} marked)",
            request.trim(),
            tokens.len(),
            roles.iter().filter(|r| r.is_marked()).count()
        );

        let mut result = AnalysisResult::new();
        for (token, role) in tokens.into_iter().zip(roles) {
            result.push(token, role);
        }
        Ok(result)
    }
}

impl Analyzer for DependencyAnalyzer {
    fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new();

        for sentence in self.sentences.tokenize(text)? {
            if sentence.text.trim().is_empty() {
                continue;
            }
            let analyzed = self.analyze_sentence(&sentence.text)?;
            result.extend_shifted(analyzed, sentence.start_offset);
        }

        Ok(result)
    }

    fn name(&self) -> &'static str {
        "dependency"
    }
}

/// Locate each parsed form in the sentence, in order.
///
/// Whitespace between forms is skipped; any other mismatch is an analysis
/// error. Offsets are byte offsets into `sentence`.
pub fn align_tokens(sentence: &str, parsed: &ParsedSentence) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(parsed.len());
    let mut cursor = 0;

    for (position, parsed_token) in parsed.tokens.iter().enumerate() {
        let rest = &sentence[cursor..];
        cursor += rest.len() - rest.trim_start().len();

        let form = parsed_token.form.as_str();
        if form.is_empty() || !sentence[cursor..].starts_with(form) {
            let found: String = sentence[cursor..].chars().take(8).collect();
            return Err(BionicError::analysis(format!(
                "cannot align token {} '{form}' with source text at byte {cursor} ('{found}')",
                position + 1
            )));
        }

        let end = cursor + form.len();
        tokens.push(Token::with_offsets(&sentence[cursor..end], position, cursor, end));
        cursor = end;
    }

    Ok(tokens)
}

/// Role of the nearest argument-bearing ancestor below a clause head.
fn inherited_role(
    parsed: &ParsedSentence,
    clause_heads: &[bool],
    roles: &[Option<SemanticRole>],
    index: usize,
) -> Option<SemanticRole> {
    let mut head = parsed.tokens[index].head;
    while head != 0 {
        let ancestor = head - 1;
        if clause_heads[ancestor] {
            return None;
        }
        if let Some(role) = roles[ancestor] {
            return Some(role);
        }
        head = parsed.tokens[ancestor].head;
    }
    None
}

/// Depths and parents of the basic tree, for hop counting.
struct Tree {
    parents: Vec<Option<usize>>,
    depths: Vec<usize>,
}

impl Tree {
    fn new(parsed: &ParsedSentence) -> Self {
        let parents: Vec<Option<usize>> = parsed
            .tokens
            .iter()
            .map(|t| t.head.checked_sub(1))
            .collect();

        let depths = (0..parents.len())
            .map(|i| {
                let mut depth = 0;
                let mut current = parents[i];
                while let Some(parent) = current {
                    depth += 1;
                    current = parents[parent];
                }
                depth
            })
            .collect();

        Tree { parents, depths }
    }

    fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(index), move |i| self.parents[*i])
    }

    /// Undirected path length between two tokens.
    ///
    /// Tokens in different trees of a forest are joined through a virtual
    /// root above all roots.
    fn hops(&self, a: usize, b: usize) -> usize {
        let above_a: HashSet<usize> = self.ancestors(a).collect();
        match self.ancestors(b).find(|i| above_a.contains(i)) {
            Some(lca) => self.depths[a] + self.depths[b] - 2 * self.depths[lca],
            None => self.depths[a] + self.depths[b] + 2,
        }
    }
}
