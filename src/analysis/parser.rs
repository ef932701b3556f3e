//! Dependency parser collaborator.
//!
//! The role classifier depends on one narrow contract: given a sentence, return
//! per token its surface form, head index, relation label and part-of-speech.
//! Everything behind [`DependencyParser`] (network service, precomputed file,
//! an in-process model) is interchangeable.
//!
//! Parsers are expensive to bring up, so [`LazyParser`] wraps a factory and
//! initializes the parser on first use. Initialization happens once per
//! process, successful or not; afterwards the parser (or the load failure) is
//! shared read-only by every worker.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{BionicError, Result};

pub mod conllu;
pub mod precomputed;
#[cfg(feature = "udpipe")]
pub mod udpipe;

pub use conllu::parse_conllu;
pub use precomputed::PrecomputedParser;
#[cfg(feature = "udpipe")]
pub use udpipe::{UdpipeConfig, UdpipeParser};

/// One token of a dependency parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToken {
    /// Surface form as reported by the parser.
    pub form: String,
    /// 1-based index of the head token; 0 marks a root.
    pub head: usize,
    /// Dependency relation to the head.
    pub relation: String,
    /// Part-of-speech tag.
    pub pos: String,
    /// Enhanced (head, relation) pairs beyond the basic tree.
    #[serde(default)]
    pub extra: Vec<(usize, String)>,
}

impl ParsedToken {
    pub fn new<F, R, P>(form: F, head: usize, relation: R, pos: P) -> Self
    where
        F: Into<String>,
        R: Into<String>,
        P: Into<String>,
    {
        ParsedToken {
            form: form.into(),
            head,
            relation: relation.into(),
            pos: pos.into(),
            extra: Vec::new(),
        }
    }

    /// Add an enhanced dependency.
    pub fn with_extra<R: Into<String>>(mut self, head: usize, relation: R) -> Self {
        self.extra.push((head, relation.into()));
        self
    }

    pub fn is_root(&self) -> bool {
        self.head == 0
    }
}

/// The parse of one sentence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSentence {
    /// Sentence text, when the parser echoes it back.
    pub text: Option<String>,
    pub tokens: Vec<ParsedToken>,
}

impl ParsedSentence {
    pub fn new(tokens: Vec<ParsedToken>) -> Self {
        ParsedSentence { text: None, tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Append another parse, re-basing its head indices.
    ///
    /// Parsers occasionally split what we sent as one sentence; the pieces are
    /// glued back into one forest with several roots.
    pub fn append(&mut self, other: ParsedSentence) {
        let base = self.tokens.len();
        let rebase = |head: usize| if head == 0 { 0 } else { head + base };
        for mut token in other.tokens {
            token.head = rebase(token.head);
            for extra in &mut token.extra {
                extra.0 = rebase(extra.0);
            }
            self.tokens.push(token);
        }
        self.text = match (self.text.take(), other.text) {
            (Some(a), Some(b)) => Some(a + &b),
            (a, b) => a.or(b),
        };
    }

    /// Check that the parse is a well-formed dependency forest.
    ///
    /// Every head index must be in range, there must be at least one root and
    /// following heads from any token must reach a root.
    pub fn validate(&self) -> Result<()> {
        let n = self.tokens.len();
        if n == 0 {
            return Err(BionicError::analysis("parser returned no tokens"));
        }

        for (i, token) in self.tokens.iter().enumerate() {
            if token.head > n {
                return Err(BionicError::analysis(format!(
                    "token {} ('{}') has head {} outside 0..={}",
                    i + 1,
                    token.form,
                    token.head,
                    n
                )));
            }
            if token.head == i + 1 {
                return Err(BionicError::analysis(format!(
                    "token {} ('{}') is its own head",
                    i + 1,
                    token.form
                )));
            }
            if let Some((head, relation)) = token.extra.iter().find(|(h, _)| *h > n) {
                return Err(BionicError::analysis(format!(
                    "token {} ('{}') has enhanced head {head} ({relation}) outside 0..={n}",
                    i + 1,
                    token.form
                )));
            }
        }

        if !self.tokens.iter().any(ParsedToken::is_root) {
            return Err(BionicError::analysis("parse has no root token"));
        }

        for start in 0..n {
            let mut current = start;
            let mut hops = 0;
            while self.tokens[current].head != 0 {
                current = self.tokens[current].head - 1;
                hops += 1;
                if hops > n {
                    return Err(BionicError::analysis(format!(
                        "dependency cycle through token {} ('{}')",
                        start + 1,
                        self.tokens[start].form
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Trait for dependency parsers.
///
/// Implementations must be safe to call from several workers at once after
/// construction.
pub trait DependencyParser: Send + Sync {
    /// Parse one sentence.
    fn parse(&self, sentence: &str) -> Result<ParsedSentence>;

    /// Get the name of this parser (for logging).
    fn name(&self) -> &'static str;
}

type ParserFactory = Box<dyn Fn() -> Result<Arc<dyn DependencyParser>> + Send + Sync>;

/// A parser handle loaded on first use and shared read-only afterwards.
pub struct LazyParser {
    cell: OnceLock<std::result::Result<Arc<dyn DependencyParser>, String>>,
    init_lock: Mutex<()>,
    factory: ParserFactory,
}

impl LazyParser {
    /// Create a handle that runs `factory` the first time the parser is needed.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn DependencyParser>> + Send + Sync + 'static,
    {
        LazyParser {
            cell: OnceLock::new(),
            init_lock: Mutex::new(()),
            factory: Box::new(factory),
        }
    }

    /// Wrap a parser that is already loaded.
    pub fn loaded(parser: Arc<dyn DependencyParser>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Arc::clone(&parser)));
        LazyParser {
            cell,
            init_lock: Mutex::new(()),
            factory: Box::new(move || Ok(Arc::clone(&parser))),
        }
    }

    /// Whether the parser has been initialized successfully.
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    /// Get the parser, initializing it on the first call.
    ///
    /// The factory runs at most once. Its outcome is kept, so a failed
    /// initialization is reported to every later caller as the same
    /// analysis error.
    pub fn get(&self) -> Result<&Arc<dyn DependencyParser>> {
        if let Some(outcome) = self.cell.get() {
            return Self::unpack(outcome);
        }

        let _guard = self.init_lock.lock();
        if let Some(outcome) = self.cell.get() {
            return Self::unpack(outcome);
        }

        log::info!("Loading dependency parser");
        let outcome = match (self.factory)() {
            Ok(parser) => {
                log::info!("Dependency parser '{}' ready", parser.name());
                Ok(parser)
            }
            Err(e) => {
                log::error!("Dependency parser failed to load: {e}");
                Err(format!("dependency parser unavailable: {e}"))
            }
        };

        let _ = self.cell.set(outcome);
        match self.cell.get() {
            Some(outcome) => Self::unpack(outcome),
            None => Err(BionicError::internal(
                "parser cell empty after initialization",
            )),
        }
    }

    fn unpack(
        outcome: &std::result::Result<Arc<dyn DependencyParser>, String>,
    ) -> Result<&Arc<dyn DependencyParser>> {
        outcome
            .as_ref()
            .map_err(|message| BionicError::analysis(message.clone()))
    }
}

impl fmt::Debug for LazyParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyParser")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
