//! Text analysis for bionic-epub.
//!
//! This module turns a text run into role-tagged tokens: tokenizers cut runs
//! into words or sentences, parsers supply dependency trees, and analyzers
//! assign a [`role::SemanticRole`] to every token.

pub mod analyzer;
pub mod parser;
pub mod relation;
pub mod role;
pub mod token;
pub mod tokenizer;

pub use analyzer::{AnalysisMode, AnalysisResult, Analyzer, RoleSpan};
pub use role::SemanticRole;
pub use token::Token;
