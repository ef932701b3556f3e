//! Dependency relation vocabulary.
//!
//! The role classifier never hard-codes one parser's label set. Instead it asks
//! a [`RelationScheme`] whether a label is subject-like, object-like or links a
//! coordinated/serial clause, and whether a part-of-speech tag can head a
//! clause. The defaults cover Universal Dependencies and the Stanford Chinese
//! labels emitted by older Chinese parsers.
//!
//! Labels are compared case-insensitively; a subtyped label such as
//! `nsubj:outer` matches when its base (`nsubj`) is in the set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analysis::role::SemanticRole;

const DEFAULT_SUBJECT_RELATIONS: &[&str] = &[
    "nsubj",
    "nsubj:pass",
    "nsubjpass",
    "csubj",
    "csubj:pass",
    "csubjpass",
    "top",
];

const DEFAULT_OBJECT_RELATIONS: &[&str] = &["obj", "dobj", "iobj", "range"];

const DEFAULT_CLAUSE_RELATIONS: &[&str] = &["conj", "parataxis", "xcomp"];

/// UD UPOS tags plus Penn Chinese Treebank verb/adjective tags.
const DEFAULT_PREDICATE_POS: &[&str] = &["VERB", "ADJ", "AUX", "VV", "VA", "VC", "VE"];

/// Configurable mapping from parser labels to roles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationScheme {
    /// Relations that make the dependent a subject of its head.
    pub subject: BTreeSet<String>,
    /// Relations that make the dependent an object of its head.
    pub object: BTreeSet<String>,
    /// Relations linking a further clause head to an existing one.
    pub clause_link: BTreeSet<String>,
    /// Part-of-speech tags allowed to head a clause. Empty accepts any tag.
    pub predicate_pos: BTreeSet<String>,
}

fn label_set(labels: &[&str]) -> BTreeSet<String> {
    labels.iter().map(|l| l.to_ascii_lowercase()).collect()
}

fn contains_label(set: &BTreeSet<String>, label: &str) -> bool {
    let label = label.to_ascii_lowercase();
    if set.contains(&label) {
        return true;
    }
    match label.split_once(':') {
        Some((base, _)) => set.contains(base),
        None => false,
    }
}

impl Default for RelationScheme {
    fn default() -> Self {
        RelationScheme {
            subject: label_set(DEFAULT_SUBJECT_RELATIONS),
            object: label_set(DEFAULT_OBJECT_RELATIONS),
            clause_link: label_set(DEFAULT_CLAUSE_RELATIONS),
            predicate_pos: DEFAULT_PREDICATE_POS
                .iter()
                .map(|p| p.to_ascii_uppercase())
                .collect(),
        }
    }
}

impl RelationScheme {
    /// Create the default scheme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the subject relations.
    pub fn with_subject_relations<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.subject = labels
            .into_iter()
            .map(|l| l.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    /// Replace the object relations.
    pub fn with_object_relations<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.object = labels
            .into_iter()
            .map(|l| l.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    /// Replace the clause-linking relations.
    pub fn with_clause_relations<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.clause_link = labels
            .into_iter()
            .map(|l| l.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    /// Replace the predicate part-of-speech tags.
    pub fn with_predicate_pos<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.predicate_pos = tags
            .into_iter()
            .map(|t| t.as_ref().to_ascii_uppercase())
            .collect();
        self
    }

    /// Fold configured labels to the case used for comparisons.
    ///
    /// Values loaded from a config file may use any case.
    pub fn normalized(self) -> Self {
        RelationScheme::new()
            .with_subject_relations(self.subject)
            .with_object_relations(self.object)
            .with_clause_relations(self.clause_link)
            .with_predicate_pos(self.predicate_pos)
    }

    pub fn is_subject(&self, label: &str) -> bool {
        contains_label(&self.subject, label)
    }

    pub fn is_object(&self, label: &str) -> bool {
        contains_label(&self.object, label)
    }

    pub fn links_clause(&self, label: &str) -> bool {
        contains_label(&self.clause_link, label)
    }

    /// Whether a token with this tag may head a clause.
    pub fn is_predicate_pos(&self, pos: &str) -> bool {
        self.predicate_pos.is_empty() || self.predicate_pos.contains(&pos.to_ascii_uppercase())
    }

    /// The argument role a relation confers on its dependent, if any.
    pub fn argument_role(&self, label: &str) -> Option<SemanticRole> {
        if self.is_subject(label) {
            Some(SemanticRole::Subject)
        } else if self.is_object(label) {
            Some(SemanticRole::Object)
        } else {
            None
        }
    }
}
