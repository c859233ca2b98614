//! Core RDF value types: terms, triples, and the indexed in-memory graph

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// An RDF literal value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical form
    pub value: String,
    /// Language tag (e.g., "en"), only set for language-tagged strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Datatype IRI; `None` for plain `xsd:string` and language-tagged literals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

/// A node or value in an RDF statement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Term {
    /// Named node
    Iri(String),
    /// Anonymous node, identified by its label within one document
    BlankNode(String),
    /// Literal value
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Self::BlankNode(id.into())
    }

    /// Plain string literal
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(Literal {
            value: value.into(),
            language: None,
            datatype: None,
        })
    }

    /// Language-tagged string literal
    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal(Literal {
            value: value.into(),
            language: Some(language.into().to_lowercase()),
            datatype: None,
        })
    }

    /// Literal with an explicit datatype IRI
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal(Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        })
    }

    /// The IRI of a named node
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Whether this term may appear in subject position
    pub fn is_resource(&self) -> bool {
        !self.is_literal()
    }

    /// Short human-readable name: the IRI fragment or last path segment,
    /// the blank node label, or the literal value.
    pub fn local_name(&self) -> &str {
        match self {
            Self::Iri(iri) => local_name(iri),
            Self::BlankNode(id) => id,
            Self::Literal(literal) => &literal.value,
        }
    }
}

/// Fragment or last path segment of an IRI, falling back to the whole IRI
pub fn local_name(iri: &str) -> &str {
    let trimmed = iri.trim_end_matches(['/', '#']);
    match trimmed.rfind(['#', '/', ':']) {
        Some(idx) if idx + 1 < trimmed.len() => &trimmed[idx + 1..],
        _ => trimmed,
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{}>", iri),
            Self::BlankNode(id) => write!(f, "_:{}", id),
            Self::Literal(literal) => {
                write!(f, "\"{}\"", literal.value.escape_default())?;
                if let Some(language) = &literal.language {
                    write!(f, "@{}", language)
                } else if let Some(datatype) = &literal.datatype {
                    write!(f, "^^<{}>", datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A single subject-predicate-object statement.
///
/// Field order matters: the derived ordering sorts by subject, then predicate,
/// then object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.subject, self.predicate, self.object)
    }
}

/// A set of triples with (subject, predicate) and (predicate, object) indexes.
///
/// Iteration order is the sorted triple order, so anything derived from a graph
/// is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: BTreeSet<Triple>,
    by_subject_predicate: HashMap<(Term, String), BTreeSet<Term>>,
    by_predicate_object: HashMap<(String, Term), BTreeSet<Term>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple. Returns false if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.triples.contains(&triple) {
            return false;
        }

        self.by_subject_predicate
            .entry((triple.subject.clone(), triple.predicate.clone()))
            .or_default()
            .insert(triple.object.clone());
        self.by_predicate_object
            .entry((triple.predicate.clone(), triple.object.clone()))
            .or_default()
            .insert(triple.subject.clone());
        self.triples.insert(triple)
    }

    /// Remove a triple. Returns false if it was not present.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        if !self.triples.remove(triple) {
            return false;
        }

        let sp_key = (triple.subject.clone(), triple.predicate.clone());
        if let Some(objects) = self.by_subject_predicate.get_mut(&sp_key) {
            objects.remove(&triple.object);
            if objects.is_empty() {
                self.by_subject_predicate.remove(&sp_key);
            }
        }

        let po_key = (triple.predicate.clone(), triple.object.clone());
        if let Some(subjects) = self.by_predicate_object.get_mut(&po_key) {
            subjects.remove(&triple.subject);
            if subjects.is_empty() {
                self.by_predicate_object.remove(&po_key);
            }
        }

        true
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// All triples in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Objects of all triples with the given subject and predicate
    pub fn objects<'a>(&'a self, subject: &Term, predicate: &str) -> impl Iterator<Item = &'a Term> {
        self.by_subject_predicate
            .get(&(subject.clone(), predicate.to_string()))
            .into_iter()
            .flatten()
    }

    /// Subjects of all triples with the given predicate and object
    pub fn subjects<'a>(&'a self, predicate: &str, object: &Term) -> impl Iterator<Item = &'a Term> {
        self.by_predicate_object
            .get(&(predicate.to_string(), object.clone()))
            .into_iter()
            .flatten()
    }

    /// Pattern match; `None` acts as a wildcard.
    pub fn triples_matching(
        &self,
        subject: Option<&Term>,
        predicate: Option<&str>,
        object: Option<&Term>,
    ) -> Vec<&Triple> {
        match (subject, predicate, object) {
            (Some(s), Some(p), Some(o)) => {
                let triple = Triple::new(s.clone(), p, o.clone());
                self.triples.get(&triple).into_iter().collect()
            }
            (Some(s), Some(p), None) => {
                let objects = self.objects(s, p).cloned().collect::<Vec<_>>();
                objects
                    .into_iter()
                    .filter_map(|o| self.triples.get(&Triple::new(s.clone(), p, o)))
                    .collect()
            }
            (None, Some(p), Some(o)) => {
                let subjects = self.subjects(p, o).cloned().collect::<Vec<_>>();
                subjects
                    .into_iter()
                    .filter_map(|s| self.triples.get(&Triple::new(s, p, o.clone())))
                    .collect()
            }
            _ => self
                .triples
                .iter()
                .filter(|t| subject.is_none_or(|s| &t.subject == s))
                .filter(|t| predicate.is_none_or(|p| t.predicate == p))
                .filter(|t| object.is_none_or(|o| &t.object == o))
                .collect(),
        }
    }

    /// Every distinct subject in the graph
    pub fn subjects_set(&self) -> BTreeSet<&Term> {
        self.triples.iter().map(|t| &t.subject).collect()
    }

    /// Triples in `self` but not in `other`, in sorted order
    pub fn difference<'a>(&'a self, other: &'a Graph) -> impl Iterator<Item = &'a Triple> {
        self.triples.difference(&other.triples)
    }

    /// Triples present in both graphs, in sorted order
    pub fn intersection<'a>(&'a self, other: &'a Graph) -> impl Iterator<Item = &'a Triple> {
        self.triples.intersection(&other.triples)
    }

    pub fn union(&self, other: &Graph) -> Graph {
        self.iter().chain(other.iter()).cloned().collect()
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.triples == other.triples
    }
}

impl Eq for Graph {}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Graph::new();
        graph.extend(iter);
        graph
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}
