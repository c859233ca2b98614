//! Entity classification
//!
//! Partitions the subjects of a graph into properties, classes and instances
//! based on their `rdf:type` triples. Every subject lands in exactly one kind.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::graph::{Graph, Term, Vocabulary};

/// Role of a subject in the ontology.
///
/// The derived ordering is also the precedence and the order in which
/// additions are applied: properties first, then classes, then instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Property,
    Class,
    Instance,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Property, Self::Class, Self::Instance];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Property => "Property",
            Self::Class => "Class",
            Self::Instance => "Instance",
        };
        f.write_str(name)
    }
}

/// A subject that qualified for more than one kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationAmbiguity {
    pub subject: Term,
    /// Every kind the subject qualified for, in precedence order
    pub kinds: Vec<EntityKind>,
    /// The kind it was placed in
    pub resolved: EntityKind,
}

impl fmt::Display for ClassificationAmbiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self
            .kinds
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} is typed as {{{}}}, classified as {}", self.subject, kinds, self.resolved)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub properties: BTreeSet<Term>,
    pub classes: BTreeSet<Term>,
    pub instances: BTreeSet<Term>,
    pub ambiguities: Vec<ClassificationAmbiguity>,
    /// Subjects with no `rdf:type` triple; these are also in `instances`
    pub untyped: BTreeSet<Term>,
}

impl Classification {
    /// Kind of a subject; anything not seen during classification is an instance
    pub fn kind_of(&self, subject: &Term) -> EntityKind {
        if self.properties.contains(subject) {
            EntityKind::Property
        } else if self.classes.contains(subject) {
            EntityKind::Class
        } else {
            EntityKind::Instance
        }
    }

    pub fn members(&self, kind: EntityKind) -> &BTreeSet<Term> {
        match kind {
            EntityKind::Property => &self.properties,
            EntityKind::Class => &self.classes,
            EntityKind::Instance => &self.instances,
        }
    }

    /// Total number of classified terms
    pub fn len(&self) -> usize {
        self.properties.len() + self.classes.len() + self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn place(&mut self, subject: Term, kind: EntityKind) {
        match kind {
            EntityKind::Property => self.properties.insert(subject),
            EntityKind::Class => self.classes.insert(subject),
            EntityKind::Instance => self.instances.insert(subject),
        };
    }
}

/// Classify every subject in `graph` and every term used as a type.
pub fn classify(graph: &Graph) -> Classification {
    let rdf_type = Vocabulary::RdfType.iri();
    let mut candidates: BTreeMap<Term, BTreeSet<EntityKind>> = BTreeMap::new();

    for triple in graph.triples_matching(None, Some(rdf_type), None) {
        let marker = triple.object.as_iri().and_then(Vocabulary::from_iri);
        match marker {
            Some(term) if term.is_property_marker() => {
                candidates.entry(triple.subject.clone()).or_default().insert(EntityKind::Property);
            }
            Some(term) if term.is_class_marker() => {
                candidates.entry(triple.subject.clone()).or_default().insert(EntityKind::Class);
            }
            _ => {
                // Anything used as a type is itself a class
                if triple.object.is_resource() {
                    candidates.entry(triple.object.clone()).or_default().insert(EntityKind::Class);
                }
                candidates.entry(triple.subject.clone()).or_default().insert(EntityKind::Instance);
            }
        }
    }

    let mut classification = Classification::default();

    for (subject, kinds) in candidates {
        let Some(&resolved) = kinds.first() else {
            continue;
        };

        if kinds.len() > 1 {
            let ambiguity = ClassificationAmbiguity {
                subject: subject.clone(),
                kinds: kinds.into_iter().collect(),
                resolved,
            };
            log::warn!("Ambiguous classification: {}", ambiguity);
            classification.ambiguities.push(ambiguity);
        }

        classification.place(subject, resolved);
    }

    for subject in graph.subjects_set() {
        let known = classification.properties.contains(subject)
            || classification.classes.contains(subject)
            || classification.instances.contains(subject);
        if !known {
            classification.instances.insert(subject.clone());
            classification.untyped.insert(subject.clone());
        }
    }

    if !classification.untyped.is_empty() {
        log::debug!(
            "{} subjects have no rdf:type and were classified as instances",
            classification.untyped.len()
        );
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;
    use proptest::prelude::*;

    fn ex(name: &str) -> Term {
        Term::iri(format!("http://example.org/{}", name))
    }

    fn typed(subject: Term, ty: Term) -> Triple {
        Triple::new(subject, Vocabulary::RdfType.iri(), ty)
    }

    fn vocab(term: Vocabulary) -> Term {
        Term::iri(term.iri())
    }

    #[test]
    fn test_basic_roles() {
        let graph: Graph = vec![
            typed(ex("age"), vocab(Vocabulary::OwlDatatypeProperty)),
            typed(ex("Cat"), vocab(Vocabulary::RdfsClass)),
            typed(ex("fluffy"), ex("Cat")),
            Triple::new(ex("fluffy"), "http://example.org/age", Term::literal("4")),
        ]
        .into_iter()
        .collect();

        let c = classify(&graph);

        assert_eq!(c.properties, BTreeSet::from([ex("age")]));
        assert_eq!(c.classes, BTreeSet::from([ex("Cat")]));
        assert_eq!(c.instances, BTreeSet::from([ex("fluffy")]));
        assert!(c.ambiguities.is_empty());
        assert!(c.untyped.is_empty());
    }

    #[test]
    fn test_type_object_becomes_class_without_declaration() {
        let graph: Graph = vec![typed(ex("fluffy"), ex("Cat"))].into_iter().collect();

        let c = classify(&graph);

        assert_eq!(c.kind_of(&ex("Cat")), EntityKind::Class);
        assert_eq!(c.kind_of(&ex("fluffy")), EntityKind::Instance);
    }

    #[test]
    fn test_owl_class_is_an_ordinary_type() {
        let graph: Graph = vec![typed(ex("Dog"), vocab(Vocabulary::OwlClass))].into_iter().collect();

        let c = classify(&graph);

        assert_eq!(c.kind_of(&ex("Dog")), EntityKind::Instance);
        assert_eq!(c.classes, BTreeSet::from([vocab(Vocabulary::OwlClass)]));
    }

    #[test]
    fn test_property_and_class_marker_resolves_to_property() {
        let graph: Graph = vec![
            typed(ex("weird"), vocab(Vocabulary::RdfProperty)),
            typed(ex("weird"), vocab(Vocabulary::RdfsClass)),
        ]
        .into_iter()
        .collect();

        let c = classify(&graph);

        assert_eq!(c.kind_of(&ex("weird")), EntityKind::Property);
        assert!(!c.classes.contains(&ex("weird")));
        assert_eq!(c.ambiguities.len(), 1);
        assert_eq!(c.ambiguities[0].kinds, vec![EntityKind::Property, EntityKind::Class]);
        assert_eq!(c.ambiguities[0].resolved, EntityKind::Property);
    }

    #[test]
    fn test_property_used_as_type_resolves_to_property() {
        let graph: Graph = vec![
            typed(ex("hasOwner"), vocab(Vocabulary::OwlObjectProperty)),
            typed(ex("thing"), ex("hasOwner")),
        ]
        .into_iter()
        .collect();

        let c = classify(&graph);

        assert_eq!(c.kind_of(&ex("hasOwner")), EntityKind::Property);
        assert_eq!(c.kind_of(&ex("thing")), EntityKind::Instance);
        assert_eq!(c.ambiguities.len(), 1);
        assert_eq!(c.ambiguities[0].subject, ex("hasOwner"));
    }

    #[test]
    fn test_untyped_subjects_default_to_instance() {
        let graph: Graph = vec![Triple::new(
            ex("orphan"),
            Vocabulary::RdfsLabel.iri(),
            Term::literal("Orphan"),
        )]
        .into_iter()
        .collect();

        let c = classify(&graph);

        assert_eq!(c.instances, BTreeSet::from([ex("orphan")]));
        assert_eq!(c.untyped, BTreeSet::from([ex("orphan")]));
        assert_eq!(c.kind_of(&ex("never-seen")), EntityKind::Instance);
    }

    #[test]
    fn test_empty_graph() {
        let c = classify(&Graph::new());
        assert!(c.is_empty());
    }

    fn arb_term() -> impl Strategy<Value = Term> {
        prop_oneof![
            (0..6u8).prop_map(|i| ex(&format!("n{}", i))),
            (0..2u8).prop_map(|i| Term::blank(format!("b{}", i))),
        ]
    }

    fn arb_object() -> impl Strategy<Value = Term> {
        prop_oneof![
            arb_term(),
            Just(vocab(Vocabulary::RdfsClass)),
            Just(vocab(Vocabulary::OwlClass)),
            Just(vocab(Vocabulary::RdfProperty)),
            Just(vocab(Vocabulary::OwlObjectProperty)),
            Just(vocab(Vocabulary::OwlDatatypeProperty)),
            Just(Term::literal("x")),
        ]
    }

    fn arb_graph() -> impl Strategy<Value = Graph> {
        let predicate = prop_oneof![
            Just(Vocabulary::RdfType.iri().to_string()),
            Just("http://example.org/p".to_string()),
        ];
        prop::collection::vec((arb_term(), predicate, arb_object()), 0..24)
            .prop_map(|triples| triples.into_iter().map(|(s, p, o)| Triple::new(s, p, o)).collect())
    }

    proptest! {
        #[test]
        fn prop_kinds_are_disjoint(graph in arb_graph()) {
            let c = classify(&graph);
            prop_assert!(c.properties.is_disjoint(&c.classes));
            prop_assert!(c.properties.is_disjoint(&c.instances));
            prop_assert!(c.classes.is_disjoint(&c.instances));
        }

        #[test]
        fn prop_every_subject_is_classified(graph in arb_graph()) {
            let c = classify(&graph);
            for subject in graph.subjects_set() {
                let hits = EntityKind::ALL
                    .iter()
                    .filter(|kind| c.members(**kind).contains(subject))
                    .count();
                prop_assert_eq!(hits, 1, "subject {} classified {} times", subject, hits);
            }
            prop_assert!(c.untyped.is_subset(&c.instances));
        }
    }
}
